//! Demographic simulation engine.
//!
//! Individuals age, pair up, conceive, give birth and die, driven by samples
//! drawn from the distributions bound to each life event.

pub mod distribution;
pub mod registry;
pub mod individual;
pub mod population;
pub mod simulation;

pub use distribution::{ContinuousUniform, Exponential, Fixed, Normal, Poisson, Sampler, Scripted};
pub use registry::{Distributions, LifeEvent};
pub use individual::{Birth, Fertility, Gender, Individual};
pub use population::Population;
pub use simulation::{PassSummary, RunTotals, Simulation, SimulationResult};
