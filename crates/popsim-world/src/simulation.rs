//! Simulation engine: steps the live population through the per-individual
//! event pipeline.

use crate::individual::Individual;
use crate::population::Population;
use crate::registry::Distributions;
use popsim_core::{IndividualRecord, Result, SimulationConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

/// Counters for a single pass over the population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Individuals visited, newborns included
    pub visited: u64,
    pub births: u64,
    pub deaths: u64,
    pub pairings: u64,
    pub dissolutions: u64,
    pub conceptions: u64,
    /// Live population once the pass completed
    pub population: usize,
}

/// Counters accumulated over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub births: u64,
    pub deaths: u64,
    pub pairings: u64,
    pub dissolutions: u64,
    pub conceptions: u64,
}

impl RunTotals {
    fn absorb(&mut self, pass: &PassSummary) {
        self.births += pass.births;
        self.deaths += pass.deaths;
        self.pairings += pass.pairings;
        self.dissolutions += pass.dissolutions;
        self.conceptions += pass.conceptions;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Seed the registry was built from, when it was built from one
    pub seed: Option<u64>,
    pub final_clock: u64,
    pub passes: u64,
    pub totals: RunTotals,
    pub survivors: Vec<IndividualRecord>,
}

pub struct Simulation {
    population: Population,
    distributions: Distributions,
    config: SimulationConfig,
    seed: Option<u64>,
    clock: u64,
    passes: u64,
    totals: RunTotals,
}

impl Simulation {
    /// Build the standard registry from the config, seeded from `config.seed`
    /// or from entropy when unset.
    pub fn new(config: SimulationConfig, initial: Vec<Individual>) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        info!(seed, "Seeding simulation distributions");
        let distributions = Distributions::from_config(&config.distributions, seed)?;

        let mut sim = Self::with_distributions(config, initial, distributions);
        sim.seed = Some(seed);
        Ok(sim)
    }

    /// Build around an externally constructed registry.
    pub fn with_distributions(
        config: SimulationConfig,
        initial: Vec<Individual>,
        mut distributions: Distributions,
    ) -> Self {
        let mut population = Population::from_individuals(initial);

        for (id, individual) in population.iter_mut() {
            if config.resample_initial_traits {
                individual.resample_traits(&mut distributions);
            }
            if individual.age > individual.lifetime {
                warn!(
                    individual = %id,
                    age = individual.age,
                    lifetime = individual.lifetime,
                    "Initial individual is already past its lifetime and will never be removed"
                );
            }
        }

        Self {
            population,
            distributions,
            config,
            seed: None,
            clock: 0,
            passes: 0,
            totals: RunTotals::default(),
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Run whole passes until the clock reaches the configured duration.
    ///
    /// The duration is only checked between passes, so the final clock may
    /// overshoot it. An empty population ends the run early.
    #[instrument(skip(self), fields(duration = self.config.duration))]
    pub fn run(&mut self) -> SimulationResult {
        info!(
            "Starting simulation for {} ticks with {} individuals",
            self.config.duration,
            self.population.len()
        );

        while self.clock < self.config.duration {
            if self.population.is_empty() {
                info!(
                    event = "extinction",
                    clock = self.clock,
                    passes = self.passes,
                    "Population died out"
                );
                break;
            }

            let pass = self.step();

            let interval = self.config.summary_interval;
            if interval > 0 && self.passes % interval == 0 {
                info!(
                    event = "pass_summary",
                    pass = self.passes,
                    clock = self.clock,
                    population = pass.population,
                    births = pass.births,
                    deaths = pass.deaths,
                    pairings = pass.pairings,
                    dissolutions = pass.dissolutions,
                    conceptions = pass.conceptions,
                    "Population snapshot"
                );
            }
        }

        info!(
            event = "run_complete",
            final_clock = self.clock,
            passes = self.passes,
            population = self.population.len(),
            births = self.totals.births,
            deaths = self.totals.deaths,
            pairings = self.totals.pairings,
            dissolutions = self.totals.dissolutions,
            "🏁 Simulation complete"
        );

        self.result()
    }

    /// One full pass over the population.
    ///
    /// The slot bound is re-read on every iteration: children born during the
    /// pass are appended and visited (and aged) in this same pass.
    pub fn step(&mut self) -> PassSummary {
        let mut pass = PassSummary::default();

        let mut slot = 0;
        while slot < self.population.slot_count() {
            self.visit(slot, &mut pass);
            slot += 1;
        }

        self.population.compact();
        pass.population = self.population.len();
        self.passes += 1;
        self.totals.absorb(&pass);
        pass
    }

    /// Apply the event pipeline to the individual in `slot`. Tombstones are
    /// skipped without advancing the clock.
    fn visit(&mut self, slot: usize, pass: &mut PassSummary) {
        let Some(id) = self.population.id_at(slot) else {
            return;
        };
        let now = self.clock;
        pass.visited += 1;

        let pregnant = self.population.get(id).is_some_and(Individual::is_pregnant);
        if pregnant {
            if let Some(child) = self.population.deliver(id, &mut self.distributions, now) {
                pass.births += 1;
                debug!(event = "birth", mother = %id, child = %child, clock = now, "Child born");
            }
        }

        let eligible = self
            .population
            .get(id)
            .is_some_and(Individual::is_eligible_for_relation);
        if eligible {
            if let Some(partner) = self.population.seek_partner(id, now, &mut self.distributions) {
                pass.pairings += 1;
                debug!(event = "pairing", individual = %id, partner = %partner, clock = now, "Pair formed");
            }
        }

        // Both checks read live state: the fertility check still runs after
        // a dissolution in this same visit.
        let engaged = self.population.get(id).is_some_and(Individual::is_engaged);
        if engaged {
            let ends = self
                .population
                .get(id)
                .is_some_and(|individual| individual.should_end_relation(&mut self.distributions));
            if ends {
                if let Some(partner) = self.population.disengage(id) {
                    pass.dissolutions += 1;
                    debug!(event = "dissolution", individual = %id, partner = %partner, clock = now, "Bond dissolved");
                }
            }

            if let Some(individual) = self.population.get_mut(id) {
                if individual.is_fertility_window_open(now) {
                    if let Some(fertility) = individual.fertility_mut() {
                        if !fertility.is_pregnant {
                            pass.conceptions += 1;
                        }
                        fertility.is_pregnant = true;
                    }
                }
            }
        }

        let dies = self
            .population
            .get(id)
            .is_some_and(|individual| individual.age == individual.lifetime);
        if dies {
            if let Some(dead) = self.population.remove(id) {
                pass.deaths += 1;
                debug!(event = "death", individual = %id, age = dead.age, clock = now, "💀 Individual died");
            }
        } else if let Some(individual) = self.population.get_mut(id) {
            individual.age += 1;
            trace!(individual = %id, age = individual.age, clock = now, "Visited");
        }

        self.clock += 1;
    }

    fn result(&self) -> SimulationResult {
        SimulationResult {
            seed: self.seed,
            final_clock: self.clock,
            passes: self.passes,
            totals: self.totals,
            survivors: self.population.records(),
        }
    }
}
