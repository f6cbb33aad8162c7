//! Binding of life-event categories to the distribution that samples them.

use crate::distribution::{ContinuousUniform, Exponential, Normal, Poisson, Sampler};
use popsim_core::{DistributionConfig, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Life-event categories that require a stochastic decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifeEvent {
    /// Minimum partnering age
    CapableEngaging,
    /// Accept/reject coin for pairing, dissolution and a newborn's gender
    BirthEngageDisengage,
    /// Pregnancy-eligibility age
    GetPregnant,
    /// Birth capacity
    ChildrenCount,
    /// Inter-birth scheduling
    TimeChildren,
    /// Lifetime
    Die,
}

impl LifeEvent {
    pub fn all() -> [LifeEvent; 6] {
        [
            LifeEvent::CapableEngaging,
            LifeEvent::BirthEngageDisengage,
            LifeEvent::GetPregnant,
            LifeEvent::ChildrenCount,
            LifeEvent::TimeChildren,
            LifeEvent::Die,
        ]
    }

    /// Stable ChaCha stream number for this event
    fn stream(&self) -> u64 {
        match self {
            LifeEvent::CapableEngaging => 0,
            LifeEvent::BirthEngageDisengage => 1,
            LifeEvent::GetPregnant => 2,
            LifeEvent::ChildrenCount => 3,
            LifeEvent::TimeChildren => 4,
            LifeEvent::Die => 5,
        }
    }
}

/// One sampler per life event, fixed for the lifetime of a run.
pub struct Distributions {
    pub capable_engaging: Box<dyn Sampler>,
    pub birth_engage_disengage: Box<dyn Sampler>,
    pub get_pregnant: Box<dyn Sampler>,
    pub children_count: Box<dyn Sampler>,
    pub time_children: Box<dyn Sampler>,
    pub die: Box<dyn Sampler>,
}

impl Distributions {
    /// Build the standard registry. Each event draws from its own ChaCha
    /// stream under the shared seed, so adding draws to one event never
    /// shifts another's sequence.
    pub fn from_config(config: &DistributionConfig, seed: u64) -> Result<Self> {
        let rng_for = |event: LifeEvent| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(event.stream());
            rng
        };

        Ok(Self {
            capable_engaging: Box::new(Poisson::new(
                config.capable_engaging_lambda,
                rng_for(LifeEvent::CapableEngaging),
            )?),
            birth_engage_disengage: Box::new(ContinuousUniform::new(rng_for(
                LifeEvent::BirthEngageDisengage,
            ))),
            get_pregnant: Box::new(Normal::new(
                config.get_pregnant_mean,
                config.get_pregnant_std_dev,
                rng_for(LifeEvent::GetPregnant),
            )?),
            children_count: Box::new(Normal::new(
                config.children_count_mean,
                config.children_count_std_dev,
                rng_for(LifeEvent::ChildrenCount),
            )?),
            time_children: Box::new(Exponential::new(
                config.time_children_lambda,
                rng_for(LifeEvent::TimeChildren),
            )?),
            die: Box::new(Poisson::new(config.die_lambda, rng_for(LifeEvent::Die))?),
        })
    }

    pub fn sampler_mut(&mut self, event: LifeEvent) -> &mut dyn Sampler {
        match event {
            LifeEvent::CapableEngaging => self.capable_engaging.as_mut(),
            LifeEvent::BirthEngageDisengage => self.birth_engage_disengage.as_mut(),
            LifeEvent::GetPregnant => self.get_pregnant.as_mut(),
            LifeEvent::ChildrenCount => self.children_count.as_mut(),
            LifeEvent::TimeChildren => self.time_children.as_mut(),
            LifeEvent::Die => self.die.as_mut(),
        }
    }

    pub fn sample(&mut self, event: LifeEvent) -> f64 {
        self.sampler_mut(event).sample()
    }
}
