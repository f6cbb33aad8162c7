//! Individual state and the per-individual life-event rules.

use crate::registry::{Distributions, LifeEvent};
use popsim_core::{GenderTag, IndividualId, IndividualRecord, Result};
use std::fmt;

/// Largest age difference allowed between partners
pub const MAX_PARTNER_AGE_GAP: u32 = 5;

/// A candidate is accepted when the uniform coin lands at or below this
pub const PAIRING_ACCEPTANCE: f64 = 0.5;

/// A newborn is male when the uniform coin lands strictly above this
pub const MALE_BIRTH_THRESHOLD: f64 = 0.5;

/// Multiplier applied to the inter-birth sample when a pair first forms
pub const PAIRING_SCHEDULE_SCALE: f64 = 100.0;

/// Fertility state carried only by females
#[derive(Debug, Clone, PartialEq)]
pub struct Fertility {
    pub is_pregnant: bool,
    /// Minimum age at which the fertility window can open
    pub pregnancy_age: f64,
    /// Remaining birth capacity
    pub children_count: f64,
}

impl Fertility {
    pub fn new(pregnancy_age: f64, children_count: f64) -> Self {
        Self {
            is_pregnant: false,
            pregnancy_age,
            children_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gender {
    Male,
    Female(Fertility),
}

impl Gender {
    pub fn tag(&self) -> GenderTag {
        match self {
            Gender::Male => GenderTag::Male,
            Gender::Female(_) => GenderTag::Female,
        }
    }
}

/// Outcome of a delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Birth {
    pub child: Individual,
    /// New `time_children` for the mother, to be mirrored onto her partner.
    /// `None` when her schedule was reset instead.
    pub rescheduled: Option<f64>,
}

/// One simulated person.
///
/// `partner` is a non-owning reference into the owning
/// [`Population`](crate::population::Population), which is the only place
/// allowed to change it so that bonds stay symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub age: u32,
    pub relation_age: u32,
    pub lifetime: u32,
    /// Clock value gating the fertility window
    pub time_children: f64,
    pub gender: Gender,
    partner: Option<IndividualId>,
}

impl Individual {
    pub fn male(age: u32, relation_age: u32, lifetime: u32) -> Self {
        Self {
            age,
            relation_age,
            lifetime,
            time_children: 0.0,
            gender: Gender::Male,
            partner: None,
        }
    }

    pub fn female(
        age: u32,
        relation_age: u32,
        lifetime: u32,
        pregnancy_age: f64,
        children_count: f64,
    ) -> Self {
        Self {
            age,
            relation_age,
            lifetime,
            time_children: 0.0,
            gender: Gender::Female(Fertility::new(pregnancy_age, children_count)),
            partner: None,
        }
    }

    /// A newborn of the given gender with every age-dependent trait freshly sampled.
    pub fn newborn(female: bool, distributions: &mut Distributions) -> Self {
        let mut child = if female {
            Self::female(0, 0, 0, 0.0, 0.0)
        } else {
            Self::male(0, 0, 0)
        };
        child.resample_traits(distributions);
        child
    }

    /// Draw lifetime and relation age, plus fertility traits for females.
    pub fn resample_traits(&mut self, distributions: &mut Distributions) {
        // Poisson draws are whole and non-negative; `as` saturates anything else
        self.lifetime = distributions.sample(LifeEvent::Die) as u32;
        self.relation_age = distributions.sample(LifeEvent::CapableEngaging) as u32;
        if let Gender::Female(fertility) = &mut self.gender {
            fertility.pregnancy_age = distributions.sample(LifeEvent::GetPregnant);
            fertility.children_count = distributions.sample(LifeEvent::ChildrenCount);
        }
    }

    pub fn partner(&self) -> Option<IndividualId> {
        self.partner
    }

    pub(crate) fn set_partner(&mut self, partner: Option<IndividualId>) {
        self.partner = partner;
    }

    pub fn is_female(&self) -> bool {
        matches!(self.gender, Gender::Female(_))
    }

    pub fn fertility(&self) -> Option<&Fertility> {
        match &self.gender {
            Gender::Female(fertility) => Some(fertility),
            Gender::Male => None,
        }
    }

    pub fn fertility_mut(&mut self) -> Option<&mut Fertility> {
        match &mut self.gender {
            Gender::Female(fertility) => Some(fertility),
            Gender::Male => None,
        }
    }

    pub fn is_pregnant(&self) -> bool {
        self.fertility().is_some_and(|f| f.is_pregnant)
    }

    pub fn is_eligible_for_relation(&self) -> bool {
        self.age >= self.relation_age && self.partner.is_none()
    }

    /// Opposite genders and at most [`MAX_PARTNER_AGE_GAP`] years apart.
    pub fn is_compatible_partner(&self, other: &Individual) -> bool {
        let opposite = matches!(
            (&self.gender, &other.gender),
            (Gender::Male, Gender::Female(_)) | (Gender::Female(_), Gender::Male)
        );
        opposite && self.age.abs_diff(other.age) <= MAX_PARTNER_AGE_GAP
    }

    pub fn is_engaged(&self) -> bool {
        self.partner.is_some()
    }

    /// Draw one uniform sample and decide whether the bond dissolves.
    ///
    /// Acceptance is banded by age: 14-20 at or below 0.7, 21-28 at or below
    /// 0.5, 29 and over at or below 0.2. Below 14 a bond never dissolves here,
    /// but the sample is still drawn.
    pub fn should_end_relation(&self, distributions: &mut Distributions) -> bool {
        let sample = distributions.sample(LifeEvent::BirthEngageDisengage);
        match self.age {
            14..=20 => sample <= 0.7,
            21..=28 => sample <= 0.5,
            29.. => sample <= 0.2,
            _ => false,
        }
    }

    /// Always false for males.
    pub fn is_fertility_window_open(&self, current_time: u64) -> bool {
        match &self.gender {
            Gender::Female(fertility) => {
                self.age as f64 >= fertility.pregnancy_age
                    && current_time as f64 <= self.time_children
                    && fertility.children_count > 0.0
            }
            Gender::Male => false,
        }
    }

    /// Deliver a child. Returns `None` for males.
    ///
    /// The mother's own schedule is updated here; mirroring a rescheduled
    /// `time_children` onto her partner is left to the population.
    pub fn give_birth(
        &mut self,
        distributions: &mut Distributions,
        current_time: u64,
    ) -> Option<Birth> {
        let engaged = self.is_engaged();
        let Gender::Female(fertility) = &mut self.gender else {
            return None;
        };

        let male = distributions.sample(LifeEvent::BirthEngageDisengage) > MALE_BIRTH_THRESHOLD;
        fertility.children_count -= 1.0;
        let child = Individual::newborn(!male, distributions);

        let rescheduled = if engaged && fertility.children_count > 0.0 {
            let next = current_time as f64 + distributions.sample(LifeEvent::TimeChildren);
            self.time_children = next;
            Some(next)
        } else {
            self.time_children = 0.0;
            None
        };
        fertility.is_pregnant = false;

        Some(Birth { child, rescheduled })
    }

    pub fn to_record(&self) -> IndividualRecord {
        match &self.gender {
            Gender::Male => IndividualRecord::male(self.age, self.relation_age, self.lifetime),
            Gender::Female(fertility) => IndividualRecord::female(
                self.age,
                self.relation_age,
                self.lifetime,
                fertility.pregnancy_age,
                fertility.children_count,
            ),
        }
    }

    /// Rebuild from a persisted record. Female records must carry both fertility fields.
    pub fn from_record(record: &IndividualRecord) -> Result<Self> {
        match record.gender {
            GenderTag::Male => Ok(Self::male(record.age, record.relation_age, record.lifetime)),
            GenderTag::Female => {
                let (pregnancy_age, children_count) = record.fertility_fields()?;
                Ok(Self::female(
                    record.age,
                    record.relation_age,
                    record.lifetime,
                    pregnancy_age,
                    children_count,
                ))
            }
        }
    }
}

impl TryFrom<&IndividualRecord> for Individual {
    type Error = popsim_core::Error;

    fn try_from(record: &IndividualRecord) -> Result<Self> {
        Individual::from_record(record)
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Age: {} Lifetime {} {}",
            self.age,
            self.lifetime,
            self.gender.tag()
        )
    }
}
