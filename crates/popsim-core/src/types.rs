//! Core type definitions for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for an individual within one population.
///
/// Identifiers are handed out monotonically and never reused, so a partner
/// reference can never silently point at a different individual after a death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(pub u64);

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted gender tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderTag {
    Male,
    Female,
}

impl GenderTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderTag::Male => "Male",
            GenderTag::Female => "Female",
        }
    }
}

impl fmt::Display for GenderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenderTag {
    type Err = Error;

    /// Unknown tags are a data-integrity error, never defaulted.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Male" => Ok(GenderTag::Male),
            "Female" => Ok(GenderTag::Female),
            other => Err(Error::Validation(format!("Unknown gender tag: {:?}", other))),
        }
    }
}

/// Flat record shape exchanged with the persistence layer.
///
/// `pregnancy_age` and `children_count` are only meaningful for females and
/// are `None` for males.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    pub age: u32,
    pub relation_age: u32,
    pub lifetime: u32,
    pub gender: GenderTag,
    pub pregnancy_age: Option<f64>,
    pub children_count: Option<f64>,
}

impl IndividualRecord {
    pub fn male(age: u32, relation_age: u32, lifetime: u32) -> Self {
        Self {
            age,
            relation_age,
            lifetime,
            gender: GenderTag::Male,
            pregnancy_age: None,
            children_count: None,
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
            gender: GenderTag::Female,
            pregnancy_age: Some(pregnancy_age),
            children_count: Some(children_count),
        }
    }

    /// Fertility fields of a female record, or a validation error if either is missing.
    pub fn fertility_fields(&self) -> Result<(f64, f64)> {
        match (self.pregnancy_age, self.children_count) {
            (Some(pregnancy_age), Some(children_count)) => Ok((pregnancy_age, children_count)),
            _ => Err(Error::Validation(format!(
                "Female record missing fertility fields (pregnancy_age={:?}, children_count={:?})",
                self.pregnancy_age, self.children_count
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_tag_parse() {
        assert_eq!("Male".parse::<GenderTag>().unwrap(), GenderTag::Male);
        assert_eq!("Female".parse::<GenderTag>().unwrap(), GenderTag::Female);
        assert!(matches!(
            "female".parse::<GenderTag>(),
            Err(Error::Validation(_))
        ));
        assert!("".parse::<GenderTag>().is_err());
    }

    #[test]
    fn test_record_constructors() {
        let male = IndividualRecord::male(20, 16, 70);
        assert_eq!(male.gender, GenderTag::Male);
        assert!(male.pregnancy_age.is_none());
        assert!(male.children_count.is_none());

        let female = IndividualRecord::female(19, 16, 72, 27.5, 2.0);
        assert_eq!(female.fertility_fields().unwrap(), (27.5, 2.0));
    }

    #[test]
    fn test_missing_fertility_fields() {
        let mut female = IndividualRecord::female(19, 16, 72, 27.5, 2.0);
        female.children_count = None;
        assert!(matches!(female.fertility_fields(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_individual_id_ordering() {
        assert!(IndividualId(1) < IndividualId(2));
        assert_eq!(IndividualId(7).to_string(), "#7");
    }
}
