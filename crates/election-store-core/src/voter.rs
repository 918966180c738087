//! Voter registrations, zip codes and votes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::{CandidateId, OfficeId, VoterId};

/// A five-digit zip code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Zip(u32);

impl Zip {
    pub const MAX: u32 = 99_999;

    /// Validate a numeric zip code.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::InvalidZip(value.to_string()));
        }
        Ok(Self(value))
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for Zip {
    type Err = ValidationError;

    /// Parse exactly five ASCII digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 5 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidZip(s.to_string()));
        }
        s.parse::<u32>()
            .map_err(|_| ValidationError::InvalidZip(s.to_string()))
            .and_then(Zip::new)
    }
}

impl TryFrom<u32> for Zip {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Zip::new(value)
    }
}

impl From<Zip> for u32 {
    fn from(zip: Zip) -> Self {
        zip.0
    }
}

impl fmt::Debug for Zip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zip({:05})", self.0)
    }
}

impl fmt::Display for Zip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

/// A registered voter's biographical record.
///
/// Registrations are independent of any election. Nothing deduplicates
/// them: registering the same person twice yields two voter ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub county: String,
    pub zip: Zip,
    pub dob: NaiveDate,
}

impl Registration {
    pub fn new(
        name: impl Into<String>,
        county: impl Into<String>,
        zip: Zip,
        dob: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            county: county.into(),
            zip,
            dob,
        }
    }
}

/// A ballot cast by a voter for a candidate in an office.
///
/// At most one vote exists per (voter, office) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: VoterId,
    pub candidate: CandidateId,
    pub office: OfficeId,
    /// Free-text justification supplied by the voter.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_parse() {
        assert_eq!("90210".parse::<Zip>().unwrap().get(), 90210);
        assert_eq!("02134".parse::<Zip>().unwrap().get(), 2134);
        assert!("9021".parse::<Zip>().is_err());
        assert!("902100".parse::<Zip>().is_err());
        assert!("9021a".parse::<Zip>().is_err());
        assert!("+9021".parse::<Zip>().is_err());
    }

    #[test]
    fn test_zip_range() {
        assert!(Zip::new(99_999).is_ok());
        assert_eq!(
            Zip::new(100_000),
            Err(ValidationError::InvalidZip("100000".into()))
        );
    }

    #[test]
    fn test_zip_display_pads() {
        assert_eq!(Zip::new(2134).unwrap().to_string(), "02134");
    }

    #[test]
    fn test_zip_deserialize_validates() {
        assert!(serde_json::from_str::<Zip>("90210").is_ok());
        assert!(serde_json::from_str::<Zip>("123456").is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn zip_display_parses_back(value in 0u32..=Zip::MAX) {
                let zip = Zip::new(value).unwrap();
                let shown = zip.to_string();
                prop_assert_eq!(shown.len(), 5);
                prop_assert_eq!(shown.parse::<Zip>().unwrap(), zip);
            }

            #[test]
            fn zip_above_max_rejected(value in (Zip::MAX + 1)..=u32::MAX) {
                prop_assert!(Zip::new(value).is_err());
            }
        }
    }
}
