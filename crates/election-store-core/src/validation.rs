//! Length limits and truncation for caller-supplied text.
//!
//! Two regimes apply. Office names, candidate names, candidate
//! descriptions and vote reasons are checked and rejected when they exceed
//! their limit. Voter names and counties are silently truncated to
//! `max_name_len` characters; over-length input is never an error there.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::voter::Registration;

/// Character limits for stored text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Office, candidate, voter and county names.
    pub max_name_len: usize,
    /// Candidate descriptions.
    pub max_desc_len: usize,
    /// Vote reasons.
    pub max_reason_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_name_len: 32,
            max_desc_len: 256,
            max_reason_len: 256,
        }
    }
}

impl Limits {
    /// A required name: non-blank and within `max_name_len`.
    pub fn check_name(&self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field });
        }
        check_len(field, value, self.max_name_len)
    }

    pub fn check_description(&self, value: &str) -> Result<(), ValidationError> {
        check_len("description", value, self.max_desc_len)
    }

    /// Reasons may be empty.
    pub fn check_reason(&self, value: &str) -> Result<(), ValidationError> {
        check_len("reason", value, self.max_reason_len)
    }

    /// Clamp a registration's name and county to `max_name_len`.
    pub fn truncate_registration(&self, mut registration: Registration) -> Registration {
        truncate_in_place(&mut registration.name, self.max_name_len);
        truncate_in_place(&mut registration.county, self.max_name_len);
        registration
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, len, max });
    }
    Ok(())
}

/// The longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn truncate_in_place(s: &mut String, max: usize) {
    let keep = truncate_chars(s, max).len();
    s.truncate(keep);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voter::Zip;
    use chrono::NaiveDate;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("", 0), "");
        // Multi-byte characters are never split.
        assert_eq!(truncate_chars("élan", 2), "él");
    }

    #[test]
    fn test_check_name() {
        let limits = Limits::default();
        assert!(limits.check_name("office name", "Mayor").is_ok());
        assert_eq!(
            limits.check_name("office name", "   "),
            Err(ValidationError::Empty { field: "office name" })
        );
        let long = "x".repeat(33);
        assert_eq!(
            limits.check_name("office name", &long),
            Err(ValidationError::TooLong {
                field: "office name",
                len: 33,
                max: 32
            })
        );
    }

    #[test]
    fn test_empty_reason_allowed() {
        assert!(Limits::default().check_reason("").is_ok());
    }

    #[test]
    fn test_truncate_registration() {
        let limits = Limits {
            max_name_len: 4,
            ..Limits::default()
        };
        let reg = Registration::new(
            "Caroline",
            "Los Angeles",
            Zip::new(90210).unwrap(),
            NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
        );
        let reg = limits.truncate_registration(reg);
        assert_eq!(reg.name, "Caro");
        assert_eq!(reg.county, "Los ");
        assert_eq!(reg.zip.get(), 90210);
    }

    #[test]
    fn test_limits_deserialize_partial() {
        let limits: Limits = serde_json::from_str(r#"{"max_name_len": 10}"#).unwrap();
        assert_eq!(limits.max_name_len, 10);
        assert_eq!(limits.max_desc_len, 256);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn truncate_chars_is_a_bounded_prefix(s in "\\PC{0,40}", max in 0usize..50) {
                let kept = truncate_chars(&s, max);
                prop_assert!(s.starts_with(kept));
                prop_assert_eq!(kept.chars().count(), s.chars().count().min(max));
            }

            #[test]
            fn check_name_agrees_with_char_count(s in "[a-zé ]{1,40}") {
                let limits = Limits::default();
                let result = limits.check_name("name", &s);
                if s.trim().is_empty() {
                    prop_assert!(
                        matches!(result, Err(ValidationError::Empty { .. })),
                        "blank name accepted"
                    );
                } else if s.chars().count() > limits.max_name_len {
                    prop_assert!(
                        matches!(result, Err(ValidationError::TooLong { .. })),
                        "long name accepted"
                    );
                } else {
                    prop_assert!(result.is_ok());
                }
            }
        }
    }
}
