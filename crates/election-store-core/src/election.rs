//! Elections, offices and candidates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::types::{CandidateId, ElectionId, OfficeId};

/// Lifecycle status of an election.
///
/// The conventional progression is `Inactive -> Active -> Closed ->
/// Published`, but any status may be assigned from any other. Only
/// `Inactive` (initial) and `Published` (triggers tallying) carry behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Inactive,
    Active,
    Closed,
    Published,
}

impl Status {
    /// Integer code used in storage.
    pub const fn code(self) -> i64 {
        match self {
            Status::Inactive => 0,
            Status::Active => 1,
            Status::Closed => 2,
            Status::Published => 3,
        }
    }

    /// Decode a storage code.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Status::Inactive),
            1 => Some(Status::Active),
            2 => Some(Status::Closed),
            3 => Some(Status::Published),
            _ => None,
        }
    }

    /// The next status in the conventional progression.
    pub const fn next(self) -> Option<Self> {
        match self {
            Status::Inactive => Some(Status::Active),
            Status::Active => Some(Status::Closed),
            Status::Closed => Some(Status::Published),
            Status::Published => None,
        }
    }

    pub const fn is_published(self) -> bool {
        matches!(self, Status::Published)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Inactive => "INACTIVE",
            Status::Active => "ACTIVE",
            Status::Closed => "CLOSED",
            Status::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for Status {
    type Error = ValidationError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Status::from_code(code).ok_or(ValidationError::UnknownStatus(code))
    }
}

/// A voting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub deadline: NaiveDate,
    pub status: Status,
}

/// A contested position within an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub election: ElectionId,
    pub name: String,
}

/// A contestant for an office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub office: OfficeId,
    pub name: String,
    pub description: String,
    /// Cached tally. Only meaningful once the owning election is published.
    pub vote_count: u32,
}
