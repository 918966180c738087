//! JSON listings of voters and elections for external consumers.
//!
//! The voter listing format is `[{"name", "county", "zip", "dob"}]` with
//! every value a string: `zip` is the decimal zip number and `dob` is
//! `YYYY-MM-DD`.

use serde::{Deserialize, Serialize};

use crate::date::DateColumns;
use crate::election::{Election, Status};
use crate::types::ElectionId;
use crate::voter::Registration;

/// One entry of the voter listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterListing {
    pub name: String,
    pub county: String,
    pub zip: String,
    pub dob: String,
}

impl From<&Registration> for VoterListing {
    fn from(reg: &Registration) -> Self {
        Self {
            name: reg.name.clone(),
            county: reg.county.clone(),
            zip: reg.zip.get().to_string(),
            dob: DateColumns::from_date(reg.dob).iso_string(),
        }
    }
}

/// One entry of the election listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionListing {
    pub id: ElectionId,
    pub deadline: String,
    pub status: Status,
}

impl From<&Election> for ElectionListing {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id,
            deadline: DateColumns::from_date(election.deadline).iso_string(),
            status: election.status,
        }
    }
}

/// Render registrations as a pretty-printed JSON array.
pub fn voters_json(voters: &[Registration]) -> serde_json::Result<String> {
    let entries: Vec<VoterListing> = voters.iter().map(VoterListing::from).collect();
    serde_json::to_string_pretty(&entries)
}

/// Render elections as a pretty-printed JSON array.
pub fn elections_json(elections: &[Election]) -> serde_json::Result<String> {
    let entries: Vec<ElectionListing> = elections.iter().map(ElectionListing::from).collect();
    serde_json::to_string_pretty(&entries)
}
