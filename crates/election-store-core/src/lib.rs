//! # Election Store Core
//!
//! Pure domain types for the Election Store: elections, offices, candidates,
//! voter registrations and votes.
//!
//! This crate contains no I/O and no storage. Persistence lives in
//! `election-store-db`; the operational API lives in `election-store`.
//!
//! ## Key Types
//!
//! - [`Election`] - A voting event with a deadline and a [`Status`]
//! - [`Office`] - A contested position within an election
//! - [`Candidate`] - A contestant for an office, carrying a published tally
//! - [`Registration`] - A registered voter's biographical record
//! - [`Vote`] - A ballot linking a voter, a candidate and an office
//! - [`Zip`] - A validated five-digit zip code
//!
//! ## Dates
//!
//! Calendar dates are [`chrono::NaiveDate`]. Storage keeps them as
//! `(day, month, year - 1900)` columns; see the [`date`] module.

pub mod date;
pub mod election;
pub mod error;
pub mod listing;
pub mod types;
pub mod validation;
pub mod voter;

pub use chrono::NaiveDate;
pub use date::{DateColumns, YEAR_OFFSET};
pub use election::{Candidate, Election, Office, Status};
pub use error::ValidationError;
pub use listing::{elections_json, voters_json, ElectionListing, VoterListing};
pub use types::{CandidateId, ElectionId, OfficeId, VoterId};
pub use validation::{truncate_chars, Limits};
pub use voter::{Registration, Vote, Zip};
