//! # Election Store
//!
//! Persistence and integrity layer for election management: elections,
//! offices, candidates, eligible voters and cast votes.
//!
//! ## Overview
//!
//! The Election Store enforces the rules that keep election data
//! consistent:
//!
//! - **One vote per voter per office**: casting is an atomic upsert with a
//!   caller-selectable conflict policy
//! - **Zip-based eligibility**: each office whitelists the zip codes whose
//!   voters may vote for it
//! - **Publication**: publishing an election derives candidate tallies from
//!   the votes present at that instant
//!
//! ## Lifecycle
//!
//! Elections are created `INACTIVE` and conventionally move through
//! `ACTIVE` and `CLOSED` to `PUBLISHED`. The progression is not enforced;
//! any status may be assigned at any time.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use election_store::{ElectionStore, ElectionStoreConfig};
//! use election_store::core::{NaiveDate, Registration, Status, Zip};
//! use election_store::db::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("elections.db").unwrap();
//!     let es = ElectionStore::new(store, ElectionStoreConfig::default());
//!
//!     let deadline = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
//!     let election = es.create_election(deadline).await.unwrap();
//!     let mayor = es.add_office(election, "Mayor").await.unwrap();
//!     let alice = es.add_candidate(mayor, "Alice", "").await.unwrap();
//!
//!     let zip = Zip::new(90210).unwrap();
//!     es.add_allowed_zip(mayor, zip).await.unwrap();
//!
//!     let dob = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
//!     let carol = es
//!         .register_voter(Registration::new("Carol", "Los Angeles", zip, dob))
//!         .await
//!         .unwrap();
//!
//!     es.cast_vote(carol, alice, mayor, "experience").await.unwrap();
//!     es.set_status(election, Status::Published).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `election_store::core` - Domain types (Election, Registration, Zip, ...)
//! - `election_store::db` - Storage abstraction, SQLite and in-memory stores

pub mod config;
pub mod error;
pub mod store;

// Re-export component crates
pub use election_store_core as core;
pub use election_store_db as db;

// Re-export main types for convenience
pub use config::{ElectionStoreConfig, PublishScope};
pub use error::{ElectionError, Result};
pub use store::ElectionStore;

pub use election_store_core::{
    Candidate, CandidateId, Election, ElectionId, Limits, Office, OfficeId, Registration, Status,
    Vote, VoterId, Zip,
};
pub use election_store_db::{CascadeSummary, CastOutcome, ConflictPolicy};
