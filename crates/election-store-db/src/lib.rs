//! # Election Store DB
//!
//! Storage abstraction for the Election Store. Provides a trait-based
//! interface for election persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait owns every invariant the storage engine does not
//! give for free. The primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for tests.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`CastOutcome`] - Result of casting a vote
//! - [`ConflictPolicy`] - What to do when a voter already voted for an office
//! - [`TallyScope`] - Which candidates a tally recompute touches
//! - [`CascadeSummary`] - Rows removed by deleting an election
//!
//! ## Usage
//!
//! ```rust,no_run
//! use election_store_db::{SqliteStore, Store};
//! use election_store_core::{NaiveDate, Status};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("elections.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let deadline = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
//!     let id = store.insert_election(deadline, Status::Inactive).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One vote per (voter, office)**: [`Store::upsert_vote`] checks and
//!   writes under one exclusive transaction, backed by a unique index.
//! - **Atomic publication**: the status change and the tally recompute
//!   commit together.
//! - **Explicit cascade**: deleting an election removes its offices,
//!   candidates, allowed zips and votes in one transaction.
//! - **Parameter binding only**: no statement is built from caller text.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CascadeSummary, CastOutcome, ConflictPolicy, Store, TallyScope};
