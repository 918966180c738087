//! # Election Store Testkit
//!
//! Testing utilities for the Election Store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an [`ElectionStore`](election_store::ElectionStore) over
//!   either backend, plus a ready-made mayoral race
//! - **Generators**: Proptest strategies for registrations, zips, dates and
//!   vote sequences
//!
//! The integration tests under `tests/` run the same scenarios against
//! [`MemoryStore`](election_store_db::MemoryStore) and
//! [`SqliteStore`](election_store_db::SqliteStore).
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use election_store_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::memory();
//!     let race = fixture.mayoral_race().await.unwrap();
//!     fixture
//!         .es
//!         .cast_vote(race.carol, race.alice, race.office, "")
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use election_store_testkit::generators::zip;
//!
//! proptest! {
//!     #[test]
//!     fn zip_display_parses_back(z in zip()) {
//!         prop_assert_eq!(z.to_string().parse::<election_store_core::Zip>().unwrap(), z);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{date, init_tracing, MayoralRace, TestFixture};
pub use generators::{registration, vote_ops, zip, VoteOp};
