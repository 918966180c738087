//! Store trait: the abstract interface for election persistence.
//!
//! This trait allows the election store to be storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use election_store_core::{
    Candidate, CandidateId, Election, ElectionId, NaiveDate, Office, OfficeId, Registration,
    Status, Vote, VoterId, Zip,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What to do when a vote is cast for a (voter, office) pair that already
/// has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the existing vote untouched and report it.
    #[default]
    Reject,
    /// Replace the existing vote's candidate and reason.
    Overwrite,
}

/// Result of casting a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// No vote existed; a new one was recorded.
    Inserted,
    /// A vote existed and was overwritten.
    Replaced {
        /// The candidate the previous vote was for.
        previous: CandidateId,
    },
    /// A vote existed and the policy was [`ConflictPolicy::Reject`].
    Rejected {
        /// The candidate of the vote that stays in place.
        existing: CandidateId,
    },
}

/// Which candidates a tally recompute touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyScope {
    /// Only candidates whose office belongs to this election.
    Election(ElectionId),
    /// Every candidate in storage.
    Global,
}

/// Rows removed by a cascading election delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub offices: usize,
    pub candidates: usize,
    pub allowed_zips: usize,
    pub votes: usize,
}

/// The Store trait: async interface for election persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// Inserts whose parent row is missing (an office for an unknown election,
/// a vote for an unknown candidate, ...) fail with
/// [`StoreError::NotFound`](crate::StoreError::NotFound). Point lookups
/// return `None` for unknown ids.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Election Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert an election and return its generated id.
    async fn insert_election(&self, deadline: NaiveDate, status: Status) -> Result<ElectionId>;

    /// Get an election by id.
    async fn get_election(&self, id: ElectionId) -> Result<Option<Election>>;

    /// All elections, ordered by id.
    async fn list_elections(&self) -> Result<Vec<Election>>;

    /// Overwrite an election's status, optionally recomputing tallies in the
    /// same transaction.
    ///
    /// # Returns
    /// - `None` if the election does not exist (nothing is recomputed).
    /// - `Some(n)` where `n` is the number of candidates whose tally was
    ///   recomputed (`0` when `tally` is `None`).
    async fn update_status(
        &self,
        id: ElectionId,
        status: Status,
        tally: Option<TallyScope>,
    ) -> Result<Option<usize>>;

    /// Delete an election together with its offices, candidates, allowed
    /// zips and votes.
    ///
    /// Returns `None` if the election does not exist.
    async fn delete_election(&self, id: ElectionId) -> Result<Option<CascadeSummary>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Office & Candidate Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert an office under an election.
    async fn insert_office(&self, election: ElectionId, name: &str) -> Result<OfficeId>;

    /// Get an office by id.
    async fn get_office(&self, id: OfficeId) -> Result<Option<Office>>;

    /// Offices of an election, ordered by id.
    async fn list_offices(&self, election: ElectionId) -> Result<Vec<Office>>;

    /// Insert a candidate under an office with a zero tally.
    async fn insert_candidate(
        &self,
        office: OfficeId,
        name: &str,
        description: &str,
    ) -> Result<CandidateId>;

    /// Get a candidate by id.
    async fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>>;

    /// Candidates of an office, ordered by id.
    async fn list_candidates(&self, office: OfficeId) -> Result<Vec<Candidate>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Eligibility Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whitelist a zip code for an office. Duplicates are allowed.
    async fn insert_allowed_zip(&self, office: OfficeId, zip: Zip) -> Result<()>;

    /// Whether any whitelist entry matches (office, zip).
    async fn is_zip_allowed(&self, office: OfficeId, zip: Zip) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Voter Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a registration as given. No deduplication.
    async fn insert_voter(&self, registration: &Registration) -> Result<VoterId>;

    /// Get a registration by voter id.
    async fn get_voter(&self, id: VoterId) -> Result<Option<Registration>>;

    /// All registrations, ordered by voter id.
    async fn list_voters(&self) -> Result<Vec<Registration>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Vote Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of votes recorded for (voter, office).
    async fn count_votes(&self, voter: VoterId, office: OfficeId) -> Result<u32>;

    /// The vote recorded for (voter, office), if any.
    async fn get_vote(&self, voter: VoterId, office: OfficeId) -> Result<Option<Vote>>;

    /// Record a vote, keyed on (vote.voter, vote.office).
    ///
    /// The existence check and the write happen in one exclusive
    /// transaction, so concurrent calls for the same pair leave exactly one
    /// row behind.
    async fn upsert_vote(&self, vote: &Vote, policy: ConflictPolicy) -> Result<CastOutcome>;

    /// Change the candidate of an existing vote.
    ///
    /// Returns `false` (and changes nothing) if no vote exists for
    /// (voter, office).
    async fn update_vote(
        &self,
        voter: VoterId,
        candidate: CandidateId,
        office: OfficeId,
    ) -> Result<bool>;
}
