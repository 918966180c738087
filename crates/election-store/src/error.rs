//! Error types for the Election Store.

use election_store_core::{CandidateId, OfficeId, ValidationError, VoterId, Zip};
use election_store_db::StoreError;
use thiserror::Error;

/// Errors that can occur during Election Store operations.
#[derive(Debug, Error)]
pub enum ElectionError {
    /// The storage engine failed to read or commit.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// A point lookup or a referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller-supplied value rejected before reaching storage.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The voter already has a vote for this office and the conflict policy
    /// is reject.
    #[error("{voter} already voted for {office} (candidate {existing})")]
    AlreadyVoted {
        voter: VoterId,
        office: OfficeId,
        existing: CandidateId,
    },

    /// The voter's zip is not whitelisted for the office.
    #[error("{voter} in zip {zip} is not eligible to vote for {office}")]
    NotEligible {
        voter: VoterId,
        office: OfficeId,
        zip: Zip,
    },

    /// The candidate does not run for the office the vote names.
    #[error("{candidate} is not running for {office}")]
    CandidateNotInOffice {
        candidate: CandidateId,
        office: OfficeId,
    },

    /// A listing could not be rendered.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for ElectionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ElectionError::NotFound(what),
            other => ElectionError::Storage(other),
        }
    }
}

/// Result type for Election Store operations.
pub type Result<T> = std::result::Result<T, ElectionError>;
