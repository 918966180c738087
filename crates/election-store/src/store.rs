//! The Election Store: election lifecycle, registries and vote casting.
//!
//! `ElectionStore` validates input, applies eligibility and conflict
//! policy, and delegates every read and atomic write to a [`Store`].

use std::sync::Arc;

use election_store_core::{
    elections_json, voters_json, Candidate, CandidateId, Election, ElectionId, NaiveDate, Office,
    OfficeId, Registration, Status, Vote, VoterId, Zip,
};
use election_store_db::{CascadeSummary, CastOutcome, ConflictPolicy, Store};

use crate::config::ElectionStoreConfig;
use crate::error::{ElectionError, Result};

/// The Election Store.
///
/// Holds an explicitly passed storage handle; independent instances over
/// independent stores share nothing.
pub struct ElectionStore<S: Store> {
    store: Arc<S>,
    config: ElectionStoreConfig,
}

impl<S: Store> Clone for ElectionStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> ElectionStore<S> {
    pub fn new(store: S, config: ElectionStoreConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ElectionStoreConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Election Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an election in the `Inactive` status.
    pub async fn create_election(&self, deadline: NaiveDate) -> Result<ElectionId> {
        let id = self.store.insert_election(deadline, Status::Inactive).await?;
        tracing::info!(election = %id, %deadline, "created election");
        Ok(id)
    }

    /// Overwrite an election's status.
    ///
    /// Any status may follow any other. Setting `Published` recomputes
    /// candidate tallies in the same transaction, over the scope chosen by
    /// [`ElectionStoreConfig::publish_scope`].
    pub async fn set_status(&self, id: ElectionId, status: Status) -> Result<()> {
        let previous = self.get_election(id).await?.status;
        if previous.next() != Some(status) && previous != status {
            tracing::debug!(
                election = %id,
                from = %previous,
                to = %status,
                "status change outside the usual progression"
            );
        }

        let tally = status
            .is_published()
            .then(|| self.config.tally_scope(id));

        let recomputed = self
            .store
            .update_status(id, status, tally)
            .await?
            .ok_or_else(|| ElectionError::NotFound(id.to_string()))?;

        if status.is_published() {
            tracing::info!(
                election = %id,
                scope = ?self.config.publish_scope,
                candidates = recomputed,
                "published election"
            );
        } else {
            tracing::info!(election = %id, from = %previous, to = %status, "changed election status");
        }
        Ok(())
    }

    /// Move an election one step along the usual progression and return the
    /// new status.
    pub async fn advance(&self, id: ElectionId) -> Result<Status> {
        let current = self.get_election(id).await?.status;
        let next = current.next().unwrap_or(current);
        if next != current {
            self.set_status(id, next).await?;
        }
        Ok(next)
    }

    /// Delete an election and everything hanging off it: offices,
    /// candidates, allowed zips and votes. Voter registrations stay.
    pub async fn delete_election(&self, id: ElectionId) -> Result<CascadeSummary> {
        let summary = self
            .store
            .delete_election(id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(id.to_string()))?;
        tracing::info!(
            election = %id,
            offices = summary.offices,
            candidates = summary.candidates,
            allowed_zips = summary.allowed_zips,
            votes = summary.votes,
            "deleted election"
        );
        Ok(summary)
    }

    pub async fn get_election(&self, id: ElectionId) -> Result<Election> {
        self.store
            .get_election(id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(id.to_string()))
    }

    /// All elections, ordered by id.
    pub async fn list_elections(&self) -> Result<Vec<Election>> {
        Ok(self.store.list_elections().await?)
    }

    /// JSON array of `{id, deadline, status}`.
    pub async fn elections_json(&self) -> Result<String> {
        let elections = self.list_elections().await?;
        Ok(elections_json(&elections)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Office & Candidate Registry
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_office(&self, election: ElectionId, name: &str) -> Result<OfficeId> {
        self.config.limits.check_name("office name", name)?;
        let id = self.store.insert_office(election, name).await?;
        tracing::debug!(%election, office = %id, name, "added office");
        Ok(id)
    }

    pub async fn get_office(&self, id: OfficeId) -> Result<Office> {
        self.store
            .get_office(id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(id.to_string()))
    }

    pub async fn list_offices(&self, election: ElectionId) -> Result<Vec<Office>> {
        Ok(self.store.list_offices(election).await?)
    }

    /// Register a candidate for an office with a zero tally.
    pub async fn add_candidate(
        &self,
        office: OfficeId,
        name: &str,
        description: &str,
    ) -> Result<CandidateId> {
        self.config.limits.check_name("candidate name", name)?;
        self.config.limits.check_description(description)?;
        let id = self.store.insert_candidate(office, name, description).await?;
        tracing::debug!(%office, candidate = %id, name, "added candidate");
        Ok(id)
    }

    pub async fn get_candidate(&self, id: CandidateId) -> Result<Candidate> {
        self.store
            .get_candidate(id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(id.to_string()))
    }

    pub async fn list_candidates(&self, office: OfficeId) -> Result<Vec<Candidate>> {
        Ok(self.store.list_candidates(office).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Eligibility Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Whitelist a zip for an office. Adding the same pair twice is harmless.
    pub async fn add_allowed_zip(&self, office: OfficeId, zip: Zip) -> Result<()> {
        self.store.insert_allowed_zip(office, zip).await?;
        tracing::debug!(%office, %zip, "allowed zip");
        Ok(())
    }

    pub async fn is_zip_allowed(&self, office: OfficeId, zip: Zip) -> Result<bool> {
        Ok(self.store.is_zip_allowed(office, zip).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Voter Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a voter. Name and county are truncated to the configured
    /// maximum; the same person may be registered more than once.
    pub async fn register_voter(&self, registration: Registration) -> Result<VoterId> {
        let registration = self.config.limits.truncate_registration(registration);
        let id = self.store.insert_voter(&registration).await?;
        tracing::debug!(voter = %id, zip = %registration.zip, "registered voter");
        Ok(id)
    }

    /// Look up a registration, truncating name and county to the configured
    /// maximum.
    pub async fn get_voter(&self, id: VoterId) -> Result<Registration> {
        let registration = self
            .store
            .get_voter(id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(id.to_string()))?;
        Ok(self.config.limits.truncate_registration(registration))
    }

    /// All registrations in storage order.
    pub async fn list_voters(&self) -> Result<Vec<Registration>> {
        Ok(self.store.list_voters().await?)
    }

    /// JSON array of `{name, county, zip, dob}`.
    pub async fn voters_json(&self) -> Result<String> {
        let voters = self.list_voters().await?;
        Ok(voters_json(&voters)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vote Casting
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of votes held by (voter, office). Never more than one.
    pub async fn get_vote_count(&self, voter: VoterId, office: OfficeId) -> Result<u32> {
        Ok(self.store.count_votes(voter, office).await?)
    }

    pub async fn get_vote(&self, voter: VoterId, office: OfficeId) -> Result<Option<Vote>> {
        Ok(self.store.get_vote(voter, office).await?)
    }

    /// Cast a vote using the configured conflict policy.
    pub async fn cast_vote(
        &self,
        voter: VoterId,
        candidate: CandidateId,
        office: OfficeId,
        reason: &str,
    ) -> Result<CastOutcome> {
        self.cast_vote_with(voter, candidate, office, reason, self.config.vote_conflict)
            .await
    }

    /// Cast a vote with an explicit conflict policy.
    ///
    /// The check for an existing vote and the write are one atomic storage
    /// operation. Under [`ConflictPolicy::Reject`] a second vote for the same
    /// (voter, office) fails with [`ElectionError::AlreadyVoted`]; under
    /// [`ConflictPolicy::Overwrite`] it replaces the first.
    pub async fn cast_vote_with(
        &self,
        voter: VoterId,
        candidate: CandidateId,
        office: OfficeId,
        reason: &str,
        policy: ConflictPolicy,
    ) -> Result<CastOutcome> {
        self.config.limits.check_reason(reason)?;
        self.check_candidate_runs(candidate, office).await?;

        if self.config.enforce_zip_eligibility {
            let zip = self.get_voter(voter).await?.zip;
            if !self.store.is_zip_allowed(office, zip).await? {
                tracing::warn!(%voter, %office, %zip, "refused vote from ineligible zip");
                return Err(ElectionError::NotEligible { voter, office, zip });
            }
        }

        let vote = Vote {
            voter,
            candidate,
            office,
            reason: reason.to_owned(),
        };
        match self.store.upsert_vote(&vote, policy).await? {
            CastOutcome::Rejected { existing } => {
                tracing::warn!(%voter, %office, %existing, "rejected duplicate vote");
                Err(ElectionError::AlreadyVoted {
                    voter,
                    office,
                    existing,
                })
            }
            outcome => {
                tracing::debug!(%voter, %office, %candidate, ?outcome, "cast vote");
                Ok(outcome)
            }
        }
    }

    /// Point an existing vote at a different candidate.
    ///
    /// Returns `false` without changing anything when the voter has no vote
    /// for the office.
    pub async fn update_vote(
        &self,
        voter: VoterId,
        candidate: CandidateId,
        office: OfficeId,
    ) -> Result<bool> {
        self.check_candidate_runs(candidate, office).await?;
        let updated = self.store.update_vote(voter, candidate, office).await?;
        tracing::debug!(%voter, %office, %candidate, updated, "update vote");
        Ok(updated)
    }

    async fn check_candidate_runs(&self, candidate: CandidateId, office: OfficeId) -> Result<()> {
        let runs_for = self.get_candidate(candidate).await?.office;
        if runs_for != office {
            return Err(ElectionError::CandidateNotInOffice { candidate, office });
        }
        Ok(())
    }
}
