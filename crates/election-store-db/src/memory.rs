//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use election_store_core::{
    Candidate, CandidateId, Election, ElectionId, NaiveDate, Office, OfficeId, Registration,
    Status, Vote, VoterId, Zip,
};

use crate::error::{Result, StoreError};
use crate::traits::{CascadeSummary, CastOutcome, ConflictPolicy, Store, TallyScope};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// write holds the write lock for its whole duration, which gives the same
/// atomicity as a SQLite transaction.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    elections: BTreeMap<ElectionId, Election>,
    offices: BTreeMap<OfficeId, Office>,
    candidates: BTreeMap<CandidateId, Candidate>,

    /// Whitelist entries in insertion order; duplicates allowed.
    allowed_zips: Vec<(OfficeId, Zip)>,

    voters: BTreeMap<VoterId, Registration>,

    /// Votes keyed by (voter, office).
    votes: BTreeMap<(VoterId, OfficeId), Vote>,

    /// Last generated id. Ids are never reused, matching AUTOINCREMENT.
    last_id: LastIds,
}

#[derive(Default)]
struct LastIds {
    election: i64,
    office: i64,
    candidate: i64,
    voter: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|e| poisoned(&e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|e| poisoned(&e))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(e: &dyn std::fmt::Display) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
        Some(format!("lock poisoned: {}", e)),
    ))
}

impl MemoryStoreInner {
    fn require_office(&self, id: OfficeId) -> Result<()> {
        if self.offices.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    fn require_candidate(&self, id: CandidateId) -> Result<()> {
        if self.candidates.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    fn recompute_tallies(&mut self, scope: TallyScope) -> usize {
        let mut counts: BTreeMap<(CandidateId, OfficeId), u32> = BTreeMap::new();
        for vote in self.votes.values() {
            *counts.entry((vote.candidate, vote.office)).or_default() += 1;
        }

        let offices = &self.offices;
        let mut updated = 0;
        for candidate in self.candidates.values_mut() {
            let in_scope = match scope {
                TallyScope::Global => true,
                TallyScope::Election(election) => offices
                    .get(&candidate.office)
                    .is_some_and(|office| office.election == election),
            };
            if in_scope {
                candidate.vote_count = counts
                    .get(&(candidate.id, candidate.office))
                    .copied()
                    .unwrap_or(0);
                updated += 1;
            }
        }
        updated
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_election(&self, deadline: NaiveDate, status: Status) -> Result<ElectionId> {
        let mut inner = self.write()?;
        let id = ElectionId::new(next(&mut inner.last_id.election));
        inner.elections.insert(
            id,
            Election {
                id,
                deadline,
                status,
            },
        );
        Ok(id)
    }

    async fn get_election(&self, id: ElectionId) -> Result<Option<Election>> {
        Ok(self.read()?.elections.get(&id).cloned())
    }

    async fn list_elections(&self) -> Result<Vec<Election>> {
        Ok(self.read()?.elections.values().cloned().collect())
    }

    async fn update_status(
        &self,
        id: ElectionId,
        status: Status,
        tally: Option<TallyScope>,
    ) -> Result<Option<usize>> {
        let mut inner = self.write()?;

        let Some(election) = inner.elections.get_mut(&id) else {
            return Ok(None);
        };
        election.status = status;

        let recomputed = match tally {
            Some(scope) => inner.recompute_tallies(scope),
            None => 0,
        };
        Ok(Some(recomputed))
    }

    async fn delete_election(&self, id: ElectionId) -> Result<Option<CascadeSummary>> {
        let mut inner = self.write()?;

        if inner.elections.remove(&id).is_none() {
            return Ok(None);
        }

        let offices: Vec<OfficeId> = inner
            .offices
            .values()
            .filter(|o| o.election == id)
            .map(|o| o.id)
            .collect();
        let candidates: Vec<CandidateId> = inner
            .candidates
            .values()
            .filter(|c| offices.contains(&c.office))
            .map(|c| c.id)
            .collect();

        let votes_before = inner.votes.len();
        inner
            .votes
            .retain(|_, v| !offices.contains(&v.office) && !candidates.contains(&v.candidate));
        let zips_before = inner.allowed_zips.len();
        inner
            .allowed_zips
            .retain(|(office, _)| !offices.contains(office));
        for candidate in &candidates {
            inner.candidates.remove(candidate);
        }
        for office in &offices {
            inner.offices.remove(office);
        }

        Ok(Some(CascadeSummary {
            offices: offices.len(),
            candidates: candidates.len(),
            allowed_zips: zips_before - inner.allowed_zips.len(),
            votes: votes_before - inner.votes.len(),
        }))
    }

    async fn insert_office(&self, election: ElectionId, name: &str) -> Result<OfficeId> {
        let mut inner = self.write()?;
        if !inner.elections.contains_key(&election) {
            return Err(StoreError::NotFound(election.to_string()));
        }
        let id = OfficeId::new(next(&mut inner.last_id.office));
        inner.offices.insert(
            id,
            Office {
                id,
                election,
                name: name.to_owned(),
            },
        );
        Ok(id)
    }

    async fn get_office(&self, id: OfficeId) -> Result<Option<Office>> {
        Ok(self.read()?.offices.get(&id).cloned())
    }

    async fn list_offices(&self, election: ElectionId) -> Result<Vec<Office>> {
        Ok(self
            .read()?
            .offices
            .values()
            .filter(|o| o.election == election)
            .cloned()
            .collect())
    }

    async fn insert_candidate(
        &self,
        office: OfficeId,
        name: &str,
        description: &str,
    ) -> Result<CandidateId> {
        let mut inner = self.write()?;
        inner.require_office(office)?;
        let id = CandidateId::new(next(&mut inner.last_id.candidate));
        inner.candidates.insert(
            id,
            Candidate {
                id,
                office,
                name: name.to_owned(),
                description: description.to_owned(),
                vote_count: 0,
            },
        );
        Ok(id)
    }

    async fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>> {
        Ok(self.read()?.candidates.get(&id).cloned())
    }

    async fn list_candidates(&self, office: OfficeId) -> Result<Vec<Candidate>> {
        Ok(self
            .read()?
            .candidates
            .values()
            .filter(|c| c.office == office)
            .cloned()
            .collect())
    }

    async fn insert_allowed_zip(&self, office: OfficeId, zip: Zip) -> Result<()> {
        let mut inner = self.write()?;
        inner.require_office(office)?;
        inner.allowed_zips.push((office, zip));
        Ok(())
    }

    async fn is_zip_allowed(&self, office: OfficeId, zip: Zip) -> Result<bool> {
        Ok(self.read()?.allowed_zips.contains(&(office, zip)))
    }

    async fn insert_voter(&self, registration: &Registration) -> Result<VoterId> {
        let mut inner = self.write()?;
        let id = VoterId::new(next(&mut inner.last_id.voter));
        inner.voters.insert(id, registration.clone());
        Ok(id)
    }

    async fn get_voter(&self, id: VoterId) -> Result<Option<Registration>> {
        Ok(self.read()?.voters.get(&id).cloned())
    }

    async fn list_voters(&self) -> Result<Vec<Registration>> {
        Ok(self.read()?.voters.values().cloned().collect())
    }

    async fn count_votes(&self, voter: VoterId, office: OfficeId) -> Result<u32> {
        Ok(u32::from(self.read()?.votes.contains_key(&(voter, office))))
    }

    async fn get_vote(&self, voter: VoterId, office: OfficeId) -> Result<Option<Vote>> {
        Ok(self.read()?.votes.get(&(voter, office)).cloned())
    }

    async fn upsert_vote(&self, vote: &Vote, policy: ConflictPolicy) -> Result<CastOutcome> {
        let mut inner = self.write()?;

        if !inner.voters.contains_key(&vote.voter) {
            return Err(StoreError::NotFound(vote.voter.to_string()));
        }
        inner.require_office(vote.office)?;
        inner.require_candidate(vote.candidate)?;

        let key = (vote.voter, vote.office);
        let existing = inner.votes.get(&key).map(|v| v.candidate);
        match (existing, policy) {
            (None, _) => {
                inner.votes.insert(key, vote.clone());
                Ok(CastOutcome::Inserted)
            }
            (Some(existing), ConflictPolicy::Reject) => Ok(CastOutcome::Rejected { existing }),
            (Some(previous), ConflictPolicy::Overwrite) => {
                inner.votes.insert(key, vote.clone());
                Ok(CastOutcome::Replaced { previous })
            }
        }
    }

    async fn update_vote(
        &self,
        voter: VoterId,
        candidate: CandidateId,
        office: OfficeId,
    ) -> Result<bool> {
        let mut inner = self.write()?;

        if !inner.votes.contains_key(&(voter, office)) {
            return Ok(false);
        }
        inner.require_candidate(candidate)?;

        if let Some(vote) = inner.votes.get_mut(&(voter, office)) {
            vote.candidate = candidate;
        }
        Ok(true)
    }
}
