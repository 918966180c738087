//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Election Store. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use election_store_core::{
    Candidate, CandidateId, DateColumns, Election, ElectionId, NaiveDate, Office, OfficeId,
    Registration, Status, ValidationError, Vote, VoterId, Zip,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{CascadeSummary, CastOutcome, ConflictPolicy, Store, TallyScope};

/// How long a writer waits on another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ELECTION_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM elections WHERE id = ?1)";
const OFFICE_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM offices WHERE id = ?1)";
const CANDIDATE_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM candidates WHERE id = ?1)";
const VOTER_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM registrations WHERE id = ?1)";

const SELECT_ELECTION: &str =
    "SELECT id, deadline_day, deadline_mon, deadline_year, status FROM elections";
const SELECT_OFFICE: &str = "SELECT id, election_id, name FROM offices";
const SELECT_CANDIDATE: &str = "SELECT id, office_id, name, description, votes FROM candidates";
const SELECT_REGISTRATION: &str =
    "SELECT name, county, zip, dob_day, dob_mon, dob_year FROM registrations";

const TALLY_ALL: &str = "UPDATE candidates SET votes = (
        SELECT COUNT(*) FROM votes
        WHERE votes.candidate_id = candidates.id AND votes.office_id = candidates.office_id
    )";
const TALLY_ELECTION: &str = "UPDATE candidates SET votes = (
        SELECT COUNT(*) FROM votes
        WHERE votes.candidate_id = candidates.id AND votes.office_id = candidates.office_id
    )
    WHERE office_id IN (SELECT id FROM offices WHERE election_id = ?1)";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Writes that must be atomic open a
/// `BEGIN IMMEDIATE` transaction so other processes sharing the file
/// serialize behind them too.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and missing parent directories) and runs
    /// migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    Ok(conn.query_row(sql, params![id], |row| row.get(0))?)
}

fn require(conn: &Connection, sql: &str, id: i64, what: impl FnOnce() -> String) -> Result<()> {
    if exists(conn, sql, id)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(what()))
    }
}

fn invalid_column(idx: usize, err: ValidationError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err))
}

// Reads (day, month, year - 1900) starting at column `first`.
fn read_date(row: &Row<'_>, first: usize) -> rusqlite::Result<NaiveDate> {
    let columns = DateColumns {
        day: row.get(first)?,
        month: row.get(first + 1)?,
        year: row.get(first + 2)?,
    };
    columns.to_date().map_err(|e| invalid_column(first, e))
}

fn row_to_election(row: &Row<'_>) -> rusqlite::Result<Election> {
    let status: i64 = row.get(4)?;
    Ok(Election {
        id: ElectionId::new(row.get(0)?),
        deadline: read_date(row, 1)?,
        status: Status::try_from(status).map_err(|e| invalid_column(4, e))?,
    })
}

fn row_to_office(row: &Row<'_>) -> rusqlite::Result<Office> {
    Ok(Office {
        id: OfficeId::new(row.get(0)?),
        election: ElectionId::new(row.get(1)?),
        name: row.get(2)?,
    })
}

fn row_to_candidate(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    Ok(Candidate {
        id: CandidateId::new(row.get(0)?),
        office: OfficeId::new(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        vote_count: row.get(4)?,
    })
}

fn row_to_registration(row: &Row<'_>) -> rusqlite::Result<Registration> {
    let zip: u32 = row.get(2)?;
    Ok(Registration {
        name: row.get(0)?,
        county: row.get(1)?,
        zip: Zip::new(zip).map_err(|e| invalid_column(2, e))?,
        dob: read_date(row, 3)?,
    })
}

fn recompute_tallies(conn: &Connection, scope: TallyScope) -> Result<usize> {
    let updated = match scope {
        TallyScope::Global => conn.execute(TALLY_ALL, [])?,
        TallyScope::Election(id) => conn.execute(TALLY_ELECTION, params![id.get()])?,
    };
    Ok(updated)
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_election(&self, deadline: NaiveDate, status: Status) -> Result<ElectionId> {
        self.run(move |conn| {
            let cols = DateColumns::from_date(deadline);
            conn.execute(
                "INSERT INTO elections (deadline_day, deadline_mon, deadline_year, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![cols.day, cols.month, cols.year, status.code()],
            )?;
            Ok(ElectionId::new(conn.last_insert_rowid()))
        })
        .await
    }

    async fn get_election(&self, id: ElectionId) -> Result<Option<Election>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_ELECTION} WHERE id = ?1"),
                params![id.get()],
                row_to_election,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_elections(&self) -> Result<Vec<Election>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_ELECTION} ORDER BY id"))?;
            let elections = stmt
                .query_map([], row_to_election)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(elections)
        })
        .await
    }

    async fn update_status(
        &self,
        id: ElectionId,
        status: Status,
        tally: Option<TallyScope>,
    ) -> Result<Option<usize>> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let changed = tx.execute(
                "UPDATE elections SET status = ?1 WHERE id = ?2",
                params![status.code(), id.get()],
            )?;
            if changed == 0 {
                return Ok(None);
            }

            let recomputed = match tally {
                Some(scope) => recompute_tallies(&tx, scope)?,
                None => 0,
            };

            tx.commit()?;
            Ok(Some(recomputed))
        })
        .await
    }

    async fn delete_election(&self, id: ElectionId) -> Result<Option<CascadeSummary>> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !exists(&tx, ELECTION_EXISTS, id.get())? {
                return Ok(None);
            }

            // Children first so foreign keys hold at every step.
            let votes = tx.execute(
                "DELETE FROM votes
                 WHERE office_id IN (SELECT id FROM offices WHERE election_id = ?1)
                    OR candidate_id IN (
                        SELECT c.id FROM candidates c
                        JOIN offices o ON o.id = c.office_id
                        WHERE o.election_id = ?1
                    )",
                params![id.get()],
            )?;
            let allowed_zips = tx.execute(
                "DELETE FROM allowed_zips
                 WHERE office_id IN (SELECT id FROM offices WHERE election_id = ?1)",
                params![id.get()],
            )?;
            let candidates = tx.execute(
                "DELETE FROM candidates
                 WHERE office_id IN (SELECT id FROM offices WHERE election_id = ?1)",
                params![id.get()],
            )?;
            let offices = tx.execute(
                "DELETE FROM offices WHERE election_id = ?1",
                params![id.get()],
            )?;
            tx.execute("DELETE FROM elections WHERE id = ?1", params![id.get()])?;

            tx.commit()?;
            Ok(Some(CascadeSummary {
                offices,
                candidates,
                allowed_zips,
                votes,
            }))
        })
        .await
    }

    async fn insert_office(&self, election: ElectionId, name: &str) -> Result<OfficeId> {
        let name = name.to_owned();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            require(&tx, ELECTION_EXISTS, election.get(), || election.to_string())?;
            tx.execute(
                "INSERT INTO offices (name, election_id) VALUES (?1, ?2)",
                params![name, election.get()],
            )?;
            let id = OfficeId::new(tx.last_insert_rowid());
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn get_office(&self, id: OfficeId) -> Result<Option<Office>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_OFFICE} WHERE id = ?1"),
                params![id.get()],
                row_to_office,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_offices(&self, election: ElectionId) -> Result<Vec<Office>> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_OFFICE} WHERE election_id = ?1 ORDER BY id"))?;
            let offices = stmt
                .query_map(params![election.get()], row_to_office)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(offices)
        })
        .await
    }

    async fn insert_candidate(
        &self,
        office: OfficeId,
        name: &str,
        description: &str,
    ) -> Result<CandidateId> {
        let name = name.to_owned();
        let description = description.to_owned();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            require(&tx, OFFICE_EXISTS, office.get(), || office.to_string())?;
            tx.execute(
                "INSERT INTO candidates (name, description, votes, office_id)
                 VALUES (?1, ?2, 0, ?3)",
                params![name, description, office.get()],
            )?;
            let id = CandidateId::new(tx.last_insert_rowid());
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_CANDIDATE} WHERE id = ?1"),
                params![id.get()],
                row_to_candidate,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_candidates(&self, office: OfficeId) -> Result<Vec<Candidate>> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_CANDIDATE} WHERE office_id = ?1 ORDER BY id"))?;
            let candidates = stmt
                .query_map(params![office.get()], row_to_candidate)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(candidates)
        })
        .await
    }

    async fn insert_allowed_zip(&self, office: OfficeId, zip: Zip) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            require(&tx, OFFICE_EXISTS, office.get(), || office.to_string())?;
            tx.execute(
                "INSERT INTO allowed_zips (zip, office_id) VALUES (?1, ?2)",
                params![zip.get(), office.get()],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn is_zip_allowed(&self, office: OfficeId, zip: Zip) -> Result<bool> {
        self.run(move |conn| {
            let allowed: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM allowed_zips WHERE zip = ?1 AND office_id = ?2)",
                params![zip.get(), office.get()],
                |row| row.get(0),
            )?;
            Ok(allowed)
        })
        .await
    }

    async fn insert_voter(&self, registration: &Registration) -> Result<VoterId> {
        let registration = registration.clone();
        self.run(move |conn| {
            let dob = DateColumns::from_date(registration.dob);
            conn.execute(
                "INSERT INTO registrations (name, county, zip, dob_day, dob_mon, dob_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    registration.name,
                    registration.county,
                    registration.zip.get(),
                    dob.day,
                    dob.month,
                    dob.year,
                ],
            )?;
            Ok(VoterId::new(conn.last_insert_rowid()))
        })
        .await
    }

    async fn get_voter(&self, id: VoterId) -> Result<Option<Registration>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_REGISTRATION} WHERE id = ?1"),
                params![id.get()],
                row_to_registration,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_voters(&self) -> Result<Vec<Registration>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_REGISTRATION} ORDER BY id"))?;
            let voters = stmt
                .query_map([], row_to_registration)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(voters)
        })
        .await
    }

    async fn count_votes(&self, voter: VoterId, office: OfficeId) -> Result<u32> {
        self.run(move |conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM votes WHERE voter_id = ?1 AND office_id = ?2",
                params![voter.get(), office.get()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
    }

    async fn get_vote(&self, voter: VoterId, office: OfficeId) -> Result<Option<Vote>> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT candidate_id, reason FROM votes WHERE voter_id = ?1 AND office_id = ?2",
                params![voter.get(), office.get()],
                |row| {
                    Ok(Vote {
                        voter,
                        candidate: CandidateId::new(row.get(0)?),
                        office,
                        reason: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn upsert_vote(&self, vote: &Vote, policy: ConflictPolicy) -> Result<CastOutcome> {
        let vote = vote.clone();
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            require(&tx, VOTER_EXISTS, vote.voter.get(), || vote.voter.to_string())?;
            require(&tx, OFFICE_EXISTS, vote.office.get(), || vote.office.to_string())?;
            require(&tx, CANDIDATE_EXISTS, vote.candidate.get(), || {
                vote.candidate.to_string()
            })?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT candidate_id FROM votes WHERE voter_id = ?1 AND office_id = ?2",
                    params![vote.voter.get(), vote.office.get()],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match (existing, policy) {
                (None, _) => {
                    tx.execute(
                        "INSERT INTO votes (voter_id, candidate_id, office_id, reason)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            vote.voter.get(),
                            vote.candidate.get(),
                            vote.office.get(),
                            vote.reason,
                        ],
                    )?;
                    CastOutcome::Inserted
                }
                (Some(existing), ConflictPolicy::Reject) => {
                    return Ok(CastOutcome::Rejected {
                        existing: CandidateId::new(existing),
                    });
                }
                (Some(previous), ConflictPolicy::Overwrite) => {
                    tx.execute(
                        "UPDATE votes SET candidate_id = ?1, reason = ?2
                         WHERE voter_id = ?3 AND office_id = ?4",
                        params![
                            vote.candidate.get(),
                            vote.reason,
                            vote.voter.get(),
                            vote.office.get(),
                        ],
                    )?;
                    CastOutcome::Replaced {
                        previous: CandidateId::new(previous),
                    }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    async fn update_vote(
        &self,
        voter: VoterId,
        candidate: CandidateId,
        office: OfficeId,
    ) -> Result<bool> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let has_vote: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM votes WHERE voter_id = ?1 AND office_id = ?2)",
                params![voter.get(), office.get()],
                |row| row.get(0),
            )?;
            if !has_vote {
                return Ok(false);
            }
            require(&tx, CANDIDATE_EXISTS, candidate.get(), || candidate.to_string())?;

            tx.execute(
                "UPDATE votes SET candidate_id = ?1 WHERE voter_id = ?2 AND office_id = ?3",
                params![candidate.get(), voter.get(), office.get()],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }
}
