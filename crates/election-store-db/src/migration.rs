//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Dates are (day, month, year - 1900)
        CREATE TABLE elections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deadline_day INTEGER NOT NULL,
            deadline_mon INTEGER NOT NULL,
            deadline_year INTEGER NOT NULL,
            status INTEGER NOT NULL DEFAULT 0   -- 0=inactive, 1=active, 2=closed, 3=published
        );

        CREATE TABLE offices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            election_id INTEGER NOT NULL REFERENCES elections(id)
        );

        CREATE TABLE candidates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            votes INTEGER NOT NULL DEFAULT 0,   -- tally cache, written on publish
            office_id INTEGER NOT NULL REFERENCES offices(id)
        );

        -- Zip whitelist per office; duplicates are harmless
        CREATE TABLE allowed_zips (
            zip INTEGER NOT NULL,
            office_id INTEGER NOT NULL REFERENCES offices(id)
        );

        CREATE TABLE registrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            county TEXT NOT NULL,
            zip INTEGER NOT NULL,
            dob_day INTEGER NOT NULL,
            dob_mon INTEGER NOT NULL,
            dob_year INTEGER NOT NULL
        );

        CREATE TABLE votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            voter_id INTEGER NOT NULL REFERENCES registrations(id),
            candidate_id INTEGER NOT NULL REFERENCES candidates(id),
            office_id INTEGER NOT NULL REFERENCES offices(id),
            reason TEXT NOT NULL,

            UNIQUE(voter_id, office_id)
        );

        CREATE INDEX idx_offices_election ON offices(election_id);
        CREATE INDEX idx_candidates_office ON candidates(office_id);
        CREATE INDEX idx_allowed_zips_office_zip ON allowed_zips(office_id, zip);
        CREATE INDEX idx_votes_candidate_office ON votes(candidate_id, office_id);
        CREATE INDEX idx_votes_office ON votes(office_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "elections",
            "offices",
            "candidates",
            "allowed_zips",
            "registrations",
            "votes",
            "schema_migrations",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }

    #[test]
    fn test_votes_unique_per_voter_and_office() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute_batch(
            "INSERT INTO elections (deadline_day, deadline_mon, deadline_year) VALUES (5, 11, 124);
             INSERT INTO offices (name, election_id) VALUES ('Mayor', 1);
             INSERT INTO candidates (name, description, office_id) VALUES ('Alice', '', 1);
             INSERT INTO registrations (name, county, zip, dob_day, dob_mon, dob_year)
                 VALUES ('Carol', 'LA', 90210, 1, 1, 80);
             INSERT INTO votes (voter_id, candidate_id, office_id, reason) VALUES (1, 1, 1, '');",
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO votes (voter_id, candidate_id, office_id, reason) VALUES (1, 1, 1, 'again')",
            [],
        );
        assert!(dup.is_err());
    }
}
