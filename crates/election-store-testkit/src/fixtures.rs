//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use election_store::{
    CandidateId, ElectionId, ElectionStore, ElectionStoreConfig, OfficeId, Registration, Result,
    VoterId, Zip,
};
use election_store_core::NaiveDate;
use election_store_db::{MemoryStore, SqliteStore, Store};

/// Build a date, panicking on an invalid one.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

/// An election store over a fresh backend.
pub struct TestFixture<S: Store> {
    pub es: ElectionStore<S>,
}

impl TestFixture<MemoryStore> {
    /// In-memory backend with default configuration.
    pub fn memory() -> Self {
        Self::new(MemoryStore::new(), ElectionStoreConfig::default())
    }
}

impl TestFixture<SqliteStore> {
    /// In-memory SQLite backend with default configuration.
    pub fn sqlite() -> Self {
        let store = SqliteStore::open_memory().expect("open in-memory sqlite");
        Self::new(store, ElectionStoreConfig::default())
    }
}

impl<S: Store> TestFixture<S> {
    pub fn new(store: S, config: ElectionStoreConfig) -> Self {
        init_tracing();
        Self {
            es: ElectionStore::new(store, config),
        }
    }

    /// Register a voter with a fixed county and date of birth.
    pub async fn voter(&self, name: &str, zip: Zip) -> Result<VoterId> {
        self.es
            .register_voter(Registration::new(name, "Los Angeles", zip, date(1980, 2, 14)))
            .await
    }

    /// Election on 2024-11-05 with a "Mayor" office, candidates Alice and
    /// Bob, zip 90210 whitelisted and voter Carol registered in 90210.
    pub async fn mayoral_race(&self) -> Result<MayoralRace> {
        let zip = Zip::new(90210)?;
        let election = self.es.create_election(date(2024, 11, 5)).await?;
        let office = self.es.add_office(election, "Mayor").await?;
        let alice = self.es.add_candidate(office, "Alice", "incumbent").await?;
        let bob = self.es.add_candidate(office, "Bob", "challenger").await?;
        self.es.add_allowed_zip(office, zip).await?;
        let carol = self.voter("Carol", zip).await?;

        Ok(MayoralRace {
            election,
            office,
            alice,
            bob,
            carol,
            zip,
        })
    }
}

/// Ids created by [`TestFixture::mayoral_race`].
#[derive(Debug, Clone, Copy)]
pub struct MayoralRace {
    pub election: ElectionId,
    pub office: OfficeId,
    pub alice: CandidateId,
    pub bob: CandidateId,
    pub carol: VoterId,
    pub zip: Zip,
}
