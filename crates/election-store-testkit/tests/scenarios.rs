//! End-to-end scenarios, run against every backend.

use anyhow::Result;
use election_store::{
    CastOutcome, ConflictPolicy, ElectionError, ElectionStore, ElectionStoreConfig, PublishScope,
    Status, Zip,
};
use election_store_db::{MemoryStore, SqliteStore, Store};
use election_store_testkit::{date, TestFixture};

/// Publishing counts Carol's vote for Alice and nothing for Bob.
async fn publish_counts_votes<S: Store>(fixture: TestFixture<S>) -> Result<()> {
    let es = &fixture.es;
    let race = fixture.mayoral_race().await?;

    assert!(es.is_zip_allowed(race.office, race.zip).await?);
    assert_eq!(
        es.cast_vote(race.carol, race.alice, race.office, "experience")
            .await?,
        CastOutcome::Inserted
    );
    es.set_status(race.election, Status::Published).await?;

    assert_eq!(es.get_candidate(race.alice).await?.vote_count, 1);
    assert_eq!(es.get_candidate(race.bob).await?.vote_count, 0);
    assert_eq!(
        es.get_election(race.election).await?.status,
        Status::Published
    );
    Ok(())
}

/// A second cast for the same (voter, office) is rejected, not duplicated.
async fn second_cast_rejected<S: Store>(fixture: TestFixture<S>) -> Result<()> {
    let es = &fixture.es;
    let race = fixture.mayoral_race().await?;

    es.cast_vote(race.carol, race.alice, race.office, "").await?;
    let err = es
        .cast_vote(race.carol, race.bob, race.office, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::AlreadyVoted { .. }));
    assert_eq!(es.get_vote_count(race.carol, race.office).await?, 1);

    // The supported way to change a vote.
    assert!(es.update_vote(race.carol, race.bob, race.office).await?);
    es.set_status(race.election, Status::Published).await?;
    assert_eq!(es.get_candidate(race.alice).await?.vote_count, 0);
    assert_eq!(es.get_candidate(race.bob).await?.vote_count, 1);
    Ok(())
}

/// Re-publishing with no new votes gives the same tallies; votes added
/// after publication only show up on the next publish.
async fn republish_is_idempotent<S: Store>(fixture: TestFixture<S>) -> Result<()> {
    let es = &fixture.es;
    let race = fixture.mayoral_race().await?;
    let dave = fixture.voter("Dave", race.zip).await?;

    es.cast_vote(race.carol, race.alice, race.office, "").await?;
    es.set_status(race.election, Status::Published).await?;
    es.set_status(race.election, Status::Published).await?;
    assert_eq!(es.get_candidate(race.alice).await?.vote_count, 1);

    es.cast_vote(dave, race.alice, race.office, "").await?;
    assert_eq!(es.get_candidate(race.alice).await?.vote_count, 1);

    es.set_status(race.election, Status::Published).await?;
    assert_eq!(es.get_candidate(race.alice).await?.vote_count, 2);
    Ok(())
}

/// Deleting an election removes its subtree and leaves other elections and
/// the voter registry alone.
async fn delete_cascades<S: Store>(fixture: TestFixture<S>) -> Result<()> {
    let es = &fixture.es;
    let doomed = fixture.mayoral_race().await?;
    let kept = fixture.mayoral_race().await?;

    es.cast_vote(doomed.carol, doomed.alice, doomed.office, "").await?;
    es.cast_vote(kept.carol, kept.bob, kept.office, "").await?;

    let summary = es.delete_election(doomed.election).await?;
    assert_eq!(summary.offices, 1);
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.allowed_zips, 1);
    assert_eq!(summary.votes, 1);

    assert!(matches!(
        es.get_election(doomed.election).await,
        Err(ElectionError::NotFound(_))
    ));
    assert!(matches!(
        es.get_office(doomed.office).await,
        Err(ElectionError::NotFound(_))
    ));
    assert!(!es.is_zip_allowed(doomed.office, doomed.zip).await?);
    assert_eq!(es.get_vote_count(doomed.carol, doomed.office).await?, 0);
    assert_eq!(es.get_voter(doomed.carol).await?.name, "Carol");

    assert_eq!(es.get_vote_count(kept.carol, kept.office).await?, 1);
    assert_eq!(es.list_offices(kept.election).await?.len(), 1);
    assert_eq!(es.list_elections().await?.len(), 1);
    Ok(())
}

/// Publish scope decides whether other elections are re-tallied.
async fn publish_scope<S: Store>(store: S, scope: PublishScope) -> Result<(u32, u32)> {
    let config = ElectionStoreConfig {
        publish_scope: scope,
        ..ElectionStoreConfig::default()
    };
    let fixture = TestFixture::new(store, config);
    let es = &fixture.es;
    let first = fixture.mayoral_race().await?;
    let second = fixture.mayoral_race().await?;

    es.cast_vote(first.carol, first.alice, first.office, "").await?;
    es.cast_vote(second.carol, second.alice, second.office, "").await?;
    es.set_status(first.election, Status::Published).await?;

    Ok((
        es.get_candidate(first.alice).await?.vote_count,
        es.get_candidate(second.alice).await?.vote_count,
    ))
}

/// Lookups for ids that never existed surface as `NotFound`.
async fn missing_ids<S: Store>(fixture: TestFixture<S>) -> Result<()> {
    use election_store::{CandidateId, ElectionId, OfficeId, VoterId};
    let es = &fixture.es;

    assert!(matches!(
        es.get_election(ElectionId::new(404)).await,
        Err(ElectionError::NotFound(_))
    ));
    assert!(matches!(
        es.get_voter(VoterId::new(404)).await,
        Err(ElectionError::NotFound(_))
    ));
    assert!(matches!(
        es.get_candidate(CandidateId::new(404)).await,
        Err(ElectionError::NotFound(_))
    ));
    assert!(matches!(
        es.add_candidate(OfficeId::new(404), "Nobody", "").await,
        Err(ElectionError::NotFound(_))
    ));
    assert!(matches!(
        es.add_allowed_zip(OfficeId::new(404), Zip::new(12345)?).await,
        Err(ElectionError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn memory_publish_counts_votes() -> Result<()> {
    publish_counts_votes(TestFixture::memory()).await
}

#[tokio::test]
async fn sqlite_publish_counts_votes() -> Result<()> {
    publish_counts_votes(TestFixture::sqlite()).await
}

#[tokio::test]
async fn memory_second_cast_rejected() -> Result<()> {
    second_cast_rejected(TestFixture::memory()).await
}

#[tokio::test]
async fn sqlite_second_cast_rejected() -> Result<()> {
    second_cast_rejected(TestFixture::sqlite()).await
}

#[tokio::test]
async fn memory_republish_is_idempotent() -> Result<()> {
    republish_is_idempotent(TestFixture::memory()).await
}

#[tokio::test]
async fn sqlite_republish_is_idempotent() -> Result<()> {
    republish_is_idempotent(TestFixture::sqlite()).await
}

#[tokio::test]
async fn memory_delete_cascades() -> Result<()> {
    delete_cascades(TestFixture::memory()).await
}

#[tokio::test]
async fn sqlite_delete_cascades() -> Result<()> {
    delete_cascades(TestFixture::sqlite()).await
}

#[tokio::test]
async fn memory_missing_ids() -> Result<()> {
    missing_ids(TestFixture::memory()).await
}

#[tokio::test]
async fn sqlite_missing_ids() -> Result<()> {
    missing_ids(TestFixture::sqlite()).await
}

#[tokio::test]
async fn publish_scope_per_election() -> Result<()> {
    assert_eq!(
        publish_scope(MemoryStore::new(), PublishScope::Election).await?,
        (1, 0)
    );
    assert_eq!(
        publish_scope(SqliteStore::open_memory()?, PublishScope::Election).await?,
        (1, 0)
    );
    Ok(())
}

#[tokio::test]
async fn publish_scope_global() -> Result<()> {
    assert_eq!(
        publish_scope(MemoryStore::new(), PublishScope::Global).await?,
        (1, 1)
    );
    assert_eq!(
        publish_scope(SqliteStore::open_memory()?, PublishScope::Global).await?,
        (1, 1)
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_casts_leave_one_vote() -> Result<()> {
    let fixture = TestFixture::sqlite();
    let race = fixture.mayoral_race().await?;

    let mut handles = Vec::new();
    for i in 0..16 {
        let es: ElectionStore<SqliteStore> = fixture.es.clone();
        let candidate = if i % 2 == 0 { race.alice } else { race.bob };
        handles.push(tokio::spawn(async move {
            es.cast_vote(race.carol, candidate, race.office, "race").await
        }));
    }

    let mut inserted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await? {
            Ok(CastOutcome::Inserted) => inserted += 1,
            Err(ElectionError::AlreadyVoted { .. }) => rejected += 1,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(rejected, 15);
    assert_eq!(fixture.es.get_vote_count(race.carol, race.office).await?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overwrites_leave_one_vote() -> Result<()> {
    let fixture = TestFixture::sqlite();
    let race = fixture.mayoral_race().await?;

    let mut handles = Vec::new();
    for i in 0..16 {
        let es = fixture.es.clone();
        let candidate = if i % 2 == 0 { race.alice } else { race.bob };
        handles.push(tokio::spawn(async move {
            es.cast_vote_with(
                race.carol,
                candidate,
                race.office,
                "",
                ConflictPolicy::Overwrite,
            )
            .await
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await?? == CastOutcome::Inserted {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(fixture.es.get_vote_count(race.carol, race.office).await?, 1);
    Ok(())
}

#[tokio::test]
async fn sqlite_file_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("elections.db");

    let race = {
        let fixture = TestFixture::new(SqliteStore::open(&path)?, ElectionStoreConfig::default());
        let race = fixture.mayoral_race().await?;
        fixture
            .es
            .cast_vote(race.carol, race.alice, race.office, "")
            .await?;
        race
    };

    let fixture = TestFixture::new(SqliteStore::open(&path)?, ElectionStoreConfig::default());
    let es = &fixture.es;
    assert_eq!(es.get_vote_count(race.carol, race.office).await?, 1);
    es.set_status(race.election, Status::Published).await?;
    assert_eq!(es.get_candidate(race.alice).await?.vote_count, 1);
    assert_eq!(es.get_election(race.election).await?.deadline, date(2024, 11, 5));
    Ok(())
}

#[tokio::test]
async fn listings_render_json() -> Result<()> {
    let fixture = TestFixture::sqlite();
    let race = fixture.mayoral_race().await?;
    fixture.es.advance(race.election).await?;

    let voters: serde_json::Value = serde_json::from_str(&fixture.es.voters_json().await?)?;
    assert_eq!(
        voters,
        serde_json::json!([{
            "name": "Carol",
            "county": "Los Angeles",
            "zip": "90210",
            "dob": "1980-02-14"
        }])
    );

    let elections: serde_json::Value =
        serde_json::from_str(&fixture.es.elections_json().await?)?;
    assert_eq!(
        elections,
        serde_json::json!([{
            "id": race.election.get(),
            "deadline": "2024-11-05",
            "status": "ACTIVE"
        }])
    );
    Ok(())
}
