//! Proptest generators for property-based testing.

use proptest::prelude::*;

use election_store_core::{NaiveDate, Registration, Zip};
use election_store_db::ConflictPolicy;

/// Generate a valid zip code.
pub fn zip() -> impl Strategy<Value = Zip> {
    (0u32..=Zip::MAX).prop_map(|z| Zip::new(z).expect("zip in range"))
}

/// Generate a calendar date between 1900 and 2099.
pub fn date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 is valid"))
}

/// Generate a person or county name up to `max_len` characters.
pub fn name(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            prop::char::range('a', 'z'),
            prop::char::range('A', 'Z'),
            Just(' '),
            Just('\''),
            Just('é'),
        ],
        1..=max_len.max(1),
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Generate a registration with names up to `max_len` characters.
pub fn registration(max_len: usize) -> impl Strategy<Value = Registration> {
    (name(max_len), name(max_len), zip(), date())
        .prop_map(|(name, county, zip, dob)| Registration::new(name, county, zip, dob))
}

/// Generate a conflict policy.
pub fn conflict_policy() -> impl Strategy<Value = ConflictPolicy> {
    prop_oneof![Just(ConflictPolicy::Reject), Just(ConflictPolicy::Overwrite)]
}

/// One step of a vote sequence. Indices select from the voters and
/// candidates a test has set up.
#[derive(Debug, Clone)]
pub enum VoteOp {
    Cast {
        voter: usize,
        candidate: usize,
        policy: ConflictPolicy,
    },
    Update {
        voter: usize,
        candidate: usize,
    },
}

/// Generate up to `max_len` vote operations over `voters` voters and
/// `candidates` candidates.
pub fn vote_ops(
    voters: usize,
    candidates: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<VoteOp>> {
    let op = prop_oneof![
        3 => (0..voters, 0..candidates, conflict_policy()).prop_map(
            |(voter, candidate, policy)| VoteOp::Cast {
                voter,
                candidate,
                policy,
            }
        ),
        1 => (0..voters, 0..candidates)
            .prop_map(|(voter, candidate)| VoteOp::Update { voter, candidate }),
    ];
    prop::collection::vec(op, 0..=max_len)
}
