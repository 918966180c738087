//! Configuration for the Election Store.

use election_store_core::{ElectionId, Limits};
use election_store_db::{ConflictPolicy, TallyScope};
use serde::{Deserialize, Serialize};

/// Which candidates publishing an election re-tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishScope {
    /// Candidates of the published election's offices only.
    #[default]
    Election,
    /// Every candidate of every election.
    Global,
}

/// Configuration for the Election Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionStoreConfig {
    /// Tally scope applied when an election is published.
    pub publish_scope: PublishScope,
    /// Policy used by `cast_vote` when the voter already voted for the office.
    pub vote_conflict: ConflictPolicy,
    /// Refuse votes from voters whose zip is not whitelisted for the office.
    pub enforce_zip_eligibility: bool,
    /// Text limits.
    pub limits: Limits,
}

impl Default for ElectionStoreConfig {
    fn default() -> Self {
        Self {
            publish_scope: PublishScope::Election,
            vote_conflict: ConflictPolicy::Reject,
            enforce_zip_eligibility: true,
            limits: Limits::default(),
        }
    }
}

impl ElectionStoreConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub(crate) fn tally_scope(&self, election: ElectionId) -> TallyScope {
        match self.publish_scope {
            PublishScope::Election => TallyScope::Election(election),
            PublishScope::Global => TallyScope::Global,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ElectionStoreConfig::default();
        assert_eq!(config.publish_scope, PublishScope::Election);
        assert_eq!(config.vote_conflict, ConflictPolicy::Reject);
        assert!(config.enforce_zip_eligibility);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ElectionStoreConfig::from_json(
            r#"{"publish_scope": "global", "vote_conflict": "overwrite", "limits": {"max_reason_len": 10}}"#,
        )
        .unwrap();
        assert_eq!(config.publish_scope, PublishScope::Global);
        assert_eq!(config.vote_conflict, ConflictPolicy::Overwrite);
        assert!(config.enforce_zip_eligibility);
        assert_eq!(config.limits.max_reason_len, 10);
        assert_eq!(config.limits.max_name_len, 32);
    }

    #[test]
    fn test_tally_scope() {
        let id = ElectionId::new(4);
        let mut config = ElectionStoreConfig::default();
        assert_eq!(config.tally_scope(id), TallyScope::Election(id));
        config.publish_scope = PublishScope::Global;
        assert_eq!(config.tally_scope(id), TallyScope::Global);
    }

    #[test]
    fn test_unknown_scope_rejected() {
        assert!(ElectionStoreConfig::from_json(r#"{"publish_scope": "planet"}"#).is_err());
    }
}
