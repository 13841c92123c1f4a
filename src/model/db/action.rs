use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Which administrative operation was run, and on what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    SyncVotes {
        election_id: Id,
    },
    CloneElection {
        election_id: Id,
        new_election_id: Id,
    },
}

/// Audit record of a processed administrative action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub name: String,
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub processed_at: DateTime<Utc>,
}
