use serde::{Deserialize, Serialize};

use super::ApiId;

/// Request to recompute an election's tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub election: ApiId,
}

/// Request to copy an election's roster into another election.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub election: ApiId,
    pub new_election: ApiId,
}
