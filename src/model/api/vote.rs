use serde::{Deserialize, Serialize};

use crate::model::db::Vote;

use super::ApiId;

/// A request to cast one vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVote {
    pub candidate: ApiId,
}

/// Confirmation of an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub id: ApiId,
    pub election: ApiId,
    pub voter: ApiId,
    pub candidate: ApiId,
}

impl From<Vote> for VoteReceipt {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id.into(),
            election: vote.election_id.into(),
            voter: vote.voter_id.into(),
            candidate: vote.candidate_id.into(),
        }
    }
}
