use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core vote data, as stored in the database. Votes are never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    /// Election of the voter, denormalised for counting.
    pub election_id: Id,
    pub voter_id: Id,
    pub candidate_id: Id,
    /// Quota slot taken by this ballot, below the election's `votes_per_voter`.
    /// `(voter_id, slot)` is unique, which caps concurrent casts at the quota.
    pub slot: u32,
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
