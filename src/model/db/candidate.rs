use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
///
/// `votes_count` and `votes_percentage` are a cache of the last tally sync,
/// never an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub election_id: Id,
    pub party_id: Option<Id>,
    pub user_id: Option<Id>,
    pub full_name: String,
    /// Unique within the election.
    pub id_number: String,
    pub about: Option<String>,
    pub votes_count: u64,
    pub votes_percentage: f64,
}

impl CandidateCore {
    /// Create a new candidate with an empty tally.
    pub fn new(
        election_id: Id,
        party_id: Option<Id>,
        user_id: Option<Id>,
        full_name: String,
        id_number: String,
        about: Option<String>,
    ) -> Self {
        Self {
            election_id,
            party_id,
            user_id,
            full_name,
            id_number,
            about,
            votes_count: 0,
            votes_percentage: 0.0,
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
