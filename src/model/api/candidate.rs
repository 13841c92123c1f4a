use serde::{Deserialize, Serialize};

use crate::model::db::{Candidate, NewCandidate};

use super::ApiId;

/// A candidate specification. Tallies always start at zero and cannot be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub election: ApiId,
    #[serde(default)]
    pub party: Option<ApiId>,
    #[serde(default)]
    pub user: Option<ApiId>,
    pub full_name: String,
    pub id_number: String,
    #[serde(default)]
    pub about: Option<String>,
}

impl From<CandidateSpec> for NewCandidate {
    fn from(spec: CandidateSpec) -> Self {
        Self::new(
            spec.election.into(),
            spec.party.map(Into::into),
            spec.user.map(Into::into),
            spec.full_name,
            spec.id_number,
            spec.about,
        )
    }
}

/// An API-friendly candidate description, including the cached tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: ApiId,
    pub election: ApiId,
    pub party: Option<ApiId>,
    pub user: Option<ApiId>,
    pub full_name: String,
    pub id_number: String,
    pub about: Option<String>,
    pub votes_count: u64,
    pub votes_percentage: f64,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        let Candidate { id, candidate } = candidate;
        Self {
            id: id.into(),
            election: candidate.election_id.into(),
            party: candidate.party_id.map(Into::into),
            user: candidate.user_id.map(Into::into),
            full_name: candidate.full_name,
            id_number: candidate.id_number,
            about: candidate.about,
            votes_count: candidate.votes_count,
            votes_percentage: candidate.votes_percentage,
        }
    }
}
