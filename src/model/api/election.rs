use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::{Election, NewElection};

use super::ApiId;

/// An election specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    /// Voting opens at this instant.
    pub start: DateTime<Utc>,
    /// Voting closes after this instant.
    pub end: DateTime<Utc>,
    /// Defaults to 1.
    #[serde(default)]
    pub votes_per_voter: Option<u16>,
}

impl From<ElectionSpec> for NewElection {
    fn from(spec: ElectionSpec) -> Self {
        Self::new(
            spec.title,
            spec.details,
            spec.start,
            spec.end,
            spec.votes_per_voter.unwrap_or(1),
        )
    }
}

/// An API-friendly election description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: ApiId,
    pub title: String,
    pub details: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub votes_per_voter: u16,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id.into(),
            title: election.election.title,
            details: election.election.details,
            start: election.election.start,
            end: election.election.end,
            votes_per_voter: election.election.votes_per_voter,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::{Duration, SubsecRound};

    use super::*;

    impl ElectionSpec {
        /// An election open for the next day. Times are whole seconds so
        /// they survive a trip through any store unchanged.
        pub fn current_example() -> Self {
            let now = Utc::now().trunc_subsecs(0);
            Self {
                title: "General election".to_string(),
                details: Some("Choose the next council".to_string()),
                start: now - Duration::hours(1),
                end: now + Duration::days(1),
                votes_per_voter: None,
            }
        }
    }
}
