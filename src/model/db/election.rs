use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Election title.
    pub title: String,
    /// Free-text details.
    pub details: Option<String>,
    /// Voting opens at this instant.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start: DateTime<Utc>,
    /// Voting closes at this instant.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end: DateTime<Utc>,
    /// Maximum number of ballots each voter may cast.
    pub votes_per_voter: u16,
}

impl ElectionCore {
    /// Create a new election.
    pub fn new(
        title: String,
        details: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        votes_per_voter: u16,
    ) -> Self {
        Self {
            title,
            details,
            start,
            end,
            votes_per_voter,
        }
    }

    /// Is voting allowed at the given instant? Both ends are inclusive.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }
}

/// An election without an ID.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Election {
    /// The real-time channel on which this election's tallies are published.
    pub fn state_channel(&self) -> String {
        state_channel(self.id)
    }
}

/// The real-time channel on which the tallies of the given election are published.
pub fn state_channel(election_id: Id) -> String {
    format!("election.state.{election_id}")
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}
