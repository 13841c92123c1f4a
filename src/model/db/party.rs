use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core party data, as stored in the database. Parties are not tied to any election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCore {
    pub name: String,
    pub about: Option<String>,
    /// Higher is listed first.
    pub relevance: u16,
}

/// A party without an ID.
pub type NewParty = PartyCore;

/// A party from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub party: PartyCore,
}

impl Deref for Party {
    type Target = PartyCore;

    fn deref(&self) -> &Self::Target {
        &self.party
    }
}

impl DerefMut for Party {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.party
    }
}
