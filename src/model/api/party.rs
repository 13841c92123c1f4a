use serde::{Deserialize, Serialize};

use crate::model::db::{NewParty, Party};

use super::ApiId;

/// A party specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySpec {
    pub name: String,
    #[serde(default)]
    pub about: Option<String>,
    /// Defaults to 1.
    #[serde(default)]
    pub relevance: Option<u16>,
}

impl From<PartySpec> for NewParty {
    fn from(spec: PartySpec) -> Self {
        Self {
            name: spec.name,
            about: spec.about,
            relevance: spec.relevance.unwrap_or(1),
        }
    }
}

/// An API-friendly party description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyDescription {
    pub id: ApiId,
    pub name: String,
    pub about: Option<String>,
    pub relevance: u16,
}

impl From<Party> for PartyDescription {
    fn from(party: Party) -> Self {
        Self {
            id: party.id.into(),
            name: party.party.name,
            about: party.party.about,
            relevance: party.party.relevance,
        }
    }
}
