use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A user account supplied by the identity provider, optionally linked to voters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: Id,
    pub full_name: String,
}

impl Identity {
    /// String form of the identity's ID, used as a derived voter ID number.
    pub fn str_id(&self) -> String {
        self.id.to_string()
    }
}
