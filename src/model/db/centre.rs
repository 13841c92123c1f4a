use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core voting centre data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentreCore {
    pub name: String,
    pub location: Option<String>,
    pub election_id: Id,
}

/// A centre without an ID.
pub type NewCentre = CentreCore;

/// A voting centre from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Centre {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub centre: CentreCore,
}

impl Deref for Centre {
    type Target = CentreCore;

    fn deref(&self) -> &Self::Target {
        &self.centre
    }
}

impl DerefMut for Centre {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.centre
    }
}
