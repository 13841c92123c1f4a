use serde::{Deserialize, Serialize};

use crate::model::db::{Centre, NewCentre};

use super::ApiId;

/// A voting centre specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentreSpec {
    pub election: ApiId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<CentreSpec> for NewCentre {
    fn from(spec: CentreSpec) -> Self {
        Self {
            name: spec.name,
            location: spec.location,
            election_id: spec.election.into(),
        }
    }
}

/// An API-friendly voting centre description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentreDescription {
    pub id: ApiId,
    pub election: ApiId,
    pub name: String,
    pub location: Option<String>,
}

impl From<Centre> for CentreDescription {
    fn from(centre: Centre) -> Self {
        Self {
            id: centre.id.into(),
            election: centre.centre.election_id.into(),
            name: centre.centre.name,
            location: centre.centre.location,
        }
    }
}
