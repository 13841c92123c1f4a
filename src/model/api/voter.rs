use serde::{Deserialize, Serialize};

use crate::model::db::Voter;

use super::ApiId;

/// A voter specification.
///
/// Either `user` or both `full_name` and `id_number` must be given. With a
/// `user` and no `full_name`, both are taken from the user's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterSpec {
    pub election: ApiId,
    #[serde(default)]
    pub centre: Option<ApiId>,
    #[serde(default)]
    pub user: Option<ApiId>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub id_number: String,
    /// Defaults to 1.
    #[serde(default)]
    pub weight: Option<u16>,
}

/// An API-friendly voter description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDescription {
    pub id: ApiId,
    pub election: ApiId,
    pub centre: Option<ApiId>,
    pub user: Option<ApiId>,
    pub full_name: String,
    pub id_number: String,
    pub weight: u16,
}

impl From<Voter> for VoterDescription {
    fn from(voter: Voter) -> Self {
        let Voter { id, voter } = voter;
        Self {
            id: id.into(),
            election: voter.election_id.into(),
            centre: voter.centre_id.map(Into::into),
            user: voter.user_id.map(Into::into),
            full_name: voter.full_name,
            id_number: voter.id_number,
            weight: voter.weight,
        }
    }
}
