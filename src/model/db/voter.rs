use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{db::identity::Identity, mongodb::Id};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    pub election_id: Id,
    pub centre_id: Option<Id>,
    /// Linked identity, if any.
    pub user_id: Option<Id>,
    pub full_name: String,
    /// Unique within the election.
    pub id_number: String,
    /// Reserved ballot multiplier. Not consulted by the tally.
    pub weight: u16,
}

impl VoterCore {
    /// Create a new voter, deriving name and ID number from the linked identity
    /// when no name was given explicitly.
    pub fn new(
        election_id: Id,
        centre_id: Option<Id>,
        identity: Option<&Identity>,
        full_name: String,
        id_number: String,
        weight: u16,
    ) -> Result<Self> {
        let mut voter = Self {
            election_id,
            centre_id,
            user_id: identity.map(|identity| identity.id),
            full_name,
            id_number,
            weight,
        };
        voter.set_voter_details(identity);
        voter.check_voter_details()?;
        Ok(voter)
    }

    fn set_voter_details(&mut self, identity: Option<&Identity>) {
        match identity {
            Some(identity) if self.full_name.is_empty() => {
                self.full_name = identity.full_name.clone();
                self.id_number = identity.str_id();
            }
            _ => {}
        }
    }

    /// A voter needs either a linked identity, or both a name and an ID number.
    pub fn check_voter_details(&self) -> Result<()> {
        if self.user_id.is_some() || !(self.full_name.is_empty() || self.id_number.is_empty()) {
            Ok(())
        } else {
            Err(Error::MissingIdentityInfo)
        }
    }

    /// A copy of this voter registered in another election and centre.
    pub fn copy_to(&self, election_id: Id, centre_id: Option<Id>) -> Self {
        Self {
            election_id,
            centre_id,
            ..self.clone()
        }
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}
