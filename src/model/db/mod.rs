//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

mod action;
pub use action::{ActionKind, ActionRecord};

mod candidate;
pub use candidate::{Candidate, CandidateCore, NewCandidate};

mod centre;
pub use centre::{Centre, CentreCore, NewCentre};

mod election;
pub use election::{state_channel, Election, ElectionCore, NewElection};

mod identity;
pub use identity::Identity;

mod party;
pub use party::{NewParty, Party, PartyCore};

mod vote;
pub use vote::{NewVote, Vote, VoteCore};

mod voter;
pub use voter::{NewVoter, Voter, VoterCore};
