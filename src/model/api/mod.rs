//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

mod action;
mod candidate;
mod centre;
mod election;
mod id;
mod party;
mod vote;
mod voter;

pub use action::{CloneRequest, SyncRequest};
pub use candidate::{CandidateDescription, CandidateSpec};
pub use centre::{CentreDescription, CentreSpec};
pub use election::{ElectionDescription, ElectionSpec};
pub use id::ApiId;
pub use party::{PartyDescription, PartySpec};
pub use vote::{CastVote, VoteReceipt};
pub use voter::{VoterDescription, VoterSpec};
