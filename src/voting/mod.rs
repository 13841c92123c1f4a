//! Election voting operations: vote admission, tallying, roster cloning and
//! the administrative actions wrapping them.

pub mod actions;
pub mod admission;
pub mod cloning;
pub mod tally;

#[cfg(test)]
mod fixtures;

pub use actions::{process, AdminAction, CloneElectionAction, SyncVotesAction};
pub use admission::{cast_vote, check_vote};
pub use cloning::{clone_roster, CloneReport};
pub use tally::{
    current_state, get_state, sync_votes, CandidateTally, TallyState, STATE_EVENT,
};
