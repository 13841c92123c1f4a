use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::model::{
    db::{Candidate, Election, Vote, VoteCore, Voter},
    mongodb::Id,
};
use crate::realtime::Emitter;
use crate::store::Store;

use super::tally;

/// Voting is only allowed within the election's window.
fn check_vote_time(election: &Election, now: DateTime<Utc>) -> Result<()> {
    if election.is_open_at(now) {
        Ok(())
    } else {
        Err(Error::ElectionClosed)
    }
}

/// A voter may only vote for candidates of their own election.
fn check_voter_registration(voter: &Voter, candidate: &Candidate) -> Result<()> {
    if voter.election_id == candidate.election_id {
        Ok(())
    } else {
        Err(Error::UnregisteredVoter)
    }
}

/// A voter may cast at most `votes_per_voter` ballots.
fn check_voter_votes(election: &Election, votes_cast: u64) -> Result<()> {
    if votes_cast + 1 > u64::from(election.votes_per_voter) {
        Err(Error::AlreadyVoted)
    } else {
        Ok(())
    }
}

/// The lowest quota slot the voter does not hold yet. Slots freed by deleted
/// votes are reused.
fn free_slot(election: &Election, taken: &[u32]) -> Result<u32> {
    (0..u32::from(election.votes_per_voter))
        .find(|slot| !taken.contains(slot))
        .ok_or(Error::AlreadyVoted)
}

/// Decide whether `voter` may cast one more vote for `candidate`, reporting
/// the first violated rule in order: timing, registration, quota.
///
/// `election` is the voter's election and `votes_cast` the number of votes
/// they already hold.
pub fn check_vote(
    election: &Election,
    voter: &Voter,
    candidate: &Candidate,
    votes_cast: u64,
    now: DateTime<Utc>,
) -> Result<()> {
    check_vote_time(election, now)?;
    check_voter_registration(voter, candidate)?;
    check_voter_votes(election, votes_cast)
}

/// Cast a vote and resynchronise the election's tallies.
///
/// The vote and the updated tallies are committed together, and the new
/// tally is published once they are. A rejected vote changes nothing.
pub async fn cast_vote(
    store: &dyn Store,
    emitter: &dyn Emitter,
    voter_id: Id,
    candidate_id: Id,
    now: DateTime<Utc>,
) -> Result<Vote> {
    let mut tx = store.begin().await?;
    let voter = tx
        .voter(voter_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))?;
    let candidate = tx
        .candidate(candidate_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    let election = tx
        .election(voter.election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", voter.election_id)))?;
    let slots = tx.vote_slots(voter_id).await?;

    if let Err(err) = check_vote(&election, &voter, &candidate, slots.len() as u64, now) {
        warn!("Rejected vote of voter {voter_id} for candidate {candidate_id}: {err}");
        return Err(err);
    }

    let vote = VoteCore {
        election_id: election.id,
        voter_id,
        candidate_id,
        slot: free_slot(&election, &slots)?,
    };
    let id = tx.insert_vote(&vote).await?;
    let state = tally::resync(tx.as_mut(), election.id).await?;
    tx.commit().await?;
    info!("Voter {voter_id} voted in election {}", election.id);

    tally::publish_state(emitter, election.id, &state);
    Ok(Vote { id, vote })
}
