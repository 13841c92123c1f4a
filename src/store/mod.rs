//! Persistence for all election records.
//!
//! All access goes through a [`Transaction`]; a transaction that is dropped
//! without being committed is rolled back.

use crate::error::Result;
use crate::model::{
    db::{
        ActionRecord, Candidate, Centre, Election, Identity, NewCandidate, NewCentre,
        NewElection, NewParty, NewVote, NewVoter, Party, Voter,
    },
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// A store shared between requests.
pub type DynStore = Box<dyn Store>;

/// Which voters to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterFilter {
    /// Every voter registered in the election.
    Election(Id),
    /// Voters assigned to the centre.
    Centre(Id),
    /// Voters of the election without a centre.
    Unassigned(Id),
}

/// A transactional record store.
#[rocket::async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}

/// An open transaction against a [`Store`].
///
/// Listing operations return records in creation order, except for parties,
/// which are ordered by descending relevance.
///
/// Inserts that would break a uniqueness rule fail without writing anything,
/// and the transaction stays usable.
#[rocket::async_trait]
pub trait Transaction: Send {
    async fn election(&mut self, id: Id) -> Result<Option<Election>>;
    async fn elections(&mut self) -> Result<Vec<Election>>;
    async fn insert_election(&mut self, election: &NewElection) -> Result<Id>;
    /// Delete the election along with its candidates, centres, voters and votes.
    async fn delete_election(&mut self, id: Id) -> Result<bool>;

    async fn party(&mut self, id: Id) -> Result<Option<Party>>;
    async fn parties(&mut self) -> Result<Vec<Party>>;
    async fn insert_party(&mut self, party: &NewParty) -> Result<Id>;
    /// Delete the party, unlinking its candidates.
    async fn delete_party(&mut self, id: Id) -> Result<bool>;

    async fn candidate(&mut self, id: Id) -> Result<Option<Candidate>>;
    async fn candidates(&mut self, election_id: Id) -> Result<Vec<Candidate>>;
    /// Fails with `DuplicateVoterOrCandidate` if the ID number is taken in the election.
    async fn insert_candidate(&mut self, candidate: &NewCandidate) -> Result<Id>;
    /// Overwrite only the cached tally fields of a candidate.
    async fn update_candidate_tally(
        &mut self,
        id: Id,
        votes_count: u64,
        votes_percentage: f64,
    ) -> Result<()>;
    /// Delete the candidate and every vote for it.
    async fn delete_candidate(&mut self, id: Id) -> Result<bool>;

    async fn centre(&mut self, id: Id) -> Result<Option<Centre>>;
    async fn centres(&mut self, election_id: Id) -> Result<Vec<Centre>>;
    async fn insert_centre(&mut self, centre: &NewCentre) -> Result<Id>;
    /// Delete the centre, leaving its voters without a centre.
    async fn delete_centre(&mut self, id: Id) -> Result<bool>;

    async fn voter(&mut self, id: Id) -> Result<Option<Voter>>;
    async fn voters(&mut self, filter: VoterFilter) -> Result<Vec<Voter>>;
    /// Fails with `DuplicateVoterOrCandidate` if the ID number is taken in the election.
    async fn insert_voter(&mut self, voter: &NewVoter) -> Result<Id>;
    /// Delete the voter and every vote they cast.
    async fn delete_voter(&mut self, id: Id) -> Result<bool>;

    async fn identity(&mut self, id: Id) -> Result<Option<Identity>>;

    /// Fails with `AlreadyVoted` if the voter already holds a vote in that slot.
    async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id>;
    /// Slots held by the voter's votes, in no particular order.
    async fn vote_slots(&mut self, voter_id: Id) -> Result<Vec<u32>>;
    async fn count_votes_by_voter(&mut self, voter_id: Id) -> Result<u64>;
    async fn count_votes_by_candidate(&mut self, candidate_id: Id) -> Result<u64>;
    async fn count_votes_in_election(&mut self, election_id: Id) -> Result<u64>;

    async fn insert_action(&mut self, record: &ActionRecord) -> Result<()>;

    /// Make every change in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}
