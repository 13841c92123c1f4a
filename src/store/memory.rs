use std::collections::BTreeMap;
use std::sync::Arc;

use rocket::tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{Error, Result};
use crate::model::{
    db::{
        ActionRecord, Candidate, CandidateCore, Centre, CentreCore, Election, ElectionCore,
        Identity, NewCandidate, NewCentre, NewElection, NewParty, NewVote, NewVoter, Party,
        PartyCore, VoteCore, Voter, VoterCore,
    },
    mongodb::Id,
};

use super::{Store, Transaction, VoterFilter};

#[derive(Debug, Default, Clone)]
struct Tables {
    elections: BTreeMap<Id, ElectionCore>,
    parties: BTreeMap<Id, PartyCore>,
    candidates: BTreeMap<Id, CandidateCore>,
    centres: BTreeMap<Id, CentreCore>,
    voters: BTreeMap<Id, VoterCore>,
    votes: BTreeMap<Id, VoteCore>,
    identities: BTreeMap<Id, Identity>,
    actions: Vec<ActionRecord>,
}

/// An in-process store. Transactions are serialised: each one holds the
/// lock for its whole lifetime and works on a private copy of the tables.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity, as the identity provider would.
    pub async fn add_identity(&self, identity: Identity) {
        self.tables
            .lock()
            .await
            .identities
            .insert(identity.id, identity);
    }

    /// Every processed administrative action, oldest first.
    pub async fn actions(&self) -> Vec<ActionRecord> {
        self.tables.lock().await.actions.clone()
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[rocket::async_trait]
impl Transaction for MemoryTransaction {
    async fn election(&mut self, id: Id) -> Result<Option<Election>> {
        Ok(self.working.elections.get(&id).map(|election| Election {
            id,
            election: election.clone(),
        }))
    }

    async fn elections(&mut self) -> Result<Vec<Election>> {
        Ok(self
            .working
            .elections
            .iter()
            .map(|(id, election)| Election {
                id: *id,
                election: election.clone(),
            })
            .collect())
    }

    async fn insert_election(&mut self, election: &NewElection) -> Result<Id> {
        let id = Id::new();
        self.working.elections.insert(id, election.clone());
        Ok(id)
    }

    async fn delete_election(&mut self, id: Id) -> Result<bool> {
        let tables = &mut self.working;
        if tables.elections.remove(&id).is_none() {
            return Ok(false);
        }
        let candidates: Vec<Id> = tables
            .candidates
            .iter()
            .filter(|(_, candidate)| candidate.election_id == id)
            .map(|(candidate_id, _)| *candidate_id)
            .collect();
        tables.votes.retain(|_, vote| {
            vote.election_id != id && !candidates.contains(&vote.candidate_id)
        });
        tables
            .candidates
            .retain(|_, candidate| candidate.election_id != id);
        tables.voters.retain(|_, voter| voter.election_id != id);
        tables.centres.retain(|_, centre| centre.election_id != id);
        Ok(true)
    }

    async fn party(&mut self, id: Id) -> Result<Option<Party>> {
        Ok(self.working.parties.get(&id).map(|party| Party {
            id,
            party: party.clone(),
        }))
    }

    async fn parties(&mut self) -> Result<Vec<Party>> {
        let mut parties: Vec<Party> = self
            .working
            .parties
            .iter()
            .map(|(id, party)| Party {
                id: *id,
                party: party.clone(),
            })
            .collect();
        // Stable, so ties stay in creation order.
        parties.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        Ok(parties)
    }

    async fn insert_party(&mut self, party: &NewParty) -> Result<Id> {
        let id = Id::new();
        self.working.parties.insert(id, party.clone());
        Ok(id)
    }

    async fn delete_party(&mut self, id: Id) -> Result<bool> {
        if self.working.parties.remove(&id).is_none() {
            return Ok(false);
        }
        for candidate in self.working.candidates.values_mut() {
            if candidate.party_id == Some(id) {
                candidate.party_id = None;
            }
        }
        Ok(true)
    }

    async fn candidate(&mut self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.working.candidates.get(&id).map(|candidate| Candidate {
            id,
            candidate: candidate.clone(),
        }))
    }

    async fn candidates(&mut self, election_id: Id) -> Result<Vec<Candidate>> {
        Ok(self
            .working
            .candidates
            .iter()
            .filter(|(_, candidate)| candidate.election_id == election_id)
            .map(|(id, candidate)| Candidate {
                id: *id,
                candidate: candidate.clone(),
            })
            .collect())
    }

    async fn insert_candidate(&mut self, candidate: &NewCandidate) -> Result<Id> {
        let taken = self.working.candidates.values().any(|existing| {
            existing.election_id == candidate.election_id
                && existing.id_number == candidate.id_number
        });
        if taken {
            return Err(Error::DuplicateVoterOrCandidate(
                candidate.id_number.clone(),
            ));
        }
        let id = Id::new();
        self.working.candidates.insert(id, candidate.clone());
        Ok(id)
    }

    async fn update_candidate_tally(
        &mut self,
        id: Id,
        votes_count: u64,
        votes_percentage: f64,
    ) -> Result<()> {
        if let Some(candidate) = self.working.candidates.get_mut(&id) {
            candidate.votes_count = votes_count;
            candidate.votes_percentage = votes_percentage;
        }
        Ok(())
    }

    async fn delete_candidate(&mut self, id: Id) -> Result<bool> {
        if self.working.candidates.remove(&id).is_none() {
            return Ok(false);
        }
        self.working.votes.retain(|_, vote| vote.candidate_id != id);
        Ok(true)
    }

    async fn centre(&mut self, id: Id) -> Result<Option<Centre>> {
        Ok(self.working.centres.get(&id).map(|centre| Centre {
            id,
            centre: centre.clone(),
        }))
    }

    async fn centres(&mut self, election_id: Id) -> Result<Vec<Centre>> {
        Ok(self
            .working
            .centres
            .iter()
            .filter(|(_, centre)| centre.election_id == election_id)
            .map(|(id, centre)| Centre {
                id: *id,
                centre: centre.clone(),
            })
            .collect())
    }

    async fn insert_centre(&mut self, centre: &NewCentre) -> Result<Id> {
        let id = Id::new();
        self.working.centres.insert(id, centre.clone());
        Ok(id)
    }

    async fn delete_centre(&mut self, id: Id) -> Result<bool> {
        if self.working.centres.remove(&id).is_none() {
            return Ok(false);
        }
        for voter in self.working.voters.values_mut() {
            if voter.centre_id == Some(id) {
                voter.centre_id = None;
            }
        }
        Ok(true)
    }

    async fn voter(&mut self, id: Id) -> Result<Option<Voter>> {
        Ok(self.working.voters.get(&id).map(|voter| Voter {
            id,
            voter: voter.clone(),
        }))
    }

    async fn voters(&mut self, filter: VoterFilter) -> Result<Vec<Voter>> {
        let matches = |voter: &VoterCore| match filter {
            VoterFilter::Election(election_id) => voter.election_id == election_id,
            VoterFilter::Centre(centre_id) => voter.centre_id == Some(centre_id),
            VoterFilter::Unassigned(election_id) => {
                voter.election_id == election_id && voter.centre_id.is_none()
            }
        };
        Ok(self
            .working
            .voters
            .iter()
            .filter(|(_, voter)| matches(voter))
            .map(|(id, voter)| Voter {
                id: *id,
                voter: voter.clone(),
            })
            .collect())
    }

    async fn insert_voter(&mut self, voter: &NewVoter) -> Result<Id> {
        let taken = self.working.voters.values().any(|existing| {
            existing.election_id == voter.election_id && existing.id_number == voter.id_number
        });
        if taken {
            return Err(Error::DuplicateVoterOrCandidate(voter.id_number.clone()));
        }
        let id = Id::new();
        self.working.voters.insert(id, voter.clone());
        Ok(id)
    }

    async fn delete_voter(&mut self, id: Id) -> Result<bool> {
        if self.working.voters.remove(&id).is_none() {
            return Ok(false);
        }
        self.working.votes.retain(|_, vote| vote.voter_id != id);
        Ok(true)
    }

    async fn identity(&mut self, id: Id) -> Result<Option<Identity>> {
        Ok(self.working.identities.get(&id).cloned())
    }

    async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id> {
        let taken = self
            .working
            .votes
            .values()
            .any(|existing| existing.voter_id == vote.voter_id && existing.slot == vote.slot);
        if taken {
            return Err(Error::AlreadyVoted);
        }
        let id = Id::new();
        self.working.votes.insert(id, *vote);
        Ok(id)
    }

    async fn vote_slots(&mut self, voter_id: Id) -> Result<Vec<u32>> {
        Ok(self
            .working
            .votes
            .values()
            .filter(|vote| vote.voter_id == voter_id)
            .map(|vote| vote.slot)
            .collect())
    }

    async fn count_votes_by_voter(&mut self, voter_id: Id) -> Result<u64> {
        Ok(self.count_votes(|vote| vote.voter_id == voter_id))
    }

    async fn count_votes_by_candidate(&mut self, candidate_id: Id) -> Result<u64> {
        Ok(self.count_votes(|vote| vote.candidate_id == candidate_id))
    }

    async fn count_votes_in_election(&mut self, election_id: Id) -> Result<u64> {
        Ok(self.count_votes(|vote| vote.election_id == election_id))
    }

    async fn insert_action(&mut self, record: &ActionRecord) -> Result<()> {
        self.working.actions.push(record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

impl MemoryTransaction {
    fn count_votes(&self, predicate: impl Fn(&VoteCore) -> bool) -> u64 {
        self.working
            .votes
            .values()
            .filter(|vote| predicate(vote))
            .count() as u64
    }
}
