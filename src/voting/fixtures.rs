use crate::model::{
    db::{CandidateCore, ElectionCore, VoterCore},
    mongodb::Id,
};
use crate::store::{MemoryStore, Store};

/// An election with some candidates and voters, committed to a store.
pub struct Fixture {
    pub election: Id,
    pub candidates: Vec<Id>,
    pub voters: Vec<Id>,
}

impl Fixture {
    pub async fn create(
        store: &MemoryStore,
        election: ElectionCore,
        candidates: usize,
        voters: usize,
    ) -> Self {
        let mut tx = store.begin().await.unwrap();
        let election = tx.insert_election(&election).await.unwrap();
        let mut fixture = Self {
            election,
            candidates: Vec::new(),
            voters: Vec::new(),
        };
        for i in 0..candidates {
            let candidate =
                CandidateCore::example(election, &format!("Candidate {i}"), &format!("C-{i}"));
            fixture
                .candidates
                .push(tx.insert_candidate(&candidate).await.unwrap());
        }
        for i in 0..voters {
            let voter = VoterCore::example(election, None, &format!("V-{i}"));
            fixture.voters.push(tx.insert_voter(&voter).await.unwrap());
        }
        tx.commit().await.unwrap();
        fixture
    }
}
