use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Id;
use crate::store::{Store, VoterFilter};

/// What a roster clone copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneReport {
    pub centres: usize,
    pub voters_cloned: usize,
    pub voters_skipped: usize,
}

/// Copy the voting centres and voters of `source` into `target`.
///
/// Each centre is duplicated and every voter assigned to it is registered in
/// `target` under the duplicate; voters of `source` without a centre are
/// registered in `target` without one. The duplicated centres keep `source`
/// as their election, so a later clone of `source` also copies them along
/// with whatever voters they hold.
///
/// A voter that cannot be registered, typically because its ID number is
/// already taken in `target`, is skipped rather than failing the clone.
pub async fn clone_roster(store: &dyn Store, source: Id, target: Id) -> Result<CloneReport> {
    let mut tx = store.begin().await?;
    for election_id in [source, target] {
        if tx.election(election_id).await?.is_none() {
            return Err(Error::not_found(format!("Election {election_id}")));
        }
    }

    let mut report = CloneReport::default();
    let mut batches = Vec::new();
    for centre in tx.centres(source).await? {
        let centre_id = tx.insert_centre(&centre.centre).await?;
        report.centres += 1;
        batches.push((VoterFilter::Centre(centre.id), Some(centre_id)));
    }
    batches.push((VoterFilter::Unassigned(source), None));

    for (filter, centre_id) in batches {
        let voters = tx.voters(filter).await?;
        for voter in voters {
            match tx.insert_voter(&voter.copy_to(target, centre_id)).await {
                Ok(_) => report.voters_cloned += 1,
                Err(err) => {
                    warn!("Skipped voter {} while cloning: {err}", voter.id);
                    report.voters_skipped += 1;
                }
            }
        }
    }

    tx.commit().await?;
    info!(
        "Cloned {} centre(s) and {} voter(s) from election {source} into {target}, skipping {}",
        report.centres, report.voters_cloned, report.voters_skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use crate::model::db::{
        ActionRecord, Candidate, Centre, CentreCore, Election, ElectionCore, Identity,
        NewCandidate, NewCentre, NewElection, NewParty, NewVote, NewVoter, Party, Voter,
        VoterCore,
    };
    use crate::store::{MemoryStore, Transaction};

    use super::*;

    /// A store whose transactions fail every centre insert after the first
    /// `allowed` ones.
    struct FailingCentres {
        store: MemoryStore,
        allowed: usize,
    }

    #[rocket::async_trait]
    impl Store for FailingCentres {
        async fn begin(&self) -> Result<Box<dyn Transaction>> {
            Ok(Box::new(FailingCentresTransaction {
                inner: self.store.begin().await?,
                allowed: self.allowed,
            }))
        }
    }

    struct FailingCentresTransaction {
        inner: Box<dyn Transaction>,
        allowed: usize,
    }

    #[rocket::async_trait]
    impl Transaction for FailingCentresTransaction {
        async fn election(&mut self, id: Id) -> Result<Option<Election>> {
            self.inner.election(id).await
        }
        async fn elections(&mut self) -> Result<Vec<Election>> {
            self.inner.elections().await
        }
        async fn insert_election(&mut self, election: &NewElection) -> Result<Id> {
            self.inner.insert_election(election).await
        }
        async fn delete_election(&mut self, id: Id) -> Result<bool> {
            self.inner.delete_election(id).await
        }
        async fn party(&mut self, id: Id) -> Result<Option<Party>> {
            self.inner.party(id).await
        }
        async fn parties(&mut self) -> Result<Vec<Party>> {
            self.inner.parties().await
        }
        async fn insert_party(&mut self, party: &NewParty) -> Result<Id> {
            self.inner.insert_party(party).await
        }
        async fn delete_party(&mut self, id: Id) -> Result<bool> {
            self.inner.delete_party(id).await
        }
        async fn candidate(&mut self, id: Id) -> Result<Option<Candidate>> {
            self.inner.candidate(id).await
        }
        async fn candidates(&mut self, election_id: Id) -> Result<Vec<Candidate>> {
            self.inner.candidates(election_id).await
        }
        async fn insert_candidate(&mut self, candidate: &NewCandidate) -> Result<Id> {
            self.inner.insert_candidate(candidate).await
        }
        async fn update_candidate_tally(
            &mut self,
            id: Id,
            votes_count: u64,
            votes_percentage: f64,
        ) -> Result<()> {
            self.inner
                .update_candidate_tally(id, votes_count, votes_percentage)
                .await
        }
        async fn delete_candidate(&mut self, id: Id) -> Result<bool> {
            self.inner.delete_candidate(id).await
        }
        async fn centre(&mut self, id: Id) -> Result<Option<Centre>> {
            self.inner.centre(id).await
        }
        async fn centres(&mut self, election_id: Id) -> Result<Vec<Centre>> {
            self.inner.centres(election_id).await
        }
        async fn insert_centre(&mut self, centre: &NewCentre) -> Result<Id> {
            if self.allowed == 0 {
                return Err(Error::BadRequest("centre storage unavailable".to_string()));
            }
            self.allowed -= 1;
            self.inner.insert_centre(centre).await
        }
        async fn delete_centre(&mut self, id: Id) -> Result<bool> {
            self.inner.delete_centre(id).await
        }
        async fn voter(&mut self, id: Id) -> Result<Option<Voter>> {
            self.inner.voter(id).await
        }
        async fn voters(&mut self, filter: VoterFilter) -> Result<Vec<Voter>> {
            self.inner.voters(filter).await
        }
        async fn insert_voter(&mut self, voter: &NewVoter) -> Result<Id> {
            self.inner.insert_voter(voter).await
        }
        async fn delete_voter(&mut self, id: Id) -> Result<bool> {
            self.inner.delete_voter(id).await
        }
        async fn identity(&mut self, id: Id) -> Result<Option<Identity>> {
            self.inner.identity(id).await
        }
        async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id> {
            self.inner.insert_vote(vote).await
        }
        async fn vote_slots(&mut self, voter_id: Id) -> Result<Vec<u32>> {
            self.inner.vote_slots(voter_id).await
        }
        async fn count_votes_by_voter(&mut self, voter_id: Id) -> Result<u64> {
            self.inner.count_votes_by_voter(voter_id).await
        }
        async fn count_votes_by_candidate(&mut self, candidate_id: Id) -> Result<u64> {
            self.inner.count_votes_by_candidate(candidate_id).await
        }
        async fn count_votes_in_election(&mut self, election_id: Id) -> Result<u64> {
            self.inner.count_votes_in_election(election_id).await
        }
        async fn insert_action(&mut self, record: &ActionRecord) -> Result<()> {
            self.inner.insert_action(record).await
        }
        async fn commit(self: Box<Self>) -> Result<()> {
            self.inner.commit().await
        }
    }

    async fn election(store: &MemoryStore) -> Id {
        let mut tx = store.begin().await.unwrap();
        let id = tx
            .insert_election(&ElectionCore::current_example())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    }

    /// Election with one centre holding V-1 and V-2, and an unassigned V-3.
    async fn roster(store: &MemoryStore) -> (Id, Id) {
        let source = election(store).await;
        let mut tx = store.begin().await.unwrap();
        let centre = tx
            .insert_centre(&CentreCore {
                name: "Town hall".to_string(),
                location: Some("Main street".to_string()),
                election_id: source,
            })
            .await
            .unwrap();
        for id_number in ["V-1", "V-2"] {
            tx.insert_voter(&VoterCore::example(source, Some(centre), id_number))
                .await
                .unwrap();
        }
        tx.insert_voter(&VoterCore::example(source, None, "V-3"))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (source, centre)
    }

    #[store_test]
    async fn roster_is_copied(store: MemoryStore) {
        log4rs_test_utils::test_logging::init_logging_once_for(["votes_backend"], None, None);

        let (source, centre) = roster(&store).await;
        let target = election(&store).await;

        let report = clone_roster(&store, source, target).await.unwrap();
        assert_eq!(
            report,
            CloneReport {
                centres: 1,
                voters_cloned: 3,
                voters_skipped: 0,
            }
        );

        let mut tx = store.begin().await.unwrap();
        let cloned = tx.voters(VoterFilter::Election(target)).await.unwrap();
        assert_eq!(cloned.len(), 3);
        let numbers: Vec<_> = cloned.iter().map(|v| v.id_number.as_str()).collect();
        assert_eq!(numbers, ["V-1", "V-2", "V-3"]);

        // Centre voters moved to the duplicate centre, which stays with the source.
        let centres = tx.centres(source).await.unwrap();
        assert_eq!(centres.len(), 2);
        let copy = centres.iter().find(|c| c.id != centre).unwrap();
        assert_eq!(copy.name, "Town hall");
        assert_eq!(copy.election_id, source);
        assert!(tx.centres(target).await.unwrap().is_empty());
        assert_eq!(cloned[0].centre_id, Some(copy.id));
        assert_eq!(cloned[1].centre_id, Some(copy.id));
        assert_eq!(cloned[2].centre_id, None);

        // The source roster is untouched.
        let originals = tx.voters(VoterFilter::Election(source)).await.unwrap();
        assert_eq!(originals.len(), 3);
        assert!(originals
            .iter()
            .take(2)
            .all(|voter| voter.centre_id == Some(centre)));
    }

    #[store_test]
    async fn taken_id_numbers_are_skipped(store: MemoryStore) {
        let (source, _) = roster(&store).await;
        let target = election(&store).await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_voter(&VoterCore::example(target, None, "V-2"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let report = clone_roster(&store, source, target).await.unwrap();
        assert_eq!(report.voters_cloned, 2);
        assert_eq!(report.voters_skipped, 1);

        let mut tx = store.begin().await.unwrap();
        let cloned = tx.voters(VoterFilter::Election(target)).await.unwrap();
        assert_eq!(cloned.len(), 3);
    }

    #[store_test]
    async fn cloning_twice_skips_everyone(store: MemoryStore) {
        let (source, _) = roster(&store).await;
        let target = election(&store).await;
        clone_roster(&store, source, target).await.unwrap();

        // The second run also duplicates the centre created by the first,
        // whose voters are the copies already registered in the target.
        let report = clone_roster(&store, source, target).await.unwrap();
        assert_eq!(report.centres, 2);
        assert_eq!(report.voters_cloned, 0);
        assert_eq!(report.voters_skipped, 5);

        let mut tx = store.begin().await.unwrap();
        let cloned = tx.voters(VoterFilter::Election(target)).await.unwrap();
        assert_eq!(cloned.len(), 3);
    }

    #[store_test]
    async fn voters_of_duplicated_centres_are_copied(store: MemoryStore) {
        let source = election(&store).await;
        let mut tx = store.begin().await.unwrap();
        let centre = tx
            .insert_centre(&CentreCore {
                name: "School".to_string(),
                location: None,
                election_id: source,
            })
            .await
            .unwrap();
        tx.insert_voter(&VoterCore::example(source, Some(centre), "V-1"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let runoff = election(&store).await;
        clone_roster(&store, source, runoff).await.unwrap();

        // A runoff voter registered at the duplicated centre.
        let mut tx = store.begin().await.unwrap();
        let copy = tx
            .centres(source)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.id != centre)
            .unwrap();
        tx.insert_voter(&VoterCore::example(runoff, Some(copy.id), "X-9"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let next = election(&store).await;
        let report = clone_roster(&store, source, next).await.unwrap();
        assert_eq!(
            report,
            CloneReport {
                centres: 2,
                voters_cloned: 2,
                voters_skipped: 1,
            }
        );

        let mut tx = store.begin().await.unwrap();
        let numbers: Vec<String> = tx
            .voters(VoterFilter::Election(next))
            .await
            .unwrap()
            .into_iter()
            .map(|voter| voter.voter.id_number)
            .collect();
        assert_eq!(numbers, ["V-1", "X-9"]);
    }

    #[store_test]
    async fn failed_centre_copy_aborts_the_clone(store: MemoryStore) {
        let (source, _) = roster(&store).await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_centre(&CentreCore {
            name: "Library".to_string(),
            location: None,
            election_id: source,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        let target = election(&store).await;

        let failing = FailingCentres {
            store: store.clone(),
            allowed: 1,
        };
        let result = clone_roster(&failing, source, target).await;
        assert!(matches!(result, Err(Error::BadRequest(_))));

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.centres(source).await.unwrap().len(), 2);
        assert!(tx.centres(target).await.unwrap().is_empty());
        assert!(tx
            .voters(VoterFilter::Election(target))
            .await
            .unwrap()
            .is_empty());
    }

    #[store_test]
    async fn missing_elections_are_not_found(store: MemoryStore) {
        let (source, _) = roster(&store).await;
        assert!(matches!(
            clone_roster(&store, source, Id::new()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            clone_roster(&store, Id::new(), source).await,
            Err(Error::NotFound(_))
        ));
    }
}
