use log::info;
use mongodb::{
    bson::{doc, Bson, Document},
    error::Error as DbError,
    options::FindOptions,
    Client, ClientSession, Database,
};
use rocket::futures::TryStreamExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::{
        ActionRecord, Candidate, Centre, Election, Identity, NewCandidate, NewCentre,
        NewElection, NewParty, NewVote, NewVoter, Party, Vote, Voter,
    },
    mongodb::{ensure_indexes_exist, is_duplicate_key_error, Coll, Id, MongoCollection},
};

use super::{Store, Transaction, VoterFilter};

/// A MongoDB-backed store. Requires a deployment that supports
/// multi-document transactions (a replica set or sharded cluster).
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Wrap an existing connection, ensuring the required indexes exist.
    pub async fn new(client: Client, database: &str) -> std::result::Result<Self, DbError> {
        let db = client.database(database);
        ensure_indexes_exist(&db).await?;
        info!("Using database {database}");
        Ok(Self { client, db })
    }
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(Box::new(MongoTransaction {
            session,
            db: self.db.clone(),
        }))
    }
}

/// Dropping the session of an uncommitted transaction aborts it.
struct MongoTransaction {
    session: ClientSession,
    db: Database,
}

impl MongoTransaction {
    async fn find_one<T>(&mut self, filter: Document) -> Result<Option<T>>
    where
        T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
    {
        Ok(Coll::<T>::from_db(&self.db)
            .find_one_with_session(filter, None, &mut self.session)
            .await?)
    }

    async fn find_all<T>(&mut self, filter: Document, sort: Document) -> Result<Vec<T>>
    where
        T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
    {
        let options = FindOptions::builder().sort(sort).build();
        let mut cursor = Coll::<T>::from_db(&self.db)
            .find_with_session(filter, options, &mut self.session)
            .await?;
        let records = cursor.stream(&mut self.session).try_collect().await?;
        Ok(records)
    }

    async fn insert<T>(&mut self, record: &T) -> std::result::Result<(), DbError>
    where
        T: MongoCollection + Serialize + Send + Sync,
    {
        Coll::<T>::from_db(&self.db)
            .insert_one_with_session(record, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn count<T>(&mut self, filter: Document) -> Result<u64>
    where
        T: MongoCollection + Send + Sync,
    {
        Ok(Coll::<T>::from_db(&self.db)
            .count_documents_with_session(filter, None, &mut self.session)
            .await?)
    }

    async fn delete_one<T>(&mut self, id: Id) -> Result<bool>
    where
        T: MongoCollection + Send + Sync,
    {
        let result = Coll::<T>::from_db(&self.db)
            .delete_one_with_session(id.as_doc(), None, &mut self.session)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn delete_many<T>(&mut self, filter: Document) -> Result<()>
    where
        T: MongoCollection + Send + Sync,
    {
        Coll::<T>::from_db(&self.db)
            .delete_many_with_session(filter, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn set_many<T>(&mut self, filter: Document, set: Document) -> Result<()>
    where
        T: MongoCollection + Send + Sync,
    {
        Coll::<T>::from_db(&self.db)
            .update_many_with_session(filter, doc! { "$set": set }, None, &mut self.session)
            .await?;
        Ok(())
    }

    /// Check an (election, ID number) pair is free before writing, so that a
    /// clash does not abort the server-side transaction.
    async fn check_id_number_free<T>(&mut self, election_id: Id, id_number: &str) -> Result<()>
    where
        T: MongoCollection + Send + Sync,
    {
        let filter = doc! { "election_id": election_id, "id_number": id_number };
        if self.count::<T>(filter).await? > 0 {
            Err(Error::DuplicateVoterOrCandidate(id_number.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Map a write error, translating duplicate key errors into the given rejection.
fn map_duplicate(err: DbError, rejection: impl FnOnce() -> Error) -> Error {
    if is_duplicate_key_error(&err) {
        rejection()
    } else {
        Error::Db(err)
    }
}

fn by_creation() -> Document {
    doc! { "_id": 1 }
}

#[rocket::async_trait]
impl Transaction for MongoTransaction {
    async fn election(&mut self, id: Id) -> Result<Option<Election>> {
        self.find_one(id.as_doc()).await
    }

    async fn elections(&mut self) -> Result<Vec<Election>> {
        self.find_all(doc! {}, by_creation()).await
    }

    async fn insert_election(&mut self, election: &NewElection) -> Result<Id> {
        let election = Election {
            id: Id::new(),
            election: election.clone(),
        };
        self.insert(&election).await?;
        Ok(election.id)
    }

    async fn delete_election(&mut self, id: Id) -> Result<bool> {
        let owned = doc! { "election_id": id };
        let candidate_ids: Vec<Bson> = self
            .candidates(id)
            .await?
            .into_iter()
            .map(|candidate| candidate.id.into())
            .collect();
        self.delete_many::<Vote>(doc! { "candidate_id": { "$in": candidate_ids } })
            .await?;
        self.delete_many::<Vote>(owned.clone()).await?;
        self.delete_many::<Voter>(owned.clone()).await?;
        self.delete_many::<Centre>(owned.clone()).await?;
        self.delete_many::<Candidate>(owned).await?;
        self.delete_one::<Election>(id).await
    }

    async fn party(&mut self, id: Id) -> Result<Option<Party>> {
        self.find_one(id.as_doc()).await
    }

    async fn parties(&mut self) -> Result<Vec<Party>> {
        self.find_all(doc! {}, doc! { "relevance": -1, "_id": 1 })
            .await
    }

    async fn insert_party(&mut self, party: &NewParty) -> Result<Id> {
        let party = Party {
            id: Id::new(),
            party: party.clone(),
        };
        self.insert(&party).await?;
        Ok(party.id)
    }

    async fn delete_party(&mut self, id: Id) -> Result<bool> {
        self.set_many::<Candidate>(doc! { "party_id": id }, doc! { "party_id": Bson::Null })
            .await?;
        self.delete_one::<Party>(id).await
    }

    async fn candidate(&mut self, id: Id) -> Result<Option<Candidate>> {
        self.find_one(id.as_doc()).await
    }

    async fn candidates(&mut self, election_id: Id) -> Result<Vec<Candidate>> {
        self.find_all(doc! { "election_id": election_id }, by_creation())
            .await
    }

    async fn insert_candidate(&mut self, candidate: &NewCandidate) -> Result<Id> {
        self.check_id_number_free::<Candidate>(candidate.election_id, &candidate.id_number)
            .await?;
        let candidate = Candidate {
            id: Id::new(),
            candidate: candidate.clone(),
        };
        self.insert(&candidate).await.map_err(|err| {
            map_duplicate(err, || {
                Error::DuplicateVoterOrCandidate(candidate.id_number.clone())
            })
        })?;
        Ok(candidate.id)
    }

    async fn update_candidate_tally(
        &mut self,
        id: Id,
        votes_count: u64,
        votes_percentage: f64,
    ) -> Result<()> {
        let update = doc! {
            "$set": {
                "votes_count": i64::try_from(votes_count).unwrap_or(i64::MAX),
                "votes_percentage": votes_percentage,
            }
        };
        Coll::<Candidate>::from_db(&self.db)
            .update_one_with_session(id.as_doc(), update, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn delete_candidate(&mut self, id: Id) -> Result<bool> {
        self.delete_many::<Vote>(doc! { "candidate_id": id }).await?;
        self.delete_one::<Candidate>(id).await
    }

    async fn centre(&mut self, id: Id) -> Result<Option<Centre>> {
        self.find_one(id.as_doc()).await
    }

    async fn centres(&mut self, election_id: Id) -> Result<Vec<Centre>> {
        self.find_all(doc! { "election_id": election_id }, by_creation())
            .await
    }

    async fn insert_centre(&mut self, centre: &NewCentre) -> Result<Id> {
        let centre = Centre {
            id: Id::new(),
            centre: centre.clone(),
        };
        self.insert(&centre).await?;
        Ok(centre.id)
    }

    async fn delete_centre(&mut self, id: Id) -> Result<bool> {
        self.set_many::<Voter>(doc! { "centre_id": id }, doc! { "centre_id": Bson::Null })
            .await?;
        self.delete_one::<Centre>(id).await
    }

    async fn voter(&mut self, id: Id) -> Result<Option<Voter>> {
        self.find_one(id.as_doc()).await
    }

    async fn voters(&mut self, filter: VoterFilter) -> Result<Vec<Voter>> {
        let filter = match filter {
            VoterFilter::Election(election_id) => doc! { "election_id": election_id },
            VoterFilter::Centre(centre_id) => doc! { "centre_id": centre_id },
            VoterFilter::Unassigned(election_id) => doc! {
                "election_id": election_id,
                "centre_id": Bson::Null,
            },
        };
        self.find_all(filter, by_creation()).await
    }

    async fn insert_voter(&mut self, voter: &NewVoter) -> Result<Id> {
        self.check_id_number_free::<Voter>(voter.election_id, &voter.id_number)
            .await?;
        let voter = Voter {
            id: Id::new(),
            voter: voter.clone(),
        };
        self.insert(&voter).await.map_err(|err| {
            map_duplicate(err, || {
                Error::DuplicateVoterOrCandidate(voter.id_number.clone())
            })
        })?;
        Ok(voter.id)
    }

    async fn delete_voter(&mut self, id: Id) -> Result<bool> {
        self.delete_many::<Vote>(doc! { "voter_id": id }).await?;
        self.delete_one::<Voter>(id).await
    }

    async fn identity(&mut self, id: Id) -> Result<Option<Identity>> {
        self.find_one(id.as_doc()).await
    }

    async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id> {
        let vote = Vote {
            id: Id::new(),
            vote: *vote,
        };
        self.insert(&vote)
            .await
            .map_err(|err| map_duplicate(err, || Error::AlreadyVoted))?;
        Ok(vote.id)
    }

    async fn vote_slots(&mut self, voter_id: Id) -> Result<Vec<u32>> {
        let votes: Vec<Vote> = self
            .find_all(doc! { "voter_id": voter_id }, by_creation())
            .await?;
        Ok(votes.into_iter().map(|vote| vote.slot).collect())
    }

    async fn count_votes_by_voter(&mut self, voter_id: Id) -> Result<u64> {
        self.count::<Vote>(doc! { "voter_id": voter_id }).await
    }

    async fn count_votes_by_candidate(&mut self, candidate_id: Id) -> Result<u64> {
        self.count::<Vote>(doc! { "candidate_id": candidate_id })
            .await
    }

    async fn count_votes_in_election(&mut self, election_id: Id) -> Result<u64> {
        self.count::<Vote>(doc! { "election_id": election_id })
            .await
    }

    async fn insert_action(&mut self, record: &ActionRecord) -> Result<()> {
        self.insert(record).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut transaction = *self;
        transaction.session.commit_transaction().await?;
        Ok(())
    }
}
