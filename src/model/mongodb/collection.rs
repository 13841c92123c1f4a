use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    ActionRecord, Candidate, CandidateCore, Centre, CentreCore, Election, ElectionCore, Identity,
    Party, PartyCore, Vote, VoteCore, Voter, VoterCore,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Election collections
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}
impl MongoCollection for ElectionCore {
    const NAME: &'static str = ELECTIONS;
}

// Party collections
const PARTIES: &str = "parties";
impl MongoCollection for Party {
    const NAME: &'static str = PARTIES;
}
impl MongoCollection for PartyCore {
    const NAME: &'static str = PARTIES;
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for CandidateCore {
    const NAME: &'static str = CANDIDATES;
}

// Centre collections
const CENTRES: &str = "centres";
impl MongoCollection for Centre {
    const NAME: &'static str = CENTRES;
}
impl MongoCollection for CentreCore {
    const NAME: &'static str = CENTRES;
}

// Voter collections
const VOTERS: &str = "voters";
impl MongoCollection for Voter {
    const NAME: &'static str = VOTERS;
}
impl MongoCollection for VoterCore {
    const NAME: &'static str = VOTERS;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for VoteCore {
    const NAME: &'static str = VOTES;
}

// Identities are owned by the identity provider; we only read them.
impl MongoCollection for Identity {
    const NAME: &'static str = "users";
}

impl MongoCollection for ActionRecord {
    const NAME: &'static str = "actions";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Voter collection.
    let voter_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "id_number": 1})
        .options(unique.clone())
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(voter_index, None)
        .await?;

    // Candidate collection.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "id_number": 1})
        .options(unique.clone())
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Vote collection: one document per voter per quota slot.
    let vote_index = IndexModel::builder()
        .keys(doc! {"voter_id": 1, "slot": 1})
        .options(unique)
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_index, None)
        .await?;

    // Counting indexes.
    for keys in [doc! {"election_id": 1}, doc! {"candidate_id": 1}] {
        let index = IndexModel::builder().keys(keys).build();
        Coll::<Vote>::from_db(db).create_index(index, None).await?;
    }

    Ok(())
}
