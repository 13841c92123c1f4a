//! Named, recorded administrative operations.

use chrono::Utc;
use log::info;

use crate::error::Result;
use crate::model::{
    db::{ActionKind, ActionRecord},
    mongodb::Id,
};
use crate::realtime::Emitter;
use crate::store::Store;

use super::{cloning, tally};

/// An administrative operation that leaves an audit record behind.
#[rocket::async_trait]
pub trait AdminAction: Send + Sync {
    type Output: Send;

    fn name(&self) -> &str;

    fn kind(&self) -> ActionKind;

    async fn execute(&self, store: &dyn Store, emitter: &dyn Emitter) -> Result<Self::Output>;
}

/// Run the action and, if it succeeds, record that it was processed.
pub async fn process<A: AdminAction>(
    action: &A,
    store: &dyn Store,
    emitter: &dyn Emitter,
) -> Result<A::Output> {
    info!("Processing action '{}'", action.name());
    let output = action.execute(store, emitter).await?;

    let record = ActionRecord {
        name: action.name().to_string(),
        kind: action.kind(),
        processed_at: Utc::now(),
    };
    let mut tx = store.begin().await?;
    tx.insert_action(&record).await?;
    tx.commit().await?;
    Ok(output)
}

fn name_or(name: Option<String>, verb: &str) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => format!("{verb} at {}", Utc::now()),
    }
}

/// Recompute and publish an election's tally.
#[derive(Debug, Clone)]
pub struct SyncVotesAction {
    name: String,
    election_id: Id,
}

impl SyncVotesAction {
    pub fn new(name: Option<String>, election_id: Id) -> Self {
        Self {
            name: name_or(name, "Sync"),
            election_id,
        }
    }
}

#[rocket::async_trait]
impl AdminAction for SyncVotesAction {
    type Output = tally::TallyState;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::SyncVotes {
            election_id: self.election_id,
        }
    }

    async fn execute(&self, store: &dyn Store, emitter: &dyn Emitter) -> Result<Self::Output> {
        tally::sync_votes(store, emitter, self.election_id).await
    }
}

/// Copy an election's roster into another election.
#[derive(Debug, Clone)]
pub struct CloneElectionAction {
    name: String,
    election_id: Id,
    new_election_id: Id,
}

impl CloneElectionAction {
    pub fn new(name: Option<String>, election_id: Id, new_election_id: Id) -> Self {
        Self {
            name: name_or(name, "Clone"),
            election_id,
            new_election_id,
        }
    }
}

#[rocket::async_trait]
impl AdminAction for CloneElectionAction {
    type Output = cloning::CloneReport;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::CloneElection {
            election_id: self.election_id,
            new_election_id: self.new_election_id,
        }
    }

    async fn execute(&self, store: &dyn Store, _emitter: &dyn Emitter) -> Result<Self::Output> {
        cloning::clone_roster(store, self.election_id, self.new_election_id).await
    }
}
