use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        CandidateDescription, CandidateSpec, CentreDescription, CentreSpec, CloneRequest,
        ElectionDescription, ElectionSpec, PartyDescription, PartySpec, SyncRequest,
        VoterDescription, VoterSpec,
    },
    db::{
        Candidate, Centre, NewCandidate, NewCentre, NewElection, NewParty, NewVoter, Party, Voter,
    },
    mongodb::Id,
};
use crate::realtime::Broadcaster;
use crate::store::{DynStore, Transaction};
use crate::voting::{
    process, tally, CloneElectionAction, CloneReport, SyncVotesAction, TallyState,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        delete_election,
        create_party,
        create_candidate,
        create_centre,
        create_voter,
        delete_candidate,
        delete_voter,
        sync_votes,
        clone_election,
    ]
}

async fn require_election(tx: &mut dyn Transaction, election_id: Id) -> Result<()> {
    match tx.election(election_id).await? {
        Some(_) => Ok(()),
        None => Err(Error::not_found(format!("Election {election_id}"))),
    }
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    spec: Json<ElectionSpec>,
    store: &State<DynStore>,
) -> Result<Json<ElectionDescription>> {
    let election: NewElection = spec.0.into();
    if election.end < election.start {
        return Err(Error::BadRequest("Election ends before it starts".to_string()));
    }

    let mut tx = store.begin().await?;
    let id = tx.insert_election(&election).await?;
    let election = tx
        .election(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {id}")))?;
    tx.commit().await?;
    Ok(Json(election.into()))
}

#[delete("/elections/<election_id>")]
async fn delete_election(election_id: Id, store: &State<DynStore>) -> Result<()> {
    let mut tx = store.begin().await?;
    if !tx.delete_election(election_id).await? {
        return Err(Error::not_found(format!("Election {election_id}")));
    }
    tx.commit().await?;
    Ok(())
}

#[post("/parties", data = "<spec>", format = "json")]
async fn create_party(
    spec: Json<PartySpec>,
    store: &State<DynStore>,
) -> Result<Json<PartyDescription>> {
    let party: NewParty = spec.0.into();
    let mut tx = store.begin().await?;
    let id = tx.insert_party(&party).await?;
    tx.commit().await?;
    Ok(Json(Party { id, party }.into()))
}

#[post("/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    spec: Json<CandidateSpec>,
    store: &State<DynStore>,
) -> Result<Json<CandidateDescription>> {
    let candidate: NewCandidate = spec.0.into();
    let mut tx = store.begin().await?;
    require_election(tx.as_mut(), candidate.election_id).await?;
    if let Some(party_id) = candidate.party_id {
        if tx.party(party_id).await?.is_none() {
            return Err(Error::not_found(format!("Party {party_id}")));
        }
    }
    if let Some(user_id) = candidate.user_id {
        if tx.identity(user_id).await?.is_none() {
            return Err(Error::not_found(format!("User {user_id}")));
        }
    }
    let id = tx.insert_candidate(&candidate).await?;
    tx.commit().await?;
    Ok(Json(Candidate { id, candidate }.into()))
}

#[post("/centres", data = "<spec>", format = "json")]
async fn create_centre(
    spec: Json<CentreSpec>,
    store: &State<DynStore>,
) -> Result<Json<CentreDescription>> {
    let centre: NewCentre = spec.0.into();
    let mut tx = store.begin().await?;
    require_election(tx.as_mut(), centre.election_id).await?;
    let id = tx.insert_centre(&centre).await?;
    tx.commit().await?;
    Ok(Json(Centre { id, centre }.into()))
}

#[post("/voters", data = "<spec>", format = "json")]
async fn create_voter(
    spec: Json<VoterSpec>,
    store: &State<DynStore>,
) -> Result<Json<VoterDescription>> {
    let spec = spec.0;
    let mut tx = store.begin().await?;
    require_election(tx.as_mut(), *spec.election).await?;
    if let Some(centre_id) = spec.centre {
        let centre = tx
            .centre(*centre_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Centre {centre_id}")))?;
        if centre.election_id != *spec.election {
            return Err(Error::BadRequest(format!(
                "Centre {centre_id} belongs to another election"
            )));
        }
    }
    let identity = match spec.user {
        Some(user_id) => Some(
            tx.identity(*user_id)
                .await?
                .ok_or_else(|| Error::not_found(format!("User {user_id}")))?,
        ),
        None => None,
    };

    let voter = NewVoter::new(
        *spec.election,
        spec.centre.map(Into::into),
        identity.as_ref(),
        spec.full_name,
        spec.id_number,
        spec.weight.unwrap_or(1),
    )?;
    let id = tx.insert_voter(&voter).await?;
    tx.commit().await?;
    Ok(Json(Voter { id, voter }.into()))
}

#[delete("/candidates/<candidate_id>")]
async fn delete_candidate(
    candidate_id: Id,
    store: &State<DynStore>,
    events: &State<Broadcaster>,
) -> Result<()> {
    let mut tx = store.begin().await?;
    let candidate = tx
        .candidate(candidate_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    tx.delete_candidate(candidate_id).await?;
    let state = tally::resync(tx.as_mut(), candidate.election_id).await?;
    tx.commit().await?;
    tally::publish_state(events.inner(), candidate.election_id, &state);
    Ok(())
}

#[delete("/voters/<voter_id>")]
async fn delete_voter(
    voter_id: Id,
    store: &State<DynStore>,
    events: &State<Broadcaster>,
) -> Result<()> {
    let mut tx = store.begin().await?;
    let voter = tx
        .voter(voter_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))?;
    tx.delete_voter(voter_id).await?;
    let state = tally::resync(tx.as_mut(), voter.election_id).await?;
    tx.commit().await?;
    tally::publish_state(events.inner(), voter.election_id, &state);
    Ok(())
}

#[post("/actions/sync", data = "<request>", format = "json")]
async fn sync_votes(
    request: Json<SyncRequest>,
    store: &State<DynStore>,
    events: &State<Broadcaster>,
) -> Result<Json<TallyState>> {
    let request = request.0;
    let action = SyncVotesAction::new(request.name, *request.election);
    let state = process(&action, store.inner().as_ref(), events.inner()).await?;
    Ok(Json(state))
}

#[post("/actions/clone", data = "<request>", format = "json")]
async fn clone_election(
    request: Json<CloneRequest>,
    store: &State<DynStore>,
    events: &State<Broadcaster>,
) -> Result<Json<CloneReport>> {
    let request = request.0;
    let action =
        CloneElectionAction::new(request.name, *request.election, *request.new_election);
    let report = process(&action, store.inner().as_ref(), events.inner()).await?;
    Ok(Json(report))
}
