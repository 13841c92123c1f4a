use log::warn;
use rocket::{
    response::stream::{Event, EventStream},
    serde::json::Json,
    tokio::{select, sync::broadcast::error::RecvError},
    Route, Shutdown, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::{CandidateDescription, ElectionDescription, PartyDescription},
    db::state_channel,
    mongodb::Id,
};
use crate::realtime::Broadcaster;
use crate::store::DynStore;
use crate::voting::{current_state, TallyState, STATE_EVENT};

pub fn routes() -> Vec<Route> {
    routes![
        elections,
        election,
        election_state,
        election_state_events,
        parties,
        candidates,
    ]
}

#[get("/elections")]
async fn elections(store: &State<DynStore>) -> Result<Json<Vec<ElectionDescription>>> {
    let mut tx = store.begin().await?;
    let elections = tx.elections().await?;
    tx.commit().await?;
    Ok(Json(elections.into_iter().map(Into::into).collect()))
}

#[get("/elections/<election_id>")]
async fn election(election_id: Id, store: &State<DynStore>) -> Result<Json<ElectionDescription>> {
    let mut tx = store.begin().await?;
    let election = tx
        .election(election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    tx.commit().await?;
    Ok(Json(election.into()))
}

#[get("/elections/<election_id>/state")]
async fn election_state(election_id: Id, store: &State<DynStore>) -> Result<Json<TallyState>> {
    let state = current_state(store.inner().as_ref(), election_id).await?;
    Ok(Json(state))
}

/// Live tallies: the current state, then every published update until the
/// server shuts down.
#[get("/elections/<election_id>/state/events")]
async fn election_state_events(
    election_id: Id,
    store: &State<DynStore>,
    events: &State<Broadcaster>,
    mut shutdown: Shutdown,
) -> Result<EventStream![]> {
    // Subscribe first so no update is missed between snapshot and stream.
    let mut receiver = events.subscribe();
    let state = current_state(store.inner().as_ref(), election_id).await?;
    let channel = state_channel(election_id);

    Ok(EventStream! {
        yield Event::json(&state).event(STATE_EVENT);
        loop {
            let event = select! {
                biased;
                received = receiver.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Live stream of election {election_id} skipped {skipped} event(s)");
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };
            if event.channel == channel {
                yield Event::json(&event.data).event(event.event);
            }
        }
    })
}

#[get("/parties")]
async fn parties(store: &State<DynStore>) -> Result<Json<Vec<PartyDescription>>> {
    let mut tx = store.begin().await?;
    let parties = tx.parties().await?;
    tx.commit().await?;
    Ok(Json(parties.into_iter().map(Into::into).collect()))
}

#[get("/candidates?<election>")]
async fn candidates(
    election: Id,
    store: &State<DynStore>,
) -> Result<Json<Vec<CandidateDescription>>> {
    let mut tx = store.begin().await?;
    if tx.election(election).await?.is_none() {
        return Err(Error::not_found(format!("Election {election}")));
    }
    let candidates = tx.candidates(election).await?;
    tx.commit().await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}
