use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{CastVote, VoteReceipt},
    mongodb::Id,
};
use crate::realtime::Broadcaster;
use crate::store::DynStore;
use crate::voting::cast_vote;

pub fn routes() -> Vec<Route> {
    routes![vote]
}

#[post("/voters/<voter_id>/votes", data = "<request>", format = "json")]
async fn vote(
    voter_id: Id,
    request: Json<CastVote>,
    store: &State<DynStore>,
    events: &State<Broadcaster>,
) -> Result<Json<VoteReceipt>> {
    let vote = cast_vote(
        store.inner().as_ref(),
        events.inner(),
        voter_id,
        *request.candidate,
        Utc::now(),
    )
    .await?;
    Ok(Json(vote.into()))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json,
    };

    use crate::model::db::{CandidateCore, ElectionCore, VoterCore};
    use crate::store::{MemoryStore, Store};

    use super::*;

    /// An election with one candidate and one voter.
    async fn setup(store: &MemoryStore, election: ElectionCore) -> (Id, Id) {
        let mut tx = store.begin().await.unwrap();
        let election = tx.insert_election(&election).await.unwrap();
        let candidate = tx
            .insert_candidate(&CandidateCore::example(election, "Ann", "C-1"))
            .await
            .unwrap();
        let voter = tx
            .insert_voter(&VoterCore::example(election, None, "V-1"))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (voter, candidate)
    }

    async fn post_vote(client: &Client, voter: Id, candidate: Id) -> LocalResponse<'_> {
        let request = CastVote {
            candidate: candidate.into(),
        };
        client
            .post(uri!(vote(voter)))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await
    }

    #[store_test]
    async fn accepted_vote(client: Client, store: MemoryStore) {
        let (voter, candidate) = setup(&store, ElectionCore::current_example()).await;

        let response = post_vote(&client, voter, candidate).await;
        assert_eq!(response.status(), Status::Ok);
        let receipt: VoteReceipt = response.into_json().await.unwrap();
        assert_eq!(*receipt.voter, voter);
        assert_eq!(*receipt.candidate, candidate);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_votes_by_voter(voter).await.unwrap(), 1);
    }

    #[store_test]
    async fn rejections_map_to_statuses(client: Client, store: MemoryStore) {
        let (voter, candidate) = setup(&store, ElectionCore::current_example()).await;
        post_vote(&client, voter, candidate).await;

        let response = post_vote(&client, voter, candidate).await;
        assert_eq!(response.status(), Status::Conflict);
        assert_eq!(response.into_string().await.unwrap(), "Already voted!");

        let (_, foreign) = setup(&store, ElectionCore::current_example()).await;
        let response = post_vote(&client, voter, foreign).await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(response.into_string().await.unwrap(), "Unregistered voter");

        let mut closed = ElectionCore::current_example();
        closed.end = Utc::now() - Duration::minutes(1);
        let (late_voter, late_candidate) = setup(&store, closed).await;
        let response = post_vote(&client, late_voter, late_candidate).await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(response.into_string().await.unwrap(), "Election closed");

        let response = post_vote(&client, Id::new(), candidate).await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
