use std::collections::BTreeMap;

use log::{debug, error};
use rocket::serde::json::serde_json;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{db::state_channel, mongodb::Id};
use crate::realtime::Emitter;
use crate::store::{Store, Transaction};

/// Name of the real-time event carrying a full tally.
pub const STATE_EVENT: &str = "state";

/// Votes received by one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub votes_count: u64,
    /// Share of all votes in the election, 0 to 100, rounded to 2 decimal places.
    pub votes_percentage: f64,
}

/// Tally of every candidate in an election, keyed by candidate ID.
pub type TallyState = BTreeMap<String, CandidateTally>;

/// `votes_count` as a percentage of `total`, rounded to 2 decimal places.
/// Zero when no votes have been cast.
pub(crate) fn percentage(votes_count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let exact = votes_count as f64 * 100.0 / total as f64;
    (exact * 100.0).round() / 100.0
}

async fn tally(tx: &mut dyn Transaction, election_id: Id) -> Result<Vec<(Id, CandidateTally)>> {
    let total = tx.count_votes_in_election(election_id).await?;
    let mut tallies = Vec::new();
    for candidate in tx.candidates(election_id).await? {
        let votes_count = tx.count_votes_by_candidate(candidate.id).await?;
        tallies.push((
            candidate.id,
            CandidateTally {
                votes_count,
                votes_percentage: percentage(votes_count, total),
            },
        ));
    }
    Ok(tallies)
}

fn into_state(tallies: Vec<(Id, CandidateTally)>) -> TallyState {
    tallies
        .into_iter()
        .map(|(id, tally)| (id.to_string(), tally))
        .collect()
}

/// Count the votes of every candidate in the election, as seen by `tx`.
pub async fn get_state(tx: &mut dyn Transaction, election_id: Id) -> Result<TallyState> {
    Ok(into_state(tally(tx, election_id).await?))
}

/// Recompute the election's tallies and cache them on its candidates.
///
/// Nothing is published; the caller does that once `tx` has committed.
pub(crate) async fn resync(tx: &mut dyn Transaction, election_id: Id) -> Result<TallyState> {
    let tallies = tally(tx, election_id).await?;
    for (candidate_id, tally) in &tallies {
        tx.update_candidate_tally(*candidate_id, tally.votes_count, tally.votes_percentage)
            .await?;
    }
    debug!(
        "Synced votes of {} candidate(s) in election {election_id}",
        tallies.len()
    );
    Ok(into_state(tallies))
}

/// Publish a tally on the election's state channel.
pub(crate) fn publish_state(emitter: &dyn Emitter, election_id: Id, state: &TallyState) {
    match serde_json::to_value(state) {
        Ok(data) => emitter.emit(&state_channel(election_id), STATE_EVENT, data),
        Err(err) => error!("Failed to encode state of election {election_id}: {err}"),
    }
}

/// The election's current tally, without touching the cached candidate fields.
pub async fn current_state(store: &dyn Store, election_id: Id) -> Result<TallyState> {
    let mut tx = store.begin().await?;
    if tx.election(election_id).await?.is_none() {
        return Err(Error::not_found(format!("Election {election_id}")));
    }
    let state = get_state(tx.as_mut(), election_id).await?;
    tx.commit().await?;
    Ok(state)
}

/// Recompute and store the election's tallies, then publish them.
pub async fn sync_votes(
    store: &dyn Store,
    emitter: &dyn Emitter,
    election_id: Id,
) -> Result<TallyState> {
    let mut tx = store.begin().await?;
    if tx.election(election_id).await?.is_none() {
        return Err(Error::not_found(format!("Election {election_id}")));
    }
    let state = resync(tx.as_mut(), election_id).await?;
    tx.commit().await?;
    publish_state(emitter, election_id, &state);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::model::db::{Candidate, ElectionCore, VoteCore};
    use crate::realtime::Broadcaster;
    use crate::store::MemoryStore;
    use crate::voting::{admission::cast_vote, fixtures::Fixture};

    use super::*;

    #[test]
    fn percentages_are_rounded() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(1, 8), 12.5);
        assert_eq!(percentage(4, 4), 100.0);
    }

    #[store_test]
    async fn no_votes_means_zero_everywhere(store: MemoryStore) {
        let fixture = Fixture::create(&store, ElectionCore::current_example(), 3, 2).await;

        let state = current_state(&store, fixture.election).await.unwrap();
        assert_eq!(state.len(), 3);
        for tally in state.values() {
            assert_eq!(tally.votes_count, 0);
            assert_eq!(tally.votes_percentage, 0.0);
        }
    }

    #[store_test]
    async fn counts_sum_to_election_votes(store: MemoryStore, events: Broadcaster) {
        let mut election = ElectionCore::current_example();
        election.votes_per_voter = 2;
        let fixture = Fixture::create(&store, election, 3, 3).await;
        let now = Utc::now();
        for (voter, candidate) in [(0, 0), (0, 1), (1, 0), (2, 2), (2, 0)] {
            cast_vote(
                &store,
                &events,
                fixture.voters[voter],
                fixture.candidates[candidate],
                now,
            )
            .await
            .unwrap();
        }

        let state = current_state(&store, fixture.election).await.unwrap();
        let total: u64 = state.values().map(|tally| tally.votes_count).sum();
        assert_eq!(total, 5);

        let tally_of = |index: usize| state[&fixture.candidates[index].to_string()];
        assert_eq!(tally_of(0).votes_count, 3);
        assert_eq!(tally_of(0).votes_percentage, 60.0);
        assert_eq!(tally_of(1).votes_count, 1);
        assert_eq!(tally_of(1).votes_percentage, 20.0);
        assert_eq!(tally_of(2).votes_count, 1);
        assert_eq!(tally_of(2).votes_percentage, 20.0);
    }

    #[store_test]
    async fn sync_writes_only_tally_fields(store: MemoryStore, events: Broadcaster) {
        let fixture = Fixture::create(&store, ElectionCore::current_example(), 2, 1).await;

        // Insert a vote behind the tally's back, so the cache is stale.
        let mut tx = store.begin().await.unwrap();
        tx.insert_vote(&VoteCore {
            election_id: fixture.election,
            voter_id: fixture.voters[0],
            candidate_id: fixture.candidates[1],
            slot: 0,
        })
        .await
        .unwrap();
        let before: Candidate = tx.candidate(fixture.candidates[1]).await.unwrap().unwrap();
        tx.commit().await.unwrap();
        assert_eq!(before.votes_count, 0);

        sync_votes(&store, &events, fixture.election).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let after = tx.candidate(fixture.candidates[1]).await.unwrap().unwrap();
        assert_eq!(after.votes_count, 1);
        assert_eq!(after.votes_percentage, 100.0);
        assert_eq!(after.full_name, before.full_name);
        assert_eq!(after.id_number, before.id_number);
        assert_eq!(after.election_id, before.election_id);
        let other = tx.candidate(fixture.candidates[0]).await.unwrap().unwrap();
        assert_eq!(other.votes_count, 0);
        assert_eq!(other.votes_percentage, 0.0);
    }

    #[store_test]
    async fn sync_is_idempotent(store: MemoryStore, events: Broadcaster) {
        let fixture = Fixture::create(&store, ElectionCore::current_example(), 2, 3).await;
        let now = Utc::now();
        for voter in &fixture.voters {
            cast_vote(&store, &events, *voter, fixture.candidates[0], now)
                .await
                .unwrap();
        }

        let mut receiver = events.subscribe();
        let first = sync_votes(&store, &events, fixture.election).await.unwrap();
        let second = sync_votes(&store, &events, fixture.election).await.unwrap();
        assert_eq!(first, second);

        let first_event = receiver.try_recv().unwrap();
        let second_event = receiver.try_recv().unwrap();
        assert_eq!(first_event, second_event);
        assert_eq!(first_event.channel, state_channel(fixture.election));
        assert_eq!(first_event.event, STATE_EVENT);
        assert_eq!(first_event.data, serde_json::to_value(&first).unwrap());

        let mut tx = store.begin().await.unwrap();
        let winner = tx.candidate(fixture.candidates[0]).await.unwrap().unwrap();
        assert_eq!(winner.votes_count, 3);
        assert_eq!(winner.votes_percentage, 100.0);
    }

    #[store_test]
    async fn unknown_election_is_not_found(store: MemoryStore, events: Broadcaster) {
        let mut receiver = events.subscribe();
        assert!(matches!(
            sync_votes(&store, &events, Id::new()).await,
            Err(Error::NotFound(_))
        ));
        assert!(receiver.try_recv().is_err());
    }

    #[store_test]
    async fn other_elections_do_not_leak(store: MemoryStore, events: Broadcaster) {
        let first = Fixture::create(&store, ElectionCore::current_example(), 1, 1).await;
        let second = Fixture::create(&store, ElectionCore::current_example(), 1, 1).await;
        cast_vote(
            &store,
            &events,
            second.voters[0],
            second.candidates[0],
            Utc::now(),
        )
        .await
        .unwrap();

        let state = current_state(&store, first.election).await.unwrap();
        assert_eq!(state[&first.candidates[0].to_string()].votes_count, 0);
        assert_eq!(state[&first.candidates[0].to_string()].votes_percentage, 0.0);
    }
}
