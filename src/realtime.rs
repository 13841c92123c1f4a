//! Fire-and-forget publication of live updates.

use log::debug;
use rocket::{
    serde::json::Value,
    tokio::sync::broadcast::{self, Receiver, Sender},
};
use serde::Serialize;

/// A named event published on a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub channel: String,
    pub event: String,
    pub data: Value,
}

/// Something that can publish events to whoever is listening.
pub trait Emitter: Send + Sync {
    /// Publish an event. Never blocks and never fails; with no subscribers
    /// the event is simply dropped.
    fn emit(&self, channel: &str, event: &str, data: Value);
}

/// An in-process [`Emitter`] backed by a broadcast channel.
///
/// Subscribers that fall more than the channel capacity behind lose the
/// oldest events.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: Sender<Event>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Emitter for Broadcaster {
    fn emit(&self, channel: &str, event: &str, data: Value) {
        let message = Event {
            channel: channel.to_string(),
            event: event.to_string(),
            data,
        };
        match self.sender.send(message) {
            Ok(receivers) => debug!("Emitted '{event}' on {channel} to {receivers} subscriber(s)"),
            Err(_) => debug!("Emitted '{event}' on {channel} with no subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::json;

    use super::*;

    #[test]
    fn subscribers_see_events_emitted_after_subscribing() {
        let broadcaster = Broadcaster::new(4);
        broadcaster.emit("room", "early", json!(0));

        let mut receiver = broadcaster.subscribe();
        broadcaster.emit("room", "state", json!({ "a": 1 }));

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.channel, "room");
        assert_eq!(event.event, "state");
        assert_eq!(event.data, json!({ "a": 1 }));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let broadcaster = Broadcaster::new(0);
        let mut receiver = broadcaster.subscribe();
        broadcaster.emit("room", "state", json!(null));
        assert!(receiver.try_recv().is_ok());
    }
}
