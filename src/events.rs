//! Event subscription registry.
//!
//! Maps event names to an ordered list of subscribers. Subscribing hands
//! back an unbounded receiver; publication fans an event out to every
//! subscriber registered at dispatch time, in registration order.
//!
//! Unsubscription is implicit: dropping the receiver closes the channel and
//! the sender is pruned on the next publication for that name. A late event
//! delivered to a dropped subscriber is discarded without error, which is
//! what makes `wait_for_event` safe after its timeout fires.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::protocol::Event;

/// Registry mapping event names to subscriber channels.
#[derive(Default)]
pub struct EventRegistry {
    /// Subscribers by event name, in registration order.
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Event>>>>,
}

impl EventRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of the given name.
    ///
    /// Every event of that name published after this call is delivered to
    /// the returned receiver. Drop the receiver to unsubscribe.
    pub fn subscribe(&self, name: &str) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.entry(name.to_string()).or_default().push(tx);
        rx
    }

    /// Publish an event to all current subscribers of its name.
    ///
    /// Subscribers whose receiver has been dropped are pruned here.
    pub fn publish(&self, event: &Event) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = subscribers.get_mut(&event.event) {
            list.retain(|tx| tx.send(event.clone()).is_ok());
            if list.is_empty() {
                subscribers.remove(&event.event);
            }
        }
    }

    /// Number of live subscribers for an event name.
    pub fn subscriber_count(&self, name: &str) -> usize {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.get(name).map_or(0, Vec::len)
    }
}
