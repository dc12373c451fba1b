//! Fire-and-forget delivery of realtime events to connected owners.
//!
//! Delivery never blocks and never fails the caller: a missing or closed
//! session is logged and the event is dropped.
use bluetank_game::OwnerId;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event: String,
    pub payload: Value,
}

pub trait RealtimeNotifier: Send + Sync {
    fn notify(&self, owner: &OwnerId, event: &str, payload: Value);
}

/// Per-owner in-process channels, standing in for socket sessions.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    sessions: Mutex<HashMap<OwnerId, UnboundedSender<Notification>>>,
}

impl ChannelNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `owner`, replacing any previous one.
    pub fn connect(&self, owner: &OwnerId) -> UnboundedReceiver<Notification> {
        let (tx, rx) = unbounded_channel();
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner.clone(), tx);
        rx
    }

    pub fn disconnect(&self, owner: &OwnerId) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(owner);
    }

    #[must_use]
    pub fn connected(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RealtimeNotifier for ChannelNotifier {
    fn notify(&self, owner: &OwnerId, event: &str, payload: Value) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(session) = sessions.get(owner) else {
            log::debug!("no session for {owner}; dropping {event}");
            return;
        };
        let notification = Notification {
            event: event.to_string(),
            payload,
        };
        if session.send(notification).is_err() {
            log::debug!("session for {owner} closed; dropping {event}");
            sessions.remove(owner);
        }
    }
}

/// Writes events to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl RealtimeNotifier for LogNotifier {
    fn notify(&self, owner: &OwnerId, event: &str, payload: Value) {
        log::info!("{event} -> {owner}: {payload}");
    }
}
