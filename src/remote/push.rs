//! Push channel abstraction.
//!
//! A subscription is a message-passing sink plus an [`Unsubscribe`] guard.
//! The guard releases the subscription when dropped or when
//! [`Unsubscribe::release`] is called, and never more than once.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::string_enum;
use crate::error::{InboxError, Result};

/// Realtime event kinds the inbox listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushEventKind {
    #[serde(rename = "ticket.created")]
    Created,
    #[serde(rename = "ticket.updated")]
    Updated,
}

impl PushEventKind {
    pub const ALL: [PushEventKind; 2] = [PushEventKind::Updated, PushEventKind::Created];
}

string_enum!(
    PushEventKind,
    InboxError::InvalidEventKind,
    {
        Created => "ticket.created",
        Updated => "ticket.updated",
    }
);

/// One delivery from the push channel. The payload is a full ticket record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "event")]
    pub kind: PushEventKind,
    pub payload: serde_json::Value,
}

/// Release guard for a single (channel, event) subscription.
#[must_use = "dropping an Unsubscribe releases the subscription immediately"]
pub struct Unsubscribe {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Unsubscribe {
            release: Some(Box::new(release)),
        }
    }

    /// Release now. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// At-least-once delivery channel for realtime ticket events.
pub trait PushChannel: Send + Sync {
    /// Attach `sink` to `event` on `channel`. Messages flow into the sink
    /// until the returned guard is released.
    fn subscribe(
        &self,
        channel: &str,
        event: PushEventKind,
        sink: UnboundedSender<PushMessage>,
    ) -> Result<Unsubscribe>;
}

type SubscriberKey = (String, PushEventKind);

#[derive(Default)]
struct Hub {
    subscribers: Mutex<HashMap<SubscriberKey, Vec<(Uuid, UnboundedSender<PushMessage>)>>>,
    refused: Mutex<HashSet<PushEventKind>>,
    releases: AtomicUsize,
}

/// In-process push hub.
///
/// Backs the CLI replay command and the tests. Cloning shares the hub.
#[derive(Clone, Default)]
pub struct LocalPushChannel {
    hub: Arc<Hub>,
}

impl LocalPushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every live subscriber of (channel, kind).
    /// Returns the number of subscribers reached.
    pub fn publish(&self, channel: &str, kind: PushEventKind, payload: serde_json::Value) -> usize {
        let mut subscribers = self.hub.subscribers.lock();
        let Some(sinks) = subscribers.get_mut(&(channel.to_string(), kind)) else {
            return 0;
        };

        let message = PushMessage { kind, payload };
        sinks.retain(|(_, sink)| sink.send(message.clone()).is_ok());
        sinks.len()
    }

    /// Live subscriptions on `channel`, across all event kinds.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.hub
            .subscribers
            .lock()
            .iter()
            .filter(|((name, _), _)| name == channel)
            .map(|(_, sinks)| sinks.len())
            .sum()
    }

    /// Total number of subscriptions released since creation.
    pub fn releases(&self) -> usize {
        self.hub.releases.load(Ordering::SeqCst)
    }

    /// Make subsequent subscriptions to `kind` fail, simulating a broken
    /// connection during attachment.
    pub fn refuse(&self, kind: PushEventKind) {
        self.hub.refused.lock().insert(kind);
    }
}

impl PushChannel for LocalPushChannel {
    fn subscribe(
        &self,
        channel: &str,
        event: PushEventKind,
        sink: UnboundedSender<PushMessage>,
    ) -> Result<Unsubscribe> {
        if self.hub.refused.lock().contains(&event) {
            return Err(InboxError::subscription(
                channel,
                format!("connection refused while binding {event}"),
            ));
        }

        let key = (channel.to_string(), event);
        let token = Uuid::new_v4();
        self.hub
            .subscribers
            .lock()
            .entry(key.clone())
            .or_default()
            .push((token, sink));

        let hub = Arc::clone(&self.hub);
        Ok(Unsubscribe::new(move || {
            if let Some(sinks) = hub.subscribers.lock().get_mut(&key) {
                sinks.retain(|(id, _)| *id != token);
            }
            hub.releases.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
