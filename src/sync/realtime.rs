//! Realtime merge layer.
//!
//! Subscribes to ticket created/updated events on a push channel and feeds
//! each payload into the store through the same upsert path page fetches use.
//! Delivery is at-least-once; redelivered payloads leave the store unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::inbox::toast::{Notifier, Toast};
use crate::remote::{PushChannel, PushEventKind, PushMessage, Unsubscribe};
use crate::store::{TicketStore, UpsertOutcome};
use crate::types::Ticket;

/// Guards collected while attaching. Dropping the collection releases
/// every subscription attached so far, so a failure halfway through
/// attachment leaves nothing behind.
#[derive(Debug, Default)]
pub struct SubscriptionGuards(Vec<Unsubscribe>);

impl SubscriptionGuards {
    pub fn push(&mut self, guard: Unsubscribe) {
        self.0.push(guard);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn release_all(self) {
        for guard in self.0 {
            guard.release();
        }
    }
}

struct ActiveSubscription {
    guards: SubscriptionGuards,
    task: JoinHandle<()>,
}

/// Owns the realtime subscriptions of one inbox.
pub struct RealtimeMerge {
    push: Arc<dyn PushChannel>,
    store: Arc<TicketStore>,
    notifier: Notifier,
    active: HashMap<String, ActiveSubscription>,
}

impl RealtimeMerge {
    pub fn new(push: Arc<dyn PushChannel>, store: Arc<TicketStore>, notifier: Notifier) -> Self {
        RealtimeMerge {
            push,
            store,
            notifier,
            active: HashMap::new(),
        }
    }

    pub fn is_attached(&self, channel: &str) -> bool {
        self.active.contains_key(channel)
    }

    /// Subscribe to every ticket event on `channel` and start merging.
    ///
    /// An existing subscription on the same channel is released first. On
    /// failure, partial attachments are released, an error toast is queued
    /// and the error is returned; the inbox keeps working on fetches alone.
    /// Must be called inside a tokio runtime.
    pub fn attach(&mut self, channel: &str) -> Result<()> {
        self.detach(channel);

        let (sink, events) = mpsc::unbounded_channel();
        let mut guards = SubscriptionGuards::default();
        for kind in PushEventKind::ALL {
            match self.push.subscribe(channel, kind, sink.clone()) {
                Ok(guard) => guards.push(guard),
                Err(e) => {
                    tracing::warn!(channel, event = %kind, error = %e, "realtime attachment failed");
                    drop(guards);
                    self.notifier.push(Toast::error(format!(
                        "Live updates unavailable: {e}"
                    )));
                    return Err(e);
                }
            }
        }
        drop(sink);

        let task = tokio::spawn(merge_loop(
            events,
            Arc::clone(&self.store),
            self.notifier.clone(),
        ));
        tracing::debug!(channel, subscriptions = guards.len(), "realtime attached");
        self.active
            .insert(channel.to_string(), ActiveSubscription { guards, task });
        Ok(())
    }

    /// Release the subscription on `channel` and stop merging immediately.
    /// Returns false when nothing was attached.
    pub fn detach(&mut self, channel: &str) -> bool {
        let Some(active) = self.active.remove(channel) else {
            return false;
        };
        active.guards.release_all();
        active.task.abort();
        tracing::debug!(channel, "realtime detached");
        true
    }

    /// Release the subscription on `channel`, then wait until every event
    /// delivered before the release has been merged.
    pub async fn finish(&mut self, channel: &str) {
        let Some(active) = self.active.remove(channel) else {
            return;
        };
        active.guards.release_all();
        // The task ends once the last sink clone is gone.
        let _ = active.task.await;
    }

    pub fn detach_all(&mut self) {
        let channels: Vec<String> = self.active.keys().cloned().collect();
        for channel in channels {
            self.detach(&channel);
        }
    }
}

impl Drop for RealtimeMerge {
    fn drop(&mut self) {
        self.detach_all();
    }
}

async fn merge_loop(
    mut events: mpsc::UnboundedReceiver<PushMessage>,
    store: Arc<TicketStore>,
    notifier: Notifier,
) {
    while let Some(message) = events.recv().await {
        merge_message(&store, &notifier, message);
    }
}

/// Decode and upsert one push message. Malformed payloads are logged and
/// skipped. A toast is queued whenever the store actually changed.
pub fn merge_message(
    store: &TicketStore,
    notifier: &Notifier,
    message: PushMessage,
) -> Option<UpsertOutcome> {
    let ticket: Ticket = match serde_json::from_value(message.payload) {
        Ok(ticket) => ticket,
        Err(e) => {
            tracing::warn!(event = %message.kind, error = %e, "skipping malformed push payload");
            return None;
        }
    };

    let subject = ticket.subject.clone();
    let outcome = store.upsert(ticket);
    match (message.kind, outcome) {
        (_, UpsertOutcome::Unchanged) => {}
        (PushEventKind::Created, _) | (_, UpsertOutcome::Inserted) => {
            notifier.push(Toast::info(format!("New ticket: {subject}")));
        }
        (PushEventKind::Updated, UpsertOutcome::Updated) => {
            notifier.push(Toast::info(format!("Ticket updated: {subject}")));
        }
    }
    Some(outcome)
}
