//! Collaborators on the far side of the inbox: the ticket backend that
//! serves paged lookups, and the push channel that delivers realtime events.

pub mod push;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{InboxError, Result};
use crate::types::{Seq, Ticket};

pub use push::{LocalPushChannel, PushChannel, PushEventKind, PushMessage, Unsubscribe};

/// Batched lookup of tickets by backend sequence identifier.
///
/// Implementations must be idempotent: fetching the same batch twice returns
/// the same records. A failure applies to the whole batch and nothing else.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn fetch_by_seqs(&self, seqs: &[Seq]) -> Result<Vec<Ticket>>;
}

/// Backend serving a fixed set of tickets from memory.
///
/// Used by the CLI to page through a fixture file, and by tests, which can
/// inject latency and per-identifier failures.
#[derive(Default)]
pub struct InMemoryBackend {
    tickets: HashMap<Seq, Ticket>,
    latency: Option<Duration>,
    failing: Mutex<HashSet<Seq>>,
    calls: Mutex<Vec<Vec<Seq>>>,
}

impl InMemoryBackend {
    /// Index `tickets` by their sequence identifier. Records without one are
    /// not addressable by paged lookup and are skipped.
    pub fn new(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let tickets = tickets
            .into_iter()
            .filter_map(|t| t.seq.map(|seq| (seq, t)))
            .collect();
        InMemoryBackend {
            tickets,
            ..Default::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The full ordered identifier listing, as a list endpoint would return it.
    pub fn listing(&self) -> Vec<Seq> {
        let mut seqs: Vec<Seq> = self.tickets.keys().copied().collect();
        seqs.sort();
        seqs
    }

    /// Make every batch containing `seq` fail until [`heal`](Self::heal) is called.
    pub fn fail_on(&self, seq: Seq) {
        self.failing.lock().insert(seq);
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    /// Every batch requested so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Seq>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TicketBackend for InMemoryBackend {
    async fn fetch_by_seqs(&self, seqs: &[Seq]) -> Result<Vec<Ticket>> {
        self.calls.lock().push(seqs.to_vec());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failing = self.failing.lock().clone();
        if let Some(bad) = seqs.iter().find(|s| failing.contains(*s)) {
            return Err(InboxError::fetch(
                format!("{} ids", seqs.len()),
                format!("backend rejected {bad}"),
            ));
        }

        Ok(seqs
            .iter()
            .filter_map(|seq| self.tickets.get(seq).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TicketId, TicketPriority, TicketStatus};

    fn ticket(seq: u64) -> Ticket {
        Ticket {
            id: TicketId::new_unchecked(format!("t-{seq}")),
            seq: Some(Seq(seq)),
            subject: String::new(),
            customer: String::new(),
            company: String::new(),
            assignee: None,
            tags: vec![],
            status: TicketStatus::Open,
            priority: TicketPriority::Low,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            last_message: String::new(),
            is_unread: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_known_records() {
        let backend = InMemoryBackend::new((1..=3).map(ticket));
        let got = backend.fetch_by_seqs(&[Seq(3), Seq(9), Seq(1)]).await.unwrap();
        let ids: Vec<_> = got.iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["t-3", "t-1"]);
        assert_eq!(backend.calls(), vec![vec![Seq(3), Seq(9), Seq(1)]]);
    }

    #[tokio::test]
    async fn test_failure_is_scoped_to_batches_containing_the_id() {
        let backend = InMemoryBackend::new((1..=4).map(ticket));
        backend.fail_on(Seq(2));

        let err = backend.fetch_by_seqs(&[Seq(1), Seq(2)]).await.unwrap_err();
        assert!(err.is_batch_scoped());
        assert!(backend.fetch_by_seqs(&[Seq(3), Seq(4)]).await.is_ok());

        backend.heal();
        assert_eq!(backend.fetch_by_seqs(&[Seq(2)]).await.unwrap().len(), 1);
    }

    #[test]
    fn test_listing_is_sorted() {
        let backend = InMemoryBackend::new([ticket(5), ticket(2), ticket(9)]);
        assert_eq!(backend.listing(), vec![Seq(2), Seq(5), Seq(9)]);
    }
}
