//! Page-by-page loading of the backend listing.
//!
//! The backend exposes an ordered list of sequence identifiers. This module
//! slices it into fixed-size pages, fetches whichever identifiers of the
//! visible page are not yet resident, and speculatively loads neighbouring
//! pages. Fetches run as tokio tasks; their results come back over a channel
//! and are applied by the owner's event loop through [`Paginator::apply`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::inbox::toast::{Notifier, Toast};
use crate::remote::TicketBackend;
use crate::store::TicketStore;
use crate::types::{Seq, Ticket};

/// Page arithmetic over a listing of `total` identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    total: usize,
    page_size: usize,
}

impl PageLayout {
    /// A zero page size is treated as one.
    pub fn new(total: usize, page_size: usize) -> Self {
        PageLayout {
            total,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(total / page_size)`; an empty listing has no pages.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Index range of 1-indexed `page`. Pages outside `1..=page_count` are empty.
    pub fn range(&self, page: usize) -> Range<usize> {
        if page == 0 || page > self.page_count() {
            return self.total..self.total;
        }
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn is_last(&self, page: usize) -> bool {
        page >= self.page_count()
    }

    /// Clamp a requested page into `1..=page_count` (1 when there are none).
    pub fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.page_count().max(1))
    }
}

/// Identity of a fetch batch, derived from its identifiers in order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey(blake3::Hash);

impl BatchKey {
    pub fn of(seqs: &[Seq]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for seq in seqs {
            hasher.update(&seq.0.to_le_bytes());
        }
        BatchKey(hasher.finalize())
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_hex()[..12])
    }
}

impl fmt::Debug for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchKey({self})")
    }
}

/// Why a batch was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    Navigate,
    Prefetch,
}

/// A completed fetch, waiting to be applied.
#[derive(Debug)]
pub struct FetchOutcome {
    pub key: BatchKey,
    pub reason: FetchReason,
    pub seqs: Vec<Seq>,
    pub result: Result<Vec<Ticket>>,
}

/// State of one row on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Loaded(Arc<Ticket>),
    Loading,
    Failed(String),
    /// Not resident and no fetch outstanding (e.g. the backend omitted it).
    Missing,
}

/// What applying an outcome did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applied {
    /// Records that changed the store.
    pub changed: usize,
    /// Rows marked failed.
    pub failed: usize,
}

struct InFlight {
    seqs: Vec<Seq>,
    reason: FetchReason,
    handle: JoinHandle<()>,
}

/// Pagination and prefetch controller.
pub struct Paginator {
    backend: Arc<dyn TicketBackend>,
    store: Arc<TicketStore>,
    notifier: Notifier,
    listing: Vec<Seq>,
    page_size: usize,
    current: usize,
    in_flight: HashMap<BatchKey, InFlight>,
    failed: HashMap<Seq, String>,
    /// Requested by a successful batch but absent from its response.
    omitted: HashSet<Seq>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    closed: bool,
}

impl Paginator {
    pub fn new(
        backend: Arc<dyn TicketBackend>,
        store: Arc<TicketStore>,
        notifier: Notifier,
        page_size: usize,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Paginator {
            backend,
            store,
            notifier,
            listing: Vec::new(),
            page_size: page_size.max(1),
            current: 1,
            in_flight: HashMap::new(),
            failed: HashMap::new(),
            omitted: HashSet::new(),
            outcome_tx,
            outcome_rx,
            closed: false,
        }
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout::new(self.listing.len(), self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.layout().page_count()
    }

    pub fn listing(&self) -> &[Seq] {
        &self.listing
    }

    /// Identifiers on 1-indexed `page`.
    pub fn page_seqs(&self, page: usize) -> &[Seq] {
        &self.listing[self.layout().range(page)]
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Replace the backend listing. Resident records are kept even if their
    /// identifier is no longer listed; the current page is clamped.
    pub fn set_listing(&mut self, listing: Vec<Seq>) {
        self.listing = listing;
        self.current = self.layout().clamp(self.current);
    }

    /// Navigate to `page` (clamped), fetching its missing rows and
    /// prefetching neighbours. Must be called inside a tokio runtime.
    pub fn go_to(&mut self, page: usize) -> Option<BatchKey> {
        if self.closed {
            return None;
        }
        self.current = self.layout().clamp(page);
        let key = self.request(self.current, FetchReason::Navigate);
        self.prefetch_neighbours();
        key
    }

    pub fn next_page(&mut self) -> Option<BatchKey> {
        self.go_to(self.current + 1)
    }

    pub fn prev_page(&mut self) -> Option<BatchKey> {
        self.go_to(self.current.saturating_sub(1))
    }

    /// Whether every row of `page` is resident.
    pub fn is_page_resident(&self, page: usize) -> bool {
        let seqs = self.page_seqs(page);
        !seqs.is_empty() && self.store.missing_seqs(seqs).is_empty()
    }

    fn prefetch_neighbours(&mut self) {
        let page = self.current;
        let layout = self.layout();
        if self.is_page_resident(page) && !layout.is_last(page) {
            self.request(page + 1, FetchReason::Prefetch);
        }
        if page > 1 {
            self.request(page - 1, FetchReason::Prefetch);
        }
    }

    /// Issue one batched fetch for the non-resident rows of `page`.
    ///
    /// An identical batch already in flight is joined rather than repeated.
    /// Prefetches skip rows that failed or were omitted by the backend; only
    /// navigation retries them.
    fn request(&mut self, page: usize, reason: FetchReason) -> Option<BatchKey> {
        let mut missing = self.store.missing_seqs(self.page_seqs(page));
        if reason == FetchReason::Prefetch {
            missing.retain(|seq| !self.failed.contains_key(seq) && !self.omitted.contains(seq));
        }
        if missing.is_empty() {
            return None;
        }

        let key = BatchKey::of(&missing);
        if let Some(flight) = self.in_flight.get_mut(&key) {
            tracing::debug!(batch = %key, "batch already in flight");
            if reason == FetchReason::Navigate {
                flight.reason = FetchReason::Navigate;
            }
            return Some(key);
        }

        for seq in &missing {
            self.failed.remove(seq);
            self.omitted.remove(seq);
        }

        tracing::debug!(batch = %key, page, ?reason, ids = missing.len(), "fetching batch");
        let backend = Arc::clone(&self.backend);
        let tx = self.outcome_tx.clone();
        let seqs = missing.clone();
        let handle = tokio::spawn(async move {
            let result = backend.fetch_by_seqs(&seqs).await;
            // The receiver is gone once the paginator shuts down.
            let _ = tx.send(FetchOutcome {
                key,
                reason,
                seqs,
                result,
            });
        });

        self.in_flight.insert(
            key,
            InFlight {
                seqs: missing,
                reason,
                handle,
            },
        );
        Some(key)
    }

    /// Wait for the next completed fetch.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        if self.closed {
            return None;
        }
        self.outcome_rx.recv().await
    }

    /// Apply a completed fetch to the store. Results arriving after
    /// [`shutdown`](Self::shutdown) are ignored.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Applied {
        if self.closed {
            tracing::debug!(batch = %outcome.key, "dropping fetch result after shutdown");
            return Applied::default();
        }
        let reason = self
            .in_flight
            .remove(&outcome.key)
            .map_or(outcome.reason, |flight| flight.reason);

        let applied = match outcome.result {
            Ok(tickets) => {
                let changed = self.store.upsert_all(tickets);
                let omitted = self.store.missing_seqs(&outcome.seqs);
                if !omitted.is_empty() {
                    tracing::debug!(batch = %outcome.key, count = omitted.len(), "backend omitted ids");
                }
                self.omitted.extend(omitted);
                Applied { changed, failed: 0 }
            }
            Err(e) => {
                let message = e.to_string();
                for seq in &outcome.seqs {
                    self.failed.insert(*seq, message.clone());
                }
                self.notifier.push(Toast::error(format!(
                    "Failed to load {} tickets: {message}",
                    outcome.seqs.len()
                )));
                Applied {
                    changed: 0,
                    failed: outcome.seqs.len(),
                }
            }
        };

        // Only a completed load of the current page triggers more work.
        if reason == FetchReason::Navigate && applied.failed == 0 {
            let current = self.page_seqs(self.current);
            if outcome.seqs.iter().all(|seq| current.contains(seq)) {
                self.prefetch_neighbours();
            }
        }
        applied
    }

    /// Apply outcomes until nothing is in flight.
    pub async fn settle(&mut self) {
        while !self.in_flight.is_empty() {
            match self.next_outcome().await {
                Some(outcome) => {
                    self.apply(outcome);
                }
                None => break,
            }
        }
    }

    /// Row states for the current page.
    pub fn rows(&self) -> Vec<(Seq, RowState)> {
        self.page_seqs(self.current)
            .iter()
            .map(|seq| (*seq, self.row_state(*seq)))
            .collect()
    }

    pub fn row_state(&self, seq: Seq) -> RowState {
        if let Some(ticket) = self.store.get_by_seq(seq) {
            return RowState::Loaded(ticket);
        }
        if let Some(message) = self.failed.get(&seq) {
            return RowState::Failed(message.clone());
        }
        if self.in_flight.values().any(|f| f.seqs.contains(&seq)) {
            return RowState::Loading;
        }
        RowState::Missing
    }

    /// Accept work again after [`shutdown`](Self::shutdown), with a fresh
    /// result channel and no remembered failures.
    pub fn reopen(&mut self) {
        if !self.closed {
            return;
        }
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        self.outcome_tx = outcome_tx;
        self.outcome_rx = outcome_rx;
        self.failed.clear();
        self.omitted.clear();
        self.closed = false;
    }

    /// Stop all work: abort outstanding fetches and ignore anything that
    /// still completes. Idempotent.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for (_, flight) in self.in_flight.drain() {
            flight.handle.abort();
        }
        self.outcome_rx.close();
        while self.outcome_rx.try_recv().is_ok() {}
    }
}

impl Drop for Paginator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::remote::InMemoryBackend;
    use crate::types::{TicketId, TicketPriority, TicketStatus};

    fn ticket(seq: u64) -> Ticket {
        Ticket {
            id: TicketId::new_unchecked(format!("t-{seq}")),
            seq: Some(Seq(seq)),
            subject: format!("Ticket {seq}"),
            customer: "Customer".to_string(),
            company: String::new(),
            assignee: None,
            tags: vec![],
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            last_message: String::new(),
            is_unread: None,
        }
    }

    fn seqs(range: std::ops::RangeInclusive<u64>) -> Vec<Seq> {
        range.map(Seq).collect()
    }

    fn paginator(backend: Arc<InMemoryBackend>, page_size: usize) -> (Paginator, Arc<TicketStore>) {
        let store = Arc::new(TicketStore::empty());
        let mut pager = Paginator::new(backend.clone(), store.clone(), Notifier::new(), page_size);
        pager.set_listing(backend.listing());
        (pager, store)
    }

    #[test]
    fn test_layout_twelve_by_five() {
        let layout = PageLayout::new(12, 5);
        assert_eq!(layout.page_count(), 3);
        assert_eq!(layout.range(1), 0..5);
        assert_eq!(layout.range(2), 5..10);
        assert_eq!(layout.range(3), 10..12);
        assert_eq!(layout.range(4), 12..12);
        assert_eq!(layout.range(0), 12..12);
    }

    #[test]
    fn test_layout_empty_listing() {
        let layout = PageLayout::new(0, 5);
        assert_eq!(layout.page_count(), 0);
        assert_eq!(layout.clamp(3), 1);
        assert_eq!(layout.range(1), 0..0);
    }

    #[test]
    fn test_batch_key_depends_on_ids() {
        assert_eq!(BatchKey::of(&seqs(1..=3)), BatchKey::of(&seqs(1..=3)));
        assert_ne!(BatchKey::of(&seqs(1..=3)), BatchKey::of(&seqs(1..=4)));
    }

    #[tokio::test]
    async fn test_navigation_fetches_exactly_missing_ids_then_prefetches_next() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        let (mut pager, store) = paginator(backend.clone(), 5);

        pager.go_to(1);
        pager.settle().await;

        assert_eq!(backend.calls()[0], seqs(1..=5));
        // Page 1 became resident, so page 2 was prefetched; page 3 was not.
        assert_eq!(backend.calls()[1], seqs(6..=10));
        assert_eq!(backend.calls().len(), 2);
        assert_eq!(store.len(), 10);
        assert_eq!(pager.page_seqs(3), seqs(11..=12).as_slice());
    }

    #[tokio::test]
    async fn test_navigation_skips_resident_rows() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        let (mut pager, store) = paginator(backend.clone(), 5);
        store.upsert(ticket(7));
        store.upsert(ticket(9));

        pager.go_to(2);
        pager.settle().await;

        assert_eq!(backend.calls()[0], vec![Seq(6), Seq(8), Seq(10)]);
    }

    #[tokio::test]
    async fn test_last_page_prefetches_previous_only() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        let (mut pager, _store) = paginator(backend.clone(), 5);

        pager.go_to(3);
        pager.settle().await;

        let calls = backend.calls();
        assert!(calls.contains(&seqs(11..=12)));
        assert!(calls.contains(&seqs(6..=10)));
        assert!(!calls.iter().any(|c| c.contains(&Seq(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_batch_is_not_refetched_while_in_flight() {
        let backend = Arc::new(
            InMemoryBackend::new((1..=12).map(ticket)).with_latency(Duration::from_millis(100)),
        );
        let (mut pager, _store) = paginator(backend.clone(), 5);

        let first = pager.go_to(1);
        let second = pager.go_to(1);
        assert_eq!(first, second);
        assert_eq!(pager.in_flight_count(), 1);
        assert_eq!(pager.row_state(Seq(1)), RowState::Loading);

        pager.settle().await;
        let page_one_calls = backend
            .calls()
            .iter()
            .filter(|c| **c == seqs(1..=5))
            .count();
        assert_eq!(page_one_calls, 1);
    }

    #[tokio::test]
    async fn test_failure_is_scoped_to_its_batch() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        backend.fail_on(Seq(3));
        let notifier = Notifier::new();
        let store = Arc::new(TicketStore::empty());
        let mut pager = Paginator::new(backend.clone(), store.clone(), notifier.clone(), 5);
        pager.set_listing(backend.listing());

        pager.go_to(1);
        pager.settle().await;
        assert!(
            pager
                .rows()
                .iter()
                .all(|(_, state)| matches!(state, RowState::Failed(_)))
        );
        assert_eq!(notifier.drain().len(), 1);

        pager.go_to(2);
        pager.settle().await;
        assert!(
            pager
                .rows()
                .iter()
                .all(|(_, state)| matches!(state, RowState::Loaded(_)))
        );

        // Returning to the failed page retries it.
        backend.heal();
        pager.go_to(1);
        pager.settle().await;
        assert!(pager.is_page_resident(1));
    }

    #[tokio::test]
    async fn test_persistently_failing_neighbour_is_not_retried() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        backend.fail_on(Seq(7));
        let notifier = Notifier::new();
        let store = Arc::new(TicketStore::empty());
        let mut pager = Paginator::new(backend.clone(), store.clone(), notifier.clone(), 5);
        pager.set_listing(backend.listing());

        pager.go_to(1);
        tokio::time::timeout(Duration::from_secs(2), pager.settle())
            .await
            .expect("settle should finish");

        let page_two_calls = backend.calls().iter().filter(|c| c.contains(&Seq(7))).count();
        assert_eq!(page_two_calls, 1);
        assert_eq!(notifier.drain().len(), 1);
        assert!(matches!(pager.row_state(Seq(7)), RowState::Failed(_)));
        assert!(pager.is_page_resident(1));

        // Moving back and forth does not prefetch the failed page again.
        pager.go_to(1);
        pager.settle().await;
        let page_two_calls = backend.calls().iter().filter(|c| c.contains(&Seq(7))).count();
        assert_eq!(page_two_calls, 1);
    }

    #[tokio::test]
    async fn test_omitted_id_is_not_refetched_automatically() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).filter(|n| *n != 3).map(ticket)));
        let store = Arc::new(TicketStore::empty());
        let mut pager = Paginator::new(backend.clone(), store.clone(), Notifier::new(), 5);
        pager.set_listing(seqs(1..=12));

        pager.go_to(2);
        tokio::time::timeout(Duration::from_secs(2), pager.settle())
            .await
            .expect("settle should finish");

        let page_one_calls = backend.calls().iter().filter(|c| c.contains(&Seq(3))).count();
        assert_eq!(page_one_calls, 1);
        assert_eq!(pager.row_state(Seq(3)), RowState::Missing);
        assert_eq!(store.len(), 11);

        // Navigating to the page asks for the absent row once more.
        pager.go_to(1);
        tokio::time::timeout(Duration::from_secs(2), pager.settle())
            .await
            .expect("settle should finish");
        assert_eq!(backend.calls().last(), Some(&vec![Seq(3)]));
        assert_eq!(pager.row_state(Seq(3)), RowState::Missing);
    }

    #[tokio::test]
    async fn test_reopen_after_shutdown_fetches_again() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        let (mut pager, store) = paginator(backend.clone(), 5);

        pager.shutdown();
        assert_eq!(pager.go_to(1), None);

        pager.reopen();
        assert!(!pager.is_closed());
        assert!(pager.go_to(1).is_some());
        pager.settle().await;
        assert_eq!(store.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_after_shutdown_are_ignored() {
        let backend = Arc::new(
            InMemoryBackend::new((1..=12).map(ticket)).with_latency(Duration::from_millis(50)),
        );
        let (mut pager, store) = paginator(backend.clone(), 5);

        pager.go_to(1);
        pager.shutdown();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(pager.next_outcome().await.is_none());
        assert!(store.is_empty());
        assert_eq!(pager.go_to(2), None);
    }

    #[tokio::test]
    async fn test_apply_after_shutdown_is_noop() {
        let backend = Arc::new(InMemoryBackend::new((1..=12).map(ticket)));
        let (mut pager, store) = paginator(backend.clone(), 5);
        pager.shutdown();

        let late = FetchOutcome {
            key: BatchKey::of(&seqs(1..=5)),
            reason: FetchReason::Navigate,
            seqs: seqs(1..=5),
            result: Ok((1..=5).map(ticket).collect()),
        };
        assert_eq!(pager.apply(late), Applied::default());
        assert!(store.is_empty());
    }
}
