use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;

use crate::types::{Seq, Ticket, TicketId};

pub mod queries;

/// Capacity of the change broadcast. Lagging subscribers only miss
/// notifications, never data, since they re-read the store on wake-up.
const EVENT_CAPACITY: usize = 256;

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The id was not resident and has been inserted.
    Inserted,
    /// The id was resident and at least one field changed.
    Updated,
    /// The incoming record matched the resident one exactly.
    Unchanged,
}

impl UpsertOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

/// Notification sent to subscribers after every effective store change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A record was inserted or replaced.
    Upserted {
        id: TicketId,
        outcome: UpsertOutcome,
    },
    /// Local-only flags (unread) changed on these ids.
    LocalFlagsChanged { ids: Vec<TicketId> },
}

#[derive(Debug, Clone)]
struct StoredTicket {
    /// Insertion order, used as the stable tie-break when sorting.
    order: u64,
    ticket: Arc<Ticket>,
}

/// Normalized in-memory store of ticket records keyed by id.
///
/// Records live in a `DashMap`, so fetch completions and push deliveries can
/// write concurrently. The only mutation paths are whole-record [`upsert`]
/// and the local unread flag; nothing is ever partially patched.
///
/// [`upsert`]: TicketStore::upsert
pub struct TicketStore {
    tickets: DashMap<TicketId, StoredTicket>,
    by_seq: DashMap<Seq, TicketId>,
    next_order: AtomicU64,
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl TicketStore {
    /// Create an empty store.
    pub fn empty() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        TicketStore {
            tickets: DashMap::new(),
            by_seq: DashMap::new(),
            next_order: AtomicU64::new(0),
            sender,
        }
    }

    /// Create a store pre-populated with `tickets`, in order.
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let store = Self::empty();
        for ticket in tickets {
            store.upsert(ticket);
        }
        store
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Insert or replace a ticket by id.
    ///
    /// Server-origin fields are always taken from `incoming`. The unread flag
    /// is taken from `incoming` only when it carries one; otherwise the
    /// resident value survives. Applying the same record twice is a no-op the
    /// second time.
    pub fn upsert(&self, mut incoming: Ticket) -> UpsertOutcome {
        let id = incoming.id.clone();

        let outcome = match self.tickets.entry(id.clone()) {
            Entry::Vacant(slot) => {
                incoming.is_unread = Some(incoming.is_unread());
                if let Some(seq) = incoming.seq {
                    self.by_seq.insert(seq, id.clone());
                }
                let order = self.next_order.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredTicket {
                    order,
                    ticket: Arc::new(incoming),
                });
                UpsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                let current = Arc::clone(&slot.get().ticket);
                if incoming.is_unread.is_none() {
                    incoming.is_unread = current.is_unread;
                }

                if *current == incoming {
                    UpsertOutcome::Unchanged
                } else {
                    if current.seq != incoming.seq {
                        if let Some(old) = current.seq {
                            self.by_seq.remove_if(&old, |_, owner| *owner == id);
                        }
                        if let Some(new) = incoming.seq {
                            self.by_seq.insert(new, id.clone());
                        }
                    }
                    slot.get_mut().ticket = Arc::new(incoming);
                    UpsertOutcome::Updated
                }
            }
        };

        if outcome.changed() {
            tracing::debug!(ticket = %id, ?outcome, "ticket upserted");
            // No receivers is fine: nobody is rendering yet.
            let _ = self.sender.send(StoreEvent::Upserted { id, outcome });
        }
        outcome
    }

    /// Upsert a batch of records, returning how many changed the store.
    pub fn upsert_all(&self, tickets: impl IntoIterator<Item = Ticket>) -> usize {
        tickets
            .into_iter()
            .map(|t| self.upsert(t))
            .filter(UpsertOutcome::changed)
            .count()
    }

    /// Set the local unread flag on every resident id in `ids`.
    ///
    /// Unknown ids are skipped. Returns the ids whose flag actually changed.
    pub fn set_unread(&self, ids: &[TicketId], unread: bool) -> Vec<TicketId> {
        let mut changed = Vec::new();
        for id in ids {
            if let Some(mut entry) = self.tickets.get_mut(id)
                && entry.ticket.is_unread() != unread
            {
                Arc::make_mut(&mut entry.ticket).is_unread = Some(unread);
                changed.push(id.clone());
            }
        }

        if !changed.is_empty() {
            let _ = self.sender.send(StoreEvent::LocalFlagsChanged {
                ids: changed.clone(),
            });
        }
        changed
    }
}
