use std::collections::HashSet;
use std::sync::Arc;

use super::TicketStore;
use crate::types::{Seq, Ticket, TicketId};

impl TicketStore {
    /// Look up a ticket by id. Absent ids simply yield `None`.
    pub fn get(&self, id: &TicketId) -> Option<Arc<Ticket>> {
        self.tickets.get(id).map(|entry| Arc::clone(&entry.ticket))
    }

    pub fn contains(&self, id: &TicketId) -> bool {
        self.tickets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// All resident records, in no particular order.
    pub fn get_all(&self) -> Vec<Arc<Ticket>> {
        self.tickets
            .iter()
            .map(|entry| Arc::clone(&entry.value().ticket))
            .collect()
    }

    /// All resident records in insertion order.
    ///
    /// This is the input the filter/sort pipeline consumes, so that ties in
    /// the active sort key fall back to the order records first arrived.
    pub fn snapshot(&self) -> Vec<Arc<Ticket>> {
        let mut entries: Vec<(u64, Arc<Ticket>)> = self
            .tickets
            .iter()
            .map(|entry| (entry.value().order, Arc::clone(&entry.value().ticket)))
            .collect();
        entries.sort_unstable_by_key(|(order, _)| *order);
        entries.into_iter().map(|(_, ticket)| ticket).collect()
    }

    /// The set of resident ticket ids.
    pub fn ids(&self) -> HashSet<TicketId> {
        self.tickets.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Whether a record for this backend sequence identifier is resident.
    pub fn has_seq(&self, seq: Seq) -> bool {
        self.by_seq.contains_key(&seq)
    }

    /// The record for a backend sequence identifier, if resident.
    pub fn get_by_seq(&self, seq: Seq) -> Option<Arc<Ticket>> {
        let id = self.by_seq.get(&seq).map(|entry| entry.value().clone())?;
        self.get(&id)
    }

    /// The subset of `seqs` with no resident record, preserving input order.
    pub fn missing_seqs(&self, seqs: &[Seq]) -> Vec<Seq> {
        seqs.iter().copied().filter(|s| !self.has_seq(*s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::store::TicketStore;
    use crate::types::{Seq, Ticket, TicketId, TicketPriority, TicketStatus};

    fn seq_ticket(id: &str, seq: u64) -> Ticket {
        Ticket {
            id: TicketId::new_unchecked(id),
            seq: Some(Seq(seq)),
            subject: format!("subject {id}"),
            customer: "Bob".to_string(),
            company: String::new(),
            assignee: None,
            tags: vec![],
            status: TicketStatus::Pending,
            priority: TicketPriority::Low,
            created_at: "2024-05-01T00:00:00Z".parse().unwrap(),
            last_message: String::new(),
            is_unread: None,
        }
    }

    #[test]
    fn test_missing_seqs_preserves_order() {
        let store = TicketStore::with_tickets([seq_ticket("a", 2), seq_ticket("b", 4)]);
        let missing = store.missing_seqs(&[Seq(1), Seq(2), Seq(3), Seq(4), Seq(5)]);
        assert_eq!(missing, vec![Seq(1), Seq(3), Seq(5)]);
    }

    #[test]
    fn test_get_by_seq() {
        let store = TicketStore::with_tickets([seq_ticket("a", 2)]);
        assert_eq!(store.get_by_seq(Seq(2)).unwrap().id.as_str(), "a");
        assert!(store.get_by_seq(Seq(9)).is_none());
    }

    #[test]
    fn test_get_absent_is_none() {
        let store = TicketStore::empty();
        assert!(store.get(&"nope".into()).is_none());
        assert!(store.is_empty());
        assert!(store.get_all().is_empty());
    }
}
