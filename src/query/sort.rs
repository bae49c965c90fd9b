//! Sort keys and comparison for the ticket pipeline.

use std::cmp::Ordering;
use std::sync::Arc;

use unicase::UniCase;

use crate::string_enum;
use crate::error::InboxError;
use crate::types::Ticket;

/// Sort field for the inbox list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    Date,
    Priority,
    Status,
    Subject,
    Customer,
    Company,
}

string_enum!(
    SortField,
    InboxError::InvalidSortField,
    {
        Date => "date",
        Priority => "priority",
        Status => "status",
        Subject => "subject",
        Customer => "customer",
        Company => "company",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The single active (field, direction) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest tickets first.
    fn default() -> Self {
        SortSpec {
            field: SortField::Date,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        SortSpec { field, direction }
    }

    /// Select a sort field the way a column header click does: the active
    /// field flips direction, any other field becomes active ascending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flip();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Ascending comparison of two tickets on a single field.
pub fn compare_by(a: &Ticket, b: &Ticket, field: SortField) -> Ordering {
    match field {
        SortField::Date => a.created_at.cmp(&b.created_at),
        SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortField::Status => compare_text(&a.status.to_string(), &b.status.to_string()),
        SortField::Subject => compare_text(&a.subject, &b.subject),
        SortField::Customer => compare_text(&a.customer, &b.customer),
        SortField::Company => compare_text(&a.company, &b.company),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    UniCase::new(a).cmp(&UniCase::new(b))
}

/// Sort in place. The sort is stable, so equal keys keep their input order
/// in both directions.
pub fn sort_tickets(tickets: &mut [Arc<Ticket>], spec: SortSpec) {
    tickets.sort_by(|a, b| {
        let ord = compare_by(a, b, spec.field);
        match spec.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TicketId, TicketPriority, TicketStatus};

    fn make(id: &str, priority: TicketPriority, created: &str, subject: &str) -> Arc<Ticket> {
        Arc::new(Ticket {
            id: TicketId::new_unchecked(id),
            seq: None,
            subject: subject.to_string(),
            customer: String::new(),
            company: String::new(),
            assignee: None,
            tags: vec![],
            status: TicketStatus::Open,
            priority,
            created_at: created.parse().unwrap(),
            last_message: String::new(),
            is_unread: None,
        })
    }

    fn ids(tickets: &[Arc<Ticket>]) -> Vec<&str> {
        tickets.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_priority_descending_orders_high_medium_low() {
        let t0 = "2024-01-01T00:00:00Z";
        let mut tickets = vec![
            make("l1", TicketPriority::Low, t0, ""),
            make("h1", TicketPriority::High, t0, ""),
            make("m1", TicketPriority::Medium, t0, ""),
            make("h2", TicketPriority::High, t0, ""),
            make("l2", TicketPriority::Low, t0, ""),
        ];
        sort_tickets(
            &mut tickets,
            SortSpec::new(SortField::Priority, SortDirection::Descending),
        );
        assert_eq!(ids(&tickets), vec!["h1", "h2", "m1", "l1", "l2"]);
    }

    #[test]
    fn test_date_sort_is_numeric() {
        let mut tickets = vec![
            make("mid", TicketPriority::Low, "2024-06-01T00:00:00Z", ""),
            make("new", TicketPriority::Low, "2024-12-01T00:00:00Z", ""),
            make("old", TicketPriority::Low, "2023-01-01T00:00:00Z", ""),
        ];
        sort_tickets(&mut tickets, SortSpec::new(SortField::Date, SortDirection::Ascending));
        assert_eq!(ids(&tickets), vec!["old", "mid", "new"]);
    }

    #[test]
    fn test_text_sort_is_case_insensitive() {
        let t0 = "2024-01-01T00:00:00Z";
        let mut tickets = vec![
            make("b", TicketPriority::Low, t0, "beta"),
            make("a", TicketPriority::Low, t0, "Alpha"),
            make("c", TicketPriority::Low, t0, "Charlie"),
        ];
        sort_tickets(
            &mut tickets,
            SortSpec::new(SortField::Subject, SortDirection::Ascending),
        );
        assert_eq!(ids(&tickets), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_select_toggles_active_field() {
        let mut spec = SortSpec::new(SortField::Date, SortDirection::Ascending);
        spec.select(SortField::Date);
        assert_eq!(spec.direction, SortDirection::Descending);
        spec.select(SortField::Date);
        assert_eq!(spec.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_select_new_field_resets_ascending() {
        let mut spec = SortSpec::new(SortField::Date, SortDirection::Descending);
        spec.select(SortField::Priority);
        assert_eq!(
            spec,
            SortSpec::new(SortField::Priority, SortDirection::Ascending)
        );
    }

    #[test]
    fn test_sort_field_from_str() {
        assert_eq!("Priority".parse::<SortField>().unwrap(), SortField::Priority);
        assert_eq!("DATE".parse::<SortField>().unwrap(), SortField::Date);
        assert!("created".parse::<SortField>().is_err());
    }
}
