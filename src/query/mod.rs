//! Filter/sort pipeline for the inbox list.
//!
//! The pipeline is a pure function from (records, criteria) to an ordered
//! sequence. Filters are small trait objects combined conjunctively; the
//! sort runs last and is stable, so feeding records in store insertion order
//! makes the output deterministic.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::InboxError;
use crate::types::{Ticket, TicketPriority, TicketStatus};

pub mod sort;

pub use sort::{SortDirection, SortField, SortSpec, compare_by, sort_tickets};

/// Case-insensitive substring match.
///
/// Uses `unicase` folding so that the match agrees with the text sort order.
fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack_folded = unicase::UniCase::new(haystack).to_folded_case();
    let needle_folded = unicase::UniCase::new(needle).to_folded_case();
    haystack_folded.contains(&needle_folded)
}

/// Either everything, or exact equality with one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => write!(f, "all"),
            Choice::Only(value) => write!(f, "{value}"),
        }
    }
}

impl<T: FromStr<Err = InboxError>> FromStr for Choice<T> {
    type Err = InboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Choice::All)
        } else {
            s.parse().map(Choice::Only)
        }
    }
}

/// Trait for ticket filters
pub trait TicketFilter: Send + Sync {
    fn matches(&self, ticket: &Ticket) -> bool;
}

/// Filter tickets by search text against subject or customer name
pub struct SearchFilter {
    needle: String,
}

impl SearchFilter {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_string(),
        }
    }
}

impl TicketFilter for SearchFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        contains_case_insensitive(&ticket.subject, &self.needle)
            || contains_case_insensitive(&ticket.customer, &self.needle)
    }
}

/// Filter tickets by status
pub struct StatusFilter {
    target: Choice<TicketStatus>,
}

impl StatusFilter {
    pub fn new(target: Choice<TicketStatus>) -> Self {
        Self { target }
    }
}

impl TicketFilter for StatusFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        self.target.admits(&ticket.status)
    }
}

/// Filter tickets by priority
pub struct PriorityFilter {
    target: Choice<TicketPriority>,
}

impl PriorityFilter {
    pub fn new(target: Choice<TicketPriority>) -> Self {
        Self { target }
    }
}

impl TicketFilter for PriorityFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        self.target.admits(&ticket.priority)
    }
}

/// Query builder: every filter must match (AND), then one sort is applied.
#[derive(Default)]
pub struct TicketQuery {
    filters: Vec<Box<dyn TicketFilter>>,
    sort: SortSpec,
}

impl TicketQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl TicketFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.filters.iter().all(|f| f.matches(ticket))
    }

    /// Run the query over `tickets`, which should arrive in insertion order.
    pub fn execute(&self, tickets: &[Arc<Ticket>]) -> Vec<Arc<Ticket>> {
        let mut result: Vec<Arc<Ticket>> = tickets
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect();
        sort_tickets(&mut result, self.sort);
        result
    }
}

/// The operator's current list criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewCriteria {
    pub search: String,
    pub status: Choice<TicketStatus>,
    pub priority: Choice<TicketPriority>,
    pub sort: SortSpec,
}

impl ViewCriteria {
    pub fn to_query(&self) -> TicketQuery {
        TicketQuery::new()
            .with_filter(SearchFilter::new(&self.search))
            .with_filter(StatusFilter::new(self.status))
            .with_filter(PriorityFilter::new(self.priority))
            .with_sort(self.sort)
    }
}

/// Derive the visible sequence from `tickets` under `criteria`.
pub fn apply(tickets: &[Arc<Ticket>], criteria: &ViewCriteria) -> Vec<Arc<Ticket>> {
    criteria.to_query().execute(tickets)
}
