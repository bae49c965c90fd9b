use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::string_enum;
use crate::error::InboxError;

/// Stable, globally unique ticket identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap a raw id without any format checks. Ids are opaque to this crate.
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        TicketId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        TicketId(s.to_string())
    }
}

/// Backend sequence identifier used for paged lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seq(pub u64);

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Pending,
    Closed,
}

string_enum!(
    TicketStatus,
    InboxError::InvalidStatus,
    {
        Open => "open",
        Pending => "pending",
        Closed => "closed",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    /// Ordinal used for sorting: high=3, medium=2, low=1.
    pub fn rank(&self) -> u8 {
        match self {
            TicketPriority::Low => 1,
            TicketPriority::Medium => 2,
            TicketPriority::High => 3,
        }
    }
}

string_enum!(
    TicketPriority,
    InboxError::InvalidPriority,
    {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

/// A full ticket record as delivered by the backend or the push channel.
///
/// Every field except `is_unread` is server-origin and is replaced wholesale
/// on upsert. `is_unread` is local: `None` means the payload carries no
/// signal and the resident value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<Seq>,
    pub subject: String,
    #[serde(rename = "customerName")]
    pub customer: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: Timestamp,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub is_unread: Option<bool>,
}

impl Ticket {
    /// Unread flag as shown to the operator. Records without a signal read as seen.
    pub fn is_unread(&self) -> bool {
        self.is_unread.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("Pending".parse::<TicketStatus>().unwrap(), TicketStatus::Pending);
        assert_eq!(TicketStatus::Closed.to_string(), "closed");
        assert!("resolved".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_priority_rank() {
        assert!(TicketPriority::High.rank() > TicketPriority::Medium.rank());
        assert!(TicketPriority::Medium.rank() > TicketPriority::Low.rank());
        assert_eq!("HIGH".parse::<TicketPriority>().unwrap(), TicketPriority::High);
    }

    #[test]
    fn test_ticket_deserializes_wire_shape() {
        let json = r#"{
            "id": "t-1",
            "seq": 7,
            "subject": "Refund request",
            "customerName": "Alice Moreau",
            "company": "Acme",
            "assignee": null,
            "tags": ["billing", "vip"],
            "status": "open",
            "priority": "high",
            "createdAt": "2024-03-01T10:00:00Z",
            "lastMessage": "Any update?"
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.id.as_str(), "t-1");
        assert_eq!(ticket.seq, Some(Seq(7)));
        assert_eq!(ticket.customer, "Alice Moreau");
        assert_eq!(ticket.tags, vec!["billing", "vip"]);
        assert_eq!(ticket.is_unread, None);
        assert!(!ticket.is_unread());
    }

    #[test]
    fn test_ticket_rejects_unknown_status() {
        let json = r#"{
            "id": "t-1",
            "subject": "x",
            "customerName": "y",
            "status": "escalated",
            "priority": "low",
            "createdAt": "2024-03-01T10:00:00Z"
        }"#;
        assert!(serde_json::from_str::<Ticket>(json).is_err());
    }
}
