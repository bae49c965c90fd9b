//! Ticket builders shared by the integration tests.

use serde_json::{Value, json};
use ticketdesk::{Seq, Ticket, TicketId, TicketPriority, TicketStatus};

/// A ticket with a backend sequence id, created `seq` minutes after a fixed epoch.
pub fn ticket(
    seq: u64,
    subject: &str,
    customer: &str,
    status: TicketStatus,
    priority: TicketPriority,
) -> Ticket {
    Ticket {
        id: TicketId::new_unchecked(format!("t-{seq}")),
        seq: Some(Seq(seq)),
        subject: subject.to_string(),
        customer: customer.to_string(),
        company: "Acme".to_string(),
        assignee: None,
        tags: vec!["support".to_string()],
        status,
        priority,
        created_at: jiff::Timestamp::from_second(1_700_000_000 + 60 * seq as i64)
            .expect("valid timestamp"),
        last_message: format!("Message for {subject}"),
        is_unread: Some(true),
    }
}

/// Twelve tickets, seqs 1..=12, with rotating status and priority.
/// Tickets 3 and 9 belong to Alice; open tickets are 3, 6, 9 and 12,
/// of which only 9 is low priority.
pub fn twelve_tickets() -> Vec<Ticket> {
    let statuses = [TicketStatus::Open, TicketStatus::Pending, TicketStatus::Closed];
    let priorities = [TicketPriority::Low, TicketPriority::Medium, TicketPriority::High];
    (1..=12u64)
        .map(|seq| {
            let customer = if seq % 6 == 3 { "Alice Smith" } else { "Bob Jones" };
            ticket(
                seq,
                &format!("Issue number {seq}"),
                customer,
                statuses[(seq as usize) % 3],
                priorities[(seq as usize / 3) % 3],
            )
        })
        .collect()
}

/// Wire form of a ticket, as the backend or push channel sends it.
pub fn wire(ticket: &Ticket) -> Value {
    serde_json::to_value(ticket).expect("ticket serializes")
}

pub fn fixture_json(tickets: &[Ticket]) -> String {
    serde_json::to_string(tickets).expect("tickets serialize")
}

/// One NDJSON push-log line.
pub fn push_line(event: &str, payload: &Value) -> String {
    json!({ "event": event, "payload": payload }).to_string()
}
