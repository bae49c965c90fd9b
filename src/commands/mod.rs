mod config;
mod ls;
mod replay;
mod window;

pub use config::cmd_config_show;
pub use ls::{LsOptions, cmd_ls};
pub use replay::{ReplayOptions, cmd_replay};
pub use window::cmd_window;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::Result;
use crate::inbox::toast::Toast;
use crate::types::{Ticket, TicketPriority, TicketStatus};

/// Read a JSON array of tickets.
pub fn load_tickets(path: &Path) -> Result<Vec<Ticket>> {
    let content = fs::read_to_string(path)?;
    let tickets: Vec<Ticket> = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), count = tickets.len(), "loaded fixture");
    Ok(tickets)
}

#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "")]
    unread: &'static str,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        TicketRow {
            id: ticket.id.to_string(),
            unread: if ticket.is_unread() { "●" } else { "" },
            subject: ticket.subject.clone(),
            customer: ticket.customer.clone(),
            status: ticket.status.to_string(),
            priority: ticket.priority.to_string(),
            created: ticket.created_at.strftime("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Render tickets as a table.
pub fn render_table(tickets: &[Arc<Ticket>]) -> String {
    let rows: Vec<TicketRow> = tickets.iter().map(|t| TicketRow::from(t.as_ref())).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn format_status(status: TicketStatus) -> String {
    match status {
        TicketStatus::Open => status.as_str().yellow().to_string(),
        TicketStatus::Pending => status.as_str().cyan().to_string(),
        TicketStatus::Closed => status.as_str().dimmed().to_string(),
    }
}

pub fn format_priority(priority: TicketPriority) -> String {
    match priority {
        TicketPriority::High => priority.as_str().red().bold().to_string(),
        TicketPriority::Medium => priority.to_string(),
        TicketPriority::Low => priority.as_str().dimmed().to_string(),
    }
}

/// Print queued toasts to stderr, oldest first.
pub fn print_toasts(toasts: &[Toast]) {
    for toast in toasts {
        eprintln!("{}", toast.render());
    }
}
