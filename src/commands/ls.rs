use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{format_priority, format_status, load_tickets, print_toasts, render_table};
use crate::config::InboxConfig;
use crate::error::Result;
use crate::inbox::Inbox;
use crate::query::{Choice, SortDirection, SortField, SortSpec};
use crate::remote::InMemoryBackend;
use crate::store::TicketStore;
use crate::sync::RowState;
use crate::types::{Seq, TicketPriority, TicketStatus};

pub struct LsOptions {
    pub search: Option<String>,
    pub status: Choice<TicketStatus>,
    pub priority: Choice<TicketPriority>,
    pub sort: SortField,
    pub descending: bool,
    pub page: usize,
    pub output_json: bool,
}

/// Page through a ticket fixture and print one page under the given criteria.
pub async fn cmd_ls(fixture: &Path, options: LsOptions, config: InboxConfig) -> Result<()> {
    let backend = Arc::new(InMemoryBackend::new(load_tickets(fixture)?));
    let store = Arc::new(TicketStore::empty());
    let mut inbox = Inbox::new(config, backend.clone(), store);

    inbox.activate(backend.listing());
    inbox.go_to_page(options.page);
    inbox.settle_pages().await;

    if let Some(search) = options.search {
        inbox.input_search(search);
        inbox.flush_search();
    }
    inbox.set_status_filter(options.status);
    inbox.set_priority_filter(options.priority);
    let direction = if options.descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    inbox.set_sort(SortSpec::new(options.sort, direction));

    let rows = inbox.page_rows();
    let on_page: HashSet<Seq> = rows.iter().map(|(seq, _)| *seq).collect();
    let tickets: Vec<_> = inbox
        .view()
        .iter()
        .filter(|t| t.seq.is_some_and(|seq| on_page.contains(&seq)))
        .cloned()
        .collect();
    let failed: Vec<Seq> = rows
        .iter()
        .filter(|(_, state)| matches!(state, RowState::Failed(_)))
        .map(|(seq, _)| *seq)
        .collect();

    let page = inbox.current_page();
    let pages = inbox.page_count();
    let toasts = inbox.notifier().drain();
    inbox.deactivate();

    if options.output_json {
        let output = json!({
            "page": page,
            "page_count": pages,
            "tickets": tickets.iter().map(|t| t.as_ref()).collect::<Vec<_>>(),
            "failed": failed.iter().map(|s| s.0).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_toasts(&toasts);
    println!(
        "{} {}/{}  {} of {} rows match",
        "Page".cyan().bold(),
        page,
        pages.max(1),
        tickets.len(),
        rows.len()
    );
    if tickets.is_empty() {
        println!("{}", "No tickets".dimmed());
    } else {
        println!("{}", render_table(&tickets));
    }

    if let Some(top) = tickets.first() {
        println!(
            "Top: {} [{}] [{}]",
            top.subject.bold(),
            format_status(top.status),
            format_priority(top.priority)
        );
    }
    Ok(())
}
