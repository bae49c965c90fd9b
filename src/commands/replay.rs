use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{load_tickets, print_toasts, render_table};
use crate::config::InboxConfig;
use crate::error::Result;
use crate::inbox::toast::Notifier;
use crate::query::{self, ViewCriteria};
use crate::remote::{LocalPushChannel, PushMessage};
use crate::store::TicketStore;
use crate::sync::RealtimeMerge;

pub struct ReplayOptions {
    /// NDJSON file, one push message per line
    pub log: PathBuf,
    /// Tickets resident before the replay starts
    pub fixture: Option<PathBuf>,
    pub output_json: bool,
}

/// Replay a push-event log through the realtime merge layer and print the
/// store it converges to.
pub async fn cmd_replay(options: ReplayOptions, config: &InboxConfig) -> Result<()> {
    let store = Arc::new(match &options.fixture {
        Some(path) => TicketStore::with_tickets(load_tickets(path)?),
        None => TicketStore::empty(),
    });
    let notifier = Notifier::new();
    let hub = LocalPushChannel::new();
    let mut realtime = RealtimeMerge::new(Arc::new(hub.clone()), Arc::clone(&store), notifier.clone());
    realtime.attach(&config.push_channel)?;

    let content = fs::read_to_string(&options.log)?;
    let mut delivered = 0usize;
    let mut skipped = 0usize;
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<PushMessage>(line) {
            Ok(message) => {
                hub.publish(&config.push_channel, message.kind, message.payload);
                delivered += 1;
            }
            Err(e) => {
                tracing::warn!(line = lineno + 1, error = %e, "skipping unreadable log line");
                skipped += 1;
            }
        }
    }
    realtime.finish(&config.push_channel).await;

    let tickets = query::apply(&store.snapshot(), &ViewCriteria::default());
    if options.output_json {
        let output = json!({
            "delivered": delivered,
            "skipped": skipped,
            "tickets": tickets.iter().map(|t| t.as_ref()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_toasts(&notifier.drain());
    println!(
        "{} {} events, {} skipped, {} tickets",
        "Replayed".green().bold(),
        delivered,
        skipped,
        tickets.len()
    );
    if !tickets.is_empty() {
        println!("{}", render_table(&tickets));
    }
    Ok(())
}
