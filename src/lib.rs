pub mod macros;

pub mod commands;
pub mod config;
pub mod error;
pub mod inbox;
pub mod query;
pub mod remote;
pub mod store;
pub mod sync;
pub mod types;

pub use config::InboxConfig;
pub use error::{InboxError, Result};
pub use inbox::{BulkAction, Inbox, InboxUpdate};
pub use query::{Choice, SortDirection, SortField, SortSpec, ViewCriteria};
pub use remote::{InMemoryBackend, LocalPushChannel, PushChannel, PushEventKind, TicketBackend};
pub use store::{StoreEvent, TicketStore, UpsertOutcome};
pub use sync::{Paginator, RealtimeMerge, RowState};
pub use types::{Seq, Ticket, TicketId, TicketPriority, TicketStatus};
