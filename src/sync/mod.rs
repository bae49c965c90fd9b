//! Keeping the store in step with the backend: paged fetches on demand, and
//! realtime push events merged as they arrive.

pub mod pagination;
pub mod realtime;

pub use pagination::{Applied, BatchKey, FetchOutcome, FetchReason, PageLayout, Paginator, RowState};
pub use realtime::{RealtimeMerge, SubscriptionGuards, merge_message};
