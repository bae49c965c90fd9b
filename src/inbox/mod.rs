//! The inbox controller.
//!
//! [`Inbox`] composes the store, the filter/sort pipeline, pagination,
//! realtime merging, windowing, selection and the shortcut layer behind one
//! owner. All state changes happen on the caller's task: spawned fetches and
//! realtime merges only report back, and [`Inbox::next_update`] applies the
//! results one at a time.

pub mod clipboard;
pub mod debounce;
pub mod keymap;
pub mod selection;
pub mod toast;
pub mod window;

use std::sync::Arc;

use crossterm::event::KeyEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use crate::config::InboxConfig;
use crate::error::Result;
use crate::query::{self, Choice, SortField, SortSpec, ViewCriteria};
use crate::remote::{PushChannel, TicketBackend};
use crate::store::{StoreEvent, TicketStore};
use crate::sync::{Applied, Paginator, RealtimeMerge, RowState};
use crate::types::{Seq, Ticket, TicketId, TicketPriority, TicketStatus};

use self::clipboard::Clipboard;
use self::debounce::Debounce;
use self::keymap::{FocusSnapshot, InboxAction, event_to_action};
use self::selection::{SelectAllState, Selection};
use self::toast::{Notifier, Toast};
use self::window::{Placement, ViewMode, Viewport};

/// Local bulk mutations over the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    MarkRead,
    MarkUnread,
}

/// What a turn of the event loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxUpdate {
    /// A page fetch completed and was applied.
    Fetched(Applied),
    /// The store changed (realtime merge, bulk action or fetch).
    StoreChanged,
    /// The debounced search text was applied.
    SearchApplied,
}

pub struct Inbox {
    config: InboxConfig,
    store: Arc<TicketStore>,
    store_events: broadcast::Receiver<StoreEvent>,
    notifier: Notifier,
    pager: Paginator,
    realtime: Option<RealtimeMerge>,
    criteria: ViewCriteria,
    search_input: String,
    search: Debounce<String>,
    selection: Selection,
    viewport: Viewport,
    view_mode: ViewMode,
    focus: FocusSnapshot,
    view: Vec<Arc<Ticket>>,
    active: bool,
}

impl Inbox {
    pub fn new(config: InboxConfig, backend: Arc<dyn TicketBackend>, store: Arc<TicketStore>) -> Self {
        let notifier = Notifier::new();
        let pager = Paginator::new(backend, Arc::clone(&store), notifier.clone(), config.page_size);
        let store_events = store.subscribe();
        let viewport = Viewport::for_mode(config.view_mode, config.viewport_height, config.overscan);

        let mut inbox = Inbox {
            search: Debounce::new(config.debounce()),
            view_mode: config.view_mode,
            config,
            store,
            store_events,
            notifier,
            pager,
            realtime: None,
            criteria: ViewCriteria::default(),
            search_input: String::new(),
            selection: Selection::new(),
            viewport,
            focus: FocusSnapshot::default(),
            view: Vec::new(),
            active: false,
        };
        inbox.refresh_view();
        inbox
    }

    /// Enable realtime updates from `push` once activated.
    pub fn with_push(mut self, push: Arc<dyn PushChannel>) -> Self {
        self.realtime = Some(RealtimeMerge::new(
            push,
            Arc::clone(&self.store),
            self.notifier.clone(),
        ));
        self
    }

    pub fn config(&self) -> &InboxConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Toasts that have not yet expired.
    pub fn toasts(&self) -> Vec<Toast> {
        self.notifier.active(self.config.toast_ttl())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start the inbox over the backend `listing`: load the first page and
    /// attach realtime updates. A failed attachment is reported as a toast
    /// and the inbox continues on fetches alone. An inbox can be activated
    /// again after [`deactivate`](Self::deactivate).
    ///
    /// Must be called inside a tokio runtime.
    pub fn activate(&mut self, listing: Vec<Seq>) {
        self.active = true;
        self.pager.reopen();
        self.pager.set_listing(listing);
        self.pager.go_to(1);

        if let Some(realtime) = self.realtime.as_mut()
            && realtime.attach(&self.config.push_channel).is_err()
        {
            tracing::warn!(channel = %self.config.push_channel, "continuing without live updates");
        }
    }

    /// Stop all background work. Outstanding fetches are aborted and their
    /// results ignored; the realtime subscription is released.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.pager.shutdown();
        if let Some(realtime) = self.realtime.as_mut() {
            realtime.detach_all();
        }
        self.search.cancel();
    }

    // Derived view

    /// The filtered, sorted sequence every other layer works on.
    pub fn view(&self) -> &[Arc<Ticket>] {
        &self.view
    }

    pub fn criteria(&self) -> &ViewCriteria {
        &self.criteria
    }

    /// Re-run the pipeline over the store and prune the selection to the
    /// new universe.
    pub fn refresh_view(&mut self) {
        self.view = query::apply(&self.store.snapshot(), &self.criteria);

        let dropped = self.selection.retain_universe(self.view.iter().map(|t| &t.id));
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "pruned selection");
        }

        let offset = self.viewport.scroll_offset();
        self.viewport.scroll_to(offset, self.view.len());
    }

    // Criteria

    /// Record a search keystroke. The pipeline re-runs once input has been
    /// quiet for the debounce delay.
    pub fn input_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.search_input = text.clone();
        self.search.input(text, Instant::now());
    }

    /// The search box contents, which may be ahead of the applied criteria.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Apply pending search input without waiting. Returns whether there was any.
    pub fn flush_search(&mut self) -> bool {
        match self.search.flush() {
            Some(text) => {
                self.apply_search(text);
                true
            }
            None => false,
        }
    }

    fn apply_search(&mut self, text: String) {
        tracing::debug!(search = %text, "applying search");
        self.criteria.search = text;
        self.refresh_view();
    }

    pub fn set_status_filter(&mut self, status: Choice<TicketStatus>) {
        self.criteria.status = status;
        self.refresh_view();
    }

    pub fn set_priority_filter(&mut self, priority: Choice<TicketPriority>) {
        self.criteria.priority = priority;
        self.refresh_view();
    }

    /// Select a sort field; re-selecting the active field flips direction.
    pub fn select_sort(&mut self, field: SortField) {
        self.criteria.sort.select(field);
        self.refresh_view();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.criteria.sort = sort;
        self.refresh_view();
    }

    // Selection

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggle one row. Ids outside the current view are ignored.
    pub fn toggle_select(&mut self, id: &TicketId) {
        if self.view.iter().any(|t| &t.id == id) {
            self.selection.toggle(id);
        }
    }

    pub fn toggle_select_all(&mut self) {
        let visible: Vec<&TicketId> = self.view.iter().map(|t| &t.id).collect();
        self.selection.toggle_all(visible.iter().copied());
    }

    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.state(self.view.iter().map(|t| &t.id))
    }

    /// Apply `action` to the selected tickets only. Returns how many changed.
    /// An empty selection is a no-op. There is no rollback: the change is local.
    pub fn apply_bulk(&mut self, action: BulkAction) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let ids = self.selection.ids();
        let unread = action == BulkAction::MarkUnread;
        let changed = self.store.set_unread(&ids, unread);
        if !changed.is_empty() {
            let verb = if unread { "unread" } else { "read" };
            self.notifier.push(Toast::success(format!(
                "Marked {} tickets as {verb}",
                changed.len()
            )));
            self.refresh_view();
        }
        changed.len()
    }

    // Keyboard

    pub fn set_focus(&mut self, focus: FocusSnapshot) {
        self.focus = focus;
    }

    /// Dispatch a key event. Returns the action taken, or `None` when the key
    /// is not a shortcut and should be handled elsewhere.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<InboxAction> {
        let action = event_to_action(event, self.focus)?;
        match action {
            InboxAction::SortBy(field) => self.select_sort(field),
            InboxAction::MarkSelectedRead => {
                self.apply_bulk(BulkAction::MarkRead);
            }
        }
        Some(action)
    }

    // Window

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.viewport.set_item_height(mode.row_height(), self.view.len());
    }

    pub fn scroll_to(&mut self, offset: u64) {
        self.viewport.scroll_to(offset, self.view.len());
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.viewport.scroll_by(delta, self.view.len());
    }

    pub fn resize(&mut self, viewport_height: u32) {
        self.viewport.resize(viewport_height, self.view.len());
    }

    /// The rows to materialize right now, with their absolute offsets.
    pub fn visible_rows(&self) -> Vec<(Placement, &Arc<Ticket>)> {
        self.viewport.materialize(&self.view)
    }

    // Pages

    pub fn current_page(&self) -> usize {
        self.pager.current_page()
    }

    pub fn page_count(&self) -> usize {
        self.pager.page_count()
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pager.go_to(page);
    }

    pub fn next_page(&mut self) {
        self.pager.next_page();
    }

    pub fn prev_page(&mut self) {
        self.pager.prev_page();
    }

    /// Load state of every row on the current page.
    pub fn page_rows(&self) -> Vec<(Seq, RowState)> {
        self.pager.rows()
    }

    /// Wait for every outstanding page fetch and apply it.
    pub async fn settle_pages(&mut self) {
        self.pager.settle().await;
        self.refresh_view();
    }

    // Clipboard

    /// Copy a ticket id, confirming with a toast. Failures become an error toast.
    pub fn copy_id(&self, id: &TicketId, clipboard: &mut impl Clipboard) -> Result<()> {
        match clipboard.copy_text(id.as_str()) {
            Ok(()) => {
                self.notifier.push(Toast::success(format!("Copied {id}")));
                Ok(())
            }
            Err(e) => {
                self.notifier.push(Toast::error(format!("Copy failed: {e}")));
                Err(e)
            }
        }
    }

    // Event loop

    /// Wait for and apply the next piece of work: a completed fetch, a store
    /// change, or the search debounce deadline. Returns `None` once the inbox
    /// is inactive.
    pub async fn next_update(&mut self) -> Option<InboxUpdate> {
        if !self.active {
            return None;
        }

        let deadline = self.search.deadline();
        tokio::select! {
            Some(outcome) = self.pager.next_outcome() => {
                let applied = self.pager.apply(outcome);
                self.refresh_view();
                Some(InboxUpdate::Fetched(applied))
            }
            event = self.store_events.recv() => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    self.refresh_view();
                    Some(InboxUpdate::StoreChanged)
                }
                Err(RecvError::Closed) => None,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(text) = self.search.poll(Instant::now()) {
                    self.apply_search(text);
                }
                Some(InboxUpdate::SearchApplied)
            }
        }
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.deactivate();
    }
}
