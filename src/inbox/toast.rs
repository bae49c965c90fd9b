//! Transient notifications
//!
//! Every error the engine catches at an operation boundary ends up here as a
//! toast rather than propagating into rendering.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Oldest toasts are dropped beyond this many.
const MAX_QUEUED: usize = 32;

/// A toast notification message
#[derive(Debug, Clone)]
pub struct Toast {
    /// The message to display
    pub message: String,
    /// The severity level of the toast
    pub level: ToastLevel,
    /// When the toast was created
    pub timestamp: Instant,
}

/// Severity level for toast notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
    Success,
}

impl Toast {
    pub fn new(message: String, level: ToastLevel) -> Self {
        Self {
            message,
            level,
            timestamp: Instant::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Error)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Success)
    }

    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) >= ttl
    }

    /// Render for a terminal, coloured by level.
    pub fn render(&self) -> String {
        match self.level {
            ToastLevel::Info => self.message.cyan().to_string(),
            ToastLevel::Error => self.message.red().to_string(),
            ToastLevel::Success => self.message.green().to_string(),
        }
    }
}

/// Shared queue of toasts. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<VecDeque<Toast>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => tracing::warn!(message = %toast.message, "error toast"),
            _ => tracing::debug!(message = %toast.message, "toast"),
        }
        let mut queue = self.queue.lock();
        queue.push_back(toast);
        while queue.len() > MAX_QUEUED {
            queue.pop_front();
        }
    }

    /// Toasts still within `ttl`. Expired ones are discarded.
    pub fn active(&self, ttl: Duration) -> Vec<Toast> {
        let now = Instant::now();
        let mut queue = self.queue.lock();
        queue.retain(|t| !t.is_expired(ttl, now));
        queue.iter().cloned().collect()
    }

    /// Take every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
