//! Resettable debounce timer
//!
//! Each new input replaces the pending value and pushes the deadline out by
//! the full delay. The value is released only once the deadline passes with
//! no further input. Time is passed in explicitly, so the owner decides how
//! to wait (the inbox loop sleeps until [`Debounce::deadline`]).

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Debounce {
            delay,
            pending: None,
        }
    }

    /// Record new input at `now`, cancelling any pending value.
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// When the pending value becomes ready, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if *at <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Release the pending value immediately, skipping the quiet period.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop the pending value without releasing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
