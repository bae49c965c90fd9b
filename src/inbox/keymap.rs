//! Key-to-action mapping for the inbox
//!
//! Converts raw `(KeyCode, KeyModifiers)` pairs into [`InboxAction`] values.
//! Anything not explicitly bound maps to `None` so the caller lets the key
//! through untouched.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::query::SortField;

/// Actions the shortcut layer can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxAction {
    /// Select a sort field (flips direction when already active).
    SortBy(SortField),
    /// Mark every selected ticket as read.
    MarkSelectedRead,
}

/// Read-only snapshot of focus, so [`key_to_action`] stays a pure function.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusSnapshot {
    /// A text input (search box, reply field) currently holds focus.
    pub text_input_focused: bool,
}

/// Ctrl on Linux/Windows, Command (Super) on macOS. Exactly one of them,
/// with nothing else held.
fn is_shortcut_modifier(modifiers: KeyModifiers) -> bool {
    modifiers == KeyModifiers::CONTROL || modifiers == KeyModifiers::SUPER
}

/// Map a raw key to an action.
///
/// Returns `None` while a text input has focus, and for every combination
/// that is not bound.
pub fn key_to_action(
    code: KeyCode,
    modifiers: KeyModifiers,
    focus: FocusSnapshot,
) -> Option<InboxAction> {
    if focus.text_input_focused || !is_shortcut_modifier(modifiers) {
        return None;
    }

    match code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'd' => Some(InboxAction::SortBy(SortField::Date)),
            'p' => Some(InboxAction::SortBy(SortField::Priority)),
            'r' => Some(InboxAction::MarkSelectedRead),
            _ => None,
        },
        _ => None,
    }
}

/// Map a full key event. Only presses are considered; repeats and releases
/// never trigger actions.
pub fn event_to_action(event: &KeyEvent, focus: FocusSnapshot) -> Option<InboxAction> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    key_to_action(event.code, event.modifiers, focus)
}
