//! Clipboard collaborator

use clipboard_rs::Clipboard as _;

use crate::error::{InboxError, Result};

/// Something that can hold copied text.
pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// The operating system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        clipboard_rs::ClipboardContext::new()
            .and_then(|ctx| ctx.set_text(text.to_string()))
            .map_err(|e| InboxError::Clipboard(e.to_string()))
    }
}

/// In-memory clipboard, for headless runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
