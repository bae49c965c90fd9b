//! Virtualized list windowing
//!
//! Only rows that intersect the viewport (plus an overscan buffer on each
//! side) are materialized. Every computation here is direct arithmetic on
//! the scroll offset and the fixed row height, so a scroll or resize costs
//! O(1) regardless of list length.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::string_enum;
use crate::error::InboxError;

/// Closed set of list presentations. Each variant fixes the estimated row height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Subject, customer, excerpt and tags on separate lines.
    #[default]
    Comfortable,
    /// Single-line rows.
    Compact,
}

string_enum!(
    ViewMode,
    InboxError::InvalidViewMode,
    {
        Comfortable => "comfortable",
        Compact => "compact",
    }
);

impl ViewMode {
    /// Estimated row height in pixels.
    pub fn row_height(self) -> u32 {
        match self {
            ViewMode::Comfortable => 120,
            ViewMode::Compact => 48,
        }
    }
}

/// A materialized row: its index in the derived sequence and absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub offset: u64,
}

/// Viewport geometry and scroll position over a list of fixed-height rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    item_height: u32,
    viewport_height: u32,
    overscan: usize,
    scroll_offset: u64,
}

impl Viewport {
    pub fn new(item_height: u32, viewport_height: u32, overscan: usize) -> Self {
        Viewport {
            item_height,
            viewport_height,
            overscan,
            scroll_offset: 0,
        }
    }

    pub fn for_mode(mode: ViewMode, viewport_height: u32, overscan: usize) -> Self {
        Self::new(mode.row_height(), viewport_height, overscan)
    }

    pub fn item_height(&self) -> u32 {
        self.item_height
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    /// Total scrollable extent for `len` rows.
    pub fn total_extent(&self, len: usize) -> u64 {
        len as u64 * u64::from(self.item_height)
    }

    /// Largest valid scroll offset for `len` rows.
    pub fn max_scroll(&self, len: usize) -> u64 {
        self.total_extent(len)
            .saturating_sub(u64::from(self.viewport_height))
    }

    /// Scroll to `offset`, clamped to the scrollable range.
    pub fn scroll_to(&mut self, offset: u64, len: usize) {
        self.scroll_offset = offset.min(self.max_scroll(len));
    }

    pub fn scroll_by(&mut self, delta: i64, len: usize) {
        let target = self.scroll_offset.saturating_add_signed(delta);
        self.scroll_to(target, len);
    }

    /// Change the viewport height, re-clamping the scroll position.
    pub fn resize(&mut self, viewport_height: u32, len: usize) {
        self.viewport_height = viewport_height;
        self.scroll_to(self.scroll_offset, len);
    }

    /// Switch row height, keeping the first visible row in place.
    pub fn set_item_height(&mut self, item_height: u32, len: usize) {
        let first = self.first_visible();
        self.item_height = item_height;
        self.scroll_to(first as u64 * u64::from(item_height), len);
    }

    fn first_visible(&self) -> usize {
        if self.item_height == 0 {
            return 0;
        }
        (self.scroll_offset / u64::from(self.item_height)) as usize
    }

    /// Indices to materialize for `len` rows at the current scroll offset:
    /// `[floor(s/H) - k, ceil((s+V)/H) + k)` clamped to `[0, len)`.
    pub fn render_range(&self, len: usize) -> Range<usize> {
        if len == 0 || self.item_height == 0 {
            return 0..0;
        }
        let height = u64::from(self.item_height);
        let bottom = self.scroll_offset + u64::from(self.viewport_height);

        let first = (self.scroll_offset / height) as usize;
        let last = bottom.div_ceil(height) as usize;

        let start = first.saturating_sub(self.overscan).min(len);
        let end = last.saturating_add(self.overscan).min(len);
        start..end
    }

    /// Absolute vertical offset of row `index`.
    pub fn offset_of(&self, index: usize) -> u64 {
        index as u64 * u64::from(self.item_height)
    }

    /// Placements for every materialized row.
    pub fn placements(&self, len: usize) -> impl Iterator<Item = Placement> + '_ {
        self.render_range(len).map(|index| Placement {
            index,
            offset: self.offset_of(index),
        })
    }

    /// Materialize the visible slice of `items`, paired with offsets.
    pub fn materialize<'a, T>(&self, items: &'a [T]) -> Vec<(Placement, &'a T)> {
        let range = self.render_range(items.len());
        let start = range.start;
        items[range]
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let index = start + i;
                (
                    Placement {
                        index,
                        offset: self.offset_of(index),
                    },
                    item,
                )
            })
            .collect()
    }

    /// Scroll the minimum distance needed to bring row `index` fully into view.
    pub fn ensure_visible(&mut self, index: usize, len: usize) {
        let top = self.offset_of(index);
        let bottom = top + u64::from(self.item_height);
        let view_bottom = self.scroll_offset + u64::from(self.viewport_height);
        if top < self.scroll_offset {
            self.scroll_to(top, len);
        } else if bottom > view_bottom {
            self.scroll_to(bottom.saturating_sub(u64::from(self.viewport_height)), len);
        }
    }
}
