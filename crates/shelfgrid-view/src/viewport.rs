// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Vertical virtualization: which page rows are materialized for a scroll
//! position, and the spacer heights that keep the scroll extent intact.

use std::ops::Range;
use std::time::{Duration, Instant};

use shelfgrid_core::schedule::{Debouncer, FrameCoalescer};
use tracing::warn;

pub const DEFAULT_ROW_HEIGHT: u32 = 60;
pub const DEFAULT_BUFFER_ROWS: usize = 5;
pub const DEFAULT_SCROLL_END: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    row_height: u32,
    buffer_rows: usize,
}

/// Rows `range` are rendered; the spacers stand in for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWindow {
    pub range: Range<usize>,
    pub top_spacer: u64,
    pub bottom_spacer: u64,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_HEIGHT, DEFAULT_BUFFER_ROWS)
    }
}

impl Viewport {
    pub fn new(row_height: u32, buffer_rows: usize) -> Self {
        Self {
            row_height: row_height.max(1),
            buffer_rows,
        }
    }

    pub const fn row_height(&self) -> u32 {
        self.row_height
    }

    pub const fn buffer_rows(&self) -> usize {
        self.buffer_rows
    }

    pub fn content_height(&self, rows: usize) -> u64 {
        rows as u64 * u64::from(self.row_height)
    }

    pub fn max_scroll_top(&self, rows: usize, height: u32) -> u64 {
        self.content_height(rows).saturating_sub(u64::from(height))
    }

    /// Window of `rows` intersecting `[scroll_top, scroll_top + height)`,
    /// widened by the buffer on both sides.
    pub fn window(&self, rows: usize, scroll_top: u64, height: u32) -> VisibleWindow {
        if height == 0 {
            warn!(rows, "viewport has no height; rendering every row");
            return VisibleWindow {
                range: 0..rows,
                top_spacer: 0,
                bottom_spacer: 0,
            };
        }

        let row_height = u64::from(self.row_height);
        let first = usize::try_from(scroll_top / row_height).unwrap_or(usize::MAX);
        let bottom = scroll_top + u64::from(height);
        let last = usize::try_from(bottom.div_ceil(row_height)).unwrap_or(usize::MAX);

        let start = first.saturating_sub(self.buffer_rows).min(rows);
        let end = last.saturating_add(self.buffer_rows).min(rows).max(start);
        VisibleWindow {
            range: start..end,
            top_spacer: self.content_height(start),
            bottom_spacer: self.content_height(rows - end),
        }
    }

    /// Page-relative row under a container-relative `y`.
    pub fn row_at(&self, rows: usize, scroll_top: u64, y: u32) -> Option<usize> {
        let index = (scroll_top + u64::from(y)) / u64::from(self.row_height);
        usize::try_from(index).ok().filter(|index| *index < rows)
    }

    /// Smallest scroll offset that brings `row` fully into view.
    pub fn scroll_into_view(&self, row: usize, scroll_top: u64, height: u32) -> u64 {
        let top = self.content_height(row);
        let bottom = top + u64::from(self.row_height);
        if top < scroll_top {
            top
        } else if bottom > scroll_top + u64::from(height) {
            bottom.saturating_sub(u64::from(height))
        } else {
            scroll_top
        }
    }
}

/// Scroll input coalesced to one offset per frame, plus a scroll-ended signal.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    scroll_top: u64,
    frame: FrameCoalescer<u64>,
    settle: Debouncer<()>,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_END)
    }
}

impl ScrollTracker {
    pub fn new(scroll_end: Duration) -> Self {
        Self {
            scroll_top: 0,
            frame: FrameCoalescer::default(),
            settle: Debouncer::new(scroll_end),
        }
    }

    pub const fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    pub fn scroll_to(&mut self, now: Instant, scroll_top: u64) {
        self.frame.request(scroll_top);
        self.settle.trigger(now, ());
    }

    /// Applies the newest offset requested since the last frame.
    pub fn take_frame(&mut self) -> Option<u64> {
        let scroll_top = self.frame.take_frame()?;
        let changed = scroll_top != self.scroll_top;
        self.scroll_top = scroll_top;
        changed.then_some(scroll_top)
    }

    /// Moves without counting as user scrolling, e.g. after a page change.
    pub fn jump_to(&mut self, scroll_top: u64) {
        self.frame.take_frame();
        self.settle.cancel();
        self.scroll_top = scroll_top;
    }

    pub fn is_scrolling(&self) -> bool {
        self.settle.is_pending()
    }

    /// True once, when motion has stopped for the scroll-end delay.
    pub fn poll_scroll_end(&mut self, now: Instant) -> bool {
        self.settle.poll(now).is_some()
    }
}
