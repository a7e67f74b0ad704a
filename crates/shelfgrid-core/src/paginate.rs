// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

pub const PAGE_SIZES: [usize; 5] = [10, 20, 50, 100, 200];
pub const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_BUTTONS: usize = 5;

/// `page` is 1-based and always within `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    page: usize,
    page_size: usize,
    total: usize,
    total_pages: usize,
}

/// Result of one recompute: the clamped page and its half-open slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub page: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

impl PageSlice {
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Pure page derivation.
pub fn recompute(total: usize, page: usize, page_size: usize) -> PageSlice {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);
    PageSlice {
        page,
        total_pages,
        start,
        end,
    }
}

/// Accepted page size, or the default for anything off the menu.
pub fn normalize_page_size(size: usize) -> usize {
    if PAGE_SIZES.contains(&size) {
        size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: normalize_page_size(page_size),
            total: 0,
            total_pages: 1,
        }
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Rederives totals for a view of `total` rows, clamping the page down.
    pub fn refresh(&mut self, total: usize) -> PageSlice {
        let slice = recompute(total, self.page, self.page_size);
        self.total = total;
        self.page = slice.page;
        self.total_pages = slice.total_pages;
        slice
    }

    pub fn slice(&self) -> PageSlice {
        recompute(self.total, self.page, self.page_size)
    }

    /// Moves to `page` (clamped); returns whether the page changed.
    pub fn set_page(&mut self, page: usize) -> bool {
        let target = page.clamp(1, self.total_pages);
        if target == self.page {
            return false;
        }
        self.page = target;
        true
    }

    pub fn reset_page(&mut self) -> bool {
        self.set_page(1)
    }

    /// Switches page size, keeping the first visible record on screen.
    pub fn set_page_size(&mut self, size: usize) -> bool {
        let target = normalize_page_size(size);
        if target == self.page_size {
            return false;
        }
        let first_offset = (self.page - 1) * self.page_size;
        self.page_size = target;
        self.page = first_offset / target + 1;
        self.refresh(self.total);
        true
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn bar(&self) -> Option<PageBar> {
        PageBar::new(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page { number: usize, active: bool },
    Ellipsis,
}

/// Pagination bar contents; absent for an empty view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBar {
    pub first_record: usize,
    pub last_record: usize,
    pub total: usize,
    pub buttons: Vec<PageButton>,
    pub has_prev: bool,
    pub has_next: bool,
    pub page_size: usize,
}

impl PageBar {
    fn new(state: &PaginationState) -> Option<Self> {
        if state.total == 0 {
            return None;
        }
        let slice = state.slice();
        Some(Self {
            first_record: slice.start + 1,
            last_record: slice.end,
            total: state.total,
            buttons: page_buttons(state.page, state.total_pages),
            has_prev: state.has_prev(),
            has_next: state.has_next(),
            page_size: state.page_size,
        })
    }
}

/// Up to five numbered buttons around `page`, plus first/last with gaps.
pub fn page_buttons(page: usize, total_pages: usize) -> Vec<PageButton> {
    let total_pages = total_pages.max(1);
    let mut start = page.saturating_sub(MAX_PAGE_BUTTONS / 2).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total_pages);
    if end - start < MAX_PAGE_BUTTONS - 1 {
        start = (end + 1).saturating_sub(MAX_PAGE_BUTTONS).max(1);
    }

    let button = |number: usize| PageButton::Page {
        number,
        active: number == page,
    };
    let mut buttons = Vec::new();
    if start > 1 {
        buttons.push(button(1));
        if start > 2 {
            buttons.push(PageButton::Ellipsis);
        }
    }
    buttons.extend((start..=end).map(button));
    if end < total_pages {
        if end + 1 < total_pages {
            buttons.push(PageButton::Ellipsis);
        }
        buttons.push(button(total_pages));
    }
    buttons
}
