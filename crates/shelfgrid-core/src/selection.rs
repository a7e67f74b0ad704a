// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Cross-page row selection keyed by [`RowId`].

use std::collections::BTreeSet;

use crate::ids::RowId;

/// Pointer travel (in the renderer's units) before a press becomes a drag.
pub const DRAG_ACTIVATION_DISTANCE: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RowId>,
}

/// Tri-state of the page header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheck {
    Unchecked,
    Indeterminate,
    Checked,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.ids.contains(&id)
    }

    /// Ascending id order, which is dataset order.
    pub fn iter(&self) -> impl Iterator<Item = RowId> + '_ {
        self.ids.iter().copied()
    }

    pub fn toggle(&mut self, id: RowId, included: bool) -> bool {
        if included {
            self.ids.insert(id)
        } else {
            self.ids.remove(&id)
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    /// Adds every id on the current page; other pages are untouched.
    pub fn select_page(&mut self, page: &[RowId]) -> bool {
        let before = self.ids.len();
        self.ids.extend(page.iter().copied());
        self.ids.len() != before
    }

    /// Removes every id on the current page; other pages are untouched.
    pub fn deselect_page(&mut self, page: &[RowId]) -> bool {
        let before = self.ids.len();
        for id in page {
            self.ids.remove(id);
        }
        self.ids.len() != before
    }

    pub fn header_check(&self, page: &[RowId]) -> HeaderCheck {
        let selected = page.iter().filter(|id| self.ids.contains(*id)).count();
        if page.is_empty() || selected == 0 {
            HeaderCheck::Unchecked
        } else if selected == page.len() {
            HeaderCheck::Checked
        } else {
            HeaderCheck::Indeterminate
        }
    }

    fn replace(&mut self, ids: BTreeSet<RowId>) -> bool {
        if self.ids == ids {
            return false;
        }
        self.ids = ids;
        true
    }
}

/// Pointer sample for drag selection, in page-relative row coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragHit {
    pub x: i32,
    pub y: i32,
    /// Row index within the current page under the pointer.
    pub row: Option<usize>,
    pub in_select_column: bool,
}

/// One drag-select gesture, from press to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSelect {
    anchor: usize,
    origin: (i32, i32),
    additive: bool,
    engaged: bool,
    baseline: BTreeSet<RowId>,
}

impl DragSelect {
    /// Starts a gesture; a press outside the select column is no gesture.
    pub fn begin(hit: DragHit, selection: &Selection, additive: bool) -> Option<Self> {
        if !hit.in_select_column {
            return None;
        }
        let anchor = hit.row?;
        Some(Self {
            anchor,
            origin: (hit.x, hit.y),
            additive,
            engaged: false,
            baseline: selection.ids.clone(),
        })
    }

    pub const fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Applies a pointer move; returns whether `selection` changed.
    ///
    /// An overwrite gesture owns the current page: ids on the page outside
    /// the range are deselected, ids on other pages are kept. An additive
    /// gesture only adds the range to what was selected at press time.
    pub fn update(&mut self, hit: DragHit, page: &[RowId], selection: &mut Selection) -> bool {
        if !self.engaged {
            let dx = hit.x.abs_diff(self.origin.0);
            let dy = hit.y.abs_diff(self.origin.1);
            if dx <= DRAG_ACTIVATION_DISTANCE && dy <= DRAG_ACTIVATION_DISTANCE {
                return false;
            }
            self.engaged = true;
        }
        if !hit.in_select_column || page.is_empty() {
            return false;
        }
        let Some(current) = hit.row else {
            return false;
        };

        let last = page.len() - 1;
        let start = self.anchor.min(current).min(last);
        let end = self.anchor.max(current).min(last);
        let range = &page[start..=end];

        let mut working = self.baseline.clone();
        if !self.additive {
            for id in page {
                working.remove(id);
            }
        }
        working.extend(range.iter().copied());
        selection.replace(working)
    }
}
