// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use shelfgrid_core::{ColumnLayout, MIN_COLUMN_WIDTH, StoreCommand};

use crate::geometry::ColumnGeometry;

/// One column-resize drag.
///
/// The scale is captured at press time: converting screen deltas with the
/// live scale would feed each preview width back into the next conversion.
/// Intermediate widths only reach the screen through the renderer's resize
/// preview; only [`Self::finish`] produces a store command.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    key: String,
    origin_x: f64,
    base_width: u32,
    scale: f64,
    min_width: u32,
    preview: u32,
}

impl ResizeSession {
    pub fn begin(geometry: &ColumnGeometry, key: &str, x: f64, min_width: u32) -> Option<Self> {
        let column = geometry.get(key)?;
        Some(Self {
            key: key.to_owned(),
            origin_x: x,
            base_width: column.base_width,
            scale: geometry.scale(),
            min_width: min_width.max(MIN_COLUMN_WIDTH),
            preview: column.base_width,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Base width for a pointer at `x`.
    pub fn drag(&mut self, x: f64) -> u32 {
        let delta = (x - self.origin_x) / self.scale;
        let width = (f64::from(self.base_width) + delta).round();
        self.preview = if width <= f64::from(self.min_width) {
            self.min_width
        } else if width >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            width as u32
        };
        self.preview
    }

    /// On-screen width of the preview at the captured scale.
    pub fn preview_screen_width(&self) -> f64 {
        f64::from(self.preview) * self.scale
    }

    /// Release; `None` when the width did not change.
    pub fn finish(mut self, x: f64) -> Option<StoreCommand> {
        let width = self.drag(x);
        (width != self.base_width).then_some(StoreCommand::ResizeColumn {
            key: self.key,
            width,
        })
    }
}

/// One column drag-and-drop; dropping splices the column to the target slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderSession {
    from: String,
}

impl ReorderSession {
    pub fn begin(layout: &ColumnLayout, key: &str) -> Option<Self> {
        layout.get(key).map(|_| Self {
            from: key.to_owned(),
        })
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn drop_on(self, target: &str) -> Option<StoreCommand> {
        (target != self.from).then(|| StoreCommand::ReorderColumn {
            from: self.from,
            to: target.to_owned(),
        })
    }
}
