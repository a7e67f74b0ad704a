// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Horizontal layout of the visible columns inside a container.
//!
//! Base widths are scaled up uniformly to fill a wider container and never
//! scaled down. Frozen columns get a sticky offset equal to the scaled width
//! of the frozen columns before them.

use shelfgrid_core::{ColumnKind, ColumnLayout};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedColumn {
    pub key: String,
    pub label: String,
    pub kind: ColumnKind,
    pub sortable: bool,
    pub base_width: u32,
    /// Scaled width in container units.
    pub width: f64,
    /// Scaled offset from the left edge of the scrollable content.
    pub left: f64,
    /// Pinned offset for frozen columns.
    pub sticky_left: Option<f64>,
}

impl PlacedColumn {
    pub fn is_frozen(&self) -> bool {
        self.sticky_left.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnGeometry {
    scale: f64,
    natural_width: u32,
    columns: Vec<PlacedColumn>,
}

/// A column placed on screen after horizontal scrolling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedColumn {
    pub index: usize,
    pub x: f64,
    pub width: f64,
}

pub fn scale_for(natural_width: u32, container_width: u32) -> f64 {
    if natural_width == 0 || container_width <= natural_width {
        return 1.0;
    }
    f64::from(container_width) / f64::from(natural_width)
}

impl ColumnGeometry {
    pub fn compute(layout: &ColumnLayout, container_width: u32) -> Self {
        if container_width == 0 {
            warn!("grid container has no width; using natural column widths");
        }
        let natural_width: u32 = layout.visible().map(|column| column.width).sum();
        let scale = scale_for(natural_width, container_width);

        let mut left = 0.0;
        let mut sticky = 0.0;
        let columns = layout
            .visible()
            .map(|column| {
                let width = f64::from(column.width) * scale;
                let sticky_left = column.frozen.then_some(sticky);
                if column.frozen {
                    sticky += width;
                }
                let placed = PlacedColumn {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    kind: column.kind(),
                    sortable: column.sortable,
                    base_width: column.width,
                    width,
                    left,
                    sticky_left,
                };
                left += width;
                placed
            })
            .collect();

        Self {
            scale,
            natural_width,
            columns,
        }
    }

    /// Lays `key` out at `width` screen units while the scale stays put.
    ///
    /// Later columns and frozen offsets shift to make room. Used for resize
    /// previews, which must not touch the stored layout.
    pub fn with_screen_width(mut self, key: &str, width: f64) -> Self {
        let Some(column) = self.columns.iter_mut().find(|column| column.key == key) else {
            return self;
        };
        column.width = width.max(0.0);

        let mut left = 0.0;
        let mut sticky = 0.0;
        for column in &mut self.columns {
            column.left = left;
            if column.sticky_left.is_some() {
                column.sticky_left = Some(sticky);
                sticky += column.width;
            }
            left += column.width;
        }
        self
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    pub const fn natural_width(&self) -> u32 {
        self.natural_width
    }

    pub fn columns(&self) -> &[PlacedColumn] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&PlacedColumn> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.key == key)
    }

    pub fn total_width(&self) -> f64 {
        self.columns.iter().map(|column| column.width).sum()
    }

    /// Width pinned at the left edge by frozen columns.
    pub fn frozen_width(&self) -> f64 {
        self.columns
            .iter()
            .filter(|column| column.is_frozen())
            .map(|column| column.width)
            .sum()
    }

    pub fn max_scroll_left(&self, container_width: f64) -> f64 {
        (self.total_width() - container_width).max(0.0)
    }

    /// Screen placement for `scroll_left`: frozen columns stay pinned, the
    /// rest shift left and are dropped once fully under the frozen layer or
    /// past the right edge.
    pub fn project(&self, scroll_left: f64, container_width: f64) -> Vec<ProjectedColumn> {
        let pinned = self.frozen_width();
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(index, column)| {
                if let Some(sticky_left) = column.sticky_left {
                    return Some(ProjectedColumn {
                        index,
                        x: sticky_left,
                        width: column.width,
                    });
                }
                let x = column.left - scroll_left;
                let visible_left = x.max(pinned);
                let visible_right = (x + column.width).min(container_width);
                (visible_right > visible_left).then_some(ProjectedColumn {
                    index,
                    x: visible_left,
                    width: visible_right - visible_left,
                })
            })
            .collect()
    }

    /// Column under screen `x` for the given horizontal scroll.
    pub fn column_at(&self, x: f64, scroll_left: f64, container_width: f64) -> Option<&PlacedColumn> {
        self.project(scroll_left, container_width)
            .into_iter()
            .find(|projected| x >= projected.x && x < projected.x + projected.width)
            .and_then(|projected| self.columns.get(projected.index))
    }

    /// Resize handle under `x`: the right edge of a column, within `slop`.
    pub fn resize_handle_at(
        &self,
        x: f64,
        scroll_left: f64,
        container_width: f64,
        slop: f64,
    ) -> Option<&PlacedColumn> {
        self.project(scroll_left, container_width)
            .into_iter()
            .find(|projected| ((projected.x + projected.width) - x).abs() <= slop)
            .and_then(|projected| self.columns.get(projected.index))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnGeometry, scale_for};
    use shelfgrid_core::{ColumnDescriptor, ColumnLayout};

    fn column(key: &str, width: u32, frozen: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            key: key.to_owned(),
            label: key.to_owned(),
            width,
            frozen,
            hidden: false,
            sortable: true,
        }
    }

    fn layout() -> ColumnLayout {
        ColumnLayout::new(vec![
            column("select", 50, true),
            column("title", 150, true),
            column("price", 100, false),
            column("rating", 100, false),
        ])
    }

    #[test]
    fn never_scales_below_natural_width() {
        assert_eq!(scale_for(400, 300), 1.0);
        assert_eq!(scale_for(400, 800), 2.0);
        assert_eq!(scale_for(0, 800), 1.0);
    }

    #[test]
    fn sticky_offsets_use_scaled_widths() {
        let geometry = ColumnGeometry::compute(&layout(), 800);
        assert_eq!(geometry.scale(), 2.0);
        let sticky: Vec<Option<f64>> = geometry
            .columns()
            .iter()
            .map(|column| column.sticky_left)
            .collect();
        assert_eq!(sticky, vec![Some(0.0), Some(100.0), None, None]);
        assert_eq!(geometry.frozen_width(), 400.0);
        assert_eq!(geometry.total_width(), 800.0);
    }

    #[test]
    fn preview_width_shifts_later_columns_only() {
        let geometry = ColumnGeometry::compute(&layout(), 800).with_screen_width("title", 400.0);
        assert_eq!(geometry.scale(), 2.0);
        assert_eq!(geometry.get("title").map(|column| column.width), Some(400.0));
        assert_eq!(geometry.get("title").map(|column| column.base_width), Some(150));
        assert_eq!(geometry.get("price").map(|column| column.left), Some(500.0));
        assert_eq!(geometry.get("price").map(|column| column.sticky_left), Some(None));
        assert_eq!(geometry.frozen_width(), 500.0);
        assert_eq!(geometry.total_width(), 900.0);

        let untouched = ColumnGeometry::compute(&layout(), 800);
        assert_eq!(untouched.clone().with_screen_width("missing", 10.0), untouched);
    }

    #[test]
    fn hidden_columns_take_no_space() {
        let mut layout = layout();
        layout.toggle_hidden("price");
        let geometry = ColumnGeometry::compute(&layout, 300);
        assert_eq!(geometry.natural_width(), 300);
        assert_eq!(geometry.get("rating").map(|column| column.left), Some(200.0));
        assert!(geometry.get("price").is_none());
    }

    #[test]
    fn scrolled_columns_slide_under_frozen_layer() {
        let geometry = ColumnGeometry::compute(&layout(), 300);
        let projected = geometry.project(150.0, 300.0);
        let keys: Vec<&str> = projected
            .iter()
            .map(|placed| geometry.columns()[placed.index].key.as_str())
            .collect();
        assert_eq!(keys, vec!["select", "title", "rating"]);
        assert_eq!(projected[2].x, 200.0);
        assert_eq!(projected[2].width, 50.0);

        let hit = geometry.column_at(210.0, 150.0, 300.0);
        assert_eq!(hit.map(|column| column.key.as_str()), Some("rating"));
        let edge = geometry.resize_handle_at(199.0, 0.0, 300.0, 2.0);
        assert_eq!(edge.map(|column| column.key.as_str()), Some("title"));
    }
}
