// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! `render(view) -> visible cell descriptors`.
//!
//! The renderer reads the store and returns plain data; hosts draw it.
//! Only page rows inside the viewport window are formatted.

use std::collections::BTreeSet;

use shelfgrid_core::{HeaderCheck, RowId, RowStore, SortDirection, StatusTag, StoreEvent};
use tracing::debug;

use crate::cells::{CellContent, CellContext, format_cell};
use crate::geometry::ColumnGeometry;
use crate::highlight::HighlightCache;
use crate::images::ImageLoader;
use crate::viewport::{Viewport, VisibleWindow};

/// Container measurements and scroll offsets for one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub container_width: u32,
    pub container_height: u32,
    pub scroll_top: u64,
    pub scroll_left: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub x: f64,
    pub width: f64,
    pub frozen: bool,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
    /// Tri-state page checkbox, only on the select column.
    pub check: Option<HeaderCheck>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    pub key: String,
    pub x: f64,
    pub width: f64,
    pub frozen: bool,
    pub content: CellContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub id: RowId,
    /// Position within the current page.
    pub index: usize,
    pub selected: bool,
    pub status: StatusTag,
    pub cells: Vec<RenderedCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedGrid {
    pub header: Vec<HeaderCell>,
    pub rows: Vec<RenderedRow>,
    pub window: VisibleWindow,
    pub page_rows: usize,
    pub sorting: bool,
}

impl RenderedGrid {
    pub fn is_empty(&self) -> bool {
        self.page_rows == 0
    }
}

#[derive(Debug, Default)]
pub struct GridRenderer {
    viewport: Viewport,
    highlight: HighlightCache,
    images: ImageLoader,
    /// Column under an active resize drag and its on-screen width.
    resize_preview: Option<(String, f64)>,
}

impl GridRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            highlight: HighlightCache::default(),
            images: ImageLoader::default(),
            resize_preview: None,
        }
    }

    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn images(&self) -> &ImageLoader {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageLoader {
        &mut self.images
    }

    /// Drops per-dataset caches when the store replaces its rows.
    pub fn observe(&mut self, events: &[StoreEvent]) {
        for event in events {
            if let StoreEvent::DataReplaced { rows } = event {
                debug!(rows, "renderer caches reset for new dataset");
                self.images.clear();
            }
        }
    }

    /// Shows `key` at `width` until cleared; the store keeps its stored width.
    pub fn set_resize_preview(&mut self, preview: Option<(String, f64)>) {
        self.resize_preview = preview;
    }

    pub fn geometry(&self, store: &RowStore, frame: GridFrame) -> ColumnGeometry {
        let geometry = ColumnGeometry::compute(store.columns(), frame.container_width);
        match &self.resize_preview {
            Some((key, width)) => geometry.with_screen_width(key, *width),
            None => geometry,
        }
    }

    pub fn render(&mut self, store: &RowStore, frame: GridFrame) -> RenderedGrid {
        self.highlight.set_term(&store.filter_params().search);

        let geometry = self.geometry(store, frame);
        let container_width = f64::from(frame.container_width);
        let projected = geometry.project(frame.scroll_left, container_width);
        let sort = store.sort_state();
        let header_check = store.header_check();

        let header = projected
            .iter()
            .filter_map(|placed| {
                let column = geometry.columns().get(placed.index)?;
                Some(HeaderCell {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    x: placed.x,
                    width: placed.width,
                    frozen: column.is_frozen(),
                    sortable: column.sortable,
                    sort: (sort.key.as_deref() == Some(column.key.as_str()))
                        .then_some(sort.direction),
                    check: (column.kind == shelfgrid_core::ColumnKind::Select)
                        .then_some(header_check),
                })
            })
            .collect();

        let page = store.page_ids();
        let window = self
            .viewport
            .window(page.len(), frame.scroll_top, frame.container_height);
        let mut context = CellContext {
            selection: store.selection(),
            highlight: &mut self.highlight,
            images: &mut self.images,
        };

        let mut rows = Vec::with_capacity(window.len());
        for index in window.range.clone() {
            let Some(row) = page.get(index).and_then(|id| store.row(*id)) else {
                continue;
            };
            let cells = projected
                .iter()
                .filter_map(|placed| {
                    let column = geometry.columns().get(placed.index)?;
                    Some(RenderedCell {
                        key: column.key.clone(),
                        x: placed.x,
                        width: placed.width,
                        frozen: column.is_frozen(),
                        content: format_cell(row, &column.key, column.kind, &mut context),
                    })
                })
                .collect();
            rows.push(RenderedRow {
                id: row.id(),
                index,
                selected: store.selection().contains(row.id()),
                status: row.status(),
                cells,
            });
        }

        let visible: BTreeSet<RowId> = rows.iter().map(|row| row.id).collect();
        self.images.retain_visible(&visible);

        RenderedGrid {
            header,
            rows,
            window,
            page_rows: page.len(),
            sorting: store.is_sorting(),
        }
    }
}
