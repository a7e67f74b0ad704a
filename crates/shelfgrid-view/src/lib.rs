// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Grid rendering over a [`shelfgrid_core::RowStore`].
//!
//! The renderer modules produce plain cell descriptors; [`app`] draws them
//! in a terminal and turns keys and pointer gestures into store commands.

pub mod app;
pub mod cells;
pub mod geometry;
pub mod height;
pub mod highlight;
pub mod images;
pub mod render;
pub mod resize;
pub mod viewport;

pub use app::{GridApp, GridOptions, GridRuntime, run_app};
pub use cells::{BadgeTone, CellContent, StarRating, format_cell};
pub use geometry::{ColumnGeometry, PlacedColumn, ProjectedColumn};
pub use highlight::{HighlightCache, Segment, highlight};
pub use images::{ImageLoader, ImageRequest, ImageState};
pub use render::{GridFrame, GridRenderer, HeaderCell, RenderedCell, RenderedGrid, RenderedRow};
pub use resize::{ReorderSession, ResizeSession};
pub use viewport::{ScrollTracker, Viewport, VisibleWindow};
