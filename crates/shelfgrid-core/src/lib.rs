// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod filter;
pub mod ids;
pub mod layout;
pub mod model;
pub mod paginate;
pub mod parse;
pub mod schedule;
pub mod selection;
pub mod sort;
pub mod store;

pub use filter::{FilterOutcome, FilterParams, FilterPatch, RatingBucket, StatusFilter};
pub use ids::*;
pub use layout::{ColumnDescriptor, ColumnLayout, MIN_COLUMN_WIDTH, default_columns};
pub use model::*;
pub use paginate::{PageBar, PageButton, PageSlice, PaginationState};
pub use selection::{DragHit, DragSelect, HeaderCheck, Selection};
pub use store::{RowStore, SelectionBar, StoreCommand, StoreEvent, StoreOptions};
