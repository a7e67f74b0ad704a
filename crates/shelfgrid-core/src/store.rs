// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The row store: dataset, derived views and the state axes that drive them.
//!
//! Every mutation re-derives the filtered, sorted and paginated views before
//! returning, then reports what changed as a list of [`StoreEvent`]s. Readers
//! never observe a half-updated view.

use tracing::{debug, info, warn};

use crate::filter::{self, FilterOutcome, FilterParams, FilterPatch};
use crate::ids::RowId;
use crate::layout::{ColumnDescriptor, ColumnLayout};
use crate::model::{Record, Row, SortState, StatusTag};
use crate::paginate::{DEFAULT_PAGE_SIZE, PageBar, PageSlice, PaginationState};
use crate::schedule::IdleSlot;
use crate::selection::{DragHit, DragSelect, HeaderCheck, Selection};
use crate::sort::{self, DEFAULT_DEFER_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub page_size: usize,
    /// Filtered views longer than this sort in the idle slot.
    pub defer_threshold: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            defer_threshold: DEFAULT_DEFER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    ReplaceData(Vec<Record>),
    PatchFilter(FilterPatch),
    ResetFilter,
    ClickSort(String),
    SetPage(usize),
    NextPage,
    PrevPage,
    SetPageSize(usize),
    ToggleRow { id: RowId, included: bool },
    ClearSelection,
    SelectPage,
    DeselectPage,
    DragStart { hit: DragHit, additive: bool },
    DragMove(DragHit),
    DragEnd,
    ResizeColumn { key: String, width: u32 },
    ReorderColumn { from: String, to: String },
    ToggleColumnHidden(String),
    ToggleColumnFrozen(String),
    ResetColumnOrder,
    AutoFitColumns,
    RestoreLayout(Vec<ColumnDescriptor>),
    SyncStatus(Vec<RowId>),
    ClearStatus,
    RunIdle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    DataReplaced { rows: usize },
    FilterStateChanged,
    FilteredChanged { count: usize, outcome: FilterOutcome },
    SortChanged(SortState),
    SortDeferred { rows: usize },
    SortCompleted,
    PaginationChanged(PaginationState),
    SelectionChanged { count: usize },
    ColumnsChanged,
    StatusSynced { pushed: usize, deleted: usize },
    StatusCleared,
}

/// Selection bar contents: shown when anything is selected or when forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBar {
    pub count: usize,
    pub visible: bool,
}

#[derive(Debug)]
pub struct RowStore {
    options: StoreOptions,
    rows: Vec<Row>,
    headers: Vec<String>,
    filter: FilterParams,
    sort: SortState,
    filtered: Vec<RowId>,
    pagination: PaginationState,
    selection: Selection,
    columns: ColumnLayout,
    drag: Option<DragSelect>,
    idle_sort: IdleSlot<SortState>,
}

impl Default for RowStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl RowStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            rows: Vec::new(),
            headers: Vec::new(),
            filter: FilterParams::default(),
            sort: SortState::default(),
            filtered: Vec::new(),
            pagination: PaginationState::new(options.page_size),
            selection: Selection::default(),
            columns: ColumnLayout::default(),
            drag: None,
            idle_sort: IdleSlot::default(),
        }
    }

    pub fn dispatch(&mut self, command: StoreCommand) -> Vec<StoreEvent> {
        match command {
            StoreCommand::ReplaceData(records) => self.set_all_data(records),
            StoreCommand::PatchFilter(patch) => self.update_filter_state(&patch),
            StoreCommand::ResetFilter => self.update_filter_state(&FilterPatch::reset()),
            StoreCommand::ClickSort(key) => self.update_sort(&key, true),
            StoreCommand::SetPage(page) => self.set_current_page(page),
            StoreCommand::NextPage => self.set_current_page(self.pagination.page() + 1),
            StoreCommand::PrevPage => {
                self.set_current_page(self.pagination.page().saturating_sub(1))
            }
            StoreCommand::SetPageSize(size) => self.set_page_size(size),
            StoreCommand::ToggleRow { id, included } => self.toggle(id, included),
            StoreCommand::ClearSelection => self.clear_selection(),
            StoreCommand::SelectPage => self.select_all_on_current_page(),
            StoreCommand::DeselectPage => self.deselect_all_on_current_page(),
            StoreCommand::DragStart { hit, additive } => self.drag_start(hit, additive),
            StoreCommand::DragMove(hit) => self.drag_move(hit),
            StoreCommand::DragEnd => self.drag_end(),
            StoreCommand::ResizeColumn { key, width } => self.resize_column(&key, width),
            StoreCommand::ReorderColumn { from, to } => self.reorder_column(&from, &to),
            StoreCommand::ToggleColumnHidden(key) => self.toggle_column_hidden(&key),
            StoreCommand::ToggleColumnFrozen(key) => self.toggle_column_frozen(&key),
            StoreCommand::ResetColumnOrder => self.reset_column_order(),
            StoreCommand::AutoFitColumns => self.auto_fit_columns(),
            StoreCommand::RestoreLayout(stored) => self.restore_layout(stored),
            StoreCommand::SyncStatus(ids) => self.sync_status(ids),
            StoreCommand::ClearStatus => self.clear_status(),
            StoreCommand::RunIdle => self.run_idle(),
        }
    }

    // Dataset ---------------------------------------------------------------

    /// Replaces the dataset, assigning ids in import order.
    ///
    /// Selection, pending drags and deferred sorts are dropped; filter and
    /// sort parameters carry over to the new batch.
    pub fn set_all_data(&mut self, records: Vec<Record>) -> Vec<StoreEvent> {
        self.headers = records
            .first()
            .map(|record| record.keys().cloned().collect())
            .unwrap_or_default();
        self.rows = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Row::new(RowId::new(index), record))
            .collect();
        self.drag = None;
        self.idle_sort.cancel();
        info!(rows = self.rows.len(), columns = self.headers.len(), "dataset replaced");

        let mut events = vec![StoreEvent::DataReplaced {
            rows: self.rows.len(),
        }];
        self.selection.clear();
        events.push(self.selection_event());

        self.columns.auto_detect(&self.headers);
        if !self.rows.is_empty() {
            self.columns.auto_fit(&self.rows);
        }
        events.push(StoreEvent::ColumnsChanged);

        events.extend(self.apply_filters(true));
        events
    }

    /// Installs a derived view and recomputes pagination for it.
    ///
    /// Ids outside the dataset are dropped rather than rejected.
    pub fn set_filtered_data(&mut self, ids: Vec<RowId>) -> Vec<StoreEvent> {
        let len = self.rows.len();
        let before = ids.len();
        self.filtered = ids.into_iter().filter(|id| id.get() < len).collect();
        if self.filtered.len() != before {
            warn!(
                dropped = before - self.filtered.len(),
                "view referenced rows outside the dataset"
            );
        }
        let count = self.filtered.len();
        let outcome = FilterOutcome::classify(count, len);
        vec![
            StoreEvent::FilteredChanged { count, outcome },
            self.refresh_pagination(),
        ]
    }

    fn apply_filters(&mut self, reset_page: bool) -> Vec<StoreEvent> {
        let matched = filter::apply(&self.rows, &self.filter);
        if reset_page {
            self.pagination.reset_page();
        }
        let events = self.set_filtered_data(matched);
        self.resort();
        events
    }

    /// Re-applies the active sort to a new view without announcing a sort change.
    fn resort(&mut self) {
        if self.sort.key.is_none() {
            return;
        }
        let rows = self.filtered.len();
        if sort::should_defer(rows, self.options.defer_threshold) {
            self.idle_sort.schedule(self.sort.clone());
            info!(rows, "re-sort deferred to idle slot");
        } else {
            self.idle_sort.cancel();
            self.sort_now();
        }
    }

    // Filter ----------------------------------------------------------------

    pub fn update_filter_state(&mut self, patch: &FilterPatch) -> Vec<StoreEvent> {
        if !self.filter.apply_patch(patch) {
            return Vec::new();
        }
        debug!(filter = ?self.filter, "filter state changed");
        let mut events = vec![StoreEvent::FilterStateChanged];
        events.extend(self.apply_filters(true));
        events
    }

    // Sort ------------------------------------------------------------------

    /// Sorts the filtered view by `key`; `toggle` applies the header-click rule.
    pub fn update_sort(&mut self, key: &str, toggle: bool) -> Vec<StoreEvent> {
        if key.is_empty() {
            return Vec::new();
        }
        if self.columns.get(key).is_some_and(|column| !column.sortable) {
            debug!(key, "sort on unsortable column ignored");
            return Vec::new();
        }
        if toggle {
            self.sort = self.sort.clicked(key);
        } else if self.sort.key.as_deref() != Some(key) {
            self.sort.key = Some(key.to_owned());
        }

        let mut events = vec![StoreEvent::SortChanged(self.sort.clone())];
        let rows = self.filtered.len();
        if sort::should_defer(rows, self.options.defer_threshold) {
            self.idle_sort.schedule(self.sort.clone());
            info!(rows, key, "sort deferred to idle slot");
            events.push(StoreEvent::SortDeferred { rows });
            return events;
        }
        self.idle_sort.cancel();
        self.sort_now();
        events.push(self.refresh_pagination());
        events
    }

    fn sort_now(&mut self) {
        if let Some(key) = self.sort.key.as_deref() {
            sort::sort(&self.rows, &mut self.filtered, key, self.sort.direction);
        }
    }

    /// Runs the deferred sort, if one is pending.
    pub fn run_idle(&mut self) -> Vec<StoreEvent> {
        let Some((token, sort_state)) = self.idle_sort.take() else {
            return Vec::new();
        };
        if !self.idle_sort.is_current(token) || sort_state != self.sort {
            debug!("stale idle sort dropped");
            return Vec::new();
        }
        self.sort_now();
        vec![StoreEvent::SortCompleted, self.refresh_pagination()]
    }

    pub fn is_sorting(&self) -> bool {
        self.idle_sort.is_pending()
    }

    // Pagination ------------------------------------------------------------

    /// Page contents may have moved; a live drag indexes the old page.
    fn refresh_pagination(&mut self) -> StoreEvent {
        self.drag = None;
        self.pagination.refresh(self.filtered.len());
        StoreEvent::PaginationChanged(self.pagination)
    }

    pub fn set_current_page(&mut self, page: usize) -> Vec<StoreEvent> {
        if !self.pagination.set_page(page) {
            return Vec::new();
        }
        self.drag = None;
        vec![StoreEvent::PaginationChanged(self.pagination)]
    }

    pub fn set_page_size(&mut self, size: usize) -> Vec<StoreEvent> {
        if !self.pagination.set_page_size(size) {
            return Vec::new();
        }
        self.drag = None;
        vec![StoreEvent::PaginationChanged(self.pagination)]
    }

    // Selection -------------------------------------------------------------

    fn selection_event(&self) -> StoreEvent {
        StoreEvent::SelectionChanged {
            count: self.selection.len(),
        }
    }

    fn selection_events(&self, changed: bool) -> Vec<StoreEvent> {
        if changed {
            vec![self.selection_event()]
        } else {
            Vec::new()
        }
    }

    /// Ids outside the dataset are ignored.
    pub fn toggle(&mut self, id: RowId, included: bool) -> Vec<StoreEvent> {
        if id.get() >= self.rows.len() {
            debug!(%id, "selection toggle for unknown row ignored");
            return Vec::new();
        }
        let changed = self.selection.toggle(id, included);
        self.selection_events(changed)
    }

    pub fn clear_selection(&mut self) -> Vec<StoreEvent> {
        let changed = self.selection.clear();
        self.selection_events(changed)
    }

    pub fn select_all_on_current_page(&mut self) -> Vec<StoreEvent> {
        let page = self.page_ids().to_vec();
        let changed = self.selection.select_page(&page);
        self.selection_events(changed)
    }

    pub fn deselect_all_on_current_page(&mut self) -> Vec<StoreEvent> {
        let page = self.page_ids().to_vec();
        let changed = self.selection.deselect_page(&page);
        self.selection_events(changed)
    }

    pub fn header_check(&self) -> HeaderCheck {
        self.selection.header_check(self.page_ids())
    }

    pub fn drag_start(&mut self, hit: DragHit, additive: bool) -> Vec<StoreEvent> {
        self.drag = DragSelect::begin(hit, &self.selection, additive);
        Vec::new()
    }

    pub fn drag_move(&mut self, hit: DragHit) -> Vec<StoreEvent> {
        let Some(mut drag) = self.drag.take() else {
            return Vec::new();
        };
        let page = self.page_ids().to_vec();
        let changed = drag.update(hit, &page, &mut self.selection);
        self.drag = Some(drag);
        self.selection_events(changed)
    }

    pub fn drag_end(&mut self) -> Vec<StoreEvent> {
        self.drag = None;
        Vec::new()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(DragSelect::is_engaged)
    }

    pub fn selection_bar(&self, force_visible: bool) -> SelectionBar {
        let count = self.selection.len();
        SelectionBar {
            count,
            visible: force_visible || count > 0,
        }
    }

    /// Selected rows in dataset order, for handing to the downstream view.
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selection
            .iter()
            .filter_map(|id| self.rows.get(id.get()))
            .collect()
    }

    // Columns ---------------------------------------------------------------

    fn columns_events(changed: bool) -> Vec<StoreEvent> {
        if changed {
            vec![StoreEvent::ColumnsChanged]
        } else {
            Vec::new()
        }
    }

    pub fn resize_column(&mut self, key: &str, width: u32) -> Vec<StoreEvent> {
        Self::columns_events(self.columns.resize(key, width))
    }

    pub fn reorder_column(&mut self, from: &str, to: &str) -> Vec<StoreEvent> {
        Self::columns_events(self.columns.reorder(from, to))
    }

    pub fn toggle_column_hidden(&mut self, key: &str) -> Vec<StoreEvent> {
        Self::columns_events(self.columns.toggle_hidden(key))
    }

    pub fn toggle_column_frozen(&mut self, key: &str) -> Vec<StoreEvent> {
        Self::columns_events(self.columns.toggle_frozen(key))
    }

    pub fn reset_column_order(&mut self) -> Vec<StoreEvent> {
        let headers = self.headers.clone();
        Self::columns_events(self.columns.reset_order(&headers))
    }

    pub fn auto_fit_columns(&mut self) -> Vec<StoreEvent> {
        let before = self.columns.clone();
        self.columns.auto_fit(&self.rows);
        Self::columns_events(self.columns != before)
    }

    /// Merges a persisted layout into the current columns.
    pub fn restore_layout(&mut self, stored: Vec<ColumnDescriptor>) -> Vec<StoreEvent> {
        let merged = self.columns.merge_stored(stored);
        let changed = merged != self.columns;
        self.columns = merged;
        Self::columns_events(changed)
    }

    // Status tags -----------------------------------------------------------

    /// Recomputes tags from the ids currently present downstream.
    pub fn sync_status(&mut self, downstream: Vec<RowId>) -> Vec<StoreEvent> {
        let mut present = vec![false; self.rows.len()];
        for id in downstream {
            if let Some(slot) = present.get_mut(id.get()) {
                *slot = true;
            }
        }
        for (row, present) in self.rows.iter_mut().zip(present) {
            let next = match (present, row.status()) {
                (true, _) => StatusTag::Pushed,
                (false, StatusTag::Pushed) => StatusTag::Deleted,
                (false, current) => current,
            };
            row.set_status(next);
        }
        let pushed = self.count_status(StatusTag::Pushed);
        let deleted = self.count_status(StatusTag::Deleted);
        debug!(pushed, deleted, "status tags synced");

        let mut events = vec![StoreEvent::StatusSynced { pushed, deleted }];
        events.extend(self.refilter_for_status());
        events
    }

    pub fn clear_status(&mut self) -> Vec<StoreEvent> {
        for row in &mut self.rows {
            row.set_status(StatusTag::None);
        }
        let mut events = vec![StoreEvent::StatusCleared];
        events.extend(self.refilter_for_status());
        events
    }

    fn count_status(&self, tag: StatusTag) -> usize {
        self.rows.iter().filter(|row| row.status() == tag).count()
    }

    /// Tags only feed the status predicate; other filters keep their view.
    fn refilter_for_status(&mut self) -> Vec<StoreEvent> {
        if self.filter.status == filter::StatusFilter::All {
            return Vec::new();
        }
        self.apply_filters(false)
    }

    // Read accessors ----------------------------------------------------------

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id.get())
    }

    pub fn status_of(&self, id: RowId) -> Option<StatusTag> {
        self.row(id).map(Row::status)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn filtered(&self) -> &[RowId] {
        &self.filtered
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn filter_params(&self) -> &FilterParams {
        &self.filter
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn page_slice(&self) -> PageSlice {
        self.pagination.slice()
    }

    pub fn page_bar(&self) -> Option<PageBar> {
        self.pagination.bar()
    }

    /// Ids on the current page, in view order.
    pub fn page_ids(&self) -> &[RowId] {
        let slice = self.pagination.slice();
        &self.filtered[slice.start..slice.end]
    }

    pub fn page_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.page_ids()
            .iter()
            .filter_map(|id| self.rows.get(id.get()))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    pub fn columns(&self) -> &ColumnLayout {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::{RowStore, StoreCommand, StoreEvent, StoreOptions};
    use crate::filter::{FilterOutcome, FilterPatch, StatusFilter};
    use crate::model::{Record, SortDirection, StatusTag};
    use crate::selection::{DragHit, HeaderCheck};
    use crate::RowId;
    use serde_json::json;

    fn records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|index| {
                json!({
                    "产品标题": format!("Item {index:03}"),
                    "前端价格": format!("{},50 Lei", index % 100),
                    "评价数量": index,
                })
                .as_object()
                .cloned()
                .unwrap_or_default()
            })
            .collect()
    }

    fn loaded(count: usize) -> RowStore {
        let mut store = RowStore::default();
        store.set_all_data(records(count));
        store
    }

    #[test]
    fn replacing_data_assigns_sequential_ids_and_clears_selection() {
        let mut store = loaded(5);
        store.toggle(RowId::new(2), true);
        assert_eq!(store.selection_count(), 1);

        let events = store.set_all_data(records(3));
        assert_eq!(events[0], StoreEvent::DataReplaced { rows: 3 });
        assert!(events.contains(&StoreEvent::SelectionChanged { count: 0 }));
        let ids: Vec<usize> = store.rows().iter().map(|row| row.id().get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(store.selection_count(), 0);
    }

    #[test]
    fn pages_of_120_rows_and_clamping() {
        let mut store = loaded(120);
        assert_eq!(store.pagination().total_pages(), 3);
        store.set_current_page(3);
        assert_eq!(store.page_ids().len(), 20);
        store.set_current_page(5);
        assert_eq!(store.pagination().page(), 3);
    }

    #[test]
    fn filter_change_resets_page_and_reports_outcome() {
        let mut store = loaded(120);
        store.set_current_page(2);
        let events = store.update_filter_state(&FilterPatch::search("item 01"));
        assert_eq!(store.pagination().page(), 1);
        assert!(events.contains(&StoreEvent::FilterStateChanged));
        assert!(events.contains(&StoreEvent::FilteredChanged {
            count: 10,
            outcome: FilterOutcome::Narrowed(10),
        }));

        let nothing = store.update_filter_state(&FilterPatch::search("zzz"));
        assert!(nothing.contains(&StoreEvent::FilteredChanged {
            count: 0,
            outcome: FilterOutcome::NoMatches,
        }));
    }

    #[test]
    fn unchanged_filter_patch_emits_nothing() {
        let mut store = loaded(10);
        assert!(store.update_filter_state(&FilterPatch::default()).is_empty());
        assert!(store.update_filter_state(&FilterPatch::search("")).is_empty());
    }

    #[test]
    fn selection_survives_page_and_filter_changes() {
        let mut store = loaded(150);
        store.select_all_on_current_page();
        assert_eq!(store.selection_count(), 50);
        store.set_current_page(2);
        assert_eq!(store.header_check(), HeaderCheck::Unchecked);
        store.set_current_page(1);
        assert_eq!(store.selection_count(), 50);
        assert_eq!(store.header_check(), HeaderCheck::Checked);

        store.update_filter_state(&FilterPatch::search("item 00"));
        assert_eq!(store.selection_count(), 50);
        assert_eq!(store.header_check(), HeaderCheck::Checked);
    }

    #[test]
    fn toggle_ignores_unknown_ids() {
        let mut store = loaded(3);
        assert!(store.toggle(RowId::new(3), true).is_empty());
        assert_eq!(
            store.toggle(RowId::new(1), true),
            vec![StoreEvent::SelectionChanged { count: 1 }]
        );
        assert!(store.toggle(RowId::new(1), true).is_empty());
    }

    #[test]
    fn sort_toggles_and_resorts_after_filtering() {
        let mut store = loaded(30);
        store.update_sort("reviews", true);
        store.update_sort("reviews", true);
        assert_eq!(store.sort_state().direction, SortDirection::Desc);
        assert_eq!(store.page_ids().first(), Some(&RowId::new(29)));

        store.update_filter_state(&FilterPatch::search("item 00"));
        let ids: Vec<usize> = store.filtered().iter().map(|id| id.get()).collect();
        assert_eq!(ids, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn filter_pass_resorts_without_a_sort_event() {
        let mut store = loaded(30);
        store.update_sort("reviews", true);
        store.update_sort("reviews", true);

        let events = store.update_filter_state(&FilterPatch::search("item 01"));
        assert!(!events.iter().any(|event| matches!(
            event,
            StoreEvent::SortChanged(_) | StoreEvent::SortDeferred { .. }
        )));
        let ids: Vec<usize> = store.filtered().iter().map(|id| id.get()).collect();
        assert_eq!(ids, (10..20).rev().collect::<Vec<_>>());
    }

    #[test]
    fn deferred_resort_after_filter_waits_quietly() {
        let mut store = RowStore::new(StoreOptions {
            defer_threshold: 10,
            ..StoreOptions::default()
        });
        store.set_all_data(records(30));
        store.update_sort("reviews", true);
        store.run_idle();

        let events = store.update_filter_state(&FilterPatch::search("item"));
        assert!(!events.iter().any(|event| matches!(event, StoreEvent::SortDeferred { .. })));
        assert!(store.is_sorting());
        assert_eq!(store.run_idle().first(), Some(&StoreEvent::SortCompleted));
    }

    #[test]
    fn unsortable_columns_ignore_clicks() {
        let mut store = loaded(3);
        assert!(store.update_sort("pnk", true).is_empty());
        assert_eq!(store.sort_state().key, None);
    }

    #[test]
    fn large_sorts_wait_for_idle_slot() {
        let mut store = RowStore::new(StoreOptions {
            defer_threshold: 10,
            ..StoreOptions::default()
        });
        store.set_all_data(records(20));
        store.update_sort("reviews", true);
        let events = store.update_sort("reviews", true);
        assert!(events.contains(&StoreEvent::SortDeferred { rows: 20 }));
        assert!(store.is_sorting());
        assert_eq!(store.page_ids().first(), Some(&RowId::new(0)));

        let done = store.dispatch(StoreCommand::RunIdle);
        assert_eq!(done[0], StoreEvent::SortCompleted);
        assert!(!store.is_sorting());
        assert_eq!(store.page_ids().first(), Some(&RowId::new(19)));
        assert!(store.run_idle().is_empty());
    }

    #[test]
    fn page_size_change_keeps_offset() {
        let mut store = loaded(500);
        store.set_page_size(20);
        store.set_current_page(4);
        store.set_page_size(50);
        assert_eq!(store.pagination().page(), 2);
        store.set_page_size(33);
        assert_eq!(store.pagination().page_size(), 50);
    }

    #[test]
    fn status_sync_marks_pushed_and_deleted() {
        let mut store = loaded(4);
        store.sync_status(vec![RowId::new(0), RowId::new(1)]);
        let events = store.sync_status(vec![RowId::new(1), RowId::new(99)]);
        assert_eq!(events[0], StoreEvent::StatusSynced { pushed: 1, deleted: 1 });
        assert_eq!(store.status_of(RowId::new(0)), Some(StatusTag::Deleted));
        assert_eq!(store.status_of(RowId::new(1)), Some(StatusTag::Pushed));
        assert_eq!(store.status_of(RowId::new(2)), Some(StatusTag::None));

        store.update_filter_state(&FilterPatch {
            status: Some(StatusFilter::Deleted),
            ..FilterPatch::default()
        });
        assert_eq!(store.filtered(), &[RowId::new(0)]);

        store.sync_status(vec![RowId::new(0)]);
        assert_eq!(store.filtered(), &[RowId::new(1)]);

        store.clear_status();
        assert!(store.rows().iter().all(|row| row.status() == StatusTag::None));
    }

    #[test]
    fn drag_select_through_store() {
        let mut store = loaded(60);
        let hit = |row: usize, y: i32| DragHit {
            x: 1,
            y,
            row: Some(row),
            in_select_column: true,
        };
        store.dispatch(StoreCommand::DragStart {
            hit: hit(1, 1),
            additive: false,
        });
        let events = store.dispatch(StoreCommand::DragMove(hit(3, 30)));
        assert_eq!(events, vec![StoreEvent::SelectionChanged { count: 3 }]);
        assert!(store.is_dragging());
        store.dispatch(StoreCommand::DragEnd);
        assert!(!store.is_dragging());
        assert!(store.dispatch(StoreCommand::DragMove(hit(9, 90))).is_empty());
    }

    #[test]
    fn filter_change_drops_a_live_drag() {
        let mut store = loaded(60);
        let hit = |row: usize, y: i32| DragHit {
            x: 1,
            y,
            row: Some(row),
            in_select_column: true,
        };
        store.drag_start(hit(3, 30), false);
        store.drag_move(hit(4, 40));
        assert!(store.is_dragging());
        let before: Vec<RowId> = store.selection().iter().collect();

        store.update_filter_state(&FilterPatch::search("item 00"));
        assert!(!store.is_dragging());
        assert!(store.drag_move(hit(5, 50)).is_empty());
        let after: Vec<RowId> = store.selection().iter().collect();
        assert_eq!(after, before);
    }

    #[test]
    fn selected_rows_follow_dataset_order() {
        let mut store = loaded(10);
        store.toggle(RowId::new(7), true);
        store.toggle(RowId::new(2), true);
        let ids: Vec<usize> = store.selected_rows().iter().map(|row| row.id().get()).collect();
        assert_eq!(ids, vec![2, 7]);
        assert!(store.selection_bar(false).visible);
        store.clear_selection();
        assert!(!store.selection_bar(false).visible);
        assert!(store.selection_bar(true).visible);
    }

    #[test]
    fn set_filtered_data_drops_unknown_ids() {
        let mut store = loaded(5);
        store.set_filtered_data(vec![RowId::new(4), RowId::new(8), RowId::new(1)]);
        assert_eq!(store.filtered(), &[RowId::new(4), RowId::new(1)]);
        assert_eq!(store.pagination().total(), 2);
    }
}
