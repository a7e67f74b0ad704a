// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use shelfgrid_core::paginate::PAGE_SIZES;
use shelfgrid_core::parse::parse_bound;
use shelfgrid_core::schedule::Debouncer;
use shelfgrid_core::{
    ColumnDescriptor, DragHit, FilterOutcome, FilterPatch, HeaderCheck, PageButton, RowId,
    RowStore, SELECT_KEY, SortDirection, StatusFilter, StatusTag, StoreEvent,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::cells::{BadgeTone, CellContent};
use crate::geometry::ColumnGeometry;
use crate::height::HeightSync;
use crate::highlight::Segment;
use crate::render::{GridFrame, GridRenderer, RenderedGrid};
use crate::resize::{ReorderSession, ResizeSession};
use crate::viewport::{ScrollTracker, Viewport};

/// Layout units per terminal column.
const CELL_PX: u32 = 8;
/// Pointer units per terminal line, for the drag activation distance.
const LINE_PX: i32 = 16;
const KEY_RESIZE_STEP: u32 = 10;
const WHEEL_ROWS: u64 = 3;
const MIN_BODY_LINES: u32 = 1;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

/// Host services the grid needs but does not own.
pub trait GridRuntime {
    fn save_layout(&mut self, columns: &[ColumnDescriptor]) -> Result<()>;
    /// Adds rows downstream; returns every id now present there.
    fn push_rows(&mut self, ids: &[RowId]) -> Result<Vec<RowId>>;
    /// Removes rows downstream; returns every id still present there.
    fn remove_rows(&mut self, ids: &[RowId]) -> Result<Vec<RowId>>;
    fn load_image(&mut self, src: &str) -> Result<String> {
        if src.starts_with("https://") || src.starts_with("http://") {
            Ok(src.to_owned())
        } else {
            Err(anyhow!("unsupported image source {src:?}"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    /// Terminal lines per record.
    pub row_height: u32,
    pub buffer_rows: usize,
    pub min_column_width: u32,
    pub filter_debounce: Duration,
    pub scroll_end: Duration,
    /// Quiet period after a terminal resize before the height is resynced.
    pub height_sync: Duration,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_height: 1,
            buffer_rows: 5,
            min_column_width: shelfgrid_core::MIN_COLUMN_WIDTH,
            filter_debounce: Duration::from_millis(300),
            scroll_end: crate::viewport::DEFAULT_SCROLL_END,
            height_sync: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Search,
    PriceMin,
    PriceMax,
    ReviewsMin,
    ScoreMin,
}

impl PromptKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::PriceMin => "min price",
            Self::PriceMax => "max price",
            Self::ReviewsMin => "min reviews",
            Self::ScoreMin => "min score",
        }
    }

    fn patch(self, draft: &str) -> FilterPatch {
        let bound = Some(parse_bound(draft));
        match self {
            Self::Search => FilterPatch::search(draft),
            Self::PriceMin => FilterPatch {
                price_min: bound,
                ..FilterPatch::default()
            },
            Self::PriceMax => FilterPatch {
                price_max: bound,
                ..FilterPatch::default()
            },
            Self::ReviewsMin => FilterPatch {
                reviews_min: bound,
                ..FilterPatch::default()
            },
            Self::ScoreMin => FilterPatch {
                score_min: bound,
                ..FilterPatch::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    kind: PromptKind,
    draft: String,
}

#[derive(Debug)]
enum MouseGesture {
    Resize(ResizeSession),
    Reorder(ReorderSession),
    Select,
}

/// Screen regions from the last frame, for pointer hit tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GridAreas {
    table: Rect,
}

impl GridAreas {
    fn header_line(&self) -> u16 {
        self.table.y
    }

    fn body_top(&self) -> u16 {
        self.table.y.saturating_add(1)
    }
}

#[derive(Debug)]
pub struct GridApp {
    store: RowStore,
    renderer: GridRenderer,
    options: GridOptions,
    scroll: ScrollTracker,
    scroll_left: f64,
    cursor_row: usize,
    cursor_column: Option<String>,
    prompt: Option<Prompt>,
    search_debounce: Debouncer<FilterPatch>,
    height: HeightSync,
    resize_settle: Debouncer<()>,
    body_lines: u32,
    container_width: u32,
    areas: GridAreas,
    gesture: Option<MouseGesture>,
    sort_frame_shown: bool,
    help_visible: bool,
    status: Option<String>,
    status_token: u64,
}

impl GridApp {
    pub fn new(store: RowStore, options: GridOptions) -> Self {
        let viewport = Viewport::new(options.row_height, options.buffer_rows);
        let cursor_column = store.columns().visible().next().map(|column| column.key.clone());
        Self {
            store,
            renderer: GridRenderer::new(viewport),
            options,
            scroll: ScrollTracker::new(options.scroll_end),
            scroll_left: 0.0,
            cursor_row: 0,
            cursor_column,
            prompt: None,
            search_debounce: Debouncer::new(options.filter_debounce),
            height: HeightSync::new(MIN_BODY_LINES, 0),
            resize_settle: Debouncer::new(options.height_sync),
            body_lines: 0,
            container_width: 0,
            areas: GridAreas::default(),
            gesture: None,
            sort_frame_shown: false,
            help_visible: false,
            status: None,
            status_token: 0,
        }
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn viewport(&self) -> Viewport {
        self.renderer.viewport()
    }

    fn geometry(&self) -> ColumnGeometry {
        self.renderer.geometry(&self.store, self.frame())
    }

    fn frame(&self) -> GridFrame {
        GridFrame {
            container_width: self.container_width,
            container_height: self.body_lines,
            scroll_top: self.scroll.scroll_top(),
            scroll_left: self.scroll_left,
        }
    }

    fn visible_keys(&self) -> Vec<String> {
        self.store
            .columns()
            .visible()
            .map(|column| column.key.clone())
            .collect()
    }

    fn cursor_id(&self) -> Option<RowId> {
        self.store.page_ids().get(self.cursor_row).copied()
    }

    fn move_cursor_row(&mut self, delta: isize) {
        let len = self.store.page_ids().len();
        if len == 0 {
            self.cursor_row = 0;
            return;
        }
        self.cursor_row = self.cursor_row.saturating_add_signed(delta).min(len - 1);
        self.reveal_cursor_row();
    }

    fn reveal_cursor_row(&mut self) {
        let top = self
            .viewport()
            .scroll_into_view(self.cursor_row, self.scroll.scroll_top(), self.body_lines);
        self.scroll.jump_to(top);
    }

    fn move_cursor_column(&mut self, delta: isize) {
        let keys = self.visible_keys();
        if keys.is_empty() {
            self.cursor_column = None;
            return;
        }
        let current = self
            .cursor_column
            .as_ref()
            .and_then(|key| keys.iter().position(|candidate| candidate == key))
            .unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(keys.len() - 1);
        self.cursor_column = Some(keys[next].clone());
        self.reveal_cursor_column();
    }

    fn coerce_cursor_column(&mut self) {
        let keys = self.visible_keys();
        let valid = self
            .cursor_column
            .as_ref()
            .is_some_and(|key| keys.contains(key));
        if !valid {
            self.cursor_column = keys.into_iter().next();
        }
    }

    fn reveal_cursor_column(&mut self) {
        let Some(key) = self.cursor_column.clone() else {
            return;
        };
        let geometry = self.geometry();
        let Some(column) = geometry.get(&key) else {
            return;
        };
        if column.is_frozen() {
            return;
        }
        let container = f64::from(self.container_width);
        let pinned = geometry.frozen_width();
        if column.left - self.scroll_left < pinned {
            self.scroll_left = (column.left - pinned).max(0.0);
        } else if column.left + column.width - self.scroll_left > container {
            self.scroll_left = column.left + column.width - container;
        }
        self.scroll_left = self
            .scroll_left
            .min(geometry.max_scroll_left(container));
    }

    /// Height writes wait while the user scrolls or the terminal is resizing.
    fn height_deferred(&self) -> bool {
        self.scroll.is_scrolling() || self.resize_settle.is_pending()
    }

    fn reset_vertical_position(&mut self) {
        self.cursor_row = 0;
        self.scroll.jump_to(0);
    }
}

pub fn run_app<R: GridRuntime>(app: &mut GridApp, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let result = event_loop(&mut terminal, app, runtime);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen)
        .context("leave alternate screen")?;
    result
}

fn event_loop<R: GridRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut GridApp,
    runtime: &mut R,
) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    loop {
        process_internal_events(app, &internal_rx);
        tick(app, runtime, &internal_tx, Instant::now());

        terminal
            .draw(|frame| render(frame, app))
            .context("draw frame")?;
        app.sort_frame_shown = app.store.is_sorting();

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) => {
                if handle_key_event(app, runtime, &internal_tx, key, Instant::now()) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => {
                handle_mouse_event(app, runtime, &internal_tx, mouse, Instant::now());
            }
            Event::Resize(_, _) => app.resize_settle.trigger(Instant::now(), ()),
            _ => {}
        }
    }
}

fn process_internal_events(app: &mut GridApp, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == app.status_token => {
                app.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

/// Deferred work for one loop turn: debounced filters, scroll frames,
/// scroll-end jobs and idle sorts.
fn tick<R: GridRuntime>(app: &mut GridApp, runtime: &mut R, tx: &Sender<InternalEvent>, now: Instant) {
    if let Some(patch) = app.search_debounce.poll(now) {
        let events = app.store.update_filter_state(&patch);
        apply_events(app, runtime, tx, events);
    }

    if app.scroll.take_frame().is_some() {
        let max = app
            .viewport()
            .max_scroll_top(app.store.page_ids().len(), app.body_lines);
        if app.scroll.scroll_top() > max {
            app.scroll.jump_to(max);
        }
    }
    let scroll_ended = app.scroll.poll_scroll_end(now);
    let resize_settled = app.resize_settle.poll(now).is_some();
    if (scroll_ended || resize_settled) && !app.height_deferred() {
        app.height.scroll_ended(|lines| app.body_lines = lines);
    }

    if !app.scroll.is_scrolling() {
        for request in app.renderer.images_mut().flush() {
            let result = runtime.load_image(&request.src);
            app.renderer.images_mut().resolve(request.id, result);
        }
    }

    if app.store.is_sorting() && app.sort_frame_shown {
        let events = app.store.run_idle();
        apply_events(app, runtime, tx, events);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(app: &mut GridApp, internal_tx: &Sender<InternalEvent>, message: impl Into<String>) {
    app.status = Some(message.into());
    app.status_token = app.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, app.status_token);
}

fn apply_events<R: GridRuntime>(
    app: &mut GridApp,
    runtime: &mut R,
    tx: &Sender<InternalEvent>,
    events: Vec<StoreEvent>,
) {
    app.renderer.observe(&events);
    for event in events {
        match event {
            StoreEvent::ColumnsChanged => {
                app.coerce_cursor_column();
                if let Err(error) = runtime.save_layout(app.store.columns().columns()) {
                    emit_status(app, tx, format!("column layout not saved: {error:#}"));
                }
            }
            StoreEvent::SortDeferred { rows } => {
                app.sort_frame_shown = false;
                emit_status(app, tx, format!("sorting {rows} rows…"));
            }
            StoreEvent::SortCompleted => emit_status(app, tx, "sorted"),
            StoreEvent::FilteredChanged { count, outcome } => match outcome {
                FilterOutcome::NoMatches => emit_status(app, tx, "no rows match the filters"),
                FilterOutcome::Narrowed(_) => {
                    let total = app.store.rows().len();
                    emit_status(app, tx, format!("{count} of {total} rows match"));
                }
                FilterOutcome::Complete => {}
            },
            StoreEvent::PaginationChanged(_) => app.reset_vertical_position(),
            StoreEvent::StatusSynced { pushed, deleted } => {
                emit_status(app, tx, format!("{pushed} pushed, {deleted} removed downstream"));
            }
            StoreEvent::StatusCleared => emit_status(app, tx, "status tags cleared"),
            StoreEvent::DataReplaced { .. }
            | StoreEvent::FilterStateChanged
            | StoreEvent::SortChanged(_)
            | StoreEvent::SelectionChanged { .. } => {}
        }
    }
}

fn handle_prompt_key<R: GridRuntime>(
    app: &mut GridApp,
    runtime: &mut R,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) {
    let Some(prompt) = app.prompt.as_mut() else {
        return;
    };
    let kind = prompt.kind;
    match key.code {
        KeyCode::Esc => {
            app.prompt = None;
        }
        KeyCode::Enter => {
            let draft = std::mem::take(&mut prompt.draft);
            app.prompt = None;
            let patch = if kind == PromptKind::Search {
                app.search_debounce.cancel();
                FilterPatch::search(draft)
            } else {
                kind.patch(&draft)
            };
            let events = app.store.update_filter_state(&patch);
            apply_events(app, runtime, tx, events);
        }
        KeyCode::Backspace => {
            prompt.draft.pop();
            if kind == PromptKind::Search {
                let patch = kind.patch(&prompt.draft);
                app.search_debounce.trigger_merged(now, patch, FilterPatch::merge);
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.draft.push(ch);
            if kind == PromptKind::Search {
                let patch = kind.patch(&prompt.draft);
                app.search_debounce.trigger_merged(now, patch, FilterPatch::merge);
            }
        }
        _ => {}
    }
}

fn open_prompt(app: &mut GridApp, kind: PromptKind) {
    let params = app.store.filter_params();
    let bound_text = |bound: Option<f64>| bound.map(|value| value.to_string()).unwrap_or_default();
    let draft = match kind {
        PromptKind::Search => params.search.clone(),
        PromptKind::PriceMin => bound_text(params.price_min),
        PromptKind::PriceMax => bound_text(params.price_max),
        PromptKind::ReviewsMin => bound_text(params.reviews_min),
        PromptKind::ScoreMin => bound_text(params.score_min),
    };
    app.prompt = Some(Prompt { kind, draft });
}

fn step_page_size(current: usize, delta: isize) -> usize {
    let index = PAGE_SIZES
        .iter()
        .position(|size| *size == current)
        .unwrap_or(0);
    let next = index
        .saturating_add_signed(delta)
        .min(PAGE_SIZES.len() - 1);
    PAGE_SIZES[next]
}

fn neighbor_key(keys: &[String], key: &str, delta: isize) -> Option<String> {
    let index = keys.iter().position(|candidate| candidate == key)?;
    let target = index.checked_add_signed(delta)?;
    keys.get(target).cloned()
}

fn handle_key_event<R: GridRuntime>(
    app: &mut GridApp,
    runtime: &mut R,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    if app.prompt.is_some() {
        handle_prompt_key(app, runtime, internal_tx, key, now);
        return false;
    }
    if app.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.help_visible = false;
        }
        return false;
    }

    let page_lines = (app.body_lines / app.options.row_height.max(1)).max(1) as isize;
    let column = app.cursor_column.clone();
    let events = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => {
            app.help_visible = true;
            Vec::new()
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_cursor_row(1);
            Vec::new()
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_cursor_row(-1);
            Vec::new()
        }
        KeyCode::PageDown => {
            app.move_cursor_row(page_lines);
            Vec::new()
        }
        KeyCode::PageUp => {
            app.move_cursor_row(-page_lines);
            Vec::new()
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.move_cursor_row(isize::MIN / 2);
            Vec::new()
        }
        KeyCode::End | KeyCode::Char('G') => {
            app.move_cursor_row(isize::MAX / 2);
            Vec::new()
        }
        KeyCode::Left => {
            app.move_cursor_column(-1);
            Vec::new()
        }
        KeyCode::Right => {
            app.move_cursor_column(1);
            Vec::new()
        }
        KeyCode::Char('/') => {
            open_prompt(app, PromptKind::Search);
            Vec::new()
        }
        KeyCode::Char('m') => {
            open_prompt(app, PromptKind::PriceMin);
            Vec::new()
        }
        KeyCode::Char('M') => {
            open_prompt(app, PromptKind::PriceMax);
            Vec::new()
        }
        KeyCode::Char('v') => {
            open_prompt(app, PromptKind::ReviewsMin);
            Vec::new()
        }
        KeyCode::Char('n') => {
            open_prompt(app, PromptKind::ScoreMin);
            Vec::new()
        }
        KeyCode::Char('r') => {
            let rating = app.store.filter_params().rating.next();
            app.store.update_filter_state(&FilterPatch {
                rating: Some(rating),
                ..FilterPatch::default()
            })
        }
        KeyCode::Char('t') => {
            let status = app.store.filter_params().status.next();
            app.store.update_filter_state(&FilterPatch {
                status: Some(status),
                ..FilterPatch::default()
            })
        }
        KeyCode::Char('0') => {
            let pending = app.search_debounce.cancel();
            if pending || app.store.filter_params().is_active() {
                app.store.update_filter_state(&FilterPatch::reset())
            } else {
                emit_status(app, internal_tx, "no filters to reset");
                Vec::new()
            }
        }
        KeyCode::Char('s') => match column {
            Some(column_key) if app.store.columns().is_sortable(&column_key) => {
                app.store.update_sort(&column_key, true)
            }
            Some(column_key) => {
                emit_status(app, internal_tx, format!("{column_key} is not sortable"));
                Vec::new()
            }
            None => Vec::new(),
        },
        KeyCode::Char(' ') => match app.cursor_id() {
            Some(id) => {
                let included = !app.store.selection().contains(id);
                app.store.toggle(id, included)
            }
            None => Vec::new(),
        },
        KeyCode::Char('a') => app.store.select_all_on_current_page(),
        KeyCode::Char('A') => app.store.deselect_all_on_current_page(),
        KeyCode::Char('C') => app.store.clear_selection(),
        KeyCode::Char(']') => app.store.set_current_page(app.store.pagination().page() + 1),
        KeyCode::Char('[') => app
            .store
            .set_current_page(app.store.pagination().page().saturating_sub(1)),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let size = step_page_size(app.store.pagination().page_size(), 1);
            app.store.set_page_size(size)
        }
        KeyCode::Char('-') => {
            let size = step_page_size(app.store.pagination().page_size(), -1);
            app.store.set_page_size(size)
        }
        KeyCode::Char('<') | KeyCode::Char('>') => {
            let Some(column_key) = column else {
                return false;
            };
            let Some(width) = app.store.columns().get(&column_key).map(|column| column.width)
            else {
                return false;
            };
            let width = if key.code == KeyCode::Char('<') {
                width.saturating_sub(KEY_RESIZE_STEP)
            } else {
                width.saturating_add(KEY_RESIZE_STEP)
            };
            app.store
                .resize_column(&column_key, width.max(app.options.min_column_width))
        }
        KeyCode::Char('H') | KeyCode::Char('L') => {
            let Some(column_key) = column else {
                return false;
            };
            let delta = if key.code == KeyCode::Char('H') { -1 } else { 1 };
            match neighbor_key(&app.visible_keys(), &column_key, delta) {
                Some(target) => app.store.reorder_column(&column_key, &target),
                None => Vec::new(),
            }
        }
        KeyCode::Char('f') => match column {
            Some(column_key) => app.store.toggle_column_frozen(&column_key),
            None => Vec::new(),
        },
        KeyCode::Char('h') => match column {
            Some(column_key) => {
                let events = app.store.toggle_column_hidden(&column_key);
                if events.is_empty() {
                    emit_status(app, internal_tx, "the last visible column stays visible");
                }
                events
            }
            None => Vec::new(),
        },
        KeyCode::Char('U') => {
            let hidden: Vec<String> = app
                .store
                .columns()
                .columns()
                .iter()
                .filter(|column| column.hidden)
                .map(|column| column.key.clone())
                .collect();
            hidden
                .iter()
                .flat_map(|key| app.store.toggle_column_hidden(key))
                .collect()
        }
        KeyCode::Char('R') => app.store.reset_column_order(),
        KeyCode::Char('F') => app.store.auto_fit_columns(),
        KeyCode::Char('p') => {
            let ids: Vec<RowId> = app.store.selected_rows().iter().map(|row| row.id()).collect();
            if ids.is_empty() {
                emit_status(app, internal_tx, "select rows to push first");
                Vec::new()
            } else {
                match runtime.push_rows(&ids) {
                    Ok(downstream) => app.store.sync_status(downstream),
                    Err(error) => {
                        emit_status(app, internal_tx, format!("push failed: {error:#}"));
                        Vec::new()
                    }
                }
            }
        }
        KeyCode::Char('d') => {
            let ids: Vec<RowId> = app.store.selection().iter().collect();
            match runtime.remove_rows(&ids) {
                Ok(downstream) => app.store.sync_status(downstream),
                Err(error) => {
                    emit_status(app, internal_tx, format!("remove failed: {error:#}"));
                    Vec::new()
                }
            }
        }
        KeyCode::Char('X') => app.store.clear_status(),
        _ => Vec::new(),
    };
    apply_events(app, runtime, internal_tx, events);
    false
}

fn drag_hit(app: &GridApp, mouse: &MouseEvent) -> DragHit {
    let table = app.areas.table;
    let x = u32::from(mouse.column.saturating_sub(table.x)) * CELL_PX + CELL_PX / 2;
    let line = i32::from(mouse.row) - i32::from(app.areas.body_top());
    let row = u32::try_from(line).ok().and_then(|line| {
        app.viewport()
            .row_at(app.store.page_ids().len(), app.scroll.scroll_top(), line)
    });
    let geometry = app.geometry();
    let in_select_column = line >= 0
        && geometry
            .column_at(
                f64::from(x),
                app.scroll_left,
                f64::from(app.container_width),
            )
            .is_some_and(|column| column.key == SELECT_KEY);
    DragHit {
        x: i32::try_from(x).unwrap_or(i32::MAX),
        y: line.saturating_mul(LINE_PX),
        row,
        in_select_column,
    }
}

fn pointer_x(app: &GridApp, mouse: &MouseEvent) -> f64 {
    f64::from(u32::from(mouse.column.saturating_sub(app.areas.table.x)) * CELL_PX)
}

fn handle_mouse_event<R: GridRuntime>(
    app: &mut GridApp,
    runtime: &mut R,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
    now: Instant,
) {
    let container = f64::from(app.container_width);
    let events = match mouse.kind {
        MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
            let step = WHEEL_ROWS * u64::from(app.options.row_height.max(1));
            let top = app.scroll.scroll_top();
            let top = if mouse.kind == MouseEventKind::ScrollDown {
                top.saturating_add(step)
            } else {
                top.saturating_sub(step)
            };
            app.scroll.scroll_to(now, top);
            Vec::new()
        }
        MouseEventKind::Down(MouseButton::Left) if mouse.row == app.areas.header_line() => {
            let x = pointer_x(app, &mouse);
            let geometry = app.geometry();
            let slop = f64::from(CELL_PX);
            if let Some(column) = geometry.resize_handle_at(x, app.scroll_left, container, slop) {
                app.gesture = ResizeSession::begin(
                    &geometry,
                    &column.key,
                    x,
                    app.options.min_column_width,
                )
                .map(MouseGesture::Resize);
            } else if let Some(column) = geometry.column_at(x, app.scroll_left, container) {
                app.gesture =
                    ReorderSession::begin(app.store.columns(), &column.key).map(MouseGesture::Reorder);
            }
            Vec::new()
        }
        MouseEventKind::Down(MouseButton::Left) => {
            let hit = drag_hit(app, &mouse);
            if hit.in_select_column {
                let additive = mouse
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::CONTROL);
                app.gesture = Some(MouseGesture::Select);
                app.store.drag_start(hit, additive)
            } else {
                if let Some(row) = hit.row {
                    app.cursor_row = row;
                }
                let x = pointer_x(app, &mouse);
                let key = app
                    .geometry()
                    .column_at(x, app.scroll_left, container)
                    .map(|column| column.key.clone());
                if key.is_some() {
                    app.cursor_column = key;
                }
                Vec::new()
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let x = pointer_x(app, &mouse);
            let hit = drag_hit(app, &mouse);
            match app.gesture.as_mut() {
                Some(MouseGesture::Resize(session)) => {
                    session.drag(x);
                    let preview = (session.key().to_owned(), session.preview_screen_width());
                    app.renderer.set_resize_preview(Some(preview));
                    Vec::new()
                }
                Some(MouseGesture::Select) => app.store.drag_move(hit),
                Some(MouseGesture::Reorder(_)) | None => Vec::new(),
            }
        }
        MouseEventKind::Up(MouseButton::Left) => match app.gesture.take() {
            Some(MouseGesture::Resize(session)) => {
                app.renderer.set_resize_preview(None);
                match session.finish(pointer_x(app, &mouse)) {
                    Some(command) => app.store.dispatch(command),
                    None => Vec::new(),
                }
            }
            Some(MouseGesture::Reorder(session)) => {
                let x = pointer_x(app, &mouse);
                let target = app
                    .geometry()
                    .column_at(x, app.scroll_left, container)
                    .map(|column| column.key.clone());
                let from = session.from().to_owned();
                match target {
                    Some(target) if target != from => match session.drop_on(&target) {
                        Some(command) => app.store.dispatch(command),
                        None => Vec::new(),
                    },
                    Some(_) => header_click(app, &from),
                    None => Vec::new(),
                }
            }
            Some(MouseGesture::Select) => {
                let mut events = Vec::new();
                if !app.store.is_dragging() {
                    let hit = drag_hit(app, &mouse);
                    let id = hit.row.and_then(|row| app.store.page_ids().get(row).copied());
                    if let (true, Some(id)) = (hit.in_select_column, id) {
                        let included = !app.store.selection().contains(id);
                        events = app.store.toggle(id, included);
                    }
                }
                events.extend(app.store.drag_end());
                events
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    };
    apply_events(app, runtime, internal_tx, events);
}

/// Header click: the select column toggles the page, sortable columns sort.
fn header_click(app: &mut GridApp, key: &str) -> Vec<StoreEvent> {
    if key == SELECT_KEY {
        return match app.store.header_check() {
            HeaderCheck::Checked => app.store.deselect_all_on_current_page(),
            HeaderCheck::Unchecked | HeaderCheck::Indeterminate => {
                app.store.select_all_on_current_page()
            }
        };
    }
    if app.store.columns().is_sortable(key) {
        return app.store.update_sort(key, true);
    }
    Vec::new()
}

fn render(frame: &mut ratatui::Frame<'_>, app: &mut GridApp) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let filter_bar = Paragraph::new(filter_bar_text(app))
        .block(Block::default().title("shelfgrid").borders(Borders::ALL));
    frame.render_widget(filter_bar, layout[0]);

    render_table(frame, layout[1], app);

    let footer = Paragraph::new(vec![
        Line::from(page_bar_text(app)),
        Line::from(selection_bar_text(app)),
    ]);
    frame.render_widget(footer, layout[2]);

    let status = Paragraph::new(status_text(app)).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, layout[3]);

    if app.help_visible {
        let area = centered_rect(70, 80, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("keys").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, app: &mut GridApp) {
    let block = Block::default().borders(Borders::ALL).title(table_title(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.areas.table = inner;
    app.container_width = u32::from(inner.width) * CELL_PX;
    let available = u32::from(inner.height.saturating_sub(1));
    let deferred = app.height_deferred();
    app.height
        .observe(available, deferred, |lines| app.body_lines = lines);
    if app.body_lines == 0 {
        app.body_lines = available.max(MIN_BODY_LINES);
    }

    let frame_spec = app.frame();
    let grid = app.renderer.render(&app.store, frame_spec);
    if grid.is_empty() {
        let message = if app.store.rows().is_empty() {
            "no data loaded"
        } else {
            "no rows match the current filters; press 0 to reset"
        };
        frame.render_widget(Paragraph::new(message), inner);
        return;
    }

    let widths: Vec<Constraint> = grid
        .header
        .iter()
        .map(|cell| Constraint::Length(cells_for(cell.width)))
        .collect();
    let header = Row::new(grid.header.iter().map(|cell| {
        let label = header_label(cell.label.as_str(), &cell.key, cell.check, cell.sort);
        let mut style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        if cell.frozen {
            style = style.fg(Color::Cyan);
        }
        Cell::from(truncate_label(&label, usize::from(cells_for(cell.width)))).style(style)
    }));

    let rows = visible_rows(app, &grid);
    let table = Table::new(rows, widths).header(header).column_spacing(0);
    frame.render_widget(table, inner);
}

/// Rows that fit on screen; the buffer rows around them are formatted but
/// a character grid has nowhere to put them.
fn visible_rows<'a>(app: &GridApp, grid: &'a RenderedGrid) -> Vec<Row<'a>> {
    let row_height = app.options.row_height.max(1);
    let first = usize::try_from(app.scroll.scroll_top() / u64::from(row_height)).unwrap_or(0);
    let fits = usize::try_from(app.body_lines / row_height).unwrap_or(0).max(1);
    grid.rows
        .iter()
        .filter(|row| row.index >= first && row.index < first + fits)
        .map(|row| {
            let cursor = row.index == app.cursor_row;
            let cells = row.cells.iter().map(|cell| {
                let width = usize::from(cells_for(cell.width));
                let focused = cursor && app.cursor_column.as_deref() == Some(cell.key.as_str());
                let mut style = cell_style(&cell.content, row.status);
                if cursor {
                    style = style.bg(Color::DarkGray);
                }
                if focused {
                    style = style.fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD);
                }
                Cell::from(cell_line(&cell.content, width)).style(style)
            });
            Row::new(cells.collect::<Vec<_>>()).height(u16::try_from(row_height).unwrap_or(1))
        })
        .collect()
}

fn cells_for(width: f64) -> u16 {
    let cells = (width / f64::from(CELL_PX)).floor();
    if cells <= 0.0 {
        0
    } else {
        u16::try_from(cells as u64).unwrap_or(u16::MAX)
    }
}

fn cell_line(content: &CellContent, width: usize) -> Line<'static> {
    let segments: &[Segment] = match content {
        CellContent::Text(segments) | CellContent::Code(segments) => segments,
        CellContent::Badge { segments, .. } => segments,
        _ => return Line::from(truncate_label(&content.display_text(), width)),
    };
    let mut remaining = width;
    let mut spans = Vec::with_capacity(segments.len());
    for segment in segments {
        if remaining == 0 {
            break;
        }
        let text = truncate_label(&segment.text, remaining);
        remaining = remaining.saturating_sub(text.chars().count());
        let style = if segment.matched {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        spans.push(Span::styled(text, style));
    }
    Line::from(spans)
}

fn badge_color(tone: BadgeTone) -> Color {
    const PALETTE: [Color; 8] = [
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Magenta,
        Color::LightBlue,
        Color::Red,
        Color::Cyan,
        Color::LightRed,
    ];
    match tone {
        BadgeTone::TopFavorite => Color::LightMagenta,
        BadgeTone::SuperPret => Color::LightYellow,
        BadgeTone::Palette(index) => PALETTE[index % PALETTE.len()],
    }
}

fn cell_style(content: &CellContent, status: StatusTag) -> Style {
    match content {
        CellContent::Price { current: true, .. } => {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        }
        CellContent::Discount(_) => Style::default().fg(Color::LightRed),
        CellContent::Rating(_) => Style::default().fg(Color::Yellow),
        CellContent::Badge { tone, .. } => Style::default().fg(badge_color(*tone)),
        CellContent::Link(_) | CellContent::RichText { .. } => Style::default().fg(Color::Blue),
        CellContent::Placeholder => Style::default().fg(Color::DarkGray),
        CellContent::Select { .. } => match status {
            StatusTag::Pushed => Style::default().fg(Color::Green),
            StatusTag::Deleted => Style::default().fg(Color::Red),
            StatusTag::None => Style::default(),
        },
        _ => Style::default(),
    }
}

fn header_label(
    label: &str,
    key: &str,
    check: Option<HeaderCheck>,
    sort: Option<SortDirection>,
) -> String {
    if let Some(check) = check {
        return match check {
            HeaderCheck::Unchecked => "[ ]",
            HeaderCheck::Indeterminate => "[-]",
            HeaderCheck::Checked => "[x]",
        }
        .to_owned();
    }
    let mut label = if label.is_empty() { key.to_owned() } else { label.to_owned() };
    match sort {
        Some(SortDirection::Asc) => label.push_str(" ↑"),
        Some(SortDirection::Desc) => label.push_str(" ↓"),
        None => {}
    }
    label
}

fn table_title(app: &GridApp) -> String {
    let page = app.store.page_ids().len();
    if page == 0 {
        return "rows".to_owned();
    }
    let row_height = u64::from(app.options.row_height.max(1));
    let first = (app.scroll.scroll_top() / row_height) as usize + 1;
    let last = (first + (app.body_lines as usize / row_height as usize).max(1) - 1).min(page);
    let mut title = format!("rows {first}-{last} of {page} on page");
    if app.store.is_sorting() {
        title.push_str(" | sorting…");
    }
    title
}

fn filter_bar_text(app: &GridApp) -> Line<'static> {
    let params = app.store.filter_params();
    let bound = |value: Option<f64>| value.map_or_else(|| "∗".to_owned(), |value| value.to_string());
    let search = match &app.prompt {
        Some(Prompt {
            kind: PromptKind::Search,
            draft,
        }) => format!("/{draft}▏"),
        _ if params.search.is_empty() => "/".to_owned(),
        _ => format!("/{}", params.search),
    };
    let mut parts = vec![
        search,
        format!("price {}-{}", bound(params.price_min), bound(params.price_max)),
        format!("reviews ≥{}", bound(params.reviews_min)),
        format!("score ≥{}", bound(params.score_min)),
        format!("rating {}", params.rating.label()),
        format!("status {}", status_label(params.status)),
        format!("{}/{} rows", app.store.filtered_count(), app.store.rows().len()),
    ];
    if let Some(Prompt { kind, draft }) = &app.prompt
        && *kind != PromptKind::Search
    {
        parts.insert(0, format!("{}: {draft}▏", kind.label()));
    }
    Line::from(parts.join(" | "))
}

const fn status_label(status: StatusFilter) -> &'static str {
    match status {
        StatusFilter::All => "all",
        StatusFilter::None => StatusTag::None.as_str(),
        StatusFilter::Pushed => StatusTag::Pushed.as_str(),
        StatusFilter::Deleted => StatusTag::Deleted.as_str(),
    }
}

fn page_bar_text(app: &GridApp) -> String {
    let Some(bar) = app.store.page_bar() else {
        return "no rows".to_owned();
    };
    let buttons: Vec<String> = bar
        .buttons
        .iter()
        .map(|button| match button {
            PageButton::Page {
                number,
                active: true,
            } => format!("[{number}]"),
            PageButton::Page { number, .. } => number.to_string(),
            PageButton::Ellipsis => "…".to_owned(),
        })
        .collect();
    let prev = if bar.has_prev { "‹" } else { " " };
    let next = if bar.has_next { "›" } else { " " };
    format!(
        "{}-{} of {} | {prev} {} {next} | {}/page",
        bar.first_record,
        bar.last_record,
        bar.total,
        buttons.join(" "),
        bar.page_size
    )
}

fn selection_bar_text(app: &GridApp) -> String {
    let bar = app.store.selection_bar(false);
    if !bar.visible {
        return String::new();
    }
    format!(
        "{} selected | p push | d remove | C clear",
        bar.count
    )
}

fn status_text(app: &GridApp) -> String {
    if let Some(status) = &app.status {
        return status.clone();
    }
    if let Some(prompt) = &app.prompt {
        return format!("{}: enter apply | esc close", prompt.kind.label());
    }
    "? help | q quit".to_owned()
}

fn help_overlay_text() -> String {
    [
        "j/k ↑/↓     move row        ←/→   move column",
        "pgup/pgdn   page of rows    g/G   first/last row",
        "[ / ]       prev/next page  + / - page size",
        "/           search          m/M   min/max price",
        "v / n       min reviews/score",
        "r           rating bucket   t     status filter",
        "0           reset filters   s     sort column",
        "space       toggle row      a/A   select/deselect page",
        "C           clear selection",
        "< / >       narrow/widen    H/L   move column",
        "f           freeze column   h     hide column",
        "U           show all        R     reset order",
        "F           auto-fit        p/d   push/remove selected",
        "X           clear status tags",
        "mouse       drag the checkbox column to select ranges",
        "            drag header edges to resize, headers to reorder",
        "q / esc     quit",
    ]
    .join("\n")
}

fn truncate_label(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        let kept: String = truncated.chars().take(max_chars - 1).collect();
        format!("{kept}…")
    } else {
        truncated
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
