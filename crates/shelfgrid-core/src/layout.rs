// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Ordered column descriptors and the operations that rearrange them.
//!
//! The sequence keeps every frozen column ahead of every unfrozen one, so
//! frozen columns always form a prefix of whatever is visible.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{CATEGORY_KEYS, ColumnKind, RICH_TEXT_KEYS, Row, SELECT_KEY, source_headers, value_text};

/// Narrowest base width a resize can produce.
pub const MIN_COLUMN_WIDTH: u32 = 30;
const FALLBACK_WIDTH: u32 = 100;
const AUTO_FIT_SAMPLE: usize = 200;
const AUTO_FIT_MIN: u32 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    #[serde(default)]
    pub label: String,
    /// Unscaled width; the renderer scales it to the container.
    #[serde(default = "fallback_width")]
    pub width: u32,
    #[serde(default, alias = "fixed")]
    pub frozen: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub sortable: bool,
}

fn fallback_width() -> u32 {
    FALLBACK_WIDTH
}

impl ColumnDescriptor {
    fn new(key: &str, label: &str, width: u32, frozen: bool, sortable: bool) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            width,
            frozen,
            hidden: false,
            sortable,
        }
    }

    /// Column appended for an import header with no semantic column.
    pub fn detected(header: &str) -> Self {
        let sortable = !CATEGORY_KEYS.iter().chain(RICH_TEXT_KEYS.iter()).any(|key| *key == header);
        Self::new(header, header, estimate_width(header), false, sortable)
    }

    pub fn kind(&self) -> ColumnKind {
        ColumnKind::for_key(&self.key)
    }

    /// Headers this column reads from in an import batch.
    fn source_headers(&self) -> Vec<&str> {
        let aliases = source_headers(&self.key);
        if !aliases.is_empty() {
            return aliases.to_vec();
        }
        if self.label.is_empty() {
            vec![self.key.as_str()]
        } else {
            vec![self.label.as_str()]
        }
    }
}

pub fn default_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new(SELECT_KEY, "", 50, true, false),
        ColumnDescriptor::new("img", "产品图片", 80, true, false),
        ColumnDescriptor::new("title", "产品标题", 280, true, false),
        ColumnDescriptor::new("prp", "PRP原价", 100, false, true),
        ColumnDescriptor::new("price", "前端价格", 100, false, true),
        ColumnDescriptor::new("discount", "前端折扣", 90, false, true),
        ColumnDescriptor::new("rating", "星级值", 150, false, true),
        ColumnDescriptor::new("score", "评论分数", 80, false, true),
        ColumnDescriptor::new("reviews", "评价数量", 80, false, true),
        ColumnDescriptor::new("badge", "链接打标", 140, false, true),
        ColumnDescriptor::new("pnk", "PNK码", 130, false, false),
        ColumnDescriptor::new("link", "产品链接", 90, false, false),
    ]
}

/// Header-length estimate used for freshly detected columns.
pub fn estimate_width(header: &str) -> u32 {
    let len = header.chars().count() as u32;
    len.saturating_mul(12).saturating_add(40).clamp(100, 300)
}

fn is_wide_char(ch: char) -> bool {
    matches!(ch, '\u{4e00}'..='\u{9fa5}' | '\u{3000}'..='\u{303f}' | '\u{ff00}'..='\u{ffef}')
}

/// Approximate rendered width: wide glyphs 12, others 7, plus padding.
pub fn text_width(text: &str) -> u32 {
    if text.is_empty() {
        return 100;
    }
    let glyphs: u32 = text.chars().map(|ch| if is_wide_char(ch) { 12 } else { 7 }).sum();
    glyphs + 40
}

fn content_width(kind: ColumnKind, text: &str) -> u32 {
    match kind {
        ColumnKind::Price => text_width(text).max(100),
        ColumnKind::Discount => text_width(text).max(90),
        ColumnKind::Rating => (14 * 5 + 4 * 4 + 50 + 40).max(150),
        ColumnKind::Count => text_width(text).max(80),
        ColumnKind::Code => text.chars().count() as u32 * 9 + 30,
        ColumnKind::Link => 90,
        _ => text_width(text),
    }
}

/// Width fitting the header and a sample of rows; `None` for fixed-size columns.
pub fn optimal_width(column: &ColumnDescriptor, rows: &[Row]) -> Option<u32> {
    let kind = column.kind();
    if matches!(kind, ColumnKind::Select | ColumnKind::Image) {
        return None;
    }
    let header = text_width(&column.label);
    let content = rows
        .iter()
        .take(AUTO_FIT_SAMPLE)
        .filter_map(|row| row.value(&column.key))
        .map(value_text)
        .filter(|text| !text.is_empty())
        .map(|text| content_width(kind, &text))
        .max()
        .unwrap_or(0);
    let cap = match kind {
        ColumnKind::Title => 400,
        ColumnKind::Badge => 250,
        _ => 300,
    };
    Some(header.max(content).max(AUTO_FIT_MIN).min(cap))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLayout {
    columns: Vec<ColumnDescriptor>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::new(default_columns())
    }
}

impl ColumnLayout {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let mut layout = Self { columns };
        layout.normalize();
        layout
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn visible(&self) -> impl Iterator<Item = &ColumnDescriptor> + '_ {
        self.columns.iter().filter(|column| !column.hidden)
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.key == key)
    }

    pub fn is_sortable(&self, key: &str) -> bool {
        self.get(key).is_some_and(|column| column.sortable)
    }

    /// Stable partition: frozen columns first, relative order preserved.
    fn normalize(&mut self) {
        let (mut frozen, rest): (Vec<_>, Vec<_>) =
            self.columns.drain(..).partition(|column| column.frozen);
        frozen.extend(rest);
        self.columns = frozen;
    }

    /// Appends a column for every header not already covered; returns the count added.
    pub fn auto_detect(&mut self, headers: &[String]) -> usize {
        let covered: Vec<String> = self
            .columns
            .iter()
            .filter(|column| column.key != SELECT_KEY)
            .flat_map(|column| column.source_headers())
            .map(str::to_owned)
            .collect();
        let mut added = 0;
        for header in headers {
            if covered.contains(header) || self.get(header).is_some() {
                continue;
            }
            self.columns.push(ColumnDescriptor::detected(header));
            added += 1;
        }
        if added > 0 {
            debug!(added, "detected import columns");
        }
        added
    }

    /// Fits every fittable column to `rows`.
    pub fn auto_fit(&mut self, rows: &[Row]) {
        for column in &mut self.columns {
            if let Some(width) = optimal_width(column, rows) {
                column.width = width;
            }
        }
    }

    /// Default columns in default order, then extras in import-header order.
    pub fn reset_order(&mut self, header_order: &[String]) -> bool {
        let before = self.columns.clone();
        let mut remaining = std::mem::take(&mut self.columns);
        let mut ordered = Vec::with_capacity(remaining.len());

        let mut take = |key: &str, ordered: &mut Vec<ColumnDescriptor>| {
            if let Some(index) = remaining.iter().position(|column| column.key == key) {
                ordered.push(remaining.remove(index));
            }
        };
        for default in default_columns() {
            take(&default.key, &mut ordered);
        }
        for header in header_order {
            take(header, &mut ordered);
        }
        ordered.append(&mut remaining);

        self.columns = ordered;
        self.normalize();
        self.columns != before
    }

    /// Sets a base width, floored at [`MIN_COLUMN_WIDTH`].
    pub fn resize(&mut self, key: &str, width: u32) -> bool {
        let Some(column) = self.columns.iter_mut().find(|column| column.key == key) else {
            warn!(key, "resize for unknown column ignored");
            return false;
        };
        let width = width.max(MIN_COLUMN_WIDTH);
        if column.width == width {
            return false;
        }
        column.width = width;
        true
    }

    /// Moves `from` to the position currently held by `to`.
    pub fn reorder(&mut self, from: &str, to: &str) -> bool {
        let (Some(source), Some(target)) = (self.position(from), self.position(to)) else {
            warn!(from, to, "reorder with unknown column ignored");
            return false;
        };
        if source == target {
            return false;
        }
        let before = self.columns.clone();
        let column = self.columns.remove(source);
        self.columns.insert(target, column);
        self.normalize();
        self.columns != before
    }

    /// Flips visibility; the last visible column cannot be hidden.
    pub fn toggle_hidden(&mut self, key: &str) -> bool {
        let visible = self.visible().count();
        let Some(column) = self.columns.iter_mut().find(|column| column.key == key) else {
            return false;
        };
        if !column.hidden && visible <= 1 {
            return false;
        }
        column.hidden = !column.hidden;
        true
    }

    pub fn toggle_frozen(&mut self, key: &str) -> bool {
        let Some(column) = self.columns.iter_mut().find(|column| column.key == key) else {
            return false;
        };
        column.frozen = !column.frozen;
        self.normalize();
        true
    }

    /// Reconciles a stored layout with the current columns.
    ///
    /// Stored columns that still exist keep their stored order and geometry;
    /// columns the store has never seen are appended in current order.
    pub fn merge_stored(&self, stored: Vec<ColumnDescriptor>) -> Self {
        let mut merged: Vec<ColumnDescriptor> = Vec::with_capacity(self.columns.len());
        for saved in stored {
            let Some(current) = self.get(&saved.key) else {
                continue;
            };
            if merged.iter().any(|column| column.key == saved.key) {
                continue;
            }
            merged.push(ColumnDescriptor {
                key: current.key.clone(),
                label: current.label.clone(),
                width: saved.width.max(MIN_COLUMN_WIDTH),
                frozen: saved.frozen,
                hidden: saved.hidden,
                sortable: current.sortable,
            });
        }
        for column in &self.columns {
            if !merged.iter().any(|kept| kept.key == column.key) {
                merged.push(column.clone());
            }
        }
        if merged.iter().all(|column| column.hidden)
            && let Some(first) = merged.first_mut()
        {
            first.hidden = false;
        }
        Self::new(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ColumnDescriptor, ColumnLayout, MIN_COLUMN_WIDTH, default_columns, estimate_width,
        optimal_width, text_width,
    };
    use crate::RowId;
    use crate::model::Row;
    use serde_json::json;

    fn keys(layout: &ColumnLayout) -> Vec<&str> {
        layout.columns().iter().map(|column| column.key.as_str()).collect()
    }

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn defaults_start_with_frozen_prefix() {
        let layout = ColumnLayout::default();
        let frozen: Vec<&str> = layout
            .columns()
            .iter()
            .filter(|column| column.frozen)
            .map(|column| column.key.as_str())
            .collect();
        assert_eq!(frozen, vec!["select", "img", "title"]);
        assert!(layout.is_sortable("price"));
        assert!(!layout.is_sortable("pnk"));
        assert!(!layout.is_sortable("img"));
    }

    #[test]
    fn auto_detect_appends_uncovered_headers() {
        let mut layout = ColumnLayout::default();
        let added = layout.auto_detect(&headers(&["产品标题", "前端价格", "品牌", "一级类", "详情描述"]));
        assert_eq!(added, 3);
        assert!(layout.is_sortable("品牌"));
        assert!(!layout.is_sortable("一级类"));
        assert!(!layout.is_sortable("详情描述"));
        assert_eq!(layout.columns().len(), default_columns().len() + 3);

        assert_eq!(layout.auto_detect(&headers(&["品牌"])), 0);
    }

    #[test]
    fn estimated_width_is_clamped() {
        assert_eq!(estimate_width("ab"), 100);
        assert_eq!(estimate_width("abcdefghij"), 160);
        assert_eq!(estimate_width(&"x".repeat(40)), 300);
    }

    #[test]
    fn text_width_weighs_wide_glyphs() {
        assert_eq!(text_width("ab"), 54);
        assert_eq!(text_width("品牌"), 64);
        assert_eq!(text_width(""), 100);
    }

    #[test]
    fn optimal_width_respects_caps_and_skips_fixed_columns() {
        let rows = vec![Row::new(
            RowId::new(0),
            json!({ "产品标题": "t".repeat(100), "链接打标": "b".repeat(100), "PNK码": "ABC123", "星级值": "4.5" })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        )];
        let layout = ColumnLayout::default();
        let width = |key: &str| layout.get(key).and_then(|column| optimal_width(column, &rows));
        assert_eq!(width("title"), Some(400));
        assert_eq!(width("badge"), Some(250));
        assert_eq!(width("pnk"), Some(84));
        assert_eq!(width("rating"), Some(176));
        assert_eq!(width("select"), None);
        assert_eq!(width("img"), None);
    }

    #[test]
    fn resize_floors_at_minimum() {
        let mut layout = ColumnLayout::default();
        assert!(layout.resize("price", 0));
        assert_eq!(layout.get("price").map(|column| column.width), Some(MIN_COLUMN_WIDTH));
        assert!(!layout.resize("missing", 200));
    }

    #[test]
    fn reorder_splices_to_target_position() {
        let mut layout = ColumnLayout::default();
        assert!(layout.reorder("link", "prp"));
        assert_eq!(&keys(&layout)[..5], &["select", "img", "title", "link", "prp"]);
    }

    #[test]
    fn reorder_cannot_break_frozen_prefix() {
        let mut layout = ColumnLayout::default();
        layout.reorder("price", "img");
        let first_unfrozen = layout
            .columns()
            .iter()
            .position(|column| !column.frozen)
            .unwrap_or(0);
        assert!(layout.columns()[first_unfrozen..].iter().all(|column| !column.frozen));
        assert_eq!(keys(&layout)[3], "price");
    }

    #[test]
    fn freezing_moves_column_into_prefix() {
        let mut layout = ColumnLayout::default();
        assert!(layout.toggle_frozen("badge"));
        assert_eq!(&keys(&layout)[..4], &["select", "img", "title", "badge"]);
        assert!(layout.toggle_frozen("img"));
        assert_eq!(&keys(&layout)[..4], &["select", "title", "badge", "img"]);
    }

    #[test]
    fn last_visible_column_cannot_be_hidden() {
        let mut layout = ColumnLayout::new(vec![
            ColumnDescriptor::detected("a"),
            ColumnDescriptor::detected("b"),
        ]);
        assert!(layout.toggle_hidden("a"));
        assert!(!layout.toggle_hidden("b"));
        assert!(layout.toggle_hidden("a"));
        assert_eq!(layout.visible().count(), 2);
    }

    #[test]
    fn reset_order_restores_defaults_then_header_order() {
        let mut layout = ColumnLayout::default();
        layout.auto_detect(&headers(&["品牌", "一级类"]));
        layout.reorder("一级类", "prp");
        layout.reorder("品牌", "select");
        assert!(layout.reset_order(&headers(&["品牌", "一级类"])));
        let expected: Vec<String> = default_columns()
            .into_iter()
            .map(|column| column.key)
            .chain(headers(&["品牌", "一级类"]))
            .collect();
        assert_eq!(keys(&layout), expected);
    }

    #[test]
    fn merge_keeps_matching_and_appends_new() -> anyhow::Result<()> {
        let mut current = ColumnLayout::default();
        current.auto_detect(&headers(&["品牌"]));
        let stored: Vec<ColumnDescriptor> = serde_json::from_value(json!([
            { "key": "price", "width": 180 },
            { "key": "gone", "width": 90 },
            { "key": "select", "fixed": true, "width": 50 },
            { "key": "title", "fixed": true, "width": 10, "hidden": true },
        ]))?;

        let merged = current.merge_stored(stored);
        assert_eq!(&keys(&merged)[..4], &["select", "title", "img", "price"]);
        assert!(merged.get("gone").is_none());
        assert!(merged.get("品牌").is_some());
        assert_eq!(merged.get("price").map(|column| column.width), Some(180));
        assert_eq!(merged.get("title").map(|column| column.width), Some(MIN_COLUMN_WIDTH));
        assert_eq!(merged.get("price").map(|column| column.label.as_str()), Some("前端价格"));
        assert_eq!(merged.columns().len(), current.columns().len());
        Ok(())
    }

    #[test]
    fn layout_serializes_as_flat_array() -> anyhow::Result<()> {
        let layout = ColumnLayout::default();
        let value = serde_json::to_value(&layout)?;
        let first = value
            .as_array()
            .and_then(|columns| columns.first())
            .cloned()
            .unwrap_or_default();
        assert_eq!(first["key"], "select");
        assert_eq!(first["frozen"], true);
        let back: ColumnLayout = serde_json::from_value(value)?;
        assert_eq!(back, layout);
        Ok(())
    }
}
