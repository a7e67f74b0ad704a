// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::RowId;

/// One imported record: arbitrary header -> value pairs in header order.
pub type Record = serde_json::Map<String, Value>;

pub const SELECT_KEY: &str = "select";

const FIELD_ALIASES: [(&str, &[&str]); 11] = [
    ("img", &["产品图片"]),
    ("title", &["产品标题"]),
    ("prp", &["PRP原价"]),
    ("price", &["前端价格"]),
    ("discount", &["前端折扣"]),
    ("rating", &["星级值"]),
    ("score", &["评论分数"]),
    ("reviews", &["评价数量"]),
    ("badge", &["链接打标"]),
    ("pnk", &["PNK码"]),
    ("link", &["产品链接"]),
];

pub const CATEGORY_KEYS: [&str; 5] = ["一级类", "二级类", "三级类", "四级类", "五级类"];
pub const BRAND_KEY: &str = "品牌";
pub const RICH_TEXT_KEYS: [&str; 2] = ["详情描述", "规格详情"];

/// Source headers a semantic column key reads from, in priority order.
pub fn source_headers(key: &str) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, headers)| *headers)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTag {
    #[default]
    None,
    Pushed,
    Deleted,
}

impl StatusTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pushed => "pushed",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "pushed" => Some(Self::Pushed),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    status: StatusTag,
    record: Record,
}

impl Row {
    pub fn new(id: RowId, record: Record) -> Self {
        Self {
            id,
            status: StatusTag::None,
            record,
        }
    }

    pub const fn id(&self) -> RowId {
        self.id
    }

    pub const fn status(&self) -> StatusTag {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: StatusTag) {
        self.status = status;
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Resolves a column key through the alias table, then as a raw header.
    pub fn value(&self, key: &str) -> Option<&Value> {
        source_headers(key)
            .iter()
            .find_map(|header| self.record.get(*header))
            .or_else(|| self.record.get(key))
    }

    /// Display text of a field; absent and null fields are empty.
    pub fn text(&self, key: &str) -> String {
        self.value(key).map(value_text).unwrap_or_default()
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// `key == None` keeps the filtered set in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// Same key flips the direction, a new key starts ascending.
    pub fn clicked(&self, key: &str) -> Self {
        let direction = if self.key.as_deref() == Some(key) {
            self.direction.flipped()
        } else {
            SortDirection::Asc
        };
        Self {
            key: Some(key.to_owned()),
            direction,
        }
    }
}

/// Presentation and comparison category of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Select,
    Image,
    Title,
    Price,
    Discount,
    Rating,
    Count,
    Badge,
    Code,
    Link,
    RichText,
    Text,
}

impl ColumnKind {
    pub fn for_key(key: &str) -> Self {
        match key {
            SELECT_KEY => Self::Select,
            "img" => Self::Image,
            "title" => Self::Title,
            "prp" | "price" => Self::Price,
            "discount" => Self::Discount,
            "rating" => Self::Rating,
            "score" | "reviews" => Self::Count,
            "badge" => Self::Badge,
            "pnk" => Self::Code,
            "link" => Self::Link,
            key if RICH_TEXT_KEYS.iter().any(|rich| *rich == key) => Self::RichText,
            _ => Self::Text,
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Discount | Self::Rating | Self::Count)
    }

    pub const fn highlights_search(self) -> bool {
        matches!(self, Self::Title | Self::Badge | Self::Code)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnKind, Row, SortDirection, SortState, StatusTag, source_headers};
    use crate::RowId;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        let record = value.as_object().cloned().unwrap_or_default();
        Row::new(RowId::new(0), record)
    }

    #[test]
    fn value_prefers_aliased_header_over_raw_key() {
        let row = row(json!({ "产品标题": "Aliased", "title": "Raw" }));
        assert_eq!(row.text("title"), "Aliased");
    }

    #[test]
    fn value_falls_back_to_raw_key_for_dynamic_columns() {
        let row = row(json!({ "品牌": "Acme", "title": "Raw" }));
        assert_eq!(row.text("品牌"), "Acme");
        assert_eq!(row.text("title"), "Raw");
        assert_eq!(row.text("missing"), "");
    }

    #[test]
    fn text_stringifies_numbers_and_nested_values() {
        let row = row(json!({ "评价数量": 42, "tags": ["a", "b"], "empty": null }));
        assert_eq!(row.text("reviews"), "42");
        assert_eq!(row.text("tags"), "[\"a\",\"b\"]");
        assert_eq!(row.text("empty"), "");
    }

    #[test]
    fn clicking_same_key_flips_and_new_key_resets() {
        let initial = SortState::default();
        let first = initial.clicked("price");
        assert_eq!(first.direction, SortDirection::Asc);
        let second = first.clicked("price");
        assert_eq!(second.direction, SortDirection::Desc);
        let third = second.clicked("price");
        assert_eq!(third.direction, SortDirection::Asc);
        let other = second.clicked("rating");
        assert_eq!(other.key.as_deref(), Some("rating"));
        assert_eq!(other.direction, SortDirection::Asc);
    }

    #[test]
    fn column_kinds_follow_semantic_keys() {
        assert_eq!(ColumnKind::for_key("price"), ColumnKind::Price);
        assert_eq!(ColumnKind::for_key("prp"), ColumnKind::Price);
        assert_eq!(ColumnKind::for_key("reviews"), ColumnKind::Count);
        assert_eq!(ColumnKind::for_key("详情描述"), ColumnKind::RichText);
        assert_eq!(ColumnKind::for_key("anything"), ColumnKind::Text);
        assert!(source_headers("anything").is_empty());
    }

    #[test]
    fn status_tag_round_trips_labels() {
        for tag in [StatusTag::None, StatusTag::Pushed, StatusTag::Deleted] {
            assert_eq!(StatusTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(StatusTag::parse("other"), None);
    }
}
