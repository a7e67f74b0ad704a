// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Column-semantic cell descriptors.
//!
//! Formatting never fails: absent or blank values become
//! [`CellContent::Placeholder`] and broken images become a placeholder state.

use serde_json::Value;
use shelfgrid_core::parse::parse_rating_percent;
use shelfgrid_core::{ColumnKind, Row, Selection, StatusTag, value_text};

use crate::highlight::{HighlightCache, Segment};
use crate::images::{ImageLoader, ImageState, extract_image_source};

pub const PLACEHOLDER: &str = "-";
pub const BADGE_PALETTE_SIZE: usize = 8;
const STAR_COUNT: u8 = 5;
const HALF_STAR_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Placeholder,
    Select { checked: bool, status: StatusTag },
    Image(ImageState),
    Text(Vec<Segment>),
    Price { text: String, current: bool },
    Discount(String),
    Rating(StarRating),
    Number(String),
    Badge { segments: Vec<Segment>, tone: BadgeTone },
    Code(Vec<Segment>),
    Link(String),
    /// Long-form content shown on demand; carries its length in chars.
    RichText { chars: usize },
}

/// Five-unit rating derived from a 0-100 percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub percent: f64,
}

impl StarRating {
    pub fn from_percent(percent: f64) -> Self {
        let percent = percent.clamp(0.0, 100.0);
        let stars = percent / 20.0;
        let full = stars.floor();
        Self {
            full: full as u8,
            half: stars - full >= HALF_STAR_THRESHOLD,
            percent,
        }
    }

    pub fn glyphs(&self) -> String {
        (0..STAR_COUNT)
            .map(|slot| {
                if slot < self.full {
                    '★'
                } else if slot == self.full && self.half {
                    '½'
                } else {
                    '☆'
                }
            })
            .collect()
    }

    pub fn label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    TopFavorite,
    SuperPret,
    Palette(usize),
}

/// 32-bit rolling hash over UTF-16 units, `h = h * 31 + unit`.
pub fn string_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0_i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    })
}

/// Display label and tone for a badge value.
pub fn badge_tone(text: &str) -> (String, BadgeTone) {
    let text = text.trim();
    let lower = text.to_lowercase();
    if text.contains("Top") || lower.contains("top favorite") {
        return ("Top Favorite".to_owned(), BadgeTone::TopFavorite);
    }
    if text.contains("Super") || lower.contains("super pret") {
        return ("Super Pret".to_owned(), BadgeTone::SuperPret);
    }
    let index = i64::from(string_hash(text)).unsigned_abs() % BADGE_PALETTE_SIZE as u64;
    (text.to_owned(), BadgeTone::Palette(index as usize))
}

/// Price text without the currency word or any stray symbols.
pub fn format_price_text(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == ',')
        .collect()
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Per-render inputs shared across cells.
#[derive(Debug)]
pub struct CellContext<'a> {
    pub selection: &'a Selection,
    pub highlight: &'a mut HighlightCache,
    pub images: &'a mut ImageLoader,
}

impl CellContext<'_> {
    fn segments(&mut self, text: &str, kind: ColumnKind) -> Vec<Segment> {
        if kind.highlights_search() {
            self.highlight.segments(text)
        } else {
            vec![Segment {
                text: text.to_owned(),
                matched: false,
            }]
        }
    }
}

pub fn format_cell(row: &Row, key: &str, kind: ColumnKind, context: &mut CellContext<'_>) -> CellContent {
    if kind == ColumnKind::Select {
        return CellContent::Select {
            checked: context.selection.contains(row.id()),
            status: row.status(),
        };
    }

    let value = row.value(key);
    if is_blank(value) {
        return CellContent::Placeholder;
    }
    let text = value.map(value_text).unwrap_or_default();

    match kind {
        ColumnKind::Select => CellContent::Placeholder,
        ColumnKind::Image => {
            let Some(src) = extract_image_source(&text) else {
                return CellContent::Placeholder;
            };
            context.images.want(row.id(), &src);
            CellContent::Image(context.images.state(row.id()))
        }
        ColumnKind::Price => CellContent::Price {
            text: format_price_text(&text),
            current: key == "price",
        },
        ColumnKind::Discount => CellContent::Discount(text),
        ColumnKind::Rating => {
            let percent = value.and_then(parse_rating_percent).unwrap_or(0.0);
            CellContent::Rating(StarRating::from_percent(percent))
        }
        ColumnKind::Count => CellContent::Number(text),
        ColumnKind::Badge => {
            let (label, tone) = badge_tone(&text);
            CellContent::Badge {
                segments: context.segments(&label, kind),
                tone,
            }
        }
        ColumnKind::Code => CellContent::Code(context.segments(&text, kind)),
        ColumnKind::Link => CellContent::Link(text),
        ColumnKind::RichText => CellContent::RichText {
            chars: text.chars().count(),
        },
        ColumnKind::Title | ColumnKind::Text => CellContent::Text(context.segments(&text, kind)),
    }
}

impl CellContent {
    /// Plain-text rendition for character-cell hosts.
    pub fn display_text(&self) -> String {
        let joined = |segments: &[Segment]| -> String {
            segments.iter().map(|segment| segment.text.as_str()).collect()
        };
        match self {
            Self::Placeholder => PLACEHOLDER.to_owned(),
            Self::Select { checked, status } => {
                let mark = if *checked { "[x]" } else { "[ ]" };
                match status {
                    StatusTag::None => mark.to_owned(),
                    StatusTag::Pushed => format!("{mark}✓"),
                    StatusTag::Deleted => format!("{mark}✗"),
                }
            }
            Self::Image(state) => match state {
                ImageState::Loaded(_) => "▣".to_owned(),
                ImageState::Failed => "▢".to_owned(),
                ImageState::Unrequested | ImageState::Queued | ImageState::Loading => {
                    "…".to_owned()
                }
            },
            Self::Text(segments) | Self::Code(segments) => joined(segments),
            Self::Badge { segments, .. } => joined(segments),
            Self::Price { text, .. } | Self::Discount(text) | Self::Number(text) => text.clone(),
            Self::Rating(stars) => format!("{} {}", stars.glyphs(), stars.label()),
            Self::Link(_) => "open ↗".to_owned(),
            Self::RichText { chars } => format!("view ({chars})"),
        }
    }
}
