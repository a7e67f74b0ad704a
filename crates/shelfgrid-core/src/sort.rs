// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use tracing::debug;

use crate::ids::RowId;
use crate::model::{Row, SortDirection, value_text};
use crate::parse::{parse_number, parse_price};

/// Sorts above this many rows run in an idle slot instead of inline.
pub const DEFAULT_DEFER_THRESHOLD: usize = 5_000;

/// Comparator family chosen by the column's semantic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Price,
    Numeric,
    Text,
}

impl Comparator {
    pub fn for_key(key: &str) -> Self {
        match key {
            "prp" | "price" => Self::Price,
            "discount" | "rating" | "reviews" | "score" => Self::Numeric,
            _ => Self::Text,
        }
    }

    fn key_of(self, row: &Row, key: &str) -> SortValue {
        let value = row.value(key);
        match self {
            Self::Price => SortValue::Number(value.and_then(parse_price)),
            Self::Numeric => SortValue::Number(value.and_then(parse_number)),
            Self::Text => SortValue::Text(value.map(value_text).unwrap_or_default().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(Option<f64>),
    Text(String),
}

impl SortValue {
    fn is_null(&self) -> bool {
        matches!(self, Self::Number(None))
    }

    fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(Some(left)), Self::Number(Some(right))) => left.total_cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            _ => Ordering::Equal,
        }
    }
}

pub fn should_defer(len: usize, threshold: usize) -> bool {
    len > threshold
}

/// Stable in-place sort of `order` by `key`.
///
/// Unparsable numbers sort after every parsed value in both directions;
/// ties keep their incoming order.
pub fn sort(rows: &[Row], order: &mut [RowId], key: &str, direction: SortDirection) {
    let comparator = Comparator::for_key(key);
    let mut keyed: Vec<(SortValue, RowId)> = order
        .iter()
        .map(|id| {
            let value = rows
                .get(id.get())
                .map(|row| comparator.key_of(row, key))
                .unwrap_or(SortValue::Number(None));
            (value, *id)
        })
        .collect();

    keyed.sort_by(|(left, _), (right, _)| match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Asc => left.cmp_value(right),
            SortDirection::Desc => left.cmp_value(right).reverse(),
        },
    });

    for (slot, (_, id)) in order.iter_mut().zip(keyed) {
        *slot = id;
    }
    debug!(key, ?direction, rows = order.len(), "sorted view");
}
