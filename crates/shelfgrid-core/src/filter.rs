// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Filter pipeline: `(rows, params) -> ids`, total over malformed input.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::ids::RowId;
use crate::model::{BRAND_KEY, CATEGORY_KEYS, Row, StatusTag, value_text};
use crate::parse::{parse_bound, parse_number, parse_price, parse_stars};

const SEARCH_KEYS: [&str; 3] = ["title", "badge", "pnk"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RatingBucket {
    #[default]
    #[serde(rename = "0")]
    Any,
    #[serde(rename = "5star")]
    FiveStar,
    #[serde(rename = "4star+")]
    FourPlus,
    #[serde(rename = "3star+")]
    ThreePlus,
    #[serde(rename = "3star-")]
    BelowThree,
}

impl RatingBucket {
    pub const ALL: [Self; 5] = [
        Self::Any,
        Self::FiveStar,
        Self::FourPlus,
        Self::ThreePlus,
        Self::BelowThree,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "0" => Some(Self::Any),
            "5star" => Some(Self::FiveStar),
            "4star+" => Some(Self::FourPlus),
            "3star+" => Some(Self::ThreePlus),
            "3star-" => Some(Self::BelowThree),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "any rating",
            Self::FiveStar => "top 25%",
            Self::FourPlus => "top 50%",
            Self::ThreePlus => "top 75%",
            Self::BelowThree => "bottom 25%",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|bucket| *bucket == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    None,
    Pushed,
    Deleted,
}

impl StatusFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::None, Self::Pushed, Self::Deleted];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "all" => Some(Self::All),
            other => StatusTag::parse(other).map(Self::only),
        }
    }

    const fn only(tag: StatusTag) -> Self {
        match tag {
            StatusTag::None => Self::None,
            StatusTag::Pushed => Self::Pushed,
            StatusTag::Deleted => Self::Deleted,
        }
    }

    pub fn matches(self, tag: StatusTag) -> bool {
        match self {
            Self::All => true,
            Self::None => tag == StatusTag::None,
            Self::Pushed => tag == StatusTag::Pushed,
            Self::Deleted => tag == StatusTag::Deleted,
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|status| *status == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterParams {
    pub search: String,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub reviews_min: Option<f64>,
    pub score_min: Option<f64>,
    pub rating: RatingBucket,
    pub status: StatusFilter,
}

impl FilterParams {
    /// Applies every field present in `patch`; returns whether anything changed.
    pub fn apply_patch(&mut self, patch: &FilterPatch) -> bool {
        let before = self.clone();
        if let Some(search) = &patch.search {
            search.clone_into(&mut self.search);
        }
        if let Some(bound) = patch.price_min {
            self.price_min = bound;
        }
        if let Some(bound) = patch.price_max {
            self.price_max = bound;
        }
        if let Some(bound) = patch.reviews_min {
            self.reviews_min = bound;
        }
        if let Some(bound) = patch.score_min {
            self.score_min = bound;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        *self != before
    }

    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    fn query(&self) -> String {
        self.search.trim().to_lowercase()
    }
}

/// Partial update to [`FilterParams`].
///
/// Deserializes from the filter bar's JSON shape (`priceMin`, `rateMin`, ...).
/// Unknown keys and unknown selector values are ignored; a bound given as
/// blank or non-numeric text clears that bound.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    #[serde(default, deserialize_with = "search_field")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "bound_field")]
    pub price_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "bound_field")]
    pub price_max: Option<Option<f64>>,
    #[serde(default, deserialize_with = "bound_field")]
    pub reviews_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "bound_field")]
    pub score_min: Option<Option<f64>>,
    #[serde(default, rename = "rateMin", deserialize_with = "rating_field")]
    pub rating: Option<RatingBucket>,
    #[serde(default, rename = "profitStatus", deserialize_with = "status_field")]
    pub status: Option<StatusFilter>,
}

impl FilterPatch {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    /// Resets every axis to its default.
    pub fn reset() -> Self {
        Self {
            search: Some(String::new()),
            price_min: Some(None),
            price_max: Some(None),
            reviews_min: Some(None),
            score_min: Some(None),
            rating: Some(RatingBucket::Any),
            status: Some(StatusFilter::All),
        }
    }

    /// Combines two pending patches; fields in `later` win.
    pub fn merge(self, later: Self) -> Self {
        Self {
            search: later.search.or(self.search),
            price_min: later.price_min.or(self.price_min),
            price_max: later.price_max.or(self.price_max),
            reviews_min: later.reviews_min.or(self.reviews_min),
            score_min: later.score_min.or(self.score_min),
            rating: later.rating.or(self.rating),
            status: later.status.or(self.status),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoundInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl BoundInput {
    fn value(self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(number).filter(|value| value.is_finite()),
            Self::Text(text) => parse_bound(&text),
            Self::Other(_) => None,
        }
    }
}

fn bound_field<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<BoundInput>::deserialize(deserializer)?;
    Ok(Some(input.and_then(BoundInput::value)))
}

fn search_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(Some(input.as_ref().map(value_text).unwrap_or_default()))
}

fn selector_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(input.as_ref().map(value_text))
}

fn rating_field<'de, D>(deserializer: D) -> Result<Option<RatingBucket>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(selector_text(deserializer)?.and_then(|text| RatingBucket::parse(&text)))
}

fn status_field<'de, D>(deserializer: D) -> Result<Option<StatusFilter>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(selector_text(deserializer)?.and_then(|text| StatusFilter::parse(&text)))
}

/// Quartile thresholds over the positive ratings of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingPercentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

impl RatingPercentiles {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut ratings: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.value("rating").and_then(parse_stars))
            .filter(|rating| *rating > 0.0)
            .collect();
        if ratings.is_empty() {
            return Self::default();
        }
        ratings.sort_by(f64::total_cmp);
        Self {
            p25: percentile(&ratings, 25.0),
            p50: percentile(&ratings, 50.0),
            p75: percentile(&ratings, 75.0),
        }
    }

    fn admits(self, bucket: RatingBucket, rating: f64) -> bool {
        match bucket {
            RatingBucket::Any => true,
            RatingBucket::FiveStar => rating >= self.p75,
            RatingBucket::FourPlus => rating >= self.p50,
            RatingBucket::ThreePlus => rating >= self.p25,
            RatingBucket::BelowThree => rating < self.p25,
        }
    }
}

/// Nearest-rank percentile over an ascending slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

/// How a filter pass relates to the full dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The dataset has rows but none matched.
    NoMatches,
    /// Some but not all rows matched.
    Narrowed(usize),
    /// Every row matched, including the empty-dataset case.
    Complete,
}

impl FilterOutcome {
    pub const fn classify(matched: usize, total: usize) -> Self {
        if matched == 0 && total > 0 {
            Self::NoMatches
        } else if matched < total {
            Self::Narrowed(matched)
        } else {
            Self::Complete
        }
    }
}

/// Returns the ids of `rows` passing every active predicate, in dataset order.
pub fn apply(rows: &[Row], params: &FilterParams) -> Vec<RowId> {
    let query = params.query();
    let percentiles = (params.rating != RatingBucket::Any).then(|| RatingPercentiles::from_rows(rows));

    let matched: Vec<RowId> = rows
        .iter()
        .filter(|row| matches_row(row, params, &query, percentiles))
        .map(Row::id)
        .collect();
    debug!(
        total = rows.len(),
        matched = matched.len(),
        "filter pass"
    );
    matched
}

fn matches_row(
    row: &Row,
    params: &FilterParams,
    query: &str,
    percentiles: Option<RatingPercentiles>,
) -> bool {
    if !query.is_empty() && !search_haystack(row).contains(query) {
        return false;
    }

    if params.price_min.is_some() || params.price_max.is_some() {
        let price = row.value("price").and_then(parse_price);
        if !within(price, params.price_min, params.price_max) {
            return false;
        }
    }
    if params.reviews_min.is_some() {
        let reviews = row.value("reviews").and_then(parse_number);
        if !within(reviews, params.reviews_min, None) {
            return false;
        }
    }
    if params.score_min.is_some() {
        let score = row.value("score").and_then(parse_number);
        if !within(score, params.score_min, None) {
            return false;
        }
    }

    if let Some(percentiles) = percentiles {
        let Some(rating) = row.value("rating").and_then(parse_stars) else {
            return false;
        };
        if !percentiles.admits(params.rating, rating) {
            return false;
        }
    }

    params.status.matches(row.status())
}

/// Unparsable values never satisfy an active bound.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(value) = value else {
        return false;
    };
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

fn search_haystack(row: &Row) -> String {
    let keys = SEARCH_KEYS
        .iter()
        .chain(CATEGORY_KEYS.iter())
        .chain(std::iter::once(&BRAND_KEY));
    let parts: Vec<String> = keys
        .filter_map(|key| row.value(key))
        .map(|value| value_text(value).to_lowercase())
        .filter(|text| !text.is_empty())
        .collect();
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::{
        FilterOutcome, FilterParams, FilterPatch, RatingBucket, RatingPercentiles, StatusFilter,
        apply, percentile,
    };
    use crate::model::{Row, StatusTag};
    use crate::RowId;
    use serde_json::{Value, json};

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                Row::new(RowId::new(index), value.as_object().cloned().unwrap_or_default())
            })
            .collect()
    }

    fn ids(values: &[usize]) -> Vec<RowId> {
        values.iter().copied().map(RowId::new).collect()
    }

    #[test]
    fn search_is_case_insensitive_over_searchable_fields() {
        let data = rows(vec![
            json!({ "产品标题": "Abcdef Pro" }),
            json!({ "产品标题": "Xyz" }),
            json!({ "产品标题": "Other", "品牌": "ABC Labs" }),
            json!({ "产品标题": "Hidden", "详情描述": "abc" }),
        ]);
        let params = FilterParams {
            search: "  aBc ".to_owned(),
            ..FilterParams::default()
        };
        assert_eq!(apply(&data, &params), ids(&[0, 2]));
    }

    #[test]
    fn price_bounds_exclude_unparsable_values() {
        let data = rows(vec![
            json!({ "前端价格": "54,93 Lei" }),
            json!({ "前端价格": "abc" }),
            json!({ "前端价格": "12.00" }),
            json!({}),
        ]);
        let params = FilterParams {
            price_min: Some(50.0),
            ..FilterParams::default()
        };
        assert_eq!(apply(&data, &params), ids(&[0]));

        let capped = FilterParams {
            price_max: Some(50.0),
            ..FilterParams::default()
        };
        assert_eq!(apply(&data, &capped), ids(&[2]));
    }

    #[test]
    fn count_and_score_minimums_apply_independently() {
        let data = rows(vec![
            json!({ "评价数量": "120", "评论分数": "4,6" }),
            json!({ "评价数量": 8, "评论分数": "4.9" }),
            json!({ "评价数量": "n/a", "评论分数": 5 }),
        ]);
        let params = FilterParams {
            reviews_min: Some(10.0),
            score_min: Some(4.5),
            ..FilterParams::default()
        };
        assert_eq!(apply(&data, &params), ids(&[0]));
    }

    #[test]
    fn rating_buckets_follow_dataset_quartiles() {
        let data = rows(vec![
            json!({ "星级值": "1" }),
            json!({ "星级值": "2" }),
            json!({ "星级值": "3" }),
            json!({ "星级值": "4" }),
            json!({ "星级值": "junk" }),
        ]);
        let percentiles = RatingPercentiles::from_rows(&data);
        // "1" is a fraction of one and scales to 5 stars.
        assert_eq!(percentiles.p25, 2.0);
        assert_eq!(percentiles.p50, 3.0);
        assert_eq!(percentiles.p75, 4.0);

        let top = FilterParams {
            rating: RatingBucket::FiveStar,
            ..FilterParams::default()
        };
        assert_eq!(apply(&data, &top), ids(&[0, 3]));

        let bottom = FilterParams {
            rating: RatingBucket::BelowThree,
            ..FilterParams::default()
        };
        assert_eq!(apply(&data, &bottom), Vec::<RowId>::new());
    }

    #[test]
    fn percentile_uses_nearest_rank() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 25.0), 2.0);
        assert_eq!(percentile(&values, 50.0), 3.0);
        assert_eq!(percentile(&values, 75.0), 4.0);
        assert_eq!(percentile(&[], 75.0), 0.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
    }

    #[test]
    fn status_filter_matches_exact_tag() {
        let mut data = rows(vec![json!({}), json!({}), json!({})]);
        data[1].set_status(StatusTag::Pushed);
        data[2].set_status(StatusTag::Deleted);

        for (status, expected) in [
            (StatusFilter::All, ids(&[0, 1, 2])),
            (StatusFilter::None, ids(&[0])),
            (StatusFilter::Pushed, ids(&[1])),
            (StatusFilter::Deleted, ids(&[2])),
        ] {
            let params = FilterParams {
                status,
                ..FilterParams::default()
            };
            assert_eq!(apply(&data, &params), expected, "{status:?}");
        }
    }

    #[test]
    fn patch_ignores_unknown_keys_and_clears_blank_bounds() -> anyhow::Result<()> {
        let patch: FilterPatch = serde_json::from_value(json!({
            "priceMin": "50",
            "priceMax": "",
            "scoreMin": 4.5,
            "rateMin": "weird",
            "profitStatus": "pushed",
            "somethingElse": true,
        }))?;
        assert_eq!(patch.price_min, Some(Some(50.0)));
        assert_eq!(patch.price_max, Some(None));
        assert_eq!(patch.score_min, Some(Some(4.5)));
        assert_eq!(patch.reviews_min, None);
        assert_eq!(patch.rating, None);
        assert_eq!(patch.status, Some(StatusFilter::Pushed));

        let mut params = FilterParams {
            price_max: Some(90.0),
            ..FilterParams::default()
        };
        assert!(params.apply_patch(&patch));
        assert_eq!(params.price_min, Some(50.0));
        assert_eq!(params.price_max, None);
        assert!(!params.apply_patch(&patch));
        Ok(())
    }

    #[test]
    fn merged_patches_keep_latest_field_values() {
        let first = FilterPatch {
            price_min: Some(Some(10.0)),
            ..FilterPatch::search("ab")
        };
        let merged = first.merge(FilterPatch::search("abc"));
        assert_eq!(merged.search.as_deref(), Some("abc"));
        assert_eq!(merged.price_min, Some(Some(10.0)));
    }

    #[test]
    fn reset_patch_restores_defaults() {
        let mut params = FilterParams {
            search: "x".to_owned(),
            score_min: Some(1.0),
            rating: RatingBucket::FourPlus,
            status: StatusFilter::Deleted,
            ..FilterParams::default()
        };
        params.apply_patch(&FilterPatch::reset());
        assert!(!params.is_active());
    }

    #[test]
    fn outcome_classifies_against_dataset_size() {
        assert_eq!(FilterOutcome::classify(0, 10), FilterOutcome::NoMatches);
        assert_eq!(FilterOutcome::classify(4, 10), FilterOutcome::Narrowed(4));
        assert_eq!(FilterOutcome::classify(10, 10), FilterOutcome::Complete);
        assert_eq!(FilterOutcome::classify(0, 0), FilterOutcome::Complete);
    }
}
