// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deferred image loading keyed by row id.
//!
//! Visible image cells register interest with [`ImageLoader::want`]; nothing
//! is requested until the host calls [`ImageLoader::flush`], which it does
//! once scrolling settles. Resolved sources are cached per row so scrolling
//! back never requests the same row twice.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use shelfgrid_core::RowId;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Unrequested,
    Queued,
    Loading,
    Loaded(String),
    /// Shown as a placeholder; never retried for the same dataset.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub id: RowId,
    pub src: String,
}

#[derive(Debug, Default)]
pub struct ImageLoader {
    loaded: HashMap<RowId, String>,
    failed: BTreeSet<RowId>,
    queued: BTreeMap<RowId, String>,
    in_flight: BTreeMap<RowId, String>,
}

/// First http(s) URL in a cell value, else the trimmed value itself.
pub fn extract_image_source(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let start = raw.find("https://").or_else(|| raw.find("http://"));
    let Some(start) = start else {
        return Some(raw.to_owned());
    };
    let url: String = raw[start..]
        .chars()
        .take_while(|ch| !ch.is_whitespace() && *ch != '"' && *ch != ',')
        .collect();
    Some(url)
}

impl ImageLoader {
    pub fn state(&self, id: RowId) -> ImageState {
        if let Some(src) = self.loaded.get(&id) {
            ImageState::Loaded(src.clone())
        } else if self.failed.contains(&id) {
            ImageState::Failed
        } else if self.in_flight.contains_key(&id) {
            ImageState::Loading
        } else if self.queued.contains_key(&id) {
            ImageState::Queued
        } else {
            ImageState::Unrequested
        }
    }

    /// Registers a visible image cell; already known rows are left alone.
    pub fn want(&mut self, id: RowId, src: &str) {
        if self.loaded.contains_key(&id)
            || self.failed.contains(&id)
            || self.in_flight.contains_key(&id)
        {
            return;
        }
        self.queued.insert(id, src.to_owned());
    }

    pub fn has_queued(&self) -> bool {
        !self.queued.is_empty()
    }

    /// Moves every queued row in flight and returns the requests to issue.
    pub fn flush(&mut self) -> Vec<ImageRequest> {
        let queued = std::mem::take(&mut self.queued);
        let mut requests = Vec::with_capacity(queued.len());
        for (id, src) in queued {
            self.in_flight.insert(id, src.clone());
            requests.push(ImageRequest { id, src });
        }
        requests
    }

    /// Drops pending work for rows that left the viewport.
    pub fn retain_visible(&mut self, visible: &BTreeSet<RowId>) -> Vec<RowId> {
        let mut cancelled: Vec<RowId> = self
            .queued
            .keys()
            .chain(self.in_flight.keys())
            .filter(|id| !visible.contains(*id))
            .copied()
            .collect();
        cancelled.sort();
        cancelled.dedup();
        for id in &cancelled {
            self.queued.remove(id);
            self.in_flight.remove(id);
        }
        cancelled
    }

    /// Completes an in-flight request; late results for cancelled rows are ignored.
    pub fn resolve<E: std::fmt::Display>(&mut self, id: RowId, result: Result<String, E>) {
        if self.in_flight.remove(&id).is_none() {
            return;
        }
        match result {
            Ok(src) => {
                self.loaded.insert(id, src);
            }
            Err(error) => {
                debug!(%id, %error, "image unavailable; using placeholder");
                self.failed.insert(id);
            }
        }
    }

    pub fn cached(&self) -> usize {
        self.loaded.len()
    }

    /// Forgets everything, for a new dataset.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
