// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{HashMap, VecDeque};

pub const HIGHLIGHT_CACHE_CAPACITY: usize = 1_000;

/// A run of cell text, marked when it matches the search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            matched: false,
        }
    }
}

/// Splits `text` around every case-insensitive occurrence of `term`.
pub fn highlight(text: &str, term: &str) -> Vec<Segment> {
    let needle: Vec<char> = term.trim().chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() || text.is_empty() {
        return vec![Segment::plain(text)];
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut index = 0;
    while index < chars.len() {
        let Some(consumed) = match_at(&chars[index..], &needle) else {
            index += 1;
            continue;
        };
        let start = chars[index].0;
        let end = chars
            .get(index + consumed)
            .map_or(text.len(), |(offset, _)| *offset);
        if plain_start < start {
            segments.push(Segment::plain(&text[plain_start..start]));
        }
        segments.push(Segment {
            text: text[start..end].to_owned(),
            matched: true,
        });
        plain_start = end;
        index += consumed;
    }
    if plain_start < text.len() {
        segments.push(Segment::plain(&text[plain_start..]));
    }
    segments
}

/// Source chars consumed when `needle` matches at the head of `chars`.
fn match_at(chars: &[(usize, char)], needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    let mut consumed = 0;
    while matched < needle.len() {
        let (_, ch) = chars.get(consumed)?;
        for lower in ch.to_lowercase() {
            if needle.get(matched) != Some(&lower) {
                return None;
            }
            matched += 1;
        }
        consumed += 1;
    }
    Some(consumed)
}

/// Bounded `(text, term)` cache; the term is fixed until [`Self::set_term`].
#[derive(Debug)]
pub struct HighlightCache {
    term: String,
    capacity: usize,
    entries: HashMap<String, Vec<Segment>>,
    order: VecDeque<String>,
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::with_capacity(HIGHLIGHT_CACHE_CAPACITY)
    }
}

impl HighlightCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            term: String::new(),
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Switching terms invalidates every cached entry.
    pub fn set_term(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term == self.term {
            return false;
        }
        self.term = term.to_owned();
        self.entries.clear();
        self.order.clear();
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn segments(&mut self, text: &str) -> Vec<Segment> {
        if self.term.is_empty() {
            return vec![Segment::plain(text)];
        }
        if let Some(cached) = self.entries.get(text) {
            return cached.clone();
        }

        let segments = highlight(text, &self.term);
        if self.entries.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.entries.remove(&oldest);
        }
        self.order.push_back(text.to_owned());
        self.entries.insert(text.to_owned(), segments.clone());
        segments
    }
}
