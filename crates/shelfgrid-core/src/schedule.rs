// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Cooperative scheduling primitives for a single-threaded event loop.
//!
//! Nothing here spawns or sleeps. Callers pass `now` in and poll from their
//! loop tick, which keeps every primitive deterministic under test. A new
//! trigger always supersedes pending work of the same kind.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Coalesces repeated triggers into one delivery after a quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Restarts the quiet period; the latest payload replaces any pending one.
    pub fn trigger(&mut self, now: Instant, payload: T) {
        self.pending = Some((now, payload));
    }

    /// Restarts the quiet period, folding `payload` into the pending one.
    pub fn trigger_merged(&mut self, now: Instant, payload: T, merge: impl FnOnce(T, T) -> T) {
        let payload = match self.pending.take() {
            Some((_, earlier)) => merge(earlier, payload),
            None => payload,
        };
        self.pending = Some((now, payload));
    }

    /// Yields the payload once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (last, _) = self.pending.as_ref()?;
        if now.saturating_duration_since(*last) < self.delay {
            return None;
        }
        self.pending.take().map(|(_, payload)| payload)
    }

    /// Delivers the pending payload immediately, skipping the wait.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Latest-wins slot drained once per frame.
#[derive(Debug, Clone)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn request(&mut self, value: T) {
        self.pending = Some(value);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the newest request; earlier ones in the same frame are dropped.
    pub fn take_frame(&mut self) -> Option<T> {
        self.pending.take()
    }
}

/// Token naming one scheduled idle job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleToken(u64);

/// Single idle job slot; scheduling again supersedes the pending job.
#[derive(Debug, Clone)]
pub struct IdleSlot<T> {
    generation: u64,
    pending: Option<(IdleToken, T)>,
}

impl<T> Default for IdleSlot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }
}

impl<T> IdleSlot<T> {
    pub fn schedule(&mut self, job: T) -> IdleToken {
        self.generation += 1;
        let token = IdleToken(self.generation);
        self.pending = Some((token, job));
        token
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take(&mut self) -> Option<(IdleToken, T)> {
        self.pending.take()
    }

    /// Whether `token` is the most recently scheduled job.
    pub fn is_current(&self, token: IdleToken) -> bool {
        token.0 == self.generation
    }
}

/// One-shot in-flight flag for observe-then-write cycles.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    busy: Cell<bool>,
}

#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl ReentrancyLock {
    /// `None` while another holder is inside the guarded section.
    pub fn try_enter(&self) -> Option<ReentrancyGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(ReentrancyGuard { lock: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.lock.busy.set(false);
    }
}

/// Minimum-delta gate for writes that feed back into their own observer.
pub fn exceeds_threshold(current: f64, target: f64, threshold: f64) -> bool {
    (current - target).abs() > threshold
}
