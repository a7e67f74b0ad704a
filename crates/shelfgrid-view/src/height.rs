// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::Cell;

use shelfgrid_core::schedule::{ReentrancyLock, exceeds_threshold};
use tracing::debug;

pub const DEFAULT_MIN_HEIGHT: u32 = 320;
pub const DEFAULT_HEIGHT_THRESHOLD: u32 = 5;

/// Keeps the grid container height in step with the space around it.
///
/// Writing the height can make the host observe a new size and call back in
/// before the write returns; the lock turns that nested call into a no-op
/// and the threshold drops sub-threshold jitter. While the user scrolls the
/// newest observation is parked until [`HeightSync::scroll_ended`].
#[derive(Debug)]
pub struct HeightSync {
    min_height: u32,
    threshold: u32,
    applied: Cell<Option<u32>>,
    deferred: Cell<Option<u32>>,
    lock: ReentrancyLock,
}

impl Default for HeightSync {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_HEIGHT, DEFAULT_HEIGHT_THRESHOLD)
    }
}

impl HeightSync {
    pub fn new(min_height: u32, threshold: u32) -> Self {
        Self {
            min_height,
            threshold,
            applied: Cell::new(None),
            deferred: Cell::new(None),
            lock: ReentrancyLock::default(),
        }
    }

    pub fn applied(&self) -> Option<u32> {
        self.applied.get()
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred.get().is_some()
    }

    /// Handles one size observation; `write` runs only when the height moves.
    pub fn observe(&self, available: u32, scrolling: bool, write: impl FnOnce(u32)) -> bool {
        if scrolling {
            self.deferred.set(Some(available));
            return false;
        }
        let Some(_guard) = self.lock.try_enter() else {
            debug!(available, "height observation during write ignored");
            return false;
        };

        let target = available.max(self.min_height);
        if let Some(current) = self.applied.get()
            && !exceeds_threshold(f64::from(current), f64::from(target), f64::from(self.threshold))
        {
            return false;
        }
        self.applied.set(Some(target));
        write(target);
        true
    }

    /// Applies the observation parked during scrolling, if any.
    pub fn scroll_ended(&self, write: impl FnOnce(u32)) -> bool {
        match self.deferred.take() {
            Some(available) => self.observe(available, false, write),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HeightSync;
    use std::cell::RefCell;

    #[test]
    fn enforces_minimum_and_threshold() {
        let sync = HeightSync::new(320, 5);
        let writes = RefCell::new(Vec::new());
        assert!(sync.observe(200, false, |height| writes.borrow_mut().push(height)));
        assert!(!sync.observe(323, false, |height| writes.borrow_mut().push(height)));
        assert!(sync.observe(400, false, |height| writes.borrow_mut().push(height)));
        assert_eq!(writes.into_inner(), vec![320, 400]);
        assert_eq!(sync.applied(), Some(400));
    }

    #[test]
    fn nested_observation_from_write_is_ignored() {
        let sync = HeightSync::new(0, 0);
        let mut nested = None;
        sync.observe(500, false, |_| {
            nested = Some(sync.observe(900, false, |_| {}));
        });
        assert_eq!(nested, Some(false));
        assert_eq!(sync.applied(), Some(500));
    }

    #[test]
    fn scrolling_defers_until_scroll_end() {
        let sync = HeightSync::new(0, 0);
        assert!(!sync.observe(480, true, |_| {}));
        assert!(sync.is_deferred());
        assert_eq!(sync.applied(), None);

        let mut written = None;
        assert!(sync.scroll_ended(|height| written = Some(height)));
        assert_eq!(written, Some(480));
        assert!(!sync.scroll_ended(|_| {}));
    }
}
