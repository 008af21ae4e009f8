use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

use crate::campaign::RequestOutcome;
use crate::error::{Error, Result};

/// Capacity of the feed of locally generated outcomes.
pub const LOCAL_FEED_CAPACITY: usize = 20;

/// Capacity of the feed of events received from the live stream.
pub const LIVE_FEED_CAPACITY: usize = 10;

/// Capacity of the campaign narration log.
pub const NARRATION_CAPACITY: usize = 200;

/// Fixed-capacity, newest-first ring buffer.
///
/// Eviction is strictly by insertion order: once `capacity` is exceeded the oldest
/// entry is dropped regardless of its content.
#[derive(Debug)]
pub struct BoundedFeed<T> {
    capacity: usize,
    entries: Mutex<VecDeque<T>>,
}

impl<T: Clone> BoundedFeed<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(Self::bounded(capacity))
    }

    fn bounded(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    /// Inserts at the head and returns the evicted tail entry, if any.
    pub fn push(&self, entry: T) -> Option<T> {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push_front(entry);
        if guard.len() > self.capacity {
            guard.pop_back()
        } else {
            None
        }
    }

    /// Entries head-to-tail (newest first).
    pub fn list(&self) -> Vec<T> {
        let guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl BoundedFeed<FeedEntry> {
    pub fn local() -> Self {
        Self::bounded(LOCAL_FEED_CAPACITY)
    }
}

impl BoundedFeed<crate::live::LiveEvent> {
    pub fn live() -> Self {
        Self::bounded(LIVE_FEED_CAPACITY)
    }
}

impl BoundedFeed<super::Narration> {
    pub fn narration() -> Self {
        Self::bounded(NARRATION_CAPACITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EntryStyle {
    pub suspicious: bool,
    pub error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub outcome: RequestOutcome,
    pub style: EntryStyle,
}

impl From<RequestOutcome> for FeedEntry {
    fn from(outcome: RequestOutcome) -> Self {
        let style = EntryStyle {
            suspicious: outcome.flagged,
            error: outcome.is_error(),
        };
        Self { outcome, style }
    }
}
