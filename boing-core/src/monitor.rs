//! Process-wide session state for the local traffic loop.
//!
//! The [`Monitor`] owns the aggregate counters, the recent-activity feed and the
//! narration log. It is shared by reference with every running campaign.

mod feed;
mod narration;
mod stats;

use std::sync::RwLock;

pub use feed::{
    BoundedFeed, EntryStyle, FeedEntry, LIVE_FEED_CAPACITY, LOCAL_FEED_CAPACITY,
    NARRATION_CAPACITY,
};
pub use narration::{Narration, Tone};
pub use stats::{StatsAggregator, StatsSnapshot};

use crate::campaign::RequestOutcome;

#[derive(Debug)]
pub struct Monitor {
    // `record` holds this for reading, `reset` for writing, so an outcome never
    // lands in the counters on one side of a reset and in the feed on the other.
    gate: RwLock<()>,
    stats: StatsAggregator,
    feed: BoundedFeed<FeedEntry>,
    narration: BoundedFeed<Narration>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            gate: RwLock::new(()),
            stats: StatsAggregator::default(),
            feed: BoundedFeed::local(),
            narration: BoundedFeed::narration(),
        }
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        let _gate = self
            .gate
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.stats.record(outcome);
        self.feed.push(FeedEntry::from(outcome.clone()));
    }

    /// Zeroes the counters and empties the activity feed. The narration log is kept.
    pub fn reset(&self) {
        let _gate = self
            .gate
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.stats.reset();
        self.feed.clear();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn feed(&self) -> Vec<FeedEntry> {
        self.feed.list()
    }

    pub fn narrate(&self, tone: Tone, message: impl Into<String>) -> Narration {
        let line = Narration::new(tone, message);
        tracing::info!(tone = %line.tone, "{}", line.message);
        self.narration.push(line.clone());
        line
    }

    pub fn narration(&self) -> Vec<Narration> {
        self.narration.list()
    }
}
