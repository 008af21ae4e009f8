#![forbid(unsafe_code)]

mod error;

pub mod campaign;
pub mod ingest;
pub mod live;
pub mod monitor;

pub use boing_http::{HttpClient, HttpTransportErrorKind};
pub use campaign::{
    AttemptStatus, CampaignResult, ExecutionMode, Orchestrator, ProgressFn, RequestAttempt,
    RequestOutcome, Scenario, ScenarioKind, classify,
};
pub use error::{Error, Result};
pub use ingest::{
    IngestAck, IngestGenerator, IngestLog, IngestTally, TrafficCategory, wait_for_backend,
};
pub use live::{
    AlertSummary, DashboardSnapshot, LiveEvent, LiveStream, MetricsPoller, MetricsReport,
    StreamEnd, decode_message,
};
pub use monitor::{
    BoundedFeed, EntryStyle, FeedEntry, LIVE_FEED_CAPACITY, LOCAL_FEED_CAPACITY, Monitor,
    NARRATION_CAPACITY, Narration, StatsAggregator, StatsSnapshot, Tone,
};
