//! The remote loop: events pushed by the monitoring backend, plus the periodic
//! metrics/alerts refresh. Nothing here touches the local [`crate::Monitor`].

mod event;
mod poller;
mod stream;

pub use event::{LiveEvent, decode_message};
pub use poller::{
    AlertSummary, DEFAULT_POLL_INTERVAL, DashboardSnapshot, EndpointCount, MetricsPoller,
    MetricsReport, Severity, TimeBucket,
};
pub use stream::{LiveStream, StreamEnd, stream_url_for_backend};
