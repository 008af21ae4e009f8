use std::sync::Mutex;

use serde::Serialize;

use crate::campaign::RequestOutcome;

/// Aggregate counters over recorded outcomes.
///
/// `suspicious_requests <= total_requests` and `error_count <= total_requests` always hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub suspicious_requests: u64,
    pub error_count: u64,
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<StatsSnapshot>,
}

impl StatsAggregator {
    pub fn record(&self, outcome: &RequestOutcome) {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        guard.total_requests = guard.total_requests.saturating_add(1);
        if outcome.flagged {
            guard.suspicious_requests = guard.suspicious_requests.saturating_add(1);
        }
        if outcome.is_error() {
            guard.error_count = guard.error_count.saturating_add(1);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn reset(&self) {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = StatsSnapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{RequestAttempt, classify};
    use boing_http::HttpTransportErrorKind;

    fn attempt(flagged: bool) -> RequestAttempt {
        RequestAttempt {
            method: http::Method::GET,
            endpoint: "/api/products".to_string(),
            uri_path: "/api/products".to_string(),
            flagged,
        }
    }

    #[test]
    fn counts_flagged_and_errors_independently() {
        let stats = StatsAggregator::default();
        stats.record(&classify(&attempt(true), Ok(200)));
        stats.record(&classify(&attempt(false), Ok(404)));
        stats.record(&classify(&attempt(true), Ok(500)));
        stats.record(&classify(&attempt(false), Ok(200)));

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                total_requests: 4,
                suspicious_requests: 2,
                error_count: 2,
            }
        );
    }

    #[test]
    fn transport_failure_counts_toward_total_only() {
        let stats = StatsAggregator::default();
        stats.record(&classify(
            &attempt(false),
            Err(HttpTransportErrorKind::Request),
        ));

        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 1);
        assert_eq!(snap.suspicious_requests, 0);
        assert_eq!(snap.error_count, 0);
    }

    #[test]
    fn reset_zeroes_all_counters() {
        let stats = StatsAggregator::default();
        stats.record(&classify(&attempt(true), Ok(403)));
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
