use std::time::Duration;

use boing_http::{HttpClient, HttpRequest, HttpResponse, join_url};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::{Error, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

const METRICS_PATH: &str = "/api/metrics";
const ALERTS_PATH: &str = "/api/alerts?limit=5";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointCount {
    pub endpoint: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub time: String,
    pub count: u64,
}

/// Aggregate metrics as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub total_requests: u64,
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub unique_ips: u64,
    pub suspicious_requests: u64,
    pub alerts_count: u64,
    #[serde(default)]
    pub top_endpoints: Vec<EndpointCount>,
    #[serde(default)]
    pub requests_over_time: Vec<TimeBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub id: i64,
    pub api_id: i64,
    pub alert_type: String,
    pub severity: Severity,
    pub score: f64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_acknowledged: bool,
    #[serde(default)]
    pub is_muted: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub metrics: Option<MetricsReport>,
    pub alerts: Vec<AlertSummary>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Periodically refreshes aggregate metrics and the most recent alerts.
///
/// A failed refresh keeps the previous values; there is no retry beyond the next tick.
#[derive(Debug)]
pub struct MetricsPoller {
    client: HttpClient,
    backend: String,
    token: Option<String>,
    tx: watch::Sender<DashboardSnapshot>,
}

impl MetricsPoller {
    pub fn new(client: HttpClient, backend: &str, token: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(DashboardSnapshot::default());
        Self {
            client,
            backend: backend.trim_end_matches('/').to_string(),
            token,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> DashboardSnapshot {
        self.tx.borrow().clone()
    }

    /// Refreshes metrics and alerts independently. Returns the first failure, if any,
    /// after applying whatever did succeed.
    pub async fn poll_once(&self) -> Result<()> {
        let metrics = self.fetch_metrics().await;
        let alerts = self.fetch_alerts().await;

        self.tx.send_modify(|snap| {
            if let Ok(m) = &metrics {
                snap.metrics = Some(m.clone());
            }
            if let Ok(a) = &alerts {
                snap.alerts = a.clone();
            }
            if metrics.is_ok() || alerts.is_ok() {
                snap.refreshed_at = Some(Utc::now());
            }
        });

        metrics?;
        alerts?;
        Ok(())
    }

    /// Polls immediately, then once per `interval`, forever.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = self.poll_once().await {
                tracing::warn!(backend = %self.backend, error = %err, "metrics refresh failed");
            }
        }
    }

    async fn fetch_metrics(&self) -> Result<MetricsReport> {
        let url = join_url(&self.backend, METRICS_PATH);
        let req = self.authorize(HttpRequest::post_json(&url, &serde_json::json!({}))?);
        let res = self.client.request(req).await?;
        Ok(ensure_success(METRICS_PATH, res)?.json()?)
    }

    async fn fetch_alerts(&self) -> Result<Vec<AlertSummary>> {
        let url = join_url(&self.backend, ALERTS_PATH);
        let req = self.authorize(HttpRequest::get(&url));
        let res = self.client.request(req).await?;
        Ok(ensure_success(ALERTS_PATH, res)?.json()?)
    }

    fn authorize(&self, req: HttpRequest) -> HttpRequest {
        match &self.token {
            Some(token) => req.with_bearer(token),
            None => req,
        }
    }
}

fn ensure_success(path: &str, res: HttpResponse) -> Result<HttpResponse> {
    if res.is_success() {
        Ok(res)
    } else {
        Err(Error::Backend {
            path: path.to_string(),
            status: res.status,
        })
    }
}
