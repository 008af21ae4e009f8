//! Background telemetry mix posted straight to the backend's ingest endpoint.
//!
//! Unlike campaigns, nothing here hits the target API: each step synthesizes a
//! request-log record (optionally timing a real upstream request) and submits it
//! with an API key, so the backend always has something to analyze.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use boing_http::{HttpClient, HttpRequest, join_url};
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::{Rng as _, SeedableRng as _};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const INGEST_PATH: &str = "/api/ingest";
const INGEST_PROBE_PATH: &str = "/api/ingest/test";

const NORMAL_ENDPOINTS: &[&str] = &[
    "/posts",
    "/posts/1",
    "/posts/2",
    "/posts/3",
    "/users",
    "/users/1",
    "/users/2",
    "/comments",
    "/comments/1",
    "/todos",
    "/todos/1",
    "/albums",
    "/albums/1",
];

const SUSPICIOUS_ENDPOINTS: &[&str] = &[
    "/posts?id=' OR 1=1--",
    "/users?search=<script>alert('xss')</script>",
    "/posts/../../../etc/passwd",
    "/users?id=1 UNION SELECT * FROM users--",
    "/posts?search=<img src=x onerror=alert(1)>",
    "/admin/../../etc/shadow",
];

const ERROR_ENDPOINTS: &[(&str, u16)] = &[
    ("/posts/99999", 404),
    ("/users/99999", 404),
    ("/invalid", 404),
    ("/posts", 500),
    ("/users", 503),
];

const POST_ENDPOINTS: &[&str] = &["/posts", "/users", "/comments"];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "Mozilla/5.0 (X11; Linux x86_64)",
    "PostmanRuntime/7.29.2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TrafficCategory {
    Normal,
    Suspicious,
    Error,
    Post,
}

impl TrafficCategory {
    /// Maps a uniform roll in `[0, 1)` onto 10% suspicious, 15% error, 5% POST, 70% normal.
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.10 {
            Self::Suspicious
        } else if roll < 0.25 {
            Self::Error
        } else if roll < 0.30 {
            Self::Post
        } else {
            Self::Normal
        }
    }
}

/// Request-log record accepted by the backend's ingest endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestLog {
    pub api_key: String,
    pub timestamp: f64,
    pub method: String,
    pub endpoint: String,
    pub client_ip: String,
    pub status_code: u16,
    pub latency_ms: f64,
    pub headers: BTreeMap<String, String>,
    pub body_size: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestAck {
    #[serde(default)]
    pub log_id: Option<i64>,
    #[serde(default)]
    pub is_suspicious: bool,
    #[serde(default)]
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestTally {
    pub normal: u64,
    pub suspicious: u64,
    pub errors: u64,
    pub posts: u64,
    pub rejected: u64,
}

impl IngestTally {
    pub fn sent(&self) -> u64 {
        self.normal + self.suspicious + self.errors + self.posts
    }

    /// Counts one step; a rejected record only bumps `rejected`.
    pub fn record(&mut self, category: TrafficCategory, accepted: bool) {
        if !accepted {
            self.rejected += 1;
            return;
        }
        let slot = match category {
            TrafficCategory::Normal => &mut self.normal,
            TrafficCategory::Suspicious => &mut self.suspicious,
            TrafficCategory::Error => &mut self.errors,
            TrafficCategory::Post => &mut self.posts,
        };
        *slot += 1;
    }
}

#[derive(Debug)]
pub struct IngestGenerator {
    client: HttpClient,
    backend: String,
    api_key: String,
    /// When set, normal traffic is timed against this real upstream instead of synthesized.
    upstream: Option<String>,
    rng: StdRng,
}

impl IngestGenerator {
    pub fn new(client: HttpClient, backend: &str, api_key: &str) -> Self {
        Self {
            client,
            backend: backend.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            upstream: None,
            rng: StdRng::from_entropy(),
        }
    }

    #[must_use]
    pub fn with_upstream(mut self, upstream: &str) -> Self {
        self.upstream = Some(upstream.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sends `count` records, sleeping a random delay from `delay` between them.
    pub async fn run(&mut self, count: u64, delay: RangeInclusive<Duration>) -> IngestTally {
        let mut tally = IngestTally::default();
        for i in 0..count {
            if i > 0 {
                let pause = self.next_delay(&delay);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
            let (category, res) = self.step().await;
            tally.record(category, res.is_ok());
        }
        tally
    }

    /// Draws a category, synthesizes one record for it and submits it.
    pub async fn step(&mut self) -> (TrafficCategory, Result<IngestAck>) {
        let category = TrafficCategory::from_roll(self.rng.r#gen::<f64>());
        let log = self.synthesize(category).await;
        let res = self.send(&log).await;
        match &res {
            Ok(ack) => tracing::debug!(
                %category,
                endpoint = %log.endpoint,
                status = log.status_code,
                suspicious = ack.is_suspicious,
                risk = ack.risk_score,
                "ingested"
            ),
            Err(err) => tracing::warn!(%category, error = %err, "ingest rejected"),
        }
        (category, res)
    }

    pub async fn send(&self, log: &IngestLog) -> Result<IngestAck> {
        let url = join_url(&self.backend, INGEST_PATH);
        let res = self
            .client
            .request(HttpRequest::post_json(&url, log)?.with_timeout(Duration::from_secs(5)))
            .await?;
        if !res.is_success() {
            return Err(Error::Backend {
                path: INGEST_PATH.to_string(),
                status: res.status,
            });
        }
        Ok(res.json()?)
    }

    pub async fn synthesize(&mut self, category: TrafficCategory) -> IngestLog {
        let (method, endpoint, status_code, latency_ms) = match category {
            TrafficCategory::Normal => {
                let endpoint = pick(&mut self.rng, NORMAL_ENDPOINTS, "/posts");
                let (status, latency) = self.time_upstream(endpoint).await;
                ("GET", endpoint, status, latency)
            }
            TrafficCategory::Suspicious => {
                let endpoint = pick(&mut self.rng, SUSPICIOUS_ENDPOINTS, "/admin");
                let latency = self.rng.gen_range(100..=300) as f64;
                ("GET", endpoint, 200, latency)
            }
            TrafficCategory::Error => {
                let (endpoint, status) =
                    pick(&mut self.rng, ERROR_ENDPOINTS, ("/invalid", 404));
                let latency = self.rng.gen_range(50..=150) as f64;
                ("GET", endpoint, status, latency)
            }
            TrafficCategory::Post => {
                let endpoint = pick(&mut self.rng, POST_ENDPOINTS, "/posts");
                let status = if self.rng.gen_bool(0.5) { 200 } else { 201 };
                let latency = self.rng.gen_range(100..=400) as f64;
                ("POST", endpoint, status, latency)
            }
        };

        IngestLog {
            api_key: self.api_key.clone(),
            timestamp: epoch_secs(),
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            client_ip: format!("192.168.1.{}", self.rng.gen_range(1..=254)),
            status_code,
            latency_ms,
            headers: BTreeMap::new(),
            body_size: self.rng.gen_range(100..=5000),
            user_agent: pick(&mut self.rng, USER_AGENTS, "boing").to_string(),
        }
    }

    async fn time_upstream(&mut self, endpoint: &str) -> (u16, f64) {
        let fallback = (200, self.rng.gen_range(50..=200) as f64);
        let Some(upstream) = &self.upstream else {
            return fallback;
        };

        let url = join_url(upstream, endpoint);
        let started = Instant::now();
        match self
            .client
            .request(HttpRequest::get(&url).with_timeout(Duration::from_secs(5)))
            .await
        {
            Ok(res) => (res.status, started.elapsed().as_secs_f64() * 1000.0),
            Err(err) => {
                tracing::debug!(%url, error = %err, "upstream unavailable, synthesizing");
                fallback
            }
        }
    }

    /// Uniform pause drawn from `delay`, at millisecond resolution.
    pub fn next_delay(&mut self, delay: &RangeInclusive<Duration>) -> Duration {
        let (lo, hi) = (delay.start().as_millis() as u64, delay.end().as_millis() as u64);
        if hi <= lo {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(self.rng.gen_range(lo..=hi))
    }
}

/// Probes the ingest endpoint until it answers 200.
pub async fn wait_for_backend(
    client: &HttpClient,
    backend: &str,
    attempts: u32,
    delay: Duration,
) -> Result<()> {
    let url = join_url(backend, INGEST_PROBE_PATH);
    for attempt in 1..=attempts {
        match client
            .request(HttpRequest::get(&url).with_timeout(Duration::from_secs(2)))
            .await
        {
            Ok(res) if res.status == 200 => return Ok(()),
            Ok(res) => tracing::info!(attempt, status = res.status, "backend not ready"),
            Err(err) => tracing::info!(attempt, error = %err, "backend not ready"),
        }
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    Err(Error::BackendNotReady { attempts })
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T], fallback: T) -> T {
    items.choose(rng).copied().unwrap_or(fallback)
}

fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_thresholds() {
        assert_eq!(TrafficCategory::from_roll(0.0), TrafficCategory::Suspicious);
        assert_eq!(TrafficCategory::from_roll(0.0999), TrafficCategory::Suspicious);
        assert_eq!(TrafficCategory::from_roll(0.10), TrafficCategory::Error);
        assert_eq!(TrafficCategory::from_roll(0.2499), TrafficCategory::Error);
        assert_eq!(TrafficCategory::from_roll(0.25), TrafficCategory::Post);
        assert_eq!(TrafficCategory::from_roll(0.30), TrafficCategory::Normal);
        assert_eq!(TrafficCategory::from_roll(0.99), TrafficCategory::Normal);
    }

    #[tokio::test]
    async fn synthesized_records_follow_category_tables() {
        let mut g = IngestGenerator::new(HttpClient::default(), "http://127.0.0.1:9", "key")
            .with_seed(42);

        for _ in 0..20 {
            let log = g.synthesize(TrafficCategory::Error).await;
            assert!(ERROR_ENDPOINTS.contains(&(log.endpoint.as_str(), log.status_code)));
            assert_eq!(log.api_key, "key");
            assert!(log.client_ip.starts_with("192.168.1."));

            let log = g.synthesize(TrafficCategory::Post).await;
            assert_eq!(log.method, "POST");
            assert!(matches!(log.status_code, 200 | 201));

            let log = g.synthesize(TrafficCategory::Suspicious).await;
            assert!(SUSPICIOUS_ENDPOINTS.contains(&log.endpoint.as_str()));
            assert_eq!(log.status_code, 200);

            let log = g.synthesize(TrafficCategory::Normal).await;
            assert!(NORMAL_ENDPOINTS.contains(&log.endpoint.as_str()));
            assert!((50.0..=200.0).contains(&log.latency_ms));
        }
    }

    #[test]
    fn delay_stays_within_range() {
        let mut g = IngestGenerator::new(HttpClient::default(), "http://127.0.0.1:9", "key")
            .with_seed(5);
        let range = Duration::from_millis(10)..=Duration::from_millis(20);
        for _ in 0..50 {
            let d = g.next_delay(&range);
            assert!(range.contains(&d), "{d:?}");
        }
        let fixed = Duration::from_millis(7)..=Duration::from_millis(7);
        assert_eq!(g.next_delay(&fixed), Duration::from_millis(7));
    }

    #[test]
    fn tally_sums_accepted_records() {
        let mut t = IngestTally::default();
        t.record(TrafficCategory::Normal, true);
        t.record(TrafficCategory::Error, true);
        t.record(TrafficCategory::Error, true);
        t.record(TrafficCategory::Post, false);
        assert_eq!(t.sent(), 3);
        assert_eq!(t.errors, 2);
        assert_eq!(t.posts, 0);
        assert_eq!(t.rejected, 1);
    }
}
