//! Minimal stand-in for the Boing monitoring backend: ingestion, metrics, alerts and the
//! `/ws/live` broadcast feed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use axum::Json;
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, watch};

use crate::AppState;

const SUSPICIOUS_PATTERNS: &[&str] = &[
    "' or",
    "or 1=1",
    "union select",
    "<script",
    "onerror=",
    "javascript:",
    "../",
    "..%2f",
    "etc/passwd",
];

#[derive(Debug, Clone)]
struct StoredLog {
    endpoint: String,
    client_ip: String,
    status_code: u16,
    latency_ms: f64,
    suspicious: bool,
}

#[derive(Debug, Clone, Serialize)]
struct Alert {
    id: i64,
    api_id: i64,
    alert_type: &'static str,
    severity: &'static str,
    score: f64,
    title: String,
    description: Option<String>,
    is_acknowledged: bool,
    is_muted: bool,
    created_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IngestBody {
    api_key: String,
    timestamp: f64,
    method: String,
    endpoint: String,
    client_ip: String,
    status_code: u16,
    latency_ms: f64,
}

#[derive(Debug)]
pub(crate) struct Backend {
    pub(crate) token: String,
    pub(crate) api_key: String,
    pub(crate) events: broadcast::Sender<String>,
    pub(crate) closing: watch::Sender<bool>,
    logs: Mutex<Vec<StoredLog>>,
    alerts: Mutex<Vec<Alert>>,
}

impl Backend {
    pub(crate) fn new(token: &str, api_key: &str) -> Self {
        let (events, _) = broadcast::channel(256);
        let (closing, _) = watch::channel(false);
        Self {
            token: token.to_string(),
            api_key: api_key.to_string(),
            events,
            closing,
            logs: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn ingested(&self) -> usize {
        self.logs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            == Some(self.token.as_str())
    }
}

fn looks_suspicious(endpoint: &str) -> bool {
    let endpoint = endpoint.to_ascii_lowercase();
    SUSPICIOUS_PATTERNS.iter().any(|p| endpoint.contains(p))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Not authenticated" })),
    )
        .into_response()
}

pub(crate) async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestBody>,
) -> Response {
    let backend = &state.backend;
    if body.api_key != backend.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid API key" })),
        )
            .into_response();
    }

    let suspicious = looks_suspicious(&body.endpoint);
    let risk_score = if suspicious { 0.85 } else { 0.05 };

    let log_id = {
        let mut logs = backend
            .logs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        logs.push(StoredLog {
            endpoint: body.endpoint.clone(),
            client_ip: body.client_ip.clone(),
            status_code: body.status_code,
            latency_ms: body.latency_ms,
            suspicious,
        });
        logs.len() as i64
    };

    if suspicious {
        let mut alerts = backend
            .alerts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = alerts.len() as i64 + 1;
        alerts.push(Alert {
            id,
            api_id: 1,
            alert_type: "attack_pattern",
            severity: "high",
            score: risk_score * 100.0,
            title: format!("Suspicious request to {}", body.endpoint),
            description: Some(format!("{} {} from {}", body.method, body.endpoint, body.client_ip)),
            is_acknowledged: false,
            is_muted: false,
            created_at: Utc::now().to_rfc3339(),
        });
    }

    let event = json!({
        "type": "request_log",
        "data": {
            "id": log_id,
            "api_id": 1,
            "timestamp": body.timestamp,
            "method": body.method,
            "endpoint": body.endpoint,
            "client_ip": body.client_ip,
            "status_code": body.status_code,
            "is_suspicious": suspicious,
            "risk_score": risk_score,
        },
    });
    // No subscribers is fine.
    let _ = backend.events.send(event.to_string());

    Json(json!({
        "status": "success",
        "log_id": log_id,
        "is_suspicious": suspicious,
        "risk_score": risk_score,
    }))
    .into_response()
}

pub(crate) async fn ingest_test() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Ingestion endpoint is ready",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub(crate) async fn metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    _body: Bytes,
) -> Response {
    if !state.backend.authorized(&headers) {
        return unauthorized();
    }

    let logs = state
        .backend
        .logs
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    let alerts_count = state
        .backend
        .alerts
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .len();

    let total = logs.len();
    let errors = logs.iter().filter(|l| l.status_code >= 400).count();
    let suspicious = logs.iter().filter(|l| l.suspicious).count();
    let unique_ips = logs.iter().map(|l| l.client_ip.as_str()).collect::<HashSet<_>>().len();
    let (error_rate, avg_latency_ms) = if total == 0 {
        (0.0, 0.0)
    } else {
        (
            errors as f64 / total as f64 * 100.0,
            logs.iter().map(|l| l.latency_ms).sum::<f64>() / total as f64,
        )
    };

    let mut by_endpoint: BTreeMap<&str, u64> = BTreeMap::new();
    for log in &logs {
        *by_endpoint.entry(log.endpoint.as_str()).or_insert(0) += 1;
    }
    let mut top: Vec<_> = by_endpoint.into_iter().collect();
    top.sort_by(|a, b| b.1.cmp(&a.1));
    let top_endpoints: Vec<_> = top
        .into_iter()
        .take(10)
        .map(|(endpoint, count)| json!({ "endpoint": endpoint, "count": count }))
        .collect();

    Json(json!({
        "total_requests": total,
        "error_rate": error_rate,
        "avg_latency_ms": avg_latency_ms,
        "unique_ips": unique_ips,
        "suspicious_requests": suspicious,
        "alerts_count": alerts_count,
        "top_endpoints": top_endpoints,
        "requests_over_time": [],
    }))
    .into_response()
}

pub(crate) async fn alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !state.backend.authorized(&headers) {
        return unauthorized();
    }

    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(50);
    let alerts: Vec<_> = state
        .backend
        .alerts
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .iter()
        .rev()
        .take(limit)
        .cloned()
        .collect();
    Json(alerts).into_response()
}

pub(crate) async fn live(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Subscribe before the handshake completes so nothing sent after it is missed.
    let rx = state.backend.events.subscribe();
    let closing = state.backend.closing.subscribe();
    ws.on_upgrade(move |socket| live_socket(socket, rx, closing))
}

async fn live_socket(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<String>,
    mut closing: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
            _ = closing.changed() => {
                while let Ok(text) = rx.try_recv() {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                break;
            }
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}
