use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A request observed by the backend and pushed over the live stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub api_id: Option<i64>,
    pub method: String,
    pub endpoint: String,
    /// The backend may log a request before any response status is known.
    #[serde(default)]
    pub status_code: Option<u16>,
    pub is_suspicious: bool,
    pub client_ip: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub risk_score: Option<f64>,
}

impl LiveEvent {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status_code.is_some_and(|s| s >= 400)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

const REQUEST_LOG: &str = "request_log";
const REQUEST_LOG_ALIAS: &str = "request-log";

/// Decodes one stream message. Messages of any other type yield `Ok(None)`.
pub fn decode_message(text: &str) -> Result<Option<LiveEvent>> {
    let envelope: Envelope = serde_json::from_str(text)?;
    if envelope.kind != REQUEST_LOG && envelope.kind != REQUEST_LOG_ALIAS {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(envelope.data)?))
}
