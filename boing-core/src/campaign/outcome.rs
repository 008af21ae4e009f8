use boing_http::HttpTransportErrorKind;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// One request about to be issued against the target API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAttempt {
    pub method: http::Method,
    /// Endpoint with the raw payload substituted, as shown to operators.
    pub endpoint: String,
    /// Endpoint with the payload escaped for transport.
    pub uri_path: String,
    /// Marked suspicious by the scenario regardless of the response.
    pub flagged: bool,
}

/// Status code, or the reason no status was obtained.
pub type AttemptStatus = std::result::Result<u16, HttpTransportErrorKind>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOutcome {
    #[serde(serialize_with = "serialize_method")]
    pub method: http::Method,
    pub endpoint: String,
    /// `None` when the request failed at the transport level.
    pub status: Option<u16>,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<HttpTransportErrorKind>,
    pub flagged: bool,
    /// `flagged` or an error status.
    pub suspicious: bool,
    pub at: DateTime<Utc>,
}

impl RequestOutcome {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.is_some_and(|s| s >= 400)
    }

    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        self.status.is_none()
    }
}

pub fn classify(attempt: &RequestAttempt, status: AttemptStatus) -> RequestOutcome {
    let (status, failure) = match status {
        Ok(code) => (Some(code), None),
        Err(kind) => (None, Some(kind)),
    };
    let error = status.is_some_and(|s| s >= 400);

    RequestOutcome {
        method: attempt.method.clone(),
        endpoint: attempt.endpoint.clone(),
        status,
        failure,
        flagged: attempt.flagged,
        suspicious: attempt.flagged || error,
        at: Utc::now(),
    }
}

fn serialize_method<S: Serializer>(method: &http::Method, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(method.as_str())
}

fn serialize_failure<S: Serializer>(
    failure: &Option<HttpTransportErrorKind>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match failure {
        Some(kind) => s.collect_str(kind),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(flagged: bool) -> RequestAttempt {
        RequestAttempt {
            method: http::Method::GET,
            endpoint: "/api/search?q=' OR 1=1--".to_string(),
            uri_path: "/api/search?q=%27+OR+1%3D1--".to_string(),
            flagged,
        }
    }

    #[test]
    fn flagged_attempt_is_suspicious_even_on_success() {
        let o = classify(&attempt(true), Ok(200));
        assert!(o.suspicious);
        assert!(!o.is_error());
        assert_eq!(o.status, Some(200));
        assert_eq!(o.endpoint, "/api/search?q=' OR 1=1--");
    }

    #[test]
    fn error_status_is_suspicious_but_not_flagged() {
        let o = classify(&attempt(false), Ok(404));
        assert!(o.suspicious);
        assert!(!o.flagged);
        assert!(o.is_error());
    }

    #[test]
    fn status_399_is_not_an_error() {
        let o = classify(&attempt(false), Ok(399));
        assert!(!o.suspicious);
        assert!(!o.is_error());
    }

    #[test]
    fn transport_failure_uses_no_status_sentinel() {
        let o = classify(&attempt(false), Err(HttpTransportErrorKind::Timeout));
        assert_eq!(o.status, None);
        assert_eq!(o.failure, Some(HttpTransportErrorKind::Timeout));
        assert!(o.is_transport_failure());
        assert!(!o.suspicious);

        let o = classify(&attempt(true), Err(HttpTransportErrorKind::Request));
        assert!(o.suspicious);
    }

    #[test]
    fn serializes_method_and_failure_as_strings() {
        let o = classify(&attempt(false), Err(HttpTransportErrorKind::Timeout));
        let v = serde_json::to_value(&o).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(v["method"], "GET");
        assert_eq!(v["failure"], "timeout");
        assert!(v["status"].is_null());
    }
}
