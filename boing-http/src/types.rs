use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn body_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: http::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: http::Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: Bytes::new(),
            timeout: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(http::Method::GET, url.to_string())
    }

    pub fn post_json<T: serde::Serialize + ?Sized>(url: &str, body: &T) -> crate::Result<Self> {
        let body = serde_json::to_vec(body)?;
        Ok(Self {
            method: http::Method::POST,
            url: url.to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from(body),
            timeout: None,
        })
    }

    #[must_use]
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.headers
            .push(("authorization".to_string(), format!("Bearer {token}")));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_decodes_json_and_reports_success() {
        let res = HttpResponse {
            status: 201,
            body: Bytes::from_static(br#"{"log_id":3}"#),
        };
        assert!(res.is_success());
        let v: serde_json::Value = res.json().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(v["log_id"], 3);

        let res = HttpResponse {
            status: 401,
            body: Bytes::from_static(b"not json"),
        };
        assert!(!res.is_success());
        assert!(res.json::<serde_json::Value>().is_err());
    }

    #[test]
    fn post_json_sets_content_type_and_body() {
        let req = HttpRequest::post_json("http://h/api/metrics", &serde_json::json!({}))
            .unwrap_or_else(|e| panic!("{e}"))
            .with_bearer("t0k");

        assert_eq!(req.method, http::Method::POST);
        assert_eq!(req.body.as_ref(), b"{}");
        assert!(
            req.headers
                .iter()
                .any(|(k, v)| k == "content-type" && v == "application/json")
        );
        assert!(
            req.headers
                .iter()
                .any(|(k, v)| k == "authorization" && v == "Bearer t0k")
        );
    }
}
