use std::time::Duration;

use crate::monitor::Tone;

use super::RequestAttempt;

/// Statically defined traffic campaigns.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ScenarioKind {
    #[strum(to_string = "sql-injection", serialize = "sqli")]
    SqlInjection,
    Xss,
    RateLimit,
    PathTraversal,
    ErrorFlood,
    #[strum(to_string = "normal-traffic", serialize = "normal")]
    NormalTraffic,
}

impl ScenarioKind {
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    pub fn scenario(self) -> &'static Scenario {
        let idx = match self {
            Self::SqlInjection => 0,
            Self::Xss => 1,
            Self::RateLimit => 2,
            Self::PathTraversal => 3,
            Self::ErrorFlood => 4,
            Self::NormalTraffic => 5,
        };
        &SCENARIOS[idx]
    }
}

/// How a payload is escaped when substituted into an endpoint template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Inserted verbatim.
    None,
    /// `application/x-www-form-urlencoded`, for query values.
    Query,
    /// Only bytes that are illegal in a URI path are percent-encoded; `.`, `/` and `%` survive.
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointTemplate {
    pub pattern: &'static str,
    pub escape: Escape,
}

const PAYLOAD_SLOT: &str = "{payload}";

impl EndpointTemplate {
    /// Returns `(display, transport)` forms of the endpoint.
    pub fn render(&self, payload: &str) -> (String, String) {
        let display = self.pattern.replace(PAYLOAD_SLOT, payload);
        let escaped = match self.escape {
            Escape::None => payload.to_string(),
            Escape::Query => url::form_urlencoded::byte_serialize(payload.as_bytes()).collect(),
            Escape::Path => escape_path(payload),
        };
        let transport = self.pattern.replace(PAYLOAD_SLOT, &escaped);
        (display, transport)
    }
}

fn escape_path(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    for b in payload.bytes() {
        let keep = b.is_ascii_graphic()
            && !matches!(
                b,
                b'"' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{' | b'|' | b'}' | b'?' | b'#'
            );
        if keep {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One request per payload, in order, never more than one in flight.
    Sequenced {
        payloads: &'static [&'static str],
        pacing: Duration,
    },
    /// `count` identical requests launched together, joined before completion.
    Burst { count: usize },
}

#[derive(Debug)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub title: &'static str,
    pub method: http::Method,
    pub template: EndpointTemplate,
    pub mode: ExecutionMode,
    pub flagged: bool,
    pub tone: Tone,
}

impl Scenario {
    /// Every request the scenario issues, in launch order.
    pub fn attempts(&self) -> Vec<RequestAttempt> {
        let attempt = |payload: &str| {
            let (endpoint, uri_path) = self.template.render(payload);
            RequestAttempt {
                method: self.method.clone(),
                endpoint,
                uri_path,
                flagged: self.flagged,
            }
        };

        match self.mode {
            ExecutionMode::Sequenced { payloads, .. } => {
                payloads.iter().map(|p| attempt(p)).collect()
            }
            ExecutionMode::Burst { count } => {
                let one = attempt("");
                vec![one; count]
            }
        }
    }

    pub fn request_count(&self) -> usize {
        match self.mode {
            ExecutionMode::Sequenced { payloads, .. } => payloads.len(),
            ExecutionMode::Burst { count } => count,
        }
    }

    pub fn start_message(&self) -> String {
        format!("Launching {}...", self.title)
    }

    pub fn completion_message(&self, requests: usize) -> String {
        format!("{} completed ({requests} requests)", capitalize(self.title))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const SEARCH: EndpointTemplate = EndpointTemplate {
    pattern: "/api/search?q={payload}",
    escape: Escape::Query,
};

static SCENARIOS: [Scenario; 6] = [
    Scenario {
        kind: ScenarioKind::SqlInjection,
        title: "SQL injection attack",
        method: http::Method::GET,
        template: SEARCH,
        mode: ExecutionMode::Sequenced {
            payloads: &[
                "' OR 1=1--",
                "' UNION SELECT * FROM users--",
                "'; DROP TABLE products--",
                "admin'--",
                "' OR 'a'='a",
            ],
            pacing: Duration::from_millis(200),
        },
        flagged: true,
        tone: Tone::Danger,
    },
    Scenario {
        kind: ScenarioKind::Xss,
        title: "XSS attack",
        method: http::Method::GET,
        template: SEARCH,
        mode: ExecutionMode::Sequenced {
            payloads: &[
                "<script>alert('XSS')</script>",
                "<img src=x onerror=alert('XSS')>",
                "javascript:alert('XSS')",
                "<svg onload=alert('XSS')>",
                "<iframe src='javascript:alert(1)'>",
            ],
            pacing: Duration::from_millis(200),
        },
        flagged: true,
        tone: Tone::Danger,
    },
    Scenario {
        kind: ScenarioKind::RateLimit,
        title: "rate limit burst",
        method: http::Method::GET,
        template: EndpointTemplate {
            pattern: "/api/products",
            escape: Escape::None,
        },
        mode: ExecutionMode::Burst { count: 150 },
        flagged: false,
        tone: Tone::Danger,
    },
    Scenario {
        kind: ScenarioKind::PathTraversal,
        title: "path traversal attack",
        method: http::Method::GET,
        template: EndpointTemplate {
            pattern: "/api/products/{payload}",
            escape: Escape::Path,
        },
        mode: ExecutionMode::Sequenced {
            payloads: &[
                "../../../etc/passwd",
                "..\\..\\..\\windows\\system32",
                "%2e%2e%2f%2e%2e%2f",
                "....//....//....//etc/passwd",
            ],
            pacing: Duration::from_millis(200),
        },
        flagged: true,
        tone: Tone::Danger,
    },
    Scenario {
        kind: ScenarioKind::ErrorFlood,
        title: "error flood",
        method: http::Method::GET,
        template: EndpointTemplate {
            pattern: "/api/products/999",
            escape: Escape::None,
        },
        mode: ExecutionMode::Sequenced {
            payloads: &[""; 20],
            pacing: Duration::from_millis(100),
        },
        flagged: false,
        tone: Tone::Danger,
    },
    Scenario {
        kind: ScenarioKind::NormalTraffic,
        title: "normal traffic",
        method: http::Method::GET,
        template: EndpointTemplate {
            pattern: "{payload}",
            escape: Escape::None,
        },
        mode: ExecutionMode::Sequenced {
            payloads: &[
                "/api/products",
                "/api/products/1",
                "/api/search?q=laptop",
                "/api/users",
            ],
            pacing: Duration::from_millis(500),
        },
        flagged: false,
        tone: Tone::Success,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_its_own_definition() {
        for kind in ScenarioKind::all() {
            assert_eq!(kind.scenario().kind, kind);
        }
        assert_eq!(ScenarioKind::all().count(), 6);
    }

    #[test]
    fn kinds_parse_from_kebab_case_and_aliases() {
        assert_eq!("sql-injection".parse(), Ok(ScenarioKind::SqlInjection));
        assert_eq!("sqli".parse(), Ok(ScenarioKind::SqlInjection));
        assert_eq!("rate-limit".parse(), Ok(ScenarioKind::RateLimit));
        assert_eq!("normal".parse(), Ok(ScenarioKind::NormalTraffic));
        assert_eq!(ScenarioKind::PathTraversal.to_string(), "path-traversal");
        assert!("ddos".parse::<ScenarioKind>().is_err());
    }

    #[test]
    fn query_payloads_are_form_encoded_for_transport() {
        let attempts = ScenarioKind::SqlInjection.scenario().attempts();
        assert_eq!(attempts.len(), 5);
        assert_eq!(attempts[0].endpoint, "/api/search?q=' OR 1=1--");
        assert_eq!(attempts[0].uri_path, "/api/search?q=%27+OR+1%3D1--");
        assert!(attempts.iter().all(|a| a.flagged));
    }

    #[test]
    fn path_payloads_keep_dot_segments() {
        let attempts = ScenarioKind::PathTraversal.scenario().attempts();
        assert_eq!(attempts[0].uri_path, "/api/products/../../../etc/passwd");
        assert_eq!(
            attempts[1].uri_path,
            "/api/products/..%5C..%5C..%5Cwindows%5Csystem32"
        );
        assert_eq!(attempts[2].uri_path, "/api/products/%2e%2e%2f%2e%2e%2f");
        assert_eq!(attempts[1].endpoint, "/api/products/..\\..\\..\\windows\\system32");
    }

    #[test]
    fn burst_and_repeat_counts() {
        let burst = ScenarioKind::RateLimit.scenario();
        assert_eq!(burst.request_count(), 150);
        let attempts = burst.attempts();
        assert_eq!(attempts.len(), 150);
        assert!(attempts.iter().all(|a| a.uri_path == "/api/products" && !a.flagged));

        let flood = ScenarioKind::ErrorFlood.scenario().attempts();
        assert_eq!(flood.len(), 20);
        assert!(flood.iter().all(|a| a.endpoint == "/api/products/999"));
    }

    #[test]
    fn baseline_visits_fixed_endpoints() {
        let endpoints: Vec<String> = ScenarioKind::NormalTraffic
            .scenario()
            .attempts()
            .into_iter()
            .map(|a| a.uri_path)
            .collect();
        assert_eq!(
            endpoints,
            vec![
                "/api/products",
                "/api/products/1",
                "/api/search?q=laptop",
                "/api/users"
            ]
        );
    }

    #[test]
    fn narration_messages() {
        let s = ScenarioKind::SqlInjection.scenario();
        assert_eq!(s.start_message(), "Launching SQL injection attack...");
        assert_eq!(s.completion_message(5), "SQL injection attack completed (5 requests)");
        assert_eq!(
            ScenarioKind::ErrorFlood.scenario().completion_message(20),
            "Error flood completed (20 requests)"
        );
    }
}
