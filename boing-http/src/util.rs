pub(super) fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

pub(super) fn host_header_value(parsed: &url::Url) -> Option<String> {
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

/// Joins a base URL and an already-escaped path-and-query by plain concatenation.
///
/// `Url::join` would normalize `..` segments, which must reach the target verbatim.
#[must_use]
pub fn join_url(base: &str, path_and_query: &str) -> String {
    let base = base.trim_end_matches('/');
    if path_and_query.starts_with('/') {
        format!("{base}{path_and_query}")
    } else {
        format!("{base}/{path_and_query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_keeps_dot_segments() {
        assert_eq!(
            join_url("http://127.0.0.1:5000/", "/api/products/../../etc/passwd"),
            "http://127.0.0.1:5000/api/products/../../etc/passwd"
        );
        assert_eq!(
            join_url("http://h", "api/users"),
            "http://h/api/users"
        );
    }

    #[test]
    fn host_header_includes_explicit_port() {
        let parsed = url::Url::parse("http://localhost:5000/x").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(host_header_value(&parsed).as_deref(), Some("localhost:5000"));

        let parsed = url::Url::parse("http://example.com/x").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(host_header_value(&parsed).as_deref(), Some("example.com"));
    }
}
