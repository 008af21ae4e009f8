use boing_core::RequestOutcome;
use chrono::{DateTime, Local, Utc};

/// Status code, or the transport failure reason when there is none.
pub(crate) fn status_label(outcome: &RequestOutcome) -> String {
    match (outcome.status, outcome.failure) {
        (Some(code), _) => code.to_string(),
        (None, Some(kind)) => format!("ERR({kind})"),
        (None, None) => "ERR".to_string(),
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub(crate) fn format_clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub(crate) fn format_epoch(secs: f64) -> String {
    let millis = (secs * 1000.0) as i64;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map_or_else(|| "--:--:--".to_string(), format_clock)
}

pub(crate) fn format_elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let ms = (to - from).num_milliseconds().max(0);
    if ms >= 1000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}
