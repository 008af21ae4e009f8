use std::fmt::Write as _;

use boing_core::{
    CampaignResult, DashboardSnapshot, ExecutionMode, FeedEntry, IngestTally, LiveEvent,
    Narration, Scenario, StatsSnapshot,
};

use super::format::{format_clock, format_elapsed, format_epoch, status_label, truncate};

pub(crate) fn render_scenarios(scenarios: &[&Scenario]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<15} {:<10} {:>8} {:>8}  {}",
        "NAME", "MODE", "REQUESTS", "PACING", "DESCRIPTION"
    );
    for s in scenarios {
        let (mode, pacing) = match s.mode {
            ExecutionMode::Sequenced { pacing, .. } => {
                ("sequenced", format!("{}ms", pacing.as_millis()))
            }
            ExecutionMode::Burst { .. } => ("burst", "-".to_string()),
        };
        let marker = if s.flagged { " (marked suspicious)" } else { "" };
        let _ = writeln!(
            out,
            "{:<15} {:<10} {:>8} {:>8}  {} {}{marker}",
            s.kind.to_string(),
            mode,
            s.request_count(),
            pacing,
            s.method,
            s.template.pattern,
        );
    }
    out
}

pub(crate) fn render_campaigns(
    results: &[CampaignResult],
    stats: StatsSnapshot,
    feed: &[FeedEntry],
    narration: &[Narration],
) -> String {
    let mut out = String::new();

    for r in results {
        let _ = writeln!(
            out,
            "{:<15} requests={} suspicious={} errors={} failures={} elapsed={}",
            r.scenario.to_string(),
            r.outcomes.len(),
            r.suspicious_count(),
            r.error_count(),
            r.failure_count(),
            format_elapsed(r.started_at, r.finished_at),
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "total requests: {}  suspicious: {}  errors: {}",
        stats.total_requests, stats.suspicious_requests, stats.error_count
    );

    if !feed.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "recent activity:");
        for entry in feed {
            let o = &entry.outcome;
            let mut tags = Vec::new();
            if entry.style.suspicious {
                tags.push("suspicious");
            }
            if entry.style.error {
                tags.push("error");
            }
            let tags = if tags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", tags.join(", "))
            };
            let _ = writeln!(
                out,
                "  {} {:<6} {:<14} {}{tags}",
                format_clock(o.at),
                o.method.as_str(),
                status_label(o),
                truncate(&o.endpoint, 60),
            );
        }
    }

    if !narration.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "log:");
        // Stored newest first; read oldest first.
        for line in narration.iter().rev() {
            let _ = writeln!(out, "  [{}] {}", format_clock(line.at), line.message);
        }
    }

    out
}

pub(crate) fn render_event(event: &LiveEvent) -> String {
    let mut line = format!(
        "{} {:<6} {:>3} {:<15} {}",
        format_epoch(event.timestamp),
        event.method,
        event
            .status_code
            .map_or_else(|| "-".to_string(), |s| s.to_string()),
        event.client_ip,
        truncate(&event.endpoint, 60),
    );
    if event.is_suspicious {
        match event.risk_score {
            Some(risk) => {
                let _ = write!(line, "  [suspicious risk={risk:.2}]");
            }
            None => line.push_str("  [suspicious]"),
        }
    }
    line
}

pub(crate) fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let at = snapshot
        .refreshed_at
        .map_or_else(|| "--:--:--".to_string(), format_clock);

    match &snapshot.metrics {
        Some(m) => {
            let _ = writeln!(
                out,
                "metrics @ {at}: requests={} error_rate={:.1}% avg_latency={:.0}ms unique_ips={} suspicious={} alerts={}",
                m.total_requests,
                m.error_rate,
                m.avg_latency_ms,
                m.unique_ips,
                m.suspicious_requests,
                m.alerts_count,
            );
            if !m.top_endpoints.is_empty() {
                let top = m
                    .top_endpoints
                    .iter()
                    .take(5)
                    .map(|e| format!("{} ({})", truncate(&e.endpoint, 40), e.count))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "  top: {top}");
            }
        }
        None => {
            let _ = writeln!(out, "metrics @ {at}: unavailable");
        }
    }

    for alert in &snapshot.alerts {
        let ack = if alert.is_acknowledged { " (ack)" } else { "" };
        let _ = writeln!(
            out,
            "  [{}] {} score={:.0}{ack}",
            alert.severity, alert.title, alert.score
        );
    }
    out
}

pub(crate) fn render_ingest_summary(tally: &IngestTally) -> String {
    format!(
        "sent: {}  normal: {}  suspicious: {}  errors: {}  posts: {}  rejected: {}\n",
        tally.sent(),
        tally.normal,
        tally.suspicious,
        tally.errors,
        tally.posts,
        tally.rejected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use boing_core::{MetricsReport, ScenarioKind};

    #[test]
    fn scenarios_table_lists_every_campaign() {
        let all: Vec<_> = ScenarioKind::all().map(ScenarioKind::scenario).collect();
        let out = render_scenarios(&all);
        assert_eq!(out.lines().count(), 1 + all.len());
        assert!(out.contains("rate-limit"));
        assert!(out.contains("burst"));
        assert!(out.contains("/api/search?q={payload}"));
    }

    #[test]
    fn campaigns_summary_reports_totals() {
        let stats = StatsSnapshot {
            total_requests: 25,
            suspicious_requests: 5,
            error_count: 20,
        };
        let out = render_campaigns(&[], stats, &[], &[]);
        assert!(out.contains("total requests: 25  suspicious: 5  errors: 20"), "{out}");
        assert!(!out.contains("recent activity"));
    }

    #[test]
    fn suspicious_events_carry_their_risk() {
        let ev = LiveEvent {
            id: Some(1),
            api_id: Some(1),
            method: "GET".to_string(),
            endpoint: "/posts?id=' OR 1=1--".to_string(),
            status_code: Some(200),
            is_suspicious: true,
            client_ip: "192.168.1.7".to_string(),
            timestamp: 1_700_000_000.0,
            risk_score: Some(0.85),
        };
        let line = render_event(&ev);
        assert!(line.contains("192.168.1.7"));
        assert!(line.ends_with("[suspicious risk=0.85]"), "{line}");
    }

    #[test]
    fn events_without_status_show_a_dash() {
        let ev = LiveEvent {
            id: None,
            api_id: None,
            method: "GET".to_string(),
            endpoint: "/api/users".to_string(),
            status_code: None,
            is_suspicious: false,
            client_ip: "10.0.0.1".to_string(),
            timestamp: 1_700_000_000.0,
            risk_score: None,
        };
        let line = render_event(&ev);
        assert!(line.contains("GET      - 10.0.0.1"), "{line}");
    }

    #[test]
    fn dashboard_without_metrics_says_so() {
        let out = render_dashboard(&DashboardSnapshot::default());
        assert!(out.contains("unavailable"), "{out}");

        let snap = DashboardSnapshot {
            metrics: Some(MetricsReport {
                total_requests: 10,
                error_rate: 20.0,
                avg_latency_ms: 120.4,
                unique_ips: 3,
                suspicious_requests: 2,
                alerts_count: 1,
                top_endpoints: Vec::new(),
                requests_over_time: Vec::new(),
            }),
            alerts: Vec::new(),
            refreshed_at: None,
        };
        let out = render_dashboard(&snap);
        assert!(out.contains("requests=10 error_rate=20.0% avg_latency=120ms"), "{out}");
    }
}
