use std::io::Write as _;
use std::sync::Arc;

use boing_core::{
    CampaignResult, DashboardSnapshot, ExecutionMode, FeedEntry, IngestTally, LiveEvent, Monitor,
    Narration, ProgressFn, RequestOutcome, Scenario, ScenarioKind, StatsSnapshot, StreamEnd,
    TrafficCategory,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_scenarios(&self, scenarios: &[&'static Scenario]) {
        for s in scenarios {
            emit_json_line(&build_scenario_line(s));
        }
    }

    fn print_plan(&self, _target: &str, _scenarios: &[&'static Scenario]) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(|kind: ScenarioKind, outcome: &RequestOutcome| {
            emit_json_line(&JsonOutcomeLine {
                kind: "outcome",
                scenario: kind.to_string(),
                outcome,
            });
        }))
    }

    fn print_campaigns(&self, results: &[CampaignResult], monitor: &Monitor) {
        emit_json_line(&build_summary_line(
            results,
            monitor.snapshot(),
            monitor.feed(),
            monitor.narration(),
        ));
    }

    fn live_event(&self, event: &LiveEvent) {
        emit_json_line(&JsonEventLine {
            kind: "event",
            event,
        });
    }

    fn dashboard(&self, snapshot: &DashboardSnapshot) {
        emit_json_line(&JsonMetricsLine {
            kind: "metrics",
            snapshot,
        });
    }

    fn print_stream_end(&self, feed: &[LiveEvent], end: Option<&StreamEnd>) {
        let (end, error) = match end {
            None => ("stopped", None),
            Some(StreamEnd::Closed) => ("closed", None),
            Some(StreamEnd::TransportError(e)) => ("transport_error", Some(e.clone())),
        };
        emit_json_line(&JsonStreamSummaryLine {
            kind: "summary",
            end,
            error,
            feed,
        });
    }

    fn ingest_step(&self, category: TrafficCategory, accepted: bool, _tally: &IngestTally) {
        emit_json_line(&JsonIngestLine {
            kind: "ingest",
            category: category.to_string(),
            accepted,
        });
    }

    fn print_ingest_summary(&self, tally: &IngestTally) {
        emit_json_line(&JsonIngestSummaryLine {
            kind: "summary",
            sent: tally.sent(),
            tally,
        });
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonScenarioLine {
    pub kind: &'static str,
    pub name: String,
    pub title: &'static str,
    pub method: String,
    pub mode: &'static str,
    pub requests: usize,
    pub pacing_ms: Option<u64>,
    pub flagged: bool,
}

fn build_scenario_line(s: &Scenario) -> JsonScenarioLine {
    let (mode, pacing_ms) = match s.mode {
        ExecutionMode::Sequenced { pacing, .. } => ("sequenced", Some(pacing.as_millis() as u64)),
        ExecutionMode::Burst { .. } => ("burst", None),
    };
    JsonScenarioLine {
        kind: "scenario",
        name: s.kind.to_string(),
        title: s.title,
        method: s.method.to_string(),
        mode,
        requests: s.request_count(),
        pacing_ms,
        flagged: s.flagged,
    }
}

#[derive(Debug, Serialize)]
struct JsonOutcomeLine<'a> {
    kind: &'static str,
    scenario: String,
    #[serde(flatten)]
    outcome: &'a RequestOutcome,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonCampaignSummary {
    pub scenario: String,
    pub requests: usize,
    pub suspicious: usize,
    pub errors: usize,
    pub failures: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub campaigns: Vec<JsonCampaignSummary>,
    pub stats: StatsSnapshot,
    pub feed: Vec<FeedEntry>,
    pub narration: Vec<Narration>,
}

fn build_summary_line(
    results: &[CampaignResult],
    stats: StatsSnapshot,
    feed: Vec<FeedEntry>,
    narration: Vec<Narration>,
) -> JsonSummaryLine {
    let campaigns = results
        .iter()
        .map(|r| JsonCampaignSummary {
            scenario: r.scenario.to_string(),
            requests: r.outcomes.len(),
            suspicious: r.suspicious_count(),
            errors: r.error_count(),
            failures: r.failure_count(),
            started_at: r.started_at,
            finished_at: r.finished_at,
        })
        .collect();

    JsonSummaryLine {
        kind: "summary",
        campaigns,
        stats,
        feed,
        narration,
    }
}

#[derive(Debug, Serialize)]
struct JsonEventLine<'a> {
    kind: &'static str,
    #[serde(flatten)]
    event: &'a LiveEvent,
}

#[derive(Debug, Serialize)]
struct JsonMetricsLine<'a> {
    kind: &'static str,
    #[serde(flatten)]
    snapshot: &'a DashboardSnapshot,
}

#[derive(Debug, Serialize)]
struct JsonStreamSummaryLine<'a> {
    kind: &'static str,
    end: &'static str,
    error: Option<String>,
    feed: &'a [LiveEvent],
}

#[derive(Debug, Serialize)]
struct JsonIngestLine {
    kind: &'static str,
    category: String,
    accepted: bool,
}

#[derive(Debug, Serialize)]
struct JsonIngestSummaryLine<'a> {
    kind: &'static str,
    sent: u64,
    #[serde(flatten)]
    tally: &'a IngestTally,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_value<T: Serialize>(v: &T) -> Value {
        match serde_json::to_value(v) {
            Ok(v) => v,
            Err(err) => panic!("serialize: {err}"),
        }
    }

    #[test]
    fn scenario_line_describes_mode_and_size() {
        let v = to_value(&build_scenario_line(ScenarioKind::RateLimit.scenario()));
        assert_eq!(v["kind"], "scenario");
        assert_eq!(v["name"], "rate-limit");
        assert_eq!(v["mode"], "burst");
        assert_eq!(v["requests"], 150);
        assert!(v["pacing_ms"].is_null());

        let v = to_value(&build_scenario_line(ScenarioKind::ErrorFlood.scenario()));
        assert_eq!(v["mode"], "sequenced");
        assert_eq!(v["pacing_ms"], 100);
        assert_eq!(v["requests"], 20);
    }

    #[test]
    fn summary_line_has_kind_and_counters() {
        let stats = StatsSnapshot {
            total_requests: 3,
            suspicious_requests: 1,
            error_count: 2,
        };
        let v = to_value(&build_summary_line(&[], stats, Vec::new(), Vec::new()));
        assert_eq!(v["kind"], "summary");
        assert_eq!(v["stats"]["total_requests"], 3);
        assert_eq!(v["stats"]["suspicious_requests"], 1);
        assert_eq!(v["stats"]["error_count"], 2);
        assert!(v["campaigns"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn ingest_summary_flattens_the_tally() {
        let tally = IngestTally {
            normal: 4,
            suspicious: 1,
            errors: 2,
            posts: 1,
            rejected: 3,
        };
        let v = to_value(&JsonIngestSummaryLine {
            kind: "summary",
            sent: tally.sent(),
            tally: &tally,
        });
        assert_eq!(v["sent"], 8);
        assert_eq!(v["rejected"], 3);
        assert_eq!(v["normal"], 4);
    }
}
