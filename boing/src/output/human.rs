use std::sync::Arc;

use boing_core::{
    CampaignResult, DashboardSnapshot, IngestTally, LiveEvent, Monitor, ProgressFn,
    RequestOutcome, Scenario, ScenarioKind, StreamEnd, TrafficCategory,
};

mod format;
mod progress;
mod summary;

use progress::HumanProgress;
use summary::{
    render_campaigns, render_dashboard, render_event, render_ingest_summary, render_scenarios,
};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_scenarios(&self, scenarios: &[&'static Scenario]) {
        print!("{}", render_scenarios(scenarios));
    }

    fn print_plan(&self, target: &str, scenarios: &[&'static Scenario]) {
        println!("target: {target}");
        for s in scenarios {
            println!("campaign: {} ({} requests)", s.kind, s.request_count());
            self.progress.add(s.kind, s.request_count());
        }
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();
        Some(Arc::new(
            move |kind: ScenarioKind, outcome: &RequestOutcome| {
                progress.record(kind, outcome);
            },
        ))
    }

    fn print_campaigns(&self, results: &[CampaignResult], monitor: &Monitor) {
        self.progress.finish();
        print!(
            "{}",
            render_campaigns(
                results,
                monitor.snapshot(),
                &monitor.feed(),
                &monitor.narration()
            )
        );
    }

    fn live_event(&self, event: &LiveEvent) {
        println!("{}", render_event(event));
    }

    fn dashboard(&self, snapshot: &DashboardSnapshot) {
        print!("{}", render_dashboard(snapshot));
    }

    fn print_stream_end(&self, feed: &[LiveEvent], end: Option<&StreamEnd>) {
        println!();
        match end {
            Some(StreamEnd::Closed) => println!("live stream closed by the backend"),
            Some(StreamEnd::TransportError(err)) => eprintln!("live stream failed: {err}"),
            None => println!("stopped"),
        }
        if !feed.is_empty() {
            println!("last {} events:", feed.len());
            for ev in feed {
                println!("  {}", render_event(ev));
            }
        }
    }

    fn ingest_step(&self, category: TrafficCategory, accepted: bool, tally: &IngestTally) {
        let verdict = if accepted { "sent" } else { "rejected" };
        println!(
            "{:<10} {verdict:<8} (sent {} / rejected {})",
            category.to_string(),
            tally.sent(),
            tally.rejected
        );
        let steps = tally.sent() + tally.rejected;
        if steps > 0 && steps % 50 == 0 {
            print!("{}", render_ingest_summary(tally));
        }
    }

    fn print_ingest_summary(&self, tally: &IngestTally) {
        println!();
        print!("{}", render_ingest_summary(tally));
    }
}
