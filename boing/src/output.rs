use boing_core::{
    CampaignResult, DashboardSnapshot, IngestTally, LiveEvent, Monitor, ProgressFn, Scenario,
    StreamEnd, TrafficCategory,
};

use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_scenarios(&self, scenarios: &[&'static Scenario]);

    fn print_plan(&self, target: &str, scenarios: &[&'static Scenario]);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_campaigns(&self, results: &[CampaignResult], monitor: &Monitor);

    fn live_event(&self, event: &LiveEvent);
    fn dashboard(&self, snapshot: &DashboardSnapshot);
    fn print_stream_end(&self, feed: &[LiveEvent], end: Option<&StreamEnd>);

    fn ingest_step(&self, category: TrafficCategory, accepted: bool, tally: &IngestTally);
    fn print_ingest_summary(&self, tally: &IngestTally);
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
