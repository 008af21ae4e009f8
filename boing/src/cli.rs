use std::time::Duration;

use boing_core::ScenarioKind;
use clap::{Args, Parser, Subcommand};

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }
    humantime::parse_duration(s)
        .map_err(|err| format!("invalid duration '{s}': {err} (expected e.g. 10s, 250ms, 1m)"))
}

fn parse_scenario(input: &str) -> Result<ScenarioKind, String> {
    input.trim().parse::<ScenarioKind>().map_err(|_| {
        let known = ScenarioKind::all()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown scenario '{input}' (expected one of: {known})")
    })
}

fn parse_http_url(input: &str) -> Result<String, String> {
    let s = input.trim().trim_end_matches('/');
    let parsed = url::Url::parse(s).map_err(|err| format!("invalid url '{s}': {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(s.to_string()),
        other => Err(format!("unsupported scheme '{other}' in '{s}' (expected http or https)")),
    }
}

fn parse_ws_url(input: &str) -> Result<String, String> {
    let s = input.trim();
    let parsed = url::Url::parse(s).map_err(|err| format!("invalid url '{s}': {err}"))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(s.to_string()),
        other => Err(format!("unsupported scheme '{other}' in '{s}' (expected ws or wss)")),
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bars and a human-readable summary.
    HumanReadable,
    /// Emit NDJSON lines to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "boing",
    author,
    version,
    about = "Traffic generator and live monitor for the Boing API security backend",
    long_about = "boing drives scripted traffic campaigns (attacks and baseline traffic) against a target API so the Boing backend has something to detect, and follows what the backend observes.\n\nCampaign statistics are local to one invocation; the live feed and metrics come from the backend.",
    after_help = "Examples:\n  boing scenarios\n  boing run sql-injection xss\n  boing run --all --target http://localhost:5000 --output json\n  boing watch --backend http://localhost:8000 --duration 1m\n  boing ingest --api-key $BOING_API_KEY --count 200"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the built-in traffic campaigns
    Scenarios(ScenariosArgs),

    /// Run one or more campaigns against the target API
    #[command(
        long_about = "Run campaigns against the target API. Several campaigns run concurrently and share one set of counters.\n\nTransport failures are recorded as outcomes and never abort a campaign."
    )]
    Run(RunArgs),

    /// Follow the backend's live request feed and refresh its metrics
    Watch(WatchArgs),

    /// Post a synthetic telemetry mix straight to the backend's ingest endpoint
    Ingest(IngestArgs),
}

#[derive(Debug, Args)]
pub struct ScenariosArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Campaigns to run (see `boing scenarios`)
    #[arg(
        value_name = "SCENARIO",
        value_parser = parse_scenario,
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    pub scenarios: Vec<ScenarioKind>,

    /// Run every built-in campaign
    #[arg(long)]
    pub all: bool,

    /// Run campaigns one after another instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Base URL of the target API
    #[arg(
        long,
        env = "BOING_TARGET_URL",
        default_value = "http://localhost:5000",
        value_parser = parse_http_url
    )]
    pub target: String,

    /// TCP connect timeout for target requests (e.g. 3s, 500ms)
    #[arg(long, value_parser = parse_duration, default_value = "3s")]
    pub connect_timeout: Duration,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Base URL of the Boing backend
    #[arg(
        long,
        env = "BOING_BACKEND_URL",
        default_value = "http://localhost:8000",
        value_parser = parse_http_url
    )]
    pub backend: String,

    /// Live feed URL (defaults to ws://<backend>/ws/live)
    #[arg(long, env = "BOING_STREAM_URL", value_parser = parse_ws_url)]
    pub stream_url: Option<String>,

    /// Bearer token for the metrics and alerts endpoints
    #[arg(long, env = "BOING_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// How often metrics and alerts are refreshed
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub poll_interval: Duration,

    /// Stop after this long (otherwise run until Ctrl+C or the stream closes)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Base URL of the Boing backend
    #[arg(
        long,
        env = "BOING_BACKEND_URL",
        default_value = "http://localhost:8000",
        value_parser = parse_http_url
    )]
    pub backend: String,

    /// API key registered with the backend
    #[arg(long, env = "BOING_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Number of records to send (otherwise run until Ctrl+C)
    #[arg(long)]
    pub count: Option<u64>,

    /// Shortest pause between records
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    pub min_delay: Duration,

    /// Longest pause between records
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub max_delay: Duration,

    /// Time normal traffic against this real API instead of synthesizing latencies
    #[arg(long, value_parser = parse_http_url)]
    pub upstream: Option<String>,

    /// Readiness probes before giving up (0 skips the probe)
    #[arg(long, default_value_t = 30)]
    pub wait_attempts: u32,

    /// Pause between readiness probes
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    pub wait_delay: Duration,

    /// Seed for a reproducible traffic mix
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
