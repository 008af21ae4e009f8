use std::sync::Arc;

use boing_core::{HttpClient, Monitor, Orchestrator, ScenarioKind};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

fn selected(args: &RunArgs) -> Vec<ScenarioKind> {
    let mut kinds: Vec<ScenarioKind> = if args.all {
        ScenarioKind::all().collect()
    } else {
        args.scenarios.clone()
    };
    // `sqli xss sqli` runs each campaign once.
    let mut seen = Vec::with_capacity(kinds.len());
    kinds.retain(|k| {
        if seen.contains(k) {
            false
        } else {
            seen.push(*k);
            true
        }
    });
    kinds
}

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let kinds = selected(&args);
    if kinds.is_empty() {
        return Err(RunError::invalid(anyhow::anyhow!("no campaigns selected")));
    }

    let out = output::formatter(args.output);
    let scenarios: Vec<_> = kinds.iter().map(|k| k.scenario()).collect();
    out.print_plan(&args.target, &scenarios);

    let monitor = Arc::new(Monitor::new());
    let client = HttpClient::new(Some(args.connect_timeout));
    let mut orchestrator = Orchestrator::new(client, &args.target, monitor.clone());
    if let Some(progress) = out.progress() {
        orchestrator = orchestrator.with_progress(progress);
    }

    let results = if args.sequential {
        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            results.push(orchestrator.run(scenario).await);
        }
        results
    } else {
        orchestrator.run_many(&kinds).await
    };

    out.print_campaigns(&results, &monitor);
    Ok(ExitCode::Success)
}
