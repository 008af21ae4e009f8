use anyhow::Context as _;
use boing_core::{HttpClient, IngestGenerator, IngestTally, wait_for_backend};

use crate::cli::IngestArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn ingest(args: IngestArgs) -> Result<ExitCode, RunError> {
    if args.min_delay > args.max_delay {
        return Err(RunError::invalid(anyhow::anyhow!(
            "--min-delay ({:?}) must not exceed --max-delay ({:?})",
            args.min_delay,
            args.max_delay
        )));
    }

    let out = output::formatter(args.output);
    let client = HttpClient::default();

    if args.wait_attempts > 0 {
        wait_for_backend(&client, &args.backend, args.wait_attempts, args.wait_delay)
            .await
            .with_context(|| format!("backend {} is not accepting telemetry", args.backend))
            .map_err(RunError::runtime)?;
    }

    let mut generator = IngestGenerator::new(client, &args.backend, &args.api_key);
    if let Some(upstream) = &args.upstream {
        generator = generator.with_upstream(upstream);
    }
    if let Some(seed) = args.seed {
        generator = generator.with_seed(seed);
    }

    let delay = args.min_delay..=args.max_delay;
    let limit = args.count.unwrap_or(u64::MAX);
    let mut tally = IngestTally::default();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut step = 0u64;
    while step < limit {
        if step > 0 {
            let pause = generator.next_delay(&delay);
            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                _ = &mut ctrl_c => break,
            }
        }
        let (category, res) = tokio::select! {
            r = generator.step() => r,
            _ = &mut ctrl_c => break,
        };
        tally.record(category, res.is_ok());
        out.ingest_step(category, res.is_ok(), &tally);
        step += 1;
    }

    out.print_ingest_summary(&tally);

    if tally.sent() == 0 && tally.rejected > 0 {
        return Err(RunError::runtime(anyhow::anyhow!(
            "backend rejected all {} records (check BOING_API_KEY)",
            tally.rejected
        )));
    }
    Ok(ExitCode::Success)
}
