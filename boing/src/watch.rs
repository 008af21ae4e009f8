use std::sync::Arc;

use anyhow::Context as _;
use boing_core::{
    BoundedFeed, HttpClient, LiveEvent, LiveStream, MetricsPoller, StreamEnd,
    live::stream_url_for_backend,
};

use crate::cli::WatchArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn watch(args: WatchArgs) -> Result<ExitCode, RunError> {
    let stream_url = match &args.stream_url {
        Some(url) => url.clone(),
        None => stream_url_for_backend(&args.backend).map_err(RunError::invalid)?,
    };
    if args.poll_interval.is_zero() {
        return Err(RunError::invalid(anyhow::anyhow!(
            "--poll-interval must be greater than zero"
        )));
    }
    if args.token.is_none() {
        tracing::warn!("no BOING_TOKEN set; metrics and alerts requests will be unauthenticated");
    }

    let out = output::formatter(args.output);
    let stream = LiveStream::connect(&stream_url)
        .await
        .with_context(|| format!("connect live stream {stream_url}"))
        .map_err(RunError::runtime)?;

    let poller = Arc::new(MetricsPoller::new(
        HttpClient::default(),
        &args.backend,
        args.token.clone(),
    ));
    let mut snapshots = poller.subscribe();
    let poll_task = {
        let poller = poller.clone();
        let interval = args.poll_interval;
        tokio::spawn(async move { poller.run(interval).await })
    };

    let feed = BoundedFeed::<LiveEvent>::live();
    let out_ref = &*out;

    let dashboard = async {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            out_ref.dashboard(&snapshot);
        }
    };
    let stop = async {
        match args.duration {
            Some(d) => tokio::time::sleep(d).await,
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };

    let end = tokio::select! {
        end = stream.run(&feed, |ev| out_ref.live_event(ev)) => Some(end),
        () = dashboard => None,
        () = stop => None,
    };
    poll_task.abort();

    out.print_stream_end(&feed.list(), end.as_ref());
    match end {
        Some(StreamEnd::TransportError(err)) => Err(RunError::runtime(anyhow::anyhow!(
            "live stream {stream_url} failed: {err}"
        ))),
        _ => Ok(ExitCode::Success),
    }
}
