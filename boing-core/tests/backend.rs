use std::time::Duration;

use anyhow::Context as _;
use boing_core::{
    Error, HttpClient, IngestGenerator, MetricsPoller, TrafficCategory, wait_for_backend,
};
use boing_testserver::{TEST_API_KEY, TEST_TOKEN, TestServer};

#[tokio::test]
async fn poller_fetches_metrics_and_recent_alerts() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let mut generator =
        IngestGenerator::new(HttpClient::default(), server.base_url(), TEST_API_KEY).with_seed(1);
    for category in [
        TrafficCategory::Suspicious,
        TrafficCategory::Error,
        TrafficCategory::Normal,
    ] {
        let log = generator.synthesize(category).await;
        generator.send(&log).await.context("ingest")?;
    }
    for _ in 0..6 {
        let log = generator.synthesize(TrafficCategory::Suspicious).await;
        generator.send(&log).await.context("ingest")?;
    }

    let poller = MetricsPoller::new(
        HttpClient::default(),
        server.base_url(),
        Some(TEST_TOKEN.to_string()),
    );
    let mut rx = poller.subscribe();
    poller.poll_once().await.context("poll")?;
    server.shutdown().await;

    anyhow::ensure!(rx.has_changed()?, "watch channel not notified");
    let snap = rx.borrow_and_update().clone();
    let metrics = snap.metrics.clone().context("metrics missing")?;
    anyhow::ensure!(metrics.total_requests == 9, "metrics: {metrics:?}");
    anyhow::ensure!(metrics.suspicious_requests == 7, "metrics: {metrics:?}");
    anyhow::ensure!(metrics.alerts_count == 7, "metrics: {metrics:?}");
    anyhow::ensure!(snap.alerts.len() == 5, "alerts: {:?}", snap.alerts);
    anyhow::ensure!(snap.refreshed_at.is_some());
    anyhow::ensure!(poller.latest() == snap);

    Ok(())
}

#[tokio::test]
async fn poller_keeps_previous_snapshot_when_unauthorized() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let poller = MetricsPoller::new(
        HttpClient::default(),
        server.base_url(),
        Some("wrong".to_string()),
    );
    let res = poller.poll_once().await;
    server.shutdown().await;

    match res {
        Err(Error::Backend { status: 401, .. }) => {}
        other => anyhow::bail!("expected 401 backend error, got {other:?}"),
    }
    let snap = poller.latest();
    anyhow::ensure!(snap.metrics.is_none() && snap.alerts.is_empty());
    anyhow::ensure!(snap.refreshed_at.is_none());

    Ok(())
}

#[tokio::test]
async fn ingest_mix_is_accepted_by_the_backend() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let client = HttpClient::default();

    wait_for_backend(&client, server.base_url(), 3, Duration::from_millis(10))
        .await
        .context("backend ready")?;

    let mut generator = IngestGenerator::new(client, server.base_url(), TEST_API_KEY).with_seed(99);
    let tally = generator.run(25, Duration::ZERO..=Duration::ZERO).await;
    let ingested = server.ingested();
    server.shutdown().await;

    anyhow::ensure!(tally.sent() == 25, "tally: {tally:?}");
    anyhow::ensure!(tally.rejected == 0, "tally: {tally:?}");
    anyhow::ensure!(ingested == 25, "ingested {ingested}");

    Ok(())
}

#[tokio::test]
async fn ingest_with_unknown_key_is_rejected_not_retried() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let mut generator =
        IngestGenerator::new(HttpClient::default(), server.base_url(), "nope").with_seed(3);
    let tally = generator.run(5, Duration::ZERO..=Duration::ZERO).await;
    let ingested = server.ingested();
    let attempts = server.stats().requests_total();
    server.shutdown().await;

    anyhow::ensure!(tally.rejected == 5 && tally.sent() == 0, "tally: {tally:?}");
    anyhow::ensure!(ingested == 0);
    anyhow::ensure!(attempts == 5, "requests {attempts}");

    Ok(())
}

#[tokio::test]
async fn wait_for_backend_gives_up_after_attempts() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let res = wait_for_backend(
        &HttpClient::default(),
        &format!("http://{addr}"),
        2,
        Duration::from_millis(10),
    )
    .await;

    match res {
        Err(Error::BackendNotReady { attempts: 2 }) => Ok(()),
        other => anyhow::bail!("expected BackendNotReady, got {other:?}"),
    }
}
