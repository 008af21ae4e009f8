use std::process::Command;
use std::time::Duration;

use anyhow::Context as _;
use boing_testserver::{TEST_API_KEY, TEST_TOKEN, TestServer};

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .collect()
}

#[tokio::test]
async fn e2e_ingest_posts_the_requested_count() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let backend = server.base_url().to_string();
    let exe = env!("CARGO_BIN_EXE_boing");

    let output = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args([
                "ingest",
                "--backend",
                &backend,
                "--api-key",
                TEST_API_KEY,
                "--count",
                "8",
                "--min-delay",
                "0ms",
                "--max-delay",
                "5ms",
                "--seed",
                "11",
                "--output",
                "json",
            ])
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run boing binary")?;

    let ingested = server.ingested();
    server.shutdown().await;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    anyhow::ensure!(
        output.status.success(),
        "boing exited with {}\nstdout:\n{stdout}\nstderr:\n{stderr}",
        output.status
    );

    let lines = json_lines(&stdout);
    let steps = lines.iter().filter(|v| v["kind"] == "ingest").count();
    let summary = lines
        .iter()
        .find(|v| v["kind"] == "summary")
        .context("missing summary")?;

    anyhow::ensure!(steps == 8, "stdout:\n{stdout}");
    anyhow::ensure!(summary["sent"] == 8, "summary: {summary}");
    anyhow::ensure!(summary["rejected"] == 0, "summary: {summary}");
    anyhow::ensure!(ingested == 8, "ingested {ingested}");

    Ok(())
}

#[tokio::test]
async fn e2e_ingest_with_wrong_key_exit_40() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let backend = server.base_url().to_string();
    let exe = env!("CARGO_BIN_EXE_boing");

    let output = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args([
                "ingest",
                "--backend",
                &backend,
                "--api-key",
                "wrong",
                "--count",
                "3",
                "--min-delay",
                "0ms",
                "--max-delay",
                "0ms",
            ])
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run boing binary")?;

    server.shutdown().await;

    anyhow::ensure!(
        output.status.code() == Some(40),
        "expected exit code 40, got {:?}\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(())
}

#[tokio::test]
async fn e2e_watch_prints_events_until_the_stream_closes() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let backend = server.base_url().to_string();
    let exe = env!("CARGO_BIN_EXE_boing");

    let child = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args([
                "watch",
                "--backend",
                &backend,
                "--token",
                TEST_TOKEN,
                "--duration",
                "20s",
                "--output",
                "json",
            ])
            .output()
    });

    tokio::time::timeout(Duration::from_secs(10), async {
        while server.live_clients() == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("watch never connected")?;

    for id in 1..=3 {
        server.broadcast_raw(
            serde_json::json!({
                "type": "request_log",
                "data": {
                    "id": id,
                    "method": "GET",
                    "endpoint": "/api/users",
                    "client_ip": "10.1.1.1",
                    "status_code": 200,
                    "is_suspicious": false,
                    "timestamp": 1_700_000_000.0,
                },
            })
            .to_string(),
        );
    }
    server.close_live_streams();

    let output = child
        .await
        .context("spawn_blocking join")?
        .context("run boing binary")?;
    server.shutdown().await;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    anyhow::ensure!(
        output.status.success(),
        "boing exited with {}\nstdout:\n{stdout}\nstderr:\n{stderr}",
        output.status
    );

    let lines = json_lines(&stdout);
    let events = lines.iter().filter(|v| v["kind"] == "event").count();
    let summary = lines
        .iter()
        .find(|v| v["kind"] == "summary")
        .context("missing summary")?;
    anyhow::ensure!(events == 3, "stdout:\n{stdout}");
    anyhow::ensure!(summary["end"] == "closed", "summary: {summary}");
    anyhow::ensure!(
        summary["feed"].as_array().map(Vec::len) == Some(3),
        "summary: {summary}"
    );

    Ok(())
}
