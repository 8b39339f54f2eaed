use std::process::{Command, Output};

use anyhow::Context as _;
use custbench_testserver::{FailureMode, TestServer, TestServerBehavior};

const KEY: &str = "sk_test_e2e";

async fn run_against(server: &TestServer, extra: &[&str]) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_custbench");
    let base_url = server.base_url().to_string();
    let extra: Vec<String> = extra.iter().map(|s| s.to_string()).collect();

    tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .env_remove("RUST_LOG")
            .args(["--key", KEY, "--host-id", "e2e-host"])
            .arg("--base-url")
            .arg(&base_url)
            .args(&extra)
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run custbench binary")
}

fn json_lines(out: &Output) -> anyhow::Result<Vec<serde_json::Value>> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).with_context(|| format!("not json: {l}")))
        .collect()
}

fn kind_count(lines: &[serde_json::Value], kind: &str) -> usize {
    lines.iter().filter(|v| v["kind"] == kind).count()
}

#[tokio::test]
async fn json_run_reports_every_request_and_a_summary() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerBehavior {
        api_key: Some(KEY.to_string()),
        ..TestServerBehavior::default()
    })
    .await?;

    let out = run_against(&server, &["--total", "5", "--active", "2", "--output", "json"]).await?;
    let descriptions = server.stats().descriptions();
    let max_in_flight = server.stats().max_in_flight();
    server.shutdown().await;

    anyhow::ensure!(
        out.status.code() == Some(0),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );

    let lines = json_lines(&out)?;
    assert_eq!(kind_count(&lines, "request"), 5);
    assert_eq!(kind_count(&lines, "draining"), 1);
    assert_eq!(kind_count(&lines, "delayed"), 0);

    let summary = lines
        .last()
        .ok_or_else(|| anyhow::anyhow!("no output lines"))?;
    assert_eq!(summary["kind"], "summary");
    assert_eq!(summary["total_requests"], 5);
    assert_eq!(summary["succeeded"], 5);
    assert_eq!(summary["stop_reason"], "total_reached");
    assert_eq!(summary["within_tolerance"], true);

    assert!(
        lines
            .iter()
            .filter(|v| v["kind"] == "request")
            .all(|v| v["customer_id"].as_str().is_some_and(|id| id.starts_with("cus_")))
    );

    assert!((1..=2).contains(&max_in_flight), "max_in_flight={max_in_flight}");
    assert_eq!(descriptions.len(), 5);
    assert!(
        descriptions
            .iter()
            .all(|d| d.starts_with("Connectivity Test ") && d.contains(" from e2e-host at "))
    );
    Ok(())
}

#[tokio::test]
async fn human_output_prints_failures_and_final_tally() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerBehavior {
        failure: FailureMode::CardDeclined,
        ..TestServerBehavior::default()
    })
    .await?;

    let out = run_against(&server, &["--total", "3", "--active", "1"]).await?;
    server.shutdown().await;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(out.status.code() == Some(0), "stdout:\n{stdout}");

    assert_eq!(stdout.matches("### Request ").count(), 3, "{stdout}");
    assert_eq!(
        stdout.matches("failed (card_declined)").count(),
        3,
        "{stdout}"
    );
    assert!(stdout.contains("Failed requests: 3 of 3 (card_declined=3)"));
    assert!(stdout.contains("Final results: delayed = 0 [20]\ttotal = 3 [3]"));
    assert!(stdout.trim_end().ends_with("All requests completed"));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        !stderr.contains("create customer failed"),
        "failures are reported on stdout only:\n{stderr}"
    );
    Ok(())
}

#[tokio::test]
async fn debug_flag_logs_parameters_without_the_key() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let out = run_against(&server, &["--total", "1", "-D", "--output", "json"]).await?;
    server.shutdown().await;

    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::ensure!(out.status.code() == Some(0), "stderr:\n{stderr}");
    assert!(stderr.contains("run parameters"), "{stderr}");
    assert!(stderr.contains("key_len=11"), "{stderr}");
    assert!(!stderr.contains(KEY), "key leaked:\n{stderr}");
    Ok(())
}
