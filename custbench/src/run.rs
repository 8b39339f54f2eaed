use anyhow::Context as _;
use std::sync::Arc;
use std::time::Duration;

use custbench_core::RunConfig;
use custbench_stripe::StripeClient;

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let host_id = match args.host_id.clone() {
        Some(id) => id,
        None => local_host_id().map_err(RunError::RuntimeError)?,
    };

    let config = run_config(&args, host_id);
    config.validate()?;

    let api = StripeClient::new(&args.key, &args.base_url, args.timeout)
        .context("invalid API client settings")
        .map_err(RunError::InvalidInput)?;

    if args.debug {
        log_run_parameters(&args, &config);
    }

    let out = output::formatter(args.output, &config);
    out.print_header(&config);

    let summary = custbench_core::run(config, Arc::new(api), out.events()).await?;

    out.print_summary(&summary)
        .context("failed to print summary")
        .map_err(RunError::RuntimeError)?;

    tracing::debug!(
        stop_reason = %summary.stop_reason,
        elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
        within_tolerance = summary.within_tolerance(),
        "run finished"
    );

    Ok(ExitCode::from_tolerance(summary.within_tolerance()))
}

fn run_config(args: &RunArgs, host_id: String) -> RunConfig {
    RunConfig {
        delay_threshold: Duration::from_millis(args.deadline),
        max_active_requests: args.active,
        max_delayed_requests: args.delayed,
        max_total_requests: args.total,
        ..RunConfig::new(host_id)
    }
}

fn local_host_id() -> anyhow::Result<String> {
    sysinfo::System::host_name()
        .filter(|name| !name.trim().is_empty())
        .context("failed to determine hostname (use --host-id to set one)")
}

fn log_run_parameters(args: &RunArgs, config: &RunConfig) {
    tracing::debug!(
        debug = args.debug,
        delay_threshold_ms = config.delay_threshold_ms(),
        max_active_requests = config.max_active_requests,
        max_delayed_requests = config.max_delayed_requests,
        max_total_requests = config.max_total_requests,
        host_id = %config.host_id,
        base_url = %args.base_url,
        timeout = ?args.timeout,
        "run parameters"
    );
    tracing::debug!(
        key_len = args.key.len(),
        key = %key_fingerprint(&args.key),
        "api key"
    );
}

/// Keeps the first and last four characters of long keys; short keys are fully masked.
fn key_fingerprint(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}
