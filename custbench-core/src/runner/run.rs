use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::config::RunConfig;
use super::counters::RunCounters;
use super::error::Result;
use super::events::{EventFn, RunEvent};
use super::gate::{Admission, AdmissionGate, StopReason};
use super::summary::RunSummary;
use super::worker::Worker;
use crate::{CustomerApi, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunPhase {
    Admitting,
    Draining,
    Terminated,
}

/// Drives a run to completion: admits workers until a stop condition trips, then waits for
/// every admitted worker before reporting.
///
/// Call failures never surface here; they are absorbed by the workers. A worker that panics
/// is counted as a failed request. The only error is an invalid `config`.
pub async fn run<A: CustomerApi>(
    config: RunConfig,
    api: Arc<A>,
    events: Option<EventFn>,
) -> Result<RunSummary> {
    config.validate()?;

    let config = Arc::new(config);
    let counters = Arc::new(RunCounters::default());
    let gate = AdmissionGate::new(&config);
    let started = Instant::now();

    let mut phase = RunPhase::Admitting;
    tracing::info!(
        %phase,
        max_active = config.max_active_requests,
        max_delayed = config.max_delayed_requests,
        max_total = config.max_total_requests,
        threshold_ms = config.delay_threshold_ms(),
        "run started"
    );

    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    let reason = loop {
        if let Some(reason) = wait_for_admission(&gate, &config, &counters).await {
            break reason;
        }

        let (seq, slot) = counters.admit();
        tracing::debug!(seq, "admitting request");

        let worker = Worker {
            seq,
            slot,
            config: config.clone(),
            counters: counters.clone(),
            api: api.clone(),
            events: events.clone(),
        };
        handles.push(tokio::spawn(worker.run()));
    };

    phase = transition(phase, RunPhase::Draining, Some(reason));
    let snapshot = counters.snapshot();
    if let Some(f) = &events {
        (f)(RunEvent::Draining { reason, snapshot });
    }

    for h in handles {
        if let Err(err) = h.await {
            tracing::error!(error = %err, "request worker panicked");
        }
    }
    let untallied = counters.record_untallied(ErrorCategory::Other);
    if untallied > 0 {
        tracing::warn!(untallied, "requests without an outcome counted as failed");
    }

    transition(phase, RunPhase::Terminated, None);

    Ok(RunSummary::collect(
        &config,
        &counters,
        reason,
        started.elapsed(),
    ))
}

/// Blocks until the gate admits (`None`) or stops (`Some(reason)`).
///
/// The wait is bounded: after `max_wait_iterations` fruitless re-checks the driver stops with
/// `WaitExhausted` instead of waiting on a counter that never moves.
async fn wait_for_admission(
    gate: &AdmissionGate,
    config: &RunConfig,
    counters: &RunCounters,
) -> Option<StopReason> {
    let mut waits: u64 = 0;
    loop {
        match gate.evaluate(counters.snapshot()) {
            Admission::Admit => return None,
            Admission::Stop(reason) => return Some(reason),
            Admission::Wait => {
                waits = waits.saturating_add(1);
                if waits > config.max_wait_iterations {
                    tracing::warn!(
                        waits,
                        snapshot = ?counters.snapshot(),
                        "capacity wait exhausted; draining"
                    );
                    return Some(StopReason::WaitExhausted);
                }
                counters
                    .wait_for_completion(config.wait_poll_interval)
                    .await;
            }
        }
    }
}

fn transition(from: RunPhase, to: RunPhase, reason: Option<StopReason>) -> RunPhase {
    match reason {
        Some(reason) => tracing::info!(%from, %to, %reason, "run phase changed"),
        None => tracing::info!(%from, %to, "run phase changed"),
    }
    to
}
