use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

use super::config::RunConfig;
use super::counters::{ActiveSlot, RunCounters};
use super::events::{EventFn, RunEvent};
use super::latency::is_delayed;
use super::outcome::RequestOutcome;
use crate::CustomerApi;

pub const DESCRIPTION_PREFIX: &str = "Connectivity Test";

/// Description attached to each created customer so requests can be traced on the remote side.
#[must_use]
pub fn request_description(seq: u64, host_id: &str, submitted_at_ms: u64) -> String {
    format!("{DESCRIPTION_PREFIX} {seq} from {host_id} at {submitted_at_ms} ms since epoch")
}

pub(super) struct Worker<A> {
    pub seq: u64,
    pub slot: ActiveSlot,
    pub config: Arc<RunConfig>,
    pub counters: Arc<RunCounters>,
    pub api: Arc<A>,
    pub events: Option<EventFn>,
}

impl<A: CustomerApi> Worker<A> {
    /// Performs exactly one remote call. Never fails: call errors are recorded and reported.
    pub async fn run(self) {
        let Self {
            seq,
            slot,
            config,
            counters,
            api,
            events,
        } = self;

        let _done = counters.completion_signal();

        let submitted_at_ms = epoch_millis();
        let description = request_description(seq, &config.host_id, submitted_at_ms);

        let started = Instant::now();
        let result = api.create_customer(description).await;
        let finished = Instant::now();

        // Free the slot before latency is evaluated.
        drop(slot);

        let duration_ms =
            u64::try_from(finished.duration_since(started).as_millis()).unwrap_or(u64::MAX);
        let threshold_ms = config.delay_threshold_ms();
        let delayed = is_delayed(duration_ms, threshold_ms);

        match &result {
            Ok(customer) => {
                counters.record_success();
                tracing::debug!(seq, duration_ms, customer_id = %customer.id, "customer created");
            }
            Err(err) => {
                counters.record_failure(err.category);
                tracing::debug!(
                    seq,
                    duration_ms,
                    category = %err.category,
                    error = %err.message,
                    "create customer failed"
                );
                emit(
                    &events,
                    RunEvent::RequestFailed {
                        seq,
                        error: err.clone(),
                    },
                );
            }
        }

        let outcome = RequestOutcome {
            seq,
            submitted_at_ms,
            started,
            finished,
            duration_ms,
            delayed,
            result,
        };

        let delayed_event = if delayed {
            let delayed_total = counters.record_delayed();
            tracing::info!(
                seq,
                duration_ms,
                threshold_ms,
                delayed_total,
                "request exceeded delay threshold"
            );
            Some(RunEvent::RequestDelayed {
                seq,
                duration_ms,
                threshold_ms,
                customer_id: outcome.customer_id().map(str::to_string),
                delayed_total,
            })
        } else {
            None
        };

        emit(&events, RunEvent::RequestCompleted(outcome));
        if let Some(ev) = delayed_event {
            emit(&events, ev);
        }
    }
}

fn emit(events: &Option<EventFn>, ev: RunEvent) {
    if let Some(f) = events {
        (f)(ev);
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
