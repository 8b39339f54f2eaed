use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use custbench_core::{RunEvent, RunSummary};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _config: &custbench_core::RunConfig) {}

    fn events(&self) -> Option<custbench_core::EventFn> {
        Some(Arc::new(move |ev| {
            if let Some(line) = build_event_line(&ev) {
                emit_json_line(&line);
            }
        }))
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        write_json_line(&mut out, &build_summary_line(summary))?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum JsonEventLine {
    Request {
        seq: u64,
        submitted_at_ms: u64,
        duration_ms: u64,
        delayed: bool,
        ok: bool,
        customer_id: Option<String>,
        error_category: Option<String>,
        error_message: Option<String>,
    },
    Delayed {
        seq: u64,
        duration_ms: u64,
        threshold_ms: u64,
        customer_id: Option<String>,
        delayed_total: u64,
    },
    Draining {
        reason: String,
        active: u64,
        delayed: u64,
        total: u64,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub delayed_requests: u64,
    pub max_delayed_requests: u64,
    pub total_requests: u64,
    pub max_total_requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub failures_by_category: BTreeMap<String, u64>,
    pub stop_reason: String,
    pub elapsed_ms: u64,
    pub within_tolerance: bool,
}

/// `RequestFailed` has no line of its own; the error rides on the `request` line.
fn build_event_line(ev: &RunEvent) -> Option<JsonEventLine> {
    match ev {
        RunEvent::RequestFailed { .. } => None,
        RunEvent::RequestCompleted(outcome) => Some(JsonEventLine::Request {
            seq: outcome.seq,
            submitted_at_ms: outcome.submitted_at_ms,
            duration_ms: outcome.duration_ms,
            delayed: outcome.delayed,
            ok: outcome.is_success(),
            customer_id: outcome.customer_id().map(str::to_string),
            error_category: outcome.error().map(|e| e.category.to_string()),
            error_message: outcome.error().map(|e| e.message.clone()),
        }),
        RunEvent::RequestDelayed {
            seq,
            duration_ms,
            threshold_ms,
            customer_id,
            delayed_total,
        } => Some(JsonEventLine::Delayed {
            seq: *seq,
            duration_ms: *duration_ms,
            threshold_ms: *threshold_ms,
            customer_id: customer_id.clone(),
            delayed_total: *delayed_total,
        }),
        RunEvent::Draining { reason, snapshot } => Some(JsonEventLine::Draining {
            reason: reason.to_string(),
            active: snapshot.active,
            delayed: snapshot.delayed,
            total: snapshot.total,
        }),
    }
}

fn build_summary_line(summary: &RunSummary) -> JsonSummaryLine {
    JsonSummaryLine {
        kind: "summary",
        delayed_requests: summary.delayed_requests,
        max_delayed_requests: summary.max_delayed_requests,
        total_requests: summary.total_requests,
        max_total_requests: summary.max_total_requests,
        succeeded: summary.succeeded,
        failed: summary.failed,
        failures_by_category: summary
            .failures_by_category
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        stop_reason: summary.stop_reason.to_string(),
        elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
        within_tolerance: summary.within_tolerance(),
    }
}

/// Per-event lines are best effort; the summary line reports write failures.
fn emit_json_line<T: Serialize>(line: &T) {
    let _ = write_json_line(&mut std::io::stdout().lock(), line);
}

fn write_json_line<T: Serialize>(out: &mut impl std::io::Write, line: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
