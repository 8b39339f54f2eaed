use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use custbench_core::{CounterSnapshot, RunConfig, RunEvent, RunSummary, StopReason};

use super::OutputFormatter;

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_delayed: u64,
    max_total: u64,
}

pub(crate) struct HumanReadableOutput {
    limits: Limits,
}

impl HumanReadableOutput {
    pub(crate) fn new(config: &RunConfig) -> Self {
        Self {
            limits: Limits {
                max_delayed: config.max_delayed_requests,
                max_total: config.max_total_requests,
            },
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, config: &RunConfig) {
        println!(
            "creating up to {} customers from {} ({} active, delayed after {}ms, stop after {} delayed)",
            config.max_total_requests,
            config.host_id,
            config.max_active_requests,
            config.delay_threshold_ms(),
            config.max_delayed_requests
        );
    }

    fn events(&self) -> Option<custbench_core::EventFn> {
        let limits = self.limits;
        Some(Arc::new(move |ev| {
            if let Some(line) = render_event(&ev, limits) {
                println!("{line}");
            }
        }))
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        write_summary(&mut out, summary)?;
        Ok(())
    }
}

fn write_summary(out: &mut impl Write, summary: &RunSummary) -> std::io::Result<()> {
    out.write_all(render_summary(summary).as_bytes())?;
    out.flush()
}

fn render_event(ev: &RunEvent, limits: Limits) -> Option<String> {
    match ev {
        RunEvent::RequestFailed { seq, error } => Some(format!(
            "Request {seq} failed ({}): {}",
            error.category, error.message
        )),
        RunEvent::RequestCompleted(outcome) => Some(format!(
            "### Request {} - {}ms",
            outcome.seq, outcome.duration_ms
        )),
        RunEvent::RequestDelayed {
            seq,
            duration_ms,
            threshold_ms,
            customer_id,
            ..
        } => Some(format!(
            "Took {duration_ms}ms {{> {threshold_ms}ms}} to create customer {} [{seq}]",
            customer_id.as_deref().unwrap_or("-")
        )),
        RunEvent::Draining { reason, snapshot } => Some(render_drain(*reason, *snapshot, limits)),
    }
}

fn render_drain(reason: StopReason, snap: CounterSnapshot, limits: Limits) -> String {
    match reason {
        StopReason::DelayedLimit => format!(
            "delayed requests [{}] reached max delayed requests [{}]; waiting for {} active requests",
            snap.delayed, limits.max_delayed, snap.active
        ),
        StopReason::TotalReached => format!(
            "total requests [{}] reached max total requests [{}]; waiting for {} active requests",
            snap.total, limits.max_total, snap.active
        ),
        StopReason::WaitExhausted => format!(
            "gave up waiting for capacity; waiting for {} active requests",
            snap.active
        ),
    }
}

fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    if summary.failed > 0 {
        let by_category = summary
            .failures_by_category
            .iter()
            .map(|(category, count)| format!("{category}={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            &mut out,
            "Failed requests: {} of {} ({by_category})",
            summary.failed, summary.total_requests
        )
        .ok();
    }

    writeln!(
        &mut out,
        "Final results: delayed = {} [{}]\ttotal = {} [{}]",
        summary.delayed_requests,
        summary.max_delayed_requests,
        summary.total_requests,
        summary.max_total_requests
    )
    .ok();
    out.push_str("All requests completed\n");
    out
}
