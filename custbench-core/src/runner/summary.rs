use std::collections::BTreeMap;
use std::time::Duration;

use super::config::RunConfig;
use super::counters::RunCounters;
use super::gate::StopReason;
use crate::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub delayed_requests: u64,
    pub max_delayed_requests: u64,
    pub total_requests: u64,
    pub max_total_requests: u64,

    pub succeeded: u64,
    pub failed: u64,
    pub failures_by_category: BTreeMap<ErrorCategory, u64>,

    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl RunSummary {
    pub(super) fn collect(
        config: &RunConfig,
        counters: &RunCounters,
        stop_reason: StopReason,
        elapsed: Duration,
    ) -> Self {
        let snap = counters.snapshot();
        Self {
            delayed_requests: snap.delayed,
            max_delayed_requests: config.max_delayed_requests,
            total_requests: snap.total,
            max_total_requests: config.max_total_requests,
            succeeded: counters.succeeded(),
            failed: counters.failed(),
            failures_by_category: counters.failures_by_category(),
            stop_reason,
            elapsed,
        }
    }

    /// True when neither the delayed nor the total count went past its limit.
    ///
    /// Reaching a limit exactly is a clean breaker trip.
    #[must_use]
    pub fn within_tolerance(&self) -> bool {
        self.delayed_requests <= self.max_delayed_requests
            && self.total_requests <= self.max_total_requests
    }
}
