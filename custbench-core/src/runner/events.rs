use std::sync::Arc;

use super::counters::CounterSnapshot;
use super::gate::StopReason;
use super::outcome::RequestOutcome;
use crate::ClassifiedError;

#[derive(Debug, Clone)]
pub enum RunEvent {
    /// The remote call failed. Emitted before `RequestCompleted` for the same request.
    RequestFailed { seq: u64, error: ClassifiedError },

    /// Emitted for every request, successful or not.
    RequestCompleted(RequestOutcome),

    RequestDelayed {
        seq: u64,
        duration_ms: u64,
        threshold_ms: u64,
        /// Missing when the call failed and no customer was created.
        customer_id: Option<String>,
        delayed_total: u64,
    },

    /// Admission stopped; outstanding requests are being drained.
    Draining {
        reason: StopReason,
        snapshot: CounterSnapshot,
    },
}

pub type EventFn = Arc<dyn Fn(RunEvent) + Send + Sync + 'static>;
