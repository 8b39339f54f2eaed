mod config;
mod counters;
mod error;
mod events;
mod gate;
mod latency;
mod outcome;
mod run;
mod summary;
mod worker;

pub use config::{
    DEFAULT_DELAY_THRESHOLD, DEFAULT_MAX_ACTIVE_REQUESTS, DEFAULT_MAX_DELAYED_REQUESTS,
    DEFAULT_MAX_TOTAL_REQUESTS, DEFAULT_MAX_WAIT_ITERATIONS, DEFAULT_WAIT_POLL_INTERVAL,
    RunConfig,
};
pub use counters::{ActiveSlot, CompletionSignal, CounterSnapshot, RunCounters};
pub use error::{Error, Result};
pub use events::{EventFn, RunEvent};
pub use gate::{Admission, AdmissionGate, StopReason};
pub use latency::is_delayed;
pub use outcome::RequestOutcome;
pub use run::{RunPhase, run};
pub use summary::RunSummary;
pub use worker::{DESCRIPTION_PREFIX, request_description};
