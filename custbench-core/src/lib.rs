mod api;

pub mod runner;

pub use api::{ClassifiedError, Customer, CustomerApi, ErrorCategory};
pub use runner::{
    Admission, AdmissionGate, CounterSnapshot, Error, EventFn, RequestOutcome, Result, RunConfig,
    RunCounters, RunEvent, RunPhase, RunSummary, StopReason, is_delayed, run,
};
