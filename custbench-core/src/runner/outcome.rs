use tokio::time::Instant;

use crate::{ClassifiedError, Customer};

/// Result of one remote call, as measured by its worker.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub seq: u64,
    /// Wall-clock submission time, milliseconds since the Unix epoch.
    pub submitted_at_ms: u64,
    pub started: Instant,
    pub finished: Instant,
    pub duration_ms: u64,
    pub delayed: bool,
    pub result: Result<Customer, ClassifiedError>,
}

impl RequestOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The created customer's id. `None` when the call failed.
    pub fn customer_id(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|c| c.id.as_str())
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        self.result.as_ref().err()
    }
}
