use std::time::Duration;

use super::error::{Error, Result};

pub const DEFAULT_DELAY_THRESHOLD: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ACTIVE_REQUESTS: u64 = 10;
pub const DEFAULT_MAX_DELAYED_REQUESTS: u64 = 20;
pub const DEFAULT_MAX_TOTAL_REQUESTS: u64 = 1000;

/// Upper bound on capacity-wait iterations before the driver gives up and drains.
pub const DEFAULT_MAX_WAIT_ITERATIONS: u64 = 4_294_967_000;

pub const DEFAULT_WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Immutable run parameters, built once and shared read-only with workers.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// A request taking strictly longer than this is "delayed".
    pub delay_threshold: Duration,
    pub max_active_requests: u64,
    pub max_delayed_requests: u64,
    pub max_total_requests: u64,

    /// Identity of the machine running the load, embedded in every request description.
    pub host_id: String,

    /// How long the driver sleeps between capacity re-checks when no completion wakes it.
    pub wait_poll_interval: Duration,
    pub max_wait_iterations: u64,
}

impl RunConfig {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            delay_threshold: DEFAULT_DELAY_THRESHOLD,
            max_active_requests: DEFAULT_MAX_ACTIVE_REQUESTS,
            max_delayed_requests: DEFAULT_MAX_DELAYED_REQUESTS,
            max_total_requests: DEFAULT_MAX_TOTAL_REQUESTS,
            host_id: host_id.into(),
            wait_poll_interval: DEFAULT_WAIT_POLL_INTERVAL,
            max_wait_iterations: DEFAULT_MAX_WAIT_ITERATIONS,
        }
    }

    #[must_use]
    pub fn delay_threshold_ms(&self) -> u64 {
        u64::try_from(self.delay_threshold.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_active_requests == 0 {
            return Err(Error::InvalidMaxActive);
        }
        if self.max_total_requests == 0 {
            return Err(Error::InvalidMaxTotal);
        }
        if self.max_wait_iterations == 0 {
            return Err(Error::InvalidMaxWaitIterations);
        }
        if self.wait_poll_interval.is_zero() {
            return Err(Error::InvalidWaitPollInterval);
        }
        if self.host_id.trim().is_empty() {
            return Err(Error::EmptyHostId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let cfg = RunConfig::new("host-a");
        assert_eq!(cfg.delay_threshold_ms(), 2000);
        assert_eq!(cfg.max_active_requests, 10);
        assert_eq!(cfg.max_delayed_requests, 20);
        assert_eq!(cfg.max_total_requests, 1000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut cfg = RunConfig::new("host-a");
        cfg.max_active_requests = 0;
        assert!(matches!(cfg.validate(), Err(Error::InvalidMaxActive)));

        let mut cfg = RunConfig::new("host-a");
        cfg.max_total_requests = 0;
        assert!(matches!(cfg.validate(), Err(Error::InvalidMaxTotal)));

        let mut cfg = RunConfig::new("host-a");
        cfg.max_wait_iterations = 0;
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidMaxWaitIterations)
        ));

        let cfg = RunConfig::new("  ");
        assert!(matches!(cfg.validate(), Err(Error::EmptyHostId)));
    }

    #[test]
    fn zero_delayed_budget_is_allowed() {
        let mut cfg = RunConfig::new("host-a");
        cfg.max_delayed_requests = 0;
        assert!(cfg.validate().is_ok());
    }
}
