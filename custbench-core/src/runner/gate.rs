use super::config::RunConfig;
use super::counters::CounterSnapshot;

/// Why the driver stopped admitting new requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// `max_total_requests` requests have been admitted.
    TotalReached,
    /// The delayed-request budget is spent.
    DelayedLimit,
    /// The capacity wait hit its iteration cap without capacity freeing up.
    WaitExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Wait,
    Stop(StopReason),
}

/// Admission policy. Pure: decisions depend only on the limits and a counter snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionGate {
    max_active: u64,
    max_delayed: u64,
    max_total: u64,
}

impl AdmissionGate {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            max_active: config.max_active_requests,
            max_delayed: config.max_delayed_requests,
            max_total: config.max_total_requests,
        }
    }

    /// Hard stop conditions, checked once before each admission attempt.
    #[must_use]
    pub fn stop_reason(&self, snap: CounterSnapshot) -> Option<StopReason> {
        if snap.delayed > self.max_delayed {
            return Some(StopReason::DelayedLimit);
        }
        if snap.total >= self.max_total {
            return Some(StopReason::TotalReached);
        }
        None
    }

    /// Capacity check.
    ///
    /// In-flight requests count against the delayed budget as well as the active limit,
    /// since any of them may still finish late.
    #[must_use]
    pub fn capacity(&self, snap: CounterSnapshot) -> Admission {
        let saturated = snap.active >= self.max_active
            || snap.active.saturating_add(snap.delayed) >= self.max_delayed;

        if !saturated {
            return Admission::Admit;
        }
        if snap.delayed >= self.max_delayed {
            return Admission::Stop(StopReason::DelayedLimit);
        }
        Admission::Wait
    }

    #[must_use]
    pub fn evaluate(&self, snap: CounterSnapshot) -> Admission {
        match self.stop_reason(snap) {
            Some(reason) => Admission::Stop(reason),
            None => self.capacity(snap),
        }
    }
}
