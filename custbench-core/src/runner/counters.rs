use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::ErrorCategory;

/// Point-in-time copy of the admission counters.
///
/// Fields are loaded one at a time, so a snapshot taken while workers are finishing may
/// mix values from slightly different instants. Admission only needs eventual visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub active: u64,
    pub delayed: u64,
    pub total: u64,
}

/// Counters shared between the driver loop and its workers.
#[derive(Debug, Default)]
pub struct RunCounters {
    active: AtomicU64,
    delayed: AtomicU64,
    total: AtomicU64,

    succeeded: AtomicU64,
    failed: AtomicU64,
    failures: Mutex<BTreeMap<ErrorCategory, u64>>,

    completed: Notify,
}

impl RunCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            active: self.active.load(Ordering::Acquire),
            delayed: self.delayed.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }

    /// Claims an in-flight slot and returns the sequence number for the new request.
    ///
    /// The sequence number is the admitted count *before* this admission, so the first
    /// request is `0`.
    pub fn admit(self: &Arc<Self>) -> (u64, ActiveSlot) {
        self.active.fetch_add(1, Ordering::AcqRel);
        let seq = self.total.fetch_add(1, Ordering::AcqRel);
        (
            seq,
            ActiveSlot {
                counters: Arc::clone(self),
            },
        )
    }

    /// Returns a guard that wakes the driver when dropped.
    pub fn completion_signal(self: &Arc<Self>) -> CompletionSignal {
        CompletionSignal {
            counters: Arc::clone(self),
        }
    }

    pub fn record_delayed(&self) -> u64 {
        self.delayed.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, category: ErrorCategory) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *failures.entry(category).or_insert(0) += 1;
    }

    /// Counts every admitted request that recorded neither success nor failure as a failure
    /// of `category`. Only meaningful once all workers have finished.
    pub fn record_untallied(&self, category: ErrorCategory) -> u64 {
        let total = self.total.load(Ordering::Acquire);
        let missing = total.saturating_sub(self.succeeded().saturating_add(self.failed()));
        if missing > 0 {
            self.failed.fetch_add(missing, Ordering::Relaxed);
            let mut failures = self
                .failures
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *failures.entry(category).or_insert(0) += missing;
        }
        missing
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn failures_by_category(&self) -> BTreeMap<ErrorCategory, u64> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Waits until a worker signals completion or `poll` elapses.
    ///
    /// Returns `true` if woken by a completion. A completion that happened while nobody was
    /// waiting is not lost: `Notify` keeps a single permit for the next waiter.
    pub async fn wait_for_completion(&self, poll: Duration) -> bool {
        tokio::time::timeout(poll, self.completed.notified())
            .await
            .is_ok()
    }

    fn release_active(&self) {
        // Saturate at zero so a stray double release can never wrap the counter.
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_sub(1))
            });
    }
}

/// One admitted in-flight request. Dropping it decrements `active`.
#[derive(Debug)]
pub struct ActiveSlot {
    counters: Arc<RunCounters>,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.counters.release_active();
    }
}

/// Deferred "done" signal for a worker. Fires on drop, including on panic unwinding.
#[derive(Debug)]
pub struct CompletionSignal {
    counters: Arc<RunCounters>,
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.counters.completed.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_hands_out_zero_based_sequence_numbers() {
        let counters = Arc::new(RunCounters::default());

        let (first, slot_a) = counters.admit();
        let (second, slot_b) = counters.admit();
        assert_eq!((first, second), (0, 1));
        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                active: 2,
                delayed: 0,
                total: 2,
            }
        );

        drop(slot_a);
        drop(slot_b);
        assert_eq!(counters.snapshot().active, 0);
        assert_eq!(counters.snapshot().total, 2);
    }

    #[test]
    fn active_never_goes_below_zero() {
        let counters = RunCounters::default();
        counters.release_active();
        counters.release_active();
        assert_eq!(counters.snapshot().active, 0);
    }

    #[test]
    fn failures_are_tallied_by_category() {
        let counters = RunCounters::default();
        counters.record_failure(ErrorCategory::CardDeclined);
        counters.record_failure(ErrorCategory::CardDeclined);
        counters.record_failure(ErrorCategory::Transport);
        counters.record_success();

        assert_eq!(counters.failed(), 3);
        assert_eq!(counters.succeeded(), 1);
        let by_cat = counters.failures_by_category();
        assert_eq!(by_cat.get(&ErrorCategory::CardDeclined), Some(&2));
        assert_eq!(by_cat.get(&ErrorCategory::Transport), Some(&1));
    }

    #[test]
    fn untallied_admissions_become_failures() {
        let counters = Arc::new(RunCounters::default());
        let slots: Vec<_> = (0..4).map(|_| counters.admit().1).collect();
        counters.record_success();
        counters.record_failure(ErrorCategory::CardDeclined);
        drop(slots);

        assert_eq!(counters.record_untallied(ErrorCategory::Other), 2);
        assert_eq!(counters.failed(), 3);
        assert_eq!(
            counters.failures_by_category().get(&ErrorCategory::Other),
            Some(&2)
        );
        assert_eq!(counters.record_untallied(ErrorCategory::Other), 0);
    }

    #[test]
    fn record_delayed_returns_new_count() {
        let counters = RunCounters::default();
        assert_eq!(counters.record_delayed(), 1);
        assert_eq!(counters.record_delayed(), 2);
        assert_eq!(counters.snapshot().delayed, 2);
    }

    #[tokio::test]
    async fn completion_before_wait_is_not_lost() {
        let counters = Arc::new(RunCounters::default());
        drop(counters.completion_signal());

        assert!(
            counters
                .wait_for_completion(Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_without_completion() {
        let counters = RunCounters::default();
        assert!(
            !counters
                .wait_for_completion(Duration::from_millis(10))
                .await
        );
    }
}
