#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use custbench_core::{
    ClassifiedError, Customer, CustomerApi, ErrorCategory, EventFn, RunConfig, RunEvent,
};

/// What the fake API does for every call.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(ErrorCategory),
    /// Succeeds, except that the call with this zero-based index panics.
    PanicOnCall(u64),
}

/// In-process `CustomerApi` with a fixed latency, tracking concurrency and descriptions.
#[derive(Debug)]
pub struct FakeApi {
    latency: Duration,
    behavior: Behavior,
    calls: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
    descriptions: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new(latency: Duration, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            latency,
            behavior,
            calls: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
            descriptions: Mutex::new(Vec::new()),
        })
    }

    pub fn instant() -> Arc<Self> {
        Self::new(Duration::ZERO, Behavior::Succeed)
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.descriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CustomerApi for FakeApi {
    async fn create_customer(&self, description: String) -> Result<Customer, ClassifiedError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.descriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(description);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::PanicOnCall(k) if *k == n => panic!("adapter bug"),
            Behavior::Succeed | Behavior::PanicOnCall(_) => Ok(Customer {
                id: format!("cus_fake{n}"),
            }),
            Behavior::Fail(category) => Err(ClassifiedError::new(
                *category,
                "Your card was declined.",
            )),
        }
    }
}

/// Collects every event emitted during a run.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl EventLog {
    pub fn sink(&self) -> EventFn {
        let events = self.events.clone();
        Arc::new(move |ev| {
            events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(ev);
        })
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn completed(&self) -> usize {
        self.events()
            .iter()
            .filter(|ev| matches!(ev, RunEvent::RequestCompleted(_)))
            .count()
    }

    pub fn delayed_customer_ids(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|ev| match ev {
                RunEvent::RequestDelayed { customer_id, .. } => Some(customer_id),
                _ => None,
            })
            .collect()
    }
}

pub fn config(max_active: u64, max_delayed: u64, max_total: u64, threshold_ms: u64) -> RunConfig {
    let mut cfg = RunConfig::new("test-host");
    cfg.max_active_requests = max_active;
    cfg.max_delayed_requests = max_delayed;
    cfg.max_total_requests = max_total;
    cfg.delay_threshold = Duration::from_millis(threshold_ms);
    cfg
}
