/// A request is delayed when it took strictly longer than the threshold.
#[must_use]
pub fn is_delayed(duration_ms: u64, threshold_ms: u64) -> bool {
    duration_ms > threshold_ms
}
