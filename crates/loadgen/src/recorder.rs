//! Shared latency and check recording

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

#[derive(Default)]
struct Inner {
    durations: Vec<Duration>,
    checks_passed: u64,
    checks_failed: u64,
}

/// Thread-safe collector shared by all virtual users.
#[derive(Default)]
pub struct Recorder {
    inner: Mutex<Inner>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one HTTP request's wall-clock duration.
    pub fn record_request(&self, elapsed: Duration) {
        self.inner.lock().durations.push(elapsed);
    }

    pub fn record_requests(&self, durations: impl IntoIterator<Item = Duration>) {
        self.inner.lock().durations.extend(durations);
    }

    /// Record a named check. Failures are logged but never raised, so one
    /// bad response does not stop the iteration.
    pub fn check(&self, name: &str, passed: bool) -> bool {
        let mut inner = self.inner.lock();
        if passed {
            inner.checks_passed += 1;
        } else {
            inner.checks_failed += 1;
            drop(inner);
            warn!(check = name, "check failed");
        }
        passed
    }

    pub fn summary(&self) -> Summary {
        let inner = self.inner.lock();
        let mut sorted = inner.durations.clone();
        sorted.sort_unstable();

        let requests = sorted.len() as u64;
        let p95 = percentile(&sorted, 0.95);
        let max = sorted.last().copied().unwrap_or(Duration::ZERO);
        let mean = if sorted.is_empty() {
            Duration::ZERO
        } else {
            sorted.iter().sum::<Duration>() / sorted.len() as u32
        };

        Summary {
            requests,
            checks_passed: inner.checks_passed,
            checks_failed: inner.checks_failed,
            p95_ms: p95.as_millis() as u64,
            max_ms: max.as_millis() as u64,
            mean_ms: mean.as_millis() as u64,
        }
    }
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Aggregated result of a load-test run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub requests: u64,
    pub checks_passed: u64,
    pub checks_failed: u64,
    pub p95_ms: u64,
    pub max_ms: u64,
    pub mean_ms: u64,
}

impl Summary {
    /// The run's latency threshold: 95th-percentile request duration must
    /// stay under the limit. A run with no requests fails the threshold.
    pub fn meets_latency_threshold(&self, limit: Duration) -> bool {
        self.requests > 0 && u128::from(self.p95_ms) < limit.as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p95_of_uniform_millis() {
        let recorder = Recorder::new();
        recorder.record_requests((1..=100).map(Duration::from_millis));

        let summary = recorder.summary();
        assert_eq!(summary.requests, 100);
        assert_eq!(summary.p95_ms, 95);
        assert_eq!(summary.max_ms, 100);
    }

    #[test]
    fn threshold_verdict_flips_at_limit() {
        let recorder = Recorder::new();
        recorder.record_requests(vec![Duration::from_millis(499); 20]);
        assert!(recorder
            .summary()
            .meets_latency_threshold(Duration::from_millis(500)));

        recorder.record_requests(vec![Duration::from_millis(700); 20]);
        assert!(!recorder
            .summary()
            .meets_latency_threshold(Duration::from_millis(500)));
    }

    #[test]
    fn empty_run_fails_threshold() {
        let recorder = Recorder::new();
        assert!(!recorder
            .summary()
            .meets_latency_threshold(Duration::from_millis(500)));
    }

    #[test]
    fn checks_are_counted() {
        let recorder = Recorder::new();
        assert!(recorder.check("passes", true));
        assert!(!recorder.check("fails", false));
        assert!(recorder.check("passes again", true));

        let summary = recorder.summary();
        assert_eq!(summary.checks_passed, 2);
        assert_eq!(summary.checks_failed, 1);
    }
}
