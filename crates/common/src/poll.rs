//! Poll-with-timeout primitive
//!
//! Replaces hardcoded sleep counts with a bounded wait: re-evaluate an async
//! predicate on a fixed interval until it yields a value or the deadline
//! passes. The predicate may have side effects (e.g. re-clicking a control
//! between checks).

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Outcome of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate yielded a value before the deadline.
    Completed(T),
    /// The deadline passed without the predicate yielding.
    TimedOut,
}

impl<T> PollOutcome<T> {
    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            PollOutcome::Completed(v) => Some(v),
            PollOutcome::TimedOut => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut)
    }
}

/// Evaluate `probe` every `interval` until it returns `Some`, or until
/// `max_wait` has elapsed. The probe is evaluated once immediately; the
/// deadline is checked before each subsequent sleep, so the total wait never
/// exceeds `max_wait` by more than one interval.
pub async fn poll_until<T, F, Fut>(interval: Duration, max_wait: Duration, mut probe: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + max_wait;
    loop {
        if let Some(value) = probe().await {
            return PollOutcome::Completed(value);
        }
        if Instant::now() >= deadline {
            return PollOutcome::TimedOut;
        }
        tokio::time::sleep(interval).await;
    }
}
