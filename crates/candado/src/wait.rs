//! Bounded waits.
//!
//! Every synchronization point in the scenario is a polling wait with exactly
//! one timeout budget and no retry: either the condition is observed within
//! the budget or the step fails with a timeout error.

use crate::result::{CandadoError, CandadoResult};
use std::time::{Duration, Instant};

/// Default timeout for scenario waits (5 seconds)
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Fixed delay applied before lock and unlock to let the UI repaint (1 second)
pub const SETTLE_DELAY_MS: u64 = 1_000;

/// Options for bounded waits
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `predicate` until it holds or the budget expires.
///
/// The predicate is checked at least once, so a condition that already holds
/// returns immediately. On expiry the error names the awaited condition.
pub fn wait_until<F>(what: &str, options: &WaitOptions, mut predicate: F) -> CandadoResult<Duration>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if predicate() {
            return Ok(start.elapsed());
        }
        if start.elapsed() >= options.timeout() {
            return Err(CandadoError::timeout(what, options.timeout_ms));
        }
        std::thread::sleep(options.poll_interval());
    }
}

/// Fixed delay, used only where the scenario mandates one
pub fn settle(duration_ms: u64) {
    if duration_ms > 0 {
        std::thread::sleep(Duration::from_millis(duration_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, DEFAULT_STEP_TIMEOUT_MS);
            assert_eq!(options.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_builder_chain() {
            let options = WaitOptions::new().with_timeout(100).with_poll_interval(10);
            assert_eq!(options.timeout(), Duration::from_millis(100));
            assert_eq!(options.poll_interval(), Duration::from_millis(10));
        }
    }

    mod wait_until_tests {
        use super::*;

        #[test]
        fn test_immediate_success_returns_without_sleeping() {
            let options = WaitOptions::new().with_timeout(100);
            let elapsed = wait_until("always true", &options, || true).unwrap();
            assert!(elapsed < Duration::from_millis(50));
        }

        #[test]
        fn test_condition_already_true_with_zero_timeout() {
            let options = WaitOptions::new().with_timeout(0);
            assert!(wait_until("instant", &options, || true).is_ok());
        }

        #[test]
        fn test_timeout_names_awaited_condition() {
            let options = WaitOptions::new().with_timeout(50).with_poll_interval(5);
            let err = wait_until("lock indicator", &options, || false).unwrap_err();
            match err {
                CandadoError::Timeout { what, ms } => {
                    assert_eq!(what, "lock indicator");
                    assert_eq!(ms, 50);
                }
                other => panic!("expected Timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_condition_becoming_true_is_observed() {
            let flag = Arc::new(AtomicBool::new(false));
            let writer = flag.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                writer.store(true, Ordering::SeqCst);
            });

            let options = WaitOptions::new().with_timeout(500).with_poll_interval(5);
            let result = wait_until("flag", &options, || flag.load(Ordering::SeqCst));
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_settle_zero_is_noop() {
        let start = Instant::now();
        settle(0);
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
