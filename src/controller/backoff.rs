//! # Fibonacci Backoff
//!
//! Progressive retry delays for failed reconciliations. The sequence grows
//! more slowly than exponential backoff: 1s, 1s, 2s, 3s, 5s, 8s, ... up to a cap.
//!
//! ## Usage
//!
//! ```rust
//! use gateway_node_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 300);
//! assert_eq!(backoff.next_backoff_seconds(), 1);
//! assert_eq!(backoff.next_backoff_seconds(), 1);
//! assert_eq!(backoff.next_backoff_seconds(), 2);
//! assert_eq!(backoff.next_backoff_seconds(), 3);
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator, in seconds
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    prev_secs: u64,
    current_secs: u64,
    max_secs: u64,
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min_secs` and capped at `max_secs`
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs,
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_secs;
        let next = self.prev_secs.saturating_add(self.current_secs);
        self.prev_secs = self.current_secs;
        self.current_secs = next.min(self.max_secs);
        result
    }

    /// Current delay as a `Duration`; advances the sequence
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Start over from the minimum
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }
}

/// Per-resource retry state kept by the error policy
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    /// Record a failure and return the delay before the next attempt
    pub fn record_failure(&mut self) -> Duration {
        self.error_count = self.error_count.saturating_add(1);
        self.backoff.next_backoff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_sequence() {
        let mut backoff = FibonacciBackoff::new(1, 1000);
        let seq: Vec<u64> = (0..8).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(seq, vec![1, 1, 2, 3, 5, 8, 13, 21]);
    }

    #[test]
    fn test_capped_at_max() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        let seq: Vec<u64> = (0..9).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(seq, vec![1, 1, 2, 3, 5, 8, 10, 10, 10]);
    }

    #[test]
    fn test_reset() {
        let mut backoff = FibonacciBackoff::new(2, 60);
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.reset();
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
    }

    #[test]
    fn test_state_counts_failures() {
        let mut state = BackoffState::new(1, 300);
        assert_eq!(state.record_failure(), Duration::from_secs(1));
        assert_eq!(state.record_failure(), Duration::from_secs(1));
        assert_eq!(state.record_failure(), Duration::from_secs(2));
        assert_eq!(state.error_count, 3);
    }
}
