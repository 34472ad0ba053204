//! Circuit breaker guarding the remote API.
//!
//! A 403 (key revoked or IP blocked) trips the breaker immediately; repeated
//! 429/5xx responses trip it after a threshold. While open, every request is
//! refused locally until the cooldown expires.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum State {
    Closed { consecutive_failures: u32 },
    Open { tripped_at: Instant },
}

/// Shared request gate. Cheap to check, locked only briefly.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<State>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            state: Mutex::new(State::Closed {
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold,
        }
    }

    /// Default for the devlab API: 5-minute cooldown, trips after 3 failures.
    pub fn default_api() -> Self {
        Self::new(Duration::from_secs(300), 3)
    }

    /// Whether a request may proceed. An expired cooldown closes the breaker.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            State::Closed { .. } => true,
            State::Open { tripped_at } => {
                if tripped_at.elapsed() >= self.cooldown {
                    *state = State::Closed {
                        consecutive_failures: 0,
                    };
                    true
                } else {
                    false
                }
            }
        }
    }

    /// A successful response resets the failure counter.
    pub fn note_success(&self) {
        let mut state = self.state.lock().unwrap();
        if let State::Closed { .. } = *state {
            *state = State::Closed {
                consecutive_failures: 0,
            };
        }
    }

    /// A retryable failure. Trips the breaker once the threshold is reached.
    pub fn note_failure(&self) {
        let mut state = self.state.lock().unwrap();
        if let State::Closed {
            consecutive_failures,
        } = *state
        {
            let failures = consecutive_failures + 1;
            *state = if failures >= self.failure_threshold {
                State::Open {
                    tripped_at: Instant::now(),
                }
            } else {
                State::Closed {
                    consecutive_failures: failures,
                }
            };
        }
    }

    /// Trip immediately (HTTP 403).
    pub fn trip_now(&self) {
        *self.state.lock().unwrap() = State::Open {
            tripped_at: Instant::now(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_until_threshold() {
        let b = CircuitBreaker::new(Duration::from_secs(60), 3);
        assert!(b.allow());
        b.note_failure();
        b.note_failure();
        assert!(b.allow());
        b.note_failure();
        assert!(!b.allow());
    }

    #[test]
    fn success_resets_failure_count() {
        let b = CircuitBreaker::new(Duration::from_secs(60), 2);
        b.note_failure();
        b.note_success();
        b.note_failure();
        assert!(b.allow());
    }

    #[test]
    fn trip_now_opens_immediately() {
        let b = CircuitBreaker::default_api();
        b.trip_now();
        assert!(!b.allow());
    }

    #[test]
    fn cooldown_expiry_closes() {
        let b = CircuitBreaker::new(Duration::from_millis(10), 1);
        b.note_failure();
        assert!(!b.allow());
        std::thread::sleep(Duration::from_millis(20));
        assert!(b.allow());
        // And it stays closed afterwards.
        assert!(b.allow());
    }

    #[test]
    fn failures_while_open_do_not_extend_cooldown() {
        let b = CircuitBreaker::new(Duration::from_millis(30), 1);
        b.note_failure();
        std::thread::sleep(Duration::from_millis(15));
        b.note_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert!(b.allow());
    }
}
