//! Retry policy and backoff controller for dispatch attempts.
//!
//! The controller is an explicit state machine over attempts rather than ad
//! hoc catch-and-loop: each failure is classified, and only transient
//! classifications consume a retry. Backoff grows exponentially with jitter
//! so synchronized callers don't hammer a struggling provider in lockstep.

use std::time::Duration;

use rand::Rng;

use crate::error::HollowError;

/// Retry and timing configuration for one hollow function.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total dispatch attempts, including the first
    pub max_attempts: u32,
    /// Initial backoff unit
    pub base_delay: Duration,
    /// Backoff ceiling
    pub max_delay: Duration,
    /// Deadline for each individual provider call
    pub per_attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            per_attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set total dispatch attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the initial backoff delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the backoff ceiling
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the per-attempt call deadline
    pub fn with_per_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = timeout;
        self
    }

    /// Exponential delay before the attempt following `completed_attempts`,
    /// capped at `max_delay`
    pub fn calculate_delay(&self, completed_attempts: u32) -> Duration {
        let exp = completed_attempts.saturating_sub(1).min(31);
        let delay_ms = self.base_delay.as_millis() as f64 * 2f64.powi(exp as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// `calculate_delay` scaled by a jitter factor in `[0.5, 1.5)`
    pub fn jittered_delay(&self, completed_attempts: u32) -> Duration {
        let base = self.calculate_delay(completed_attempts);
        let factor = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_millis((base.as_millis() as f64 * factor) as u64)
    }
}

/// Attempt state: Idle -> Dispatching -> (Succeeded | Retrying | Exhausted)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Dispatching,
    Succeeded,
    Retrying,
    Exhausted,
}

/// What the runtime should do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back off for `delay`, then dispatch again
    Retry { delay: Duration },
    /// No further attempts; surface the last error
    Exhausted,
}

/// Drives the attempt loop for one invocation.
pub struct RetryController {
    policy: RetryPolicy,
    attempts: u32,
    state: RetryState,
}

impl RetryController {
    /// Create a controller in the `Idle` state
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: RetryState::Idle,
        }
    }

    /// Number of attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Current state
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// The per-attempt deadline from the policy
    pub fn attempt_timeout(&self) -> Duration {
        self.policy.per_attempt_timeout
    }

    /// Begin the next attempt, returning its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.state = RetryState::Dispatching;
        self.attempts
    }

    /// Record a successful attempt
    pub fn succeed(&mut self) {
        self.state = RetryState::Succeeded;
    }

    /// Classify a failed attempt.
    ///
    /// Terminal errors (provider rejection, cancellation, caller mistakes)
    /// exhaust immediately; transient errors retry while attempts remain.
    pub fn fail(&mut self, error: &HollowError) -> RetryDecision {
        if error.is_terminal() || self.attempts >= self.policy.max_attempts {
            self.state = RetryState::Exhausted;
            return RetryDecision::Exhausted;
        }

        self.state = RetryState::Retrying;
        RetryDecision::Retry {
            delay: self.policy.jittered_delay(self.attempts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350));

        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(350));
        assert_eq!(policy.calculate_delay(10), Duration::from_millis(350));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::new().with_base_delay(Duration::from_millis(100));
        for _ in 0..50 {
            let jittered = policy.jittered_delay(1);
            assert!(jittered >= Duration::from_millis(50));
            assert!(jittered < Duration::from_millis(150));
        }
    }

    #[test]
    fn controller_retries_transient_until_exhausted() {
        let policy = RetryPolicy::new().with_max_attempts(3);
        let mut controller = RetryController::new(policy);
        let err = HollowError::transport("connection reset");

        controller.begin_attempt();
        assert!(matches!(controller.fail(&err), RetryDecision::Retry { .. }));
        assert_eq!(controller.state(), RetryState::Retrying);

        controller.begin_attempt();
        assert!(matches!(controller.fail(&err), RetryDecision::Retry { .. }));

        controller.begin_attempt();
        assert_eq!(controller.fail(&err), RetryDecision::Exhausted);
        assert_eq!(controller.state(), RetryState::Exhausted);
        assert_eq!(controller.attempts(), 3);
    }

    #[test]
    fn controller_exhausts_immediately_on_terminal_error() {
        let mut controller = RetryController::new(RetryPolicy::default());
        controller.begin_attempt();
        let decision = controller.fail(&HollowError::provider_rejected("bad credentials"));
        assert_eq!(decision, RetryDecision::Exhausted);
        assert_eq!(controller.attempts(), 1);
    }

    #[test]
    fn controller_records_success() {
        let mut controller = RetryController::new(RetryPolicy::default());
        assert_eq!(controller.state(), RetryState::Idle);
        controller.begin_attempt();
        assert_eq!(controller.state(), RetryState::Dispatching);
        controller.succeed();
        assert_eq!(controller.state(), RetryState::Succeeded);
    }

    #[test]
    fn max_attempts_has_floor_of_one() {
        let policy = RetryPolicy::new().with_max_attempts(0);
        assert_eq!(policy.max_attempts, 1);
    }
}
