//! Failed-login throttling keyed by client address.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::AuthError;

pub const MAX_LOGIN_ATTEMPTS: u32 = 5;
pub const LOCKOUT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Locked { retry_after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_LOGIN_ATTEMPTS,
            window: LOCKOUT_WINDOW,
        }
    }
}

/// Counts failed logins per key.
///
/// A key is locked once it reaches the policy's failure limit. The count
/// resets on a successful login, or once the window has passed since the last
/// failure. Implementations backed by a shared store let several processes
/// enforce one limit.
#[async_trait]
pub trait LoginThrottle: Send + Sync {
    async fn check(&self, key: &str) -> Result<ThrottleDecision, AuthError>;

    async fn record(&self, key: &str, outcome: AttemptOutcome) -> Result<(), AuthError>;
}

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    failures: u32,
    last_failure: Instant,
}

/// Process-local throttle. Entries expire after the policy window and are
/// purged whenever a failure is recorded.
#[derive(Debug, Default)]
pub struct InMemoryLoginThrottle {
    policy: ThrottlePolicy,
    entries: Mutex<HashMap<String, FailureWindow>>,
}

impl InMemoryLoginThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn live(&self, window: &FailureWindow, now: Instant) -> bool {
        now.duration_since(window.last_failure) <= self.policy.window
    }
}

#[async_trait]
impl LoginThrottle for InMemoryLoginThrottle {
    async fn check(&self, key: &str) -> Result<ThrottleDecision, AuthError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Unavailable("throttle lock poisoned".into()))?;
        let now = Instant::now();

        let decision = match entries.get(key) {
            Some(window) if self.live(window, now) && window.failures >= self.policy.max_attempts => {
                let elapsed = now.duration_since(window.last_failure);
                ThrottleDecision::Locked {
                    retry_after: self.policy.window.saturating_sub(elapsed),
                }
            }
            _ => ThrottleDecision::Allowed,
        };
        Ok(decision)
    }

    async fn record(&self, key: &str, outcome: AttemptOutcome) -> Result<(), AuthError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Unavailable("throttle lock poisoned".into()))?;

        match outcome {
            AttemptOutcome::Success => {
                entries.remove(key);
            }
            AttemptOutcome::Failure => {
                let now = Instant::now();
                entries.retain(|_, window| now.duration_since(window.last_failure) <= self.policy.window);

                let window = entries.entry(key.to_string()).or_insert(FailureWindow {
                    failures: 0,
                    last_failure: now,
                });
                window.failures += 1;
                window.last_failure = now;

                tracing::debug!(key = %key, failures = window.failures, "Failed login recorded");
            }
        }
        Ok(())
    }
}
