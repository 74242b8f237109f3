//! Eventual-consistency poller
//!
//! The CIS control plane acknowledges a mutation immediately and applies it
//! asynchronously. Handlers that need the side effect to be observable
//! before returning describe what they are waiting for with a [`StateWait`]
//! and hand it a fetch closure:
//!
//! ```rust,ignore
//! let outcome = StateWait::new(&["provisioning"], &["active"])
//!     .with_failure("failed")
//!     .with_timeout(timeouts.create)
//!     .wait_until(|| async { fetch_instance(&client, &crn).await })
//!     .await?;
//! ```
//!
//! ## State machine
//!
//! ```text
//!            ┌──────── status ∈ pending (or unknown) ────────┐
//!            ▼                                               │
//!   start ─► Pending ── sleep ── deadline passed? ── no ── fetch
//!                                     │                      │
//!                                    yes          ┌──────────┼───────────┐
//!                                     ▼           ▼          ▼           ▼
//!                                 TimedOut   Succeeded     Failed     fetch error
//!                                          (target, or  (failure     (abort, unless
//!                                          not found on  status)     not-found on a
//!                                          delete)                   delete wait)
//! ```
//!
//! The first fetch happens only after the initial delay, and always happens,
//! even when the delay reaches the deadline. Fetches are awaited one at a
//! time; no task is spawned.

use crate::config::PollConfig;
use crate::error::{Error, Result};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default wait before the first fetch
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Default wait between consecutive fetches
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(10);

/// Default overall budget for one wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// How a wait ended successfully
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome<T> {
    /// The remote object reported a target status
    Reached {
        /// The last fetched object
        object: T,
        /// The target status it reported
        status: String,
    },
    /// The remote object no longer exists (delete waits only)
    Gone,
}

impl<T> WaitOutcome<T> {
    /// The final object, if the wait ended on a target status
    pub fn into_object(self) -> Option<T> {
        match self {
            WaitOutcome::Reached { object, .. } => Some(object),
            WaitOutcome::Gone => None,
        }
    }
}

/// One poll session: the statuses to wait through and for, and the timing
/// policy
#[derive(Debug, Clone)]
pub struct StateWait {
    /// Non-terminal statuses
    pub pending: Vec<String>,
    /// Success-terminal statuses
    pub target: Vec<String>,
    /// Explicit failure status, if the remote API has one
    pub failure: Option<String>,
    /// Wait before the first fetch
    pub delay: Duration,
    /// Wait between subsequent fetches
    pub min_interval: Duration,
    /// Overall wall-clock budget
    pub timeout: Duration,
    /// Treat a not-found fetch error as success
    pub not_found_is_target: bool,
}

impl StateWait {
    /// Create a wait with the default timing policy
    pub fn new(pending: &[&str], target: &[&str]) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            failure: None,
            delay: DEFAULT_DELAY,
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            not_found_is_target: false,
        }
    }

    /// Set the failure status
    pub fn with_failure(mut self, status: impl Into<String>) -> Self {
        self.failure = Some(status.into());
        self
    }

    /// Set the wait before the first fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the wait between subsequent fetches
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Set the overall budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply the delay and interval from configuration
    pub fn with_poll_config(self, poll: &PollConfig) -> Self {
        self.with_delay(poll.delay())
            .with_min_interval(poll.min_interval())
    }

    /// Treat the object disappearing as reaching the target (delete waits)
    pub fn treat_not_found_as_target(mut self) -> Self {
        self.not_found_is_target = true;
        self
    }

    fn is_target(&self, status: &str) -> bool {
        self.target.iter().any(|t| t == status)
    }

    fn is_pending(&self, status: &str) -> bool {
        self.pending.iter().any(|p| p == status)
    }

    /// Poll until the fetched status reaches a target value
    ///
    /// `fetch` returns the current object together with its status string.
    ///
    /// # Returns
    ///
    /// - `Ok(WaitOutcome::Reached)`: a target status was observed
    /// - `Ok(WaitOutcome::Gone)`: not found, and `not_found_is_target` is set
    /// - `Err(Error::FailedState)`: the failure status was observed
    /// - `Err(Error::Timeout)`: the budget ran out while still pending
    /// - `Err(_)`: any other fetch error, returned unchanged
    pub async fn wait_until<T, F, Fut>(&self, mut fetch: F) -> Result<WaitOutcome<T>>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String)>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut wait = self.delay;
        let mut last_status: Option<String> = None;
        let mut attempt = 0usize;

        loop {
            let now = Instant::now();
            tokio::time::sleep(wait.min(deadline.saturating_duration_since(now))).await;

            // The first observation is always made, so a delay that uses up
            // the whole budget still reports what the object looked like.
            if attempt > 0 && Instant::now() >= deadline {
                return Err(Error::Timeout {
                    target: self.target.clone(),
                    last_status,
                    elapsed: started.elapsed(),
                });
            }

            attempt += 1;
            let (object, status) = match fetch().await {
                Ok(observed) => observed,
                Err(e) if self.not_found_is_target && e.is_not_found() => {
                    debug!("Object gone after {} fetch(es), treating as done", attempt);
                    return Ok(WaitOutcome::Gone);
                }
                Err(e) => return Err(e),
            };

            debug!("Poll attempt {}: status '{}'", attempt, status);

            if self.failure.as_deref() == Some(status.as_str()) {
                return Err(Error::FailedState {
                    status,
                    observed: format!("{:?}", object),
                });
            }

            if self.is_target(&status) {
                return Ok(WaitOutcome::Reached { object, status });
            }

            if !self.is_pending(&status) {
                warn!(
                    "Unexpected status '{}' while waiting for {:?}, still polling",
                    status, self.target
                );
            }

            last_status = Some(status);
            wait = self.min_interval;
        }
    }
}
