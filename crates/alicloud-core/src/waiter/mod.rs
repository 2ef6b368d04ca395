//! Eventual-state waiter
//!
//! Cloud control planes are eventually consistent: a create may return
//! before the entity can be read, and a delete may return before the
//! entity disappears. Resource adapters call [`wait_for_state`] after each
//! mutating request and before reporting success.
//!
//! ## Poll Loop
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   ┌─────────────────┐   NonTransient error  ──▶ fail      │
//!   │ accessor.fetch  │   Found(Failed)       ──▶ fail      │
//!   └─────────────────┘   state == desired    ──▶ success   │
//!            │            NotFound, desired == Deleted ──▶ success
//!            ▼                                              │
//!   budget spent? ── yes ──▶ Timeout (last observed state)  │
//!            │ no                                           │
//!            └──── sleep(interval, clamped to deadline) ────┘
//! ```
//!
//! The waiter holds no state between calls and never mutates the entity.
//! Polls of one entity are strictly sequential; the only suspension point
//! is the sleep between them.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::Backoff;
use crate::error::{Error, ErrorClass, Result};
use crate::traits::{LogicalState, Observation, StateAccessor};

/// Default wait timeout (60 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between polls (5 seconds)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Timeout and pacing for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBudget {
    /// Maximum time to wait
    pub timeout: Duration,
    /// Base delay between polls
    pub interval: Duration,
    /// How the delay evolves between polls
    pub backoff: Backoff,
}

impl WaitBudget {
    /// Create a budget with a fixed interval
    ///
    /// Both durations must be strictly positive.
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::invalid_input("wait timeout must be > 0"));
        }
        if interval.is_zero() {
            return Err(Error::invalid_input("wait interval must be > 0"));
        }
        Ok(Self {
            timeout,
            interval,
            backoff: Backoff::Fixed,
        })
    }

    /// Use a different backoff policy
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Same pacing, different timeout
    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        Ok(Self::new(timeout, self.interval)?.with_backoff(self.backoff))
    }
}

impl Default for WaitBudget {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            backoff: Backoff::Fixed,
        }
    }
}

/// Result of a wait that converged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    /// State reached (equal to the desired state)
    pub state: LogicalState,
    /// Number of accessor invocations, including the successful one
    pub polls: u32,
    /// Time spent waiting
    pub elapsed: Duration,
}

/// Wait until the entity `id` reaches `desired`
///
/// # Parameters
///
/// - `accessor`: Read-only fetch of the entity's current state
/// - `id`: Non-empty entity identifier
/// - `desired`: State to wait for; `Deleted` means "no longer found"
/// - `budget`: Timeout and pacing
///
/// # Returns
///
/// - `Ok(WaitOutcome)`: The entity reached `desired`
/// - `Err(Error::Timeout)`: Budget spent; carries the last observed state
/// - `Err(Error::UnexpectedState)`: The entity reached `Failed`
/// - `Err(e)`: A non-transient error from the accessor, unchanged
pub async fn wait_for_state<A>(
    accessor: &A,
    id: &str,
    desired: LogicalState,
    budget: &WaitBudget,
) -> Result<WaitOutcome>
where
    A: StateAccessor + ?Sized,
{
    if id.is_empty() {
        return Err(Error::invalid_input("entity identifier cannot be empty"));
    }
    if budget.timeout.is_zero() || budget.interval.is_zero() {
        return Err(Error::invalid_input("wait budget must be strictly positive"));
    }

    let start = Instant::now();
    let deadline = start + budget.timeout;
    let mut polls: u32 = 0;
    let mut last_observed: Option<Observation> = None;
    let mut last_error: Option<String> = None;

    loop {
        polls += 1;

        let observation = match accessor.fetch(id).await {
            Ok(observation) => Some(observation),
            Err(e) => match e.class() {
                ErrorClass::NotFound => Some(Observation::NotFound),
                ErrorClass::Transient => {
                    warn!("Poll {} for {} failed transiently: {}", polls, id, e);
                    last_error = Some(e.to_string());
                    None
                }
                ErrorClass::NonTransient => {
                    debug!("Poll {} for {} failed: {}", polls, id, e);
                    return Err(e);
                }
            },
        };

        if let Some(observation) = observation {
            debug!(
                "Poll {} for {}: observed {}, waiting for {}",
                polls, id, observation, desired
            );
            last_observed = Some(observation);

            if observation.state() == desired {
                let elapsed = start.elapsed();
                info!(
                    "{} reached {} after {} poll(s) in {:?}",
                    id, desired, polls, elapsed
                );
                return Ok(WaitOutcome {
                    state: desired,
                    polls,
                    elapsed,
                });
            }

            if let Observation::Found(observed) = observation {
                if observed.is_failure() {
                    return Err(Error::UnexpectedState {
                        id: id.to_string(),
                        desired,
                        observed,
                    });
                }
            }
        }

        let now = Instant::now();
        if now >= deadline {
            let last_observed = last_observed
                .map(|o| o.to_string())
                .unwrap_or_else(|| "nothing".to_string());
            warn!(
                "Gave up waiting for {} to reach {} after {} poll(s); last observed: {}",
                id, desired, polls, last_observed
            );
            return Err(Error::Timeout {
                id: id.to_string(),
                desired,
                last_observed,
                last_error,
                waited: now.saturating_duration_since(start),
            });
        }

        // The final poll lands on the deadline rather than past it
        let delay = budget
            .backoff
            .delay(budget.interval, polls)
            .min(deadline.saturating_duration_since(now));
        sleep(delay).await;
    }
}
