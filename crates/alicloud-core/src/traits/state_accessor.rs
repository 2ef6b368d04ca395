// # State Accessor Trait
//
// Defines the read-only interface the waiter polls.
//
// ## Implementations
//
// - RAM login profiles: `alicloud-ram` crate
// - FC functions: `alicloud-fc` crate
//
// ## Usage
//
// ```rust,ignore
// use alicloud_core::{LogicalState, StateAccessor, WaitBudget, wait_for_state};
//
// let accessor = /* StateAccessor implementation */;
// let budget = WaitBudget::default();
//
// // Block until the profile is visible
// wait_for_state(&accessor, "user-1", LogicalState::Normal, &budget).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reconciliation status of a remote entity, as observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalState {
    /// Accepted by the control plane but not usable yet
    Pending,
    /// Exists and is usable
    Normal,
    /// A change is being applied
    Updating,
    /// Unrecoverable; waiting for another state is pointless
    Failed,
    /// No longer exists; usually observed as "not found"
    Deleted,
}

impl LogicalState {
    /// Whether the entity is stuck and will not converge anywhere else
    pub fn is_failure(&self) -> bool {
        matches!(self, LogicalState::Failed)
    }
}

impl std::fmt::Display for LogicalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogicalState::Pending => "Pending",
            LogicalState::Normal => "Normal",
            LogicalState::Updating => "Updating",
            LogicalState::Failed => "Failed",
            LogicalState::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

/// Result of a single successful poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The entity exists and is in the given state
    Found(LogicalState),
    /// The API reports no such entity
    NotFound,
}

impl Observation {
    /// Normalize to the logical state vocabulary (`NotFound` becomes `Deleted`)
    pub fn state(&self) -> LogicalState {
        match self {
            Observation::Found(state) => *state,
            Observation::NotFound => LogicalState::Deleted,
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observation::Found(state) => write!(f, "{state}"),
            Observation::NotFound => f.write_str("not found"),
        }
    }
}

/// Trait for fetching the current state of a remote entity
///
/// Implementations wrap one describe/get API call of the cloud SDK.
/// They must not mutate the entity and must not retry: the waiter owns
/// polling, pacing and the budget.
///
/// A missing entity may be reported either as `Ok(Observation::NotFound)`
/// or as an error whose [`class`](crate::Error::class) is `NotFound`;
/// the waiter treats both the same.
#[async_trait]
pub trait StateAccessor: Send + Sync {
    /// Fetch the current state of the entity identified by `id`
    async fn fetch(&self, id: &str) -> crate::Result<Observation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_normalizes_to_deleted() {
        assert_eq!(Observation::NotFound.state(), LogicalState::Deleted);
        assert_eq!(
            Observation::Found(LogicalState::Pending).state(),
            LogicalState::Pending
        );
    }

    #[test]
    fn only_failed_is_a_failure() {
        assert!(LogicalState::Failed.is_failure());
        assert!(!LogicalState::Deleted.is_failure());
        assert!(!LogicalState::Pending.is_failure());
        assert!(!LogicalState::Normal.is_failure());
    }
}
