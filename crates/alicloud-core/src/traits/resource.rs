// # Resource Trait
//
// The Create/Read/Update/Delete capability shared by every resource kind.
//
// Each implementation is a thin adapter: it maps its typed configuration
// onto cloud API requests, waits for the eventual state after mutating
// calls, and maps API responses back into its typed state.

use async_trait::async_trait;

/// Outcome of a successful create
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<S> {
    /// Identifier assigned to the new entity
    pub id: String,
    /// State read back after the entity converged
    pub state: S,
}

/// Trait for resource adapters
///
/// # Thread Safety
///
/// Implementations hold their cloud client as an explicit, shared,
/// read-only dependency and must be usable across async tasks.
///
/// # Missing entities
///
/// `read` returns `Ok(None)` when the entity no longer exists, so the
/// orchestrator can drop it from its state. `delete` of an entity that is
/// already gone succeeds.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Desired configuration, as written by the operator
    type Config: Send + Sync;

    /// Observed attributes, as reported back to the orchestrator
    type State: Send + Sync;

    /// Resource type name (e.g. "alicloud_ram_login_profile")
    fn type_name(&self) -> &'static str;

    /// Check a configuration before any API call is made
    fn validate(&self, _config: &Self::Config) -> crate::Result<()> {
        Ok(())
    }

    /// Whether moving from `prior` to `config` needs destroy-then-create
    fn requires_replacement(&self, _prior: &Self::Config, _config: &Self::Config) -> bool {
        false
    }

    /// Create the entity and wait until it is observable
    async fn create(&self, config: &Self::Config) -> crate::Result<Applied<Self::State>>;

    /// Read the entity; `None` when it no longer exists
    async fn read(&self, id: &str) -> crate::Result<Option<Self::State>>;

    /// Apply an in-place change from `prior` to `config`
    async fn update(
        &self,
        id: &str,
        prior: &Self::Config,
        config: &Self::Config,
    ) -> crate::Result<Self::State>;

    /// Delete the entity and wait until it is gone
    async fn delete(&self, id: &str) -> crate::Result<()>;

    /// Adopt an existing entity by identifier
    async fn import(&self, id: &str) -> crate::Result<Option<Self::State>> {
        self.read(id).await
    }
}
