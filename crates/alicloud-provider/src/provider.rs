//! Provider: resource dispatch over JSON instance state
//!
//! The orchestrator hands the provider a resource kind, the recorded
//! state of the instance (if any) and the desired configuration as JSON.
//! The provider decodes them into the typed configuration of the matching
//! resource adapter and drives its lifecycle.

use std::sync::Arc;

use alicloud_core::{AcsClient, BackendConfig, Error, ProviderConfig, Resource, Result, WaitBudget};
use alicloud_fc::{FcApi, FcFunction, HttpFcApi, MemoryFcApi};
use alicloud_ram::{HttpRamApi, MemoryRamApi, RamApi, RamLoginProfile};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::kind::ResourceKind;
use crate::state::{InstanceState, overlay};

/// Cloud API clients shared by all resource adapters
#[derive(Clone)]
pub struct ProviderClients {
    pub ram: Arc<dyn RamApi>,
    pub fc: Arc<dyn FcApi>,
}

impl ProviderClients {
    pub fn new(ram: Arc<dyn RamApi>, fc: Arc<dyn FcApi>) -> Self {
        Self { ram, fc }
    }

    /// Clients talking to the Alicloud HTTP APIs through one shared client
    pub fn http(client: AcsClient) -> Self {
        Self {
            ram: Arc::new(HttpRamApi::new(client.clone())),
            fc: Arc::new(HttpFcApi::new(client)),
        }
    }

    /// Build clients for a backend
    ///
    /// The memory backend starts empty: no users, services or objects.
    pub fn from_backend(backend: &BackendConfig) -> Result<Self> {
        match backend {
            BackendConfig::Http { .. } => Ok(Self::http(AcsClient::from_config(backend)?)),
            BackendConfig::Memory { propagation_polls } => Ok(Self {
                ram: Arc::new(MemoryRamApi::new(*propagation_polls)),
                fc: Arc::new(MemoryFcApi::new(*propagation_polls)),
            }),
        }
    }
}

/// The Alicloud provider
pub struct AlicloudProvider {
    ram: RamLoginProfile,
    fc: FcFunction,
}

impl AlicloudProvider {
    /// Create a provider whose adapters wait with `budget`
    pub fn new(clients: ProviderClients, budget: WaitBudget) -> Self {
        Self {
            ram: RamLoginProfile::new(clients.ram, budget),
            fc: FcFunction::new(clients.fc, budget),
        }
    }

    /// Create a provider from its configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let budget = config.wait.budget()?;
        let clients = ProviderClients::from_backend(&config.backend)?;
        info!(
            "Provider configured: backend={}, wait timeout={}s, interval={}s",
            config.backend.type_name(),
            config.wait.timeout_secs,
            config.wait.interval_secs
        );
        Ok(Self::new(clients, budget))
    }

    /// Bring an instance in line with `config`
    ///
    /// # Behavior
    ///
    /// - No prior state: create
    /// - Prior state, identity unchanged: in-place update
    /// - Prior state, identity changed: delete, then create
    pub async fn apply(
        &self,
        kind: ResourceKind,
        prior: Option<&InstanceState>,
        config: &Value,
    ) -> Result<InstanceState> {
        if let Some(prior) = prior
            && prior.kind != kind
        {
            return Err(Error::invalid_input(format!(
                "prior state of {} is a {}, not a {}",
                prior.id, prior.kind, kind
            )));
        }

        match kind {
            ResourceKind::RamLoginProfile => apply_resource(&self.ram, kind, prior, config).await,
            ResourceKind::FcFunction => apply_resource(&self.fc, kind, prior, config).await,
        }
    }

    /// Re-read an instance; `None` when it no longer exists
    pub async fn refresh(&self, prior: &InstanceState) -> Result<Option<InstanceState>> {
        let observed = match prior.kind {
            ResourceKind::RamLoginProfile => read_resource(&self.ram, &prior.id).await?,
            ResourceKind::FcFunction => read_resource(&self.fc, &prior.id).await?,
        };

        Ok(observed.map(|observed| InstanceState {
            kind: prior.kind,
            id: prior.id.clone(),
            attributes: overlay(&Value::Object(prior.attributes.clone()), &observed),
        }))
    }

    /// Delete an instance; deleting a missing instance succeeds
    pub async fn destroy(&self, kind: ResourceKind, id: &str) -> Result<()> {
        match kind {
            ResourceKind::RamLoginProfile => self.ram.delete(id).await,
            ResourceKind::FcFunction => self.fc.delete(id).await,
        }
    }

    /// Adopt an existing instance; `None` when it does not exist
    pub async fn import(&self, kind: ResourceKind, id: &str) -> Result<Option<InstanceState>> {
        let imported = match kind {
            ResourceKind::RamLoginProfile => import_resource(&self.ram, id).await?,
            ResourceKind::FcFunction => import_resource(&self.fc, id).await?,
        };

        Ok(imported.map(|observed| InstanceState {
            kind,
            id: id.to_string(),
            attributes: overlay(&Value::Null, &observed),
        }))
    }
}

fn parse_config<C: DeserializeOwned>(kind: ResourceKind, value: Value) -> Result<C> {
    serde_json::from_value(value)
        .map_err(|e| Error::invalid_input(format!("invalid {} configuration: {}", kind, e)))
}

async fn apply_resource<R>(
    resource: &R,
    kind: ResourceKind,
    prior: Option<&InstanceState>,
    config: &Value,
) -> Result<InstanceState>
where
    R: Resource,
    R::Config: Serialize + DeserializeOwned,
    R::State: Serialize,
{
    let desired: R::Config = parse_config(kind, config.clone())?;
    resource.validate(&desired)?;
    // Defaults filled in
    let normalized = serde_json::to_value(&desired)?;

    let Some(prior) = prior else {
        return create_resource(resource, kind, &desired, &normalized).await;
    };

    // Attributes missing from the prior state (e.g. after an import) are
    // taken as unchanged
    let prior_config: R::Config = parse_config(
        kind,
        Value::Object(overlay(&normalized, &Value::Object(prior.attributes.clone()))),
    )?;

    if resource.requires_replacement(&prior_config, &desired) {
        info!("{} {} must be replaced", kind, prior.id);
        resource.delete(&prior.id).await?;
        return create_resource(resource, kind, &desired, &normalized).await;
    }

    debug!("Updating {} {} in place", kind, prior.id);
    let state = resource.update(&prior.id, &prior_config, &desired).await?;
    Ok(InstanceState {
        kind,
        id: prior.id.clone(),
        attributes: overlay(&normalized, &serde_json::to_value(&state)?),
    })
}

async fn create_resource<R>(
    resource: &R,
    kind: ResourceKind,
    desired: &R::Config,
    normalized: &Value,
) -> Result<InstanceState>
where
    R: Resource,
    R::State: Serialize,
{
    let applied = resource.create(desired).await?;
    Ok(InstanceState {
        kind,
        id: applied.id,
        attributes: overlay(normalized, &serde_json::to_value(&applied.state)?),
    })
}

async fn read_resource<R>(resource: &R, id: &str) -> Result<Option<Value>>
where
    R: Resource,
    R::State: Serialize,
{
    match resource.read(id).await? {
        Some(state) => Ok(Some(serde_json::to_value(&state)?)),
        None => Ok(None),
    }
}

async fn import_resource<R>(resource: &R, id: &str) -> Result<Option<Value>>
where
    R: Resource,
    R::State: Serialize,
{
    match resource.import(id).await? {
        Some(state) => Ok(Some(serde_json::to_value(&state)?)),
        None => Ok(None),
    }
}
