// # alicloud-reconcile
//
// Runs one lifecycle operation for one resource instance and prints the
// resulting instance state as JSON.
//
// This binary is a THIN integration layer: it reads configuration from
// environment variables, builds the provider and calls it once. All
// resource and waiting logic lives in the library crates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Backend
// - `ALICLOUD_BACKEND`: Backend type (http, memory)
// - `ALICLOUD_ENDPOINT`: Base URL of the API gateway (for http)
// - `ALICLOUD_REGION`: Region id, e.g. cn-hangzhou (for http)
// - `ALICLOUD_ACCESS_KEY`: Access key id (for http)
// - `ALICLOUD_SECURITY_TOKEN`: STS security token (optional)
// - `ALICLOUD_PROPAGATION_POLLS`: Simulated read lag (for memory)
// - `ALICLOUD_MEMORY_USERS`: Comma-separated RAM users to seed (for memory)
// - `ALICLOUD_MEMORY_SERVICES`: Comma-separated FC services to seed (for memory)
//
// ### Waiting
// - `ALICLOUD_WAIT_TIMEOUT_SECS`: Maximum wait after a mutating call
// - `ALICLOUD_WAIT_INTERVAL_SECS`: Delay between polls
//
// ### Operation
// - `ALICLOUD_OPERATION`: apply, refresh, destroy or import
// - `ALICLOUD_RESOURCE_TYPE`: alicloud_ram_login_profile or alicloud_fc_function
// - `ALICLOUD_RESOURCE_ID`: Instance id (for destroy and import; defaults to the state file's id)
// - `ALICLOUD_CONFIG_FILE`: JSON configuration of the instance (for apply)
// - `ALICLOUD_STATE_FILE`: Instance state, read before and written after the operation
//
// ## Example
//
// ```bash
// export ALICLOUD_BACKEND=http
// export ALICLOUD_ENDPOINT=https://gateway.internal.example
// export ALICLOUD_REGION=cn-hangzhou
// export ALICLOUD_ACCESS_KEY=LTAI...
// export ALICLOUD_OPERATION=apply
// export ALICLOUD_RESOURCE_TYPE=alicloud_ram_login_profile
// export ALICLOUD_CONFIG_FILE=./login_profile.json
// export ALICLOUD_STATE_FILE=./login_profile.state.json
//
// alicloud-reconcile
// ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use alicloud_core::{BackendConfig, ProviderConfig, WaitConfig};
use alicloud_fc::MemoryFcApi;
use alicloud_provider::{AlicloudProvider, InstanceState, ProviderClients, ResourceKind};
use alicloud_ram::MemoryRamApi;
use anyhow::{Context, Result};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Operation succeeded
/// - 1: Configuration or startup error
/// - 2: Operation failed
#[derive(Debug, Clone, Copy)]
enum ReconcileExitCode {
    /// Operation succeeded
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// The lifecycle operation failed
    OperationError = 2,
}

impl From<ReconcileExitCode> for ExitCode {
    fn from(code: ReconcileExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Lifecycle operation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Apply,
    Refresh,
    Destroy,
    Import,
}

impl Operation {
    fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "apply" => Ok(Operation::Apply),
            "refresh" => Ok(Operation::Refresh),
            "destroy" => Ok(Operation::Destroy),
            "import" => Ok(Operation::Import),
            _ => anyhow::bail!(
                "ALICLOUD_OPERATION '{}' is not supported. \
                Supported operations: apply, refresh, destroy, import",
                s
            ),
        }
    }
}

/// Application configuration
struct Config {
    backend_type: String,
    endpoint: Option<String>,
    region: Option<String>,
    access_key: Option<String>,
    security_token: Option<String>,
    propagation_polls: u32,
    memory_users: Vec<String>,
    memory_services: Vec<String>,
    wait_timeout_secs: u64,
    wait_interval_secs: u64,
    operation: String,
    resource_type: String,
    resource_id: Option<String>,
    config_file: Option<PathBuf>,
    state_file: Option<PathBuf>,
    log_level: String,
}

fn list(var: &str) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn number<T: std::str::FromStr>(var: &str, default: T) -> Result<T> {
    match env::var(var) {
        Ok(s) => s
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number. Got: {}", var, s)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let defaults = WaitConfig::default();
        Ok(Self {
            backend_type: env::var("ALICLOUD_BACKEND").unwrap_or_else(|_| "http".to_string()),
            endpoint: env::var("ALICLOUD_ENDPOINT").ok(),
            region: env::var("ALICLOUD_REGION").ok(),
            access_key: env::var("ALICLOUD_ACCESS_KEY").ok(),
            security_token: env::var("ALICLOUD_SECURITY_TOKEN").ok(),
            propagation_polls: number("ALICLOUD_PROPAGATION_POLLS", 1)?,
            memory_users: list("ALICLOUD_MEMORY_USERS"),
            memory_services: list("ALICLOUD_MEMORY_SERVICES"),
            wait_timeout_secs: number("ALICLOUD_WAIT_TIMEOUT_SECS", defaults.timeout_secs)?,
            wait_interval_secs: number("ALICLOUD_WAIT_INTERVAL_SECS", defaults.interval_secs)?,
            operation: env::var("ALICLOUD_OPERATION")
                .context("ALICLOUD_OPERATION is required (apply, refresh, destroy, import)")?,
            resource_type: env::var("ALICLOUD_RESOURCE_TYPE").context(
                "ALICLOUD_RESOURCE_TYPE is required (alicloud_ram_login_profile, alicloud_fc_function)",
            )?,
            resource_id: env::var("ALICLOUD_RESOURCE_ID").ok(),
            config_file: env::var("ALICLOUD_CONFIG_FILE").ok().map(PathBuf::from),
            state_file: env::var("ALICLOUD_STATE_FILE").ok().map(PathBuf::from),
            log_level: env::var("ALICLOUD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let operation = Operation::parse(&self.operation)?;
        self.resource_type
            .parse::<ResourceKind>()
            .map_err(|e| anyhow::anyhow!("ALICLOUD_RESOURCE_TYPE: {}", e))?;

        match operation {
            Operation::Apply if self.config_file.is_none() => {
                anyhow::bail!("ALICLOUD_CONFIG_FILE is required when ALICLOUD_OPERATION=apply")
            }
            Operation::Refresh if self.state_file.is_none() => {
                anyhow::bail!("ALICLOUD_STATE_FILE is required when ALICLOUD_OPERATION=refresh")
            }
            Operation::Destroy if self.resource_id.is_none() && self.state_file.is_none() => {
                anyhow::bail!(
                    "ALICLOUD_RESOURCE_ID or ALICLOUD_STATE_FILE is required when ALICLOUD_OPERATION=destroy"
                )
            }
            Operation::Import if self.resource_id.is_none() => {
                anyhow::bail!("ALICLOUD_RESOURCE_ID is required when ALICLOUD_OPERATION=import")
            }
            _ => {}
        }

        let seeded = !self.memory_users.is_empty() || !self.memory_services.is_empty();
        if seeded && self.backend_type != "memory" {
            anyhow::bail!(
                "ALICLOUD_MEMORY_USERS and ALICLOUD_MEMORY_SERVICES require ALICLOUD_BACKEND=memory"
            );
        }

        self.provider_config()?.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ALICLOUD_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn provider_config(&self) -> Result<ProviderConfig> {
        let backend = match self.backend_type.as_str() {
            "http" => BackendConfig::Http {
                endpoint: self
                    .endpoint
                    .clone()
                    .context("ALICLOUD_ENDPOINT is required when ALICLOUD_BACKEND=http")?,
                region: self
                    .region
                    .clone()
                    .context("ALICLOUD_REGION is required when ALICLOUD_BACKEND=http")?,
                access_key_id: self
                    .access_key
                    .clone()
                    .context("ALICLOUD_ACCESS_KEY is required when ALICLOUD_BACKEND=http")?,
                security_token: self.security_token.clone(),
            },
            "memory" => BackendConfig::Memory {
                propagation_polls: self.propagation_polls,
            },
            other => anyhow::bail!(
                "ALICLOUD_BACKEND '{}' is not supported. Supported backends: http, memory",
                other
            ),
        };

        Ok(ProviderConfig {
            backend,
            wait: WaitConfig {
                timeout_secs: self.wait_timeout_secs,
                interval_secs: self.wait_interval_secs,
                ..WaitConfig::default()
            },
        })
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ReconcileExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ReconcileExitCode::ConfigError.into();
    }

    // Initialize tracing; stdout carries the resulting state
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ReconcileExitCode::ConfigError.into();
    }

    info!(
        "Starting alicloud-reconcile: {} {}",
        config.operation, config.resource_type
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ReconcileExitCode::OperationError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(config).await {
            error!("Operation failed: {:#}", e);
            ReconcileExitCode::OperationError
        } else {
            ReconcileExitCode::Success
        }
    });

    result.into()
}

/// Build the provider, seeding the in-memory backend when asked to
async fn build_provider(config: &Config) -> Result<AlicloudProvider> {
    let provider_config = config.provider_config()?;

    if let BackendConfig::Memory { propagation_polls } = provider_config.backend {
        let ram = Arc::new(MemoryRamApi::new(propagation_polls));
        for user in &config.memory_users {
            ram.add_user(user.clone()).await;
        }
        let fc = Arc::new(MemoryFcApi::new(propagation_polls));
        for service in &config.memory_services {
            fc.add_service(service.clone()).await;
        }

        let budget = provider_config.wait.budget()?;
        return Ok(AlicloudProvider::new(ProviderClients::new(ram, fc), budget));
    }

    Ok(AlicloudProvider::from_config(&provider_config)?)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn state_file_exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Failed to check {}", path.display()))
}

async fn read_state(path: Option<&Path>) -> Result<Option<InstanceState>> {
    match path {
        Some(path) if state_file_exists(path).await? => Ok(Some(read_json(path).await?)),
        _ => Ok(None),
    }
}

/// Write the state file, or remove it when the instance is gone
async fn write_state(path: Option<&Path>, state: Option<&InstanceState>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    match state {
        Some(state) => {
            let content = serde_json::to_string_pretty(state)?;
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            if state_file_exists(path).await? {
                tokio::fs::remove_file(path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
    }
    Ok(())
}

/// Drop the state file when a failed apply left the prior instance deleted
///
/// A replacement deletes the prior instance before creating the new one, so
/// a failed create must not leave the state file pointing at it.
async fn forget_if_gone(provider: &AlicloudProvider, path: Option<&Path>, prior: &InstanceState) {
    match provider.refresh(prior).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("{} {} no longer exists after the failed apply", prior.kind, prior.id);
            if let Err(e) = write_state(path, None).await {
                error!("Failed to remove stale state: {:#}", e);
            }
        }
        Err(e) => warn!("Could not check {} {}: {}", prior.kind, prior.id, e),
    }
}

/// Run the configured operation
async fn run(config: Config) -> Result<()> {
    let operation = Operation::parse(&config.operation)?;
    let kind: ResourceKind = config.resource_type.parse()?;
    let provider = build_provider(&config).await?;
    let state_file = config.state_file.as_deref();
    let prior = read_state(state_file).await?;

    let result = match operation {
        Operation::Apply => {
            let path = config
                .config_file
                .as_deref()
                .context("ALICLOUD_CONFIG_FILE is required for apply")?;
            let desired: serde_json::Value = read_json(path).await?;
            match provider.apply(kind, prior.as_ref(), &desired).await {
                Ok(state) => Some(state),
                Err(e) => {
                    if let Some(ref prior) = prior {
                        forget_if_gone(&provider, state_file, prior).await;
                    }
                    return Err(e.into());
                }
            }
        }
        Operation::Refresh => {
            let prior = prior.context("No prior state to refresh")?;
            provider.refresh(&prior).await?
        }
        Operation::Destroy => {
            let id = config
                .resource_id
                .clone()
                .or_else(|| prior.as_ref().map(|p| p.id.clone()))
                .context("No instance id to destroy")?;
            provider.destroy(kind, &id).await?;
            None
        }
        Operation::Import => {
            let id = config
                .resource_id
                .as_deref()
                .context("ALICLOUD_RESOURCE_ID is required for import")?;
            let imported = provider.import(kind, id).await?;
            if imported.is_none() {
                anyhow::bail!("Cannot import non-existent {} {}", kind, id);
            }
            imported
        }
    };

    write_state(state_file, result.as_ref()).await?;

    match result {
        Some(ref state) => {
            info!("{} {} is up to date", kind, state.id);
            println!("{}", serde_json::to_string_pretty(state)?);
        }
        None => {
            info!("{} no longer exists", kind);
            println!("null");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_state_file_means_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        assert!(read_state(Some(path.as_path())).await.unwrap().is_none());
        assert!(read_state(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_state_location_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("file");
        tokio::fs::write(&not_a_dir, "x").await.unwrap();
        let path = not_a_dir.join("state.json");

        assert!(read_state(Some(path.as_path())).await.is_err());
        assert!(write_state(Some(path.as_path()), None).await.is_err());
    }
}
