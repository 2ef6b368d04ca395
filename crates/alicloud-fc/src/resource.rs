//! `alicloud_fc_function` adapter
//!
//! A function is identified by `<service>:<name>`. Its name is either
//! given or generated from a prefix, and its code comes from exactly one
//! source: a local zip file (sent inline, base64 encoded) or an OSS object.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use alicloud_core::{
    Applied, Error, LogicalState, Observation, Resource, Result, StateAccessor, WaitBudget,
    wait_for_state,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::RESOURCE_TYPE;
use crate::api::{CreateFunctionInput, FcApi, Function, FunctionCode, UpdateFunctionInput};

/// Prefix of generated names when neither `name` nor `name_prefix` is set
pub const DEFAULT_NAME_PREFIX: &str = "terraform-";

const MAX_NAME_LEN: usize = 128;
// Room for the generated suffix
const MAX_NAME_PREFIX_LEN: usize = 103;

const MIN_MEMORY_SIZE: u32 = 128;
const MAX_MEMORY_SIZE: u32 = 3072;
const MEMORY_SIZE_STEP: u32 = 64;

const MAX_TIMEOUT: u32 = 600;

static UNIQUE_COUNTER: AtomicU32 = AtomicU32::new(0);

fn default_memory_size() -> u32 {
    MIN_MEMORY_SIZE
}

fn default_timeout() -> u32 {
    3
}

/// Build a function identifier
pub fn function_id(service: &str, name: &str) -> String {
    format!("{}:{}", service, name)
}

/// Split a function identifier into service and function name
pub fn parse_function_id(id: &str) -> Result<(String, String)> {
    match id.split_once(':') {
        Some((service, name)) if !service.is_empty() && !name.is_empty() && !name.contains(':') => {
            Ok((service.to_string(), name.to_string()))
        }
        _ => Err(Error::invalid_input(format!(
            "invalid function id '{}': expected <service>:<name>",
            id
        ))),
    }
}

/// Generate a unique name starting with `prefix`
fn unique_name(prefix: &str) -> String {
    let counter = UNIQUE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!(
        "{}{}{:08}",
        prefix,
        chrono::Utc::now().format("%Y%m%d%H%M%S%3f"),
        counter
    )
}

fn valid_name(name: &str, max_len: usize) -> bool {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_well
        && name.len() <= max_len
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Desired function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Service the function lives in (changing it replaces the resource)
    pub service: String,
    /// Function name; conflicts with `name_prefix`
    #[serde(default)]
    pub name: Option<String>,
    /// Generate a unique name starting with this prefix
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub description: String,
    pub handler: String,
    pub runtime: String,
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    /// Local zip archive holding the code
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub oss_bucket: Option<String>,
    #[serde(default)]
    pub oss_key: Option<String>,
}

impl FunctionConfig {
    fn code_changed(&self, other: &FunctionConfig) -> bool {
        self.filename != other.filename
            || self.oss_bucket != other.oss_bucket
            || self.oss_key != other.oss_key
    }
}

/// Observed function
///
/// Code source attributes are write-only and never part of the observed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionState {
    pub service: String,
    pub name: String,
    pub description: String,
    pub handler: String,
    pub runtime: String,
    pub memory_size: u32,
    pub timeout: u32,
    pub environment_variables: BTreeMap<String, String>,
    pub function_id: String,
    pub last_modified: Option<String>,
    pub code_size: u64,
}

impl FunctionState {
    fn from_function(service: &str, function: Function) -> Self {
        Self {
            service: service.to_string(),
            name: function.function_name,
            description: function.description,
            handler: function.handler,
            runtime: function.runtime,
            memory_size: function.memory_size,
            timeout: function.timeout,
            environment_variables: function.environment_variables,
            function_id: function.function_id,
            last_modified: function.last_modified_time,
            code_size: function.code_size,
        }
    }
}

/// State accessor for functions, keyed by `<service>:<name>`
#[derive(Clone)]
pub struct FunctionAccessor {
    api: Arc<dyn FcApi>,
}

impl FunctionAccessor {
    pub fn new(api: Arc<dyn FcApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StateAccessor for FunctionAccessor {
    async fn fetch(&self, id: &str) -> Result<Observation> {
        let (service, name) = parse_function_id(id)?;

        let function = match self.api.get_function(&service, &name).await {
            Ok(function) => function,
            Err(e) if e.is_not_found() => return Ok(Observation::NotFound),
            Err(e) => return Err(e),
        };

        if function.function_name == name {
            Ok(Observation::Found(LogicalState::Normal))
        } else {
            Ok(Observation::Found(LogicalState::Pending))
        }
    }
}

/// Function resource adapter
pub struct FcFunction {
    api: Arc<dyn FcApi>,
    accessor: FunctionAccessor,
    budget: WaitBudget,
}

impl FcFunction {
    /// Create an adapter that waits with `budget` after mutating calls
    pub fn new(api: Arc<dyn FcApi>, budget: WaitBudget) -> Self {
        Self {
            accessor: FunctionAccessor::new(api.clone()),
            api,
            budget,
        }
    }

    fn wrap(id: &str, action: &str, e: Error) -> Error {
        Error::resource(RESOURCE_TYPE, id, action, e)
    }

    /// Resolve the function name from `name`, `name_prefix` or the default prefix
    fn resolve_name(config: &FunctionConfig) -> String {
        match (&config.name, &config.name_prefix) {
            (Some(name), _) => name.clone(),
            (None, Some(prefix)) => unique_name(prefix),
            (None, None) => unique_name(DEFAULT_NAME_PREFIX),
        }
    }

    /// Load the code package from its configured source
    async fn load_code(config: &FunctionConfig) -> Result<FunctionCode> {
        match (&config.filename, &config.oss_bucket, &config.oss_key) {
            (Some(path), None, None) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    Error::invalid_input(format!(
                        "cannot read code package {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!("Loaded {} bytes of code from {}", bytes.len(), path.display());
                Ok(FunctionCode::zip(STANDARD.encode(bytes)))
            }
            (None, Some(bucket), Some(key)) => Ok(FunctionCode::oss(bucket, key)),
            _ => Err(Error::invalid_input(
                "exactly one code source is required: filename, or oss_bucket with oss_key",
            )),
        }
    }

    async fn read_after(&self, id: &str, step: &str) -> Result<FunctionState> {
        self.read(id).await?.ok_or_else(|| {
            Self::wrap(
                id,
                "GetFunction",
                Error::not_found(format!("function {} vanished after {}", id, step)),
            )
        })
    }
}

#[async_trait]
impl Resource for FcFunction {
    type Config = FunctionConfig;
    type State = FunctionState;

    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn validate(&self, config: &FunctionConfig) -> Result<()> {
        if !valid_name(&config.service, MAX_NAME_LEN) {
            return Err(Error::invalid_input(format!(
                "invalid service name '{}'",
                config.service
            )));
        }

        match (&config.name, &config.name_prefix) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_input(
                    "name and name_prefix cannot both be set",
                ));
            }
            (Some(name), None) if !valid_name(name, MAX_NAME_LEN) => {
                return Err(Error::invalid_input(format!(
                    "invalid function name '{}'",
                    name
                )));
            }
            (None, Some(prefix)) if !valid_name(prefix, MAX_NAME_PREFIX_LEN) => {
                return Err(Error::invalid_input(format!(
                    "invalid function name prefix '{}'",
                    prefix
                )));
            }
            _ => {}
        }

        if config.handler.is_empty() {
            return Err(Error::invalid_input("handler cannot be empty"));
        }
        if config.runtime.is_empty() {
            return Err(Error::invalid_input("runtime cannot be empty"));
        }

        if !(MIN_MEMORY_SIZE..=MAX_MEMORY_SIZE).contains(&config.memory_size)
            || config.memory_size % MEMORY_SIZE_STEP != 0
        {
            return Err(Error::invalid_input(format!(
                "memory_size must be a multiple of {} between {} and {}, got {}",
                MEMORY_SIZE_STEP, MIN_MEMORY_SIZE, MAX_MEMORY_SIZE, config.memory_size
            )));
        }
        if !(1..=MAX_TIMEOUT).contains(&config.timeout) {
            return Err(Error::invalid_input(format!(
                "timeout must be between 1 and {} seconds, got {}",
                MAX_TIMEOUT, config.timeout
            )));
        }

        match (&config.filename, &config.oss_bucket, &config.oss_key) {
            (Some(_), None, None) | (None, Some(_), Some(_)) => Ok(()),
            (Some(_), _, _) => Err(Error::invalid_input(
                "filename conflicts with oss_bucket and oss_key",
            )),
            (None, Some(_), None) | (None, None, Some(_)) => Err(Error::invalid_input(
                "oss_bucket and oss_key must be set together",
            )),
            (None, None, None) => Err(Error::invalid_input(
                "either filename or oss_bucket with oss_key is required",
            )),
        }
    }

    fn requires_replacement(&self, prior: &FunctionConfig, config: &FunctionConfig) -> bool {
        // An unset name keeps whatever name was generated before
        let renamed = config.name.is_some() && prior.name != config.name;
        prior.service != config.service || renamed || prior.name_prefix != config.name_prefix
    }

    async fn create(&self, config: &FunctionConfig) -> Result<Applied<FunctionState>> {
        self.validate(config)?;

        let name = Self::resolve_name(config);
        let id = function_id(&config.service, &name);
        let input = CreateFunctionInput {
            function_name: name,
            description: config.description.clone(),
            handler: config.handler.clone(),
            runtime: config.runtime.clone(),
            memory_size: config.memory_size,
            timeout: config.timeout,
            environment_variables: config.environment_variables.clone(),
            code: Self::load_code(config).await?,
        };
        debug!("Creating function {}: {:?}", id, input);

        self.api
            .create_function(&config.service, &input)
            .await
            .map_err(|e| Self::wrap(&id, "CreateFunction", e))?;

        wait_for_state(&self.accessor, &id, LogicalState::Normal, &self.budget)
            .await
            .map_err(|e| Self::wrap(&id, "WaitForFunction", e))?;

        let state = self.read_after(&id, "create").await?;
        info!("Created function {}", id);
        Ok(Applied { id, state })
    }

    async fn read(&self, id: &str) -> Result<Option<FunctionState>> {
        let (service, name) = parse_function_id(id)?;

        match self.api.get_function(&service, &name).await {
            Ok(function) => Ok(Some(FunctionState::from_function(&service, function))),
            Err(e) if e.is_not_found() => {
                debug!("Function {} not found", id);
                Ok(None)
            }
            Err(e) => Err(Self::wrap(id, "GetFunction", e)),
        }
    }

    async fn update(
        &self,
        id: &str,
        prior: &FunctionConfig,
        config: &FunctionConfig,
    ) -> Result<FunctionState> {
        self.validate(config)?;
        let (service, name) = parse_function_id(id)?;

        fn changed<T: Clone + PartialEq>(prior: &T, desired: &T) -> Option<T> {
            (prior != desired).then(|| desired.clone())
        }

        let mut input = UpdateFunctionInput {
            description: changed(&prior.description, &config.description),
            handler: changed(&prior.handler, &config.handler),
            runtime: changed(&prior.runtime, &config.runtime),
            memory_size: changed(&prior.memory_size, &config.memory_size),
            timeout: changed(&prior.timeout, &config.timeout),
            environment_variables: changed(
                &prior.environment_variables,
                &config.environment_variables,
            ),
            code: None,
        };
        if prior.code_changed(config) {
            input.code = Some(Self::load_code(config).await?);
        }

        if input.is_empty() {
            debug!("Function {} unchanged", id);
        } else {
            debug!("Updating function {}: {:?}", id, input);
            self.api
                .update_function(&service, &name, &input)
                .await
                .map_err(|e| Self::wrap(id, "UpdateFunction", e))?;
        }

        self.read_after(id, "update").await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let (service, name) = parse_function_id(id)?;

        match self.api.delete_function(&service, &name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("Function {} already gone", id);
                return Ok(());
            }
            Err(e) => return Err(Self::wrap(id, "DeleteFunction", e)),
        }

        wait_for_state(&self.accessor, id, LogicalState::Deleted, &self.budget)
            .await
            .map_err(|e| Self::wrap(id, "WaitForFunction", e))?;

        info!("Deleted function {}", id);
        Ok(())
    }
}
