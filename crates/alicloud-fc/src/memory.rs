// # Memory Function Compute API
//
// In-memory implementation of `FcApi`.
//
// ## Purpose
//
// Behaves like the Function Compute control plane closely enough to
// exercise the resource adapter end to end without cloud access:
//
// - Services must be registered with `add_service` before functions are created in them
// - OSS code must be uploaded with `put_object` before a function references it
// - Writes are visible to `GetFunction` only after the store's propagation lag
// - Errors can be queued with `inject_get_errors`
//
// ## Error Codes
//
// - `ServiceNotFound`: unknown service
// - `FunctionNotFound`: no such function in the service
// - `FunctionAlreadyExists`: duplicate create
// - `InvalidArgument`: malformed code package or missing OSS object

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use alicloud_core::{Error, EventualStore, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::Mutex;

use crate::api::{CreateFunctionInput, FcApi, Function, FunctionCode, UpdateFunctionInput};
use crate::resource::function_id;

/// In-memory Function Compute API
#[derive(Debug, Clone)]
pub struct MemoryFcApi {
    services: Arc<Mutex<HashSet<String>>>,
    objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
    functions: EventualStore<Function>,
    get_errors: Arc<Mutex<VecDeque<Error>>>,
    get_calls: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl MemoryFcApi {
    /// Create an empty Function Compute API
    ///
    /// # Parameters
    ///
    /// - `propagation_polls`: Reads that keep seeing the previous function after a change
    pub fn new(propagation_polls: u32) -> Self {
        Self {
            services: Arc::new(Mutex::new(HashSet::new())),
            objects: Arc::new(Mutex::new(HashMap::new())),
            functions: EventualStore::new(propagation_polls),
            get_errors: Arc::new(Mutex::new(VecDeque::new())),
            get_calls: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a service
    pub async fn add_service(&self, name: impl Into<String>) {
        self.services.lock().await.insert(name.into());
    }

    /// Upload an OSS object that functions can use as code
    pub async fn put_object(
        &self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) {
        self.objects
            .lock()
            .await
            .insert((bucket.into(), key.into()), content.into());
    }

    /// Queue errors returned by the next `GetFunction` calls, in order
    pub async fn inject_get_errors(&self, errors: impl IntoIterator<Item = Error>) {
        self.get_errors.lock().await.extend(errors);
    }

    /// Number of `GetFunction` calls so far
    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Authoritative function, ignoring propagation lag
    pub async fn function(&self, service: &str, name: &str) -> Option<Function> {
        self.functions.latest(&function_id(service, name)).await
    }

    /// Ids (`<service>:<name>`) of all existing functions
    pub async fn function_ids(&self) -> Vec<String> {
        self.functions.ids().await
    }

    async fn require_service(&self, service: &str) -> Result<()> {
        if self.services.lock().await.contains(service) {
            Ok(())
        } else {
            Err(Error::api(
                "ServiceNotFound",
                format!("service '{}' does not exist", service),
            ))
        }
    }

    /// Size in bytes of a code package
    async fn code_size(&self, code: &FunctionCode) -> Result<u64> {
        match (&code.zip_file, &code.oss_bucket_name, &code.oss_object_name) {
            (Some(zip), None, None) => STANDARD
                .decode(zip)
                .map(|bytes| bytes.len() as u64)
                .map_err(|e| Error::api("InvalidArgument", format!("zipFile is not base64: {}", e))),
            (None, Some(bucket), Some(key)) => {
                let objects = self.objects.lock().await;
                objects
                    .get(&(bucket.clone(), key.clone()))
                    .map(|content| content.len() as u64)
                    .ok_or_else(|| {
                        Error::api(
                            "InvalidArgument",
                            format!("OSS object oss://{}/{} does not exist", bucket, key),
                        )
                    })
            }
            _ => Err(Error::api(
                "InvalidArgument",
                "code must be either zipFile or ossBucketName with ossObjectName",
            )),
        }
    }

    fn function_not_found(service: &str, name: &str) -> Error {
        Error::api(
            "FunctionNotFound",
            format!("function '{}' does not exist in service '{}'", name, service),
        )
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

impl Default for MemoryFcApi {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl FcApi for MemoryFcApi {
    async fn create_function(
        &self,
        service: &str,
        input: &CreateFunctionInput,
    ) -> Result<Function> {
        self.require_service(service).await?;

        let id = function_id(service, &input.function_name);
        if self.functions.latest(&id).await.is_some() {
            return Err(Error::api(
                "FunctionAlreadyExists",
                format!(
                    "function '{}' already exists in service '{}'",
                    input.function_name, service
                ),
            ));
        }

        let code_size = self.code_size(&input.code).await?;
        let now = Self::now();
        let function = Function {
            function_id: format!("fn-{:012x}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            function_name: input.function_name.clone(),
            description: input.description.clone(),
            handler: input.handler.clone(),
            runtime: input.runtime.clone(),
            memory_size: input.memory_size,
            timeout: input.timeout,
            environment_variables: input.environment_variables.clone(),
            code_size,
            created_time: Some(now.clone()),
            last_modified_time: Some(now),
        };
        self.functions.put(&id, function.clone()).await;

        Ok(function)
    }

    async fn get_function(&self, service: &str, name: &str) -> Result<Function> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.get_errors.lock().await.pop_front() {
            return Err(error);
        }
        self.require_service(service).await?;

        self.functions
            .get(&function_id(service, name))
            .await
            .ok_or_else(|| Self::function_not_found(service, name))
    }

    async fn update_function(
        &self,
        service: &str,
        name: &str,
        input: &UpdateFunctionInput,
    ) -> Result<Function> {
        self.require_service(service).await?;

        let id = function_id(service, name);
        let mut function = self
            .functions
            .latest(&id)
            .await
            .ok_or_else(|| Self::function_not_found(service, name))?;

        if let Some(ref code) = input.code {
            function.code_size = self.code_size(code).await?;
        }
        if let Some(ref description) = input.description {
            function.description = description.clone();
        }
        if let Some(ref handler) = input.handler {
            function.handler = handler.clone();
        }
        if let Some(ref runtime) = input.runtime {
            function.runtime = runtime.clone();
        }
        if let Some(memory_size) = input.memory_size {
            function.memory_size = memory_size;
        }
        if let Some(timeout) = input.timeout {
            function.timeout = timeout;
        }
        if let Some(ref variables) = input.environment_variables {
            function.environment_variables = variables.clone();
        }
        function.last_modified_time = Some(Self::now());

        self.functions.put(&id, function.clone()).await;
        Ok(function)
    }

    async fn delete_function(&self, service: &str, name: &str) -> Result<()> {
        self.require_service(service).await?;

        if self.functions.remove(&function_id(service, name)).await {
            Ok(())
        } else {
            Err(Self::function_not_found(service, name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn input(name: &str, code: FunctionCode) -> CreateFunctionInput {
        CreateFunctionInput {
            function_name: name.to_string(),
            description: "tf".to_string(),
            handler: "hello.handler".to_string(),
            runtime: "python2.7".to_string(),
            memory_size: 128,
            timeout: 3,
            environment_variables: BTreeMap::new(),
            code,
        }
    }

    #[tokio::test]
    async fn create_requires_existing_service() {
        let api = MemoryFcApi::new(0);
        let err = api
            .create_function("svc", &input("hello", FunctionCode::zip("UEsDBA==")))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("ServiceNotFound"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_measures_code_size() {
        let api = MemoryFcApi::new(0);
        api.add_service("svc").await;
        api.put_object("bucket", "fc/hello.zip", b"print('hello')".to_vec())
            .await;

        let zipped = api
            .create_function("svc", &input("a", FunctionCode::zip(STANDARD.encode(b"1234"))))
            .await
            .unwrap();
        let stored = api
            .create_function("svc", &input("b", FunctionCode::oss("bucket", "fc/hello.zip")))
            .await
            .unwrap();

        assert_eq!(zipped.code_size, 4);
        assert_eq!(stored.code_size, 14);
        assert_ne!(zipped.function_id, stored.function_id);
    }

    #[tokio::test]
    async fn missing_oss_object_is_rejected() {
        let api = MemoryFcApi::new(0);
        api.add_service("svc").await;

        let err = api
            .create_function("svc", &input("a", FunctionCode::oss("bucket", "nope.zip")))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("InvalidArgument"));
        assert!(api.function_ids().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let api = MemoryFcApi::new(2);
        api.add_service("svc").await;
        let code = FunctionCode::zip("UEsDBA==");

        api.create_function("svc", &input("hello", code.clone()))
            .await
            .unwrap();
        let err = api
            .create_function("svc", &input("hello", code))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("FunctionAlreadyExists"));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let api = MemoryFcApi::new(0);
        api.add_service("svc").await;
        api.create_function("svc", &input("hello", FunctionCode::zip("UEsDBA==")))
            .await
            .unwrap();

        api.update_function(
            "svc",
            "hello",
            &UpdateFunctionInput {
                memory_size: Some(512),
                ..UpdateFunctionInput::default()
            },
        )
        .await
        .unwrap();

        let function = api.function("svc", "hello").await.unwrap();
        assert_eq!(function.memory_size, 512);
        assert_eq!(function.description, "tf");
    }

    #[tokio::test]
    async fn get_lags_behind_delete() {
        let api = MemoryFcApi::new(1);
        api.add_service("svc").await;
        api.create_function("svc", &input("hello", FunctionCode::zip("UEsDBA==")))
            .await
            .unwrap();
        assert!(api.get_function("svc", "hello").await.is_err());
        assert!(api.get_function("svc", "hello").await.is_ok());

        api.delete_function("svc", "hello").await.unwrap();

        assert!(api.get_function("svc", "hello").await.is_ok());
        let err = api.get_function("svc", "hello").await.unwrap_err();
        assert_eq!(err.code(), Some("FunctionNotFound"));
        assert_eq!(api.get_call_count(), 4);
    }
}
