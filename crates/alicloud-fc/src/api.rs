//! Function Compute API seam
//!
//! The resource adapter talks to Function Compute only through [`FcApi`].
//! Bodies use the API's camelCase field names so the same types serve the
//! HTTP and in-memory implementations.

use std::collections::BTreeMap;

use alicloud_core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Code package of a function
///
/// Exactly one source is set: an inline base64 zip, or an OSS object.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oss_bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oss_object_name: Option<String>,
    /// Base64 encoded zip archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_file: Option<String>,
}

impl FunctionCode {
    /// Code stored in OSS
    pub fn oss(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            oss_bucket_name: Some(bucket.into()),
            oss_object_name: Some(key.into()),
            zip_file: None,
        }
    }

    /// Inline zip archive, already base64 encoded
    pub fn zip(encoded: impl Into<String>) -> Self {
        Self {
            zip_file: Some(encoded.into()),
            ..Self::default()
        }
    }
}

// Zip payloads can be megabytes; print their size only
impl std::fmt::Debug for FunctionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionCode")
            .field("oss_bucket_name", &self.oss_bucket_name)
            .field("oss_object_name", &self.oss_object_name)
            .field("zip_file", &self.zip_file.as_ref().map(|z| z.len()))
            .finish()
    }
}

/// Body of `CreateFunction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFunctionInput {
    pub function_name: String,
    pub description: String,
    pub handler: String,
    pub runtime: String,
    pub memory_size: u32,
    pub timeout: u32,
    pub environment_variables: BTreeMap<String, String>,
    pub code: FunctionCode,
}

/// Body of `UpdateFunction`; unset fields are left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFunctionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<FunctionCode>,
}

impl UpdateFunctionInput {
    /// Whether the update would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Function as returned by `GetFunction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub function_id: String,
    pub function_name: String,
    #[serde(default)]
    pub description: String,
    pub handler: String,
    pub runtime: String,
    pub memory_size: u32,
    pub timeout: u32,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub code_size: u64,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>,
}

/// Trait for Function Compute API implementations
///
/// # Errors
///
/// Failures are returned as classified [`alicloud_core::Error`]s; a
/// missing service or function has class `NotFound`.
#[async_trait]
pub trait FcApi: Send + Sync {
    /// `CreateFunction`
    async fn create_function(&self, service: &str, input: &CreateFunctionInput)
    -> Result<Function>;

    /// `GetFunction`
    async fn get_function(&self, service: &str, name: &str) -> Result<Function>;

    /// `UpdateFunction`
    async fn update_function(
        &self,
        service: &str,
        name: &str,
        input: &UpdateFunctionInput,
    ) -> Result<Function>;

    /// `DeleteFunction`
    async fn delete_function(&self, service: &str, name: &str) -> Result<()>;
}
