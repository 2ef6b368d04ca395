//! `FcApi` over the Function Compute REST API
//!
//! ## API Reference
//!
//! - `CreateFunction`: `POST /2016-08-15/services/{service}/functions`
//! - `GetFunction`: `GET /2016-08-15/services/{service}/functions/{name}`
//! - `UpdateFunction`: `PUT /2016-08-15/services/{service}/functions/{name}`
//! - `DeleteFunction`: `DELETE /2016-08-15/services/{service}/functions/{name}`
//!
//! Service and function names are restricted to `[A-Za-z0-9_-]`, so they
//! are placed in paths as is.

use alicloud_core::{AcsClient, Result};
use async_trait::async_trait;
use reqwest::Method;

use crate::FC_API_VERSION;
use crate::api::{CreateFunctionInput, FcApi, Function, UpdateFunctionInput};

/// Function Compute API over HTTP
#[derive(Debug, Clone)]
pub struct HttpFcApi {
    client: AcsClient,
}

impl HttpFcApi {
    /// Create a Function Compute API on top of a shared client
    pub fn new(client: AcsClient) -> Self {
        Self { client }
    }

    fn functions_path(service: &str) -> String {
        format!("/{}/services/{}/functions", FC_API_VERSION, service)
    }

    fn function_path(service: &str, name: &str) -> String {
        format!("{}/{}", Self::functions_path(service), name)
    }
}

#[async_trait]
impl FcApi for HttpFcApi {
    async fn create_function(
        &self,
        service: &str,
        input: &CreateFunctionInput,
    ) -> Result<Function> {
        let body = serde_json::to_value(input)?;
        let response = self
            .client
            .roa(Method::POST, &Self::functions_path(service), Some(&body))
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn get_function(&self, service: &str, name: &str) -> Result<Function> {
        let response = self
            .client
            .roa(Method::GET, &Self::function_path(service, name), None)
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn update_function(
        &self,
        service: &str,
        name: &str,
        input: &UpdateFunctionInput,
    ) -> Result<Function> {
        let body = serde_json::to_value(input)?;
        let response = self
            .client
            .roa(Method::PUT, &Self::function_path(service, name), Some(&body))
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn delete_function(&self, service: &str, name: &str) -> Result<()> {
        self.client
            .roa(Method::DELETE, &Self::function_path(service, name), None)
            .await?;
        Ok(())
    }
}
