//! `RamApi` over the RAM RPC API
//!
//! ## API Reference
//!
//! - `CreateLoginProfile`: UserName, Password, PasswordResetRequired, MFABindRequired
//! - `GetLoginProfile`: UserName
//! - `UpdateLoginProfile`: UserName, Password, PasswordResetRequired, MFABindRequired
//! - `DeleteLoginProfile`: UserName
//!
//! Successful responses carry a `LoginProfile` object (except delete).

use alicloud_core::{AcsClient, Error, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::RAM_API_VERSION;
use crate::api::{CreateLoginProfileRequest, LoginProfile, RamApi, UpdateLoginProfileRequest};

/// RAM API over HTTP
#[derive(Debug, Clone)]
pub struct HttpRamApi {
    client: AcsClient,
}

impl HttpRamApi {
    /// Create a RAM API on top of a shared client
    pub fn new(client: AcsClient) -> Self {
        Self { client }
    }

    fn login_profile(action: &str, body: Value) -> Result<LoginProfile> {
        let profile = body
            .get("LoginProfile")
            .cloned()
            .ok_or_else(|| Error::Other(format!("{} response has no LoginProfile", action)))?;
        Ok(serde_json::from_value(profile)?)
    }
}

fn flag(value: bool) -> String {
    value.to_string()
}

#[async_trait]
impl RamApi for HttpRamApi {
    async fn create_login_profile(
        &self,
        request: &CreateLoginProfileRequest,
    ) -> Result<LoginProfile> {
        let mut params = vec![
            ("UserName", request.user_name.clone()),
            ("Password", request.password.clone()),
        ];
        if let Some(value) = request.password_reset_required {
            params.push(("PasswordResetRequired", flag(value)));
        }
        if let Some(value) = request.mfa_bind_required {
            params.push(("MFABindRequired", flag(value)));
        }

        let body = self
            .client
            .rpc(RAM_API_VERSION, "CreateLoginProfile", &params)
            .await?;
        Self::login_profile("CreateLoginProfile", body)
    }

    async fn get_login_profile(&self, user_name: &str) -> Result<LoginProfile> {
        let body = self
            .client
            .rpc(
                RAM_API_VERSION,
                "GetLoginProfile",
                &[("UserName", user_name.to_string())],
            )
            .await?;
        Self::login_profile("GetLoginProfile", body)
    }

    async fn update_login_profile(
        &self,
        request: &UpdateLoginProfileRequest,
    ) -> Result<LoginProfile> {
        let mut params = vec![("UserName", request.user_name.clone())];
        if let Some(ref password) = request.password {
            params.push(("Password", password.clone()));
        }
        if let Some(value) = request.password_reset_required {
            params.push(("PasswordResetRequired", flag(value)));
        }
        if let Some(value) = request.mfa_bind_required {
            params.push(("MFABindRequired", flag(value)));
        }

        let body = self
            .client
            .rpc(RAM_API_VERSION, "UpdateLoginProfile", &params)
            .await?;
        Self::login_profile("UpdateLoginProfile", body)
    }

    async fn delete_login_profile(&self, user_name: &str) -> Result<()> {
        self.client
            .rpc(
                RAM_API_VERSION,
                "DeleteLoginProfile",
                &[("UserName", user_name.to_string())],
            )
            .await?;
        Ok(())
    }
}
