//! RAM API seam
//!
//! The resource adapter talks to RAM only through [`RamApi`], which is
//! handed to it at construction time. Implementations make exactly one
//! API call per method and never retry.

use alicloud_core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Login profile as returned by `GetLoginProfile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginProfile {
    /// RAM user name
    pub user_name: String,
    /// Whether the user must reset the password at next login
    #[serde(default)]
    pub password_reset_required: bool,
    /// Whether the user must bind an MFA device at next login
    #[serde(default, rename = "MFABindRequired")]
    pub mfa_bind_required: bool,
    /// Creation time, as reported by the API
    #[serde(default)]
    pub create_date: Option<String>,
}

/// Parameters of `CreateLoginProfile`
#[derive(Clone, PartialEq, Eq)]
pub struct CreateLoginProfileRequest {
    /// RAM user name
    pub user_name: String,
    /// Console password
    /// ⚠️ NEVER log this value
    pub password: String,
    /// Sent only when set
    pub password_reset_required: Option<bool>,
    /// Sent only when set
    pub mfa_bind_required: Option<bool>,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for CreateLoginProfileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateLoginProfileRequest")
            .field("user_name", &self.user_name)
            .field("password", &"<REDACTED>")
            .field("password_reset_required", &self.password_reset_required)
            .field("mfa_bind_required", &self.mfa_bind_required)
            .finish()
    }
}

/// Parameters of `UpdateLoginProfile`
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateLoginProfileRequest {
    /// RAM user name
    pub user_name: String,
    /// New console password, if any
    /// ⚠️ NEVER log this value
    pub password: Option<String>,
    /// Sent only when set
    pub password_reset_required: Option<bool>,
    /// Sent only when set
    pub mfa_bind_required: Option<bool>,
}

impl UpdateLoginProfileRequest {
    /// True when the request would change nothing
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.password_reset_required.is_none()
            && self.mfa_bind_required.is_none()
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for UpdateLoginProfileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateLoginProfileRequest")
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("password_reset_required", &self.password_reset_required)
            .field("mfa_bind_required", &self.mfa_bind_required)
            .finish()
    }
}

/// Trait for RAM login profile API implementations
///
/// # Errors
///
/// Failures are returned as classified [`alicloud_core::Error`]s; a
/// missing user or profile has class `NotFound`.
#[async_trait]
pub trait RamApi: Send + Sync {
    /// `CreateLoginProfile`
    async fn create_login_profile(
        &self,
        request: &CreateLoginProfileRequest,
    ) -> Result<LoginProfile>;

    /// `GetLoginProfile`
    async fn get_login_profile(&self, user_name: &str) -> Result<LoginProfile>;

    /// `UpdateLoginProfile`
    async fn update_login_profile(
        &self,
        request: &UpdateLoginProfileRequest,
    ) -> Result<LoginProfile>;

    /// `DeleteLoginProfile`
    async fn delete_login_profile(&self, user_name: &str) -> Result<()>;
}
