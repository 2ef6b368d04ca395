//! `alicloud_ram_login_profile` adapter

use std::sync::Arc;

use alicloud_core::{
    Applied, Error, LogicalState, Observation, Resource, Result, StateAccessor, WaitBudget,
    wait_for_state,
};
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::RESOURCE_TYPE;
use crate::api::{CreateLoginProfileRequest, LoginProfile, RamApi, UpdateLoginProfileRequest};

/// Desired login profile
///
/// Serializes without the password: `password_digest` takes its place, so
/// recorded state can tell whether the password changed without holding it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct LoginProfileConfig {
    /// RAM user owning the profile (changing it replaces the resource)
    pub user_name: String,
    /// Console password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_reset_required: bool,
    #[serde(default)]
    pub mfa_bind_required: bool,
    /// Digest of the password last applied, when the password itself is unknown
    #[serde(default)]
    pub password_digest: Option<String>,
}

impl LoginProfileConfig {
    /// Configuration with both flags off
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
            password_reset_required: false,
            mfa_bind_required: false,
            password_digest: None,
        }
    }

    /// Digest identifying the password
    ///
    /// Computed from the password when it is known, otherwise the recorded
    /// `password_digest`.
    pub fn password_fingerprint(&self) -> Option<String> {
        if self.password.is_empty() {
            return self.password_digest.clone();
        }
        Some(password_digest(&self.user_name, &self.password))
    }
}

/// Hex SHA-256 of the password, salted with the user name
fn password_digest(user_name: &str, password: &str) -> String {
    Sha256::new()
        .chain_update(user_name.as_bytes())
        .chain_update([0u8])
        .chain_update(password.as_bytes())
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl Serialize for LoginProfileConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut config = serializer.serialize_struct("LoginProfileConfig", 4)?;
        config.serialize_field("user_name", &self.user_name)?;
        config.serialize_field("password_digest", &self.password_fingerprint())?;
        config.serialize_field("password_reset_required", &self.password_reset_required)?;
        config.serialize_field("mfa_bind_required", &self.mfa_bind_required)?;
        config.end()
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for LoginProfileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginProfileConfig")
            .field("user_name", &self.user_name)
            .field("password", &"<REDACTED>")
            .field("password_reset_required", &self.password_reset_required)
            .field("mfa_bind_required", &self.mfa_bind_required)
            .finish()
    }
}

/// Observed login profile
///
/// The password is write-only and never part of the observed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginProfileState {
    pub user_name: String,
    pub password_reset_required: bool,
    pub mfa_bind_required: bool,
}

impl From<LoginProfile> for LoginProfileState {
    fn from(profile: LoginProfile) -> Self {
        Self {
            user_name: profile.user_name,
            password_reset_required: profile.password_reset_required,
            mfa_bind_required: profile.mfa_bind_required,
        }
    }
}

/// State accessor for login profiles, keyed by user name
///
/// A readable profile for the same user is `Normal`; a profile reported
/// under another name is still propagating and counts as `Pending`.
#[derive(Clone)]
pub struct LoginProfileAccessor {
    api: Arc<dyn RamApi>,
}

impl LoginProfileAccessor {
    pub fn new(api: Arc<dyn RamApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StateAccessor for LoginProfileAccessor {
    async fn fetch(&self, id: &str) -> Result<Observation> {
        let profile = match self.api.get_login_profile(id).await {
            Ok(profile) => profile,
            Err(e) if e.is_not_found() => return Ok(Observation::NotFound),
            Err(e) => return Err(e),
        };

        if profile.user_name == id {
            Ok(Observation::Found(LogicalState::Normal))
        } else {
            Ok(Observation::Found(LogicalState::Pending))
        }
    }
}

/// Login profile resource adapter
pub struct RamLoginProfile {
    api: Arc<dyn RamApi>,
    accessor: LoginProfileAccessor,
    budget: WaitBudget,
}

impl RamLoginProfile {
    /// Create an adapter that waits with `budget` after mutating calls
    pub fn new(api: Arc<dyn RamApi>, budget: WaitBudget) -> Self {
        Self {
            accessor: LoginProfileAccessor::new(api.clone()),
            api,
            budget,
        }
    }

    fn wrap(id: &str, action: &str, e: Error) -> Error {
        Error::resource(RESOURCE_TYPE, id, action, e)
    }
}

#[async_trait]
impl Resource for RamLoginProfile {
    type Config = LoginProfileConfig;
    type State = LoginProfileState;

    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn validate(&self, config: &LoginProfileConfig) -> Result<()> {
        if config.user_name.is_empty() {
            return Err(Error::invalid_input("user_name cannot be empty"));
        }
        if config.password.is_empty() {
            return Err(Error::invalid_input("password cannot be empty"));
        }
        Ok(())
    }

    fn requires_replacement(&self, prior: &LoginProfileConfig, config: &LoginProfileConfig) -> bool {
        prior.user_name != config.user_name
    }

    async fn create(&self, config: &LoginProfileConfig) -> Result<Applied<LoginProfileState>> {
        self.validate(config)?;

        // Flags left at their default are not sent
        let request = CreateLoginProfileRequest {
            user_name: config.user_name.clone(),
            password: config.password.clone(),
            password_reset_required: config.password_reset_required.then_some(true),
            mfa_bind_required: config.mfa_bind_required.then_some(true),
        };
        debug!("Creating login profile: {:?}", request);

        self.api
            .create_login_profile(&request)
            .await
            .map_err(|e| Self::wrap(&config.user_name, "CreateLoginProfile", e))?;

        let id = config.user_name.clone();
        wait_for_state(&self.accessor, &id, LogicalState::Normal, &self.budget)
            .await
            .map_err(|e| Self::wrap(&id, "WaitForLoginProfile", e))?;

        let state = self.read(&id).await?.ok_or_else(|| {
            Self::wrap(
                &id,
                "GetLoginProfile",
                Error::not_found(format!("login profile {} vanished after create", id)),
            )
        })?;

        info!("Created login profile for {}", id);
        Ok(Applied { id, state })
    }

    async fn read(&self, id: &str) -> Result<Option<LoginProfileState>> {
        match self.api.get_login_profile(id).await {
            Ok(profile) => Ok(Some(profile.into())),
            Err(e) if e.is_not_found() => {
                debug!("Login profile {} not found", id);
                Ok(None)
            }
            Err(e) => Err(Self::wrap(id, "GetLoginProfile", e)),
        }
    }

    async fn update(
        &self,
        id: &str,
        prior: &LoginProfileConfig,
        config: &LoginProfileConfig,
    ) -> Result<LoginProfileState> {
        self.validate(config)?;

        // Only what changed is sent
        let request = UpdateLoginProfileRequest {
            user_name: id.to_string(),
            password: (prior.password_fingerprint() != config.password_fingerprint())
                .then(|| config.password.clone()),
            password_reset_required: (prior.password_reset_required
                != config.password_reset_required)
                .then_some(config.password_reset_required),
            mfa_bind_required: (prior.mfa_bind_required != config.mfa_bind_required)
                .then_some(config.mfa_bind_required),
        };

        if request.is_empty() {
            debug!("Login profile {} unchanged, skipping UpdateLoginProfile", id);
        } else {
            debug!("Updating login profile: {:?}", request);
            self.api
                .update_login_profile(&request)
                .await
                .map_err(|e| Self::wrap(id, "UpdateLoginProfile", e))?;
        }

        self.read(id).await?.ok_or_else(|| {
            Self::wrap(
                id,
                "GetLoginProfile",
                Error::not_found(format!("login profile {} vanished after update", id)),
            )
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.api.delete_login_profile(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("Login profile {} already gone", id);
                return Ok(());
            }
            Err(e) => return Err(Self::wrap(id, "DeleteLoginProfile", e)),
        }

        wait_for_state(&self.accessor, id, LogicalState::Deleted, &self.budget)
            .await
            .map_err(|e| Self::wrap(id, "WaitForLoginProfile", e))?;

        info!("Deleted login profile for {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> LoginProfileConfig {
        LoginProfileConfig::new("user-1", "Secret-123")
    }

    fn resource() -> RamLoginProfile {
        let api = Arc::new(crate::MemoryRamApi::new(0));
        RamLoginProfile::new(
            api,
            WaitBudget::new(Duration::from_secs(10), Duration::from_secs(1)).unwrap(),
        )
    }

    #[test]
    fn config_defaults_flags_to_false() {
        let config: LoginProfileConfig = serde_json::from_value(serde_json::json!({
            "user_name": "user-1",
            "password": "Secret-123"
        }))
        .unwrap();

        assert!(!config.password_reset_required);
        assert!(!config.mfa_bind_required);
        assert!(!format!("{:?}", config).contains("Secret-123"));
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let resource = resource();

        let mut missing_user = config();
        missing_user.user_name.clear();
        assert!(resource.validate(&missing_user).is_err());

        let mut missing_password = config();
        missing_password.password.clear();
        assert!(resource.validate(&missing_password).is_err());

        assert!(resource.validate(&config()).is_ok());
    }

    #[test]
    fn only_user_name_forces_replacement() {
        let resource = resource();
        let prior = config();

        let mut renamed = config();
        renamed.user_name = "user-2".to_string();
        assert!(resource.requires_replacement(&prior, &renamed));

        let mut flagged = config();
        flagged.mfa_bind_required = true;
        flagged.password = "Other-456".to_string();
        assert!(!resource.requires_replacement(&prior, &flagged));
    }

    #[test]
    fn serialized_config_carries_a_digest_instead_of_the_password() {
        let value = serde_json::to_value(config()).unwrap();

        assert!(value.get("password").is_none());
        assert!(!value.to_string().contains("Secret-123"));
        let digest = value["password_digest"].as_str().unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(Some(digest.to_string()), config().password_fingerprint());
    }

    #[test]
    fn recorded_digest_stands_in_for_an_unknown_password() {
        let recorded: LoginProfileConfig =
            serde_json::from_value(serde_json::to_value(config()).unwrap()).unwrap();
        assert!(recorded.password.is_empty());
        assert_eq!(recorded.password_fingerprint(), config().password_fingerprint());

        let mut changed = config();
        changed.password = "Other-456".to_string();
        assert_ne!(recorded.password_fingerprint(), changed.password_fingerprint());
    }

    #[test]
    fn digest_depends_on_the_user() {
        let mut other_user = config();
        other_user.user_name = "user-2".to_string();

        assert_ne!(other_user.password_fingerprint(), config().password_fingerprint());
    }
}
