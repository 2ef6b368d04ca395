// # Memory RAM API
//
// In-memory implementation of `RamApi`.
//
// ## Purpose
//
// Behaves like the RAM control plane closely enough to exercise the
// resource adapter end to end without cloud access:
//
// - Users must be registered with `add_user` before a profile can be created
// - Writes are visible to `GetLoginProfile` only after the store's propagation lag
// - Errors can be queued with `inject_get_errors` to simulate throttling or outages
//
// ## Error Codes
//
// - `EntityNotExist.User`: unknown user
// - `EntityNotExist.User.LoginProfile`: no profile for the user
// - `EntityAlreadyExists.User.LoginProfile`: duplicate create
// - `InvalidParameter.Password`: empty password

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use alicloud_core::{Error, EventualStore, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::api::{CreateLoginProfileRequest, LoginProfile, RamApi, UpdateLoginProfileRequest};

#[derive(Debug, Clone)]
struct StoredProfile {
    profile: LoginProfile,
    password: String,
}

/// In-memory RAM API
#[derive(Debug, Clone)]
pub struct MemoryRamApi {
    users: Arc<Mutex<HashSet<String>>>,
    profiles: EventualStore<StoredProfile>,
    get_errors: Arc<Mutex<VecDeque<Error>>>,
    get_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
}

impl MemoryRamApi {
    /// Create an empty RAM API
    ///
    /// # Parameters
    ///
    /// - `propagation_polls`: Reads that keep seeing the previous profile after a change
    pub fn new(propagation_polls: u32) -> Self {
        Self {
            users: Arc::new(Mutex::new(HashSet::new())),
            profiles: EventualStore::new(propagation_polls),
            get_errors: Arc::new(Mutex::new(VecDeque::new())),
            get_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a RAM user
    pub async fn add_user(&self, user_name: impl Into<String>) {
        self.users.lock().await.insert(user_name.into());
    }

    /// Queue errors returned by the next `GetLoginProfile` calls, in order
    pub async fn inject_get_errors(&self, errors: impl IntoIterator<Item = Error>) {
        self.get_errors.lock().await.extend(errors);
    }

    /// Number of `GetLoginProfile` calls so far
    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `UpdateLoginProfile` calls so far
    pub fn update_call_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Authoritative profile of a user, ignoring propagation lag
    pub async fn profile(&self, user_name: &str) -> Option<LoginProfile> {
        self.profiles.latest(user_name).await.map(|s| s.profile)
    }

    /// Authoritative password of a user, ignoring propagation lag
    pub async fn password(&self, user_name: &str) -> Option<String> {
        self.profiles.latest(user_name).await.map(|s| s.password)
    }

    /// Number of profiles that exist
    pub async fn profile_count(&self) -> usize {
        self.profiles.len().await
    }

    fn profile_not_found(user_name: &str) -> Error {
        Error::api(
            "EntityNotExist.User.LoginProfile",
            format!("The login profile of user {} does not exist.", user_name),
        )
    }
}

impl Default for MemoryRamApi {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl RamApi for MemoryRamApi {
    async fn create_login_profile(
        &self,
        request: &CreateLoginProfileRequest,
    ) -> Result<LoginProfile> {
        if !self.users.lock().await.contains(&request.user_name) {
            return Err(Error::api(
                "EntityNotExist.User",
                format!("The user {} does not exist.", request.user_name),
            ));
        }
        if request.password.is_empty() {
            return Err(Error::api(
                "InvalidParameter.Password",
                "The password must not be empty.",
            ));
        }
        if self.profiles.latest(&request.user_name).await.is_some() {
            return Err(Error::api(
                "EntityAlreadyExists.User.LoginProfile",
                format!(
                    "The login profile of user {} already exists.",
                    request.user_name
                ),
            ));
        }

        let profile = LoginProfile {
            user_name: request.user_name.clone(),
            password_reset_required: request.password_reset_required.unwrap_or(false),
            mfa_bind_required: request.mfa_bind_required.unwrap_or(false),
            create_date: Some(chrono::Utc::now().to_rfc3339()),
        };
        self.profiles
            .put(
                &request.user_name,
                StoredProfile {
                    profile: profile.clone(),
                    password: request.password.clone(),
                },
            )
            .await;

        Ok(profile)
    }

    async fn get_login_profile(&self, user_name: &str) -> Result<LoginProfile> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.get_errors.lock().await.pop_front() {
            return Err(error);
        }

        self.profiles
            .get(user_name)
            .await
            .map(|s| s.profile)
            .ok_or_else(|| Self::profile_not_found(user_name))
    }

    async fn update_login_profile(
        &self,
        request: &UpdateLoginProfileRequest,
    ) -> Result<LoginProfile> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let mut stored = self
            .profiles
            .latest(&request.user_name)
            .await
            .ok_or_else(|| Self::profile_not_found(&request.user_name))?;

        if let Some(ref password) = request.password {
            if password.is_empty() {
                return Err(Error::api(
                    "InvalidParameter.Password",
                    "The password must not be empty.",
                ));
            }
            stored.password = password.clone();
        }
        if let Some(value) = request.password_reset_required {
            stored.profile.password_reset_required = value;
        }
        if let Some(value) = request.mfa_bind_required {
            stored.profile.mfa_bind_required = value;
        }

        let profile = stored.profile.clone();
        self.profiles.put(&request.user_name, stored).await;
        Ok(profile)
    }

    async fn delete_login_profile(&self, user_name: &str) -> Result<()> {
        if self.profiles.remove(user_name).await {
            Ok(())
        } else {
            Err(Self::profile_not_found(user_name))
        }
    }
}
