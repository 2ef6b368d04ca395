//! Configuration types for the Alicloud provider
//!
//! This module defines all configuration structures used throughout the workspace.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::waiter::WaitBudget;

/// Main provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Where cloud API calls go
    #[serde(default)]
    pub backend: BackendConfig,

    /// Budget for waits after mutating calls
    #[serde(default)]
    pub wait: WaitConfig,
}

impl ProviderConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.backend.validate()?;
        self.wait.validate()?;
        Ok(())
    }
}

/// Cloud API backend configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Alicloud HTTP APIs
    ///
    /// Requests carry the access key id and security token; signing is
    /// left to the gateway at `endpoint`.
    Http {
        /// Base URL requests are sent to
        endpoint: String,
        /// Region id (e.g. "cn-hangzhou")
        region: String,
        /// Access key id
        access_key_id: String,
        /// STS security token (optional)
        #[serde(default)]
        security_token: Option<String>,
    },

    /// In-memory APIs with simulated propagation lag
    Memory {
        /// Reads needed before a write becomes visible
        #[serde(default = "default_propagation_polls")]
        propagation_polls: u32,
    },
}

impl BackendConfig {
    /// Validate the backend configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            BackendConfig::Http {
                endpoint,
                region,
                access_key_id,
                ..
            } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("HTTP backend endpoint cannot be empty"));
                }
                if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "HTTP backend endpoint must use HTTP or HTTPS scheme. Got: {}",
                        endpoint
                    )));
                }
                if region.is_empty() {
                    return Err(crate::Error::config("Region cannot be empty"));
                }
                if access_key_id.is_empty() {
                    return Err(crate::Error::config(
                        "Access key id is required for the HTTP backend",
                    ));
                }
                Ok(())
            }
            BackendConfig::Memory { .. } => Ok(()),
        }
    }

    /// Get the backend type name
    pub fn type_name(&self) -> &str {
        match self {
            BackendConfig::Http { .. } => "http",
            BackendConfig::Memory { .. } => "memory",
        }
    }
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                endpoint, region, ..
            } => f
                .debug_struct("Http")
                .field("endpoint", endpoint)
                .field("region", region)
                .field("access_key_id", &"<REDACTED>")
                .field("security_token", &"<REDACTED>")
                .finish(),
            BackendConfig::Memory { propagation_polls } => f
                .debug_struct("Memory")
                .field("propagation_polls", propagation_polls)
                .finish(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory {
            propagation_polls: default_propagation_polls(),
        }
    }
}

/// Wait budget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Maximum time to wait for an entity to converge (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between polls (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// How the delay evolves between polls
    #[serde(default)]
    pub backoff: Backoff,
}

impl WaitConfig {
    /// Validate the wait configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Wait timeout must be > 0"));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Wait interval must be > 0"));
        }
        if let Backoff::Exponential {
            factor,
            max_interval_secs,
        } = self.backoff
        {
            if factor < 2 {
                return Err(crate::Error::config("Backoff factor must be >= 2"));
            }
            if max_interval_secs < self.interval_secs {
                return Err(crate::Error::config(
                    "Backoff max interval must be >= the base interval",
                ));
            }
        }
        Ok(())
    }

    /// Build the runtime wait budget
    pub fn budget(&self) -> Result<WaitBudget, crate::Error> {
        self.validate()?;
        Ok(WaitBudget::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.interval_secs),
        )?
        .with_backoff(self.backoff))
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            backoff: Backoff::default(),
        }
    }
}

/// Delay policy between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every poll
    #[default]
    Fixed,

    /// Delay multiplied by `factor` after each poll, capped
    Exponential {
        /// Growth factor
        factor: u32,
        /// Upper bound for a single delay (in seconds)
        max_interval_secs: u64,
    },
}

impl Backoff {
    /// Delay to sleep after the poll numbered `attempt` (starting at 1)
    pub fn delay(&self, base: Duration, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed => base,
            Backoff::Exponential {
                factor,
                max_interval_secs,
            } => {
                let cap = Duration::from_secs(max_interval_secs).max(base);
                let exponent = attempt.saturating_sub(1);
                let multiplier = factor.checked_pow(exponent).unwrap_or(u32::MAX);
                base.checked_mul(multiplier).unwrap_or(cap).min(cap)
            }
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_interval_secs() -> u64 {
    5
}

fn default_propagation_polls() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_timeouts() {
        let config = WaitConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.backoff, Backoff::Fixed);

        let budget = config.budget().unwrap();
        assert_eq!(budget.timeout, Duration::from_secs(60));
        assert_eq!(budget.interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = WaitConfig {
            timeout_secs: 0,
            ..WaitConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(config.budget().is_err());
    }

    #[test]
    fn exponential_backoff_grows_and_caps() {
        let backoff = Backoff::Exponential {
            factor: 2,
            max_interval_secs: 10,
        };
        let base = Duration::from_secs(1);

        assert_eq!(backoff.delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff.delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff.delay(base, 4), Duration::from_secs(8));
        assert_eq!(backoff.delay(base, 5), Duration::from_secs(10));
        assert_eq!(backoff.delay(base, 64), Duration::from_secs(10));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let base = Duration::from_millis(250);
        assert_eq!(Backoff::Fixed.delay(base, 1), base);
        assert_eq!(Backoff::Fixed.delay(base, 30), base);
    }

    #[test]
    fn http_backend_requires_credentials() {
        let backend = BackendConfig::Http {
            endpoint: "https://ram.aliyuncs.com".to_string(),
            region: "cn-hangzhou".to_string(),
            access_key_id: String::new(),
            security_token: None,
        };
        assert!(backend.validate().is_err());
    }

    #[test]
    fn backend_debug_hides_secrets() {
        let backend = BackendConfig::Http {
            endpoint: "https://ram.aliyuncs.com".to_string(),
            region: "cn-hangzhou".to_string(),
            access_key_id: "LTAI_id_value".to_string(),
            security_token: Some("sts_token_value".to_string()),
        };
        let debug = format!("{:?}", backend);
        assert!(!debug.contains("LTAI_id_value"));
        assert!(!debug.contains("sts_token_value"));
        assert!(debug.contains("cn-hangzhou"));
    }

    #[test]
    fn provider_config_deserializes_with_defaults() {
        let config: ProviderConfig = serde_json::from_value(serde_json::json!({
            "backend": { "type": "memory" },
            "wait": { "timeout_secs": 30, "backoff": { "type": "exponential", "factor": 2, "max_interval_secs": 20 } }
        }))
        .unwrap();

        assert_eq!(config.backend.type_name(), "memory");
        assert_eq!(config.wait.timeout_secs, 30);
        assert_eq!(config.wait.interval_secs, 5);
        config.validate().unwrap();
    }
}
