//! Error types for the Alicloud provider
//!
//! This module defines the error type used throughout the workspace and
//! the typed classification every retry decision is based on.

use std::time::Duration;

use thiserror::Error;

use crate::classify::classify_code;
use crate::traits::LogicalState;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// How a failure should be treated by code that polls or retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The entity does not exist (yet, or any more)
    NotFound,
    /// Throttling, network trouble, server-side hiccups: worth retrying
    Transient,
    /// Everything else: retrying will not help
    NonTransient,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorClass::NotFound => "not-found",
            ErrorClass::Transient => "transient",
            ErrorClass::NonTransient => "non-transient",
        };
        f.write_str(name)
    }
}

/// Core error type for the provider
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entity not found, raised locally rather than by the cloud API
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Error returned by an Alicloud API, already classified
    #[error("API error {code}: {message}")]
    Api {
        /// Alicloud error code (e.g. "EntityNotExist.User.LoginProfile")
        code: String,
        /// Human readable message from the API
        message: String,
        /// Classification decided from the code
        class: ErrorClass,
        /// Request id, when the API returned one
        request_id: Option<String>,
    },

    /// HTTP transport errors (connection refused, reset, client timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O errors (e.g. reading a code package)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wait budget exhausted before the entity converged
    #[error(
        "Timed out after {waited:?} waiting for {id} to reach {desired}; last observed: {last_observed}{}",
        .last_error.as_ref().map(|e| format!(" (last error: {e})")).unwrap_or_default()
    )]
    Timeout {
        /// Entity identifier
        id: String,
        /// State that was waited for
        desired: LogicalState,
        /// Last state seen, or "not found" / "nothing" when none was seen
        last_observed: String,
        /// Last transient error swallowed while polling
        last_error: Option<String>,
        /// Time actually spent waiting
        waited: Duration,
    },

    /// The entity reached a terminal state other than the one waited for
    #[error("{id} reached terminal state {observed} while waiting for {desired}")]
    UnexpectedState {
        /// Entity identifier
        id: String,
        /// State that was waited for
        desired: LogicalState,
        /// Terminal state observed
        observed: LogicalState,
    },

    /// Failure of a resource operation, with call context
    #[error("[{resource}:{id}] {action} failed: {source}")]
    Resource {
        /// Resource type name (e.g. "alicloud_ram_login_profile")
        resource: String,
        /// Entity identifier
        id: String,
        /// API action or lifecycle step
        action: String,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an API error, classifying it from its code
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let class = classify_code(&code);
        Self::Api {
            code,
            message: message.into(),
            class,
            request_id: None,
        }
    }

    /// Wrap an error with the resource, entity and action it happened in
    pub fn resource(
        resource: impl Into<String>,
        id: impl Into<String>,
        action: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::Resource {
            resource: resource.into(),
            id: id.into(),
            action: action.into(),
            source: Box::new(source),
        }
    }

    /// Typed classification of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::NotFound(_) => ErrorClass::NotFound,
            Error::Api { class, .. } => *class,
            Error::Http(_) => ErrorClass::Transient,
            Error::Resource { source, .. } => source.class(),
            Error::Config(_)
            | Error::InvalidInput(_)
            | Error::Json(_)
            | Error::Io(_)
            | Error::Timeout { .. }
            | Error::UnexpectedState { .. }
            | Error::Other(_) => ErrorClass::NonTransient,
        }
    }

    /// Whether the entity addressed by the failed call does not exist
    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    /// Whether the failed call is worth retrying
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Alicloud error code, if this error (or its wrapped cause) came from the API
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            Error::Resource { source, .. } => source.code(),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
