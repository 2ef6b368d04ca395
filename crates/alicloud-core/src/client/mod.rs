//! HTTP client for Alicloud APIs
//!
//! Alicloud products expose two API styles:
//!
//! - **RPC** (e.g. RAM): `POST /` with form fields `Action`, `Version`, ...
//! - **ROA** (e.g. Function Compute): REST paths such as
//!   `GET /2016-08-15/services/{service}/functions/{function}`
//!
//! Both report failures as JSON bodies carrying an error code
//! (`Code` for RPC, `ErrorCode` for ROA). The client decodes them into
//! [`Error::Api`], classified through [`classify_response`].
//!
//! The client makes exactly one HTTP request per call. It never retries:
//! pacing and retries are owned by the waiter and the caller.
//!
//! ## Security
//!
//! - Credentials NEVER appear in logs or `Debug` output
//! - Request signing is performed by the gateway at the configured endpoint

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::classify::classify_response;
use crate::config::BackendConfig;
use crate::error::{Error, Result};

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Access credentials attached to every request
#[derive(Clone)]
pub struct Credentials {
    /// Access key id
    /// ⚠️ NEVER log this value
    access_key_id: String,
    /// STS security token
    /// ⚠️ NEVER log this value
    security_token: Option<String>,
}

impl Credentials {
    /// Create credentials from an access key id and optional STS token
    pub fn new(access_key_id: impl Into<String>, security_token: Option<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            security_token,
        }
    }
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"<REDACTED>")
            .field("security_token", &"<REDACTED>")
            .finish()
    }
}

/// Alicloud API client
///
/// Cheap to clone; clones share the underlying connection pool. Resource
/// adapters receive it as an explicit constructor dependency.
#[derive(Debug, Clone)]
pub struct AcsClient {
    http: reqwest::Client,
    endpoint: String,
    region: String,
    credentials: Credentials,
}

impl AcsClient {
    /// Create a new client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Base URL (e.g. "https://ram.aliyuncs.com")
    /// - `region`: Region id (e.g. "cn-hangzhou")
    /// - `credentials`: Access credentials
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(Error::config("Endpoint cannot be empty"));
        }

        Ok(Self {
            http,
            endpoint,
            region: region.into(),
            credentials,
        })
    }

    /// Create a client from an HTTP backend configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        match config {
            BackendConfig::Http {
                endpoint,
                region,
                access_key_id,
                security_token,
            } => Self::new(
                endpoint.clone(),
                region.clone(),
                Credentials::new(access_key_id.clone(), security_token.clone()),
            ),
            other => Err(Error::config(format!(
                "Backend '{}' does not use an HTTP client",
                other.type_name()
            ))),
        }
    }

    /// Base URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Region id
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Call an RPC-style action
    ///
    /// # Parameters
    ///
    /// - `version`: API version (e.g. "2015-05-01" for RAM)
    /// - `action`: Action name (e.g. "GetLoginProfile")
    /// - `params`: Action-specific parameters
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// Action=GetLoginProfile&Version=2015-05-01&Format=JSON&RegionId=...&UserName=...
    /// ```
    pub async fn rpc(&self, version: &str, action: &str, params: &[(&str, String)]) -> Result<Value> {
        debug!("Calling RPC action {} (version {})", action, version);

        let mut form: Vec<(&str, String)> = vec![
            ("Action", action.to_string()),
            ("Version", version.to_string()),
            ("Format", "JSON".to_string()),
            ("RegionId", self.region.clone()),
            ("AccessKeyId", self.credentials.access_key_id.clone()),
        ];
        if let Some(ref token) = self.credentials.security_token {
            form.push(("SecurityToken", token.clone()));
        }
        form.extend(params.iter().cloned());

        let response = self
            .http
            .post(format!("{}/", self.endpoint))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        Self::decode(action, response).await
    }

    /// Call a ROA-style (REST) endpoint
    ///
    /// # Parameters
    ///
    /// - `method`: HTTP method
    /// - `path`: Path below the endpoint, starting with '/'
    /// - `body`: Optional JSON body
    pub async fn roa(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let label = format!("{} {}", method, path);
        debug!("Calling ROA endpoint {}", label);

        let mut request = self
            .http
            .request(method, format!("{}{}", self.endpoint, path))
            .header("x-acs-accesskey-id", &self.credentials.access_key_id)
            .header("x-acs-region-id", &self.region);
        if let Some(ref token) = self.credentials.security_token {
            request = request.header("x-acs-security-token", token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", label, e)))?;

        Self::decode(&label, response).await
    }

    /// Turn a response into its JSON body or a classified error
    async fn decode(label: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{} response unreadable: {}", label, e)))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let error = decode_error(status.as_u16(), &text);
        debug!("{} failed with status {}: {}", label, status, error);
        Err(error)
    }
}

/// Decode an Alicloud error body into a classified API error
///
/// Understands both `{Code, Message, RequestId}` (RPC) and
/// `{ErrorCode, ErrorMessage, RequestId}` (ROA). Bodies that are not JSON
/// are kept verbatim as the message.
pub fn decode_error(status: u16, body: &str) -> Error {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let field = |names: &[&str]| -> Option<String> {
        let json = json.as_ref()?;
        names
            .iter()
            .find_map(|name| json.get(*name).and_then(Value::as_str))
            .map(str::to_string)
    };

    let code = field(&["Code", "ErrorCode"]).filter(|c| !c.is_empty());
    let message = field(&["Message", "ErrorMessage"]).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP status {}", status)
        } else {
            body.trim().to_string()
        }
    });
    let request_id = field(&["RequestId"]);
    let class = classify_response(code.as_deref(), status);

    Error::Api {
        code: code.unwrap_or_else(|| format!("Http{}", status)),
        message,
        class,
        request_id,
    }
}
