// # CIS HTTP Client
//
// This crate provides the reqwest-backed implementation of `CisClient`.
//
// - ✅ One HTTP request per `call`, no retries (polling is owned by `StateWait`)
// - ✅ HTTP timeout from configuration (30 seconds by default)
// - ✅ Status code mapping (401/403, 404, 429, 5xx)
// - ✅ CIS response envelope unwrapped to its `result`
// - ❌ NO caching
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - The bearer token NEVER appears in logs or Debug output
// - The token is read from the environment only, when a session is created
// - Session creation fails fast if the token is missing or empty
//
// ## API Reference
//
// - CIS API: `{cis endpoint}/v1/{crn}/zones/...`
// - Resource controller: `{resource controller endpoint}/v2/resource_instances/...`

use async_trait::async_trait;
use cis_core::config::{EndpointConfig, ProviderConfig};
use cis_core::traits::{ApiRequest, CisClient, ClientFactory, Method, Service};
use cis_core::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// HTTP client for the CIS and resource controller APIs
///
/// # Security
///
/// The Debug implementation does NOT expose the token.
#[derive(Clone)]
pub struct HttpCisClient {
    /// Bearer token
    /// ⚠️ NEVER log this value
    token: String,

    /// Base URLs
    endpoints: EndpointConfig,

    /// Shared HTTP connection pool
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpCisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCisClient")
            .field("token", &"<REDACTED>")
            .field("cis", &self.endpoints.cis)
            .field("resource_controller", &self.endpoints.resource_controller)
            .finish()
    }
}

impl HttpCisClient {
    /// Create a client with its own connection pool
    pub fn new(token: impl Into<String>, endpoints: EndpointConfig) -> Result<Self> {
        let client = build_http_client(&endpoints)?;
        Self::with_client(token, endpoints, client)
    }

    fn with_client(
        token: impl Into<String>,
        endpoints: EndpointConfig,
        client: reqwest::Client,
    ) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::session("API token cannot be empty"));
        }

        Ok(Self {
            token,
            endpoints,
            client,
        })
    }

    /// Full URL for a request
    fn url(&self, request: &ApiRequest) -> String {
        let base = match request.service {
            Service::Cis => &self.endpoints.cis,
            Service::ResourceController => &self.endpoints.resource_controller,
        };
        format!("{}{}", base.trim_end_matches('/'), request.path)
    }
}

#[async_trait]
impl CisClient for HttpCisClient {
    async fn call(&self, request: ApiRequest) -> Result<Value> {
        let url = self.url(&request);
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &request, &text));
        }

        let value: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        match request.service {
            Service::Cis => unwrap_envelope(status.as_u16(), value),
            Service::ResourceController => Ok(value),
        }
    }
}

fn build_http_client(endpoints: &EndpointConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(endpoints.request_timeout())
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Error messages from a CIS or resource controller error body
///
/// CIS reports `{"errors": [{"code", "message"}]}`; the resource controller
/// reports `{"message": ...}` or `{"description": ...}`. Anything else is
/// returned as raw text.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    if let Some(errors) = json.get("errors").and_then(Value::as_array) {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    ["message", "description"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a non-2xx response onto the error taxonomy
fn map_status(status: u16, request: &ApiRequest, body: &str) -> Error {
    let message = error_message(body);
    match status {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions (status {}): {}",
            status, message
        )),
        404 => Error::not_found(format!("{} {}: {}", request.method, request.path, message)),
        429 => Error::rate_limited(format!("Rate limit exceeded: {}", message)),
        500..=599 => Error::api(status, format!("Server error (transient): {}", message)),
        _ => Error::api(status, message),
    }
}

/// Extract `result` from a CIS response envelope
fn unwrap_envelope(status: u16, value: Value) -> Result<Value> {
    let mut envelope = match value {
        Value::Object(envelope) => envelope,
        other => return Ok(other),
    };

    if envelope.get("success").and_then(Value::as_bool) == Some(false) {
        let body = Value::Object(envelope).to_string();
        return Err(Error::api(status, error_message(&body)));
    }

    envelope.remove("result").ok_or_else(|| {
        Error::Other(format!(
            "Invalid response format: CIS envelope (status {}) has no `result` field",
            status
        ))
    })
}

/// Client factory reading the token from the environment
///
/// The environment variable is read on every `session` call, so a rotated
/// token is picked up by the next lifecycle call.
pub struct HttpClientFactory {
    endpoints: EndpointConfig,
    token_env: String,
    client: reqwest::Client,
}

impl HttpClientFactory {
    /// Create a factory from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoints: config.endpoints.clone(),
            token_env: config.token_env.clone(),
            client: build_http_client(&config.endpoints)?,
        })
    }
}

impl std::fmt::Debug for HttpClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientFactory")
            .field("token_env", &self.token_env)
            .field("cis", &self.endpoints.cis)
            .finish()
    }
}

impl ClientFactory for HttpClientFactory {
    fn session(&self) -> Result<Arc<dyn CisClient>> {
        let token = std::env::var(&self.token_env).map_err(|_| {
            Error::session(format!(
                "Environment variable {} is not set",
                self.token_env
            ))
        })?;

        let client =
            HttpCisClient::with_client(token, self.endpoints.clone(), self.client.clone())?;
        Ok(Arc::new(client))
    }
}
