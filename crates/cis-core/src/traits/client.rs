// # CIS Client Trait
//
// Defines the boundary with the remote REST API.
//
// ## Implementations
//
// - HTTP: `cis-client-http` crate
// - Tests: in-memory doubles under `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use cis_core::traits::{ApiRequest, CisClient, Service};
//
// let zone = client
//     .call(ApiRequest::get(Service::Cis, format!("/v1/{}/zones/{}", crn, zone_id)))
//     .await?;
// ```

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Which remote service a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Cloud Internet Services API (zones, settings, rules)
    Cis,
    /// Resource controller (service instance lifecycle)
    ResourceController,
}

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// One call against the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub service: Service,
    pub method: Method,
    /// Path below the service base URL, starting with `/`
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(service: Service, method: Method, path: impl Into<String>) -> Self {
        Self {
            service,
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::Get, path)
    }

    pub fn post(service: Service, path: impl Into<String>, body: Value) -> Self {
        Self::new(service, Method::Post, path).with_body(body)
    }

    pub fn put(service: Service, path: impl Into<String>, body: Value) -> Self {
        Self::new(service, Method::Put, path).with_body(body)
    }

    pub fn patch(service: Service, path: impl Into<String>, body: Value) -> Self {
        Self::new(service, Method::Patch, path).with_body(body)
    }

    pub fn delete(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::Delete, path)
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Trait for remote API clients
///
/// A client executes exactly one HTTP call per invocation and reports the
/// outcome unchanged: no retries, no caching. Callers decide whether to
/// poll.
///
/// # Errors
///
/// Implementations map HTTP failures onto [`crate::Error`] so that callers
/// can tell them apart:
/// - 401/403 → `Error::Authentication`
/// - 404 → `Error::NotFound`
/// - 429 → `Error::RateLimited`
/// - anything else non-2xx → `Error::Api { status, .. }`
#[async_trait]
pub trait CisClient: Send + Sync {
    /// Execute a request and return the `result` payload of the response
    async fn call(&self, request: ApiRequest) -> Result<Value, crate::Error>;
}

/// Helper trait for acquiring client sessions
///
/// Session acquisition errors are returned to the host as they are.
pub trait ClientFactory: Send + Sync {
    /// Create or reuse a client session
    fn session(&self) -> Result<Arc<dyn CisClient>, crate::Error>;
}
