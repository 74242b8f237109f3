//! Test doubles and common utilities for contract tests
//!
//! The fake client answers from a script keyed by method and path and
//! records every request, so tests can assert both outcomes and the exact
//! remote traffic a lifecycle call produced.

#![allow(dead_code)]

use cis_core::config::{PollConfig, ProviderConfig};
use cis_core::error::{Error, Result};
use cis_core::traits::{ApiRequest, CisClient, ClientFactory, Method};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Instance CRN used throughout the tests
pub const CRN: &str = "crn:v1:bluemix:public:internet-svcs:global:a/acc:inst::";

/// `CRN` as it appears in request paths
pub const ENCODED_CRN: &str =
    "crn%3Av1%3Abluemix%3Apublic%3Ainternet-svcs%3Aglobal%3Aa%2Facc%3Ainst%3A%3A";

/// `/v1/{crn}/zones/{zone_id}`
pub fn zone_path(zone_id: &str) -> String {
    format!("/v1/{}/zones/{}", ENCODED_CRN, zone_id)
}

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    /// Successful response with this payload
    Json(Value),
    /// Failed response with this HTTP status
    Status(u16),
}

impl Reply {
    fn into_result(self, request: &ApiRequest) -> Result<Value> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Status(404) => Err(Error::not_found(format!("{} {}", request.method, request.path))),
            Reply::Status(401) | Reply::Status(403) => Err(Error::auth("token rejected")),
            Reply::Status(429) => Err(Error::rate_limited("slow down")),
            Reply::Status(status) => Err(Error::api(status, "scripted failure")),
        }
    }
}

/// In-memory CIS API
///
/// Each route holds a queue of replies. Replies are consumed in order and
/// the last one repeats. Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeCisClient {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
    call_count: AtomicUsize,
}

impl FakeCisClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply for `method path`
    pub fn on(&self, method: Method, path: impl Into<String>, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.into()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a JSON reply
    pub fn ok(&self, method: Method, path: impl Into<String>, value: Value) -> &Self {
        self.on(method, path, Reply::Json(value))
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given method
    pub fn requests_with(&self, method: Method) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

#[async_trait::async_trait]
impl CisClient for FakeCisClient {
    async fn call(&self, request: ApiRequest) -> Result<Value> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&(request.method, request.path.clone())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        reply.unwrap_or(Reply::Status(404)).into_result(&request)
    }
}

/// Factory handing out one shared fake client
pub struct FakeFactory {
    client: Arc<FakeCisClient>,
    sessions: AtomicUsize,
    fail: bool,
}

impl FakeFactory {
    pub fn new(client: Arc<FakeCisClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            sessions: AtomicUsize::new(0),
            fail: false,
        })
    }

    /// A factory whose sessions always fail
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            client: FakeCisClient::new(),
            sessions: AtomicUsize::new(0),
            fail: true,
        })
    }

    /// Get the number of sessions handed out
    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl ClientFactory for FakeFactory {
    fn session(&self) -> Result<Arc<dyn CisClient>> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::session("no credentials"));
        }
        let client: Arc<dyn CisClient> = self.client.clone();
        Ok(client)
    }
}

/// Configuration with fast polling
pub fn fast_config() -> ProviderConfig {
    ProviderConfig {
        poll: PollConfig {
            delay_secs: 1,
            min_interval_secs: 1,
        },
        ..ProviderConfig::default()
    }
}
