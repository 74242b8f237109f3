//! Provider entry point
//!
//! [`CisProvider`] is what a host talks to. For every lifecycle call it:
//!
//! 1. looks up the handler for the resource type
//! 2. acquires a client session from the factory
//! 3. builds an [`OperationContext`] with the configured poll timing and timeouts
//! 4. dispatches to the handler
//!
//! ```text
//! host ──► CisProvider::apply(type, op, data)
//!                 │
//!                 ├── ResourceRegistry::get(type)
//!                 ├── ClientFactory::session()
//!                 └── ResourceHandler::{create,read,update,delete,exists}
//!                             │
//!                             └── CisClient::call (+ StateWait)
//! ```
//!
//! Every call is independent: no state is shared between calls other than
//! the registry and the factory.

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::registry::ResourceRegistry;
use crate::resource::ResourceData;
use crate::traits::{ClientFactory, OperationContext};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Lifecycle callback requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Exists,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Exists => "exists",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Operation::Create),
            "read" => Ok(Operation::Read),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "exists" => Ok(Operation::Exists),
            other => Err(Error::invalid_input(format!(
                "Unknown operation '{}'. Allowed: create, read, update, delete, exists",
                other
            ))),
        }
    }
}

/// Result of one lifecycle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The record was updated in place
    Applied,
    /// Answer to an `exists` call
    Exists(bool),
}

/// Dispatches host lifecycle calls to resource handlers
pub struct CisProvider {
    factory: Arc<dyn ClientFactory>,
    registry: Arc<ResourceRegistry>,
    config: ProviderConfig,
}

impl CisProvider {
    /// Create a provider
    ///
    /// # Returns
    ///
    /// - `Ok(provider)`: Ready to dispatch
    /// - `Err(Error::Config)`: If the configuration is invalid
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        registry: Arc<ResourceRegistry>,
        config: ProviderConfig,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "CIS provider ready with {} resource types",
            registry.list().len()
        );

        Ok(Self {
            factory,
            registry,
            config,
        })
    }

    /// Create a provider with every built-in resource type
    pub fn with_builtin_resources(
        factory: Arc<dyn ClientFactory>,
        config: ProviderConfig,
    ) -> Result<Self> {
        Self::new(factory, Arc::new(ResourceRegistry::builtin()), config)
    }

    /// Registered resource types
    pub fn resource_types(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Run one lifecycle callback against `data`
    ///
    /// Session errors are returned as-is. Handler errors already carry
    /// call-site context.
    pub async fn apply(
        &self,
        type_name: &str,
        operation: Operation,
        data: &mut ResourceData,
    ) -> Result<Outcome> {
        let handler = self.registry.get(type_name)?;
        let client = self.factory.session()?;
        let ctx = OperationContext::new(
            client,
            self.config.timeouts.to_timeouts(),
            self.config.poll.clone(),
        );

        debug!("{} {} (id: {:?})", operation, type_name, data.id);

        let result = match operation {
            Operation::Create => handler.create(&ctx, data).await.map(|()| Outcome::Applied),
            Operation::Read => handler.read(&ctx, data).await.map(|()| Outcome::Applied),
            Operation::Update => handler.update(&ctx, data).await.map(|()| Outcome::Applied),
            Operation::Delete => handler.delete(&ctx, data).await.map(|()| Outcome::Applied),
            Operation::Exists => handler.exists(&ctx, data).await.map(Outcome::Exists),
        };

        match &result {
            Ok(outcome) => debug!(
                "{} {} finished: {:?} (id: {:?})",
                operation, type_name, outcome, data.id
            ),
            Err(e) => error!("{} {} failed: {}", operation, type_name, e),
        }

        result
    }
}
