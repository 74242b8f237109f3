// # Resource Handler Trait
//
// Defines the lifecycle callbacks the host invokes for one resource type.
//
// Every implementation follows the same control flow:
//
// ```text
// decode handle (not on create)
//   → call remote operation
//   → (optionally) wait for remote status to settle
//   → encode/refresh handle
//   → copy remote fields into the local record
// ```

use crate::config::{PollConfig, Timeouts};
use crate::error::Result;
use crate::resource::ResourceData;
use crate::traits::CisClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a handler needs for one lifecycle call
#[derive(Clone)]
pub struct OperationContext {
    /// Session for this call
    pub client: Arc<dyn CisClient>,
    /// Budgets for long-running operations
    pub timeouts: Timeouts,
    /// Poll timing for waits
    pub poll: PollConfig,
}

impl OperationContext {
    pub fn new(client: Arc<dyn CisClient>, timeouts: Timeouts, poll: PollConfig) -> Self {
        Self {
            client,
            timeouts,
            poll,
        }
    }
}

/// Trait for resource type implementations
///
/// Handlers are stateless: all per-object state lives in the
/// [`ResourceData`] passed to each call, and all remote state behind the
/// client in the [`OperationContext`].
///
/// # Handles
///
/// `create` assigns the handle; every other callback decodes it first and
/// fails with `Error::MalformedHandle` if it has the wrong shape.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Resource type name (e.g., "ibm_cis_domain")
    fn type_name(&self) -> &'static str;

    /// Create the remote object and assign the handle
    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()>;

    /// Refresh the local record from the remote object
    ///
    /// Clears the handle if the remote object no longer exists.
    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()>;

    /// Push changed attributes to the remote object
    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()>;

    /// Delete the remote object and clear the handle
    async fn delete(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()>;

    /// Whether the remote object still exists
    ///
    /// The default reads into a scratch copy and checks whether the handle
    /// survived.
    async fn exists(&self, ctx: &OperationContext, data: &ResourceData) -> Result<bool> {
        let mut scratch = data.clone();
        match self.read(ctx, &mut scratch).await {
            Ok(()) => Ok(scratch.id.is_some()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
