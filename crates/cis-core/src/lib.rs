// # cis-core
//
// Core library for managing IBM Cloud Internet Services (CIS) resources.
//
// ## Architecture Overview
//
// - **Handle codec**: packs 2 to 4 identifiers into one opaque resource id
// - **StateWait**: polls an eventually-consistent remote object until its
//   status settles
// - **CisClient**: trait for the remote REST API
// - **ResourceHandler**: trait for per-resource lifecycle callbacks
// - **ResourceRegistry**: maps resource type names to handlers
// - **CisProvider**: dispatches host lifecycle calls to handlers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: resource logic never touches HTTP directly
// 2. **Closed value sets**: settings are enums parsed once at the boundary
// 3. **Fatal decode errors**: a malformed handle stops the call before any
//    remote request is made
// 4. **Library-First**: the CLI is a thin wrapper over this crate

pub mod config;
pub mod error;
pub mod handle;
pub mod poller;
pub mod provider;
pub mod registry;
pub mod resource;
pub mod resources;
pub mod settings;
pub mod traits;

// Re-export core types for convenience
pub use config::{PollConfig, ProviderConfig, TimeoutConfig, Timeouts};
pub use error::{Error, Result};
pub use poller::{StateWait, WaitOutcome};
pub use provider::{CisProvider, Operation, Outcome};
pub use registry::ResourceRegistry;
pub use resource::ResourceData;
pub use traits::{ApiRequest, CisClient, ClientFactory, OperationContext, ResourceHandler};
