// # Core Traits
//
// This module defines the seams between the toolkit and its collaborators.
//
// - `CisClient`: the remote REST API
// - `ClientFactory`: session acquisition
// - `ResourceHandler`: per-resource-type lifecycle callbacks invoked by the host

pub mod client;
pub mod resource_handler;

pub use client::{ApiRequest, CisClient, ClientFactory, Method, Service};
pub use resource_handler::{OperationContext, ResourceHandler};
