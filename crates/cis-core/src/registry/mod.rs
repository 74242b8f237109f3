//! Resource type registry
//!
//! Maps resource type names (as the host sends them) to handlers, so the
//! provider dispatches without a hard-coded match over types.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cis_core::registry::ResourceRegistry;
//!
//! // All built-in CIS resources
//! let registry = ResourceRegistry::builtin();
//!
//! // Or register handlers one by one
//! let registry = ResourceRegistry::new();
//! registry.register(Arc::new(MyHandler));
//!
//! let handler = registry.get("ibm_cis_domain")?;
//! ```

use crate::error::{Error, Result};
use crate::traits::ResourceHandler;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of resource handlers keyed by type name
///
/// ## Thread Safety
///
/// Uses interior mutability with RwLock, allowing concurrent lookups and
/// exclusive registration.
#[derive(Default)]
pub struct ResourceRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ResourceHandler>>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in CIS resource handler
    pub fn builtin() -> Self {
        let registry = Self::new();
        crate::resources::register(&registry);
        registry
    }

    /// Register a handler under its own type name
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register(&self, handler: Arc<dyn ResourceHandler>) {
        let name = handler.type_name().to_string();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.insert(name, handler);
    }

    /// Look up the handler for a resource type
    ///
    /// # Returns
    ///
    /// - `Ok(handler)`: Registered handler
    /// - `Err(Error::Config)`: If the type is not registered
    pub fn get(&self, type_name: &str) -> Result<Arc<dyn ResourceHandler>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown resource type: {}", type_name)))
    }

    /// List all registered resource types, sorted
    pub fn list(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a resource type is registered
    pub fn has(&self, type_name: &str) -> bool {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.contains_key(type_name)
    }
}
