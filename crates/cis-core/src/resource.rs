//! Local resource record
//!
//! [`ResourceData`] is the host-side view of one managed object: its handle
//! and a flat map of attributes. Handlers read desired values from it and
//! copy remote fields back into it. The prior attribute map, when present,
//! is what [`ResourceData::has_change`] compares against.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-object record exchanged with the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Handle of the managed object, unset until created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Current (desired or refreshed) attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// Attributes as last stored by the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior: Option<Map<String, Value>>,
}

impl ResourceData {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for an existing object
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set an attribute (builder form)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Snapshot the current attributes as the prior state
    pub fn with_prior_snapshot(mut self) -> Self {
        self.prior = Some(self.attributes.clone());
        self
    }

    /// The handle, or an error if the object was never created
    pub fn require_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_input("Resource has no id"))
    }

    /// Assign the handle
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Forget the handle; the host drops the object from its state
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Raw attribute value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute, if set and non-empty
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// String attribute that must be present
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key)
            .ok_or_else(|| Error::invalid_input(format!("Attribute '{}' is required", key)))
    }

    /// Integer attribute
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Boolean attribute
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Set an attribute
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Copy a field from a remote JSON object, if the remote has it
    pub fn set_from(&mut self, key: &str, remote: &Value, field: &str) {
        if let Some(v) = remote.get(field).filter(|v| !v.is_null()) {
            self.attributes.insert(key.to_string(), v.clone());
        }
    }

    /// Whether `key` differs from the prior state
    ///
    /// With no prior state (a create) every set attribute counts as changed.
    pub fn has_change(&self, key: &str) -> bool {
        match &self.prior {
            Some(prior) => prior.get(key) != self.attributes.get(key),
            None => self.get(key).is_some(),
        }
    }
}
