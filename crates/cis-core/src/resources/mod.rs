//! Built-in CIS resource handlers
//!
//! | type | handle |
//! |---|---|
//! | `ibm_cis` | instance CRN |
//! | `ibm_cis_domain` | `zone_id:crn` |
//! | `ibm_cis_domain_settings` | `zone_id:crn` |
//! | `ibm_cis_alert_webhook` | `webhook_id:crn` |
//! | `ibm_cis_firewall_rule` | `rule_id:zone_id:crn` |
//! | `ibm_cis_ruleset_rule` | `rule_id:ruleset_id:zone_id:crn` |
//!
//! The instance CRN is always the last handle component and contains `:`
//! itself, so handlers decode with [`crate::handle::decode_trailing`].

pub mod alert_webhook;
pub mod domain;
pub mod domain_settings;
pub mod firewall_rule;
pub mod instance;
pub mod ruleset_rule;

pub use alert_webhook::AlertWebhookHandler;
pub use domain::DomainHandler;
pub use domain_settings::DomainSettingsHandler;
pub use firewall_rule::FirewallRuleHandler;
pub use instance::InstanceHandler;
pub use ruleset_rule::RulesetRuleHandler;

use crate::error::{Error, Result};
use crate::handle;
use crate::registry::ResourceRegistry;
use crate::resource::ResourceData;
use serde_json::Value;
use std::sync::Arc;

/// Attribute holding the instance CRN
pub(crate) const CIS_ID: &str = "cis_id";

/// Attribute holding the zone, either a bare zone id or a domain handle
pub(crate) const DOMAIN_ID: &str = "domain_id";

/// Register every built-in handler
pub fn register(registry: &ResourceRegistry) {
    registry.register(Arc::new(InstanceHandler));
    registry.register(Arc::new(DomainHandler));
    registry.register(Arc::new(DomainSettingsHandler));
    registry.register(Arc::new(AlertWebhookHandler));
    registry.register(Arc::new(FirewallRuleHandler));
    registry.register(Arc::new(RulesetRuleHandler));
}

/// `/v1/{crn}` prefix of every CIS API path
pub(crate) fn instance_path(crn: &str) -> String {
    format!("/v1/{}", urlencoding::encode(crn))
}

/// `/v1/{crn}/zones/{zone_id}`
pub(crate) fn zone_path(crn: &str, zone_id: &str) -> String {
    format!("{}/zones/{}", instance_path(crn), urlencoding::encode(zone_id))
}

/// Zone id from a `domain_id` attribute
///
/// Accepts the bare zone id or a `zone_id:crn` domain handle; a handle of
/// the wrong shape is an error, never an empty zone id.
pub(crate) fn zone_id_of(domain_id: &str) -> Result<String> {
    if domain_id.contains(handle::DELIMITER) {
        let [zone_id, _crn] = handle::decode_trailing::<2>(domain_id)?;
        Ok(zone_id)
    } else {
        Ok(domain_id.to_string())
    }
}

/// Record the zone in `domain_id`, keeping a domain handle that names it
pub(crate) fn set_domain_id(data: &mut ResourceData, zone_id: String) {
    let current = data.get_str(DOMAIN_ID).and_then(|d| zone_id_of(d).ok());
    if current.as_deref() != Some(zone_id.as_str()) {
        data.set(DOMAIN_ID, zone_id);
    }
}

/// Required string field of an API response
pub(crate) fn response_str(value: &Value, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Other(format!(
                "Invalid response format: {} is not a string",
                field
            ))
        })
}

/// Refuse updates that would change a handle component
pub(crate) fn reject_identity_change(data: &ResourceData, keys: &[&str]) -> Result<()> {
    for key in keys {
        if data.prior.is_some() && data.has_change(key) {
            return Err(Error::RequiresReplace(key.to_string()));
        }
    }
    Ok(())
}
