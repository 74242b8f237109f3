//! Firewall rule (`ibm_cis_firewall_rule`)
//!
//! Rules reference an existing filter expression. The API sets the priority
//! in a second call after the rule exists; if that second call fails the
//! rule is kept and the handle is already assigned, so a later update can
//! retry the priority.
//!
//! Handle: `rule_id:zone_id:crn`.

use super::{CIS_ID, DOMAIN_ID, reject_identity_change, set_domain_id, zone_id_of, zone_path};
use crate::error::{Error, Result};
use crate::handle;
use crate::resource::ResourceData;
use crate::settings::wire_enum;
use crate::traits::{ApiRequest, OperationContext, ResourceHandler, Service};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

wire_enum! {
    /// What the edge does with a request matching the filter
    FirewallAction, "action" {
        Log => "log",
        Allow => "allow",
        Challenge => "challenge",
        JsChallenge => "js_challenge",
        Block => "block",
        Bypass => "bypass",
    }
}

/// Handler for firewall rules
#[derive(Debug, Default)]
pub struct FirewallRuleHandler;

fn rules_path(crn: &str, zone_id: &str) -> String {
    format!("{}/firewall/rules", zone_path(crn, zone_id))
}

fn rule_path(crn: &str, zone_id: &str, rule_id: &str) -> String {
    format!("{}/{}", rules_path(crn, zone_id), urlencoding::encode(rule_id))
}

/// Rule body without the priority
fn rule_body(data: &ResourceData) -> Result<Map<String, Value>> {
    let action: FirewallAction = data.require_str("action")?.parse()?;
    let mut body = Map::new();
    body.insert("filter".to_string(), json!({ "id": data.require_str("filter_id")? }));
    body.insert("action".to_string(), json!(action));
    body.insert("paused".to_string(), json!(data.get_bool("paused").unwrap_or(false)));
    if let Some(description) = data.get_str("description") {
        body.insert("description".to_string(), json!(description));
    }
    Ok(body)
}

async fn set_priority(
    ctx: &OperationContext,
    crn: &str,
    zone_id: &str,
    rule_id: &str,
    priority: i64,
) -> Result<()> {
    ctx.client
        .call(ApiRequest::put(
            Service::Cis,
            rule_path(crn, zone_id, rule_id),
            json!({ "id": rule_id, "priority": priority }),
        ))
        .await
        .map_err(|e| e.with_context(format!("Error setting priority of firewall rule {}", rule_id)))?;
    Ok(())
}

#[async_trait]
impl ResourceHandler for FirewallRuleHandler {
    fn type_name(&self) -> &'static str {
        "ibm_cis_firewall_rule"
    }

    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_str(CIS_ID)?.to_string();
        let zone_id = zone_id_of(data.require_str(DOMAIN_ID)?)?;
        let body = rule_body(data)?;

        info!("Creating firewall rule on zone {}", zone_id);
        let created = ctx
            .client
            .call(ApiRequest::post(
                Service::Cis,
                rules_path(&crn, &zone_id),
                Value::Array(vec![Value::Object(body)]),
            ))
            .await
            .map_err(|e| e.with_context("Error creating firewall rule"))?;

        let rule_id = created
            .as_array()
            .and_then(|rules| rules.first())
            .and_then(|rule| rule.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Other("Invalid response format: no firewall rule id".into()))?
            .to_string();
        data.set_id(handle::encode([rule_id.as_str(), zone_id.as_str(), crn.as_str()]));

        if let Some(priority) = data.get_i64("priority") {
            set_priority(ctx, &crn, &zone_id, &rule_id, priority).await?;
        }

        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [rule_id, zone_id, crn] = handle::decode_trailing::<3>(data.require_id()?)?;

        let rule = match ctx
            .client
            .call(ApiRequest::get(Service::Cis, rule_path(&crn, &zone_id, &rule_id)))
            .await
        {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                debug!("Firewall rule {} not found, clearing id", rule_id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(e.with_context(format!("Error getting firewall rule {}", rule_id)));
            }
        };

        data.set(CIS_ID, crn);
        set_domain_id(data, zone_id);
        data.set("rule_id", rule_id);
        data.set_from("action", &rule, "action");
        data.set_from("paused", &rule, "paused");
        data.set_from("priority", &rule, "priority");
        data.set_from("description", &rule, "description");
        if let Some(filter) = rule.get("filter") {
            data.set_from("filter_id", filter, "id");
        }
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        reject_identity_change(data, &[CIS_ID, DOMAIN_ID])?;
        let [rule_id, zone_id, crn] = handle::decode_trailing::<3>(data.require_id()?)?;

        let mut body = rule_body(data)?;
        body.insert("id".to_string(), json!(rule_id));
        if let Some(priority) = data.get_i64("priority") {
            body.insert("priority".to_string(), json!(priority));
        }

        ctx.client
            .call(ApiRequest::put(
                Service::Cis,
                rule_path(&crn, &zone_id, &rule_id),
                Value::Object(body),
            ))
            .await
            .map_err(|e| e.with_context(format!("Error updating firewall rule {}", rule_id)))?;

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [rule_id, zone_id, crn] = handle::decode_trailing::<3>(data.require_id()?)?;

        info!("Deleting firewall rule {}", rule_id);
        match ctx
            .client
            .call(ApiRequest::delete(Service::Cis, rule_path(&crn, &zone_id, &rule_id)))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => debug!("Firewall rule {} already gone", rule_id),
            Err(e) => {
                return Err(e.with_context(format!("Error deleting firewall rule {}", rule_id)));
            }
        }

        data.clear_id();
        Ok(())
    }
}
