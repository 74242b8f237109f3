//! Zone ruleset rule (`ibm_cis_ruleset_rule`)
//!
//! Rules have no endpoint of their own for reads: the whole ruleset is
//! fetched and the rule located by id. Creating a rule returns the updated
//! ruleset, and `position` may place the new rule anywhere in it, so the new
//! rule is found by its `ref` when one was submitted and otherwise as the
//! one id that was not in the ruleset before the create.
//!
//! Handle: `rule_id:ruleset_id:zone_id:crn`.

use super::{CIS_ID, DOMAIN_ID, reject_identity_change, set_domain_id, zone_id_of, zone_path};
use crate::error::{Error, Result};
use crate::handle;
use crate::resource::ResourceData;
use crate::traits::{ApiRequest, OperationContext, ResourceHandler, Service};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use tracing::{debug, info};

const RULESET_ID: &str = "ruleset_id";

/// Handler for ruleset rules
#[derive(Debug, Default)]
pub struct RulesetRuleHandler;

fn ruleset_path(crn: &str, zone_id: &str, ruleset_id: &str) -> String {
    format!("{}/rulesets/{}", zone_path(crn, zone_id), urlencoding::encode(ruleset_id))
}

fn rule_path(crn: &str, zone_id: &str, ruleset_id: &str, rule_id: &str) -> String {
    format!(
        "{}/rules/{}",
        ruleset_path(crn, zone_id, ruleset_id),
        urlencoding::encode(rule_id)
    )
}

fn rule_body(data: &ResourceData) -> Result<Value> {
    let mut body = Map::new();
    body.insert("action".to_string(), json!(data.require_str("action")?));
    body.insert("expression".to_string(), json!(data.require_str("expression")?));
    body.insert("enabled".to_string(), json!(data.get_bool("enabled").unwrap_or(true)));
    if let Some(description) = data.get_str("description") {
        body.insert("description".to_string(), json!(description));
    }
    if let Some(reference) = data.get_str("ref") {
        body.insert("ref".to_string(), json!(reference));
    }
    if let Some(parameters) = data.get("action_parameters") {
        body.insert("action_parameters".to_string(), parameters.clone());
    }
    if let Some(position) = data.get("position") {
        body.insert("position".to_string(), position.clone());
    }
    Ok(Value::Object(body))
}

fn rules_of(ruleset: &Value) -> &[Value] {
    ruleset
        .get("rules")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn rule_ids(ruleset: &Value) -> HashSet<String> {
    rules_of(ruleset)
        .iter()
        .filter_map(|rule| rule.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Id of the rule a create added to `after`
fn created_rule_id(
    before: &HashSet<String>,
    after: &Value,
    reference: Option<&str>,
) -> Result<String> {
    let id_of = |rule: &Value| rule.get("id").and_then(Value::as_str).map(str::to_string);

    if let Some(reference) = reference
        && let Some(id) = rules_of(after)
            .iter()
            .find(|rule| rule.get("ref").and_then(Value::as_str) == Some(reference))
            .and_then(id_of)
    {
        return Ok(id);
    }

    let added: Vec<String> = rules_of(after)
        .iter()
        .filter_map(id_of)
        .filter(|id| !before.contains(id))
        .collect();

    match added.as_slice() {
        [id] => Ok(id.clone()),
        [] => Err(Error::Other(
            "Invalid response format: ruleset has no new rule".into(),
        )),
        _ => Err(Error::Other(format!(
            "Cannot tell which of {} new rules was created; set `ref` to identify it",
            added.len()
        ))),
    }
}

#[async_trait]
impl ResourceHandler for RulesetRuleHandler {
    fn type_name(&self) -> &'static str {
        "ibm_cis_ruleset_rule"
    }

    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_str(CIS_ID)?.to_string();
        let zone_id = zone_id_of(data.require_str(DOMAIN_ID)?)?;
        let ruleset_id = data.require_str(RULESET_ID)?.to_string();
        let body = rule_body(data)?;

        let before = ctx
            .client
            .call(ApiRequest::get(
                Service::Cis,
                ruleset_path(&crn, &zone_id, &ruleset_id),
            ))
            .await
            .map_err(|e| e.with_context(format!("Error getting ruleset {}", ruleset_id)))?;
        let existing = rule_ids(&before);

        info!("Creating rule in ruleset {}", ruleset_id);
        let ruleset = ctx
            .client
            .call(ApiRequest::post(
                Service::Cis,
                format!("{}/rules", ruleset_path(&crn, &zone_id, &ruleset_id)),
                body,
            ))
            .await
            .map_err(|e| e.with_context(format!("Error creating rule in ruleset {}", ruleset_id)))?;

        let rule_id = created_rule_id(&existing, &ruleset, data.get_str("ref"))?;
        debug!("Rule {} created in ruleset {}", rule_id, ruleset_id);

        data.set_id(handle::encode([
            rule_id.as_str(),
            ruleset_id.as_str(),
            zone_id.as_str(),
            crn.as_str(),
        ]));
        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [rule_id, ruleset_id, zone_id, crn] =
            handle::decode_trailing::<4>(data.require_id()?)?;

        let ruleset = match ctx
            .client
            .call(ApiRequest::get(
                Service::Cis,
                ruleset_path(&crn, &zone_id, &ruleset_id),
            ))
            .await
        {
            Ok(ruleset) => ruleset,
            Err(e) if e.is_not_found() => {
                debug!("Ruleset {} not found, clearing id", ruleset_id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(e.with_context(format!("Error getting ruleset {}", ruleset_id)));
            }
        };

        let Some(rule) = rules_of(&ruleset)
            .iter()
            .find(|rule| rule.get("id").and_then(Value::as_str) == Some(rule_id.as_str()))
        else {
            debug!("Rule {} not in ruleset {}, clearing id", rule_id, ruleset_id);
            data.clear_id();
            return Ok(());
        };

        data.set_from("action", rule, "action");
        data.set_from("expression", rule, "expression");
        data.set_from("enabled", rule, "enabled");
        data.set_from("description", rule, "description");
        data.set_from("ref", rule, "ref");
        data.set_from("action_parameters", rule, "action_parameters");
        data.set_from("version", rule, "version");
        data.set_from("last_updated", rule, "last_updated");
        data.set("rule_id", rule_id);
        data.set(RULESET_ID, ruleset_id);
        set_domain_id(data, zone_id);
        data.set(CIS_ID, crn);
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        reject_identity_change(data, &[CIS_ID, DOMAIN_ID, RULESET_ID])?;
        let [rule_id, ruleset_id, zone_id, crn] =
            handle::decode_trailing::<4>(data.require_id()?)?;

        let body = rule_body(data)?;
        ctx.client
            .call(ApiRequest::patch(
                Service::Cis,
                rule_path(&crn, &zone_id, &ruleset_id, &rule_id),
                body,
            ))
            .await
            .map_err(|e| {
                e.with_context(format!("Error updating rule {} in ruleset {}", rule_id, ruleset_id))
            })?;

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [rule_id, ruleset_id, zone_id, crn] =
            handle::decode_trailing::<4>(data.require_id()?)?;

        info!("Deleting rule {} from ruleset {}", rule_id, ruleset_id);
        match ctx
            .client
            .call(ApiRequest::delete(
                Service::Cis,
                rule_path(&crn, &zone_id, &ruleset_id, &rule_id),
            ))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => debug!("Rule {} already gone", rule_id),
            Err(e) => {
                return Err(e.with_context(format!(
                    "Error deleting rule {} from ruleset {}",
                    rule_id, ruleset_id
                )));
            }
        }

        data.clear_id();
        Ok(())
    }
}
