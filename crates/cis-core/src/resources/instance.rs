//! CIS service instance (`ibm_cis`)
//!
//! Instances are provisioned through the resource controller, which accepts
//! the request immediately and provisions asynchronously. Create, update and
//! delete therefore wait on the instance `state` field.
//!
//! Handle: the instance CRN.

use crate::error::Result;
use crate::poller::StateWait;
use crate::resource::ResourceData;
use crate::traits::{ApiRequest, OperationContext, ResourceHandler, Service};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

const INSTANCE_PROVISIONING: &str = "provisioning";
const INSTANCE_IN_PROGRESS: &str = "in progress";
const INSTANCE_INACTIVE: &str = "inactive";
const INSTANCE_ACTIVE: &str = "active";
const INSTANCE_FAILED: &str = "failed";
const INSTANCE_REMOVED: &str = "removed";
const INSTANCE_RECLAMATION: &str = "pending_reclamation";

/// Handler for CIS service instances
#[derive(Debug, Default)]
pub struct InstanceHandler;

fn resource_instance_path(crn: &str) -> String {
    format!("/v2/resource_instances/{}", urlencoding::encode(crn))
}

async fn fetch_instance(ctx: &OperationContext, crn: &str) -> Result<(Value, String)> {
    let instance = ctx
        .client
        .call(ApiRequest::get(Service::ResourceController, resource_instance_path(crn)))
        .await?;
    let state = instance
        .get("state")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok((instance, state))
}

fn is_gone(state: &str) -> bool {
    state == INSTANCE_REMOVED || state == INSTANCE_RECLAMATION
}

fn copy_fields(data: &mut ResourceData, instance: &Value) {
    data.set_from("name", instance, "name");
    data.set_from("location", instance, "region_id");
    data.set_from("resource_group_id", instance, "resource_group_id");
    data.set_from("plan", instance, "resource_plan_id");
    data.set_from("guid", instance, "guid");
    data.set_from("status", instance, "state");
}

#[async_trait]
impl ResourceHandler for InstanceHandler {
    fn type_name(&self) -> &'static str {
        "ibm_cis"
    }

    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let name = data.require_str("name")?;
        let mut body = Map::new();
        body.insert("name".to_string(), json!(name));
        body.insert("target".to_string(), json!(data.get_str("location").unwrap_or("global")));
        body.insert("resource_plan_id".to_string(), json!(data.require_str("plan")?));
        if let Some(group) = data.get_str("resource_group_id") {
            body.insert("resource_group".to_string(), json!(group));
        }
        if let Some(parameters) = data.get("parameters") {
            body.insert("parameters".to_string(), parameters.clone());
        }

        info!("Creating CIS instance {}", name);
        let created = ctx
            .client
            .call(ApiRequest::post(
                Service::ResourceController,
                "/v2/resource_instances",
                Value::Object(body),
            ))
            .await
            .map_err(|e| e.with_context(format!("Error creating resource instance {}", name)))?;

        let crn = super::response_str(&created, "id")?;
        data.set_id(crn.clone());

        let instance = StateWait::new(
            &[INSTANCE_PROVISIONING, INSTANCE_IN_PROGRESS, INSTANCE_INACTIVE],
            &[INSTANCE_ACTIVE],
        )
        .with_failure(INSTANCE_FAILED)
        .with_poll_config(&ctx.poll)
        .with_timeout(ctx.timeouts.create)
        .wait_until(|| fetch_instance(ctx, &crn))
        .await
        .map_err(|e| e.with_context(format!("Error waiting for create resource instance ({})", crn)))?
        .into_object();

        if let Some(instance) = instance {
            copy_fields(data, &instance);
        }
        info!("CIS instance {} is active", crn);
        Ok(())
    }

    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_id()?.to_string();

        let (instance, state) = match fetch_instance(ctx, &crn).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => {
                debug!("CIS instance {} not found, clearing id", crn);
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(e.with_context(format!("Error retrieving resource instance {}", crn)));
            }
        };

        if is_gone(&state) {
            debug!("CIS instance {} is {}, clearing id", crn, state);
            data.clear_id();
            return Ok(());
        }

        copy_fields(data, &instance);
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_id()?.to_string();

        let mut body = Map::new();
        if data.has_change("name") {
            body.insert("name".to_string(), json!(data.require_str("name")?));
        }
        if data.has_change("plan") {
            body.insert("resource_plan_id".to_string(), json!(data.require_str("plan")?));
        }
        if data.has_change("parameters")
            && let Some(parameters) = data.get("parameters")
        {
            body.insert("parameters".to_string(), parameters.clone());
        }

        if !body.is_empty() {
            ctx.client
                .call(ApiRequest::patch(
                    Service::ResourceController,
                    resource_instance_path(&crn),
                    Value::Object(body),
                ))
                .await
                .map_err(|e| e.with_context(format!("Error updating resource instance {}", crn)))?;

            StateWait::new(&[INSTANCE_IN_PROGRESS, INSTANCE_INACTIVE], &[INSTANCE_ACTIVE])
                .with_failure(INSTANCE_FAILED)
                .with_poll_config(&ctx.poll)
                .with_timeout(ctx.timeouts.update)
                .wait_until(|| fetch_instance(ctx, &crn))
                .await
                .map_err(|e| {
                    e.with_context(format!("Error waiting for update resource instance ({})", crn))
                })?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_id()?.to_string();

        info!("Deleting CIS instance {}", crn);
        ctx.client
            .call(ApiRequest::delete(
                Service::ResourceController,
                format!("{}?recursive=true", resource_instance_path(&crn)),
            ))
            .await
            .map_err(|e| e.with_context(format!("Error deleting resource instance {}", crn)))?;

        StateWait::new(
            &[INSTANCE_ACTIVE, INSTANCE_IN_PROGRESS, INSTANCE_INACTIVE],
            &[INSTANCE_REMOVED, INSTANCE_RECLAMATION],
        )
        .with_failure(INSTANCE_FAILED)
        .with_poll_config(&ctx.poll)
        .with_timeout(ctx.timeouts.delete)
        .treat_not_found_as_target()
        .wait_until(|| fetch_instance(ctx, &crn))
        .await
        .map_err(|e| e.with_context(format!("Error waiting for delete resource instance ({})", crn)))?;

        data.clear_id();
        Ok(())
    }
}
