//! Alert webhook destination (`ibm_cis_alert_webhook`)
//!
//! Handle: `webhook_id:crn`.

use super::{CIS_ID, instance_path, response_str};
use crate::error::Result;
use crate::handle;
use crate::resource::ResourceData;
use crate::traits::{ApiRequest, OperationContext, ResourceHandler, Service};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

/// Handler for alert webhooks
#[derive(Debug, Default)]
pub struct AlertWebhookHandler;

fn webhooks_path(crn: &str) -> String {
    format!("{}/alerting/destinations/webhooks", instance_path(crn))
}

fn webhook_path(crn: &str, webhook_id: &str) -> String {
    format!("{}/{}", webhooks_path(crn), urlencoding::encode(webhook_id))
}

fn webhook_body(data: &ResourceData) -> Result<Value> {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(data.require_str("name")?));
    body.insert("url".to_string(), json!(data.require_str("url")?));
    if let Some(secret) = data.get_str("secret") {
        body.insert("secret".to_string(), json!(secret));
    }
    Ok(Value::Object(body))
}

#[async_trait]
impl ResourceHandler for AlertWebhookHandler {
    fn type_name(&self) -> &'static str {
        "ibm_cis_alert_webhook"
    }

    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_str(CIS_ID)?.to_string();
        let body = webhook_body(data)?;

        info!("Creating alert webhook {}", data.require_str("name")?);
        let created = ctx
            .client
            .call(ApiRequest::post(Service::Cis, webhooks_path(&crn), body))
            .await
            .map_err(|e| e.with_context("Error creating alert webhook"))?;

        let webhook_id = response_str(&created, "id")?;
        data.set_id(handle::encode([webhook_id.as_str(), crn.as_str()]));
        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [webhook_id, crn] = handle::decode_trailing::<2>(data.require_id()?)?;

        let webhook = match ctx
            .client
            .call(ApiRequest::get(Service::Cis, webhook_path(&crn, &webhook_id)))
            .await
        {
            Ok(webhook) => webhook,
            Err(e) if e.is_not_found() => {
                debug!("Alert webhook {} not found, clearing id", webhook_id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(e.with_context(format!("Error getting alert webhook {}", webhook_id)));
            }
        };

        data.set(CIS_ID, crn);
        data.set("webhook_id", webhook_id);
        data.set_from("name", &webhook, "name");
        data.set_from("url", &webhook, "url");
        data.set_from("type", &webhook, "type");
        // The secret is write-only and never echoed back.
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [webhook_id, crn] = handle::decode_trailing::<2>(data.require_id()?)?;

        if data.has_change("name") || data.has_change("url") || data.has_change("secret") {
            let body = webhook_body(data)?;
            ctx.client
                .call(ApiRequest::put(Service::Cis, webhook_path(&crn, &webhook_id), body))
                .await
                .map_err(|e| {
                    e.with_context(format!("Error updating alert webhook {}", webhook_id))
                })?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [webhook_id, crn] = handle::decode_trailing::<2>(data.require_id()?)?;

        info!("Deleting alert webhook {}", webhook_id);
        match ctx
            .client
            .call(ApiRequest::delete(Service::Cis, webhook_path(&crn, &webhook_id)))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => debug!("Alert webhook {} already gone", webhook_id),
            Err(e) => {
                return Err(e.with_context(format!("Error deleting alert webhook {}", webhook_id)));
            }
        }

        data.clear_id();
        Ok(())
    }
}
