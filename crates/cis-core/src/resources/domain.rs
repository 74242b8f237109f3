//! CIS domain (`ibm_cis_domain`)
//!
//! A domain is a DNS zone inside a CIS instance. The zone name and the
//! owning instance are part of the handle, so neither can change in place.
//!
//! Handle: `zone_id:crn`.

use super::{CIS_ID, instance_path, reject_identity_change, response_str, zone_path};
use crate::error::Result;
use crate::handle;
use crate::resource::ResourceData;
use crate::traits::{ApiRequest, OperationContext, ResourceHandler, Service};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

const DOMAIN: &str = "domain";

/// Handler for CIS domains
#[derive(Debug, Default)]
pub struct DomainHandler;

fn copy_fields(data: &mut ResourceData, zone: &Value) {
    data.set_from(DOMAIN, zone, "name");
    data.set_from("status", zone, "status");
    data.set_from("paused", zone, "paused");
    data.set_from("name_servers", zone, "name_servers");
    data.set_from("original_name_servers", zone, "original_name_servers");
    data.set_from("domain_id", zone, "id");
}

#[async_trait]
impl ResourceHandler for DomainHandler {
    fn type_name(&self) -> &'static str {
        "ibm_cis_domain"
    }

    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_str(CIS_ID)?.to_string();
        let domain = data.require_str(DOMAIN)?.to_string();

        info!("Creating CIS domain {}", domain);
        let zone = ctx
            .client
            .call(ApiRequest::post(
                Service::Cis,
                format!("{}/zones", instance_path(&crn)),
                json!({ "name": domain }),
            ))
            .await
            .map_err(|e| e.with_context(format!("Error creating zone {}", domain)))?;

        let zone_id = response_str(&zone, "id")?;
        data.set_id(handle::encode([zone_id.as_str(), crn.as_str()]));
        copy_fields(data, &zone);
        Ok(())
    }

    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [zone_id, crn] = handle::decode_trailing::<2>(data.require_id()?)?;

        let zone = match ctx
            .client
            .call(ApiRequest::get(Service::Cis, zone_path(&crn, &zone_id)))
            .await
        {
            Ok(zone) => zone,
            Err(e) if e.is_not_found() => {
                debug!("CIS domain {} not found, clearing id", zone_id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context(format!("Error getting zone {}", zone_id))),
        };

        data.set(CIS_ID, crn);
        copy_fields(data, &zone);
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        reject_identity_change(data, &[CIS_ID, DOMAIN])?;
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [zone_id, crn] = handle::decode_trailing::<2>(data.require_id()?)?;

        info!("Deleting CIS domain {}", zone_id);
        match ctx
            .client
            .call(ApiRequest::delete(Service::Cis, zone_path(&crn, &zone_id)))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => debug!("CIS domain {} already gone", zone_id),
            Err(e) => return Err(e.with_context(format!("Error deleting zone {}", zone_id))),
        }

        data.clear_id();
        Ok(())
    }
}
