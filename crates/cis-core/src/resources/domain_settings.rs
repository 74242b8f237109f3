//! Zone settings (`ibm_cis_domain_settings`)
//!
//! The settings object has no remote lifecycle of its own: create and update
//! both patch individual settings on an existing zone, and delete only drops
//! the local record. Each setting lives at its own path and carries a closed
//! value set from [`crate::settings`].
//!
//! A 405 means the zone's plan does not offer a setting. It is skipped with
//! a warning on both read and update.
//!
//! Handle: `zone_id:crn`.

use super::{CIS_ID, DOMAIN_ID, reject_identity_change, set_domain_id, zone_id_of, zone_path};
use crate::error::Result;
use crate::handle;
use crate::resource::ResourceData;
use crate::settings::SettingKind;
use crate::traits::{ApiRequest, OperationContext, ResourceHandler, Service};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Status code for settings the zone's plan does not expose
const METHOD_NOT_ALLOWED: u16 = 405;

/// One zone setting and where it lives
#[derive(Debug, Clone, Copy)]
pub struct SettingSpec {
    /// Attribute name in the local record
    pub key: &'static str,
    /// Path below the zone
    pub path: &'static str,
    /// Value set
    pub kind: SettingKind,
    /// Field carrying the value in requests and responses
    pub field: &'static str,
}

const fn entry(key: &'static str, path: &'static str, kind: SettingKind) -> SettingSpec {
    SettingSpec {
        key,
        path,
        kind,
        field: "value",
    }
}

/// Every setting managed by this resource
pub const SETTINGS: &[SettingSpec] = &[
    SettingSpec {
        key: "dnssec",
        path: "/dnssec",
        kind: SettingKind::ActiveDisabled,
        field: "status",
    },
    entry("waf", "/settings/waf", SettingKind::OnOff),
    entry("ssl", "/settings/ssl", SettingKind::Ssl),
    entry("min_tls_version", "/settings/min_tls_version", SettingKind::MinTlsVersion),
    entry("cname_flattening", "/settings/cname_flattening", SettingKind::CnameFlattening),
    entry("opportunistic_encryption", "/settings/opportunistic_encryption", SettingKind::OnOff),
    entry("automatic_https_rewrites", "/settings/automatic_https_rewrites", SettingKind::OnOff),
    entry("always_use_https", "/settings/always_use_https", SettingKind::OnOff),
    entry("ipv6", "/settings/ipv6", SettingKind::OnOff),
    entry("browser_check", "/settings/browser_check", SettingKind::OnOff),
    entry("hotlink_protection", "/settings/hotlink_protection", SettingKind::OnOff),
    entry("http2", "/settings/http2", SettingKind::OnOff),
    entry("image_load_optimization", "/settings/image_load_optimization", SettingKind::OnOff),
    entry(
        "image_size_optimization",
        "/settings/image_size_optimization",
        SettingKind::ImageSizeOptimization,
    ),
    entry("ip_geolocation", "/settings/ip_geolocation", SettingKind::OnOff),
    entry(
        "origin_error_page_pass_thru",
        "/settings/origin_error_page_pass_thru",
        SettingKind::OnOff,
    ),
    entry("brotli", "/settings/brotli", SettingKind::OnOff),
    entry("pseudo_ipv4", "/settings/pseudo_ipv4", SettingKind::PseudoIpv4),
    entry("prefetch_preload", "/settings/prefetch_preload", SettingKind::OnOff),
    entry("response_buffering", "/settings/response_buffering", SettingKind::OnOff),
    entry("script_load_optimization", "/settings/script_load_optimization", SettingKind::OnOff),
    entry("server_side_exclude", "/settings/server_side_exclude", SettingKind::OnOff),
    entry("tls_client_auth", "/settings/tls_client_auth", SettingKind::OnOff),
    entry("true_client_ip_header", "/settings/true_client_ip_header", SettingKind::OnOff),
    entry("websockets", "/settings/websockets", SettingKind::OnOff),
    entry("challenge_ttl", "/settings/challenge_ttl", SettingKind::ChallengeTtl),
    entry("max_upload", "/settings/max_upload", SettingKind::MaxUpload),
    entry("cipher", "/settings/ciphers", SettingKind::Ciphers),
    entry("minify", "/settings/minify", SettingKind::Minify),
    entry("security_header", "/settings/security_header", SettingKind::SecurityHeader),
    entry("mobile_redirect", "/settings/mobile_redirect", SettingKind::MobileRedirect),
];

/// Handler for zone settings
#[derive(Debug, Default)]
pub struct DomainSettingsHandler;

impl DomainSettingsHandler {
    /// Patch every setting whose desired value differs from the prior state
    ///
    /// Values are parsed before any request is sent, so one invalid value
    /// fails the whole call without touching the zone.
    async fn apply(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let crn = data.require_str(CIS_ID)?.to_string();
        let zone_id = zone_id_of(data.require_str(DOMAIN_ID)?)?;

        let mut pending = Vec::new();
        for setting in SETTINGS {
            if !data.has_change(setting.key) {
                continue;
            }
            if let Some(value) = data.get(setting.key) {
                pending.push((setting, setting.kind.parse(setting.key, value)?));
            }
        }

        data.set_id(handle::encode([zone_id.as_str(), crn.as_str()]));

        let base = zone_path(&crn, &zone_id);
        for (setting, value) in pending {
            let wire = value.to_wire();
            debug!("Setting {} = {} on zone {}", setting.key, wire, zone_id);
            let mut body = Map::new();
            body.insert(setting.field.to_string(), wire);
            match ctx
                .client
                .call(ApiRequest::patch(
                    Service::Cis,
                    format!("{}{}", base, setting.path),
                    Value::Object(body),
                ))
                .await
            {
                Ok(_) => {}
                Err(e) if e.status() == Some(METHOD_NOT_ALLOWED) => {
                    warn!("Setting {} cannot be changed on zone {}: {}", setting.key, zone_id, e);
                }
                Err(e) => {
                    return Err(e.with_context(format!(
                        "Error updating {} for zone {}",
                        setting.key, zone_id
                    )));
                }
            }
        }

        self.read(ctx, data).await
    }
}

#[async_trait]
impl ResourceHandler for DomainSettingsHandler {
    fn type_name(&self) -> &'static str {
        "ibm_cis_domain_settings"
    }

    async fn create(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        info!("Applying zone settings");
        self.apply(ctx, data).await
    }

    async fn read(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        let [zone_id, crn] = handle::decode_trailing::<2>(data.require_id()?)?;
        let base = zone_path(&crn, &zone_id);

        for setting in SETTINGS {
            let response = match ctx
                .client
                .call(ApiRequest::get(Service::Cis, format!("{}{}", base, setting.path)))
                .await
            {
                Ok(response) => response,
                Err(e) if e.status() == Some(METHOD_NOT_ALLOWED) => {
                    warn!("Setting {} is not available for zone {}", setting.key, zone_id);
                    continue;
                }
                Err(e) if e.is_not_found() => {
                    debug!("Zone {} not found, clearing id", zone_id);
                    data.clear_id();
                    return Ok(());
                }
                Err(e) => {
                    return Err(
                        e.with_context(format!("Error reading {} for zone {}", setting.key, zone_id))
                    );
                }
            };

            let Some(value) = response.get(setting.field).filter(|v| !v.is_null()) else {
                continue;
            };
            match setting.kind.from_wire(setting.key, value) {
                Ok(parsed) => data.set(setting.key, parsed.to_local()),
                Err(e) => {
                    warn!("Zone {} reports unexpected {}: {}", zone_id, setting.key, e);
                    // A block in an unknown shape cannot be flattened.
                    if !setting.kind.is_structured() {
                        data.set(setting.key, value.clone());
                    }
                }
            }
        }

        set_domain_id(data, zone_id);
        data.set(CIS_ID, crn);
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        reject_identity_change(data, &[CIS_ID, DOMAIN_ID])?;
        self.apply(ctx, data).await
    }

    async fn delete(&self, _ctx: &OperationContext, data: &mut ResourceData) -> Result<()> {
        // Settings cannot be removed from a zone; forgetting them is enough.
        data.require_id()?;
        data.clear_id();
        Ok(())
    }
}
