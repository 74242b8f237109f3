//! Contract Test: Resource Lifecycle
//!
//! Drives the provider end to end against an in-memory API.
//!
//! Constraints verified:
//! - Create assigns the composite handle; read/update/delete decode it first
//! - Malformed handles fail before any remote call
//! - Long-running instance operations wait for the remote status to settle
//! - Read and exists treat a missing remote object as gone, not as an error
//! - Changing a handle component requires a replace
//! - Session errors reach the host unchanged
//! - A failed second step of a multi-step create leaves the first in place
//! - Updates send only what changed where the remote API allows it
//! - Settings the zone's plan rejects with 405 are skipped, not fatal

mod common;

use cis_core::resources::domain_settings::SETTINGS;
use cis_core::traits::Method;
use cis_core::{CisProvider, Error, Operation, Outcome, ResourceData};
use common::*;
use serde_json::json;
use std::sync::Arc;

fn provider(client: &Arc<FakeCisClient>) -> (CisProvider, Arc<FakeFactory>) {
    let factory = FakeFactory::new(client.clone());
    let provider = CisProvider::with_builtin_resources(factory.clone(), fast_config()).unwrap();
    (provider, factory)
}

fn instance_path() -> String {
    format!("/v2/resource_instances/{}", ENCODED_CRN)
}

fn instance(state: &str) -> serde_json::Value {
    json!({
        "id": CRN,
        "name": "web",
        "state": state,
        "region_id": "global",
        "resource_plan_id": "standard",
        "guid": "inst",
    })
}

// ===== Instance =====

#[tokio::test(start_paused = true)]
async fn instance_create_waits_until_active() {
    let client = FakeCisClient::new();
    client
        .ok(Method::Post, "/v2/resource_instances", json!({ "id": CRN }))
        .ok(Method::Get, instance_path(), instance("provisioning"))
        .ok(Method::Get, instance_path(), instance("provisioning"))
        .ok(Method::Get, instance_path(), instance("active"));
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("name", "web")
        .with_attribute("plan", "standard");

    let outcome = provider
        .apply("ibm_cis", Operation::Create, &mut data)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(data.id.as_deref(), Some(CRN));
    assert_eq!(data.get_str("status"), Some("active"));
    assert_eq!(data.get_str("guid"), Some("inst"));
    assert_eq!(client.requests_with(Method::Get).len(), 3);

    let create = &client.requests_with(Method::Post)[0];
    let body = create.body.as_ref().unwrap();
    assert_eq!(body["target"], json!("global"));
    assert_eq!(body["resource_plan_id"], json!("standard"));
}

#[tokio::test(start_paused = true)]
async fn instance_create_reports_failed_state() {
    let client = FakeCisClient::new();
    client
        .ok(Method::Post, "/v2/resource_instances", json!({ "id": CRN }))
        .ok(Method::Get, instance_path(), instance("failed"));
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("name", "web")
        .with_attribute("plan", "standard");

    let err = provider
        .apply("ibm_cis", Operation::Create, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FailedState { ref status, .. } if status == "failed"));
    // The instance exists remotely, so the handle stays assigned.
    assert_eq!(data.id.as_deref(), Some(CRN));
}

#[tokio::test(start_paused = true)]
async fn instance_delete_treats_disappearance_as_done() {
    let client = FakeCisClient::new();
    client.ok(
        Method::Delete,
        format!("{}?recursive=true", instance_path()),
        json!({}),
    );
    // GET is unscripted, so the poll sees 404.
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(CRN);
    provider
        .apply("ibm_cis", Operation::Delete, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
    assert_eq!(client.requests_with(Method::Get).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn instance_read_clears_reclaimed_instance() {
    let client = FakeCisClient::new();
    client.ok(Method::Get, instance_path(), instance("pending_reclamation"));
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(CRN);
    provider
        .apply("ibm_cis", Operation::Read, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
}

#[tokio::test(start_paused = true)]
async fn instance_update_patches_changes_and_waits() {
    let client = FakeCisClient::new();
    client
        .ok(Method::Patch, instance_path(), json!({ "id": CRN }))
        .ok(Method::Get, instance_path(), instance("in progress"))
        .ok(
            Method::Get,
            instance_path(),
            json!({ "id": CRN, "name": "web-2", "state": "active", "resource_plan_id": "standard" }),
        );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(CRN)
        .with_attribute("name", "web")
        .with_attribute("plan", "standard")
        .with_prior_snapshot();
    data.set("name", "web-2");

    provider
        .apply("ibm_cis", Operation::Update, &mut data)
        .await
        .unwrap();

    let patches = client.requests_with(Method::Patch);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].body, Some(json!({ "name": "web-2" })));
    // Two wait fetches (in progress, active) and the final read.
    assert_eq!(client.requests_with(Method::Get).len(), 3);
    assert_eq!(data.get_str("name"), Some("web-2"));
    assert_eq!(data.get_str("status"), Some("active"));
}

#[tokio::test(start_paused = true)]
async fn instance_update_without_changes_only_reads() {
    let client = FakeCisClient::new();
    client.ok(Method::Get, instance_path(), instance("active"));
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(CRN)
        .with_attribute("name", "web")
        .with_attribute("plan", "standard")
        .with_prior_snapshot();

    provider
        .apply("ibm_cis", Operation::Update, &mut data)
        .await
        .unwrap();

    assert!(client.requests_with(Method::Patch).is_empty());
    assert_eq!(client.call_count(), 1);
}

// ===== Domain =====

#[tokio::test]
async fn domain_create_encodes_zone_and_crn() {
    let client = FakeCisClient::new();
    client.ok(
        Method::Post,
        format!("/v1/{}/zones", ENCODED_CRN),
        json!({
            "id": "zone-1",
            "name": "example.com",
            "status": "pending",
            "paused": false,
            "name_servers": ["ns1.example.net", "ns2.example.net"],
        }),
    );
    let (provider, factory) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain", "example.com");

    provider
        .apply("ibm_cis_domain", Operation::Create, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, Some(format!("zone-1:{}", CRN)));
    assert_eq!(data.get_str("status"), Some("pending"));
    assert_eq!(data.get("name_servers").unwrap().as_array().unwrap().len(), 2);
    assert_eq!(factory.session_count(), 1);
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn domain_read_of_missing_zone_clears_id() {
    let client = FakeCisClient::new();
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("zone-1:{}", CRN));
    provider
        .apply("ibm_cis_domain", Operation::Read, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
    assert_eq!(client.requests()[0].path, zone_path("zone-1"));
}

#[tokio::test]
async fn domain_exists_follows_remote_object() {
    let client = FakeCisClient::new();
    client.ok(Method::Get, zone_path("zone-1"), json!({ "id": "zone-1", "name": "example.com" }));
    let (provider, _) = provider(&client);

    let mut present = ResourceData::with_id(format!("zone-1:{}", CRN));
    let mut missing = ResourceData::with_id(format!("zone-2:{}", CRN));

    assert_eq!(
        provider
            .apply("ibm_cis_domain", Operation::Exists, &mut present)
            .await
            .unwrap(),
        Outcome::Exists(true)
    );
    assert_eq!(
        provider
            .apply("ibm_cis_domain", Operation::Exists, &mut missing)
            .await
            .unwrap(),
        Outcome::Exists(false)
    );
    // Exists never rewrites the caller's record.
    assert!(present.id.is_some());
    assert!(missing.id.is_some());
}

#[tokio::test]
async fn domain_rename_requires_replace() {
    let client = FakeCisClient::new();
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("zone-1:{}", CRN))
        .with_attribute("cis_id", CRN)
        .with_attribute("domain", "example.com")
        .with_prior_snapshot();
    data.set("domain", "example.org");

    let err = provider
        .apply("ibm_cis_domain", Operation::Update, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RequiresReplace(ref key) if key == "domain"));
    assert_eq!(client.call_count(), 0);
}

// ===== Handles and sessions =====

#[tokio::test]
async fn malformed_handle_fails_before_remote_call() {
    let client = FakeCisClient::new();
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id("rule-1:zone-1");
    let err = provider
        .apply("ibm_cis_ruleset_rule", Operation::Read, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::MalformedHandle {
            expected: 4,
            found: 2,
            ..
        }
    ));
    assert_eq!(client.call_count(), 0);
    assert!(data.id.is_some());
}

#[tokio::test]
async fn session_errors_are_returned_unchanged() {
    let provider =
        CisProvider::with_builtin_resources(FakeFactory::failing(), fast_config()).unwrap();

    let mut data = ResourceData::with_id(format!("zone-1:{}", CRN));
    let err = provider
        .apply("ibm_cis_domain", Operation::Read, &mut data)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Session error: no credentials");
}

#[tokio::test]
async fn unknown_type_fails_before_session() {
    let client = FakeCisClient::new();
    let (provider, factory) = provider(&client);

    let err = provider
        .apply("ibm_cis_page_rule", Operation::Read, &mut ResourceData::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(factory.session_count(), 0);
}

// ===== Domain settings =====

fn script_settings(client: &FakeCisClient) {
    for setting in SETTINGS {
        let path = format!("{}{}", zone_path("zone-1"), setting.path);
        match setting.key {
            "dnssec" => client.ok(Method::Get, path, json!({ "status": "active" })),
            "ssl" => client.ok(Method::Get, path, json!({ "value": "strict" })),
            "tls_client_auth" => client.on(Method::Get, path, Reply::Status(405)),
            "challenge_ttl" => client.ok(Method::Get, path, json!({ "value": 1800 })),
            "max_upload" => client.ok(Method::Get, path, json!({ "value": 100 })),
            "cipher" => client.ok(Method::Get, path, json!({ "value": ["AES128-SHA"] })),
            "minify" => client.ok(
                Method::Get,
                path,
                json!({ "value": { "css": "on", "html": "off", "js": "on" } }),
            ),
            "security_header" => client.ok(
                Method::Get,
                path,
                json!({ "value": { "strict_transport_security": {
                    "enabled": true,
                    "max_age": 86400,
                    "include_subdomains": true,
                    "nosniff": true,
                } } }),
            ),
            "mobile_redirect" => client.ok(Method::Get, path, json!({ "value": { "status": "off" } })),
            _ => client.ok(Method::Get, path, json!({ "value": "on" })),
        };
    }
}

#[tokio::test]
async fn settings_patch_only_changed_keys() {
    let client = FakeCisClient::new();
    script_settings(&client);
    for key in ["ssl", "brotli"] {
        client.ok(
            Method::Patch,
            format!("{}/settings/{}", zone_path("zone-1"), key),
            json!({}),
        );
    }
    let (provider, _) = provider(&client);

    let domain_handle = format!("zone-1:{}", CRN);
    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", domain_handle.clone())
        .with_attribute("ssl", "strict")
        .with_attribute("brotli", "on");

    provider
        .apply("ibm_cis_domain_settings", Operation::Create, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, Some(domain_handle.clone()));
    assert_eq!(data.get_str("domain_id"), Some(domain_handle.as_str()));
    assert_eq!(data.get_str("dnssec"), Some("active"));
    assert!(data.get("tls_client_auth").is_none());

    let patches = client.requests_with(Method::Patch);
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].body, Some(json!({ "value": "strict" })));
    assert_eq!(patches[1].body, Some(json!({ "value": "on" })));

    // Second apply with the refreshed record as prior: only the changed key.
    let mut next = data.clone().with_prior_snapshot();
    next.set("brotli", "off");
    client.ok(
        Method::Patch,
        format!("{}/settings/brotli", zone_path("zone-1")),
        json!({}),
    );

    provider
        .apply("ibm_cis_domain_settings", Operation::Update, &mut next)
        .await
        .unwrap();

    let patches = client.requests_with(Method::Patch);
    assert_eq!(patches.len(), 3);
    assert!(patches[2].path.ends_with("/settings/brotli"));
    assert_eq!(patches[2].body, Some(json!({ "value": "off" })));
}

#[tokio::test]
async fn settings_patch_skips_plan_restricted_setting() {
    let client = FakeCisClient::new();
    script_settings(&client);
    client
        .on(
            Method::Patch,
            format!("{}/settings/tls_client_auth", zone_path("zone-1")),
            Reply::Status(405),
        )
        .ok(
            Method::Patch,
            format!("{}/settings/websockets", zone_path("zone-1")),
            json!({}),
        );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("tls_client_auth", "on")
        .with_attribute("websockets", "on");

    provider
        .apply("ibm_cis_domain_settings", Operation::Create, &mut data)
        .await
        .unwrap();

    let patches = client.requests_with(Method::Patch);
    assert_eq!(patches.len(), 2);
    assert!(patches[1].path.ends_with("/settings/websockets"));
    assert_eq!(data.id, Some(format!("zone-1:{}", CRN)));
}

#[tokio::test]
async fn settings_patch_other_failures_abort() {
    let client = FakeCisClient::new();
    client.on(
        Method::Patch,
        format!("{}/settings/brotli", zone_path("zone-1")),
        Reply::Status(400),
    );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("brotli", "on");

    let err = provider
        .apply("ibm_cis_domain_settings", Operation::Create, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { status: 400, .. }));
    assert!(err.to_string().contains("brotli"));
}

#[tokio::test]
async fn structured_settings_expand_and_flatten() {
    let client = FakeCisClient::new();
    script_settings(&client);
    for key in ["minify", "security_header", "ciphers"] {
        client.ok(
            Method::Patch,
            format!("{}/settings/{}", zone_path("zone-1"), key),
            json!({}),
        );
    }
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("cipher", json!(["AES128-SHA"]))
        .with_attribute("minify", json!([{ "css": "on", "html": "off", "js": "on" }]))
        .with_attribute(
            "security_header",
            json!([{ "enabled": true, "max_age": 86400, "include_subdomains": true, "nosniff": true }]),
        );

    provider
        .apply("ibm_cis_domain_settings", Operation::Create, &mut data)
        .await
        .unwrap();

    let patches = client.requests_with(Method::Patch);
    let body_for = |suffix: &str| {
        patches
            .iter()
            .find(|r| r.path.ends_with(suffix))
            .and_then(|r| r.body.clone())
            .unwrap()
    };
    assert_eq!(body_for("/settings/ciphers"), json!({ "value": ["AES128-SHA"] }));
    assert_eq!(
        body_for("/settings/minify"),
        json!({ "value": { "css": "on", "html": "off", "js": "on" } })
    );
    assert_eq!(
        body_for("/settings/security_header")["value"]["strict_transport_security"]["max_age"],
        json!(86400)
    );

    // Read-back stores the local block form.
    assert_eq!(
        data.get("minify"),
        Some(&json!([{ "css": "on", "html": "off", "js": "on" }]))
    );
    assert_eq!(
        data.get("security_header"),
        Some(&json!([{ "enabled": true, "max_age": 86400, "include_subdomains": true, "nosniff": true }]))
    );
    assert_eq!(data.get("mobile_redirect"), Some(&json!([{ "status": "off" }])));
    assert_eq!(data.get("cipher"), Some(&json!(["AES128-SHA"])));
}

#[tokio::test]
async fn invalid_setting_value_sends_nothing() {
    let client = FakeCisClient::new();
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("brotli", "on")
        .with_attribute("min_tls_version", "1.0");

    let err = provider
        .apply("ibm_cis_domain_settings", Operation::Create, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(err.to_string().contains("min_tls_version"));
    assert_eq!(client.call_count(), 0);
    assert_eq!(data.id, None);
}

#[tokio::test]
async fn settings_delete_is_local_only() {
    let client = FakeCisClient::new();
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("zone-1:{}", CRN));
    provider
        .apply("ibm_cis_domain_settings", Operation::Delete, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
    assert_eq!(client.call_count(), 0);
}

// ===== Firewall rules =====

#[tokio::test]
async fn firewall_priority_failure_keeps_created_rule() {
    let client = FakeCisClient::new();
    let rules = format!("{}/firewall/rules", zone_path("zone-1"));
    client
        .ok(Method::Post, rules.clone(), json!([{ "id": "rule-1" }]))
        .on(Method::Put, format!("{}/rule-1", rules), Reply::Status(500));
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("filter_id", "filter-1")
        .with_attribute("action", "block")
        .with_attribute("priority", 5);

    let err = provider
        .apply("ibm_cis_firewall_rule", Operation::Create, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { status: 500, .. }));
    assert!(err.to_string().contains("priority"));
    assert_eq!(data.id, Some(format!("rule-1:zone-1:{}", CRN)));
    assert_eq!(client.requests_with(Method::Delete).len(), 0);
}

#[tokio::test]
async fn firewall_rule_update_puts_full_rule() {
    let client = FakeCisClient::new();
    let rule = format!("{}/firewall/rules/rule-1", zone_path("zone-1"));
    client
        .ok(Method::Put, rule.clone(), json!({ "id": "rule-1" }))
        .ok(
            Method::Get,
            rule.clone(),
            json!({ "id": "rule-1", "action": "challenge", "priority": 7, "paused": false, "filter": { "id": "filter-1" } }),
        );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("rule-1:zone-1:{}", CRN))
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("filter_id", "filter-1")
        .with_attribute("action", "block")
        .with_attribute("priority", 7)
        .with_prior_snapshot();
    data.set("action", "challenge");

    provider
        .apply("ibm_cis_firewall_rule", Operation::Update, &mut data)
        .await
        .unwrap();

    let puts = client.requests_with(Method::Put);
    assert_eq!(puts.len(), 1);
    let body = puts[0].body.as_ref().unwrap();
    assert_eq!(body["id"], json!("rule-1"));
    assert_eq!(body["action"], json!("challenge"));
    assert_eq!(body["priority"], json!(7));
    assert_eq!(body["filter"], json!({ "id": "filter-1" }));
    assert_eq!(data.get_str("action"), Some("challenge"));
}

#[tokio::test]
async fn firewall_rule_delete_tolerates_missing_rule() {
    let client = FakeCisClient::new();
    // DELETE is unscripted, so it answers 404.
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("rule-1:zone-1:{}", CRN));
    provider
        .apply("ibm_cis_firewall_rule", Operation::Delete, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
    let deletes = client.requests_with(Method::Delete);
    assert_eq!(deletes.len(), 1);
    assert_eq!(
        deletes[0].path,
        format!("{}/firewall/rules/rule-1", zone_path("zone-1"))
    );
}

#[tokio::test]
async fn firewall_rule_rejects_unknown_action() {
    let client = FakeCisClient::new();
    let (provider, _) = provider(&client);

    let mut data = ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("filter_id", "filter-1")
        .with_attribute("action", "drop");

    let err = provider
        .apply("ibm_cis_firewall_rule", Operation::Create, &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(client.call_count(), 0);
}

// ===== Ruleset rules =====

fn ruleset_rule_record() -> ResourceData {
    ResourceData::new()
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("ruleset_id", "rs-1")
        .with_attribute("action", "block")
        .with_attribute("expression", "ip.src eq 192.0.2.1")
}

#[tokio::test]
async fn ruleset_rule_create_finds_new_rule() {
    let client = FakeCisClient::new();
    let ruleset = format!("{}/rulesets/rs-1", zone_path("zone-1"));
    let before = json!({
        "id": "rs-1",
        "rules": [{ "id": "old", "action": "log", "expression": "true" }],
    });
    let after = json!({
        "id": "rs-1",
        "rules": [
            { "id": "old", "action": "log", "expression": "true" },
            { "id": "new", "action": "block", "expression": "ip.src eq 192.0.2.1", "enabled": true },
        ],
    });
    client
        .ok(Method::Get, ruleset.clone(), before)
        .ok(Method::Get, ruleset.clone(), after.clone())
        .ok(Method::Post, format!("{}/rules", ruleset), after);
    let (provider, _) = provider(&client);

    let mut data = ruleset_rule_record();
    provider
        .apply("ibm_cis_ruleset_rule", Operation::Create, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, Some(format!("new:rs-1:zone-1:{}", CRN)));
    assert_eq!(data.get_str("rule_id"), Some("new"));
    assert_eq!(data.get_bool("enabled"), Some(true));
}

#[tokio::test]
async fn ruleset_rule_create_with_position_tracks_new_rule() {
    let client = FakeCisClient::new();
    let ruleset = format!("{}/rulesets/rs-1", zone_path("zone-1"));
    let before = json!({
        "id": "rs-1",
        "rules": [{ "id": "old", "action": "log", "expression": "true" }],
    });
    // Placed first, so the pre-existing rule is now last.
    let after = json!({
        "id": "rs-1",
        "rules": [
            { "id": "new", "action": "block", "expression": "ip.src eq 192.0.2.1" },
            { "id": "old", "action": "log", "expression": "true" },
        ],
    });
    client
        .ok(Method::Get, ruleset.clone(), before)
        .ok(Method::Get, ruleset.clone(), after.clone())
        .ok(Method::Post, format!("{}/rules", ruleset), after);
    let (provider, _) = provider(&client);

    let mut data = ruleset_rule_record().with_attribute("position", json!({ "index": 1 }));
    provider
        .apply("ibm_cis_ruleset_rule", Operation::Create, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, Some(format!("new:rs-1:zone-1:{}", CRN)));
    assert_eq!(data.get_str("action"), Some("block"));

    let post = &client.requests_with(Method::Post)[0];
    assert_eq!(post.body.as_ref().unwrap()["position"], json!({ "index": 1 }));
}

#[tokio::test]
async fn ruleset_rule_update_patches_rule_path() {
    let client = FakeCisClient::new();
    let ruleset = format!("{}/rulesets/rs-1", zone_path("zone-1"));
    client
        .ok(Method::Patch, format!("{}/rules/r1", ruleset), json!({ "id": "rs-1" }))
        .ok(
            Method::Get,
            ruleset.clone(),
            json!({ "id": "rs-1", "rules": [{ "id": "r1", "action": "block", "expression": "true", "enabled": false }] }),
        );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("r1:rs-1:zone-1:{}", CRN))
        .with_attribute("cis_id", CRN)
        .with_attribute("domain_id", "zone-1")
        .with_attribute("ruleset_id", "rs-1")
        .with_attribute("action", "block")
        .with_attribute("expression", "true")
        .with_attribute("enabled", true)
        .with_prior_snapshot();
    data.set("enabled", false);

    provider
        .apply("ibm_cis_ruleset_rule", Operation::Update, &mut data)
        .await
        .unwrap();

    let patches = client.requests_with(Method::Patch);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].body.as_ref().unwrap()["enabled"], json!(false));
    assert_eq!(data.get_bool("enabled"), Some(false));
}

#[tokio::test]
async fn ruleset_rule_delete_removes_only_that_rule() {
    let client = FakeCisClient::new();
    let ruleset = format!("{}/rulesets/rs-1", zone_path("zone-1"));
    client.ok(Method::Delete, format!("{}/rules/r1", ruleset), json!({ "id": "rs-1" }));
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("r1:rs-1:zone-1:{}", CRN));
    provider
        .apply("ibm_cis_ruleset_rule", Operation::Delete, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
    assert_eq!(client.call_count(), 1);
    assert_eq!(client.requests()[0].path, format!("{}/rules/r1", ruleset));
}

#[tokio::test]
async fn ruleset_rule_missing_from_ruleset_clears_id() {
    let client = FakeCisClient::new();
    client.ok(
        Method::Get,
        format!("{}/rulesets/rs-1", zone_path("zone-1")),
        json!({ "id": "rs-1", "rules": [{ "id": "other" }] }),
    );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("gone:rs-1:zone-1:{}", CRN));
    provider
        .apply("ibm_cis_ruleset_rule", Operation::Read, &mut data)
        .await
        .unwrap();

    assert_eq!(data.id, None);
}

// ===== Alert webhooks =====

#[tokio::test]
async fn webhook_update_puts_full_body() {
    let client = FakeCisClient::new();
    let webhook = format!("/v1/{}/alerting/destinations/webhooks/wh_123", ENCODED_CRN);
    client
        .ok(Method::Put, webhook.clone(), json!({ "id": "wh_123" }))
        .ok(
            Method::Get,
            webhook.clone(),
            json!({ "id": "wh_123", "name": "ops", "url": "https://hooks.example.com/b", "type": "generic" }),
        );
    let (provider, _) = provider(&client);

    let mut data = ResourceData::with_id(format!("wh_123:{}", CRN))
        .with_attribute("cis_id", CRN)
        .with_attribute("name", "ops")
        .with_attribute("url", "https://hooks.example.com/a")
        .with_prior_snapshot();
    data.set("url", "https://hooks.example.com/b");

    provider
        .apply("ibm_cis_alert_webhook", Operation::Update, &mut data)
        .await
        .unwrap();

    let puts = client.requests_with(Method::Put);
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts[0].body,
        Some(json!({ "name": "ops", "url": "https://hooks.example.com/b" }))
    );
    assert_eq!(data.get_str("type"), Some("generic"));
}
