//! Closed value sets for zone settings
//!
//! Every setting the CIS API accepts from a fixed list is a tagged enum here,
//! parsed once from its wire form and matched exhaustively afterwards.
//! Serialization uses the wire form, so these types can sit directly in
//! request bodies and local records.
//!
//! A few settings are structured. The local record holds each of them as a
//! single-element list of blocks (`[{"css": "on", ...}]`), while the API
//! takes a bare object, nested one level deeper for the security header.
//! [`SettingKind::parse`] expands the local form and
//! [`SettingKind::from_wire`] reads the API form; [`SettingValue::to_wire`]
//! and [`SettingValue::to_local`] go the other way.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every accepted value, in wire form
            pub const ALLOWED: &'static [&'static str] = &[$($wire),+];

            /// Wire form of the value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::Error;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err($crate::error::Error::invalid_input(format!(
                        "{} '{}' is not valid. Allowed: {}",
                        $field,
                        other,
                        Self::ALLOWED.join(", ")
                    ))),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Generic on/off switch used by most settings
    OnOff, "on/off value" {
        On => "on",
        Off => "off",
    }
}

wire_enum! {
    /// DNSSEC status
    ActiveDisabled, "active/disabled value" {
        Active => "active",
        Disabled => "disabled",
    }
}

wire_enum! {
    /// SSL mode between the edge and the origin
    SslMode, "ssl" {
        Off => "off",
        Flexible => "flexible",
        Full => "full",
        Strict => "strict",
        OriginPull => "origin_pull",
    }
}

wire_enum! {
    MinTlsVersion, "min_tls_version" {
        V1_1 => "1.1",
        V1_2 => "1.2",
        V1_3 => "1.3",
        V1_4 => "1.4",
    }
}

wire_enum! {
    CnameFlattening, "cname_flattening" {
        FlattenAtRoot => "flatten_at_root",
        FlattenAll => "flatten_all",
        FlattenNone => "flatten_none",
    }
}

wire_enum! {
    ImageSizeOptimization, "image_size_optimization" {
        Lossless => "lossless",
        Off => "off",
        Lossy => "lossy",
    }
}

wire_enum! {
    PseudoIpv4, "pseudo_ipv4" {
        OverwriteHeader => "overwrite_header",
        Off => "off",
        AddHeader => "add_header",
    }
}

wire_enum! {
    /// TLS cipher suite offered at the edge
    Cipher, "cipher" {
        EcdheEcdsaAes128GcmSha256 => "ECDHE-ECDSA-AES128-GCM-SHA256",
        EcdheEcdsaChacha20Poly1305 => "ECDHE-ECDSA-CHACHA20-POLY1305",
        EcdheRsaAes128GcmSha256 => "ECDHE-RSA-AES128-GCM-SHA256",
        EcdheRsaChacha20Poly1305 => "ECDHE-RSA-CHACHA20-POLY1305",
        EcdheEcdsaAes128Sha256 => "ECDHE-ECDSA-AES128-SHA256",
        EcdheEcdsaAes128Sha => "ECDHE-ECDSA-AES128-SHA",
        EcdheRsaAes128Sha256 => "ECDHE-RSA-AES128-SHA256",
        EcdheRsaAes128Sha => "ECDHE-RSA-AES128-SHA",
        Aes128GcmSha256 => "AES128-GCM-SHA256",
        Aes128Sha256 => "AES128-SHA256",
        Aes128Sha => "AES128-SHA",
        EcdheEcdsaAes256GcmSha384 => "ECDHE-ECDSA-AES256-GCM-SHA384",
        EcdheEcdsaAes256Sha384 => "ECDHE-ECDSA-AES256-SHA384",
        EcdheRsaAes256GcmSha384 => "ECDHE-RSA-AES256-GCM-SHA384",
        EcdheRsaAes256Sha384 => "ECDHE-RSA-AES256-SHA384",
        EcdheRsaAes256Sha => "ECDHE-RSA-AES256-SHA",
        Aes256GcmSha384 => "AES256-GCM-SHA384",
        Aes256Sha256 => "AES256-SHA256",
        Aes256Sha => "AES256-SHA",
        DesCbc3Sha => "DES-CBC3-SHA",
    }
}

/// Which asset types are minified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minify {
    pub css: OnOff,
    pub html: OnOff,
    pub js: OnOff,
}

/// HTTP Strict Transport Security header settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictTransportSecurity {
    pub enabled: bool,
    pub max_age: u64,
    pub include_subdomains: bool,
    pub nosniff: bool,
}

/// Redirect of mobile visitors to a subdomain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileRedirect {
    pub status: OnOff,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_uri: Option<bool>,
}

/// Challenge TTL in seconds, restricted to the values the API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ChallengeTtl(u32);

impl ChallengeTtl {
    pub const ALLOWED: &'static [u32] = &[
        300, 900, 1800, 2700, 3600, 7200, 10800, 14400, 28800, 57600, 86400, 604800, 2592000,
        31536000,
    ];

    pub fn seconds(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ChallengeTtl {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::invalid_input(format!(
                "challenge_ttl {} is not an accepted value",
                value
            )))
        }
    }
}

impl From<ChallengeTtl> for u32 {
    fn from(ttl: ChallengeTtl) -> Self {
        ttl.0
    }
}

/// Maximum upload size in MB: 100 to 500 in steps of 25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaxUpload(u32);

impl MaxUpload {
    pub fn megabytes(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for MaxUpload {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        if (100..=500).contains(&value) && value % 25 == 0 {
            Ok(Self(value))
        } else {
            Err(Error::invalid_input(format!(
                "max_upload {} must be between 100 and 500 in steps of 25",
                value
            )))
        }
    }
}

impl From<MaxUpload> for u32 {
    fn from(size: MaxUpload) -> Self {
        size.0
    }
}

/// Which closed set a setting draws its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    OnOff,
    ActiveDisabled,
    Ssl,
    MinTlsVersion,
    CnameFlattening,
    ImageSizeOptimization,
    PseudoIpv4,
    ChallengeTtl,
    MaxUpload,
    Ciphers,
    Minify,
    SecurityHeader,
    MobileRedirect,
}

/// A parsed setting value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    OnOff(OnOff),
    ActiveDisabled(ActiveDisabled),
    Ssl(SslMode),
    MinTlsVersion(MinTlsVersion),
    CnameFlattening(CnameFlattening),
    ImageSizeOptimization(ImageSizeOptimization),
    PseudoIpv4(PseudoIpv4),
    ChallengeTtl(ChallengeTtl),
    MaxUpload(MaxUpload),
    Ciphers(Vec<Cipher>),
    Minify(Minify),
    SecurityHeader(StrictTransportSecurity),
    MobileRedirect(MobileRedirect),
}

/// Key under which the API nests the security header value
const STRICT_TRANSPORT_SECURITY: &str = "strict_transport_security";

fn typed<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| Error::invalid_input(format!("{}: {}", key, e)))
}

/// The one block of a structured setting in the local record
///
/// A bare object is accepted as well as the single-element list.
fn single_block<'a>(key: &str, value: &'a Value) -> Result<&'a Value> {
    match value {
        Value::Array(items) if items.len() == 1 && items[0].is_object() => Ok(&items[0]),
        Value::Object(_) => Ok(value),
        _ => Err(Error::invalid_input(format!(
            "{} must be a single block, got {}",
            key, value
        ))),
    }
}

fn ciphers(key: &str, value: &Value) -> Result<Vec<Cipher>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::invalid_input(format!("{} must be a list, got {}", key, value)))?;

    let mut parsed: Vec<Cipher> = Vec::with_capacity(items.len());
    for item in items {
        let cipher: Cipher = item
            .as_str()
            .ok_or_else(|| Error::invalid_input(format!("{} entries must be strings", key)))?
            .parse()?;
        if !parsed.contains(&cipher) {
            parsed.push(cipher);
        }
    }
    Ok(parsed)
}

impl SettingKind {
    /// Structured settings hold a block rather than a single value
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            SettingKind::Minify | SettingKind::SecurityHeader | SettingKind::MobileRedirect
        )
    }

    /// Parse a value from the local record
    pub fn parse(&self, key: &str, value: &Value) -> Result<SettingValue> {
        match self {
            SettingKind::Minify => Ok(SettingValue::Minify(typed(key, single_block(key, value)?)?)),
            SettingKind::SecurityHeader => Ok(SettingValue::SecurityHeader(typed(
                key,
                single_block(key, value)?,
            )?)),
            SettingKind::MobileRedirect => Ok(SettingValue::MobileRedirect(typed(
                key,
                single_block(key, value)?,
            )?)),
            _ => self.parse_flat(key, value),
        }
    }

    /// Parse a value as the API reports it
    pub fn from_wire(&self, key: &str, value: &Value) -> Result<SettingValue> {
        match self {
            SettingKind::Minify => Ok(SettingValue::Minify(typed(key, value)?)),
            SettingKind::SecurityHeader => {
                let inner = value.get(STRICT_TRANSPORT_SECURITY).ok_or_else(|| {
                    Error::invalid_input(format!(
                        "{} has no {} block",
                        key, STRICT_TRANSPORT_SECURITY
                    ))
                })?;
                Ok(SettingValue::SecurityHeader(typed(key, inner)?))
            }
            SettingKind::MobileRedirect => Ok(SettingValue::MobileRedirect(typed(key, value)?)),
            _ => self.parse_flat(key, value),
        }
    }

    /// Settings whose local and wire forms coincide
    fn parse_flat(&self, key: &str, value: &Value) -> Result<SettingValue> {
        let text = || {
            value.as_str().ok_or_else(|| {
                Error::invalid_input(format!("{} must be a string, got {}", key, value))
            })
        };
        let number = || {
            value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    Error::invalid_input(format!("{} must be an integer, got {}", key, value))
                })
        };

        Ok(match self {
            SettingKind::OnOff => SettingValue::OnOff(text()?.parse()?),
            SettingKind::ActiveDisabled => SettingValue::ActiveDisabled(text()?.parse()?),
            SettingKind::Ssl => SettingValue::Ssl(text()?.parse()?),
            SettingKind::MinTlsVersion => SettingValue::MinTlsVersion(text()?.parse()?),
            SettingKind::CnameFlattening => SettingValue::CnameFlattening(text()?.parse()?),
            SettingKind::ImageSizeOptimization => {
                SettingValue::ImageSizeOptimization(text()?.parse()?)
            }
            SettingKind::PseudoIpv4 => SettingValue::PseudoIpv4(text()?.parse()?),
            SettingKind::ChallengeTtl => SettingValue::ChallengeTtl(number()?.try_into()?),
            SettingKind::MaxUpload => SettingValue::MaxUpload(number()?.try_into()?),
            SettingKind::Ciphers => SettingValue::Ciphers(ciphers(key, value)?),
            SettingKind::Minify | SettingKind::SecurityHeader | SettingKind::MobileRedirect => {
                return Err(Error::invalid_input(format!("{} is a structured setting", key)));
            }
        })
    }
}

impl SettingValue {
    /// Form sent to the API
    pub fn to_wire(&self) -> Value {
        match self {
            SettingValue::SecurityHeader(hsts) => json!({ STRICT_TRANSPORT_SECURITY: hsts }),
            SettingValue::Minify(minify) => json!(minify),
            SettingValue::MobileRedirect(redirect) => json!(redirect),
            flat => flat.flat_json(),
        }
    }

    /// Form stored in the local record
    pub fn to_local(&self) -> Value {
        match self {
            SettingValue::SecurityHeader(hsts) => json!([hsts]),
            SettingValue::Minify(minify) => json!([minify]),
            SettingValue::MobileRedirect(redirect) => json!([redirect]),
            flat => flat.flat_json(),
        }
    }

    fn flat_json(&self) -> Value {
        match self {
            SettingValue::OnOff(v) => Value::from(v.as_str()),
            SettingValue::ActiveDisabled(v) => Value::from(v.as_str()),
            SettingValue::Ssl(v) => Value::from(v.as_str()),
            SettingValue::MinTlsVersion(v) => Value::from(v.as_str()),
            SettingValue::CnameFlattening(v) => Value::from(v.as_str()),
            SettingValue::ImageSizeOptimization(v) => Value::from(v.as_str()),
            SettingValue::PseudoIpv4(v) => Value::from(v.as_str()),
            SettingValue::ChallengeTtl(v) => Value::from(v.seconds()),
            SettingValue::MaxUpload(v) => Value::from(v.megabytes()),
            SettingValue::Ciphers(list) => list.iter().map(|c| Value::from(c.as_str())).collect(),
            SettingValue::Minify(minify) => json!(minify),
            SettingValue::SecurityHeader(hsts) => json!(hsts),
            SettingValue::MobileRedirect(redirect) => json!(redirect),
        }
    }
}
