//! Contract Test: Composite Handle Codec
//!
//! Constraints verified:
//! - Encode then decode returns the original components, in order
//! - A handle with the wrong number of components is a MalformedHandle error,
//!   never a truncated or padded result
//! - Components containing the delimiter do not survive a strict decode
//! - CRN-suffixed handles are read back with the trailing decoder

mod common;

use cis_core::Error;
use cis_core::handle::{decode, decode_trailing, encode};
use common::CRN;

#[test]
fn round_trip_for_every_arity() {
    let two = encode(["wh_123", "inst-1"]);
    assert_eq!(decode::<2>(&two).unwrap(), ["wh_123", "inst-1"]);

    let three = encode(["rule-1", "zone-1", "inst-1"]);
    assert_eq!(decode::<3>(&three).unwrap(), ["rule-1", "zone-1", "inst-1"]);

    let four = encode(["rule-1", "rs-1", "zone-1", "inst-1"]);
    assert_eq!(
        decode::<4>(&four).unwrap(),
        ["rule-1", "rs-1", "zone-1", "inst-1"]
    );
}

#[test]
fn arity_mismatch_is_malformed() {
    let handle = encode(["rule-1", "zone-1", "inst-1"]);

    match decode::<2>(&handle) {
        Err(Error::MalformedHandle {
            expected, found, ..
        }) => {
            assert_eq!(expected, 2);
            assert_eq!(found, 3);
        }
        other => panic!("expected MalformedHandle, got {:?}", other),
    }

    assert!(matches!(
        decode::<4>(&handle),
        Err(Error::MalformedHandle {
            expected: 4,
            found: 3,
            ..
        })
    ));
    assert!(matches!(
        decode::<2>("no-delimiter"),
        Err(Error::MalformedHandle { found: 1, .. })
    ));
}

#[test]
fn delimiter_in_component_breaks_strict_decode() {
    let handle = encode(["wh_123", "a:b"]);
    assert_eq!(handle, "wh_123:a:b");
    assert!(decode::<2>(&handle).is_err());

    // An inner component with a delimiter is not recoverable either way.
    let handle = encode(["a:b", "inst-1"]);
    assert_ne!(decode_trailing::<2>(&handle).unwrap(), ["a:b", "inst-1"]);
}

#[test]
fn crn_suffixed_handle() {
    let handle = encode(["wh_123", CRN]);
    assert_eq!(
        handle,
        "wh_123:crn:v1:bluemix:public:internet-svcs:global:a/acc:inst::"
    );

    assert!(decode::<2>(&handle).is_err());

    let [webhook_id, crn] = decode_trailing::<2>(&handle).unwrap();
    assert_eq!(webhook_id, "wh_123");
    assert_eq!(crn, CRN);

    let handle = encode(["rule-1", "rs-1", "zone-1", CRN]);
    assert_eq!(
        decode_trailing::<4>(&handle).unwrap(),
        ["rule-1", "rs-1", "zone-1", CRN]
    );
}

#[test]
fn trailing_decode_still_rejects_short_handles() {
    assert!(matches!(
        decode_trailing::<3>("zone-1:inst-1"),
        Err(Error::MalformedHandle {
            expected: 3,
            found: 2,
            ..
        })
    ));
}
