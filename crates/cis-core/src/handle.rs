//! Composite handle codec
//!
//! The host tracks each managed object by a single opaque string, while the
//! CIS API addresses objects by a path of two to four identifiers. A handle
//! packs that path into one string, innermost identifier first and the
//! account-level identifier (usually the instance CRN) last:
//!
//! ```text
//! rule_id:zone_id:crn
//! ```
//!
//! Components are joined with `:` without escaping. A component that itself
//! contains `:` does not survive [`decode`]; handles whose last component is
//! a CRN must be read back with [`decode_trailing`].

use crate::error::{Error, Result};

/// Separator between handle components
pub const DELIMITER: char = ':';

const fn check_arity<const N: usize>() {
    assert!(N >= 2 && N <= 4, "handles carry between 2 and 4 components");
}

/// Join `N` identifiers into a handle
///
/// ```
/// let handle = cis_core::handle::encode(["wh_123", "inst-1"]);
/// assert_eq!(handle, "wh_123:inst-1");
/// ```
pub fn encode<const N: usize>(parts: [&str; N]) -> String {
    const { check_arity::<N>() };
    parts.join(":")
}

/// Split a handle into exactly `N` components
///
/// Fails with [`Error::MalformedHandle`] when the number of `:`-separated
/// pieces differs from `N`; the result is never truncated or padded.
pub fn decode<const N: usize>(handle: &str) -> Result<[String; N]> {
    const { check_arity::<N>() };
    let parts: Vec<String> = handle.split(DELIMITER).map(str::to_string).collect();
    into_array(handle, parts)
}

/// Split a handle into `N` components, letting the last one keep any
/// further delimiters
///
/// The outermost component of most CIS handles is an instance CRN, which is
/// itself `:`-separated. Fewer than `N` pieces is still a
/// [`Error::MalformedHandle`].
pub fn decode_trailing<const N: usize>(handle: &str) -> Result<[String; N]> {
    const { check_arity::<N>() };
    let parts: Vec<String> = handle.splitn(N, DELIMITER).map(str::to_string).collect();
    into_array(handle, parts)
}

fn into_array<const N: usize>(handle: &str, parts: Vec<String>) -> Result<[String; N]> {
    let found = parts.len();
    parts.try_into().map_err(|_| Error::MalformedHandle {
        handle: handle.to_string(),
        expected: N,
        found,
    })
}
