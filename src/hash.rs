//! Stable 128-bit content hashing.
//!
//! Cache keys and the default-set fingerprint must be identical across
//! processes and invocations, so everything goes through SipHash-1-3 with
//! the fixed zero keys. `DefaultHasher` is randomly seeded per process and
//! must not be used here.

use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher13};

/// Hashes raw bytes to a 128-bit digest.
pub(crate) fn sip128(bytes: &[u8]) -> u128 {
    let mut state = SipHasher13::new();
    state.write(bytes);
    state.finish128().as_u128()
}

/// Hex digest used inside cache keys and fingerprints.
pub(crate) fn sip128_hex(bytes: &[u8]) -> String {
    format!("{:032x}", sip128(bytes))
}

/// Canonical JSON encoding: object keys sorted at every level.
///
/// `serde_json`'s default map is ordered, so any `Value` and any
/// `BTreeMap`-based structure encodes with sorted keys. Callers must not
/// pass insertion-ordered maps.
pub(crate) fn canonical_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("BUG: JSON encoding of a Value cannot fail")
}

/// Fingerprint of any canonically-encodable structure.
pub(crate) fn fingerprint<T: serde::Serialize>(value: &T) -> String {
    sip128_hex(canonical_json(value).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use serde_json::json;

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(sip128(b"target_year"), sip128(b"target_year"));
        assert_ne!(sip128(b"target_year"), sip128(b"target_year "));
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        // Insertion order differs, canonical encoding must not.
        let a = json!({"b": 1, "a": [1, 2], "c": {"z": 0, "y": 1}});
        let b = json!({"c": {"y": 1, "z": 0}, "a": [1, 2], "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut map = BTreeMap::new();
        map.insert("target_year", json!(2035));
        let before = fingerprint(&map);
        map.insert("target_year", json!(2030));
        assert_ne!(before, fingerprint(&map));
    }
}
