//! Cache-key derivation.
//!
//! For fixed variable values and a fixed declared graph the key must be
//! byte-identical across processes and invocations, so a result cache
//! shared between server instances stays coherent.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::graph::DependencyClosure;
use crate::hash;

/// Derives the result-cache key for one root query.
///
/// Layout: `<qualified name>:<variable hash>:<structural hash>`. The
/// variable hash covers the canonical JSON of every variable in the
/// closure with its current value; the structural hash covers the sorted
/// names of every reachable node, so two different functions, or the same
/// function with a changed dependency set, never collide.
pub(crate) fn derive(
    name: &str,
    closure: &DependencyClosure,
    values: &BTreeMap<&str, Value>,
) -> String {
    let var_hash = hash::sip128_hex(hash::canonical_json(values).as_bytes());

    // closure.nodes is a BTreeSet: iteration order is already canonical.
    let mut structure = String::new();
    for node in &closure.nodes {
        structure.push_str(node);
        structure.push('\n');
    }
    let node_hash = hash::sip128_hex(structure.as_bytes());

    format!("{name}:{var_hash}:{node_hash}")
}
