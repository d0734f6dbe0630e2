//! Per-request override scope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session-scoped variable overrides.
///
/// The hosting application owns one per logical user session, restores it
/// at the start of a request and persists it afterwards; the store only
/// mutates it through a handle. `default_fingerprint` records the default
/// set the overrides were written under; on mismatch the session is
/// cleared wholesale before any read or write goes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    overrides: BTreeMap<String, Value>,
    default_fingerprint: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.overrides.get(name)
    }

    pub(crate) fn set(&mut self, name: &str, value: Value) {
        self.overrides.insert(name.to_string(), value);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.overrides.remove(name);
    }

    /// Drops every override written under a different default set and
    /// stamps the current fingerprint.
    pub(crate) fn synchronize(&mut self, fingerprint: &str) {
        if self.default_fingerprint != fingerprint {
            self.overrides.clear();
            self.default_fingerprint = fingerprint.to_string();
        }
    }

    /// Clears all overrides, keeping the session bound to `fingerprint`.
    pub(crate) fn reset(&mut self, fingerprint: &str) {
        self.overrides.clear();
        self.default_fingerprint = fingerprint.to_string();
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_synchronize_clears_on_fingerprint_mismatch() {
        let mut session = Session::new();
        session.synchronize("aaaa");
        session.set("target_year", json!(2030));

        session.synchronize("aaaa");
        assert_eq!(session.get("target_year"), Some(&json!(2030)));

        // Deploy with changed defaults: overrides go away wholesale.
        session.synchronize("bbbb");
        assert!(session.is_empty());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut session = Session::new();
        session.synchronize("aaaa");
        session.set("target_year", json!(2030));

        let encoded = serde_json::to_string(&session).unwrap();
        let decoded: Session = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, session);
    }
}
