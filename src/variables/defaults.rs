//! The built-in default set: the closed universe of variable names.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::VariableError;
use crate::hash;

/// JSON kind of a variable value.
///
/// Type checks compare kinds; numeric width (integer vs. float) is not
/// distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Immutable name → default value mapping, fixed at process start.
///
/// The fingerprint is a stable hash of the canonical JSON encoding of the
/// whole map. Sessions stamp it, so overrides written under an older
/// default set are discarded wholesale instead of silently mixing with new
/// defaults (see [`super::VariableStore`]).
#[derive(Debug, Clone)]
pub struct VariableDefaults {
    values: BTreeMap<String, Value>,
    fingerprint: String,
}

impl VariableDefaults {
    pub fn new<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let values: BTreeMap<String, Value> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let fingerprint = hash::fingerprint(&values);
        Self { values, fingerprint }
    }

    /// Resolves the default for `name`.
    pub fn get(&self, name: &str) -> Result<&Value, VariableError> {
        self.values
            .get(name)
            .ok_or_else(|| VariableError::UnknownVariable { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Content hash of the default set; changes whenever any default is
    /// added, removed, or retyped between deployments.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> VariableDefaults {
        VariableDefaults::new([
            ("target_year", json!(2035)),
            ("municipality_name", json!("Helsinki")),
        ])
    }

    #[test]
    fn test_get_known_and_unknown() {
        let defaults = defaults();
        assert_eq!(defaults.get("target_year").unwrap(), &json!(2035));
        let err = defaults.get("no_such_variable").unwrap_err();
        assert_eq!(
            err,
            VariableError::UnknownVariable { name: "no_such_variable".into() }
        );
    }

    #[test]
    fn test_fingerprint_ignores_declaration_order() {
        let a = VariableDefaults::new([
            ("target_year", json!(2035)),
            ("municipality_name", json!("Helsinki")),
        ]);
        let b = VariableDefaults::new([
            ("municipality_name", json!("Helsinki")),
            ("target_year", json!(2035)),
        ]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_default_changes() {
        let a = defaults();
        let b = VariableDefaults::new([
            ("target_year", json!(2030)),
            ("municipality_name", json!("Helsinki")),
        ]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
