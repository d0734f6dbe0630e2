//! Scenario variables and their resolution scopes.
//!
//! Resolution order is override stack → session scope → defaults; the
//! topmost non-empty layer wins. The set of valid variable names is closed
//! at construction of [`VariableDefaults`] and reading or writing any other
//! name is an error.

mod defaults;
mod overrides;
mod session;
mod store;

pub use defaults::{ValueKind, VariableDefaults};
pub use session::Session;
pub use store::{AllowSetGuard, OverrideGuard, VariableStore};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariableError {
    /// Read or write of a name outside the default set. Programmer error.
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },
    /// Write of a value whose JSON kind disagrees with the default's.
    #[error("variable '{name}' expects {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        got: ValueKind,
    },
    /// Write outside a request context without an `allow_external_set`
    /// scope in effect.
    #[error("variable '{name}' set outside of request context")]
    SetNotAllowed { name: String },
}
