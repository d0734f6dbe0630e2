//! Memoized invocation of registered calc functions.

mod invoke;
mod key;

pub use invoke::{Engine, Invocation, DEFAULT_RESULT_TTL};

use thiserror::Error;

use crate::datasets::DatasetError;
use crate::graph::GraphError;
use crate::variables::VariableError;

/// Failures surfaced by a query.
///
/// Nothing here is retried and there is no partial-failure mode: either
/// the full dependency closure resolves and the calc function runs, or
/// the call fails outright. Failed calls are never cached.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// A calc function read a variable it never declared.
    #[error("calc node '{node}' read undeclared variable '{name}'")]
    UndeclaredVariable { node: String, name: String },
    /// A calc function read a dataset it never declared.
    #[error("calc node '{node}' read undeclared dataset '{identifier}'")]
    UndeclaredDataset { node: String, identifier: String },
    /// A calc function returned null, which is reserved to mean "absent"
    /// in the result cache. Fails loudly instead of silently caching
    /// nothing.
    #[error("calc node '{node}' returned null")]
    InvalidResult { node: String },
    /// Host-side calculation failure.
    #[error("calculation failed in '{node}': {message}")]
    Calc { node: String, message: String },
}

impl EvalError {
    /// Wraps a host-side calculation failure.
    pub fn calc(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Calc {
            node: node.into(),
            message: message.into(),
        }
    }
}
