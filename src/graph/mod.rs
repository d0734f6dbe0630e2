//! The declared dependency graph of calc functions.

mod closure;
mod node;
mod registry;

pub use closure::DependencyClosure;
pub use node::{CalcNode, NodeId, NodeSpec};
pub use registry::Registry;

use thiserror::Error;

use crate::variables::VariableError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A calc node name may be registered once.
    #[error("calc node '{name}' is already registered")]
    DuplicateNode { name: String },
    /// Query or child declaration against a name nothing registered.
    #[error("unknown calc node '{name}'")]
    UnknownNode { name: String },
    /// Children must be registered before the nodes that declare them.
    #[error("calc node '{parent}' declares unknown child '{child}'")]
    UnknownChild { parent: String, child: String },
    /// The declared child graph must be a DAG; a cycle is a configuration
    /// error, detected when the closure walk revisits a node in progress.
    #[error("cyclic dependency through calc node '{name}'")]
    CyclicDependency { name: String },
    /// A node declared a variable outside the default set.
    #[error(transparent)]
    Variable(#[from] VariableError),
}
