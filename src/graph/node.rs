//! Calc-node types: the registered unit of computation and its declared
//! dependencies.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use serde_json::Value;

use crate::engine::{EvalError, Invocation};

/// A unique, stable identifier for a node within the graph.
///
/// This is a type alias for `petgraph::graph::NodeIndex` to abstract the
/// underlying graph implementation.
pub type NodeId = NodeIndex;

/// The callable behind a calc node. Receives its declared variable values
/// and datasets injected through the [`Invocation`].
pub type CalcFn = dyn Fn(&Invocation) -> Result<Value, EvalError> + Send + Sync;

/// Declaration of a calc function.
///
/// This is the only place dependency information is specified; nothing is
/// inferred from the function body. An undeclared variable read fails at
/// run time and an undeclared child call is simply untracked, exactly as
/// hand-written calls would be.
pub struct NodeSpec {
    pub(crate) name: String,
    pub(crate) variables: Vec<String>,
    pub(crate) datasets: Vec<String>,
    pub(crate) children: Vec<String>,
    pub(crate) func: Arc<CalcFn>,
}

impl NodeSpec {
    /// Starts a declaration for `name`, which should be module-qualified
    /// ("calc.population.predict_population") so identities stay unique
    /// across the whole model.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Invocation) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            variables: Vec::new(),
            datasets: Vec::new(),
            children: Vec::new(),
            func: Arc::new(func),
        }
    }

    /// Scenario variables the function reads.
    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = names.into_iter().map(Into::into).collect();
        self
    }

    /// Dataset identifiers the function reads.
    pub fn datasets<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datasets = identifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Names of already-registered calc nodes the function calls.
    pub fn children<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A registered calc node. Child edges live in the registry graph.
pub struct CalcNode {
    name: String,
    variables: BTreeSet<String>,
    datasets: BTreeSet<String>,
    func: Arc<CalcFn>,
}

impl CalcNode {
    pub(crate) fn from_spec(spec: NodeSpec) -> Self {
        Self {
            name: spec.name,
            variables: spec.variables.into_iter().collect(),
            datasets: spec.datasets.into_iter().collect(),
            func: spec.func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn datasets(&self) -> &BTreeSet<String> {
        &self.datasets
    }

    pub(crate) fn func(&self) -> &Arc<CalcFn> {
        &self.func
    }
}

impl fmt::Debug for CalcNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalcNode")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .field("datasets", &self.datasets)
            .finish_non_exhaustive()
    }
}
