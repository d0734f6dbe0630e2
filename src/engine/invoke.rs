//! The memoized invocation engine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::key;
use super::EvalError;
use crate::cache::ResultCache;
use crate::datasets::{Dataset, DatasetCache};
use crate::graph::{NodeId, Registry};
use crate::variables::VariableStore;

/// Default time-to-live for memoized results. Bounds staleness from a
/// result cache that is shared across server instances without
/// invalidation push.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(600);

/// Evaluates registered calc functions with result memoization.
///
/// A zero-argument invocation (a "root query") is keyed by the node's
/// transitive dependency closure and the current variable values, and
/// served from the result cache when possible. An invocation with
/// arguments bypasses the cache entirely; its dependencies are still
/// resolved and injected. All shared state is constructor-injected; there
/// are no process-global caches.
pub struct Engine {
    registry: Arc<Registry>,
    datasets: Arc<DatasetCache>,
    cache: Arc<dyn ResultCache>,
    ttl: Duration,
}

impl Engine {
    pub fn new(
        registry: Arc<Registry>,
        datasets: Arc<DatasetCache>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        Self {
            registry,
            datasets,
            cache,
            ttl: DEFAULT_RESULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Root query: the memoized, zero-argument invocation of `name`.
    pub fn query(&self, name: &str, store: &VariableStore) -> Result<Value, EvalError> {
        let id = self.registry.lookup(name)?;
        let node_name = self.registry.node(id).name();
        let closure = self.registry.closure(id)?;

        // Current value of every variable in the transitive closure, in
        // canonical order.
        let mut values: BTreeMap<&str, Value> = BTreeMap::new();
        for variable in &closure.variables {
            values.insert(variable.as_str(), store.get(variable)?);
        }
        let cache_key = key::derive(node_name, &closure, &values);

        if let Some(value) = self.cache.get(&cache_key) {
            debug!(node = node_name, "cache hit");
            return Ok(value);
        }
        debug!(node = node_name, "cache miss");

        let result = self.execute(id, store, &[])?;
        if result.is_null() {
            return Err(EvalError::InvalidResult {
                node: node_name.to_string(),
            });
        }
        self.cache.set(&cache_key, result.clone(), self.ttl);
        Ok(result)
    }

    /// Ad hoc invocation with arguments: never cached, dependencies still
    /// injected. Keying is undefined for arguments, so none is attempted.
    pub fn call_with(
        &self,
        name: &str,
        store: &VariableStore,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let id = self.registry.lookup(name)?;
        self.execute(id, store, &args)
    }

    /// Resolves the node's own declared variables and datasets, then runs
    /// the calc function. Errors propagate uncached.
    fn execute(
        &self,
        id: NodeId,
        store: &VariableStore,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        let node = self.registry.node(id);

        let mut variables = BTreeMap::new();
        for name in node.variables() {
            variables.insert(name.clone(), store.get(name)?);
        }
        let mut datasets = BTreeMap::new();
        for identifier in node.datasets() {
            datasets.insert(identifier.clone(), self.datasets.load(identifier)?);
        }

        let invocation = Invocation {
            engine: self,
            store,
            node_name: node.name(),
            variables,
            datasets,
            args,
        };
        (node.func())(&invocation)
    }
}

/// Everything a calc function receives: its declared variable values, its
/// declared datasets, any ad hoc arguments, and a handle for querying
/// other registered nodes.
pub struct Invocation<'a> {
    engine: &'a Engine,
    store: &'a VariableStore,
    node_name: &'a str,
    variables: BTreeMap<String, Value>,
    datasets: BTreeMap<String, Dataset>,
    args: &'a [Value],
}

impl Invocation<'_> {
    /// The current value of a variable this node declared.
    pub fn variable(&self, name: &str) -> Result<&Value, EvalError> {
        self.variables
            .get(name)
            .ok_or_else(|| EvalError::UndeclaredVariable {
                node: self.node_name.to_string(),
                name: name.to_string(),
            })
    }

    /// A dataset this node declared.
    pub fn dataset(&self, identifier: &str) -> Result<&Dataset, EvalError> {
        self.datasets
            .get(identifier)
            .ok_or_else(|| EvalError::UndeclaredDataset {
                node: self.node_name.to_string(),
                identifier: identifier.to_string(),
            })
    }

    /// Ad hoc arguments; empty for a root query.
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Queries another registered node under the same variable store.
    ///
    /// Each child query is independently memoized. Calls to nodes not
    /// declared as children are permitted but untracked, exactly like a
    /// hand-written function call; such a call must not form a cycle.
    pub fn query(&self, name: &str) -> Result<Value, EvalError> {
        self.engine.query(name, self.store)
    }

    /// Uncached invocation of another registered node.
    pub fn call_with(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        self.engine.call_with(name, self.store, args)
    }
}
