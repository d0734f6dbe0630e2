//! Registration and lookup of calc nodes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use petgraph::stable_graph::StableDiGraph;
use tracing::debug;

use super::closure::{self, DependencyClosure};
use super::node::{CalcNode, NodeId, NodeSpec};
use super::GraphError;
use crate::variables::VariableDefaults;

/// The set of registered calc functions and their declared child edges.
///
/// Registration is append-only and children must already be registered, so
/// the declared graph cannot acquire a cycle through this API; the closure
/// walk still fails fast on one rather than trusting that. The registry is
/// built mutably at startup and then shared read-only behind an `Arc`.
pub struct Registry {
    defaults: Arc<VariableDefaults>,
    graph: StableDiGraph<CalcNode, ()>,
    by_name: HashMap<String, NodeId>,
    closures: Mutex<HashMap<NodeId, Arc<DependencyClosure>>>,
}

impl Registry {
    pub fn new(defaults: Arc<VariableDefaults>) -> Self {
        Self {
            defaults,
            graph: StableDiGraph::new(),
            by_name: HashMap::new(),
            closures: Mutex::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &Arc<VariableDefaults> {
        &self.defaults
    }

    /// Registers one calc function with its declared dependencies.
    ///
    /// Declared variable names are validated against the default set here,
    /// at registration time, never at query time. Declared children are
    /// resolved by name and must already be registered.
    pub fn register(&mut self, spec: NodeSpec) -> Result<NodeId, GraphError> {
        if self.by_name.contains_key(&spec.name) {
            return Err(GraphError::DuplicateNode { name: spec.name });
        }
        for variable in &spec.variables {
            self.defaults.get(variable)?;
        }
        let mut children = Vec::with_capacity(spec.children.len());
        for child in &spec.children {
            let id = self
                .by_name
                .get(child)
                .copied()
                .ok_or_else(|| GraphError::UnknownChild {
                    parent: spec.name.clone(),
                    child: child.clone(),
                })?;
            children.push(id);
        }

        let name = spec.name.clone();
        let id = self.graph.add_node(CalcNode::from_spec(spec));
        for child in children {
            self.graph.add_edge(id, child, ());
        }
        self.by_name.insert(name.clone(), id);
        debug!(node = %name, "calc node registered");
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Result<NodeId, GraphError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode { name: name.to_string() })
    }

    pub(crate) fn node(&self, id: NodeId) -> &CalcNode {
        &self.graph[id]
    }

    /// Transitive dependency closure of `id`, memoized per node.
    pub fn closure(&self, id: NodeId) -> Result<Arc<DependencyClosure>, GraphError> {
        if let Some(cached) = self.closures.lock().get(&id) {
            return Ok(cached.clone());
        }
        let computed = Arc::new(closure::compute(&self.graph, id)?);
        self.closures.lock().insert(id, computed.clone());
        Ok(computed)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
