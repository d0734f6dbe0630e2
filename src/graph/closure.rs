//! Transitive dependency closure over declared child edges.

use std::collections::{BTreeSet, HashMap};

use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;

use super::node::{CalcNode, NodeId};
use super::GraphError;

/// The transitive union, over a node and all its declared descendants, of
/// variable names and node identities.
///
/// Both sets are ordered so they feed straight into key derivation without
/// re-sorting. The declared graph is append-only, so a closure computed
/// once stays valid forever and the registry memoizes it per node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyClosure {
    /// Every variable name reachable from the node, its own included.
    pub variables: BTreeSet<String>,
    /// Qualified names of every reachable node, the node itself included.
    pub nodes: BTreeSet<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting, // on the DFS path, used for cycle detection
    Visited,
}

enum Frame {
    Enter(NodeId),
    Exit(NodeId),
}

/// Depth-first walk over declared child edges.
///
/// A node reachable via multiple paths is united idempotently. Reaching a
/// node that is still on the current path means the declared graph has a
/// cycle; the walk fails fast instead of recursing forever.
pub(crate) fn compute(
    graph: &StableDiGraph<CalcNode, ()>,
    start: NodeId,
) -> Result<DependencyClosure, GraphError> {
    let mut closure = DependencyClosure::default();
    let mut states: HashMap<NodeId, VisitState> = HashMap::new();
    let mut stack: SmallVec<[Frame; 16]> = SmallVec::new();
    stack.push(Frame::Enter(start));

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(id) => {
                match states.get(&id) {
                    Some(VisitState::Visited) => continue,
                    Some(VisitState::Visiting) => {
                        return Err(GraphError::CyclicDependency {
                            name: graph[id].name().to_string(),
                        });
                    }
                    None => {}
                }
                states.insert(id, VisitState::Visiting);

                let node = &graph[id];
                closure.nodes.insert(node.name().to_string());
                closure
                    .variables
                    .extend(node.variables().iter().cloned());

                stack.push(Frame::Exit(id));
                for child in graph.neighbors(id) {
                    stack.push(Frame::Enter(child));
                }
            }
            Frame::Exit(id) => {
                states.insert(id, VisitState::Visited);
            }
        }
    }

    Ok(closure)
}
