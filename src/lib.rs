//! Dependency-tracked memoization core for the ghgdash scenario
//! dashboard.
//!
//! Calc functions register with the [`Registry`], declaring the scenario
//! variables, datasets, and other calc functions they depend on; nothing
//! is inferred from function bodies. The [`Engine`] memoizes
//! zero-argument "root queries": it derives a cache key from the node's
//! transitive dependency closure and the current variable values, so a
//! cached result is reused exactly until some variable or declared
//! dependency it transitively reads changes. Scenario variables resolve
//! through [`VariableStore`]'s scope chain (override stack → session →
//! defaults), datasets load at most once per process through
//! [`DatasetCache`], and results live in a pluggable TTL [`ResultCache`].
//!
//! All lifetimes are constructor-injected and `Arc`-shared; the crate has
//! no process-global state, so several logical "processes" can coexist in
//! one address space (tests, embedded hosts, concurrent request
//! contexts).

pub mod cache;
pub mod datasets;
pub mod engine;
pub mod graph;
mod hash;
pub mod variables;

pub use cache::{MemoryCache, ResultCache};
pub use datasets::{Dataset, DatasetCache, DatasetError, DatasetLoader};
pub use engine::{Engine, EvalError, Invocation, DEFAULT_RESULT_TTL};
pub use graph::{CalcNode, DependencyClosure, GraphError, NodeId, NodeSpec, Registry};
pub use variables::{
    Session, ValueKind, VariableDefaults, VariableError, VariableStore,
};
