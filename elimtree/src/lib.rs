//! Exact treedepth of a connected graph, together with a witnessing
//! elimination tree.
//!
//! The search is a single-threaded branch-and-bound over minimal separators:
//! removing a separator splits the graph, the pieces are solved recursively
//! inside an alpha-beta-style bound window, and every proven bound is stored
//! in a set-trie keyed by the induced subgraph's sorted global vertex ids.
//! The stored witness roots double as the decomposition itself, which
//! [`Engine::compute`] reads back out as a parent array.

pub mod engine;
pub(crate) mod exact;
pub mod graph;
pub(crate) mod hash;
pub(crate) mod separator;
pub(crate) mod set_trie;
pub(crate) mod tree;

#[cfg(test)]
mod tests;

pub use engine::{Config, Decomposition, Engine};
pub use graph::{Graph, SubGraph};

use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<FxHasher>>;
type HashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<FxHasher>>;

/// Failures surfaced by graph loading and the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input text does not encode a valid `p tdp` instance.
    #[error("malformed input - {0}")]
    MalformedInput(String),

    /// The engine only handles connected graphs; callers must split a
    /// disconnected input into components first.
    #[error("the input graph is disconnected")]
    Disconnected,

    /// The configured wall-clock budget ran out. The cache keeps every bound
    /// proven so far, so a retry with a larger budget resumes useful work.
    #[error("time limit exceeded")]
    TimeLimitExceeded,
}
