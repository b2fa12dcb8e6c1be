//! Enumerates the minimal separators of a connected subgraph as a batched
//! pull stream.
//!
//! Seeding and expansion follow the close-separator scheme: for every vertex
//! `v`, the neighborhood of each component of `G \ N[v]` is a minimal
//! separator; and expanding a known separator `S` by each `x in S` (taking
//! neighborhoods of the components of `G \ (S ∪ N(x))`) eventually reaches
//! every minimal separator. Discovered separators are deduplicated in an
//! insertion-ordered set; one cursor walks it for expansion and another for
//! emission, so each separator is produced exactly once and the stream is
//! deterministic.

use indexmap::IndexSet;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;

use crate::graph::SubGraph;

type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

pub(crate) struct SeparatorGenerator<'a> {
    graph: &'a SubGraph,
    /// Separators as sorted local-index words, in discovery order.
    found: FxIndexSet<Box<[u32]>>,
    expanded: usize,
    emitted: usize,
    blocked: Vec<bool>,
    stack: Vec<usize>,
}

impl<'a> SeparatorGenerator<'a> {
    pub(crate) fn new(graph: &'a SubGraph) -> SeparatorGenerator<'a> {
        let n = graph.n();
        let mut gen = SeparatorGenerator {
            graph,
            found: FxIndexSet::default(),
            expanded: 0,
            emitted: 0,
            blocked: vec![false; n],
            stack: Vec::new(),
        };
        for v in 0..n {
            gen.blocked[v] = true;
            for &w in graph.adj(v) {
                gen.blocked[w as usize] = true;
            }
            gen.collect_close_separators();
            gen.blocked.iter_mut().for_each(|b| *b = false);
        }
        gen
    }

    /// Whether the stream still has separators to emit or candidates to
    /// expand.
    pub(crate) fn has_next(&self) -> bool {
        self.emitted < self.found.len() || self.expanded < self.found.len()
    }

    /// Produces up to `batch` separators not emitted before, expanding known
    /// separators on demand. An empty batch means the enumeration is
    /// complete.
    pub(crate) fn next(&mut self, batch: usize) -> Vec<Vec<u32>> {
        while self.found.len() - self.emitted < batch && self.expanded < self.found.len() {
            self.expand(self.expanded);
            self.expanded += 1;
        }
        let end = self.found.len().min(self.emitted + batch);
        let out = (self.emitted..end)
            .map(|i| self.found[i].to_vec())
            .collect();
        self.emitted = end;
        out
    }

    fn expand(&mut self, idx: usize) {
        let graph = self.graph;
        let sep: Vec<u32> = self.found[idx].to_vec();
        for &x in &sep {
            for &v in &sep {
                self.blocked[v as usize] = true;
            }
            for &w in graph.adj(x as usize) {
                self.blocked[w as usize] = true;
            }
            self.collect_close_separators();
            self.blocked.iter_mut().for_each(|b| *b = false);
        }
    }

    /// For each component of the unblocked vertices, records its neighborhood
    /// as a separator. A blocked vertex may border several components and
    /// then belongs to each of their separators.
    fn collect_close_separators(&mut self) {
        let graph = self.graph;
        let n = graph.n();
        let mut visited = self.blocked.clone();
        let mut in_sep = vec![false; n];
        for root in 0..n {
            if visited[root] {
                continue;
            }
            let mut sep: Vec<u32> = Vec::new();
            visited[root] = true;
            self.stack.push(root);
            while let Some(v) = self.stack.pop() {
                for &w in graph.adj(v) {
                    let wu = w as usize;
                    if self.blocked[wu] {
                        if !in_sep[wu] {
                            in_sep[wu] = true;
                            sep.push(w);
                        }
                    } else if !visited[wu] {
                        visited[wu] = true;
                        self.stack.push(wu);
                    }
                }
            }
            for &w in &sep {
                in_sep[w as usize] = false;
            }
            if !sep.is_empty() {
                sep.sort_unstable();
                self.found.insert(sep.into_boxed_slice());
            }
        }
    }
}
