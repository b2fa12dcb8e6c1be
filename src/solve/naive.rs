//! An exhaustive reference solver.
//!
//! Tries every vertex as root of every induced subgraph, memoized on the
//! canonical word. Exponential, but exact and simple enough to trust, which
//! makes it the cross-check oracle for the branch-and-bound engine on small
//! instances.

use std::collections::HashMap;

use elimtree::{Decomposition, Error, Graph, SubGraph};

use super::Solver;

pub struct Naive;

impl Solver for Naive {
    fn solve(&self, graph: &Graph) -> Result<Decomposition, Error> {
        let g = graph.as_subgraph();
        if g.n() == 0 {
            return Err(Error::MalformedInput("empty graph".into()));
        }
        if !g.is_connected() {
            return Err(Error::Disconnected);
        }
        let mut memo = HashMap::new();
        let depth = treedepth(&g, &mut memo);
        let mut parent = vec![None; g.n()];
        assign(&g, None, &memo, &mut parent);
        Ok(Decomposition { depth, parent })
    }
}

/// `td(G) = 1 + min over roots v of max over components of G \ v`, memoized
/// per induced subgraph together with an optimal root.
fn treedepth(g: &SubGraph, memo: &mut HashMap<Vec<u32>, (usize, u32)>) -> usize {
    if g.n() == 1 {
        return 1;
    }
    if let Some(&(td, _)) = memo.get(g.globals()) {
        return td;
    }
    let mut best = (g.n() + 1, 0);
    for v in 0..g.n() {
        let mut worst = 0;
        for h in g.without_vertex(v) {
            worst = worst.max(treedepth(&h, memo));
        }
        if 1 + worst < best.0 {
            best = (1 + worst, g.global(v));
        }
    }
    memo.insert(g.globals().to_vec(), best);
    best.0
}

fn assign(
    g: &SubGraph,
    parent: Option<u32>,
    memo: &HashMap<Vec<u32>, (usize, u32)>,
    out: &mut [Option<u32>],
) {
    if g.n() == 1 {
        out[g.global(0) as usize] = parent;
        return;
    }
    let (_, root) = memo[g.globals()];
    out[root as usize] = parent;
    let local = g.local(root).expect("memoized root lies in its subgraph");
    for h in g.without_vertex(local) {
        assign(&h, Some(root), memo, out);
    }
}
