//! Exact treedepth of trees by the classical critical-list DP.
//!
//! Treedepth of a tree equals its minimum vertex ranking. Processing
//! vertices in reverse BFS order, each subtree keeps the ascending list of
//! its *visible* ranks: ranks not dominated by a strictly larger rank on the
//! path to the subtree root. A parent's rank is the smallest integer that
//! exceeds every rank visible from two or more children and collides with no
//! visible rank; everything below it becomes dominated. The largest rank
//! ever assigned is never dominated, so it ends up visible at the root
//! together with the vertex that carries it, which is the witness root.

use crate::graph::SubGraph;

/// Returns `(treedepth, witness root as a global id)` for a tree.
///
/// The witness is a vertex admitting an elimination tree of exactly that
/// height, i.e. removing it leaves components of treedepth one less.
pub(crate) fn treedepth_tree(g: &SubGraph) -> (usize, u32) {
    let n = g.n();
    debug_assert!(n >= 1 && g.m() + 1 == n);
    if n == 1 {
        return (1, g.global(0));
    }

    let order = g.bfs_order(0);
    debug_assert_eq!(order.len(), n);
    let mut parent = vec![usize::MAX; n];
    for &v in &order {
        for &w in g.adj(v) {
            let w = w as usize;
            if parent[v] != w && parent[w] == usize::MAX && w != order[0] {
                parent[w] = v;
            }
        }
    }

    // lists[v]: visible (rank, vertex) pairs, ascending by rank.
    let mut lists: Vec<Vec<(u32, u32)>> = vec![Vec::new(); n];
    let mut merged: Vec<(u32, u32)> = Vec::new();
    for &v in order.iter().rev() {
        merged.clear();
        for &w in g.adj(v) {
            let w = w as usize;
            if parent[w] == v {
                merged.append(&mut lists[w]);
            }
        }
        merged.sort_unstable();

        // Ranks seen in two or more children force the parent rank above
        // them; within each child the ranks are distinct.
        let mut max_dup = 0;
        for pair in merged.windows(2) {
            if pair[0].0 == pair[1].0 {
                max_dup = pair[1].0;
            }
        }
        let mut rank = max_dup + 1;
        for &(q, _) in merged.iter() {
            if q < rank {
                continue;
            }
            if q == rank {
                rank += 1;
            } else {
                break;
            }
        }

        let mut list = Vec::with_capacity(1 + merged.len());
        list.push((rank, v as u32));
        list.extend(merged.iter().copied().filter(|&(q, _)| q > rank));
        lists[v] = list;
    }

    let &(td, vert) = lists[order[0]].last().expect("root list is nonempty");
    (td as usize, g.global(vert as usize))
}
