//! An isomorphism-keyed store of solved small graphs.
//!
//! Keys are graph fingerprints, which can collide, so every hit is verified
//! against the stored adjacency with a real isomorphism check before the
//! answer is trusted. A miss just means the general algorithm runs; once it
//! finishes, the solved instance is inserted for later isomorphic lookups.

use crate::hash::{graph_hash, verified_isomorphism};
use crate::HashMap;

struct StoredGraph {
    adj: Vec<Vec<u32>>,
    td: usize,
    root: usize,
}

#[derive(Default)]
pub(crate) struct ExactCache {
    entries: HashMap<(u32, usize), Vec<StoredGraph>>,
    hits: usize,
    misses: usize,
}

impl ExactCache {
    /// Looks up a graph by fingerprint and verified isomorphism. On a hit,
    /// returns its treedepth and the witness root translated into the local
    /// indices of `adj`.
    pub(crate) fn lookup(&mut self, adj: &[Vec<u32>]) -> Option<(usize, usize)> {
        let (fp, _) = graph_hash(adj);
        if let Some(bucket) = self.entries.get(&(fp, adj.len())) {
            for stored in bucket {
                if let Some(mapping) = verified_isomorphism(&stored.adj, adj) {
                    self.hits += 1;
                    return Some((stored.td, mapping[stored.root]));
                }
            }
        }
        self.misses += 1;
        None
    }

    /// Records a solved graph. `root` is a local index into `adj` witnessing
    /// the treedepth. Graphs already represented (up to isomorphism) are not
    /// duplicated.
    pub(crate) fn insert(&mut self, adj: Vec<Vec<u32>>, td: usize, root: usize) {
        let (fp, _) = graph_hash(&adj);
        let bucket = self.entries.entry((fp, adj.len())).or_default();
        if bucket
            .iter()
            .any(|stored| verified_isomorphism(&stored.adj, &adj).is_some())
        {
            return;
        }
        bucket.push(StoredGraph { adj, td, root });
    }

    /// The ratio of verified hits to total lookups.
    pub(crate) fn hit_ratio(&self) -> f64 {
        self.hits as f64 / (self.hits + self.misses).max(1) as f64
    }
}
