//! Isomorphism-invariant graph fingerprints via iterative neighbor-hash
//! refinement, plus the mapping heuristic and its exact verification.
//!
//! The fingerprint is not a canonical certificate: equal hashes only make a
//! mapping *plausible*. Callers must verify a candidate mapping with
//! [`graph_isomorphism`] before trusting it.

/// The Boost `hash_combine` mixer.
#[inline]
fn combine(seed: &mut u32, value: u32) {
    *seed ^= value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// Computes `(graph_hash, per_vertex_hashes)` for an adjacency list.
///
/// Starts from degrees and refines for `n` rounds; each round rehashes every
/// vertex from its neighbors' previous hashes in ascending order, so the
/// result only depends on the isomorphism class of the graph.
pub(crate) fn graph_hash(adj: &[Vec<u32>]) -> (u32, Vec<u32>) {
    let n = adj.len();
    let mut hashes: Vec<u32> = adj.iter().map(|l| l.len() as u32).collect();
    let mut prev = vec![0u32; n];
    let mut nbr_hashes: Vec<u32> = Vec::new();
    for _ in 0..n {
        prev.copy_from_slice(&hashes);
        for v in 0..n {
            nbr_hashes.clear();
            nbr_hashes.extend(adj[v].iter().map(|&w| prev[w as usize]));
            nbr_hashes.sort_unstable();
            let mut seed = adj[v].len() as u32;
            for &h in &nbr_hashes {
                combine(&mut seed, h);
            }
            hashes[v] = seed;
        }
    }
    let mut sorted = hashes.clone();
    sorted.sort_unstable();
    let mut seed = n as u32;
    for &h in &sorted {
        combine(&mut seed, h);
    }
    (seed, hashes)
}

/// Pairs the vertices of two graphs positionally after sorting each side by
/// per-vertex hash. Returns `mapping[v1] = v2`, or `None` when the sizes,
/// fingerprints, or any paired degrees/hashes disagree.
pub(crate) fn isomorphism_mapping(a1: &[Vec<u32>], a2: &[Vec<u32>]) -> Option<Vec<usize>> {
    if a1.len() != a2.len() {
        return None;
    }
    let (h1, vh1) = graph_hash(a1);
    let (h2, vh2) = graph_hash(a2);
    if h1 != h2 {
        return None;
    }
    let mut order1: Vec<usize> = (0..a1.len()).collect();
    let mut order2 = order1.clone();
    order1.sort_by_key(|&v| vh1[v]);
    order2.sort_by_key(|&v| vh2[v]);

    let mut mapping = vec![0usize; a1.len()];
    for (&v1, &v2) in order1.iter().zip(&order2) {
        if a1[v1].len() != a2[v2].len() || vh1[v1] != vh2[v2] {
            return None;
        }
        mapping[v1] = v2;
    }
    Some(mapping)
}

/// Checks that `mapping` really carries `a1` onto `a2`: the image of every
/// neighborhood must equal the neighborhood of the image.
pub(crate) fn graph_isomorphism(a1: &[Vec<u32>], a2: &[Vec<u32>], mapping: &[usize]) -> bool {
    if a1.len() != a2.len() || a1.len() != mapping.len() {
        return false;
    }
    let mut image: Vec<u32> = Vec::new();
    let mut target: Vec<u32> = Vec::new();
    for (v1, nbrs) in a1.iter().enumerate() {
        let v2 = mapping[v1];
        image.clear();
        image.extend(nbrs.iter().map(|&w| mapping[w as usize] as u32));
        image.sort_unstable();
        target.clear();
        target.extend_from_slice(&a2[v2]);
        target.sort_unstable();
        if image != target {
            return false;
        }
    }
    true
}

/// The mapping heuristic followed by exact verification. `None` means the
/// heuristic produced nothing trustworthy; the graphs may still be
/// isomorphic.
pub(crate) fn verified_isomorphism(a1: &[Vec<u32>], a2: &[Vec<u32>]) -> Option<Vec<usize>> {
    let mapping = isomorphism_mapping(a1, a2)?;
    graph_isomorphism(a1, a2, &mapping).then_some(mapping)
}
