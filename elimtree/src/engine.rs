//! The branch-and-bound driver: trivial bounds, exact shape shortcuts,
//! k-core reduction, cache seeding, separator branching, and witness
//! reconstruction.
//!
//! `calculate` works inside a caller-provided bound window
//! `[search_lbnd, search_ubnd]`: the caller promises it stops caring once the
//! lower bound reaches `search_ubnd` or the upper bound drops to
//! `search_lbnd`, which lets sibling components prune each other the way
//! alpha-beta does. Every proven bound is written into the set-trie before
//! returning, so the cache plus the stored witness roots *are* the
//! decomposition.

use std::io::Write;
use std::time::{Duration, Instant};

use log::{debug, info};
use ordered_float::NotNan;
use petgraph::stable_graph::StableDiGraph;

use crate::exact::ExactCache;
use crate::graph::{Graph, SubGraph};
use crate::separator::SeparatorGenerator;
use crate::set_trie::{Bounds, NodeId, SetTrie};
use crate::tree::treedepth_tree;
use crate::Error;

/// Tuning knobs for the search. All defaults are usable as-is.
#[derive(Clone, Debug)]
pub struct Config {
    /// Wall-clock budget; `None` means unlimited. Overrun surfaces as
    /// [`Error::TimeLimitExceeded`].
    pub time_limit: Option<Duration>,
    /// Maximum gap for subset inheritance during cache seeding. `0` disables
    /// it.
    pub subset_gap: usize,
    /// Graphs with at most this many vertices go through the
    /// isomorphism-keyed exact store.
    pub small_n: usize,
    /// Batch size for the separator generator.
    pub separator_batch: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            time_limit: None,
            subset_gap: usize::MAX,
            small_n: 10,
            separator_batch: 100_000,
        }
    }
}

/// An elimination forest of minimum height for the input graph.
pub struct Decomposition {
    /// The treedepth: the number of vertices on the longest root-to-leaf
    /// path.
    pub depth: usize,
    /// `parent[v]` is the global id of `v`'s parent, `None` for a root.
    pub parent: Vec<Option<u32>>,
}

impl Decomposition {
    /// The forest as a petgraph DAG; node weights are global ids, edges point
    /// from parent to child.
    pub fn forest(&self) -> StableDiGraph<u32, ()> {
        let mut dag = StableDiGraph::new();
        let idx: Vec<_> = (0..self.parent.len())
            .map(|v| dag.add_node(v as u32))
            .collect();
        for (v, p) in self.parent.iter().enumerate() {
            if let Some(p) = p {
                dag.add_edge(idx[*p as usize], idx[v], ());
            }
        }
        dag
    }

    /// Number of vertices on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut best = 0;
        for v in 0..self.parent.len() {
            let mut len = 0;
            let mut cur = Some(v as u32);
            while let Some(c) = cur {
                len += 1;
                cur = self.parent[c as usize];
            }
            best = best.max(len);
        }
        best
    }

    /// Checks the forest against the input graph: acyclic, every edge joins
    /// an ancestor-descendant pair, and the height matches `depth`.
    pub fn is_valid_for(&self, g: &Graph) -> bool {
        fn is_ancestor(parent: &[Option<u32>], a: usize, b: usize) -> bool {
            let mut cur = Some(b as u32);
            while let Some(c) = cur {
                if c as usize == a {
                    return true;
                }
                cur = parent[c as usize];
            }
            false
        }
        if self.parent.len() != g.n() {
            return false;
        }
        if petgraph::algo::is_cyclic_directed(&self.forest()) {
            return false;
        }
        if self.height() != self.depth {
            return false;
        }
        for v in 0..g.n() {
            for &w in g.adj(v) {
                let w = w as usize;
                if v < w
                    && !is_ancestor(&self.parent, v, w)
                    && !is_ancestor(&self.parent, w, v)
                {
                    return false;
                }
            }
        }
        true
    }

    /// Writes the output format: the treedepth, then one line per vertex with
    /// the 1-based parent index (`0` for a root).
    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "{}", self.depth)?;
        for p in &self.parent {
            match p {
                None => writeln!(out, "0")?,
                Some(p) => writeln!(out, "{}", p + 1)?,
            }
        }
        Ok(())
    }
}

/// Running state of one separator-branching phase of `calculate`.
struct SepState {
    id: NodeId,
    search_lbnd: usize,
    search_ubnd: usize,
    lower: usize,
    upper: usize,
    new_lower: usize,
    store_best: bool,
}

/// The treedepth engine. Owns the bound cache, the exact small-graph store,
/// and the deadline; holds no global state, so independent engines never
/// interfere.
pub struct Engine {
    cfg: Config,
    cache: SetTrie,
    exact: ExactCache,
    deadline: Option<Instant>,
    /// Separators that realized a best-known upper bound, as global-id words,
    /// kept for retry in enclosing calls.
    best_seps: Vec<Vec<u32>>,
}

impl Engine {
    pub fn new(cfg: Config) -> Engine {
        Engine {
            cfg,
            cache: SetTrie::new(),
            exact: ExactCache::default(),
            deadline: None,
            best_seps: Vec::new(),
        }
    }

    /// Computes the exact treedepth of a connected graph and a witnessing
    /// elimination tree.
    pub fn compute(&mut self, graph: &Graph) -> Result<Decomposition, Error> {
        let g = graph.as_subgraph();
        if g.n() == 0 {
            return Err(Error::MalformedInput("empty graph".into()));
        }
        if !g.is_connected() {
            return Err(Error::Disconnected);
        }
        self.cache = SetTrie::new();
        self.best_seps.clear();
        self.deadline = self.cfg.time_limit.map(|l| Instant::now() + l);

        let start = Instant::now();
        let (lower, upper) = self.calculate(&g, 1, g.n(), false)?;
        debug_assert_eq!(lower, upper);
        debug!(
            "bounds [{lower}, {upper}] proven with {} cached subgraphs, exact-store hit ratio {:.2}",
            self.cache.len(),
            self.exact.hit_ratio()
        );

        let mut parent = vec![None; g.n()];
        self.reconstruct(&g, None, &mut parent, upper)?;
        info!("treedepth {} found in {:?}", upper, start.elapsed());
        Ok(Decomposition {
            depth: upper,
            parent,
        })
    }

    fn check_deadline(&self) -> Result<(), Error> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::TimeLimitExceeded);
            }
        }
        Ok(())
    }

    /// Overwrites the record for `id` and echoes the bounds, for the exact
    /// short-circuit paths.
    fn cache_update(&mut self, id: NodeId, lower: usize, upper: usize, root: u32) -> (usize, usize) {
        *self.cache.bounds_mut(id) = Bounds {
            lower,
            upper,
            root: Some(root),
        };
        (lower, upper)
    }

    /// Final bookkeeping on the general-search exits: resolved small graphs
    /// feed the exact store.
    fn finish(&mut self, g: &SubGraph, id: NodeId, lower: usize, upper: usize) -> (usize, usize) {
        if lower == upper && g.n() <= self.cfg.small_n {
            if let Some(root) = self.cache.bounds(id).root {
                if let Some(local) = g.local(root) {
                    self.exact.insert(g.adj_lists().to_vec(), upper, local);
                }
            }
        }
        (lower, upper)
    }

    /// Proves treedepth bounds for a connected subgraph inside the caller's
    /// window. Returns `(lower, upper)` with `lower <= td <= upper`; the
    /// cache entry for `g` is present and consistent on every exit. With
    /// `store_best`, separators realizing the best upper bound are kept for
    /// the caller to retry.
    fn calculate(
        &mut self,
        g: &SubGraph,
        search_lbnd: usize,
        search_ubnd: usize,
        store_best: bool,
    ) -> Result<(usize, usize), Error> {
        let mark = self.best_seps.len();
        let res = self.calculate_inner(g, search_lbnd, search_ubnd, store_best, mark);
        if !store_best {
            self.best_seps.truncate(mark);
        }
        res
    }

    fn calculate_inner(
        &mut self,
        g: &SubGraph,
        search_lbnd: usize,
        search_ubnd: usize,
        store_best: bool,
        mark: usize,
    ) -> Result<(usize, usize), Error> {
        self.check_deadline()?;
        let n = g.n();
        debug_assert!(n >= 1);

        let mut lower = (g.m() / n + 1).max(g.min_degree() + 1);
        let mut upper = n;

        let (id, inserted) = self.cache.insert(g.globals());
        if inserted {
            *self.cache.bounds_mut(id) = Bounds {
                lower,
                upper,
                root: Some(g.global(0)),
            };
        } else {
            let b = self.cache.bounds(id);
            lower = lower.max(b.lower);
            upper = upper.min(b.upper);
            let b = self.cache.bounds_mut(id);
            b.lower = lower;
            b.upper = upper;
        }
        if search_ubnd <= lower || search_lbnd >= upper || lower == upper {
            return Ok((lower, upper));
        }

        // Shapes solved exactly in O(N + M).
        if g.is_complete() {
            return Ok(self.cache_update(id, n, n, g.global(0)));
        }
        if g.is_star() {
            let center = g.argmax_degree();
            return Ok(self.cache_update(id, 2, 2, g.global(center)));
        }
        if g.is_cycle() {
            let td = 1 + ceil_log2(n);
            return Ok(self.cache_update(id, td, td, g.global(0)));
        }
        if g.is_path() {
            let td = ceil_log2(n + 1);
            let mid = path_middle(g);
            return Ok(self.cache_update(id, td, td, g.global(mid)));
        }
        if g.is_tree() {
            let (td, root) = treedepth_tree(g);
            return Ok(self.cache_update(id, td, td, root));
        }
        if n <= self.cfg.small_n {
            if let Some((td, root)) = self.exact.lookup(g.adj_lists()) {
                return Ok(self.cache_update(id, td, td, g.global(root)));
            }
        }

        // Reduction through the (min_degree + 1)-core.
        let k = g.min_degree();
        let cores = g.k_core(k + 1);
        let reduced = !(cores.len() == 1 && cores[0].n() == n);
        if cores.is_empty() {
            // The whole graph peels away; branch once on a min-degree vertex.
            let v = (0..n).find(|&v| g.degree(v) == k).expect("degree k vertex");
            let search_ubnd_v = upper.min(search_ubnd) - 1;
            let mut search_lbnd_v = search_lbnd.saturating_sub(1).max(1);
            let mut upper_v = 0;
            let mut lower_v = 0;
            let mut early_break = false;
            for h in g.without_vertex(v) {
                let (lower_h, upper_h) = self.calculate(&h, search_lbnd_v, search_ubnd_v, false)?;
                upper_v = upper_v.max(upper_h);
                lower_v = lower_v.max(lower_h);
                search_lbnd_v = search_lbnd_v.max(lower_h);
                if lower_h >= search_ubnd_v {
                    early_break = true;
                    break;
                }
            }
            lower = lower.max(lower_v);
            if !early_break && upper_v + 1 < upper {
                upper = upper_v + 1;
                self.cache_update(id, lower, upper, g.global(v));
            } else {
                self.cache.bounds_mut(id).lower = lower;
            }
            if search_ubnd <= lower || search_lbnd >= upper || lower == upper {
                return Ok(self.finish(g, id, lower, upper));
            }
        } else if reduced {
            // Solving the core bounds the whole graph: peeling the
            // (N - |H|) non-core vertices costs one level each.
            for h in &cores {
                let (lower_h, upper_h) =
                    self.calculate(h, lower.max(search_lbnd), upper.min(search_ubnd), true)?;
                lower = lower.max(lower_h);
                let peel = n - h.n();
                if upper_h + peel < upper {
                    upper = upper_h + peel;
                    let v = (0..n).find(|&v| g.degree(v) == k).expect("degree k vertex");
                    self.cache_update(id, lower, upper, g.global(v));
                } else {
                    self.cache.bounds_mut(id).lower = lower;
                }
                if search_ubnd <= lower || search_lbnd >= upper || lower == upper {
                    return Ok(self.finish(g, id, lower, upper));
                }
            }
        }

        // One-time seeding of a fresh entry with cheap bounds.
        if inserted {
            let heuristic = self.upper_heuristic(g);
            if heuristic < upper {
                upper = heuristic;
                self.cache_update(id, lower, upper, g.global(g.argmax_degree()));
            }
            if self.cfg.subset_gap > 0 {
                for sub in self.cache.big_subsets(g.globals(), self.cfg.subset_gap) {
                    if sub == id {
                        continue;
                    }
                    let b = *self.cache.bounds(sub);
                    let gap = n - self.cache.depth(sub);
                    lower = lower.max(b.lower);
                    if b.upper + gap < upper {
                        upper = b.upper + gap;
                        let word = self.cache.word(sub);
                        let root = first_missing(g.globals(), &word);
                        self.cache_update(id, lower, upper, root);
                    }
                }
            }
            let spanning = g.dfs_tree(g.argmax_degree());
            let (tree_lower, _) = treedepth_tree(&spanning);
            lower = lower.max(tree_lower);
            self.cache.bounds_mut(id).lower = lower;
            if search_ubnd <= lower || search_lbnd >= upper || lower == upper {
                return Ok(self.finish(g, id, lower, upper));
            }
        }

        // Branch on minimal separators.
        let mut st = SepState {
            id,
            search_lbnd,
            search_ubnd,
            lower,
            upper,
            new_lower: n,
            store_best,
        };
        let inherited: Vec<Vec<u32>> = self.best_seps[mark..].to_vec();
        for sep_global in inherited {
            let locals: Option<Vec<u32>> = sep_global
                .iter()
                .map(|&x| g.local(x).map(|l| l as u32))
                .collect();
            let Some(locals) = locals else { continue };
            if locals.is_empty() || locals.len() >= n {
                continue;
            }
            self.separator_iteration(g, &locals, &mut st)?;
            if st.upper <= st.search_lbnd || st.lower >= st.search_ubnd || st.lower == st.upper {
                return Ok(self.finish(g, id, st.lower, st.upper));
            }
        }
        let mut generator = SeparatorGenerator::new(g);
        while generator.has_next() {
            self.check_deadline()?;
            let mut batch = generator.next(self.cfg.separator_batch.max(1));
            // Cheapest first: separators whose largest remaining component is
            // sparsest.
            batch.sort_by_cached_key(|sep| largest_component_density(g, sep));
            for (i, sep) in batch.iter().enumerate() {
                if i % 64 == 63 {
                    self.check_deadline()?;
                }
                self.separator_iteration(g, sep, &mut st)?;
                if st.upper <= st.search_lbnd || st.lower >= st.search_ubnd || st.lower == st.upper
                {
                    return Ok(self.finish(g, id, st.lower, st.upper));
                }
            }
        }
        // The enumeration is exhaustive, so the smallest bound seen across
        // all separators is a true lower bound.
        let lower = st.lower.max(st.new_lower);
        let b = self.cache.bounds_mut(id);
        b.lower = b.lower.max(lower);
        Ok(self.finish(g, id, lower, st.upper))
    }

    /// Tries one separator: solves the components of `G \ S` inside the
    /// shifted window, improves the upper bound (and the cache chain) on
    /// success, and folds the result into the running lower-bound candidate.
    fn separator_iteration(
        &mut self,
        g: &SubGraph,
        sep: &[u32],
        st: &mut SepState,
    ) -> Result<(), Error> {
        let s = sep.len();
        debug_assert!(s >= 1);
        let sep_ubnd = st.search_ubnd.min(st.upper).saturating_sub(s).max(1);
        let mut sep_lbnd = st.search_lbnd.max(st.lower).saturating_sub(s).max(1);

        let mut comps = g.without_vertices(sep);
        if comps.is_empty() {
            return Ok(());
        }
        // A density bound on the largest piece may already rule out both an
        // upper improvement and a lower-bound contribution.
        let biggest = comps.iter().max_by_key(|h| h.n()).expect("nonempty");
        let trivial = biggest.m() / biggest.n() + 1;
        if trivial + s >= st.new_lower && trivial + s >= st.upper {
            return Ok(());
        }

        comps.sort_by_cached_key(|h| {
            std::cmp::Reverse(NotNan::new(h.m() as f64 / h.n() as f64).expect("finite density"))
        });

        let mut upper_sep = 0;
        let mut lower_sep = 0;
        let mut early_break = false;
        for h in &comps {
            let (lower_h, upper_h) = self.calculate(h, sep_lbnd, sep_ubnd, false)?;
            upper_sep = upper_sep.max(upper_h);
            lower_sep = lower_sep.max(lower_h);
            sep_lbnd = sep_lbnd.max(lower_h);
            if lower_h >= sep_ubnd {
                early_break = true;
                break;
            }
        }

        if !early_break && upper_sep + s < st.upper {
            st.upper = upper_sep + s;
            let root = g.global(sep[0] as usize);
            let b = self.cache.bounds_mut(st.id);
            b.upper = st.upper;
            b.root = Some(root);
            self.inline_chain(g, sep, st.upper, st.lower);
        }
        if st.store_best && !early_break && upper_sep + s == st.upper {
            self.best_seps
                .push(sep.iter().map(|&v| g.global(v as usize)).collect());
        }
        st.new_lower = st.new_lower.min(lower_sep + s);
        if lower_sep > st.lower {
            st.lower = lower_sep;
            self.cache.bounds_mut(st.id).lower = lower_sep;
        }
        Ok(())
    }

    /// After a separator improved the upper bound, inserts the subgraphs
    /// along the witness chain `S[0], S[1], ...` into the cache so that
    /// reconstruction never has to re-search them. Walks down while removing
    /// separator vertices keeps a unique non-trivial component.
    fn inline_chain(&mut self, g: &SubGraph, sep: &[u32], new_upper: usize, lower: usize) {
        let mut cur = g.clone();
        for i in 1..sep.len() {
            let removed = g.global(sep[i - 1] as usize);
            let Some(local) = cur.local(removed) else {
                break;
            };
            let mut nontrivial = cur
                .without_vertex(local)
                .into_iter()
                .filter(|c| c.n() > 1);
            let Some(next) = nontrivial.next() else {
                break;
            };
            if nontrivial.next().is_some() {
                break;
            }
            cur = next;
            let root = g.global(sep[i] as usize);
            if cur.local(root).is_none() {
                break;
            }
            let (id, _) = self.cache.insert(cur.globals());
            let b = self.cache.bounds_mut(id);
            b.lower = b.lower.max(lower.saturating_sub(i).max(1));
            let upper = (new_upper - i).min(cur.n());
            if upper < b.upper || b.root.is_none() {
                b.upper = b.upper.min(upper);
                b.root = Some(root);
            }
        }
    }

    /// Cheap upper bound: root at a max-degree vertex, recurse on the
    /// components. Does not touch the cache.
    fn upper_heuristic(&self, g: &SubGraph) -> usize {
        if g.n() <= 1 {
            return g.n();
        }
        let v = g.argmax_degree();
        1 + g
            .without_vertex(v)
            .iter()
            .map(|h| self.upper_heuristic(h))
            .max()
            .unwrap_or(0)
    }

    /// Emits the witness rooted at the cached entry of `g` into `out`,
    /// re-searching with the remaining depth budget whenever an entry is
    /// missing or its witness is too tall.
    fn reconstruct(
        &mut self,
        g: &SubGraph,
        parent: Option<u32>,
        out: &mut [Option<u32>],
        budget: usize,
    ) -> Result<(), Error> {
        debug_assert!(g.n() >= 1);
        let cached = self
            .cache
            .search(g.globals())
            .filter(|&id| self.cache.bounds(id).upper <= budget);
        let id = match cached {
            Some(id) => id,
            None => {
                self.calculate(g, budget, g.n(), false)?;
                self.cache
                    .search(g.globals())
                    .expect("calculate caches its argument")
            }
        };
        let b = *self.cache.bounds(id);
        debug_assert!(b.upper <= budget);
        let root = b.root.expect("cached entries carry a witness root");
        out[root as usize] = parent;
        let local = g.local(root).expect("witness root lies in its subgraph");
        for h in g.without_vertex(local) {
            self.reconstruct(&h, Some(root), out, budget - 1)?;
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new(Config::default())
    }
}

/// `ceil(log2(x))` for `x >= 1`.
fn ceil_log2(x: usize) -> usize {
    (usize::BITS - (x - 1).leading_zeros()) as usize
}

/// The local index of the middle vertex of a path graph.
fn path_middle(g: &SubGraph) -> usize {
    let n = g.n();
    if n == 1 {
        return 0;
    }
    let mut prev = (0..n).find(|&v| g.degree(v) == 1).expect("path endpoint");
    let mut cur = g.adj(prev)[0] as usize;
    for _ in 1..n / 2 {
        let next = g
            .adj(cur)
            .iter()
            .map(|&w| w as usize)
            .find(|&w| w != prev)
            .expect("interior path vertex");
        prev = cur;
        cur = next;
    }
    cur
}

/// Lexicographically first element of `word` missing from `sub` (both
/// strictly increasing, `sub` a proper subsequence of `word`).
fn first_missing(word: &[u32], sub: &[u32]) -> u32 {
    let mut si = 0;
    for &x in word {
        if si < sub.len() && sub[si] == x {
            si += 1;
        } else {
            return x;
        }
    }
    unreachable!("sub is a proper subsequence of word")
}

/// Sort key for separator batches: edge density of the largest component
/// left after removing the separator.
fn largest_component_density(g: &SubGraph, sep: &[u32]) -> NotNan<f64> {
    let n = g.n();
    let mut blocked = vec![false; n];
    for &v in sep {
        blocked[v as usize] = true;
    }
    let mut visited = blocked.clone();
    let mut stack: Vec<usize> = Vec::new();
    let mut best = (0usize, 0usize);
    for root in 0..n {
        if visited[root] {
            continue;
        }
        let mut vertices = 0;
        let mut degree_sum = 0;
        visited[root] = true;
        stack.push(root);
        while let Some(v) = stack.pop() {
            vertices += 1;
            for &w in g.adj(v) {
                let w = w as usize;
                if !blocked[w] {
                    degree_sum += 1;
                    if !visited[w] {
                        visited[w] = true;
                        stack.push(w);
                    }
                }
            }
        }
        if vertices > best.0 {
            best = (vertices, degree_sum / 2);
        }
    }
    NotNan::new(best.1 as f64 / best.0.max(1) as f64).expect("finite density")
}
