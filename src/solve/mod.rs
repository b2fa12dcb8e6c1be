//! Interchangeable treedepth solving strategies.

use elimtree::{Config, Decomposition, Engine, Error, Graph};

pub mod naive;

pub use naive::Naive;

/// A strategy that computes an exact treedepth decomposition.
pub trait Solver {
    fn solve(&self, graph: &Graph) -> Result<Decomposition, Error>;

    fn boxed(self) -> Box<dyn Solver>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// The production solver: branch-and-bound over minimal separators with the
/// set-trie bound cache.
pub struct BranchAndBound {
    cfg: Config,
}

impl BranchAndBound {
    pub fn new(cfg: Config) -> BranchAndBound {
        BranchAndBound { cfg }
    }
}

impl Default for BranchAndBound {
    fn default() -> BranchAndBound {
        BranchAndBound::new(Config::default())
    }
}

impl Solver for BranchAndBound {
    fn solve(&self, graph: &Graph) -> Result<Decomposition, Error> {
        Engine::new(self.cfg.clone()).compute(graph)
    }
}
