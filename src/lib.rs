//! Harness around the [`elimtree`] engine: a small `Solver` abstraction, an
//! exhaustive reference implementation for cross-checking, and the
//! command-line front end in `main.rs`.

pub mod solve;

pub use elimtree::{Config, Decomposition, Engine, Error, Graph};
