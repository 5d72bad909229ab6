//! Glue between a SAT decision engine and a learned branching model.
//!
//! A [`Problem`] is bound to a [`DecisionEngine`] by a [`Solver`], which can
//! reduce the problem under the engine's forced literals into a [`Query`] for
//! a prediction model, or turn the engine's depth-1 lookahead cubes into a
//! [`BranchOutcome`].

pub mod cube;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod parser;
pub mod profiler;
pub mod query;
pub mod sat_structures;
pub mod solver;
pub mod var_map;

pub use cube::{decide_cubes, BranchOutcome};
pub use engine::dpll::DpllEngine;
pub use engine::{CubeParams, DecisionEngine, SolverOptions, Status, Term};
pub use error::{Error, Result};
pub use query::{build_query, Query, UnitMask};
pub use sat_structures::{Clause, Literal, Polarity, Problem, Variable, MAX_VARS};
pub use solver::Solver;
