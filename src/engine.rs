//! The narrow interface required from an external SAT engine.
//!
//! Nothing in this crate depends on how an engine searches; the query builder
//! and cube decider only consume the snapshots and cubes described here. Any
//! type implementing [`DecisionEngine`] can be bound by a
//! [`Solver`](crate::solver::Solver), including deterministic fakes in tests.

use core::fmt;
use std::hash::Hash;
use std::ops::Not;

use crate::error::Result;

// in-crate reference engine
pub mod dpll;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Sat,
    Unsat,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Status::Sat => "sat",
            Status::Unsat => "unsat",
            Status::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// An engine-native boolean term: the `true` sentinel, a boolean constant, or
/// a negation. Engines are expected to hand back negations of constants only,
/// but nothing stops a broken engine from nesting them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term<C> {
    True,
    Const(C),
    Not(Box<Term<C>>),
}

impl<C> Not for Term<C> {
    type Output = Self;
    fn not(self) -> Self::Output {
        Term::Not(Box::new(self))
    }
}

impl<C> Term<C> {
    pub fn is_true(&self) -> bool {
        matches!(self, Term::True)
    }
}

/// A lookahead branch condition: a conjunction of terms.
pub type Cube<C> = Vec<Term<C>>;

/// Search-budget controls handed to the engine unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverOptions {
    pub max_conflicts: u32,
    pub max_restarts: u32,
    pub lookahead_delta_fraction: Option<f32>,
}

impl SolverOptions {
    pub fn new(max_conflicts: u32, max_restarts: u32) -> Self {
        SolverOptions {
            max_conflicts,
            max_restarts,
            lookahead_delta_fraction: None,
        }
    }

    pub fn with_lookahead_delta_fraction(mut self, fraction: f32) -> Self {
        self.lookahead_delta_fraction = Some(fraction);
        self
    }
}

/// Extra parameters for cube generation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CubeParams {
    pub delta_fraction: Option<f32>,
}

pub trait DecisionEngine {
    /// The engine's boolean constant. Only structural equality and hashing
    /// are required, so it can key the reverse lookup of a [`VarMap`](crate::var_map::VarMap).
    type Const: Clone + Eq + Hash + fmt::Debug;
    type Cubes: Iterator<Item = Cube<Self::Const>>;

    fn configure(&mut self, opts: &SolverOptions);
    /// Registers a fresh boolean constant.
    fn mk_const(&mut self, name: &str) -> Self::Const;

    /// Asserts the disjunction of `clause` in the current scope.
    fn add(&mut self, clause: &[Term<Self::Const>]) -> Result<()>;
    fn push(&mut self);
    fn pop(&mut self);
    fn reset(&mut self);
    /// An independent copy of the engine, including its assertions.
    fn fork(&self) -> Self
    where
        Self: Sized;

    /// Propagation with zero search budget.
    fn propagate_only(&mut self) -> Status;
    fn check(&mut self, assumptions: &[Term<Self::Const>]) -> Result<Status>;
    /// Subset of the last check's assumptions sufficient for unsatisfiability.
    fn unsat_core(&self) -> Vec<Term<Self::Const>>;

    /// Literals forced at the root by the last propagation, up to the first
    /// conflict if it found one.
    fn units(&self) -> Vec<Term<Self::Const>>;
    /// Constants not forced by the last propagation.
    fn free_consts(&self) -> Vec<Self::Const>;

    /// Depth-1 lookahead cubes scored by the heuristic named `reward`.
    fn cubes(&mut self, reward: &str, params: &CubeParams) -> Self::Cubes;
}
