//! Branch-literal scoring for the reference engine.

use crate::sat_structures::*;

pub mod ascending;
pub mod dlis;

use ascending::Ascending;
use dlis::Dlis;

/// Read-only view of an engine's clauses and partial assignment.
pub struct SearchState<'a> {
    clauses: &'a [Clause],
    values: &'a [Option<bool>],
}

impl<'a> SearchState<'a> {
    /// `values[v]` is the value of variable `v`, `None` while unassigned.
    pub fn new(clauses: &'a [Clause], values: &'a [Option<bool>]) -> Self {
        SearchState { clauses, values }
    }

    pub fn clauses(&self) -> &'a [Clause] {
        self.clauses
    }

    pub fn value(&self, l: Literal) -> Option<bool> {
        self.values
            .get(l.var().idx() as usize)
            .copied()
            .flatten()
            .map(|v| v != l.sign())
    }

    pub fn is_satisfied(&self, clause: &[Literal]) -> bool {
        clause.iter().any(|l| self.value(*l) == Some(true))
    }

    pub fn unassigned(&self) -> impl Iterator<Item = Variable> + 'a {
        let values = self.values;
        (0..values.len() as u32)
            .filter(move |i| values[*i as usize].is_none())
            .map(Variable::at)
    }
}

pub trait Heuristics {
    fn name(&self) -> &'static str;
    /// Recommends the next literal to branch on, or `None` when there is
    /// nothing left worth branching on.
    fn decide(&self, state: &SearchState) -> Option<Literal>;
}

pub fn heuristic_by_name(name: &str) -> Option<Box<dyn Heuristics>> {
    match name {
        "ascending" => Some(Box::new(Ascending)),
        "dlis" => Some(Box::new(Dlis)),
        _ => None,
    }
}
