use crate::heuristics::*;
use log::trace;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Dynamic largest individual sum: the unassigned literal occurring most
/// often in clauses that are not yet satisfied. Ties go to the smaller
/// literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dlis;

impl Dlis {
    pub fn literal_frequency(state: &SearchState) -> BTreeMap<Literal, u64> {
        let mut literal_frequency = BTreeMap::<Literal, u64>::new();
        for clause in state.clauses().iter().filter(|c| !state.is_satisfied(c)) {
            for l in clause.iter().filter(|l| state.value(**l).is_none()) {
                *literal_frequency.entry(*l).or_insert(0) += 1;
            }
        }
        literal_frequency
    }
}

impl Heuristics for Dlis {
    fn name(&self) -> &'static str {
        "dlis"
    }

    fn decide(&self, state: &SearchState) -> Option<Literal> {
        let l = Dlis::literal_frequency(state)
            .into_iter()
            .max_by_key(|(l, frequency)| (*frequency, Reverse(*l)))
            .map(|(l, _)| l);
        trace!(target: "heuristics", "DLIS: decide {:?}", l);
        l
    }
}
