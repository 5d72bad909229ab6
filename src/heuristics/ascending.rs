use crate::heuristics::*;
use log::trace;

/// Branches on the lowest-index unassigned variable, positive first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascending;

impl Heuristics for Ascending {
    fn name(&self) -> &'static str {
        "ascending"
    }

    fn decide(&self, state: &SearchState) -> Option<Literal> {
        let l = state.unassigned().next().map(Literal::positive);
        trace!(target: "heuristics", "Ascending: decide {:?}", l);
        l
    }
}
