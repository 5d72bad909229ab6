use core::fmt;
use std::time::{Duration, Instant};

use crate::cube::BranchOutcome;

#[derive(Debug, Clone)]
pub struct SolverProfiler {
    // counters
    propagations: u64,
    checks: u64,
    queries: u64,
    cube_calls: u64,
    unsat_cubes: u64,
    sat_cubes: u64,
    failed_literals: u64,
    splits: u64,

    // timers
    duration: Duration,
    start_time: Instant,
}

impl SolverProfiler {
    pub fn new() -> SolverProfiler {
        SolverProfiler {
            propagations: 0,
            checks: 0,
            queries: 0,
            cube_calls: 0,
            unsat_cubes: 0,
            sat_cubes: 0,
            failed_literals: 0,
            splits: 0,
            start_time: Instant::now(),
            duration: Duration::new(0, 0),
        }
    }
    pub fn reset_start_time(&mut self) {
        self.start_time = Instant::now();
    }
    pub fn calc_duration_till_now(&mut self) {
        self.duration = Instant::now().duration_since(self.start_time);
    }
    pub fn duration(&self) -> Duration {
        self.duration
    }
    pub fn bump_propagations(&mut self) {
        self.propagations += 1;
    }
    pub fn bump_checks(&mut self) {
        self.checks += 1;
    }
    pub fn bump_queries(&mut self) {
        self.queries += 1;
    }
    pub fn record_cube(&mut self, outcome: &BranchOutcome) {
        self.cube_calls += 1;
        match outcome {
            BranchOutcome::Unsat => self.unsat_cubes += 1,
            BranchOutcome::SatTrivial => self.sat_cubes += 1,
            BranchOutcome::FailedLiteral(_) => self.failed_literals += 1,
            BranchOutcome::Split(..) => self.splits += 1,
        }
    }
    pub fn checks(&self) -> u64 {
        self.checks
    }
    pub fn queries(&self) -> u64 {
        self.queries
    }
    pub fn cube_calls(&self) -> u64 {
        self.cube_calls
    }
}

impl Default for SolverProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SolverProfiler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "propagations: {}, checks: {}, queries: {}, cubes: {} (unsat: {}, sat: {}, failed_literals: {}, splits: {}), last_duration: {}us",
        self.propagations, self.checks, self.queries, self.cube_calls, self.unsat_cubes, self.sat_cubes, self.failed_literals, self.splits, self.duration.as_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat_structures::*;

    #[test]
    fn counts_cube_outcomes() {
        let mut prof = SolverProfiler::new();
        let l = Literal::positive(Variable::new(0).unwrap());
        prof.record_cube(&BranchOutcome::Unsat);
        prof.record_cube(&BranchOutcome::Split(l, l.flip()));
        prof.record_cube(&BranchOutcome::FailedLiteral(l));
        prof.bump_checks();
        assert_eq!(prof.cube_calls(), 3);
        assert_eq!(prof.checks(), 1);
        let text = prof.to_string();
        assert!(text.contains("unsat: 1"));
        assert!(text.contains("splits: 1"));
        assert!(text.contains("failed_literals: 1"));
    }
}
