use core::fmt;
use log::{debug, info, trace};
use std::sync::Arc;

use crate::cube::{decide_cubes, BranchOutcome};
use crate::engine::dpll::DpllEngine;
use crate::engine::{CubeParams, DecisionEngine, SolverOptions, Status, Term};
use crate::error::Result;
use crate::profiler::SolverProfiler;
use crate::query::{build_query, Query, UnitMask};
use crate::sat_structures::*;
use crate::var_map::VarMap;

/// A problem bound to one decision engine instance.
///
/// Binding registers one engine constant per variable and asserts every
/// clause. The problem is shared read-only; the engine is owned, so a solver
/// must stay on one thread at a time.
pub struct Solver<E: DecisionEngine = DpllEngine> {
    problem: Arc<Problem>,
    opts: SolverOptions,
    engine: E,
    var_map: VarMap<E::Const>,
    profiler: SolverProfiler,
}

impl Solver<DpllEngine> {
    /// Binds `problem` to the in-crate reference engine.
    pub fn new(problem: Arc<Problem>, opts: SolverOptions) -> Result<Self> {
        Self::with_engine(problem, opts, DpllEngine::new())
    }
}

impl<E: DecisionEngine> Solver<E> {
    /// Fails with `OutOfRangeVariable` if a clause mentions a variable at or
    /// beyond `problem.n_vars()`.
    pub fn with_engine(problem: Arc<Problem>, opts: SolverOptions, mut engine: E) -> Result<Self> {
        engine.configure(&opts);
        let mut var_map = VarMap::with_capacity(problem.n_vars() as usize);
        for v in problem.variables() {
            let c = engine.mk_const(&format!("x_{}", v.idx()));
            var_map.register(c)?;
        }
        let mut solver = Solver {
            problem,
            opts,
            engine,
            var_map,
            profiler: SolverProfiler::new(),
        };
        solver.assert_problem()?;
        info!(
            target: "solver",
            "bound problem with {} vars, {} clauses",
            solver.problem.n_vars(),
            solver.problem.n_clauses()
        );
        Ok(solver)
    }

    fn assert_problem(&mut self) -> Result<()> {
        let problem = Arc::clone(&self.problem);
        for clause in problem.clauses() {
            let terms = self.to_terms(clause)?;
            self.engine.add(&terms)?;
        }
        Ok(())
    }

    fn to_terms(&self, lits: &[Literal]) -> Result<Vec<Term<E::Const>>> {
        lits.iter().map(|l| self.var_map.lit_to_term(*l)).collect()
    }

    fn to_lits(&self, terms: &[Term<E::Const>]) -> Result<Vec<Literal>> {
        terms.iter().map(|t| self.var_map.term_to_lit(t)).collect()
    }

    /// An engine copy with each assumption asserted as a unit clause.
    fn fork_with(&self, assumptions: &[Literal]) -> Result<E> {
        let mut fork = self.engine.fork();
        for t in self.to_terms(assumptions)? {
            fork.add(&[t])?;
        }
        Ok(fork)
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn options(&self) -> &SolverOptions {
        &self.opts
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn var_map(&self) -> &VarMap<E::Const> {
        &self.var_map
    }

    pub fn profiler(&self) -> &SolverProfiler {
        &self.profiler
    }

    /// Asserts each literal as a unit clause in the current scope.
    pub fn add(&mut self, lits: &[Literal]) -> Result<()> {
        for t in self.to_terms(lits)? {
            self.engine.add(&[t])?;
        }
        Ok(())
    }

    pub fn push(&mut self) {
        self.engine.push();
    }

    pub fn pop(&mut self) {
        self.engine.pop();
    }

    /// Clears the engine and re-asserts the bound problem.
    pub fn reset(&mut self) -> Result<()> {
        self.engine.reset();
        self.assert_problem()
    }

    pub fn propagate(&mut self) -> Status {
        self.profiler.bump_propagations();
        self.engine.propagate_only()
    }

    pub fn check(&mut self, assumptions: &[Literal]) -> Result<Status> {
        let terms = self.to_terms(assumptions)?;
        self.profiler.reset_start_time();
        let status = self.engine.check(&terms)?;
        self.profiler.calc_duration_till_now();
        self.profiler.bump_checks();
        debug!(target: "solver", "check {:?}: {}", assumptions, status);
        Ok(status)
    }

    /// Like [`Solver::check`], also returning the unsat core (empty unless
    /// the status is `Unsat`).
    pub fn check_core(&mut self, assumptions: &[Literal]) -> Result<(Status, Vec<Literal>)> {
        let status = self.check(assumptions)?;
        let core = match status {
            Status::Unsat => self.unsat_core()?,
            _ => Vec::new(),
        };
        Ok((status, core))
    }

    pub fn unsat_core(&self) -> Result<Vec<Literal>> {
        self.to_lits(&self.engine.unsat_core())
    }

    pub fn units(&self) -> Result<Vec<Literal>> {
        self.to_lits(&self.engine.units())
    }

    pub fn free_vars(&self) -> Result<Vec<Variable>> {
        let mut vars = self
            .engine
            .free_consts()
            .iter()
            .map(|c| self.var_map.const_to_var(c))
            .collect::<Result<Vec<_>>>()?;
        vars.sort();
        Ok(vars)
    }

    /// Builds the query for the state reached by propagating the asserted
    /// clauses plus `assumptions`. The solver's own engine is not touched.
    /// A branch that propagates to a conflict keeps the literals forced before
    /// it, so its assumptions are never reported free.
    pub fn to_query(&mut self, assumptions: &[Literal]) -> Result<Query> {
        self.profiler.reset_start_time();
        let mut fork = self.fork_with(assumptions)?;
        let status = fork.propagate_only();
        let units = self.to_lits(&fork.units())?;
        trace!(target: "solver", "units after {:?}: {:?}", assumptions, units);
        let mask = UnitMask::from_units(self.problem.n_vars(), units)?;
        let query = build_query(&self.problem, &mask)?;
        self.profiler.calc_duration_till_now();
        self.profiler.bump_queries();
        debug!(
            target: "solver",
            "query under {:?} (propagation: {}): {} free vars, {} cells",
            assumptions,
            status,
            query.free_vars.len(),
            query.n_cells()
        );
        Ok(query)
    }

    /// Asks the engine for depth-1 lookahead cubes under `assumptions`,
    /// scored by the heuristic named `lookahead_reward`.
    pub fn cube(&mut self, assumptions: &[Literal], lookahead_reward: &str) -> Result<BranchOutcome> {
        self.profiler.reset_start_time();
        let mut fork = self.fork_with(assumptions)?;
        let params = CubeParams {
            delta_fraction: self.opts.lookahead_delta_fraction,
        };
        let cubes = fork.cubes(lookahead_reward, &params);
        let var_map = &self.var_map;
        let outcome = decide_cubes(cubes, |t| var_map.term_to_lit(t))?;
        self.profiler.calc_duration_till_now();
        self.profiler.record_cube(&outcome);
        debug!(target: "solver", "cube under {:?} with {}: {}", assumptions, lookahead_reward, outcome);
        Ok(outcome)
    }
}

impl<E: DecisionEngine> fmt::Display for Solver<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "---Solver---")?;
        writeln!(f, "n_units: {}", self.engine.units().len())?;
        writeln!(f, "n_free_vars: {}", self.engine.free_consts().len())?;
        match self.units() {
            Ok(units) => {
                write!(f, "units:")?;
                for l in units.iter() {
                    write!(f, " {}", l)?;
                }
                writeln!(f)?;
            }
            Err(e) => writeln!(f, "units: <{}>", e)?,
        }
        write!(f, "{}", self.problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn lit(ilit: i32) -> Literal {
        Literal::from_ilit(ilit).unwrap()
    }

    fn solver(n_vars: u32, clauses: &[&[i32]], max_conflicts: u32) -> Solver {
        let clauses = clauses
            .iter()
            .map(|c| c.iter().map(|i| lit(*i)).collect())
            .collect();
        Solver::new(
            Arc::new(Problem::new(n_vars, clauses).unwrap()),
            SolverOptions::new(max_conflicts, 0),
        )
        .unwrap()
    }

    #[test]
    fn binding_rejects_out_of_range_literals() {
        let p = Arc::new(Problem::new(2, vec![vec![lit(1), lit(3)]]).unwrap());
        assert!(matches!(
            Solver::new(p, SolverOptions::default()),
            Err(Error::OutOfRangeVariable { var: 2, n_vars: 2 })
        ));
    }

    #[test]
    fn add_and_scopes() {
        let mut s = solver(2, &[&[1, 2]], 0);
        assert_eq!(s.check(&[]).unwrap(), Status::Unknown);
        s.push();
        s.add(&[lit(-1), lit(-2)]).unwrap();
        assert_eq!(s.check(&[]).unwrap(), Status::Unsat);
        s.pop();
        assert_eq!(s.check(&[]).unwrap(), Status::Unknown);
        assert!(s.add(&[lit(3)]).is_err());
    }

    #[test]
    fn reset_rebinds_problem() {
        let mut s = solver(2, &[&[1], &[-1, 2]], 0);
        s.add(&[lit(-2)]).unwrap();
        assert_eq!(s.propagate(), Status::Unsat);
        s.reset().unwrap();
        assert_eq!(s.propagate(), Status::Sat);
        assert_eq!(s.units().unwrap(), vec![lit(1), lit(2)]);
    }

    #[test]
    fn check_core_translates_back() {
        let mut s = solver(3, &[&[-1, -2]], 0);
        let (status, core) = s.check_core(&[lit(1), lit(3), lit(2)]).unwrap();
        assert_eq!(status, Status::Unsat);
        assert_eq!(core, vec![lit(1), lit(2)]);
        let (status, core) = s.check_core(&[lit(1)]).unwrap();
        assert_eq!(status, Status::Sat);
        assert!(core.is_empty());
    }

    #[test]
    fn query_under_assumptions_leaves_solver_untouched() {
        let mut s = solver(3, &[&[1, 2], &[-1, 3], &[2, -3]], 0);
        let q = s.to_query(&[lit(1)]).unwrap();
        // 1 forces 3, 3 forces 2
        assert_eq!(q.free_vars, Vec::<u32>::new());
        assert!(q.incidence.is_empty());

        let q = s.to_query(&[]).unwrap();
        assert_eq!(q.free_vars, vec![0, 1, 2]);
        assert_eq!(q.n_cells(), 6);
        assert_eq!(s.profiler().queries(), 2);
        s.propagate();
        assert!(s.units().unwrap().is_empty());
    }

    #[test]
    fn free_vars_follow_units() {
        let mut s = solver(3, &[&[2], &[1, 3]], 0);
        s.propagate();
        assert_eq!(s.units().unwrap(), vec![lit(2)]);
        assert_eq!(s.free_vars().unwrap(), vec![Variable::new(0).unwrap(), Variable::new(2).unwrap()]);
    }

    #[test]
    fn cube_outcomes() {
        let mut s = solver(2, &[&[1, 2], &[-1, 2]], 0);
        assert_eq!(
            s.cube(&[], "ascending").unwrap(),
            BranchOutcome::Split(lit(1), lit(-1))
        );
        assert_eq!(s.cube(&[lit(2)], "ascending").unwrap(), BranchOutcome::SatTrivial);
        assert_eq!(s.cube(&[lit(-2)], "ascending").unwrap(), BranchOutcome::Unsat);
        assert_eq!(s.profiler().cube_calls(), 3);
    }

    #[test]
    fn display_shows_units() {
        let mut s = solver(2, &[&[-2]], 0);
        s.propagate();
        let text = s.to_string();
        assert!(text.contains("n_units: 1"));
        assert!(text.contains("units: -2"));
    }
}
