use super::*;
use crate::error::Error;
use crate::heuristics::{dlis::Dlis, heuristic_by_name, Heuristics, SearchState};
use crate::sat_structures::*;
use log::{debug, trace, warn};

/// A boolean constant of [`DpllEngine`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstId(u32);

impl ConstId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ConstId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "c#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SolutionStepType {
    // forced by propagation before any assumption or decision
    ForcedAtInit,
    Assumption,
    // we picked this literal at will and we haven't flipped it yet
    FreeChoiceFirstTry,
    // we have flipped this literal during a backtrack
    FreeChoiceSecondTry,
    ForcedAtBCP,
}

#[derive(Clone, Copy)]
struct SolutionStep {
    literal: Literal,
    step_type: SolutionStepType,
}

impl fmt::Debug for SolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self.step_type {
                SolutionStepType::ForcedAtInit => "I",
                SolutionStepType::Assumption => "A",
                SolutionStepType::FreeChoiceFirstTry => "t",
                SolutionStepType::FreeChoiceSecondTry => "T",
                SolutionStepType::ForcedAtBCP => "x",
            }
        )?;
        write!(f, "{:?}", self.literal)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ClauseState {
    Satisfied,
    Unsatisfiable,
    Unit(Literal),
    Unresolved,
}

enum Lowered {
    True,
    False,
    Lit(Literal),
}

/// Chronological-backtracking DPLL with occurrence-list propagation.
///
/// Good enough to stand in for a real engine behind [`DecisionEngine`]: the
/// conflict budget, scopes, unit snapshots, unsat cores and depth-1 cubes all
/// behave the way the adapter contract describes.
#[derive(Debug, Clone, Default)]
pub struct DpllEngine {
    names: Vec<String>,
    clauses: Vec<Clause>,
    // clause ids per literal, indexed by `occ`
    occurrences: Vec<Vec<usize>>,
    scopes: Vec<usize>,

    values: Vec<Option<bool>>,
    // the stack will look like:
    // (ForcedAtInit)* ((Assumption|FreeChoice),(ForcedAtBCP)*)*
    trail: Vec<SolutionStep>,
    qhead: usize,

    root_units: Vec<Literal>,
    core: Vec<Term<ConstId>>,
    conflicts: u32,
    opts: SolverOptions,
}

fn occ(l: Literal) -> usize {
    2 * l.var().idx() as usize + l.sign() as usize
}

fn term(l: Literal) -> Term<ConstId> {
    let t = Term::Const(ConstId(l.var().idx()));
    if l.sign() {
        !t
    } else {
        t
    }
}

impl DpllEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_consts(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, c: ConstId) -> Option<&str> {
        self.names.get(c.0 as usize).map(String::as_str)
    }

    pub fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Conflicts met by the last search, not counting core minimisation.
    pub fn n_conflicts(&self) -> u32 {
        self.conflicts
    }

    fn lower(&self, t: &Term<ConstId>) -> Result<Lowered> {
        match t {
            Term::True => Ok(Lowered::True),
            Term::Const(c) => {
                if c.0 as usize >= self.names.len() {
                    return Err(Error::OutOfRangeVariable {
                        var: c.0,
                        n_vars: self.names.len() as u32,
                    });
                }
                Ok(Lowered::Lit(Literal::positive(Variable::new(c.0)?)))
            }
            Term::Not(inner) => Ok(match self.lower(inner)? {
                Lowered::True => Lowered::False,
                Lowered::False => Lowered::True,
                Lowered::Lit(l) => Lowered::Lit(l.flip()),
            }),
        }
    }

    fn rebuild_occurrences(&mut self) {
        self.occurrences = vec![Vec::new(); 2 * self.names.len()];
        for (ci, clause) in self.clauses.iter().enumerate() {
            for l in clause.iter() {
                self.occurrences[occ(*l)].push(ci);
            }
        }
    }

    fn value(&self, l: Literal) -> Option<bool> {
        self.values[l.var().idx() as usize].map(|v| v != l.sign())
    }

    fn assign(&mut self, l: Literal, step_type: SolutionStepType) {
        self.values[l.var().idx() as usize] = Some(!l.sign());
        self.trail.push(SolutionStep {
            literal: l,
            step_type,
        });
    }

    fn undo_until(&mut self, trail_len: usize) {
        for step in self.trail.drain(trail_len..) {
            self.values[step.literal.var().idx() as usize] = None;
        }
        self.qhead = self.qhead.min(trail_len);
    }

    fn clause_state(&self, ci: usize) -> ClauseState {
        let mut unassigned: Option<Literal> = None;
        let mut several = false;
        for l in self.clauses[ci].iter() {
            match self.value(*l) {
                Some(true) => return ClauseState::Satisfied,
                Some(false) => {}
                None => match unassigned {
                    None => unassigned = Some(*l),
                    Some(u) if u != *l => several = true,
                    Some(_) => {}
                },
            }
        }
        match (unassigned, several) {
            (None, _) => ClauseState::Unsatisfiable,
            (Some(l), false) => ClauseState::Unit(l),
            (Some(_), true) => ClauseState::Unresolved,
        }
    }

    /// Returns true if no conflict occurred.
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let falsified = self.trail[self.qhead].literal.flip();
            self.qhead += 1;
            let k = occ(falsified);
            for j in 0..self.occurrences[k].len() {
                let ci = self.occurrences[k][j];
                match self.clause_state(ci) {
                    ClauseState::Satisfied | ClauseState::Unresolved => {}
                    ClauseState::Unit(l) => {
                        trace!(target: "engine", "clause {} implies {:?}", ci, l);
                        self.assign(l, SolutionStepType::ForcedAtBCP);
                    }
                    ClauseState::Unsatisfiable => {
                        trace!(target: "engine", "clause {} is unsatisfiable", ci);
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Clears the assignment, then force-assigns unit clauses and propagates.
    /// Records the root trail as the unit snapshot, up to the conflict if
    /// there is one; returns false on conflict.
    fn propagate_root(&mut self) -> bool {
        self.undo_until(0);
        let mut ok = true;
        for ci in 0..self.clauses.len() {
            match self.clause_state(ci) {
                ClauseState::Satisfied | ClauseState::Unresolved => {}
                ClauseState::Unit(l) => self.assign(l, SolutionStepType::ForcedAtInit),
                ClauseState::Unsatisfiable => {
                    trace!(target: "engine", "clause {} is unsatisfiable at the root", ci);
                    ok = false;
                    break;
                }
            }
        }
        ok = ok && self.propagate();
        self.root_units = self.trail.iter().map(|s| s.literal).collect();
        ok
    }

    /// Flips the most recent unflipped free choice, dropping everything after
    /// it. Returns false if there is nothing left to flip.
    fn resolve_conflict(&mut self) -> bool {
        let Some(pos) = self
            .trail
            .iter()
            .rposition(|s| s.step_type == SolutionStepType::FreeChoiceFirstTry)
        else {
            trace!(target: "engine", "cannot find a solution");
            return false;
        };
        self.undo_until(pos + 1);
        let step = &mut self.trail[pos];
        step.literal = step.literal.flip();
        step.step_type = SolutionStepType::FreeChoiceSecondTry;
        let l = step.literal;
        self.values[l.var().idx() as usize] = Some(!l.sign());
        self.qhead = pos;
        trace!(target: "engine", "flipping to {:?}, trail: {:?}", l, self.trail);
        true
    }

    fn all_satisfied(&self) -> bool {
        let state = SearchState::new(&self.clauses, &self.values);
        self.clauses.iter().all(|c| state.is_satisfied(c))
    }

    fn search(&mut self, assumptions: &[Literal], max_conflicts: u32) -> Status {
        self.conflicts = 0;
        if !self.propagate_root() {
            return Status::Unsat;
        }
        for a in assumptions.iter() {
            match self.value(*a) {
                Some(true) => continue,
                Some(false) => return Status::Unsat,
                None => {
                    self.assign(*a, SolutionStepType::Assumption);
                    if !self.propagate() {
                        return Status::Unsat;
                    }
                }
            }
        }
        loop {
            let decision = Dlis.decide(&SearchState::new(&self.clauses, &self.values));
            let Some(l) = decision else {
                return Status::Sat;
            };
            if self.conflicts >= max_conflicts {
                return Status::Unknown;
            }
            self.assign(l, SolutionStepType::FreeChoiceFirstTry);
            while !self.propagate() {
                self.conflicts += 1;
                if !self.resolve_conflict() {
                    return Status::Unsat;
                }
            }
        }
    }

    /// Drops assumptions one at a time, keeping only those without which the
    /// search is no longer unsatisfiable.
    fn minimize_core(&mut self, assumptions: &[(Literal, Term<ConstId>)]) -> Vec<Term<ConstId>> {
        let mut core: Vec<(Literal, Term<ConstId>)> = assumptions.to_vec();
        let mut i = 0;
        while i < core.len() {
            let trial: Vec<Literal> = core
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (l, _))| *l)
                .collect();
            if self.search(&trial, self.opts.max_conflicts) == Status::Unsat {
                core.remove(i);
            } else {
                i += 1;
            }
        }
        core.into_iter().map(|(_, t)| t).collect()
    }

    /// Sets `l`, propagates and undoes everything above `root_len`; returns
    /// false if `l` leads to a conflict.
    fn look_ahead(&mut self, l: Literal, root_len: usize) -> bool {
        self.assign(l, SolutionStepType::FreeChoiceFirstTry);
        let ok = self.propagate();
        self.undo_until(root_len);
        trace!(target: "engine", "lookahead {:?}: {}", l, if ok { "ok" } else { "conflict" });
        ok
    }
}

impl DecisionEngine for DpllEngine {
    type Const = ConstId;
    type Cubes = std::vec::IntoIter<Cube<ConstId>>;

    fn configure(&mut self, opts: &SolverOptions) {
        debug!(target: "engine", "configure {:?}", opts);
        if opts.max_restarts > 0 {
            debug!(target: "engine", "max_restarts = {} accepted; this engine never restarts", opts.max_restarts);
        }
        self.opts = *opts;
    }

    fn mk_const(&mut self, name: &str) -> ConstId {
        self.names.push(name.to_string());
        self.values.push(None);
        self.occurrences.push(Vec::new());
        self.occurrences.push(Vec::new());
        ConstId(self.names.len() as u32 - 1)
    }

    fn add(&mut self, clause: &[Term<ConstId>]) -> Result<()> {
        let mut lits = Clause::with_capacity(clause.len());
        for t in clause.iter() {
            match self.lower(t)? {
                Lowered::True => return Ok(()),
                Lowered::False => {}
                Lowered::Lit(l) => lits.push(l),
            }
        }
        let ci = self.clauses.len();
        for l in lits.iter() {
            self.occurrences[occ(*l)].push(ci);
        }
        trace!(target: "engine", "add clause {}: {:?}", ci, lits);
        self.clauses.push(lits);
        Ok(())
    }

    fn push(&mut self) {
        self.scopes.push(self.clauses.len());
    }

    fn pop(&mut self) {
        match self.scopes.pop() {
            Some(n) => {
                self.clauses.truncate(n);
                self.rebuild_occurrences();
            }
            None => warn!(target: "engine", "pop without matching push ignored"),
        }
    }

    fn reset(&mut self) {
        self.clauses.clear();
        self.scopes.clear();
        self.rebuild_occurrences();
        self.undo_until(0);
        self.root_units.clear();
        self.core.clear();
    }

    fn fork(&self) -> Self {
        self.clone()
    }

    fn propagate_only(&mut self) -> Status {
        let status = self.search(&[], 0);
        debug!(target: "engine", "propagate: {}, {} units", status, self.root_units.len());
        status
    }

    fn check(&mut self, assumptions: &[Term<ConstId>]) -> Result<Status> {
        self.core.clear();
        let mut lowered = Vec::with_capacity(assumptions.len());
        for t in assumptions.iter() {
            match self.lower(t)? {
                Lowered::True => {}
                Lowered::False => {
                    self.core.push(t.clone());
                    return Ok(Status::Unsat);
                }
                Lowered::Lit(l) => lowered.push((l, t.clone())),
            }
        }
        let lits: Vec<Literal> = lowered.iter().map(|(l, _)| *l).collect();
        let status = self.search(&lits, self.opts.max_conflicts);
        let conflicts = self.conflicts;
        if status == Status::Unsat && !lits.is_empty() {
            self.core = self.minimize_core(&lowered);
            self.conflicts = conflicts;
        }
        debug!(
            target: "engine",
            "check with {} assumptions: {} ({} conflicts)",
            lits.len(),
            status,
            conflicts
        );
        Ok(status)
    }

    fn unsat_core(&self) -> Vec<Term<ConstId>> {
        self.core.clone()
    }

    fn units(&self) -> Vec<Term<ConstId>> {
        self.root_units.iter().map(|l| term(*l)).collect()
    }

    fn free_consts(&self) -> Vec<ConstId> {
        let mut forced = vec![false; self.names.len()];
        for l in self.root_units.iter() {
            forced[l.var().idx() as usize] = true;
        }
        (0..self.names.len() as u32)
            .filter(|i| !forced[*i as usize])
            .map(ConstId)
            .collect()
    }

    fn cubes(&mut self, reward: &str, params: &CubeParams) -> Self::Cubes {
        let heuristic: Box<dyn Heuristics> = heuristic_by_name(reward).unwrap_or_else(|| {
            warn!(target: "engine", "unknown lookahead reward {:?}, using dlis", reward);
            Box::new(Dlis)
        });
        debug!(
            target: "engine",
            "cubes with {} (delta fraction {:?})",
            heuristic.name(),
            params.delta_fraction
        );

        if !self.propagate_root() {
            return Vec::new().into_iter();
        }
        if self.all_satisfied() {
            return vec![vec![Term::True]].into_iter();
        }
        let Some(l) = heuristic.decide(&SearchState::new(&self.clauses, &self.values)) else {
            return vec![vec![Term::True]].into_iter();
        };

        let root_len = self.trail.len();
        let cubes = match (self.look_ahead(l, root_len), self.look_ahead(l.flip(), root_len)) {
            (false, false) => vec![],
            (true, false) => vec![vec![term(l)]],
            (false, true) => vec![vec![term(l.flip())]],
            (true, true) => vec![vec![term(l)], vec![term(l.flip())]],
        };
        cubes.into_iter()
    }
}
