//! Reduction of a problem under the currently forced literals into the sparse
//! literal/clause incidence structure consumed by a prediction model.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::sat_structures::*;

/// Which literals are currently forced true, indexed by [`Literal::vidx`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMask {
    n_vars: u32,
    units: Vec<bool>,
}

impl UnitMask {
    pub fn new(n_vars: u32) -> Self {
        UnitMask {
            n_vars,
            units: vec![false; 2 * n_vars as usize],
        }
    }

    pub fn for_problem(problem: &Problem) -> Self {
        Self::new(problem.n_vars())
    }

    pub fn from_units(n_vars: u32, units: impl IntoIterator<Item = Literal>) -> Result<Self> {
        let mut mask = Self::new(n_vars);
        for l in units {
            mask.insert(l)?;
        }
        Ok(mask)
    }

    pub fn n_vars(&self) -> u32 {
        self.n_vars
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn insert(&mut self, l: Literal) -> Result<()> {
        self.check_range(l)?;
        self.units[l.vidx(self.n_vars) as usize] = true;
        Ok(())
    }

    pub fn contains(&self, l: Literal) -> Result<bool> {
        self.check_range(l)?;
        Ok(self.units[l.vidx(self.n_vars) as usize])
    }

    /// Neither literal of `var` is forced.
    pub fn is_free(&self, var: Variable) -> Result<bool> {
        let l = Literal::new(var, false);
        Ok(!self.contains(l)? && !self.contains(l.flip())?)
    }

    fn check_range(&self, l: Literal) -> Result<()> {
        let var = l.var().idx();
        if var >= self.n_vars {
            return Err(Error::OutOfRangeVariable {
                var,
                n_vars: self.n_vars,
            });
        }
        Ok(())
    }
}

/// Free variables plus one `(literal index, clause index)` row per literal
/// occurrence in every clause that survives the reduction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub free_vars: Vec<u32>,
    pub incidence: Vec<[u32; 2]>,
}

impl Query {
    pub fn n_cells(&self) -> usize {
        self.incidence.len()
    }

    /// Row-major `n_cells x 2` buffer, the layout a numeric model expects.
    pub fn flat_incidence(&self) -> Vec<u32> {
        self.incidence.iter().flatten().copied().collect()
    }
}

/// The literals of `clause` that can still be made true, or `None` if some
/// literal is already forced true.
fn surviving<'a>(
    clause: &'a [Literal],
    mask: &'a UnitMask,
) -> Result<Option<impl Iterator<Item = &'a Literal> + 'a>> {
    for l in clause.iter() {
        if mask.contains(*l)? {
            return Ok(None);
        }
    }
    Ok(Some(clause.iter().filter(move |l| {
        // range already checked above
        !mask.units[l.flip().vidx(mask.n_vars) as usize]
    })))
}

/// Builds the query for `problem` given the forced-true literals in `mask`.
///
/// A clause contributes rows only if no literal in it is forced true and more
/// than one literal survives after dropping the falsified ones. Rows come in
/// original clause order, then original literal order, and carry the
/// literal's unreduced `vidx`.
pub fn build_query(problem: &Problem, mask: &UnitMask) -> Result<Query> {
    if mask.n_vars() != problem.n_vars() {
        return Err(Error::MaskSizeMismatch {
            expected: problem.n_lits() as usize,
            found: mask.len(),
        });
    }
    let n_vars = problem.n_vars();

    // first pass: count rows so the table is allocated exactly once
    let mut n_cells = 0;
    for clause in problem.clauses() {
        if let Some(lits) = surviving(clause, mask)? {
            let n = lits.count();
            if n > 1 {
                n_cells += n;
            }
        }
    }

    let mut incidence = Vec::with_capacity(n_cells);
    for (c_idx, clause) in problem.clauses().iter().enumerate() {
        let Some(lits) = surviving(clause, mask)? else {
            trace!(target: "query", "clause {} satisfied", c_idx);
            continue;
        };
        let lits: Vec<&Literal> = lits.collect();
        if lits.len() <= 1 {
            trace!(target: "query", "clause {} reduced to {} literal(s)", c_idx, lits.len());
            continue;
        }
        incidence.extend(lits.into_iter().map(|l| [l.vidx(n_vars), c_idx as u32]));
    }

    let mut free_vars = Vec::new();
    for v in problem.variables() {
        if mask.is_free(v)? {
            free_vars.push(v.idx());
        }
    }

    debug!(
        target: "query",
        "query: {} free vars, {} of {} cells",
        free_vars.len(),
        incidence.len(),
        problem.n_cells()
    );
    Ok(Query {
        free_vars,
        incidence,
    })
}
