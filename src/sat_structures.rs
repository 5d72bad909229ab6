use core::fmt;
use std::ops::Not;

use crate::error::{Error, Result};

////////////////////////////////////////////////////////
// Data structures for literals
////////////////////////////////////////////////////////

/// Upper bound on a problem's variable count. Every index below it has a
/// DIMACS form in `i32`, and `vidx` over `2 * MAX_VARS` literals fits `u32`.
pub const MAX_VARS: u32 = i32::MAX as u32;

/// A propositional variable, identified by a 0-based index below
/// [`MAX_VARS`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    index: u32,
}

impl Variable {
    pub fn new(index: u32) -> Result<Self> {
        if index >= MAX_VARS {
            return Err(Error::OutOfRangeVariable {
                var: index,
                n_vars: MAX_VARS,
            });
        }
        Ok(Variable { index })
    }

    /// Callers guarantee `index < MAX_VARS`.
    pub(crate) const fn at(index: u32) -> Self {
        Variable { index }
    }

    pub const fn idx(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "var#{}", self.index)
    }
}

/// `On` is a positive occurrence, `Off` a negated one.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Polarity {
    Off,
    On,
}

impl Not for Polarity {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Polarity::Off => Polarity::On,
            Polarity::On => Polarity::Off,
        }
    }
}

/// A variable together with the polarity it occurs with.
///
/// Besides the structural form, a literal has two packed encodings:
/// - the dense literal index [`Literal::vidx`], in `[0, 2 * n_vars)`, where
///   positive literals come first and `x` negated lands on `x + n_vars`;
/// - the signed DIMACS integer [`Literal::ilit`], `±(idx + 1)`, which never
///   takes the value `0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    variable: Variable,
    polarity: Polarity,
}

impl Literal {
    /// `sign == true` means the literal is negated.
    pub const fn new(variable: Variable, sign: bool) -> Self {
        Literal {
            variable,
            polarity: if sign { Polarity::Off } else { Polarity::On },
        }
    }

    pub const fn positive(variable: Variable) -> Self {
        Literal::new(variable, false)
    }

    pub const fn negative(variable: Variable) -> Self {
        Literal::new(variable, true)
    }

    pub const fn var(self) -> Variable {
        self.variable
    }

    pub const fn polarity(self) -> Polarity {
        self.polarity
    }

    pub const fn sign(self) -> bool {
        matches!(self.polarity, Polarity::Off)
    }

    pub fn flip(self) -> Self {
        Literal {
            variable: self.variable,
            polarity: !self.polarity,
        }
    }

    /// `n_vars` is at most [`MAX_VARS`], as for any [`Problem`].
    pub const fn vidx(self, n_vars: u32) -> u32 {
        if self.sign() {
            self.variable.index + n_vars
        } else {
            self.variable.index
        }
    }

    pub const fn ilit(self) -> i32 {
        let magnitude = (self.variable.index + 1) as i32;
        if self.sign() {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn from_ilit(ilit: i32) -> Result<Self> {
        // i32::MIN has no positive counterpart to print back
        if ilit == 0 || ilit == i32::MIN {
            return Err(Error::InvalidLiteral(ilit));
        }
        let variable = Variable::at(ilit.unsigned_abs() - 1);
        Ok(Literal::new(variable, ilit < 0))
    }
}

impl Not for Literal {
    type Output = Self;
    fn not(self) -> Self::Output {
        self.flip()
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // "a" and "b'" would look like "0" and "1^"
        write!(
            f,
            "{}{}",
            self.variable.index,
            if self.sign() { "^" } else { "" }
        )
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ilit())
    }
}

////////////////////////////////////////////////////////
// Data structures for the SAT Problem
////////////////////////////////////////////////////////

/// Literal order is kept exactly as given; duplicates and tautologies are
/// legal and passed through.
pub type Clause = Vec<Literal>;

/// A CNF formula over a fixed variable count.
///
/// Construction caps the variable count but does not check that literals
/// are in range; see [`Problem::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    n_vars: u32,
    clauses: Vec<Clause>,
}

impl Problem {
    /// Fails only if `n_vars` exceeds [`MAX_VARS`]; literals are not checked.
    pub fn new(n_vars: u32, clauses: Vec<Clause>) -> Result<Self> {
        if n_vars > MAX_VARS {
            return Err(Error::OutOfRangeVariable {
                var: n_vars - 1,
                n_vars: MAX_VARS,
            });
        }
        Ok(Problem { n_vars, clauses })
    }

    pub fn n_vars(&self) -> u32 {
        self.n_vars
    }

    pub fn n_lits(&self) -> u32 {
        2 * self.n_vars
    }

    pub fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Total number of literal occurrences over all clauses.
    pub fn n_cells(&self) -> usize {
        self.clauses.iter().map(Vec::len).sum()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> {
        (0..self.n_vars).map(Variable::at)
    }

    /// Opt-in eager bounds check: every literal must reference a variable
    /// below `n_vars`.
    pub fn validate(&self) -> Result<()> {
        for clause in self.clauses.iter() {
            if let Some(l) = clause.iter().find(|l| l.var().idx() >= self.n_vars) {
                return Err(Error::OutOfRangeVariable {
                    var: l.var().idx(),
                    n_vars: self.n_vars,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "---Problem---")?;
        writeln!(f, "n_vars: {}", self.n_vars)?;
        writeln!(f, "n_clauses: {}", self.clauses.len())?;
        for (i, clause) in self.clauses.iter().enumerate() {
            write!(f, "[{}]", i)?;
            for l in clause.iter() {
                write!(f, " {}", l)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
