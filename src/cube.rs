//! Interpretation of a depth-1 lookahead cube sequence as a branch decision.

use core::fmt;
use log::debug;

use crate::engine::{Cube, Term};
use crate::error::{Error, Result};
use crate::sat_structures::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchOutcome {
    /// No satisfying branch exists.
    Unsat,
    /// Satisfiable without further branching.
    SatTrivial,
    /// The engine found a single forced consequence instead of a split.
    FailedLiteral(Literal),
    /// Two mutually exclusive branches.
    Split(Literal, Literal),
}

impl fmt::Display for BranchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BranchOutcome::Unsat => write!(f, "unsat"),
            BranchOutcome::SatTrivial => write!(f, "sat"),
            BranchOutcome::FailedLiteral(l) => write!(f, "failed literal {}", l),
            BranchOutcome::Split(l1, l2) => write!(f, "split {} | {}", l1, l2),
        }
    }
}

fn validate_cube<C>(cube: &Cube<C>, position: &str) -> Result<()> {
    match cube.len() {
        1 => Ok(()),
        0 => Err(Error::contract(format!("{} cube is empty", position))),
        n => Err(Error::contract(format!("{} cube has {} literals, expected 1", position, n))),
    }
}

/// Interprets the engine's cube sequence.
///
/// Zero cubes is `Unsat`; a single `[true]` cube is `SatTrivial`; a single
/// literal cube is `FailedLiteral`; two distinct single-literal cubes are a
/// `Split`. Anything else is an [`Error::EngineContractViolation`].
/// `translate` maps an engine literal back into a [`Literal`]. Cubes past the
/// third are never pulled from the iterator.
pub fn decide_cubes<C, I, F>(cubes: I, mut translate: F) -> Result<BranchOutcome>
where
    C: PartialEq,
    I: IntoIterator<Item = Cube<C>>,
    F: FnMut(&Term<C>) -> Result<Literal>,
{
    let mut cubes = cubes.into_iter();

    let Some(cube1) = cubes.next() else {
        return Ok(BranchOutcome::Unsat);
    };
    validate_cube(&cube1, "first")?;
    if cube1[0].is_true() {
        return Ok(BranchOutcome::SatTrivial);
    }

    let Some(cube2) = cubes.next() else {
        return Ok(BranchOutcome::FailedLiteral(translate(&cube1[0])?));
    };
    validate_cube(&cube2, "second")?;
    if cube1 == cube2 {
        return Err(Error::contract(
            "both cubes are the same; the cube iterator did not advance",
        ));
    }
    if cubes.next().is_some() {
        return Err(Error::contract("engine returned more than two cubes"));
    }

    let outcome = BranchOutcome::Split(translate(&cube1[0])?, translate(&cube2[0])?);
    debug!(target: "cube", "{}", outcome);
    Ok(outcome)
}
