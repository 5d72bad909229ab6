//! Error types shared by every component of the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A signed DIMACS literal that does not name a literal: `0` or `i32::MIN`.
    #[error("invalid literal: {0}")]
    InvalidLiteral(i32),

    /// Malformed, missing or repeated DIMACS header, clause count mismatch,
    /// or an unparsable token.
    #[error("parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// A variable index at or beyond the problem's (or engine's) variable count.
    #[error("variable {var} out of range (n_vars = {n_vars})")]
    OutOfRangeVariable { var: u32, n_vars: u32 },

    /// A unit mask sized for a different problem.
    #[error("unit mask has {found} entries, expected {expected}")]
    MaskSizeMismatch { expected: usize, found: usize },

    /// The decision engine produced output outside its documented contract.
    #[error("engine contract violation: {0}")]
    EngineContractViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            line,
            msg: msg.into(),
        }
    }

    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Error::EngineContractViolation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
