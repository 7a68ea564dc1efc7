// error.rs
use thiserror::Error;

use crate::index::Spin;
use crate::C64;

/// Errors raised while converting operators into Hamiltonian representations.
#[derive(Debug, Error)]
pub enum HamiltonianError {
    /// Input is not a fermion operator, tensor tuple or Hamiltonian.
    #[error("Expected a fermion operator, tensor tuple or Hamiltonian but received {0}")]
    UnrecognisedInput(String),

    /// Operator or matrix failed the Hermiticity check.
    #[error("Element {location} outside tolerance: {value} != {mirror}")]
    NotHermitian {
        location: String,
        value: C64,
        mirror: C64,
    },

    #[error("Odd rank {rank} term not accepted: [{term}]")]
    InvalidRank { rank: usize, term: String },

    #[error("Rank {rank} exceeds the largest supported rank {max}")]
    UnsupportedRank { rank: usize, max: usize },

    #[error("Expected rank {expected} but term [{term}] has rank {found}")]
    RankMismatch {
        expected: usize,
        found: usize,
        term: String,
    },

    /// Creation operators must precede annihilation operators.
    #[error("Found {found} operator at position {position} of [{term}] where {expected} is expected")]
    Ordering {
        term: String,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Referenced orbitals do not fit in the requested number of orbitals.
    #[error("Highest {spin} index requires {required} orbitals but norb is {norb}")]
    Dimension {
        spin: Spin,
        required: usize,
        norb: usize,
    },

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Could not parse operator term '{0}'")]
    Parse(String),

    #[error("Lua input error: {0}")]
    Lua(#[from] rlua::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HamiltonianError>;
