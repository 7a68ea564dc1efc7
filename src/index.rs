// index.rs
use std::fmt;

use crate::error::{HamiltonianError, Result};
use crate::operator::FermionOperator;

// Spin sector of a spin-orbital. Even indices are alpha, odd indices are beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Alpha,
    Beta,
}

impl Spin {
    pub fn of(index: usize) -> Self {
        if index % 2 == 0 {Spin::Alpha} else {Spin::Beta}
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Alpha => write!(f, "alpha"),
            Spin::Beta => write!(f, "beta"),
        }
    }
}

/// Spatial orbital number of an interleaved spin-orbital index within its spin sector.
pub fn spatial_index(index: usize) -> usize {
    index / 2
}

/// Map an interleaved spin-orbital index (even alpha, odd beta) onto the blocked layout where
/// alpha orbitals occupy [0, dim_alpha) and beta orbitals [dim_alpha, 2 * dim_alpha).
/// # Arguments
///     `index`: usize, interleaved spin-orbital index.
///     `dim_alpha`: usize, size of the alpha block.
pub fn to_blocked(index: usize, dim_alpha: usize) -> usize {
    match Spin::of(index) {
        Spin::Alpha => index / 2,
        Spin::Beta => (index - 1) / 2 + dim_alpha,
    }
}

/// Bounds checked variant of `to_blocked`, fails if the orbital does not fit in `norb`.
/// # Arguments
///     `index`: usize, interleaved spin-orbital index.
///     `norb`: usize, number of spatial orbitals per spin sector.
pub fn to_blocked_checked(index: usize, norb: usize) -> Result<usize> {
    let required = spatial_index(index) + 1;
    if required > norb {
        return Err(HamiltonianError::Dimension {spin: Spin::of(index), required, norb});
    }
    Ok(to_blocked(index, norb))
}

/// Inverse of `to_blocked`: recover the interleaved spin-orbital index.
/// # Arguments
///     `blocked`: usize, index in [0, 2 * norb).
///     `norb`: usize, number of spatial orbitals per spin sector.
pub fn from_blocked(blocked: usize, norb: usize) -> usize {
    if blocked < norb {2 * blocked} else {2 * (blocked - norb) + 1}
}

/// Scan every term of `op` and return the number of alpha and beta spatial orbitals needed to
/// hold the highest referenced index of each spin, (max_even / 2 + 1, max_odd / 2 + 1). A spin
/// with no referenced index needs 0 orbitals.
pub fn required_blocks(op: &FermionOperator) -> (usize, usize) {
    let mut alpha = 0;
    let mut beta = 0;
    for (term, _) in op.iter() {
        for &(index, _) in term {
            let blocks = spatial_index(index) + 1;
            match Spin::of(index) {
                Spin::Alpha => alpha = alpha.max(blocks),
                Spin::Beta => beta = beta.max(blocks),
            }
        }
    }
    (alpha, beta)
}

/// Number of spatial orbitals required to hold both spin sectors of `op`.
pub fn required_norb(op: &FermionOperator) -> usize {
    let (alpha, beta) = required_blocks(op);
    alpha.max(beta)
}
