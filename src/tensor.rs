// tensor.rs
use ndarray::{Array2, ArrayD, IxDyn};

use crate::error::{HamiltonianError, Result};
use crate::index::{required_blocks, to_blocked_checked, Spin};
use crate::operator::{term_to_string, FermionOperator};
use crate::C64;

/// Dimension of one tensor axis (2 * norb) for `op`. If `norb` is non-zero it must be large
/// enough to hold the highest alpha and beta index, otherwise it is inferred from them.
/// # Arguments
///     `op`: FermionOperator, operator whose indices are scanned.
///     `norb`: usize, explicit number of spatial orbitals or 0 to infer.
pub fn tensor_dim(op: &FermionOperator, norb: usize) -> Result<usize> {
    let (alpha, beta) = required_blocks(op);
    if norb == 0 {
        return Ok(2 * alpha.max(beta));
    }
    if norb < alpha {
        return Err(HamiltonianError::Dimension {spin: Spin::Alpha, required: alpha, norb});
    }
    if norb < beta {
        return Err(HamiltonianError::Dimension {spin: Spin::Beta, required: beta, norb});
    }
    Ok(2 * norb)
}

/// Convert a single rank operator into a dense tensor with `rank` axes of length 2 * norb in
/// the blocked (alpha first, beta second) layout. Each term must have its rank / 2 creation
/// operators before its rank / 2 annihilation operators. Coefficients are accumulated at the
/// blocked coordinates of the term.
/// # Arguments
///     `op`: FermionOperator, operator in which every term has the same rank.
///     `norb`: usize, explicit number of spatial orbitals or 0 to infer.
pub fn build_tensor(op: &FermionOperator, norb: usize) -> Result<ArrayD<C64>> {
    let dim = axis_dim(op, norb);
    let dim_alpha = dim / 2;
    let rank = op.many_body_order();

    let mut tensor = ArrayD::<C64>::zeros(IxDyn(&vec![dim; rank]));
    let mut index_mask = vec![0usize; rank];

    for (term, coeff) in op.iter() {
        if term.len() != rank {
            return Err(HamiltonianError::RankMismatch {expected: rank, found: term.len(), term: term_to_string(term)});
        }
        if rank % 2 == 1 {
            return Err(HamiltonianError::InvalidRank {rank, term: term_to_string(term)});
        }
        for (i, &(index, creation)) in term.iter().enumerate() {
            let expect_creation = i < rank / 2;
            if creation != expect_creation {
                return Err(HamiltonianError::Ordering {
                    term: term_to_string(term),
                    position: i,
                    expected: role(expect_creation),
                    found: role(creation),
                });
            }
            index_mask[i] = to_blocked_checked(index, dim_alpha)?;
        }
        tensor[IxDyn(&index_mask)] += *coeff;
    }
    Ok(tensor)
}

/// Convert a quadratic operator, which may contain pairing terms, into the super-matrix
///     | a^ a   a^ a^ |
///     | a  a   a  a^ |
/// of shape (2 * dim, 2 * dim) where dim = 2 * norb.
/// # Arguments
///     `op`: FermionOperator, rank 2 operator.
///     `norb`: usize, explicit number of spatial orbitals or 0 to infer.
pub fn build_rank2_supermatrix(op: &FermionOperator, norb: usize) -> Result<Array2<C64>> {
    let dim = axis_dim(op, norb);
    let dim_alpha = dim / 2;
    let mut h1e = Array2::<C64>::zeros((2 * dim, 2 * dim));

    for (term, coeff) in op.iter() {
        if term.len() != 2 {
            return Err(HamiltonianError::RankMismatch {expected: 2, found: term.len(), term: term_to_string(term)});
        }
        let (left, left_creation) = term[0];
        let (right, right_creation) = term[1];
        let ind = to_blocked_checked(left, dim_alpha)?;
        let jnd = to_blocked_checked(right, dim_alpha)?;
        match (left_creation, right_creation) {
            (true, true) => h1e[(ind, jnd + dim)] += *coeff,
            (true, false) => h1e[(ind, jnd)] += *coeff,
            (false, true) => h1e[(ind + dim, jnd + dim)] += *coeff,
            (false, false) => h1e[(ind + dim, jnd)] += *coeff,
        }
    }
    Ok(h1e)
}

// Explicit norb is taken as given, every index is then bounds checked while mapping.
fn axis_dim(op: &FermionOperator, norb: usize) -> usize {
    if norb == 0 {
        let (alpha, beta) = required_blocks(op);
        2 * alpha.max(beta)
    } else {
        2 * norb
    }
}

fn role(creation: bool) -> &'static str {
    if creation {"creation"} else {"annihilation"}
}
