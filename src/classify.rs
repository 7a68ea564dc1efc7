// classify.rs
use log::{debug, info};
use ndarray::{s, Array2, ArrayD, ArrayView2};

use crate::error::{HamiltonianError, Result};
use crate::hamiltonian::{DiagonalHamiltonian, GsoHamiltonian, Hamiltonian, RestrictedHamiltonian, SsoHamiltonian};
use crate::maths::{allclose, argmax_deviation, conj_transpose, is_zero};
use crate::C64;

// Symmetry structure detected in a spin-orbital one-body matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank2Structure {
    // No off-diagonal elements.
    Diagonal,
    // Beta-alpha quadrant is non-zero, spin sectors mix.
    SpinCoupled,
    // Alpha-alpha and beta-beta blocks are identical.
    Restricted,
    // Spin sectors differ but do not mix.
    SpinSeparable,
}

/// Check that a matrix equals its conjugate transpose within tolerance. On failure the error
/// carries the index pair of the largest deviation together with both values.
/// # Arguments
///     `mat`: ArrayView2, square matrix to check.
pub fn check_hermitian(mat: &ArrayView2<C64>) -> Result<()> {
    let (nr, nc) = mat.dim();
    if nr != nc {
        return Err(HamiltonianError::Shape(format!("expected a square matrix, got ({}, {})", nr, nc)));
    }
    let mdag = conj_transpose(mat);
    if allclose(mat, &mdag) {
        return Ok(());
    }
    let (i, j) = argmax_deviation(mat, &mdag.view()).unwrap_or((0, 0));
    let value = mat[(i, j)];
    let mirror = mat[(j, i)].conj();
    debug!("Element ({}, {}) outside tolerance: {} != {}", i, j, value, mirror);
    Err(HamiltonianError::NotHermitian {location: format!("({}, {})", i, j), value, mirror})
}

/// Inspect a Hermitian (2 * norb, 2 * norb) one-body matrix in the blocked layout and return
/// the cheapest structure it fits. Checks are made in a fixed order and the first match wins:
///     1. Diagonal, every element of the strict lower triangle is zero.
///     2. SpinCoupled, any element of the beta-alpha quadrant is non-zero.
///     3. Restricted, the alpha-alpha block equals the beta-beta block.
///     4. SpinSeparable otherwise.
/// # Arguments
///     `mat`: ArrayView2, one-body matrix.
///     `norb`: usize, number of spatial orbitals or 0 to infer as half the matrix dimension.
pub fn classify_rank2(mat: &ArrayView2<C64>, norb: usize) -> Result<Rank2Structure> {
    check_hermitian(mat)?;
    let dim = mat.nrows();
    let norb = if norb == 0 {dim / 2} else {norb};
    if dim != 2 * norb {
        return Err(HamiltonianError::Shape(format!("matrix dimension {} does not equal 2 * norb = {}", dim, 2 * norb)));
    }

    let mut diagonal = true;
    'rows: for i in 1..dim {
        for j in 0..i {
            if !is_zero(mat[(i, j)]) {
                diagonal = false;
                break 'rows;
            }
        }
    }
    if diagonal {
        return Ok(Rank2Structure::Diagonal);
    }

    if mat.slice(s![norb..2 * norb, ..norb]).iter().any(|z| !is_zero(*z)) {
        return Ok(Rank2Structure::SpinCoupled);
    }

    if allclose(&mat.slice(s![..norb, ..norb]), &mat.slice(s![norb.., norb..])) {
        return Ok(Rank2Structure::Restricted);
    }

    Ok(Rank2Structure::SpinSeparable)
}

/// Classify a one-body matrix and construct the matching specialised Hamiltonian.
/// # Arguments
///     `mat`: Array2, Hermitian one-body matrix in the blocked spin-orbital layout.
///     `norb`: usize, number of spatial orbitals or 0 to infer.
///     `conserve_number`: bool, whether the Hamiltonian conserves particle number.
///     `e_0`: C64, scalar energy offset.
pub fn process_rank2(mat: &Array2<C64>, norb: usize, conserve_number: bool, e_0: C64) -> Result<Hamiltonian> {
    let structure = classify_rank2(&mat.view(), norb)?;
    let norb = if norb == 0 {mat.nrows() / 2} else {norb};
    info!("One-body matrix with norb = {} classified as {:?}", norb, structure);

    let hamil: Hamiltonian = match structure {
        Rank2Structure::Diagonal => DiagonalHamiltonian::new(mat.diag().to_owned(), conserve_number, e_0).into(),
        Rank2Structure::SpinCoupled => GsoHamiltonian::new(vec![mat.clone().into_dyn()], conserve_number, e_0)?.into(),
        Rank2Structure::Restricted => {
            let block = mat.slice(s![..norb, ..norb]).to_owned();
            RestrictedHamiltonian::new(vec![block.into_dyn()], conserve_number, e_0)?.into()
        }
        Rank2Structure::SpinSeparable => {
            // Alpha-alpha block in columns [0, norb), beta-beta block in [norb, 2 * norb).
            let mut spin_mat = Array2::<C64>::zeros((norb, 2 * norb));
            spin_mat.slice_mut(s![.., ..norb]).assign(&mat.slice(s![..norb, ..norb]));
            spin_mat.slice_mut(s![.., norb..]).assign(&mat.slice(s![norb.., norb..]));
            SsoHamiltonian::new(vec![spin_mat.into_dyn()], conserve_number, e_0)?.into()
        }
    };
    Ok(hamil)
}

/// Whether a rank 4 tensor only has non-zero elements where i == k and j == l. This scans every
/// element, O(dim^4), and is only run once per construction. Tensors of other rank are never
/// diagonal Coulomb.
pub fn is_diagonal_coulomb(tensor: &ArrayD<C64>) -> bool {
    if tensor.ndim() != 4 {
        return false;
    }
    tensor.indexed_iter().all(|(idx, z)| (idx[0] == idx[2] && idx[1] == idx[3]) || is_zero(*z))
}
