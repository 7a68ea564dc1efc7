// maths.rs
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Dimension};

use crate::{C64, ZERO_TOL};

/// Whether a complex number is structurally zero, |z| <= ZERO_TOL.
pub fn is_zero(z: C64) -> bool {
    z.norm() <= ZERO_TOL
}

/// Closeness test for a pair of complex numbers, |a - b| <= ZERO_TOL. Every structural
/// comparison goes through this one absolute tolerance.
/// # Arguments
///     `a`: C64, value to test.
///     `b`: C64, reference value.
pub fn close(a: C64, b: C64) -> bool {
    is_zero(a - b)
}

/// Element-wise `close` over two arrays. Arrays of differing shape are never close.
/// # Arguments
///     `a`: Array, values to test.
///     `b`: Array, reference values.
pub fn allclose<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> bool
where
    S1: Data<Elem = C64>,
    S2: Data<Elem = C64>,
    D: Dimension,
{
    a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(&x, &y)| close(x, y))
}

/// Conjugate transpose M^\dagger of a square or rectangular matrix.
pub fn conj_transpose(m: &ArrayView2<C64>) -> Array2<C64> {
    m.t().mapv(|z| z.conj())
}

/// Index of the element with the largest |a_ij - b_ij|, or None for empty matrices.
pub fn argmax_deviation(a: &ArrayView2<C64>, b: &ArrayView2<C64>) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for ((idx, &x), &y) in a.indexed_iter().zip(b.iter()) {
        let d = (x - y).norm();
        if best.map_or(true, |(_, bd)| d > bd) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}
