// build.rs
use std::collections::BTreeMap;

use log::{debug, info};
use ndarray::{ArrayD, Ix2, IxDyn};

use crate::classify::{is_diagonal_coulomb, process_rank2};
use crate::error::{HamiltonianError, Result};
use crate::hamiltonian::{validate_tuple, DiagonalCoulombHamiltonian, GeneralHamiltonian, Hamiltonian, SparseHamiltonian};
use crate::index::required_norb;
use crate::operator::{term_to_string, FermionOperator, Term};
use crate::split::split_by_rank;
use crate::tensor::build_tensor;
use crate::{C64, MAX_RANK};

// Operators with at most this many non-constant terms stay in term list form.
const SPARSE_TERM_LIMIT: usize = 2;

/// The three kinds of input accepted by `build_hamiltonian`.
#[derive(Debug, Clone)]
pub enum HamiltonianInput {
    // Already specialised, returned unchanged.
    Built(Hamiltonian),
    // Raw tensors of rank 2, 4, ... forwarded to the general representation.
    Tensors(Vec<ArrayD<C64>>),
    // Hermitian fermion operator to be classified.
    Operator(FermionOperator),
}

impl From<Hamiltonian> for HamiltonianInput {
    fn from(h: Hamiltonian) -> Self {
        HamiltonianInput::Built(h)
    }
}

impl From<Vec<ArrayD<C64>>> for HamiltonianInput {
    fn from(tensors: Vec<ArrayD<C64>>) -> Self {
        HamiltonianInput::Tensors(tensors)
    }
}

impl From<FermionOperator> for HamiltonianInput {
    fn from(op: FermionOperator) -> Self {
        HamiltonianInput::Operator(op)
    }
}

// Storage for optional build parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    // Number of spatial orbitals, 0 to infer from the highest referenced index.
    pub norb: usize,
    pub conserve_number: bool,
    // Scalar energy offset added to any constant term of the operator.
    pub e_0: C64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {norb: 0, conserve_number: true, e_0: C64::new(0.0, 0.0)}
    }
}

/// Build the cheapest correct Hamiltonian representation for `input`.
///     Built: returned unchanged.
///     Tensors: validated against the tensor tuple contract and wrapped as a General Hamiltonian.
///     Operator: checked for Hermiticity. Operators with at most two non-constant terms become
///     a Sparse Hamiltonian. Otherwise the operator is (if number is not conserved) transformed
///     to the spin broken form, normal ordered, split by rank and each rank densified with a
///     shared norb. A lone rank 2 part is classified by its symmetry, a lone rank 4 part of
///     diagonal Coulomb form becomes a DiagonalCoulomb Hamiltonian, and everything else a
///     General Hamiltonian with zero filled tensors of rank 2, 4, 6 and 8.
/// # Arguments
///     `input`: HamiltonianInput, Hamiltonian, tensors or operator.
///     `options`: BuildOptions, norb, number conservation and energy offset.
pub fn build_hamiltonian(input: impl Into<HamiltonianInput>, options: &BuildOptions) -> Result<Hamiltonian> {
    match input.into() {
        HamiltonianInput::Built(h) => Ok(h),
        HamiltonianInput::Tensors(tensors) => {
            validate_tuple(&tensors)?;
            debug!("Forwarding {} raw tensors to the general representation", tensors.len());
            Ok(GeneralHamiltonian::new(tensors, options.conserve_number, options.e_0)?.into())
        }
        HamiltonianInput::Operator(op) => build_from_operator(op, options),
    }
}

fn build_from_operator(op: FermionOperator, options: &BuildOptions) -> Result<Hamiltonian> {
    if let Some((term, value, mirror)) = op.hermiticity_violation() {
        return Err(HamiltonianError::NotHermitian {location: format!("[{}]", term_to_string(&term)), value, mirror});
    }

    let nterms = op.iter().filter(|(term, _)| !term.is_empty()).count();
    if nterms <= SPARSE_TERM_LIMIT {
        debug!("Operator has {} terms, building sparse Hamiltonian", nterms);
        return Ok(SparseHamiltonian::new(options.norb, &op, options.conserve_number, options.e_0)?.into());
    }

    let op = if options.conserve_number {op} else {transform_to_spin_broken(&op)};
    let op = op.normal_ordered();
    let split = split_by_rank(&op)?;
    let e_0 = options.e_0 + split.e_0;

    if let Some(&rank) = split.ranks.keys().find(|&&r| r > MAX_RANK) {
        return Err(HamiltonianError::UnsupportedRank {rank, max: MAX_RANK});
    }

    let norb = if options.norb > 0 {
        options.norb
    } else {
        split.ranks.values().map(required_norb).max().unwrap_or(0)
    };

    let mut ops_mat: BTreeMap<usize, ArrayD<C64>> = BTreeMap::new();
    for (&rank, term) in &split.ranks {
        ops_mat.insert(rank, build_tensor(term, norb)?);
    }
    debug!("Built tensors for ranks {:?} with norb = {}", ops_mat.keys().collect::<Vec<_>>(), norb);

    if ops_mat.len() == 1 {
        if let Some(mat) = ops_mat.get(&2) {
            let mat = mat.view().into_dimensionality::<Ix2>()
                .map_err(|e| HamiltonianError::Shape(e.to_string()))?
                .to_owned();
            return process_rank2(&mat, norb, options.conserve_number, e_0);
        }
        if let Some(h2e) = ops_mat.get(&4) {
            if is_diagonal_coulomb(h2e) {
                info!("Two-body operator with norb = {} is diagonal Coulomb", norb);
                return Ok(DiagonalCoulombHamiltonian::new(h2e.clone(), options.conserve_number, e_0)?.into());
            }
        }
    }

    let dim = 2 * norb;
    let tensors: Vec<ArrayD<C64>> = (2..=MAX_RANK)
        .step_by(2)
        .map(|rank| ops_mat.remove(&rank).unwrap_or_else(|| ArrayD::zeros(IxDyn(&vec![dim; rank]))))
        .collect();
    info!("Falling back to general Hamiltonian with norb = {}", norb);
    Ok(GeneralHamiltonian::new(tensors, options.conserve_number, e_0)?.into())
}

/// Re-express a number non-conserving operator in the spin broken picture by swapping the
/// role of every ladder operator acting on an alpha (even) spin-orbital. Beta operators are
/// unchanged.
pub fn transform_to_spin_broken(op: &FermionOperator) -> FermionOperator {
    let mut out = FermionOperator::zero();
    for (term, coeff) in op.iter() {
        let flipped: Term = term.iter().map(|&(i, c)| if i % 2 == 0 {(i, !c)} else {(i, c)}).collect();
        out.add_term(flipped, *coeff);
    }
    out
}

/// Convert whatever a caller hands to an evolution or expectation routine into a Hamiltonian
/// with the caller's number conservation and default options otherwise.
/// # Arguments
///     `input`: HamiltonianInput, Hamiltonian, tensors or operator.
///     `conserve_number`: bool, number conservation of the wavefunction being acted on.
pub fn prepare_hamiltonian(input: impl Into<HamiltonianInput>, conserve_number: bool) -> Result<Hamiltonian> {
    let options = BuildOptions {conserve_number, ..BuildOptions::default()};
    build_hamiltonian(input, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hamiltonian::HamiltonianKind;

    fn op(s: &str, re: f64) -> FermionOperator {
        FermionOperator::parse(s, C64::new(re, 0.0)).unwrap()
    }

    #[test]
    fn spin_broken_flips_alpha_only() {
        let flipped = transform_to_spin_broken(&op("0^ 1 2 3^", 1.0));
        assert_eq!(flipped.get(&[(0, false), (1, false), (2, true), (3, true)]), Some(C64::new(1.0, 0.0)));
        assert_eq!(flipped.len(), 1);
    }

    #[test]
    fn few_terms_stay_sparse() {
        let ops = op("0^ 0", 1.0) + op("1^ 1", 2.0) + op("", 3.0);
        let h = build_hamiltonian(ops, &BuildOptions::default()).unwrap();
        assert_eq!(h.kind(), HamiltonianKind::Sparse);
        assert_eq!(h.e_0(), C64::new(3.0, 0.0));
    }

    #[test]
    fn not_hermitian_rejected() {
        let ops = op("0^ 1", 1.0) + op("0^ 0", 1.0) + op("1^ 1", 1.0);
        assert!(matches!(build_hamiltonian(ops, &BuildOptions::default()), Err(HamiltonianError::NotHermitian {..})));
    }

    #[test]
    fn offset_accumulates_constant_terms() {
        let ops = op("0^ 0", 1.0) + op("1^ 1", 1.0) + op("2^ 2", 1.0) + op("", 0.25);
        let options = BuildOptions {e_0: C64::new(1.0, 0.0), ..BuildOptions::default()};
        let h = build_hamiltonian(ops, &options).unwrap();
        assert_eq!(h.kind(), HamiltonianKind::Diagonal);
        assert_eq!(h.e_0(), C64::new(1.25, 0.0));
    }

    #[test]
    fn explicit_norb_used_and_checked() {
        let ops = op("0^ 0", 1.0) + op("1^ 1", 1.0) + op("2^ 2", 1.0);
        let options = BuildOptions {norb: 3, ..BuildOptions::default()};
        let h = build_hamiltonian(ops.clone(), &options).unwrap();
        assert_eq!(h.dim(), 6);
        let options = BuildOptions {norb: 1, ..BuildOptions::default()};
        assert!(matches!(build_hamiltonian(ops, &options), Err(HamiltonianError::Dimension {..})));
    }

    #[test]
    fn rank_above_eight_unsupported() {
        let ops = op("0^ 1^ 2^ 3^ 4^ 5 6 7 8 9", 1.0) + op("9^ 8^ 7^ 6^ 5^ 4 3 2 1 0", 1.0) + op("0^ 0", 1.0);
        assert!(ops.is_hermitian());
        assert!(matches!(
            build_hamiltonian(ops, &BuildOptions::default()),
            Err(HamiltonianError::UnsupportedRank {rank: 10, max: 8})
        ));
    }

    #[test]
    fn adapter_uses_number_conservation() {
        let ops = op("0^ 0", 1.0) + op("1^ 1", 1.0) + op("2^ 2", 1.0);
        let h = prepare_hamiltonian(ops, true).unwrap();
        assert!(h.conserve_number());
        let again = prepare_hamiltonian(h.clone(), false).unwrap();
        assert_eq!(again, h);
    }
}
