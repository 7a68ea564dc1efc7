use ndarray::{s, Array2, ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hamil_rs::build::{build_hamiltonian, prepare_hamiltonian, BuildOptions, HamiltonianInput};
use hamil_rs::hamiltonian::{
    DiagonalCoulombHamiltonian, DiagonalHamiltonian, GeneralHamiltonian, GsoHamiltonian, Hamiltonian, HamiltonianKind,
    RestrictedHamiltonian, SparseHamiltonian, SsoHamiltonian,
};
use hamil_rs::index::{from_blocked, to_blocked};
use hamil_rs::{FermionOperator, HamiltonianError, C64};

fn c(re: f64) -> C64 {
    C64::new(re, 0.0)
}

fn op(s: &str, re: f64) -> FermionOperator {
    FermionOperator::parse(s, c(re)).unwrap()
}

fn random_hermitian(n: usize, seed: u64) -> Array2<C64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = Array2::from_shape_fn((n, n), |_| C64::new(rng.gen::<f64>(), rng.gen::<f64>()));
    let adag = a.t().mapv(|z| z.conj());
    a + adag
}

// One-body operator sum_pq h[blocked(p), blocked(q)] p^ q over interleaved spin-orbitals.
fn one_body_operator(h: &Array2<C64>) -> FermionOperator {
    let norb = h.nrows() / 2;
    let mut ops = FermionOperator::zero();
    for p in 0..2 * norb {
        for q in 0..2 * norb {
            ops.add_term(vec![(p, true), (q, false)], h[(to_blocked(p, norb), to_blocked(q, norb))]);
        }
    }
    ops
}

#[test]
fn index_mapping_norb4() {
    assert_eq!(to_blocked(0, 4), 0);
    assert_eq!(to_blocked(1, 4), 4);
    assert_eq!(to_blocked(7, 4), 7);
    assert_eq!(from_blocked(4, 4), 1);
}

#[test]
fn two_orbital_diagonal_end_to_end() {
    let ops = op("0^ 0", 2.0) + op("1^ 1", -1.5) + op("0^ 1", 0.0) + op("1^ 0", 0.0);
    let h = build_hamiltonian(ops, &BuildOptions::default()).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::Diagonal);
    assert_eq!(h.dim(), 2);
    assert_eq!(h.tensor(2).unwrap().as_slice().unwrap(), &[c(2.0), c(-1.5)]);
}

#[test]
fn spin_coupled_matrix_round_trips_exactly() {
    let mat = random_hermitian(6, 409);
    let h = build_hamiltonian(one_body_operator(&mat), &BuildOptions::default()).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::Gso);
    assert_eq!(h.tensor(2).unwrap(), &mat.clone().into_dyn());
    assert_eq!(h.spin_orbital_matrix().unwrap(), mat);
}

#[test]
fn every_rank2_structure_round_trips_exactly() {
    let alpha = random_hermitian(3, 11);
    let beta = random_hermitian(3, 12);
    let cases = [
        (alpha.clone(), alpha.clone(), HamiltonianKind::Restricted),
        (alpha.clone(), beta.clone(), HamiltonianKind::Sso),
    ];
    for (a, b, kind) in cases {
        let mut mat = Array2::<C64>::zeros((6, 6));
        mat.slice_mut(s![..3, ..3]).assign(&a);
        mat.slice_mut(s![3.., 3..]).assign(&b);
        let h = build_hamiltonian(one_body_operator(&mat), &BuildOptions::default()).unwrap();
        assert_eq!(h.kind(), kind);
        assert_eq!(h.spin_orbital_matrix().unwrap(), mat);
    }
}

#[test]
fn nearly_restricted_matrix_keeps_both_spin_blocks() {
    let alpha = random_hermitian(2, 21);
    let beta = alpha.mapv(|z| z * (1.0 + 5e-6));
    let mut mat = Array2::<C64>::zeros((4, 4));
    mat.slice_mut(s![..2, ..2]).assign(&alpha);
    mat.slice_mut(s![2.., 2..]).assign(&beta);

    let h = build_hamiltonian(one_body_operator(&mat), &BuildOptions::default()).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::Sso);
    assert_eq!(h.spin_orbital_matrix().unwrap(), mat);
}

#[test]
fn restricted_matches_direct_construction() {
    let block = random_hermitian(2, 5);
    let mut mat = Array2::<C64>::zeros((4, 4));
    mat.slice_mut(s![..2, ..2]).assign(&block);
    mat.slice_mut(s![2.., 2..]).assign(&block);

    let built = build_hamiltonian(one_body_operator(&mat), &BuildOptions::default()).unwrap();
    let direct: Hamiltonian = RestrictedHamiltonian::new(vec![block.into_dyn()], true, c(0.0)).unwrap().into();
    assert_eq!(built.kind(), HamiltonianKind::Restricted);
    assert_eq!(built, direct);
    assert_eq!(built.norb(), 2);
}

fn diagonal_coulomb_operator() -> FermionOperator {
    op("0^ 1^ 1 0", 0.5) + op("0^ 2^ 2 0", 0.25) + op("2^ 3^ 3 2", -0.75)
}

#[test]
fn diagonal_coulomb_detected() {
    let h = build_hamiltonian(diagonal_coulomb_operator(), &BuildOptions::default()).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::DiagonalCoulomb);
    assert_eq!(h.rank(), 4);
    assert_eq!(h.dim(), 4);
    // 0^ 1^ 1 0 = -1^ 0^ 1 0, blocked 1 -> 2 and 0 -> 0.
    let h2e = h.tensor(4).unwrap();
    assert_eq!(h2e[IxDyn(&[2, 0, 2, 0])], c(-0.5));
    assert_eq!(h.coulomb_matrix().unwrap()[(2, 0)], c(-0.5));
}

#[test]
fn extra_two_body_element_falls_back_to_general() {
    let ops = diagonal_coulomb_operator() + op("0^ 1^ 2 0", 0.1) + op("0^ 2^ 1 0", 0.1);
    assert!(ops.is_hermitian());
    let h = build_hamiltonian(ops, &BuildOptions::default()).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::General);
    assert_eq!(h.tensors().len(), 4);
    assert!(h.tensor(2).unwrap().iter().all(|z| *z == c(0.0)));
    assert_eq!(h.tensor(4).unwrap().shape(), &[4, 4, 4, 4]);
    assert_eq!(h.tensor(8).unwrap().ndim(), 8);
}

#[test]
fn mixed_ranks_build_general() {
    let ops = op("0^ 0", 1.0) + op("1^ 1", 1.0) + op("0^ 1^ 1 0", 0.5);
    let h = build_hamiltonian(ops, &BuildOptions::default()).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::General);
    assert_eq!(h.tensor(2).unwrap()[IxDyn(&[1, 1])], c(1.0));
    assert_eq!(h.tensor(4).unwrap()[IxDyn(&[1, 0, 1, 0])], c(-0.5));
}

#[test]
fn built_hamiltonians_pass_through() {
    let h1e = random_hermitian(4, 3);
    let mut spin_mat = Array2::<C64>::zeros((2, 4));
    spin_mat.slice_mut(s![.., ..2]).assign(&h1e.slice(s![..2, ..2]));
    spin_mat.slice_mut(s![.., 2..]).assign(&h1e.slice(s![2.., 2..]));
    let mut h2e = ArrayD::<C64>::zeros(IxDyn(&[2, 2, 2, 2]));
    h2e[IxDyn(&[0, 1, 0, 1])] = c(1.0);

    let variants: Vec<Hamiltonian> = vec![
        DiagonalHamiltonian::new(h1e.diag().to_owned(), true, c(0.5)).into(),
        RestrictedHamiltonian::new(vec![h1e.clone().into_dyn()], true, c(0.0)).unwrap().into(),
        GsoHamiltonian::new(vec![h1e.clone().into_dyn()], false, c(0.0)).unwrap().into(),
        SsoHamiltonian::new(vec![spin_mat.into_dyn()], true, c(0.0)).unwrap().into(),
        DiagonalCoulombHamiltonian::new(h2e, true, c(-1.0)).unwrap().into(),
        GeneralHamiltonian::new(vec![h1e.into_dyn()], true, c(0.0)).unwrap().into(),
        SparseHamiltonian::new(0, &(op("0^ 0", 1.0) + op("", 2.0)), true, c(0.0)).unwrap().into(),
    ];
    for h in variants {
        let again = build_hamiltonian(h.clone(), &BuildOptions::default()).unwrap();
        assert_eq!(again, h);
        assert_eq!(again.kind(), h.kind());
    }
}

#[test]
fn raw_tensors_forwarded_to_general() {
    let h1e = random_hermitian(4, 8).into_dyn();
    let h2e = ArrayD::<C64>::zeros(IxDyn(&[4; 4]));
    let options = BuildOptions {conserve_number: false, e_0: c(2.0), ..BuildOptions::default()};
    let h = build_hamiltonian(vec![h1e.clone(), h2e], &options).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::General);
    assert_eq!(h.rank(), 4);
    assert!(!h.conserve_number());
    assert_eq!(h.e_0(), c(2.0));
    assert_eq!(h.tensor(2).unwrap(), &h1e);

    let bad = vec![ArrayD::<C64>::zeros(IxDyn(&[4, 4, 4]))];
    assert!(matches!(build_hamiltonian(HamiltonianInput::Tensors(bad), &options), Err(HamiltonianError::Shape(_))));
}

#[test]
fn odd_rank_rejected_by_factory() {
    for coeff in [0.0, 2.0] {
        let ops = op("0^ 1 2", coeff) + op("2^ 1^ 0", coeff) + op("0^ 0", 1.0);
        assert!(matches!(
            build_hamiltonian(ops, &BuildOptions::default()),
            Err(HamiltonianError::InvalidRank {rank: 3, ..})
        ));
    }
}

#[test]
fn non_hermitian_operator_rejected() {
    let ops = op("0^ 1", 1.0) + op("1^ 0", 2.0) + op("0^ 0", 1.0);
    match build_hamiltonian(ops, &BuildOptions::default()) {
        Err(HamiltonianError::NotHermitian {location, ..}) => assert!(location.starts_with('[')),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn number_breaking_operator_uses_spin_broken_form() {
    // Pairing term a_0^ a_1^ + h.c. becomes a hopping term once alpha roles are swapped.
    let ops = op("0^ 1^", 0.5) + op("1 0", 0.5) + op("0^ 0", 1.0);
    let options = BuildOptions {conserve_number: false, ..BuildOptions::default()};
    let h = build_hamiltonian(ops, &options).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::Gso);
    assert!(!h.conserve_number());
    assert_eq!(h.e_0(), c(1.0));
    let mat = h.spin_orbital_matrix().unwrap();
    assert_eq!(mat[(0, 0)], c(-1.0));
    assert_eq!(mat[(1, 0)], c(-0.5));
    assert_eq!(mat[(0, 1)], c(-0.5));
    assert_eq!(mat[(1, 1)], c(0.0));
}

#[test]
fn adapter_passes_through_and_builds() {
    let ops = op("0^ 0", 2.0) + op("1^ 1", -1.5) + op("0^ 1", 0.0) + op("1^ 0", 0.0);
    let h = prepare_hamiltonian(ops, true).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::Diagonal);
    assert_eq!(prepare_hamiltonian(h.clone(), true).unwrap(), h);
}

#[test]
fn demo_inputs_build() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/demos");

    let input = hamil_rs::input::load_input(&format!("{}/diagonal.lua", dir)).unwrap();
    assert!(input.write.verbose);
    let h = build_hamiltonian(input.operator, &input.options).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::Diagonal);

    let input = hamil_rs::input::load_input(&format!("{}/hubbard_dimer.lua", dir)).unwrap();
    assert_eq!(input.operator.len(), 6);
    let h = build_hamiltonian(input.operator, &input.options).unwrap();
    assert_eq!(h.kind(), HamiltonianKind::General);
    assert_eq!(h.norb(), 2);
    assert_eq!(h.summary().rank, 8);
}
