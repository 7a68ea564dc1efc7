// hamiltonian.rs
use std::fmt;

use ndarray::{s, Array1, Array2, ArrayD, Ix1, Ix2, IxDyn};
use serde::Serialize;

use crate::error::{HamiltonianError, Result};
use crate::maths::{allclose, close};
use crate::operator::FermionOperator;
use crate::tensor::{build_tensor, tensor_dim};
use crate::{C64, MAX_RANK};

// Which specialised representation a Hamiltonian uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HamiltonianKind {
    Diagonal,
    Restricted,
    Gso,
    Sso,
    DiagonalCoulomb,
    General,
    Sparse,
}

impl fmt::Display for HamiltonianKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HamiltonianKind::Diagonal => "Diagonal",
            HamiltonianKind::Restricted => "Restricted",
            HamiltonianKind::Gso => "GSO",
            HamiltonianKind::Sso => "SSO",
            HamiltonianKind::DiagonalCoulomb => "DiagonalCoulomb",
            HamiltonianKind::General => "General",
            HamiltonianKind::Sparse => "Sparse",
        };
        write!(f, "{}", name)
    }
}

// Storage shared by every tensor backed representation.
#[derive(Debug, Clone)]
struct TensorStore {
    tensors: Vec<ArrayD<C64>>,
    conserve_number: bool,
    e_0: C64,
}

/// Check the raw tensor tuple contract: a non-empty tuple where tensor k has rank 2 * (k + 1)
/// and every axis of every tensor has the same length. Returns that length.
/// # Arguments
///     `tensors`: slice of ArrayD, tensors ordered by rank.
pub fn validate_tuple(tensors: &[ArrayD<C64>]) -> Result<usize> {
    let first = tensors.first().ok_or_else(|| HamiltonianError::Shape("empty tensor tuple".to_string()))?;
    if first.ndim() == 0 {
        return Err(HamiltonianError::Shape("tensor 0 has no axes".to_string()));
    }
    let dim = first.shape()[0];
    validate_ranks(tensors, 0, dim)?;
    Ok(dim)
}

// Tensors from position `start` onwards must have rank 2 * (k + 1) and all axes of length `dim`.
fn validate_ranks(tensors: &[ArrayD<C64>], start: usize, dim: usize) -> Result<()> {
    if 2 * tensors.len() > MAX_RANK {
        return Err(HamiltonianError::UnsupportedRank {rank: 2 * tensors.len(), max: MAX_RANK});
    }
    for (k, t) in tensors.iter().enumerate().skip(start) {
        let rank = 2 * (k + 1);
        if t.ndim() != rank {
            return Err(HamiltonianError::Shape(format!("tensor {} must have rank {} but has rank {}", k, rank, t.ndim())));
        }
        if t.shape().iter().any(|&n| n != dim) {
            return Err(HamiltonianError::Shape(format!("tensor {} has shape {:?}, expected all axes {}", k, t.shape(), dim)));
        }
    }
    Ok(())
}

/// One-body Hamiltonian that is diagonal in the spin-orbital basis. Stores only the diagonal.
#[derive(Debug, Clone)]
pub struct DiagonalHamiltonian(TensorStore);

impl DiagonalHamiltonian {
    pub fn new(diag: Array1<C64>, conserve_number: bool, e_0: C64) -> Self {
        Self(TensorStore {tensors: vec![diag.into_dyn()], conserve_number, e_0})
    }
}

/// Spin restricted Hamiltonian, alpha and beta sectors share one set of spatial orbital tensors.
#[derive(Debug, Clone)]
pub struct RestrictedHamiltonian(TensorStore);

impl RestrictedHamiltonian {
    /// # Arguments
    ///     `tensors`: Vec of ArrayD, spatial orbital tensors of rank 2, 4, ... with axes norb.
    ///     `conserve_number`: bool, whether the Hamiltonian conserves particle number.
    ///     `e_0`: C64, scalar energy offset.
    pub fn new(tensors: Vec<ArrayD<C64>>, conserve_number: bool, e_0: C64) -> Result<Self> {
        validate_tuple(&tensors)?;
        Ok(Self(TensorStore {tensors, conserve_number, e_0}))
    }
}

/// General spin-orbital Hamiltonian in which alpha and beta sectors may couple.
#[derive(Debug, Clone)]
pub struct GsoHamiltonian(TensorStore);

impl GsoHamiltonian {
    /// # Arguments
    ///     `tensors`: Vec of ArrayD, spin-orbital tensors of rank 2, 4, ... with axes 2 * norb.
    ///     `conserve_number`: bool, whether the Hamiltonian conserves particle number.
    ///     `e_0`: C64, scalar energy offset.
    pub fn new(tensors: Vec<ArrayD<C64>>, conserve_number: bool, e_0: C64) -> Result<Self> {
        validate_tuple(&tensors)?;
        Ok(Self(TensorStore {tensors, conserve_number, e_0}))
    }
}

/// Spin-orbital Hamiltonian whose alpha and beta sectors differ but do not mix. The one-body
/// tensor has shape (norb, 2 * norb): alpha block in columns [0, norb), beta in [norb, 2 * norb).
#[derive(Debug, Clone)]
pub struct SsoHamiltonian(TensorStore);

impl SsoHamiltonian {
    pub fn new(tensors: Vec<ArrayD<C64>>, conserve_number: bool, e_0: C64) -> Result<Self> {
        let first = tensors.first().ok_or_else(|| HamiltonianError::Shape("empty tensor tuple".to_string()))?;
        let shape = first.shape();
        if shape.len() != 2 || shape[1] != 2 * shape[0] {
            return Err(HamiltonianError::Shape(format!("SSO one-body tensor must be (norb, 2 * norb), got {:?}", shape)));
        }
        let dim = shape[1];
        validate_ranks(&tensors, 1, dim)?;
        Ok(Self(TensorStore {tensors, conserve_number, e_0}))
    }
}

/// Two-body Hamiltonian containing only density-density terms h2e[i, j, i, j].
#[derive(Debug, Clone)]
pub struct DiagonalCoulombHamiltonian(TensorStore);

impl DiagonalCoulombHamiltonian {
    pub fn new(h2e: ArrayD<C64>, conserve_number: bool, e_0: C64) -> Result<Self> {
        let dim = h2e.shape().first().copied().unwrap_or(0);
        if h2e.ndim() != 4 || h2e.shape().iter().any(|&n| n != dim) {
            return Err(HamiltonianError::Shape(format!("diagonal Coulomb tensor must be rank 4 with equal axes, got {:?}", h2e.shape())));
        }
        Ok(Self(TensorStore {tensors: vec![h2e], conserve_number, e_0}))
    }

    /// Density-density interaction matrix V[i, j] = h2e[i, j, i, j].
    pub fn coulomb_matrix(&self) -> Array2<C64> {
        let h2e = &self.0.tensors[0];
        let dim = h2e.shape()[0];
        Array2::from_shape_fn((dim, dim), |(i, j)| h2e[IxDyn(&[i, j, i, j])])
    }
}

/// Fully general Hamiltonian holding spin-orbital tensors of rank 2, 4, 6 and 8.
#[derive(Debug, Clone)]
pub struct GeneralHamiltonian(TensorStore);

impl GeneralHamiltonian {
    pub fn new(tensors: Vec<ArrayD<C64>>, conserve_number: bool, e_0: C64) -> Result<Self> {
        validate_tuple(&tensors)?;
        Ok(Self(TensorStore {tensors, conserve_number, e_0}))
    }
}

/// Term list Hamiltonian for operators with very few terms, kept sparse instead of densified.
/// The constant term is folded into `e_0`.
#[derive(Debug, Clone)]
pub struct SparseHamiltonian {
    norb: usize,
    op: FermionOperator,
    conserve_number: bool,
    e_0: C64,
}

impl SparseHamiltonian {
    /// # Arguments
    ///     `norb`: usize, number of spatial orbitals or 0 to infer from the operator.
    ///     `ops`: FermionOperator, operator terms.
    ///     `conserve_number`: bool, whether the Hamiltonian conserves particle number.
    ///     `e_0`: C64, scalar energy offset.
    pub fn new(norb: usize, ops: &FermionOperator, conserve_number: bool, e_0: C64) -> Result<Self> {
        let mut op = FermionOperator::zero();
        let mut e_0 = e_0;
        for (term, coeff) in ops.iter() {
            if term.is_empty() {
                e_0 += *coeff;
            } else {
                op.add_term(term.clone(), *coeff);
            }
        }
        let norb = tensor_dim(&op, norb)? / 2;
        Ok(Self {norb, op, conserve_number, e_0})
    }

    pub fn operator(&self) -> &FermionOperator {
        &self.op
    }
}

/// A Hamiltonian in one of its specialised representations. Built once and treated as
/// immutable afterwards.
#[derive(Debug, Clone)]
pub enum Hamiltonian {
    Diagonal(DiagonalHamiltonian),
    Restricted(RestrictedHamiltonian),
    Gso(GsoHamiltonian),
    Sso(SsoHamiltonian),
    DiagonalCoulomb(DiagonalCoulombHamiltonian),
    General(GeneralHamiltonian),
    Sparse(SparseHamiltonian),
}

// Serializable report of a built Hamiltonian.
#[derive(Debug, Clone, Serialize)]
pub struct HamiltonianSummary {
    pub kind: HamiltonianKind,
    pub rank: usize,
    pub dim: usize,
    pub norb: usize,
    pub quadratic: bool,
    pub conserve_number: bool,
    pub e_0: [f64; 2],
}

impl Hamiltonian {
    pub fn kind(&self) -> HamiltonianKind {
        match self {
            Hamiltonian::Diagonal(_) => HamiltonianKind::Diagonal,
            Hamiltonian::Restricted(_) => HamiltonianKind::Restricted,
            Hamiltonian::Gso(_) => HamiltonianKind::Gso,
            Hamiltonian::Sso(_) => HamiltonianKind::Sso,
            Hamiltonian::DiagonalCoulomb(_) => HamiltonianKind::DiagonalCoulomb,
            Hamiltonian::General(_) => HamiltonianKind::General,
            Hamiltonian::Sparse(_) => HamiltonianKind::Sparse,
        }
    }

    fn store(&self) -> Option<&TensorStore> {
        match self {
            Hamiltonian::Diagonal(h) => Some(&h.0),
            Hamiltonian::Restricted(h) => Some(&h.0),
            Hamiltonian::Gso(h) => Some(&h.0),
            Hamiltonian::Sso(h) => Some(&h.0),
            Hamiltonian::DiagonalCoulomb(h) => Some(&h.0),
            Hamiltonian::General(h) => Some(&h.0),
            Hamiltonian::Sparse(_) => None,
        }
    }

    /// Highest rank of operator product represented.
    pub fn rank(&self) -> usize {
        match self {
            Hamiltonian::Diagonal(_) => 2,
            Hamiltonian::DiagonalCoulomb(_) => 4,
            Hamiltonian::Sparse(h) => h.op.many_body_order(),
            _ => 2 * self.tensors().len(),
        }
    }

    /// Stored tensors ordered by rank. Empty for the sparse representation.
    pub fn tensors(&self) -> &[ArrayD<C64>] {
        match self.store() {
            Some(st) => &st.tensors,
            None => &[],
        }
    }

    /// Stored tensor of the given rank, if the representation holds one.
    pub fn tensor(&self, rank: usize) -> Option<&ArrayD<C64>> {
        match self {
            Hamiltonian::Diagonal(h) if rank == 2 => h.0.tensors.first(),
            Hamiltonian::DiagonalCoulomb(h) if rank == 4 => h.0.tensors.first(),
            Hamiltonian::Diagonal(_) | Hamiltonian::DiagonalCoulomb(_) | Hamiltonian::Sparse(_) => None,
            _ if rank >= 2 && rank % 2 == 0 => self.tensors().get(rank / 2 - 1),
            _ => None,
        }
    }

    pub fn quadratic(&self) -> bool {
        self.rank() == 2
    }

    /// Length of the leading axis of the stored tensors. Spin-orbital representations report
    /// 2 * norb, Restricted and SSO report norb.
    pub fn dim(&self) -> usize {
        match self {
            Hamiltonian::Sparse(h) => 2 * h.norb,
            _ => self.tensors().first().and_then(|t| t.shape().first().copied()).unwrap_or(0),
        }
    }

    /// Number of spatial orbitals per spin sector.
    pub fn norb(&self) -> usize {
        match self {
            Hamiltonian::Restricted(_) | Hamiltonian::Sso(_) => self.dim(),
            Hamiltonian::Sparse(h) => h.norb,
            _ => self.dim() / 2,
        }
    }

    pub fn e_0(&self) -> C64 {
        match self {
            Hamiltonian::Sparse(h) => h.e_0,
            _ => self.store().map_or(C64::new(0.0, 0.0), |st| st.e_0),
        }
    }

    pub fn conserve_number(&self) -> bool {
        match self {
            Hamiltonian::Sparse(h) => h.conserve_number,
            _ => self.store().map_or(true, |st| st.conserve_number),
        }
    }

    /// Dense (2 * norb, 2 * norb) spin-orbital one-body matrix in the blocked layout, expanding
    /// whatever compressed form the representation stores. None if not quadratic.
    pub fn spin_orbital_matrix(&self) -> Option<Array2<C64>> {
        if !self.quadratic() {
            return None;
        }
        match self {
            Hamiltonian::Diagonal(h) => {
                let diag = h.0.tensors[0].view().into_dimensionality::<Ix1>().ok()?;
                Some(Array2::from_diag(&diag))
            }
            Hamiltonian::Gso(h) => {
                Some(h.0.tensors[0].view().into_dimensionality::<Ix2>().ok()?.to_owned())
            }
            Hamiltonian::General(h) => {
                Some(h.0.tensors[0].view().into_dimensionality::<Ix2>().ok()?.to_owned())
            }
            Hamiltonian::Restricted(h) => {
                let block = h.0.tensors[0].view().into_dimensionality::<Ix2>().ok()?;
                let n = block.nrows();
                let mut out = Array2::<C64>::zeros((2 * n, 2 * n));
                out.slice_mut(s![..n, ..n]).assign(&block);
                out.slice_mut(s![n.., n..]).assign(&block);
                Some(out)
            }
            Hamiltonian::Sso(h) => {
                let spin_mat = h.0.tensors[0].view().into_dimensionality::<Ix2>().ok()?;
                let n = spin_mat.nrows();
                let mut out = Array2::<C64>::zeros((2 * n, 2 * n));
                out.slice_mut(s![..n, ..n]).assign(&spin_mat.slice(s![.., ..n]));
                out.slice_mut(s![n.., n..]).assign(&spin_mat.slice(s![.., n..]));
                Some(out)
            }
            Hamiltonian::Sparse(h) => {
                let t = build_tensor(&h.op, h.norb).ok()?;
                t.into_dimensionality::<Ix2>().ok()
            }
            Hamiltonian::DiagonalCoulomb(_) => None,
        }
    }

    /// Density-density matrix of a diagonal Coulomb Hamiltonian.
    pub fn coulomb_matrix(&self) -> Option<Array2<C64>> {
        match self {
            Hamiltonian::DiagonalCoulomb(h) => Some(h.coulomb_matrix()),
            _ => None,
        }
    }

    /// Stored tensors multiplied by -i * time, the generator of time evolution.
    pub fn iht(&self, time: f64) -> Vec<ArrayD<C64>> {
        let factor = C64::new(0.0, -time);
        self.tensors().iter().map(|t| t.mapv(|z| z * factor)).collect()
    }

    pub fn summary(&self) -> HamiltonianSummary {
        let e_0 = self.e_0();
        HamiltonianSummary {
            kind: self.kind(),
            rank: self.rank(),
            dim: self.dim(),
            norb: self.norb(),
            quadratic: self.quadratic(),
            conserve_number: self.conserve_number(),
            e_0: [e_0.re, e_0.im],
        }
    }
}

impl PartialEq for Hamiltonian {
    fn eq(&self, other: &Self) -> bool {
        if self.kind() != other.kind() || self.conserve_number() != other.conserve_number() || !close(self.e_0(), other.e_0()) {
            return false;
        }
        match (self, other) {
            (Hamiltonian::Sparse(a), Hamiltonian::Sparse(b)) => a.norb == b.norb && a.op == b.op,
            _ => {
                self.tensors().len() == other.tensors().len()
                    && self.tensors().iter().zip(other.tensors()).all(|(a, b)| allclose(a, b))
            }
        }
    }
}

impl From<DiagonalHamiltonian> for Hamiltonian {
    fn from(h: DiagonalHamiltonian) -> Self {
        Hamiltonian::Diagonal(h)
    }
}

impl From<RestrictedHamiltonian> for Hamiltonian {
    fn from(h: RestrictedHamiltonian) -> Self {
        Hamiltonian::Restricted(h)
    }
}

impl From<GsoHamiltonian> for Hamiltonian {
    fn from(h: GsoHamiltonian) -> Self {
        Hamiltonian::Gso(h)
    }
}

impl From<SsoHamiltonian> for Hamiltonian {
    fn from(h: SsoHamiltonian) -> Self {
        Hamiltonian::Sso(h)
    }
}

impl From<DiagonalCoulombHamiltonian> for Hamiltonian {
    fn from(h: DiagonalCoulombHamiltonian) -> Self {
        Hamiltonian::DiagonalCoulomb(h)
    }
}

impl From<GeneralHamiltonian> for Hamiltonian {
    fn from(h: GeneralHamiltonian) -> Self {
        Hamiltonian::General(h)
    }
}

impl From<SparseHamiltonian> for Hamiltonian {
    fn from(h: SparseHamiltonian) -> Self {
        Hamiltonian::Sparse(h)
    }
}
