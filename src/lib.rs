pub mod error;
pub mod operator;
pub mod index;
pub mod split;
pub mod tensor;
pub mod maths;
pub mod classify;
pub mod hamiltonian;
pub mod build;
pub mod input;
pub mod utils;

use num_complex::Complex64;

pub type C64 = Complex64; // Coefficient type of every operator and tensor.

// Absolute tolerance of every structural check: zero tests, block equality and Hermiticity.
pub const ZERO_TOL: f64 = 1e-12;
// Largest rank carried by the general multi-rank representation.
pub const MAX_RANK: usize = 8;

pub use build::{build_hamiltonian, prepare_hamiltonian, BuildOptions, HamiltonianInput};
pub use error::{HamiltonianError, Result};
pub use hamiltonian::{Hamiltonian, HamiltonianKind};
pub use operator::FermionOperator;
