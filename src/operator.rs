// operator.rs
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::error::{HamiltonianError, Result};
use crate::maths::close;
use crate::C64;

// Single ladder operator as (orbital index, is_creation).
pub type LadderOp = (usize, bool);
// Ordered product of ladder operators. Factor order is significant.
pub type Term = Vec<LadderOp>;

/// Weighted sum of products of fermionic creation and annihilation operators. Terms with the
/// same factor sequence are accumulated into a single coefficient. Terms whose coefficient is
/// zero are kept, they still reference orbitals and still count as terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FermionOperator {
    terms: BTreeMap<Term, C64>,
}

impl FermionOperator {
    /// Empty operator.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Constant operator `coeff * 1`.
    pub fn identity(coeff: C64) -> Self {
        Self::from_term(Vec::new(), coeff)
    }

    /// Operator holding a single term.
    /// # Arguments
    ///     `term`: Term, ordered ladder operators.
    ///     `coeff`: C64, coefficient of the term.
    pub fn from_term(term: Term, coeff: C64) -> Self {
        let mut op = Self::zero();
        op.add_term(term, coeff);
        op
    }

    /// Build a single term operator from a string such as "0^ 3 2", where `N^` is a creation
    /// operator on spin-orbital N and `N` an annihilation operator. The empty string is the
    /// constant term.
    /// # Arguments
    ///     `s`: &str, whitespace separated ladder operators.
    ///     `coeff`: C64, coefficient of the term.
    pub fn parse(s: &str, coeff: C64) -> Result<Self> {
        Ok(Self::from_term(parse_term(s)?, coeff))
    }

    /// Accumulate `coeff` onto `term`, creating the term if it is not yet present.
    pub fn add_term(&mut self, term: Term, coeff: C64) {
        *self.terms.entry(term).or_insert(C64::new(0.0, 0.0)) += coeff;
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, &C64)> {
        self.terms.iter()
    }

    pub fn get(&self, term: &[LadderOp]) -> Option<C64> {
        self.terms.get(term).copied()
    }

    /// Coefficient of the constant (empty) term.
    pub fn constant(&self) -> C64 {
        self.get(&[]).unwrap_or(C64::new(0.0, 0.0))
    }

    /// Number of ladder operators in the longest term.
    pub fn many_body_order(&self) -> usize {
        self.terms.keys().map(|t| t.len()).max().unwrap_or(0)
    }

    /// Hermitian conjugate: each term is reversed, every creation operator becomes an
    /// annihilation operator and vice versa, and coefficients are conjugated.
    pub fn hermitian_conjugated(&self) -> Self {
        let mut out = Self::zero();
        for (term, coeff) in &self.terms {
            let conj: Term = term.iter().rev().map(|&(i, c)| (i, !c)).collect();
            out.add_term(conj, coeff.conj());
        }
        out
    }

    /// Rewrite every term with creation operators to the left of annihilation operators, each
    /// group sorted by descending orbital index. Every transposition of two ladder operators
    /// flips the sign; moving a_i^ past a_i also produces the contracted term, and a repeated
    /// identical ladder operator removes the term.
    pub fn normal_ordered(&self) -> Self {
        let mut out = Self::zero();
        for (term, coeff) in &self.terms {
            normal_order_term(term.clone(), *coeff, &mut out);
        }
        out
    }

    /// Find the first term where the normal ordered operator differs from its normal ordered
    /// Hermitian conjugate. Returns the term, its coefficient and the conjugate's coefficient.
    pub fn hermiticity_violation(&self) -> Option<(Term, C64, C64)> {
        let ordered = self.normal_ordered();
        let conjugate = self.hermitian_conjugated().normal_ordered();
        let zero = C64::new(0.0, 0.0);
        for term in ordered.terms.keys().chain(conjugate.terms.keys()) {
            let value = ordered.get(term).unwrap_or(zero);
            let mirror = conjugate.get(term).unwrap_or(zero);
            if !close(value, mirror) {
                return Some((term.clone(), value, mirror));
            }
        }
        None
    }

    pub fn is_hermitian(&self) -> bool {
        self.hermiticity_violation().is_none()
    }
}

// Bubble sort a term into normal order, pushing contracted terms recursively into `out`.
fn normal_order_term(mut term: Term, mut coeff: C64, out: &mut FermionOperator) {
    for i in 1..term.len() {
        for j in (1..=i).rev() {
            let right = term[j];
            let left = term[j - 1];
            if right.1 && !left.1 {
                term.swap(j - 1, j);
                coeff = -coeff;
                // a_i a_i^ = 1 - a_i^ a_i
                if right.0 == left.0 {
                    let mut contracted = term[..j - 1].to_vec();
                    contracted.extend_from_slice(&term[j + 1..]);
                    normal_order_term(contracted, -coeff, out);
                }
            } else if right.1 == left.1 {
                if right.0 == left.0 {
                    return;
                }
                if right.0 > left.0 {
                    term.swap(j - 1, j);
                    coeff = -coeff;
                }
            }
        }
    }
    out.add_term(term, coeff);
}

/// Parse a whitespace separated list of ladder operators, e.g. "1^ 0".
pub fn parse_term(s: &str) -> Result<Term> {
    s.split_whitespace()
        .map(|tok| {
            let (digits, creation) = match tok.strip_suffix('^') {
                Some(d) => (d, true),
                None => (tok, false),
            };
            digits
                .parse::<usize>()
                .map(|i| (i, creation))
                .map_err(|_| HamiltonianError::Parse(s.to_string()))
        })
        .collect()
}

/// Render a term in the same notation accepted by `parse_term`.
pub fn term_to_string(term: &[LadderOp]) -> String {
    term.iter()
        .map(|&(i, c)| if c { format!("{i}^") } else { format!("{i}") })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for FermionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (term, coeff) in &self.terms {
            writeln!(f, "{} [{}] +", coeff, term_to_string(term))?;
        }
        Ok(())
    }
}

impl AddAssign for FermionOperator {
    fn add_assign(&mut self, rhs: Self) {
        for (term, coeff) in rhs.terms {
            self.add_term(term, coeff);
        }
    }
}

impl Add for FermionOperator {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(s: &str, re: f64) -> FermionOperator {
        FermionOperator::parse(s, C64::new(re, 0.0)).unwrap()
    }

    #[test]
    fn parse_reads_creation_and_annihilation() {
        let term = parse_term("3^ 0 12^").unwrap();
        assert_eq!(term, vec![(3, true), (0, false), (12, true)]);
        assert_eq!(term_to_string(&term), "3^ 0 12^");
        assert!(parse_term("").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse_term("0^ x"), Err(HamiltonianError::Parse(_))));
        assert!(matches!(parse_term("^"), Err(HamiltonianError::Parse(_))));
    }

    #[test]
    fn identical_terms_accumulate() {
        let sum = op("0^ 1", 1.0) + op("0^ 1", 2.5) + op("1^ 0", 1.0);
        assert_eq!(sum.len(), 2);
        assert_eq!(sum.get(&[(0, true), (1, false)]), Some(C64::new(3.5, 0.0)));
    }

    #[test]
    fn zero_coefficients_are_kept() {
        let sum = op("0^ 0", 2.0) + op("0^ 1", 0.0);
        assert_eq!(sum.len(), 2);
        assert_eq!(sum.many_body_order(), 2);
    }

    #[test]
    fn hermitian_conjugate_reverses_and_flips() {
        let a = FermionOperator::parse("0^ 1^ 2", C64::new(1.0, 2.0)).unwrap();
        let dag = a.hermitian_conjugated();
        assert_eq!(dag.get(&[(2, true), (1, false), (0, false)]), Some(C64::new(1.0, -2.0)));
    }

    #[test]
    fn normal_order_contracts_same_index() {
        // a_0 a_0^ = 1 - a_0^ a_0
        let ordered = op("0 0^", 1.0).normal_ordered();
        assert_eq!(ordered.constant(), C64::new(1.0, 0.0));
        assert_eq!(ordered.get(&[(0, true), (0, false)]), Some(C64::new(-1.0, 0.0)));
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn normal_order_sorts_descending_with_sign() {
        let ordered = op("0^ 1^", 1.0).normal_ordered();
        assert_eq!(ordered.get(&[(1, true), (0, true)]), Some(C64::new(-1.0, 0.0)));
        let ordered = op("2 0^ 3", 1.0).normal_ordered();
        // 2 0^ 3 -> -0^ 2 3 -> 0^ 3 2
        assert_eq!(ordered.get(&[(0, true), (3, false), (2, false)]), Some(C64::new(1.0, 0.0)));
        assert_eq!(ordered.len(), 1);
    }

    #[test]
    fn normal_order_drops_repeated_operator() {
        assert!(op("1^ 1^", 1.0).normal_ordered().is_empty());
    }

    #[test]
    fn hermiticity() {
        let herm = op("0^ 1", 1.0) + op("1^ 0", 1.0) + op("0^ 0", 0.5);
        assert!(herm.is_hermitian());
        let (term, value, mirror) = op("0^ 1", 1.0).hermiticity_violation().unwrap();
        assert_eq!(term.len(), 2);
        assert!((value - mirror).norm() > 0.5);
    }

    #[test]
    fn hermiticity_uses_zero_tolerance() {
        let nearly = op("0^ 1", 1.0) + op("1^ 0", 1.0 + 1e-9);
        assert!(!nearly.is_hermitian());
        let within = op("0^ 1", 1.0) + op("1^ 0", 1.0 + 1e-14);
        assert!(within.is_hermitian());
    }
}
