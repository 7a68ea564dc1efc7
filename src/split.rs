// split.rs
use std::collections::BTreeMap;

use crate::error::{HamiltonianError, Result};
use crate::operator::{term_to_string, FermionOperator};
use crate::C64;

// Storage for an operator partitioned by rank.
#[derive(Debug, Clone, Default)]
pub struct RankSplit {
    // Sub-operator for every non-zero rank present, keyed by rank.
    pub ranks: BTreeMap<usize, FermionOperator>,
    // Sum of all constant (rank 0) coefficients.
    pub e_0: C64,
}

/// Partition `op` by the number of ladder operators in each term. Constant terms are summed
/// into `e_0`, every other term is accumulated into the sub-operator of its rank.
/// # Arguments
///     `op`: FermionOperator, operator to split. Hermiticity is checked by the caller.
pub fn split_by_rank(op: &FermionOperator) -> Result<RankSplit> {
    let mut split = RankSplit::default();
    for (term, coeff) in op.iter() {
        let rank = term.len();
        if rank % 2 == 1 {
            return Err(HamiltonianError::InvalidRank {rank, term: term_to_string(term)});
        }
        if rank == 0 {
            split.e_0 += *coeff;
        } else {
            split.ranks.entry(rank).or_default().add_term(term.clone(), *coeff);
        }
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(s: &str, re: f64) -> FermionOperator {
        FermionOperator::parse(s, C64::new(re, 0.0)).unwrap()
    }

    #[test]
    fn splits_terms_by_rank() {
        let ops = op("", 0.5) + op("0^ 0", 1.0) + op("1^ 1", 2.0) + op("1^ 0^ 1 0", 3.0) + op("", 0.25);
        let split = split_by_rank(&ops).unwrap();
        assert_eq!(split.e_0, C64::new(0.75, 0.0));
        assert_eq!(split.ranks.len(), 2);
        assert_eq!(split.ranks[&2].len(), 2);
        assert_eq!(split.ranks[&4].len(), 1);
        assert_eq!(split.ranks[&4].get(&[(1, true), (0, true), (1, false), (0, false)]), Some(C64::new(3.0, 0.0)));
    }

    #[test]
    fn odd_rank_rejected_for_any_coefficient() {
        for coeff in [0.0, 1.0, -7.5] {
            let ops = op("0^ 0", 1.0) + op("0^ 1 2", coeff);
            match split_by_rank(&ops) {
                Err(HamiltonianError::InvalidRank {rank, term}) => {
                    assert_eq!(rank, 3);
                    assert_eq!(term, "0^ 1 2");
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn constant_only() {
        let split = split_by_rank(&FermionOperator::identity(C64::new(0.0, 1.0))).unwrap();
        assert!(split.ranks.is_empty());
        assert_eq!(split.e_0, C64::new(0.0, 1.0));
    }
}
