// utils.rs
use ndarray::{Array2, ArrayD, Dimension};

use crate::C64;

/// Format a complex 2D array as a matrix, one row per line.
/// # Arguments
///     `a`:  Array2, matrix to format.
pub fn format_array2(a: &Array2<C64>) -> String {
    let (nr, nc) = a.dim();
    let mut out = String::new();
    for i in 0..nr {
        for j in 0..nc {
            let z = a[(i, j)];
            out.push_str(&format!("{:>12.6}{:>+12.6}i", z.re, z.im));
        }
        out.push('\n');
    }
    out
}

/// Print a 2D array as a matrix.
/// # Arguments
///     `a`:  Array2, matrix to print.
pub fn print_array2(a: &Array2<C64>) {
    print!("{}", format_array2(a));
}

/// Print the non-zero elements of a tensor of any rank with their coordinates.
/// # Arguments
///    `t`: ArrayD, tensor to print.
pub fn print_nonzero(t: &ArrayD<C64>) {
    for (idx, z) in t.indexed_iter() {
        if z.norm() > 0.0 {
            println!("{:?} {:>12.6}{:>+12.6}i", idx.slice(), z.re, z.im);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn formats_rows() {
        let a = array![[C64::new(1.0, 0.0), C64::new(0.0, -2.0)]];
        let s = format_array2(&a);
        assert_eq!(s.lines().count(), 1);
        assert!(s.contains("1.000000"));
        assert!(s.contains("-2.000000i"));
    }
}
