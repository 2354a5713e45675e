//! math::inverse — dense inversion of `(I - A)`-type systems.
//!
//! Purpose
//! -------
//! Bridge between `ndarray` storage and `nalgebra` linear algebra to form
//! the Leontief and Ghosh inverses. The matrix is copied into a
//! `nalgebra::DMatrix`, inverted through LU decomposition and copied back.
//!
//! Key behaviors
//! -------------
//! - [`fill_dmatrix`] / [`fill_array2`] copy between the two storage types.
//! - [`invert`] returns `MathError::SingularMatrix` naming the failed table
//!   when the LU factorization has a zero pivot or the result is not finite.
//! - [`identity_minus`] builds `I - M` for a square `M`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are square; non-square inputs are rejected before copying.
//! - No pseudo-inverse fallback: a singular system is fatal for the caller.
use crate::math::errors::{MathError, MathResult};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Invert a square matrix, labeling failures with `table`.
///
/// Errors
/// ------
/// - `MathError::NotSquare` for a non-square input.
/// - `MathError::SingularMatrix` when LU inversion fails or yields
///   non-finite values.
pub fn invert(matrix: &Array2<f64>, table: &str) -> MathResult<Array2<f64>> {
    let (n, m) = matrix.dim();
    if n != m {
        return Err(MathError::NotSquare { table: table.to_string(), shape: (n, m) });
    }
    let mut nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(matrix, &mut nalg);
    let inv = nalg.lu().try_inverse().ok_or_else(|| MathError::SingularMatrix { table: table.to_string() })?;
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix { table: table.to_string() });
    }
    let mut out = Array2::<f64>::zeros((n, n));
    fill_array2(&inv, &mut out);
    Ok(out)
}

/// `I - m` for a square `m`.
pub fn identity_minus(m: &Array2<f64>) -> Array2<f64> {
    Array2::<f64>::eye(m.nrows()) - m
}

// ---- Helper methods ----

/// Copy an `ndarray` matrix into a preallocated `DMatrix` of equal shape.
pub fn fill_dmatrix(source: &Array2<f64>, target: &mut DMatrix<f64>) {
    for j in 0..source.ncols() {
        for i in 0..source.nrows() {
            target[(i, j)] = source[[i, j]];
        }
    }
}

/// Copy a `DMatrix` into a preallocated `ndarray` matrix of equal shape.
pub fn fill_array2(source: &DMatrix<f64>, target: &mut Array2<f64>) {
    for j in 0..source.ncols() {
        for i in 0..source.nrows() {
            target[[i, j]] = source[(i, j)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Lossless copying between ndarray and nalgebra storage.
    // - Inversion of a known 2×2 system.
    // - Singular and non-square error paths.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `fill_dmatrix` copies entries without altering them.
    fn fill_dmatrix_copies_entries() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let mut d = DMatrix::<f64>::zeros(2, 2);
        fill_dmatrix(&a, &mut d);

        assert_eq!(d[(0, 1)], 2.0);
        assert_eq!(d[(1, 0)], 3.0);
    }

    #[test]
    // Purpose
    // -------
    // Inverting a diagonal matrix yields reciprocals on the diagonal.
    fn invert_diagonal_matrix() {
        let a = array![[4.0, 0.0], [0.0, 0.5]];
        let inv = invert(&a, "test").unwrap();

        assert!((inv[[0, 0]] - 0.25).abs() < 1e-12);
        assert!((inv[[1, 1]] - 2.0).abs() < 1e-12);
        assert!(inv[[0, 1]].abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A singular matrix is reported with the table name.
    fn invert_singular_matrix_fails_with_table_name() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert_eq!(invert(&a, "L"), Err(MathError::SingularMatrix { table: "L".to_string() }));
    }

    #[test]
    // Purpose
    // -------
    // Non-square input is rejected before any copy.
    fn invert_rejects_non_square() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(matches!(invert(&a, "G"), Err(MathError::NotSquare { .. })));
    }
}
