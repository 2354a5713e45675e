//! math::identities — the input-output identities on labeled tables.
//!
//! Purpose
//! -------
//! Implement the elementary relations between flows, outputs,
//! coefficients, inverses and stressor tables. Each function is pure and
//! returns a new [`Table`] labeled consistently with its inputs.
//!
//! Key behaviors
//! -------------
//! - Output: `x = rowsum(Z) + rowsum(Y)` ([`calc_x`]) or `x = L · y`
//!   ([`calc_x_from_l`]).
//! - Coefficients: `A = Z · diag(x)⁻¹` ([`calc_a`]), `Z = A · diag(x)`
//!   ([`calc_z`]), Ghosh `B = diag(x)⁻¹ · Z` ([`calc_b`]).
//! - Inverses: `L = (I - A)⁻¹` ([`calc_l`]), `G = (I - B)⁻¹` ([`calc_g`]).
//! - Stressors: `S = F · diag(x)⁻¹`, `F = S · diag(x)`, `S_Y`, `F_Y`,
//!   multipliers `M = S · L` and `M_down = S · (G - I)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Entries normalized by a zero output are defined as zero, never
//!   `inf`/`NaN`. This is a modeling convention for idle sectors.
//! - Every product checks axis alignment through [`Table::dot`]; a
//!   misordered input fails with a structural error.
//!
//! Conventions
//! -----------
//! - `x` is an `n × 1` table labeled `indout`.
//! - Final-demand totals `y` are `n × 1` tables; column totals of `Y` used
//!   for `S_Y` are plain vectors.
use crate::math::{
    errors::{MathError, MathResult},
    inverse::{identity_minus, invert},
};
use crate::table::{Table, INDOUT};
use ndarray::{Array1, Axis};

/// `x = rowsum(Z) + rowsum(Y)`.
///
/// Errors
/// ------
/// - `MathError::Table` when `Z` and `Y` rows are not identically ordered.
pub fn calc_x(z: &Table, y: &Table) -> MathResult<Table> {
    if !z.rows().same_order(y.rows()) {
        return Err(MathError::Table(crate::table::TableError::IndexMismatch {
            operation: "output from Z and Y".to_string(),
        }));
    }
    let x = z.row_sums() + y.row_sums();
    Ok(Table::column(x, z.rows().clone(), INDOUT)?)
}

/// `x = L · y` for a final demand column vector `y`.
pub fn calc_x_from_l(l: &Table, y: &Table) -> MathResult<Table> {
    let x = l.dot(y)?;
    Ok(x.with_cols(crate::table::Index::single(INDOUT, [INDOUT]))?)
}

/// `Z = A · diag(x)`.
pub fn calc_z(a: &Table, x: &Table) -> MathResult<Table> {
    ensure_output_aligned(a, x, "Z from A and x")?;
    Ok(a.scale_columns(&output_vector(x))?)
}

/// `A = Z · diag(x)⁻¹` with zero columns where `x = 0`.
pub fn calc_a(z: &Table, x: &Table) -> MathResult<Table> {
    ensure_output_aligned(z, x, "A from Z and x")?;
    Ok(z.div_columns_guarded(&output_vector(x))?)
}

/// Ghosh coefficients `B = diag(x)⁻¹ · Z` with zero rows where `x = 0`.
pub fn calc_b(z: &Table, x: &Table) -> MathResult<Table> {
    if !z.rows().same_order(x.rows()) {
        return Err(MathError::Table(crate::table::TableError::IndexMismatch {
            operation: "B from Z and x".to_string(),
        }));
    }
    Ok(z.div_rows_guarded(&output_vector(x))?)
}

/// Leontief inverse `L = (I - A)⁻¹`.
///
/// Errors
/// ------
/// - `MathError::SingularMatrix { table: "L" }` when `I - A` is singular.
pub fn calc_l(a: &Table) -> MathResult<Table> {
    let inv = invert(&identity_minus(a.data()), "L")?;
    Ok(a.with_data(inv)?)
}

/// Technical coefficients back from the Leontief inverse: `A = I - L⁻¹`.
pub fn calc_a_from_l(l: &Table) -> MathResult<Table> {
    let inv = invert(l.data(), "A")?;
    Ok(l.with_data(identity_minus(&inv))?)
}

/// Ghosh inverse `G = (I - B)⁻¹`.
///
/// Errors
/// ------
/// - `MathError::SingularMatrix { table: "G" }` when `I - B` is singular.
pub fn calc_g(b: &Table) -> MathResult<Table> {
    let inv = invert(&identity_minus(b.data()), "G")?;
    Ok(b.with_data(inv)?)
}

/// Stressor coefficients `S = F · diag(x)⁻¹`.
pub fn calc_s(f: &Table, x: &Table) -> MathResult<Table> {
    calc_a(f, x)
}

/// Direct stressors `F = S · diag(x)`.
pub fn calc_f(s: &Table, x: &Table) -> MathResult<Table> {
    calc_z(s, x)
}

/// Final-demand stressor coefficients `S_Y = F_Y · diag(colsum(Y))⁻¹`.
pub fn calc_s_y(f_y: &Table, y_totals: &Array1<f64>) -> MathResult<Table> {
    Ok(f_y.div_columns_guarded(y_totals)?)
}

/// Final-demand stressors `F_Y = S_Y · diag(colsum(Y))`.
pub fn calc_f_y(s_y: &Table, y_totals: &Array1<f64>) -> MathResult<Table> {
    Ok(s_y.scale_columns(y_totals)?)
}

/// Upstream multipliers `M = S · L`.
pub fn calc_m(s: &Table, l: &Table) -> MathResult<Table> {
    Ok(s.dot(l)?)
}

/// Downstream multipliers `M_down = S · (G - I)`.
///
/// `M + M_down` then covers upstream and downstream requirements while
/// counting the direct term once.
pub fn calc_m_down(s: &Table, g: &Table) -> MathResult<Table> {
    let g_minus_i = g.sub(&Table::identity(g.rows()))?;
    Ok(s.dot(&g_minus_i)?)
}

/// Column totals of a final demand table, one per `(region, category)`.
pub fn final_demand_totals(y: &Table) -> Array1<f64> {
    y.data().sum_axis(Axis(0))
}

// ---- Helper methods ----

fn output_vector(x: &Table) -> Array1<f64> {
    x.data().column(0).to_owned()
}

fn ensure_output_aligned(t: &Table, x: &Table, operation: &str) -> MathResult<()> {
    if t.cols().keys() == x.rows().keys() && x.ncols() == 1 {
        Ok(())
    } else {
        Err(MathError::Table(crate::table::TableError::IndexMismatch { operation: operation.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Index, SECTOR};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The Miller & Blair two-sector example (Table 2.3): x, A and L.
    // - The Z ↔ A round trip and the zero-output convention.
    // - Ghosh coefficients and the M_down definition.
    //
    // They intentionally DO NOT cover:
    // - Trade accounts (see `accounts`) or system orchestration.
    // -------------------------------------------------------------------------

    fn sectors() -> Index {
        Index::single(SECTOR, ["s1", "s2"])
    }

    fn miller_blair() -> (Table, Table) {
        let z = Table::new(array![[150.0, 500.0], [200.0, 100.0]], sectors(), sectors()).unwrap();
        let y = Table::new(array![[350.0], [1700.0]], sectors(), Index::single("category", ["fd"]))
            .unwrap();
        (z, y)
    }

    #[test]
    // Purpose
    // -------
    // Reproduce the textbook two-sector example.
    //
    // Given
    // -----
    // - Z = [[150, 500], [200, 100]], Y = [[350], [1700]].
    //
    // Expect
    // ------
    // - x = [1000, 2000], A = [[0.15, 0.25], [0.20, 0.05]],
    //   L ≈ [[1.2541, 0.3300], [0.2640, 1.1221]] to four decimals.
    fn miller_blair_output_coefficients_and_leontief() {
        let (z, y) = miller_blair();

        let x = calc_x(&z, &y).unwrap();
        assert_eq!(x.data(), &array![[1000.0], [2000.0]]);

        let a = calc_a(&z, &x).unwrap();
        let expected_a = array![[0.15, 0.25], [0.20, 0.05]];
        for (v, e) in a.data().iter().zip(expected_a.iter()) {
            assert!((v - e).abs() < 1e-12);
        }

        let l = calc_l(&a).unwrap();
        let expected_l = array![[1.2541, 0.3300], [0.2640, 1.1221]];
        for (v, e) in l.data().iter().zip(expected_l.iter()) {
            assert!((v - e).abs() < 5e-5);
        }
    }

    #[test]
    // Purpose
    // -------
    // `x = L · y` reproduces the output of the flow-based calculation.
    fn calc_x_from_l_matches_row_sums() {
        let (z, y) = miller_blair();
        let x = calc_x(&z, &y).unwrap();
        let l = calc_l(&calc_a(&z, &x).unwrap()).unwrap();

        let x_l = calc_x_from_l(&l, &y.row_totals("fd").unwrap()).unwrap();
        assert!(x_l.approx_eq(&x, 1e-9));
    }

    #[test]
    // Purpose
    // -------
    // Z = A · diag(x) recovers the original flows.
    fn z_round_trips_through_a() {
        let (z, y) = miller_blair();
        let x = calc_x(&z, &y).unwrap();
        let a = calc_a(&z, &x).unwrap();

        assert!(calc_z(&a, &x).unwrap().approx_eq(&z, 1e-9));
    }

    #[test]
    // Purpose
    // -------
    // A is recoverable from L alone.
    fn a_recovered_from_leontief_inverse() {
        let (z, y) = miller_blair();
        let x = calc_x(&z, &y).unwrap();
        let a = calc_a(&z, &x).unwrap();
        let l = calc_l(&a).unwrap();

        assert!(calc_a_from_l(&l).unwrap().approx_eq(&a, 1e-12));
    }

    #[test]
    // Purpose
    // -------
    // A zero-output sector yields an all-zero coefficient column.
    //
    // Given
    // -----
    // - Sector s2 with no inputs, no sales and no final demand.
    //
    // Expect
    // ------
    // - Column s2 of A is exactly zero, all entries finite.
    fn zero_output_column_is_zero_not_nan() {
        let z = Table::new(array![[10.0, 0.0], [0.0, 0.0]], sectors(), sectors()).unwrap();
        let y = Table::new(array![[5.0], [0.0]], sectors(), Index::single("category", ["fd"]))
            .unwrap();
        let x = calc_x(&z, &y).unwrap();
        let a = calc_a(&z, &x).unwrap();

        assert!(a.is_finite());
        assert_eq!(a.data()[[0, 1]], 0.0);
        assert_eq!(a.data()[[1, 1]], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Ghosh coefficients are row-normalized flows, and
    // M_down = S · (G - I).
    fn ghosh_coefficients_and_downstream_multiplier() {
        let (z, y) = miller_blair();
        let x = calc_x(&z, &y).unwrap();
        let b = calc_b(&z, &x).unwrap();
        assert!((b.data()[[0, 1]] - 0.5).abs() < 1e-12);
        assert!((b.data()[[1, 0]] - 0.1).abs() < 1e-12);

        let g = calc_g(&b).unwrap();
        let f = Table::new(array![[650.0, 1400.0]], Index::single("stressor", ["va"]), sectors())
            .unwrap();
        let s = calc_s(&f, &x).unwrap();
        let m_down = calc_m_down(&s, &g).unwrap();

        let g_minus_i = g.data() - &ndarray::Array2::<f64>::eye(2);
        let expected = s.data().dot(&g_minus_i);
        for (v, e) in m_down.data().iter().zip(expected.iter()) {
            assert!((v - e).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Value-added multipliers of a closed economy sum to one per sector.
    //
    // Given
    // -----
    // - F = value added [650, 1400] for the textbook example.
    //
    // Expect
    // ------
    // - M = S · L equals [1, 1] (every unit of final demand is value added).
    fn value_added_multipliers_are_one() {
        let (z, y) = miller_blair();
        let x = calc_x(&z, &y).unwrap();
        let l = calc_l(&calc_a(&z, &x).unwrap()).unwrap();
        let f = Table::new(array![[650.0, 1400.0]], Index::single("stressor", ["va"]), sectors())
            .unwrap();
        let m = calc_m(&calc_s(&f, &x).unwrap(), &l).unwrap();

        assert!((m.data()[[0, 0]] - 1.0).abs() < 1e-9);
        assert!((m.data()[[0, 1]] - 1.0).abs() < 1e-9);
    }
}
