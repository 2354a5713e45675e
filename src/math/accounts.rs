//! math::accounts — production, consumption and trade-embodied accounts.
//!
//! Purpose
//! -------
//! Decompose the stressors of an extension into production-based (`D_pba`),
//! consumption-based (`D_cba`), import-embodied (`D_imp`) and
//! export-embodied (`D_exp`) accounts, first per region × sector and then
//! per region and per capita.
//!
//! Key behaviors
//! -------------
//! - [`calc_accounts`] spreads the per-region final demand `Y_agg` into a
//!   sector-resolved block diagonal `Y_diag`, forms the output it triggers
//!   `X_diag = L · Y_diag`, and derives:
//!   - `D_cba = S · X_diag` (column = consuming region × product),
//!   - `D_pba = S · diag(rowsum(X_diag))`,
//!   - `D_imp = S · X_trade` where `X_trade` is `X_diag` with the output a
//!     region produces for its own final demand zeroed,
//!   - `D_exp = S · diag(rowsum(X_trade))`.
//! - [`calc_regional_accounts`] sums the sector accounts per region and
//!   adds the direct final-demand stressors `F_Y` to `D_cba` and `D_pba`.
//! - [`calc_per_capita`] divides regional accounts by population.
//! - [`account_identity_residual`] evaluates `cba − pba − imp + exp`,
//!   which vanishes for consistent accounts.
//!
//! Invariants & assumptions
//! ------------------------
//! - `S` columns, `L` rows/columns and `Y_agg` rows share one region ×
//!   sector index in identical order; this is checked, not assumed.
//! - The zeroing of domestic output happens after multiplication by the
//!   full `L`, so `cba − imp = pba − exp` holds per region exactly (up to
//!   floating point), including domestic output embodied in re-imports.
//!
//! Conventions
//! -----------
//! - `Y_agg` columns are a single `region` level (one column per consuming
//!   region); sector accounts are labeled `(region, sector)`.
//! - Per-capita division by a zero population yields zero.
use crate::math::{
    blocks::diagonalize_columns_to_sectors,
    errors::{MathError, MathResult},
    inverse::invert,
};
use crate::table::{FillPolicy, Table, TableError, REGION, SECTOR};

/// The four sector-resolved accounts of one extension.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorAccounts {
    pub d_cba: Table,
    pub d_pba: Table,
    pub d_imp: Table,
    pub d_exp: Table,
}

/// The four accounts summed per region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalAccounts {
    pub d_cba_reg: Table,
    pub d_pba_reg: Table,
    pub d_imp_reg: Table,
    pub d_exp_reg: Table,
}

/// The four regional accounts divided by population.
#[derive(Debug, Clone, PartialEq)]
pub struct PerCapitaAccounts {
    pub d_cba_cap: Table,
    pub d_pba_cap: Table,
    pub d_imp_cap: Table,
    pub d_exp_cap: Table,
}

/// Sector-resolved accounts from `S`, `L` and per-region final demand.
///
/// With `X_diag = L · Y_diag`, the trade accounts use `X_trade`, which is
/// `X_diag` with its domestic (producing region = consuming region) blocks
/// zeroed after the multiplication: `D_imp = S · X_trade` and
/// `D_exp = S ⊙ rowsum(X_trade)`.
///
/// Errors
/// ------
/// - `MathError::Table` when `S`, `L` and `Y_agg` are not aligned.
/// - `MathError::BlockSize` when rows are not a region-major product.
pub fn calc_accounts(s: &Table, l: &Table, y_agg: &Table) -> MathResult<SectorAccounts> {
    let y_diag = diagonalize_columns_to_sectors(y_agg, SECTOR)?;
    let x_diag = l.dot(&y_diag)?;
    let x_tot = x_diag.row_sums();

    let d_cba = s.dot(&x_diag)?;
    let d_pba = s.scale_columns(&x_tot)?;

    let x_trade = zero_own_demand(&x_diag)?;
    let x_exp = x_trade.row_sums();
    let d_imp = s.dot(&x_trade)?;
    let d_exp = s.scale_columns(&x_exp)?;

    Ok(SectorAccounts { d_cba, d_pba, d_imp, d_exp })
}

/// Regional accounts; `f_y` (when given) adds to `D_cba` and `D_pba`.
pub fn calc_regional_accounts(accounts: &SectorAccounts, f_y: Option<&Table>) -> MathResult<RegionalAccounts> {
    let d_cba_reg = accounts.d_cba.sum_columns_by_level(REGION)?;
    let d_pba_reg = accounts.d_pba.sum_columns_by_level(REGION)?;
    let d_imp_reg = accounts.d_imp.sum_columns_by_level(REGION)?;
    let d_exp_reg = accounts.d_exp.sum_columns_by_level(REGION)?;

    let (d_cba_reg, d_pba_reg) = match f_y {
        Some(f_y) => {
            let f_y_agg = f_y
                .reindex_rows(d_cba_reg.rows(), FillPolicy::Fail)?
                .sum_columns_by_level(REGION)?
                .reindex_cols(d_cba_reg.cols(), FillPolicy::Value(0.0))?;
            let f_y_pba = f_y_agg.reindex_cols(d_pba_reg.cols(), FillPolicy::Value(0.0))?;
            (d_cba_reg.add(&f_y_agg)?, d_pba_reg.add(&f_y_pba)?)
        }
        None => (d_cba_reg, d_pba_reg),
    };
    Ok(RegionalAccounts { d_cba_reg, d_pba_reg, d_imp_reg, d_exp_reg })
}

/// Regional accounts per inhabitant.
///
/// `population` is a `1 × r` table with a `region` column index.
pub fn calc_per_capita(regional: &RegionalAccounts, population: &Table) -> MathResult<PerCapitaAccounts> {
    let per_capita = |t: &Table| -> MathResult<Table> {
        let pop = population.reindex_cols(t.cols(), FillPolicy::Fail)?;
        Ok(t.div_columns_guarded(&pop.data().row(0).to_owned())?)
    };
    Ok(PerCapitaAccounts {
        d_cba_cap: per_capita(&regional.d_cba_reg)?,
        d_pba_cap: per_capita(&regional.d_pba_reg)?,
        d_imp_cap: per_capita(&regional.d_imp_reg)?,
        d_exp_cap: per_capita(&regional.d_exp_reg)?,
    })
}

/// `D_cba − D_pba − D_imp + D_exp` per region; zero for consistent accounts.
pub fn account_identity_residual(regional: &RegionalAccounts) -> MathResult<Table> {
    let pba = regional.d_pba_reg.align_to(&regional.d_cba_reg)?;
    let imp = regional.d_imp_reg.align_to(&regional.d_cba_reg)?;
    let exp = regional.d_exp_reg.align_to(&regional.d_cba_reg)?;
    Ok(regional.d_cba_reg.sub(&pba)?.sub(&imp)?.add(&exp)?)
}

/// Recover multipliers from footprints: `M = D_cba · Y_diag⁻¹`.
///
/// Requires the sector-resolved final demand to be invertible, i.e. every
/// region demands every product from its own diagonal position.
pub fn recalc_m(d_cba: &Table, y_agg: &Table) -> MathResult<Table> {
    let y_diag = diagonalize_columns_to_sectors(y_agg, SECTOR)?;
    if y_diag.nrows() != y_diag.ncols() {
        return Err(MathError::NotSquare { table: "Y_diag".to_string(), shape: y_diag.shape() });
    }
    let inv = invert(y_diag.data(), "Y_diag")?;
    if d_cba.cols().keys() != y_diag.cols().keys() {
        return Err(MathError::Table(TableError::IndexMismatch {
            operation: "multipliers from D_cba".to_string(),
        }));
    }
    let m = d_cba.data().dot(&inv);
    Ok(Table::new(m, d_cba.rows().clone(), y_diag.rows().clone())?)
}

// ---- Helper methods ----

/// Zero output that a region produces for its own final demand.
fn zero_own_demand(x_diag: &Table) -> MathResult<Table> {
    Ok(x_diag.zero_domestic_blocks(REGION)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::identities::{calc_a, calc_l, calc_s, calc_x};
    use crate::table::{Index, CATEGORY};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The accounting identity cba = pba + imp − exp on a two-region
    //   system with direct final-demand stressors.
    // - Pinned sector-level values, once with L = I and once with
    //   intermediate use, both checked by hand.
    // - Per-capita division and multiplier recovery from footprints.
    // -------------------------------------------------------------------------

    fn reg_sec() -> Index {
        Index::product(&[REGION, SECTOR], &[vec!["R1".into(), "R2".into()], vec!["a".into(), "b".into()]])
            .unwrap()
    }

    fn reg_cat() -> Index {
        Index::product(&[REGION, CATEGORY], &[vec!["R1".into(), "R2".into()], vec!["hh".into(), "gov".into()]])
            .unwrap()
    }

    fn two_region() -> (Table, Table, Table, Table) {
        let z = Table::new(
            array![
                [10.0, 5.0, 3.0, 1.0],
                [4.0, 8.0, 2.0, 2.0],
                [2.0, 1.0, 12.0, 6.0],
                [1.0, 3.0, 5.0, 9.0]
            ],
            reg_sec(),
            reg_sec(),
        )
        .unwrap();
        let y = Table::new(
            array![[20.0, 5.0, 4.0, 1.0], [15.0, 3.0, 3.0, 2.0], [3.0, 1.0, 25.0, 6.0], [2.0, 2.0, 18.0, 4.0]],
            reg_sec(),
            reg_cat(),
        )
        .unwrap();
        let f = Table::new(
            array![[5.0, 3.0, 7.0, 2.0], [1.0, 1.0, 1.0, 1.0]],
            Index::single("stressor", ["CO2", "water"]),
            reg_sec(),
        )
        .unwrap();
        let f_y = Table::new(
            array![[2.0, 0.0, 3.0, 0.0], [0.5, 0.5, 0.5, 0.5]],
            Index::single("stressor", ["CO2", "water"]),
            reg_cat(),
        )
        .unwrap();
        (z, y, f, f_y)
    }

    #[test]
    // Purpose
    // -------
    // The regional accounts satisfy cba = pba + imp − exp.
    //
    // Given
    // -----
    // - A 2-region, 2-sector system with two categories per region and
    //   direct final-demand stressors.
    //
    // Expect
    // ------
    // - The identity residual is zero within 1e-9 for every stressor and
    //   region, and global cba equals global pba.
    fn regional_accounts_satisfy_trade_identity() {
        let (z, y, f, f_y) = two_region();
        let x = calc_x(&z, &y).unwrap();
        let l = calc_l(&calc_a(&z, &x).unwrap()).unwrap();
        let s = calc_s(&f, &x).unwrap();
        let y_agg = y.sum_columns_by_level(REGION).unwrap();

        let sector = calc_accounts(&s, &l, &y_agg).unwrap();
        let regional = calc_regional_accounts(&sector, Some(&f_y)).unwrap();
        let residual = account_identity_residual(&regional).unwrap();

        assert!(residual.data().iter().all(|v| v.abs() < 1e-9));
        assert!((regional.d_cba_reg.total() - regional.d_pba_reg.total()).abs() < 1e-9);
        // pba is F plus F_Y per region
        let co2_r1 = regional.d_pba_reg.get(&["CO2".to_string()], &["R1".to_string()]).unwrap();
        assert!((co2_r1 - (5.0 + 3.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Pin exact trade accounts when there is no intermediate trade.
    //
    // Given
    // -----
    // - L = I (no intermediate use), S = [1, 1, 1, 1].
    // - Y_agg: R1 demands 4 of (R1,a) and 2 of (R2,b); R2 demands 3 of
    //   (R2,a) and 1 of (R1,b).
    //
    // Expect
    // ------
    // - D_imp: R1 imports 2 (product b), R2 imports 1 (product b).
    // - D_exp: (R1,b) exports 1, (R2,b) exports 2, others 0.
    // - D_cba per region: R1 = 6, R2 = 4.
    fn trade_accounts_pinned_without_intermediate_use() {
        let l = Table::identity(&reg_sec());
        let s = Table::filled(Index::single("stressor", ["e"]), reg_sec(), 1.0);
        let y_agg = Table::new(
            array![[4.0, 0.0], [0.0, 1.0], [0.0, 3.0], [2.0, 0.0]],
            reg_sec(),
            Index::single(REGION, ["R1", "R2"]),
        )
        .unwrap();

        let acc = calc_accounts(&s, &l, &y_agg).unwrap();
        assert_eq!(acc.d_imp.data().row(0).to_vec(), vec![0.0, 2.0, 0.0, 1.0]);
        assert_eq!(acc.d_exp.data().row(0).to_vec(), vec![0.0, 1.0, 0.0, 2.0]);
        assert_eq!(acc.d_pba.data().row(0).to_vec(), vec![4.0, 1.0, 3.0, 2.0]);

        let reg = calc_regional_accounts(&acc, None).unwrap();
        assert_eq!(reg.d_cba_reg.data().row(0).to_vec(), vec![6.0, 4.0]);
    }

    #[test]
    // Purpose
    // -------
    // Pin exact trade accounts with intermediate use, where zeroing own
    // demand before or after multiplying by L gives different results.
    //
    // Given
    // -----
    // - Two regions with one sector each, S = [2, 1].
    // - L = [[1.25, 0.5], [0.25, 1.5]].
    // - Y_agg: R1 demands 4 from R1 and 2 from R2; R2 demands 1 from R1
    //   and 6 from R2.
    //
    // Expect
    // ------
    // - X_diag = L · Y_diag = [[6, 4.25], [4, 9.25]]; zeroing its domestic
    //   blocks leaves X_trade = [[0, 4.25], [4, 0]].
    // - D_imp = S · X_trade = [4, 8.5]; D_exp = S ⊙ rowsum(X_trade) = [8.5, 4].
    // - D_cba = [16, 17.75]; D_pba = [20.5, 13.25].
    // - Zeroing Y before L would give D_imp = [5, 2.75]; the result differs.
    fn trade_accounts_pinned_with_intermediate_use() {
        let core =
            Index::product(&[REGION, SECTOR], &[vec!["R1".into(), "R2".into()], vec!["a".into()]]).unwrap();
        let l = Table::new(array![[1.25, 0.5], [0.25, 1.5]], core.clone(), core.clone()).unwrap();
        let s = Table::new(array![[2.0, 1.0]], Index::single("stressor", ["e"]), core.clone()).unwrap();
        let y_agg = Table::new(array![[4.0, 1.0], [2.0, 6.0]], core, Index::single(REGION, ["R1", "R2"])).unwrap();

        let acc = calc_accounts(&s, &l, &y_agg).unwrap();
        let close = |t: &Table, expected: [f64; 2]| {
            t.data().row(0).iter().zip(expected.iter()).all(|(v, e)| (v - e).abs() < 1e-12)
        };
        assert!(close(&acc.d_imp, [4.0, 8.5]), "D_imp {:?}", acc.d_imp.data());
        assert!(close(&acc.d_exp, [8.5, 4.0]), "D_exp {:?}", acc.d_exp.data());
        assert!(close(&acc.d_cba, [16.0, 17.75]), "D_cba {:?}", acc.d_cba.data());
        assert!(close(&acc.d_pba, [20.5, 13.25]), "D_pba {:?}", acc.d_pba.data());
        assert!(!close(&acc.d_imp, [5.0, 2.75]));

        let regional = calc_regional_accounts(&acc, None).unwrap();
        let residual = account_identity_residual(&regional).unwrap();
        assert!(residual.data().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    // Purpose
    // -------
    // Per-capita accounts divide by population per region.
    fn per_capita_divides_by_population() {
        let t = Table::new(array![[10.0, 9.0]], Index::single("stressor", ["e"]), Index::single(REGION, ["R1", "R2"]))
            .unwrap();
        let regional = RegionalAccounts {
            d_cba_reg: t.clone(),
            d_pba_reg: t.clone(),
            d_imp_reg: t.clone(),
            d_exp_reg: t,
        };
        let population = Table::new(
            array![[3.0, 2.0]],
            Index::single("population", ["population"]),
            Index::single(REGION, ["R2", "R1"]),
        )
        .unwrap();

        let cap = calc_per_capita(&regional, &population).unwrap();
        assert_eq!(cap.d_cba_cap.data().row(0).to_vec(), vec![5.0, 3.0]);
    }

    #[test]
    // Purpose
    // -------
    // Multipliers recovered from footprints equal S · L.
    fn recalc_m_recovers_multipliers() {
        let (z, y, f, _) = two_region();
        let x = calc_x(&z, &y).unwrap();
        let l = calc_l(&calc_a(&z, &x).unwrap()).unwrap();
        let s = calc_s(&f, &x).unwrap();
        let y_agg = y.sum_columns_by_level(REGION).unwrap();
        let acc = calc_accounts(&s, &l, &y_agg).unwrap();

        let m = recalc_m(&acc.d_cba, &y_agg).unwrap();
        let expected = s.dot(&l).unwrap();
        for (v, e) in m.data().iter().zip(expected.data().iter()) {
            assert!((v - e).abs() < 1e-9);
        }
    }
}
