//! system::extension — satellite-account bundles aligned to a system.
//!
//! Purpose
//! -------
//! Hold the stressor tables of one satellite account (emissions, factor
//! inputs, ...) and derive their coefficients, multipliers and accounts
//! from the economic core they are attached to.
//!
//! Key behaviors
//! -------------
//! - Tables are stored in an explicit map from [`ExtensionTable`] to
//!   [`Table`]; presence is the presence of a map entry.
//! - [`Extension::calc_system`] fills in missing tables from the core
//!   tables handed over in a [`CalcContext`], in dependency order
//!   `F/S → S_Y/F_Y → M → M_down → D_* → D_*_reg → D_*_cap`.
//! - Resets strip derived tables back to flows or coefficients.
//!
//! Invariants & assumptions
//! ------------------------
//! - All tables share one row (stressor) index in identical order.
//! - Columns of `F`, `S`, `M`, `M_down` and `D_*` are the core's
//!   `(region, sector)` axis; `F_Y` and `S_Y` use `(region, category)`;
//!   regional and per-capita accounts use `region`.
//! - A calculation either commits every table it computed or none.
//!
//! Conventions
//! -----------
//! - Operations that emit warnings take the owning system's
//!   [`EventLog`] explicitly; standalone callers pass their own.
use crate::math::{
    calc_accounts, calc_f, calc_f_y, calc_m, calc_m_down, calc_per_capita, calc_regional_accounts,
    calc_s, calc_s_y, final_demand_totals, recalc_m, RegionalAccounts, SectorAccounts,
};
use crate::system::{
    errors::{SystemError, SystemResult},
    events::EventLog,
    options::ResetOptions,
    tables::ExtensionTable,
    units::Units,
};
use crate::table::{FillPolicy, Index, Key, Table, TableError, CATEGORY, REGION, SECTOR};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Core tables an extension calculation draws on.
///
/// All entries are optional; the calculation derives what the available
/// inputs allow and warns about the rest.
#[derive(Debug, Clone, Default)]
pub struct CalcContext<'a> {
    pub x: Option<&'a Table>,
    pub y: Option<&'a Table>,
    pub l: Option<&'a Table>,
    pub g: Option<&'a Table>,
    /// Final demand per consuming region, `(region, sector) × region`.
    pub y_agg: Option<Table>,
    /// `1 × region` table of inhabitants.
    pub population: Option<&'a Table>,
}

/// Extension — named bundle of stressor tables.
///
/// Fields
/// ------
/// - `name`: `String`
///   Unique within the owning system.
/// - `tables`: `BTreeMap<ExtensionTable, Table>`
///   Present tables, iterated in canonical order.
/// - `unit`: `Option<Units>`
///   Unit per stressor row.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub(crate) name: String,
    pub(crate) tables: BTreeMap<ExtensionTable, Table>,
    pub(crate) unit: Option<Units>,
}

impl Extension {
    pub fn new(name: &str) -> Self {
        Extension { name: name.to_string(), tables: BTreeMap::new(), unit: None }
    }

    /// Extension from direct stressors, optional final-demand stressors and units.
    pub fn from_flows(name: &str, f: Table, f_y: Option<Table>, unit: Option<Units>) -> SystemResult<Self> {
        let mut ext = Extension::new(name);
        ext.set_table(ExtensionTable::F, f)?;
        if let Some(f_y) = f_y {
            ext.set_table(ExtensionTable::FY, f_y)?;
        }
        if let Some(unit) = unit {
            ext.set_unit(unit)?;
        }
        Ok(ext)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    // ---- Table access ----

    pub fn table(&self, which: ExtensionTable) -> Option<&Table> {
        self.tables.get(&which)
    }

    /// Look up a table by its conventional name (`"F_Y"`, `"D_cba_reg"`, ...).
    pub fn table_by_name(&self, name: &str) -> SystemResult<Option<&Table>> {
        Ok(self.table(name.parse::<ExtensionTable>()?))
    }

    pub fn f(&self) -> Option<&Table> {
        self.table(ExtensionTable::F)
    }

    pub fn f_y(&self) -> Option<&Table> {
        self.table(ExtensionTable::FY)
    }

    pub fn s(&self) -> Option<&Table> {
        self.table(ExtensionTable::S)
    }

    pub fn s_y(&self) -> Option<&Table> {
        self.table(ExtensionTable::SY)
    }

    pub fn m(&self) -> Option<&Table> {
        self.table(ExtensionTable::M)
    }

    pub fn m_down(&self) -> Option<&Table> {
        self.table(ExtensionTable::MDown)
    }

    pub fn d_cba(&self) -> Option<&Table> {
        self.table(ExtensionTable::DCba)
    }

    pub fn d_pba(&self) -> Option<&Table> {
        self.table(ExtensionTable::DPba)
    }

    pub fn d_imp(&self) -> Option<&Table> {
        self.table(ExtensionTable::DImp)
    }

    pub fn d_exp(&self) -> Option<&Table> {
        self.table(ExtensionTable::DExp)
    }

    pub fn unit(&self) -> Option<&Units> {
        self.unit.as_ref()
    }

    /// Present tables in canonical order.
    pub fn present_tables(&self) -> Vec<ExtensionTable> {
        self.tables.keys().copied().collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = (ExtensionTable, &Table)> {
        self.tables.iter().map(|(k, v)| (*k, v))
    }

    /// Row (stressor) index shared by all tables, or of the unit table.
    pub fn rows(&self) -> Option<&Index> {
        self.tables.values().next().map(|t| t.rows()).or_else(|| self.unit.as_ref().map(|u| u.index()))
    }

    /// Insert or replace a table after checking its axes.
    ///
    /// Errors
    /// ------
    /// - `TableError::LevelMismatch` when the column levels do not fit the table.
    /// - `TableError::IndexMismatch` when rows differ from the other tables.
    pub fn set_table(&mut self, which: ExtensionTable, table: Table) -> SystemResult<()> {
        table.cols().ensure_names(column_levels(which))?;
        let other_rows = self.tables.iter().find(|(k, _)| **k != which).map(|(_, t)| t.rows());
        if let Some(rows) = other_rows {
            if !rows.same_order(table.rows()) {
                return Err(SystemError::Table(TableError::IndexMismatch {
                    operation: format!("setting {} of extension {}", which, self.name),
                }));
            }
        }
        self.tables.insert(which, table);
        Ok(())
    }

    pub fn remove_table(&mut self, which: ExtensionTable) -> Option<Table> {
        self.tables.remove(&which)
    }

    /// Set units; keys must match the row index when tables are present.
    pub fn set_unit(&mut self, unit: Units) -> SystemResult<()> {
        if let Some(rows) = self.tables.values().next().map(|t| t.rows()) {
            if !rows.same_labels(unit.index()) {
                return Err(SystemError::Table(TableError::IndexMismatch {
                    operation: format!("setting units of extension {}", self.name),
                }));
            }
        }
        self.unit = Some(unit);
        Ok(())
    }

    // ---- Completeness ----

    /// Absent tables that [`Extension::calc_system`] could derive from `ctx`.
    pub fn missing_derivable(&self, ctx: &CalcContext) -> Vec<ExtensionTable> {
        let has = |t: ExtensionTable| self.tables.contains_key(&t);
        let f = has(ExtensionTable::F) || (has(ExtensionTable::S) && ctx.x.is_some());
        let s = has(ExtensionTable::S) || (has(ExtensionTable::F) && ctx.x.is_some());
        let f_y = has(ExtensionTable::FY) || (has(ExtensionTable::SY) && ctx.y.is_some());
        let s_y = has(ExtensionTable::SY) || (has(ExtensionTable::FY) && ctx.y.is_some());
        let y_agg = ctx.y_agg.is_some();
        let m = has(ExtensionTable::M) || (s && ctx.l.is_some()) || (has(ExtensionTable::DCba) && y_agg);
        let m_down = has(ExtensionTable::MDown) || (s && ctx.g.is_some());
        let sector = s && ctx.l.is_some() && y_agg;
        let regional = sector
            || [ExtensionTable::DCba, ExtensionTable::DPba, ExtensionTable::DImp, ExtensionTable::DExp]
                .iter()
                .all(|t| has(*t));
        let per_capita = regional && ctx.population.is_some();

        let derivable = |t: ExtensionTable| match t {
            ExtensionTable::F => f,
            ExtensionTable::S => s,
            ExtensionTable::FY => f_y,
            ExtensionTable::SY => s_y,
            ExtensionTable::M => m,
            ExtensionTable::MDown => m_down,
            ExtensionTable::DCba | ExtensionTable::DPba | ExtensionTable::DImp | ExtensionTable::DExp => sector,
            ExtensionTable::DCbaReg
            | ExtensionTable::DPbaReg
            | ExtensionTable::DImpReg
            | ExtensionTable::DExpReg => regional,
            ExtensionTable::DCbaCap
            | ExtensionTable::DPbaCap
            | ExtensionTable::DImpCap
            | ExtensionTable::DExpCap => per_capita,
        };
        ExtensionTable::ALL.iter().copied().filter(|t| !has(*t) && derivable(*t)).collect()
    }

    // ---- Calculation ----

    /// Derive all missing tables the context allows.
    ///
    /// Returns the tables that were calculated, in calculation order. Tables
    /// already present are never recomputed. Steps lacking inputs are
    /// skipped with a warning in `log`.
    ///
    /// Errors
    /// ------
    /// - `SystemError::Table` / `SystemError::Math` when inputs are not
    ///   aligned or a required inverse does not exist. Nothing is
    ///   committed in that case.
    pub fn calc_system(&mut self, ctx: &CalcContext, log: &mut EventLog) -> SystemResult<Vec<ExtensionTable>> {
        let mut work = self.tables.clone();
        let mut done: Vec<ExtensionTable> = Vec::new();
        let name = self.name.clone();

        let mut put = |work: &mut BTreeMap<ExtensionTable, Table>, t: ExtensionTable, table: Table| {
            work.insert(t, table);
            done.push(t);
        };

        // Direct stressors and coefficients.
        if !work.contains_key(&ExtensionTable::F) {
            if let (Some(s), Some(x)) = (work.get(&ExtensionTable::S), ctx.x) {
                let f = calc_f(s, x)?;
                put(&mut work, ExtensionTable::F, f);
            }
        }
        if !work.contains_key(&ExtensionTable::S) {
            match (work.get(&ExtensionTable::F), ctx.x) {
                (Some(f), Some(x)) => {
                    let s = calc_s(f, x)?;
                    put(&mut work, ExtensionTable::S, s);
                }
                _ => log.warning(format!("Extension {}: S not calculable (F or x missing)", name)),
            }
        }

        // Final-demand stressors.
        if let Some(y) = ctx.y {
            if !work.contains_key(&ExtensionTable::SY) {
                if let Some(f_y) = work.get(&ExtensionTable::FY) {
                    let totals = aligned_y_totals(f_y, y)?;
                    let s_y = calc_s_y(f_y, &totals)?;
                    put(&mut work, ExtensionTable::SY, s_y);
                }
            }
            if !work.contains_key(&ExtensionTable::FY) {
                if let Some(s_y) = work.get(&ExtensionTable::SY) {
                    let totals = aligned_y_totals(s_y, y)?;
                    let f_y = calc_f_y(s_y, &totals)?;
                    put(&mut work, ExtensionTable::FY, f_y);
                }
            }
        }

        // Multipliers.
        if !work.contains_key(&ExtensionTable::M) {
            let s = work.get(&ExtensionTable::S);
            let d_cba = work.get(&ExtensionTable::DCba);
            match (s, ctx.l, d_cba, ctx.y_agg.as_ref()) {
                (Some(s), Some(l), _, _) => {
                    let m = calc_m(s, l)?;
                    put(&mut work, ExtensionTable::M, m);
                }
                (_, None, Some(d_cba), Some(y_agg)) => {
                    let m = recalc_m(d_cba, y_agg)?;
                    log.note(format!("Extension {}: M recalculated from D_cba", name));
                    put(&mut work, ExtensionTable::M, m);
                }
                _ => log.warning(format!("Extension {}: M not calculable (S or L missing)", name)),
            }
        }
        if !work.contains_key(&ExtensionTable::MDown) {
            if let (Some(s), Some(g)) = (work.get(&ExtensionTable::S), ctx.g) {
                let m_down = calc_m_down(s, g)?;
                put(&mut work, ExtensionTable::MDown, m_down);
            }
        }

        // Sector accounts.
        const SECTOR_ACCOUNTS: [ExtensionTable; 4] =
            [ExtensionTable::DCba, ExtensionTable::DPba, ExtensionTable::DImp, ExtensionTable::DExp];
        if SECTOR_ACCOUNTS.iter().any(|t| !work.contains_key(t)) {
            match (work.get(&ExtensionTable::S), ctx.l, ctx.y_agg.as_ref()) {
                (Some(s), Some(l), Some(y_agg)) => {
                    let acc = calc_accounts(s, l, y_agg)?;
                    let computed = [acc.d_cba, acc.d_pba, acc.d_imp, acc.d_exp];
                    for (t, table) in SECTOR_ACCOUNTS.iter().zip(computed) {
                        if !work.contains_key(t) {
                            put(&mut work, *t, table);
                        }
                    }
                }
                _ => log.warning(format!(
                    "Extension {}: accounts not calculable (S, L or final demand missing)",
                    name
                )),
            }
        }

        // Regional accounts.
        const REGIONAL_ACCOUNTS: [ExtensionTable; 4] = [
            ExtensionTable::DCbaReg,
            ExtensionTable::DPbaReg,
            ExtensionTable::DImpReg,
            ExtensionTable::DExpReg,
        ];
        if REGIONAL_ACCOUNTS.iter().any(|t| !work.contains_key(t)) {
            if let Some(sector) = sector_accounts(&work) {
                let reg = calc_regional_accounts(&sector, work.get(&ExtensionTable::FY))?;
                let computed = [reg.d_cba_reg, reg.d_pba_reg, reg.d_imp_reg, reg.d_exp_reg];
                for (t, table) in REGIONAL_ACCOUNTS.iter().zip(computed) {
                    if !work.contains_key(t) {
                        put(&mut work, *t, table);
                    }
                }
            }
        }

        // Per-capita accounts.
        const CAPITA_ACCOUNTS: [ExtensionTable; 4] = [
            ExtensionTable::DCbaCap,
            ExtensionTable::DPbaCap,
            ExtensionTable::DImpCap,
            ExtensionTable::DExpCap,
        ];
        if let Some(population) = ctx.population {
            if CAPITA_ACCOUNTS.iter().any(|t| !work.contains_key(t)) {
                if let Some(reg) = regional_accounts(&work) {
                    let cap = calc_per_capita(&reg, population)?;
                    let computed = [cap.d_cba_cap, cap.d_pba_cap, cap.d_imp_cap, cap.d_exp_cap];
                    for (t, table) in CAPITA_ACCOUNTS.iter().zip(computed) {
                        if !work.contains_key(t) {
                            put(&mut work, *t, table);
                        }
                    }
                }
            }
        }

        self.tables = work;
        for t in &done {
            log.modification(format!("Extension {}: calculated {}", name, t));
        }
        Ok(done)
    }

    /// Drop every table that depends on the core's output or inverses.
    ///
    /// `S` and `S_Y` stay when their flow table is absent.
    pub fn invalidate_derived(&mut self, log: &mut EventLog) -> bool {
        let has_f = self.tables.contains_key(&ExtensionTable::F);
        let has_f_y = self.tables.contains_key(&ExtensionTable::FY);
        let before = self.tables.len();
        self.tables.retain(|t, _| match t {
            ExtensionTable::F | ExtensionTable::FY => true,
            ExtensionTable::S => !has_f,
            ExtensionTable::SY => !has_f_y,
            _ => false,
        });
        let dropped = self.tables.len() != before;
        if dropped {
            log.modification(format!("Extension {}: derived tables invalidated", self.name));
        }
        dropped
    }

    // ---- Resets ----

    /// Keep only `F` and `F_Y`.
    ///
    /// Errors
    /// ------
    /// - `SystemError::ResetNotPossible` when `F` is absent and the reset
    ///   is not forced.
    pub fn reset_full(&mut self, opts: ResetOptions, log: &mut EventLog) -> SystemResult<()> {
        self.check_basic(opts, log)?;
        self.tables.retain(|t, _| ExtensionTable::BASIC.contains(t));
        log.modification(format!("Extension {}: reset to F and F_Y", self.name));
        Ok(())
    }

    /// Flows of an extension are its basic tables; same as [`Extension::reset_full`].
    pub fn reset_to_flows(&mut self, opts: ResetOptions, log: &mut EventLog) -> SystemResult<()> {
        self.reset_full(opts, log)
    }

    /// Keep only `S`, `S_Y`, `M` and `M_down`.
    pub fn reset_to_coefficients(&mut self, log: &mut EventLog) {
        let dropped: Vec<String> = self
            .tables
            .keys()
            .filter(|t| !ExtensionTable::COEFFICIENTS.contains(t))
            .map(|t| t.to_string())
            .collect();
        self.tables.retain(|t, _| ExtensionTable::COEFFICIENTS.contains(t));
        if !dropped.is_empty() {
            log.warning(format!(
                "Extension {}: reset to coefficients dropped {:?}; absolute values need x to be recovered",
                self.name, dropped
            ));
        }
        log.modification(format!("Extension {}: reset to coefficients", self.name));
    }

    fn check_basic(&self, opts: ResetOptions, log: &mut EventLog) -> SystemResult<()> {
        if self.tables.contains_key(&ExtensionTable::F) {
            return Ok(());
        }
        let missing = vec![ExtensionTable::F.to_string()];
        if opts.force {
            log.warning(format!(
                "Extension {}: recalculation after reset not possible ({:?} missing)",
                self.name, missing
            ));
            Ok(())
        } else {
            Err(SystemError::ResetNotPossible { missing })
        }
    }

    // ---- Derived extensions ----

    /// New extension whose `F` spreads one stressor row over the diagonal.
    ///
    /// Rows and columns of the result are the `(region, sector)` axis, so
    /// the accounts show where the stressor of each sector ends up.
    ///
    /// Errors
    /// ------
    /// - `SystemError::Underdetermined` when `F` is absent.
    /// - `TableError::MissingKeys` when `stressor` is not a row.
    pub fn diag_stressor(&self, stressor: &[String], name: Option<&str>) -> SystemResult<Extension> {
        let f = self.f().ok_or_else(|| SystemError::Underdetermined {
            operation: "diag_stressor".to_string(),
            missing: vec![ExtensionTable::F.to_string()],
        })?;
        let pos = f.rows().position(stressor).ok_or_else(|| {
            SystemError::Table(TableError::MissingKeys { keys: vec![stressor.to_vec()] })
        })?;
        let data = Array2::from_diag(&f.data().row(pos));
        let diag = Table::new(data, f.cols().clone(), f.cols().clone())?;

        let name = name.map(str::to_string).unwrap_or_else(|| format!("{}_diag", stressor.join("_")));
        let unit = self
            .unit
            .as_ref()
            .and_then(|u| u.get(stressor))
            .map(|u| Units::uniform(f.cols().clone(), u));
        Extension::from_flows(&name, diag, None, unit)
    }

    /// Keys of the row index, if any table is present.
    pub fn get_rows(&self) -> Vec<Key> {
        self.rows().map(|r| r.keys().to_vec()).unwrap_or_default()
    }

    // ---- Comparison ----

    /// Same present tables with values equal within `tol`, in any row or
    /// column order. Names are not compared.
    pub fn approx_eq(&self, other: &Extension, tol: f64) -> bool {
        if self.present_tables() != other.present_tables() {
            return false;
        }
        let tables_equal = self
            .tables
            .iter()
            .all(|(k, t)| other.tables.get(k).map(|o| t.approx_eq(o, tol)).unwrap_or(false));
        let units_equal = match (&self.unit, &other.unit) {
            (None, None) => true,
            (Some(a), Some(b)) => b.reindex(a.index(), None).map(|b| b.units() == a.units()).unwrap_or(false),
            _ => false,
        };
        tables_equal && units_equal
    }
}

// ---- Helper methods ----

/// Column level names each table must carry.
pub(crate) fn column_levels(which: ExtensionTable) -> &'static [&'static str] {
    match which {
        ExtensionTable::FY | ExtensionTable::SY => &[REGION, CATEGORY],
        ExtensionTable::DCbaReg
        | ExtensionTable::DPbaReg
        | ExtensionTable::DImpReg
        | ExtensionTable::DExpReg
        | ExtensionTable::DCbaCap
        | ExtensionTable::DPbaCap
        | ExtensionTable::DImpCap
        | ExtensionTable::DExpCap => &[REGION],
        _ => &[REGION, SECTOR],
    }
}

/// Column totals of `Y` in the column order of `t`.
fn aligned_y_totals(t: &Table, y: &Table) -> SystemResult<ndarray::Array1<f64>> {
    let totals = Table::row(final_demand_totals(y), "total", y.cols().clone())?;
    let aligned = totals.reindex_cols(t.cols(), FillPolicy::Fail)?;
    Ok(aligned.data().row(0).to_owned())
}

fn sector_accounts(work: &BTreeMap<ExtensionTable, Table>) -> Option<SectorAccounts> {
    Some(SectorAccounts {
        d_cba: work.get(&ExtensionTable::DCba)?.clone(),
        d_pba: work.get(&ExtensionTable::DPba)?.clone(),
        d_imp: work.get(&ExtensionTable::DImp)?.clone(),
        d_exp: work.get(&ExtensionTable::DExp)?.clone(),
    })
}

fn regional_accounts(work: &BTreeMap<ExtensionTable, Table>) -> Option<RegionalAccounts> {
    Some(RegionalAccounts {
        d_cba_reg: work.get(&ExtensionTable::DCbaReg)?.clone(),
        d_pba_reg: work.get(&ExtensionTable::DPbaReg)?.clone(),
        d_imp_reg: work.get(&ExtensionTable::DImpReg)?.clone(),
        d_exp_reg: work.get(&ExtensionTable::DExpReg)?.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{account_identity_residual, calc_a, calc_l, calc_x};
    use crate::table::{POPULATION, STRESSOR};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Calculation order and idempotence of `calc_system`.
    // - Completeness queries and warnings for missing inputs.
    // - Resets, including the forced path.
    // - `diag_stressor` and axis validation in `set_table`.
    //
    // They intentionally DO NOT cover:
    // - Orchestration through `IOSystem` (see `iosystem`).
    // -------------------------------------------------------------------------

    struct Core {
        x: Table,
        y: Table,
        l: Table,
        y_agg: Table,
        population: Table,
    }

    fn rs() -> Index {
        Index::product(&[REGION, SECTOR], &[vec!["R1".into(), "R2".into()], vec!["s".into()]]).unwrap()
    }

    fn core() -> Core {
        let rc =
            Index::product(&[REGION, CATEGORY], &[vec!["R1".into(), "R2".into()], vec!["hh".into()]])
                .unwrap();
        let z = Table::new(array![[10.0, 20.0], [30.0, 40.0]], rs(), rs()).unwrap();
        let y = Table::new(array![[50.0, 20.0], [10.0, 100.0]], rs(), rc).unwrap();
        let x = calc_x(&z, &y).unwrap();
        let l = calc_l(&calc_a(&z, &x).unwrap()).unwrap();
        let y_agg = y.sum_columns_by_level(REGION).unwrap();
        let population =
            Table::row(array![2.0, 4.0], POPULATION, Index::single(REGION, ["R1", "R2"])).unwrap();
        Core { x, y, l, y_agg, population }
    }

    fn ctx(core: &Core) -> CalcContext<'_> {
        CalcContext {
            x: Some(&core.x),
            y: Some(&core.y),
            l: Some(&core.l),
            g: None,
            y_agg: Some(core.y_agg.clone()),
            population: Some(&core.population),
        }
    }

    fn emissions() -> Extension {
        let rc =
            Index::product(&[REGION, CATEGORY], &[vec!["R1".into(), "R2".into()], vec!["hh".into()]])
                .unwrap();
        let rows = Index::single(STRESSOR, ["co2"]);
        let f = Table::new(array![[100.0, 90.0]], rows.clone(), rs()).unwrap();
        let f_y = Table::new(array![[5.0, 7.0]], rows.clone(), rc).unwrap();
        Extension::from_flows("emissions", f, Some(f_y), Some(Units::uniform(rows, "kg"))).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A full calculation yields consistent accounts and a second call
    // computes nothing.
    //
    // Given
    // -----
    // - Two regions, one sector, F and F_Y present, population given.
    //
    // Expect
    // ------
    // - S, S_Y, M, all D_* tables calculated.
    // - Regional identity residual is zero.
    // - Second call returns an empty list.
    fn calc_system_is_complete_consistent_and_idempotent() {
        let core = core();
        let mut ext = emissions();
        let mut log = EventLog::new();

        let done = ext.calc_system(&ctx(&core), &mut log).unwrap();
        assert!(done.contains(&ExtensionTable::S));
        assert!(done.contains(&ExtensionTable::SY));
        assert!(done.contains(&ExtensionTable::M));
        assert!(done.contains(&ExtensionTable::DCbaCap));
        assert!(!done.contains(&ExtensionTable::MDown));

        let reg = regional_accounts(&ext.tables).unwrap();
        let residual = account_identity_residual(&reg).unwrap();
        assert!(residual.data().iter().all(|v| v.abs() < 1e-9));

        // Total footprint covers all stressors, F_Y included.
        let total = ext.table(ExtensionTable::DCbaReg).unwrap().total();
        assert!((total - (190.0 + 12.0)).abs() < 1e-9);

        let again = ext.calc_system(&ctx(&core), &mut log).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Without core tables only warnings are produced.
    fn calc_without_core_warns_and_computes_nothing() {
        let mut ext = emissions();
        let mut log = EventLog::new();

        let done = ext.calc_system(&CalcContext::default(), &mut log).unwrap();
        assert!(done.is_empty());
        assert!(log.warnings().count() >= 2);
        assert_eq!(ext.present_tables(), vec![ExtensionTable::F, ExtensionTable::FY]);
    }

    #[test]
    // Purpose
    // -------
    // The completeness query lists exactly what a calculation would add.
    fn missing_derivable_matches_calculation() {
        let core = core();
        let mut ext = emissions();
        let missing = ext.missing_derivable(&ctx(&core));
        assert!(missing.contains(&ExtensionTable::S));
        assert!(!missing.contains(&ExtensionTable::MDown));

        let mut done = ext.calc_system(&ctx(&core), &mut EventLog::new()).unwrap();
        done.sort();
        assert_eq!(done, missing);
        assert!(ext.missing_derivable(&ctx(&core)).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // F is rebuilt from S and x after a reset to coefficients.
    fn f_recovered_from_coefficients() {
        let core = core();
        let mut ext = emissions();
        let mut log = EventLog::new();
        ext.calc_system(&ctx(&core), &mut log).unwrap();
        let f = ext.f().unwrap().clone();

        ext.reset_to_coefficients(&mut log);
        assert!(ext.f().is_none());
        assert!(ext.m().is_some());
        assert!(log.warnings().count() >= 1);

        ext.calc_system(&ctx(&core), &mut log).unwrap();
        assert!(ext.f().unwrap().approx_eq(&f, 1e-9));
    }

    #[test]
    // Purpose
    // -------
    // Reset without F fails unless forced.
    fn reset_full_requires_f_unless_forced() {
        let core = core();
        let mut ext = emissions();
        let mut log = EventLog::new();
        ext.calc_system(&ctx(&core), &mut log).unwrap();
        ext.remove_table(ExtensionTable::F);

        let err = ext.reset_full(ResetOptions::default(), &mut log).unwrap_err();
        assert!(matches!(err, SystemError::ResetNotPossible { .. }));

        ext.reset_full(ResetOptions::forced(), &mut log).unwrap();
        assert_eq!(ext.present_tables(), vec![ExtensionTable::FY]);
    }

    #[test]
    // Purpose
    // -------
    // The diagonalized stressor spreads one row over region × sector.
    fn diag_stressor_builds_square_extension() {
        let ext = emissions();
        let diag = ext.diag_stressor(&["co2".to_string()], None).unwrap();

        assert_eq!(diag.name(), "co2_diag");
        assert_eq!(diag.f().unwrap().data(), &array![[100.0, 0.0], [0.0, 90.0]]);
        assert_eq!(diag.unit().unwrap().units(), &["kg".to_string(), "kg".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // Tables with the wrong column levels or misaligned rows are rejected.
    fn set_table_validates_axes() {
        let mut ext = emissions();
        let wrong_cols = Table::zeros(Index::single(STRESSOR, ["co2"]), Index::single(SECTOR, ["s"]));
        assert!(ext.set_table(ExtensionTable::S, wrong_cols).is_err());

        let wrong_rows = Table::zeros(Index::single(STRESSOR, ["ch4"]), rs());
        assert!(ext.set_table(ExtensionTable::S, wrong_rows).is_err());
    }
}
