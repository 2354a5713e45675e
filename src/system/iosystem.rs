//! system::iosystem — the MRIO system and its calculation orchestration.
//!
//! Purpose
//! -------
//! Own the economic core (`Z`, `Y`, `x`, `A`, `L` and the Ghosh pair `B`,
//! `G`), row units, population, the named extensions and the event log,
//! and decide which tables can and must be derived.
//!
//! Key behaviors
//! -------------
//! - [`IOSystem::calc_system`] covers three provisioning cases:
//!   1. `Z` and `Y` given: `x`, then `A`, then `L`.
//!   2. `A` and `x` given: `Z = A · diag(x)`, then `L`.
//!   3. `A` or `L` and `Y` given: `L`, `x = L · y`, then `Z`.
//!
//!   `B` and `G` follow when Ghosh tables are requested.
//! - [`IOSystem::calc_extensions`] hands the core tables to every
//!   extension; [`IOSystem::calc_all`] runs both.
//! - Resets move the system back to flows or coefficients; `reset_all_*`
//!   variants also reset every extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every core table shares one `(region, sector)` row index in identical
//!   order; `Z`, `A`, `L`, `B`, `G` use it for columns as well. Extension
//!   tables with `(region, sector)` columns follow the same order.
//! - Calculations and `reset_all_*` are atomic: on error the system is
//!   left exactly as before the call.
//! - Replacing `Z`, `Y`, `x`, `A` or `L` with different data invalidates
//!   the derived tables of every extension.
//!
//! Conventions
//! -----------
//! - Already present tables are never recomputed; resets are the way to
//!   force recalculation.
//! - Recoverable conditions are warnings in the system's [`EventLog`] and
//!   on the `tracing` `warn` level.
use crate::math::{
    calc_a, calc_a_from_l, calc_b, calc_g, calc_gross_trade, calc_l, calc_x, calc_x_from_l, calc_z,
    GrossTrade,
};
use crate::system::{
    errors::{SystemError, SystemResult},
    events::EventLog,
    extension::{column_levels, CalcContext, Extension},
    options::{CalcOptions, ResetOptions},
    tables::{ExtensionTable, SystemTable},
    units::Units,
};
use crate::table::{
    selection::LabelMatcher, Index, Key, MatchMode, Table, TableError, CATEGORY, REGION, SECTOR,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Labels matching a search term, per axis and per extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindResult {
    pub regions: Vec<String>,
    pub sectors: Vec<String>,
    pub y_categories: Vec<String>,
    pub extension_rows: IndexMap<String, Vec<Key>>,
}

/// IOSystem — multi-regional input-output system with extensions.
///
/// Fields
/// ------
/// - `name`: `String`
/// - `tables`: `BTreeMap<SystemTable, Table>`
///   Present core tables.
/// - `unit`: `Option<Units>`
///   Unit per `(region, sector)` row.
/// - `population`: `Option<Table>`
///   `1 × region` inhabitants, used for per-capita accounts.
/// - `extensions`: `IndexMap<String, Extension>`
///   Extensions in insertion order.
/// - `events`: [`EventLog`]
///   Append-only change history.
#[derive(Debug, Clone, PartialEq)]
pub struct IOSystem {
    pub(crate) name: String,
    pub(crate) tables: BTreeMap<SystemTable, Table>,
    pub(crate) unit: Option<Units>,
    pub(crate) population: Option<Table>,
    pub(crate) extensions: IndexMap<String, Extension>,
    pub(crate) events: EventLog,
}

impl IOSystem {
    pub fn new(name: &str) -> Self {
        IOSystem {
            name: name.to_string(),
            tables: BTreeMap::new(),
            unit: None,
            population: None,
            extensions: IndexMap::new(),
            events: EventLog::new(),
        }
    }

    /// System from flows and final demand.
    ///
    /// Errors
    /// ------
    /// - `TableError::LevelMismatch` / `IndexMismatch` when the axes of `Z`
    ///   and `Y` do not form one region × sector index.
    pub fn from_flows(name: &str, z: Table, y: Table) -> SystemResult<Self> {
        let mut sys = IOSystem::new(name);
        sys.set_table(SystemTable::Z, z)?;
        sys.set_table(SystemTable::Y, y)?;
        Ok(sys)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.events.modification(format!("Renamed system {} to {}", self.name, name));
        self.name = name.to_string();
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ---- Core tables ----

    pub fn table(&self, which: SystemTable) -> Option<&Table> {
        self.tables.get(&which)
    }

    pub fn table_by_name(&self, name: &str) -> SystemResult<Option<&Table>> {
        Ok(self.table(name.parse::<SystemTable>()?))
    }

    pub fn z(&self) -> Option<&Table> {
        self.table(SystemTable::Z)
    }

    pub fn y(&self) -> Option<&Table> {
        self.table(SystemTable::Y)
    }

    pub fn x(&self) -> Option<&Table> {
        self.table(SystemTable::X)
    }

    pub fn a(&self) -> Option<&Table> {
        self.table(SystemTable::A)
    }

    pub fn b(&self) -> Option<&Table> {
        self.table(SystemTable::B)
    }

    pub fn l(&self) -> Option<&Table> {
        self.table(SystemTable::L)
    }

    pub fn g(&self) -> Option<&Table> {
        self.table(SystemTable::G)
    }

    pub fn present_tables(&self) -> Vec<SystemTable> {
        self.tables.keys().copied().collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = (SystemTable, &Table)> {
        self.tables.iter().map(|(k, v)| (*k, v))
    }

    /// The `(region, sector)` index shared by the core tables.
    pub fn core_index(&self) -> Option<&Index> {
        self.tables.values().next().map(|t| t.rows())
    }

    /// Insert or replace a core table after checking its axes.
    ///
    /// Replacing `Z`, `Y`, `x`, `A` or `L` with different values drops the
    /// derived tables of all extensions.
    ///
    /// Errors
    /// ------
    /// - `TableError::LevelMismatch` when rows are not `(region, sector)`,
    ///   or `Y` columns not `(region, category)`.
    /// - `TableError::IndexMismatch` when the row index differs from the
    ///   other core tables or from the columns of an attached extension,
    ///   or a square table has differing axes.
    pub fn set_table(&mut self, which: SystemTable, table: Table) -> SystemResult<()> {
        table.rows().ensure_names(&[REGION, SECTOR])?;
        match which {
            SystemTable::Y => table.cols().ensure_names(&[REGION, CATEGORY])?,
            SystemTable::X => {
                if table.ncols() != 1 {
                    return Err(SystemError::Table(TableError::ShapeMismatch {
                        expected: (table.nrows(), 1),
                        actual: table.shape(),
                    }));
                }
            }
            _ => {
                if !table.cols().same_order(table.rows()) {
                    return Err(mismatch(format!("{} with differing row and column axes", which)));
                }
            }
        }
        let other = self.tables.iter().find(|(k, _)| **k != which).map(|(_, t)| t.rows());
        if let Some(rows) = other {
            if !rows.same_order(table.rows()) {
                return Err(mismatch(format!("setting {} of system {}", which, self.name)));
            }
        }
        let y_cols = if which == SystemTable::Y { Some(table.cols()) } else { self.y().map(|y| y.cols()) };
        for ext in self.extensions.values() {
            check_axes(ext, Some(table.rows()), y_cols)?;
        }

        let changed = self.tables.get(&which) != Some(&table);
        let drives_extensions = matches!(
            which,
            SystemTable::Z | SystemTable::Y | SystemTable::X | SystemTable::A | SystemTable::L
        );
        if changed && drives_extensions {
            for ext in self.extensions.values_mut() {
                ext.invalidate_derived(&mut self.events);
            }
        }
        self.tables.insert(which, table);
        self.events.modification(format!("Set {} of system {}", which, self.name));
        Ok(())
    }

    pub fn remove_table(&mut self, which: SystemTable) -> Option<Table> {
        let removed = self.tables.remove(&which);
        if removed.is_some() {
            self.events.modification(format!("Removed {} of system {}", which, self.name));
        }
        removed
    }

    // ---- Units and population ----

    pub fn unit(&self) -> Option<&Units> {
        self.unit.as_ref()
    }

    pub fn set_unit(&mut self, unit: Units) -> SystemResult<()> {
        if let Some(index) = self.core_index() {
            if !index.same_labels(unit.index()) {
                return Err(mismatch("setting units of the system".to_string()));
            }
        }
        self.unit = Some(unit);
        self.events.modification("Set unit of the system");
        Ok(())
    }

    pub fn population(&self) -> Option<&Table> {
        self.population.as_ref()
    }

    /// Errors
    /// ------
    /// - `TableError::LevelMismatch` when columns are not `region`.
    /// - `TableError::IndexMismatch` when not one row or regions differ from the core.
    pub fn set_population(&mut self, population: Table) -> SystemResult<()> {
        population.cols().ensure_names(&[REGION])?;
        if population.nrows() != 1 {
            return Err(mismatch("population with more than one row".to_string()));
        }
        let regions = self.get_regions();
        if !regions.is_empty() {
            let own = Index::single(REGION, regions);
            if !own.same_labels(population.cols()) {
                return Err(mismatch("population regions differing from the system".to_string()));
            }
        }
        self.population = Some(population);
        self.events.modification("Set population");
        Ok(())
    }

    // ---- Axis labels ----

    pub fn get_regions(&self) -> Vec<String> {
        self.core_index().and_then(|i| i.unique_level_values(REGION).ok()).unwrap_or_default()
    }

    pub fn get_sectors(&self) -> Vec<String> {
        self.core_index().and_then(|i| i.unique_level_values(SECTOR).ok()).unwrap_or_default()
    }

    pub fn get_y_categories(&self) -> Vec<String> {
        self.y().and_then(|y| y.cols().unique_level_values(CATEGORY).ok()).unwrap_or_default()
    }

    // ---- Extensions ----

    /// Attach an extension.
    ///
    /// Errors
    /// ------
    /// - `SystemError::DuplicateExtension` when the name is taken.
    /// - `TableError::IndexMismatch` when `(region, sector)` columns are not
    ///   in the core's order, or final-demand columns differ from `Y`.
    pub fn add_extension(&mut self, ext: Extension) -> SystemResult<()> {
        if self.extensions.contains_key(ext.name()) {
            return Err(SystemError::DuplicateExtension { name: ext.name().to_string() });
        }
        self.check_extension_axes(&ext)?;
        self.events.modification(format!("Added extension {}", ext.name()));
        self.extensions.insert(ext.name().to_string(), ext);
        Ok(())
    }

    pub fn remove_extension(&mut self, name: &str) -> SystemResult<Extension> {
        let ext = self
            .extensions
            .shift_remove(name)
            .ok_or_else(|| SystemError::UnknownExtension { name: name.to_string() })?;
        self.events.modification(format!("Removed extension {}", name));
        Ok(ext)
    }

    pub fn extension(&self, name: &str) -> SystemResult<&Extension> {
        self.extensions.get(name).ok_or_else(|| SystemError::UnknownExtension { name: name.to_string() })
    }

    /// Insert or replace a table of an attached extension.
    ///
    /// The table is checked against the extension's rows and against the
    /// core axes; the extension is only modified when both checks pass.
    /// Replacing `F` or `F_Y` with different data drops the extension's
    /// derived tables.
    ///
    /// Errors
    /// ------
    /// - `SystemError::UnknownExtension` when no extension has this name.
    /// - `TableError::LevelMismatch` when the column levels do not fit the table.
    /// - `TableError::IndexMismatch` when rows differ from the extension's
    ///   other tables, `(region, sector)` columns are not in the core's
    ///   order, or final-demand columns differ from `Y`.
    pub fn set_extension_table(&mut self, name: &str, which: ExtensionTable, table: Table) -> SystemResult<()> {
        let current = self.extension(name)?;
        let changed = current.table(which) != Some(&table);
        let mut candidate = current.clone();
        candidate.set_table(which, table)?;
        self.check_extension_axes(&candidate)?;

        if changed && matches!(which, ExtensionTable::F | ExtensionTable::FY) {
            candidate.invalidate_derived(&mut self.events);
        }
        self.events.modification(format!("Set {} of extension {}", which, name));
        self.extensions.insert(name.to_string(), candidate);
        Ok(())
    }

    /// Set the row units of an attached extension.
    ///
    /// Errors
    /// ------
    /// - `SystemError::UnknownExtension` when no extension has this name.
    /// - `TableError::IndexMismatch` when the unit keys differ from the rows.
    pub fn set_extension_unit(&mut self, name: &str, unit: Units) -> SystemResult<()> {
        let ext = self
            .extensions
            .get_mut(name)
            .ok_or_else(|| SystemError::UnknownExtension { name: name.to_string() })?;
        ext.set_unit(unit)?;
        self.events.modification(format!("Set unit of extension {}", name));
        Ok(())
    }

    pub fn extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.values()
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.keys().cloned().collect()
    }

    pub(crate) fn check_extension_axes(&self, ext: &Extension) -> SystemResult<()> {
        check_axes(ext, self.core_index(), self.y().map(|y| y.cols()))
    }

    // ---- Completeness ----

    /// Absent core tables [`IOSystem::calc_system`] could derive.
    pub fn missing_derivable(&self, include_ghosh: bool) -> Vec<SystemTable> {
        let has = |t: SystemTable| self.tables.contains_key(&t);
        let y = has(SystemTable::Y);
        let a_or_l = has(SystemTable::A) || has(SystemTable::L);
        let x = has(SystemTable::X) || (has(SystemTable::Z) && y) || (a_or_l && y);
        let a = has(SystemTable::A) || (has(SystemTable::Z) && x) || has(SystemTable::L);
        let z = has(SystemTable::Z) || (a && x);
        let l = has(SystemTable::L) || a;
        let b = has(SystemTable::B) || (include_ghosh && z && x);
        let g = has(SystemTable::G) || (include_ghosh && b);

        let derivable = |t: SystemTable| match t {
            SystemTable::Z => z,
            SystemTable::Y => false,
            SystemTable::X => x,
            SystemTable::A => a,
            SystemTable::L => l,
            SystemTable::B => b,
            SystemTable::G => g,
        };
        SystemTable::ALL.iter().copied().filter(|t| !has(*t) && derivable(*t)).collect()
    }

    // ---- Calculation ----

    /// Derive the missing core tables.
    ///
    /// Returns the calculated tables in calculation order.
    ///
    /// Errors
    /// ------
    /// - `SystemError::Underdetermined` when none of the provisioning cases
    ///   applies.
    /// - `SystemError::Math(MathError::SingularMatrix { table })` when `L`
    ///   or `G` does not exist.
    pub fn calc_system(&mut self, opts: &CalcOptions) -> SystemResult<Vec<SystemTable>> {
        let mut work = self.tables.clone();
        let mut done: Vec<SystemTable> = Vec::new();
        let underdetermined = |work: &BTreeMap<SystemTable, Table>, needed: &[SystemTable]| {
            SystemError::Underdetermined {
                operation: "calc_system".to_string(),
                missing: needed.iter().filter(|t| !work.contains_key(t)).map(|t| t.to_string()).collect(),
            }
        };

        if !work.contains_key(&SystemTable::X) {
            let x = match (work.get(&SystemTable::Z), work.get(&SystemTable::Y)) {
                (Some(z), Some(y)) => calc_x(z, y)?,
                _ => {
                    if !work.contains_key(&SystemTable::L) {
                        if let Some(a) = work.get(&SystemTable::A) {
                            let l = calc_l(a)?;
                            work.insert(SystemTable::L, l);
                            done.push(SystemTable::L);
                        }
                    }
                    match (work.get(&SystemTable::L), work.get(&SystemTable::Y)) {
                        (Some(l), Some(y)) => calc_x_from_l(l, &y.row_totals("total")?)?,
                        _ => {
                            return Err(underdetermined(
                                &work,
                                &[SystemTable::Z, SystemTable::Y, SystemTable::A],
                            ))
                        }
                    }
                }
            };
            work.insert(SystemTable::X, x);
            done.push(SystemTable::X);
        }

        if !work.contains_key(&SystemTable::A) {
            let a = match (work.get(&SystemTable::Z), work.get(&SystemTable::X), work.get(&SystemTable::L)) {
                (Some(z), Some(x), _) => calc_a(z, x)?,
                (None, _, Some(l)) => calc_a_from_l(l)?,
                _ => return Err(underdetermined(&work, &[SystemTable::Z, SystemTable::L])),
            };
            work.insert(SystemTable::A, a);
            done.push(SystemTable::A);
        }

        if !work.contains_key(&SystemTable::Z) {
            if let (Some(a), Some(x)) = (work.get(&SystemTable::A), work.get(&SystemTable::X)) {
                let z = calc_z(a, x)?;
                work.insert(SystemTable::Z, z);
                done.push(SystemTable::Z);
            }
        }

        if !work.contains_key(&SystemTable::L) {
            if let Some(a) = work.get(&SystemTable::A) {
                let l = calc_l(a)?;
                work.insert(SystemTable::L, l);
                done.push(SystemTable::L);
            }
        }

        if opts.include_ghosh {
            if !work.contains_key(&SystemTable::B) {
                if let (Some(z), Some(x)) = (work.get(&SystemTable::Z), work.get(&SystemTable::X)) {
                    let b = calc_b(z, x)?;
                    work.insert(SystemTable::B, b);
                    done.push(SystemTable::B);
                }
            }
            if !work.contains_key(&SystemTable::G) {
                if let Some(b) = work.get(&SystemTable::B) {
                    let g = calc_g(b)?;
                    work.insert(SystemTable::G, g);
                    done.push(SystemTable::G);
                }
            }
        }

        self.tables = work;
        for t in &done {
            self.events.modification(format!("Calculated {} of system {}", t, self.name));
        }
        Ok(done)
    }

    /// Calculate all extensions (or those named in `opts`).
    ///
    /// Errors
    /// ------
    /// - `SystemError::UnknownExtension` for a requested name that is absent.
    /// - Any calculation error of an extension; no extension is changed then.
    pub fn calc_extensions(&mut self, opts: &CalcOptions) -> SystemResult<()> {
        if let Some(names) = &opts.extensions {
            for n in names {
                if !self.extensions.contains_key(n) {
                    return Err(SystemError::UnknownExtension { name: n.clone() });
                }
            }
        }

        let y_agg = match (&opts.y_agg, self.y()) {
            (Some(y_agg), _) => {
                y_agg.cols().ensure_names(&[REGION])?;
                if let Some(core) = self.core_index() {
                    if !core.same_order(y_agg.rows()) {
                        return Err(mismatch("final demand aggregate against the core".to_string()));
                    }
                }
                Some(y_agg.clone())
            }
            (None, Some(y)) => Some(y.sum_columns_by_level(REGION)?),
            (None, None) => None,
        };
        let ctx = CalcContext {
            x: self.tables.get(&SystemTable::X),
            y: self.tables.get(&SystemTable::Y),
            l: self.tables.get(&SystemTable::L),
            g: if opts.include_ghosh { self.tables.get(&SystemTable::G) } else { None },
            y_agg,
            population: self.population.as_ref(),
        };

        let mut work = self.extensions.clone();
        let mut log = EventLog::new();
        for (name, ext) in work.iter_mut() {
            if opts.includes_extension(name) {
                ext.calc_system(&ctx, &mut log)?;
            }
        }
        self.extensions = work;
        self.events.absorb(log);
        Ok(())
    }

    /// `calc_system` followed by `calc_extensions`, atomically.
    pub fn calc_all(&mut self, opts: &CalcOptions) -> SystemResult<()> {
        let mut work = self.clone();
        work.calc_system(opts)?;
        work.calc_extensions(opts)?;
        *self = work;
        Ok(())
    }

    // ---- Resets ----

    /// Keep only `Z` and `Y`.
    ///
    /// Errors
    /// ------
    /// - `SystemError::ResetNotPossible` when `Z` or `Y` is absent and the
    ///   reset is not forced.
    pub fn reset_full(&mut self, opts: ResetOptions) -> SystemResult<()> {
        self.check_basic(opts)?;
        self.tables.retain(|t, _| matches!(t, SystemTable::Z | SystemTable::Y));
        self.events.modification(format!("Reset system {} to Z and Y", self.name));
        Ok(())
    }

    /// Keep `Z`, `Y` and `x`.
    ///
    /// Errors
    /// ------
    /// - As [`IOSystem::reset_full`].
    pub fn reset_to_flows(&mut self, opts: ResetOptions) -> SystemResult<()> {
        self.check_basic(opts)?;
        self.tables.retain(|t, _| matches!(t, SystemTable::Z | SystemTable::Y | SystemTable::X));
        self.events.modification(format!("Reset system {} to flows", self.name));
        Ok(())
    }

    /// Keep `A`, `B`, `L` and `G`; warns when absolute tables are dropped.
    pub fn reset_to_coefficients(&mut self) {
        let dropped: Vec<String> = self
            .tables
            .keys()
            .filter(|t| matches!(t, SystemTable::Z | SystemTable::Y | SystemTable::X))
            .map(|t| t.to_string())
            .collect();
        self.tables.retain(|t, _| {
            matches!(t, SystemTable::A | SystemTable::B | SystemTable::L | SystemTable::G)
        });
        if !dropped.is_empty() {
            self.events.warning(format!(
                "Reset system {} to coefficients dropped {:?}; absolute values cannot be recovered",
                self.name, dropped
            ));
        }
        self.events.modification(format!("Reset system {} to coefficients", self.name));
    }

    pub fn reset_all_full(&mut self, opts: ResetOptions) -> SystemResult<()> {
        let mut work = self.clone();
        work.reset_full(opts)?;
        work.reset_extensions(opts)?;
        *self = work;
        Ok(())
    }

    pub fn reset_all_to_flows(&mut self, opts: ResetOptions) -> SystemResult<()> {
        let mut work = self.clone();
        work.reset_to_flows(opts)?;
        for ext in work.extensions.values_mut() {
            ext.reset_to_flows(opts, &mut work.events)?;
        }
        *self = work;
        Ok(())
    }

    pub fn reset_all_to_coefficients(&mut self) {
        self.reset_to_coefficients();
        for ext in self.extensions.values_mut() {
            ext.reset_to_coefficients(&mut self.events);
        }
    }

    /// Full reset of every extension; the core is untouched.
    pub fn reset_extensions(&mut self, opts: ResetOptions) -> SystemResult<()> {
        let mut work = self.extensions.clone();
        let mut log = EventLog::new();
        for ext in work.values_mut() {
            ext.reset_full(opts, &mut log)?;
        }
        self.extensions = work;
        self.events.absorb(log);
        Ok(())
    }

    fn check_basic(&mut self, opts: ResetOptions) -> SystemResult<()> {
        let missing: Vec<String> = [SystemTable::Z, SystemTable::Y]
            .iter()
            .filter(|t| !self.tables.contains_key(t))
            .map(|t| t.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        if opts.force {
            self.events.warning(format!(
                "Recalculation of system {} after reset not possible ({:?} missing)",
                self.name, missing
            ));
            Ok(())
        } else {
            Err(SystemError::ResetNotPossible { missing })
        }
    }

    // ---- Analysis helpers ----

    /// Gross bilateral trade from `Z` and `Y`.
    pub fn get_gross_trade(&self) -> SystemResult<GrossTrade> {
        match (self.z(), self.y()) {
            (Some(z), Some(y)) => Ok(calc_gross_trade(z, y)?),
            _ => Err(SystemError::Underdetermined {
                operation: "get_gross_trade".to_string(),
                missing: [SystemTable::Z, SystemTable::Y]
                    .iter()
                    .filter(|t| !self.tables.contains_key(t))
                    .map(|t| t.to_string())
                    .collect(),
            }),
        }
    }

    /// Independent copy under a new name.
    pub fn copy(&self, new_name: &str) -> IOSystem {
        let mut copy = self.clone();
        copy.name = new_name.to_string();
        copy.events.note(format!("Copy of system {}", self.name));
        copy
    }

    /// Regions, sectors, categories and extension rows containing `term`
    /// (regular expression, unanchored).
    pub fn find(&self, term: &str) -> SystemResult<FindResult> {
        let matcher = LabelMatcher::new(MatchMode::Contains, term)?;
        let keep = |labels: Vec<String>| -> Vec<String> {
            labels.into_iter().filter(|l| matcher.is_match(l)).collect()
        };
        let mut extension_rows = IndexMap::new();
        for (name, ext) in &self.extensions {
            let hits: Vec<Key> =
                ext.get_rows().into_iter().filter(|k| k.iter().any(|l| matcher.is_match(l))).collect();
            if !hits.is_empty() {
                extension_rows.insert(name.clone(), hits);
            }
        }
        Ok(FindResult {
            regions: keep(self.get_regions()),
            sectors: keep(self.get_sectors()),
            y_categories: keep(self.get_y_categories()),
            extension_rows,
        })
    }

    // ---- Comparison ----

    /// Same tables and extensions with values within `tol`, in any row or
    /// column order. Names and event logs are not compared.
    pub fn approx_eq(&self, other: &IOSystem, tol: f64) -> bool {
        if self.present_tables() != other.present_tables() {
            return false;
        }
        let tables = self
            .tables
            .iter()
            .all(|(k, t)| other.tables.get(k).map(|o| t.approx_eq(o, tol)).unwrap_or(false));
        let population = match (&self.population, &other.population) {
            (None, None) => true,
            (Some(a), Some(b)) => a.approx_eq(b, tol),
            _ => false,
        };
        let unit = match (&self.unit, &other.unit) {
            (None, None) => true,
            (Some(a), Some(b)) => b.reindex(a.index(), None).map(|b| b.units() == a.units()).unwrap_or(false),
            _ => false,
        };
        let extensions = self.extensions.len() == other.extensions.len()
            && self
                .extensions
                .iter()
                .all(|(n, e)| other.extensions.get(n).map(|o| e.approx_eq(o, tol)).unwrap_or(false));
        tables && population && unit && extensions
    }

    /// Accounts of all extensions for one table, keyed by extension name.
    pub fn extension_tables(&self, which: ExtensionTable) -> IndexMap<String, &Table> {
        self.extensions
            .iter()
            .filter_map(|(n, e)| e.table(which).map(|t| (n.clone(), t)))
            .collect()
    }
}

/// Purpose
/// -------
/// Check the column axes of every table of `ext` against a core index and
/// the final-demand columns.
///
/// Parameters
/// ----------
/// - `core`: `(region, sector)` index the core tables share, if any.
/// - `y_cols`: columns of `Y`, if present.
///
/// Invariants
/// ----------
/// - `(region, sector)` columns must follow `core` in identical order;
///   final-demand columns must carry the labels of `y_cols`.
fn check_axes(ext: &Extension, core: Option<&Index>, y_cols: Option<&Index>) -> SystemResult<()> {
    for (which, table) in ext.tables() {
        let levels = column_levels(which);
        if levels == [REGION, SECTOR] {
            if let Some(core) = core {
                if !core.same_order(table.cols()) {
                    return Err(mismatch(format!("{} of extension {} against the core", which, ext.name())));
                }
            }
        } else if which.is_final_demand() {
            if let Some(y_cols) = y_cols {
                if !y_cols.same_labels(table.cols()) {
                    return Err(mismatch(format!("{} of extension {} against Y", which, ext.name())));
                }
            }
        }
    }
    Ok(())
}

fn mismatch(operation: String) -> SystemError {
    SystemError::Table(TableError::IndexMismatch { operation })
}
