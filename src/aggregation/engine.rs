//! aggregation::engine — Kronecker-structured aggregation of a whole system.
//!
//! Purpose
//! -------
//! Aggregate regions, sectors and final-demand categories of an
//! [`IOSystem`] and all of its extensions in one consistent step.
//!
//! Key behaviors
//! -------------
//! - The combined operator over `(region, sector)` is `C = C_r ⊗ C_s`; over
//!   `(region, category)` it is `C_y = C_r ⊗ C_c`.
//! - `Z' = C·Z·Cᵀ`, `Y' = C·Y·C_yᵀ`, `x' = C·x`, `F' = F·Cᵀ`,
//!   `F_Y' = F_Y·C_yᵀ`, population `p' = p·C_rᵀ`. Extension rows keyed by
//!   `(region, sector)` are aggregated with `C` as well.
//! - Derived tables are dropped through a reset to flows and, by default,
//!   recalculated afterwards.
//!
//! Invariants & assumptions
//! ------------------------
//! - All specs are resolved and validated before anything changes; any
//!   error leaves the system as it was.
//! - Axes are complete region-major products (every region carries every
//!   sector in the same order). Other layouts are rejected.
//! - Units of the core must be uniform; hybrid tables cannot be summed.
use crate::aggregation::concordance::{AggregationSpec, Concordance};
use crate::system::{
    errors::{SystemError, SystemResult},
    extension::column_levels,
    iosystem::IOSystem,
    options::{CalcOptions, ResetOptions},
    tables::SystemTable,
    units::Units,
};
use crate::table::{FillPolicy, Index, Table, CATEGORY, REGION, SECTOR};
use ndarray::{linalg::kron, Array2};

/// Switches for [`IOSystem::aggregate`].
///
/// `recalc` (default `true`) runs `calc_all` on the aggregated system,
/// with Ghosh tables when `include_ghosh` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOptions {
    pub recalc: bool,
    pub include_ghosh: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        AggregationOptions { recalc: true, include_ghosh: false }
    }
}

/// Operators for one aggregation, resolved against a system.
#[derive(Debug, Clone)]
struct Operators {
    region: Concordance,
    sector: Concordance,
    category: Concordance,
    core: Array2<f64>,
    final_demand: Array2<f64>,
    core_index: Index,
    y_index: Index,
    y_source: Index,
}

impl IOSystem {
    /// Aggregate regions, sectors and final-demand categories.
    ///
    /// Errors
    /// ------
    /// - `SystemError::InvalidAggregation` for a spec that is not a total
    ///   partition, or axes that are not complete region-major products.
    /// - `SystemError::HybridUnits` when the core has more than one unit.
    /// - `SystemError::Underdetermined` when `Z` or `Y` is absent.
    /// - Any error of the subsequent recalculation.
    pub fn aggregate(
        &mut self, regions: &AggregationSpec, sectors: &AggregationSpec, categories: &AggregationSpec,
        opts: &AggregationOptions,
    ) -> SystemResult<()> {
        let ops = self.resolve_operators(regions, sectors, categories)?;
        if let Some(unit) = &self.unit {
            if !unit.is_uniform() {
                return Err(SystemError::HybridUnits { units: unit.distinct() });
            }
        }

        let mut work = self.clone();
        work.reset_all_to_flows(ResetOptions::default()).map_err(|e| match e {
            SystemError::ResetNotPossible { missing } => SystemError::Underdetermined {
                operation: "aggregate (run calc_all first)".to_string(),
                missing,
            },
            other => other,
        })?;

        work.aggregate_core(&ops)?;
        let core_source = source_core_index(self)?;
        for ext in work.extensions.values_mut() {
            let mut tables = std::mem::take(&mut ext.tables);
            for (which, table) in tables.iter_mut() {
                let mut t = if column_levels(*which) == [REGION, SECTOR] {
                    apply_cols(table, &ops.core, &ops.core_index, &core_source)?
                } else if which.is_final_demand() {
                    apply_cols(table, &ops.final_demand, &ops.y_index, &ops.y_source)?
                } else {
                    table.clone()
                };
                if t.rows().same_order(&core_source) {
                    t = apply_rows(&t, &ops.core, &ops.core_index)?;
                }
                *table = t;
            }
            ext.tables = tables;
            if let Some(unit) = &ext.unit {
                if unit.index().same_order(&core_source) {
                    let first = unit.units().first().cloned().unwrap_or_default();
                    ext.unit = Some(Units::uniform(ops.core_index.clone(), &first));
                }
            }
        }

        let summary = format!(
            "Aggregated system {}: {} regions -> {}, {} sectors -> {}, {} categories -> {}",
            self.name,
            ops.region.originals.len(),
            ops.region.ngroups(),
            ops.sector.originals.len(),
            ops.sector.ngroups(),
            ops.category.originals.len(),
            ops.category.ngroups(),
        );
        tracing::info!(target: "rust_mrio", "{}", summary);
        work.events.modification(summary);

        if opts.recalc {
            work.calc_all(&CalcOptions::new(opts.include_ghosh))?;
        }
        *self = work;
        Ok(())
    }

    /// Aggregate sectors only; regions and categories stay.
    pub fn aggregate_sectors(&mut self, sectors: &AggregationSpec, opts: &AggregationOptions) -> SystemResult<()> {
        self.aggregate(&AggregationSpec::Identity, sectors, &AggregationSpec::Identity, opts)
    }

    /// Aggregate regions only; sectors and categories stay.
    pub fn aggregate_regions(&mut self, regions: &AggregationSpec, opts: &AggregationOptions) -> SystemResult<()> {
        self.aggregate(regions, &AggregationSpec::Identity, &AggregationSpec::Identity, opts)
    }

    fn resolve_operators(
        &self, regions: &AggregationSpec, sectors: &AggregationSpec, categories: &AggregationSpec,
    ) -> SystemResult<Operators> {
        let region_labels = self.get_regions();
        let sector_labels = self.get_sectors();
        let category_labels = self.get_y_categories();
        if region_labels.is_empty() {
            return Err(SystemError::Underdetermined {
                operation: "aggregate".to_string(),
                missing: vec![SystemTable::Z.to_string()],
            });
        }
        // F_Y of the extensions is aggregated over the axis of Y
        let y = self.y().ok_or_else(|| SystemError::Underdetermined {
            operation: "aggregate".to_string(),
            missing: vec![SystemTable::Y.to_string()],
        })?;

        let region = Concordance::from_spec(regions, &region_labels, REGION, "reg")?;
        let sector = Concordance::from_spec(sectors, &sector_labels, SECTOR, "sec")?;
        let category = Concordance::from_spec(categories, &category_labels, CATEGORY, "cat")?;

        source_core_index(self)?;
        let y_source = canonical(y.cols(), &[REGION, CATEGORY])?;

        let core_index = Index::product(&[REGION, SECTOR], &[region.groups.clone(), sector.groups.clone()])?;
        let y_index = Index::product(&[REGION, CATEGORY], &[region.groups.clone(), category.groups.clone()])?;
        Ok(Operators {
            core: kron(&region.matrix, &sector.matrix),
            final_demand: kron(&region.matrix, &category.matrix),
            region,
            sector,
            category,
            core_index,
            y_index,
            y_source,
        })
    }

    fn aggregate_core(&mut self, ops: &Operators) -> SystemResult<()> {
        let source = source_core_index(self)?;

        let mut tables = std::mem::take(&mut self.tables);
        for (which, table) in tables.iter_mut() {
            let rows_done = apply_rows(&table.reindex_rows(&source, FillPolicy::Fail)?, &ops.core, &ops.core_index)?;
            *table = match which {
                SystemTable::Y => apply_cols(&rows_done, &ops.final_demand, &ops.y_index, &ops.y_source)?,
                SystemTable::X => rows_done,
                _ => apply_cols(&rows_done, &ops.core, &ops.core_index, &source)?,
            };
        }
        self.tables = tables;

        if let Some(pop) = &self.population {
            let regions = Index::single(REGION, ops.region.originals.clone());
            let aligned = pop.reindex_cols(&regions, FillPolicy::Fail)?;
            let data = aligned.data().dot(&ops.region.matrix.t());
            self.population =
                Some(Table::new(data, aligned.rows().clone(), Index::single(REGION, ops.region.groups.clone()))?);
        }
        if let Some(unit) = &self.unit {
            let first = unit.units().first().cloned().unwrap_or_default();
            self.unit = Some(Units::uniform(ops.core_index.clone(), &first));
        }
        Ok(())
    }
}

// ---- Helper methods ----

/// Canonical region-major `(region, sector)` index of the system's core.
fn source_core_index(sys: &IOSystem) -> SystemResult<Index> {
    let core = sys.core_index().ok_or_else(|| SystemError::Underdetermined {
        operation: "aggregate".to_string(),
        missing: vec![SystemTable::Z.to_string()],
    })?;
    canonical(core, &[REGION, SECTOR])
}

/// The complete product of the index's level values; errors unless the
/// index is exactly that product, in that order.
fn canonical(index: &Index, levels: &[&str; 2]) -> SystemResult<Index> {
    let outer = index.unique_level_values(levels[0])?;
    let inner = index.unique_level_values(levels[1])?;
    let product = Index::product(levels, &[outer, inner])?;
    if !product.same_order(index) {
        return Err(SystemError::InvalidAggregation {
            dimension: format!("{}×{}", levels[0], levels[1]),
            reason: "axis is not a complete region-major product".to_string(),
        });
    }
    Ok(product)
}

/// `C · T` with the new row index.
fn apply_rows(table: &Table, conc: &Array2<f64>, target: &Index) -> SystemResult<Table> {
    let data = conc.dot(table.data());
    Ok(Table::new(data, target.clone(), table.cols().clone())?)
}

/// `T · Cᵀ` after aligning the columns to `source`.
fn apply_cols(table: &Table, conc: &Array2<f64>, target: &Index, source: &Index) -> SystemResult<Table> {
    let aligned = table.reindex_cols(source, FillPolicy::Fail)?;
    let data = aligned.data().dot(&conc.t());
    Ok(Table::new(data, aligned.rows().clone(), target.clone())?)
}
