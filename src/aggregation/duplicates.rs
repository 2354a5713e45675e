//! aggregation::duplicates — merge repeated labels.
//!
//! Parsers and manual edits can leave several rows or columns under the
//! same key. [`IOSystem::aggregate_duplicates`] resets the system to flows
//! and sums every group of identical keys on both axes of every table,
//! keeping the first unit of each group. Nothing is recalculated.
use crate::system::{
    errors::SystemResult,
    iosystem::IOSystem,
    options::ResetOptions,
};

impl IOSystem {
    /// Sum rows and columns with identical keys across core, population,
    /// units and all extensions.
    ///
    /// Errors
    /// ------
    /// - `SystemError::ResetNotPossible` when the reset to flows is not
    ///   possible and `opts.force` is not set.
    pub fn aggregate_duplicates(&mut self, opts: ResetOptions) -> SystemResult<()> {
        let mut work = self.clone();
        work.reset_all_to_flows(opts)?;

        for table in work.tables.values_mut() {
            *table = table.sum_duplicates();
        }
        if let Some(pop) = &work.population {
            work.population = Some(pop.sum_duplicates());
        }
        if let Some(unit) = &work.unit {
            work.unit = Some(unit.dedup());
        }
        for ext in work.extensions.values_mut() {
            for table in ext.tables.values_mut() {
                *table = table.sum_duplicates();
            }
            if let Some(unit) = &ext.unit {
                ext.unit = Some(unit.dedup());
            }
        }

        work.events.modification(format!("Aggregated duplicate labels of system {}", work.name));
        *self = work;
        Ok(())
    }
}
