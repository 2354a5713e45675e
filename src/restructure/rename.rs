//! restructure::rename — bijective relabeling of regions, sectors and
//! final-demand categories.
//!
//! A rename is given either as a map (unmapped labels stay) or as a
//! complete list in the current label order. Any rename that would make
//! two distinct labels equal is rejected; merging labels is aggregation.
use crate::system::{
    errors::{SystemError, SystemResult},
    extension::Extension,
    iosystem::IOSystem,
};
use crate::table::{index::unique_in_order, CATEGORY, REGION, SECTOR};
use std::collections::HashMap;

/// New labels for one level.
#[derive(Debug, Clone, PartialEq)]
pub enum RenameSpec {
    /// `old → new` pairs; labels not listed keep their name.
    Map(HashMap<String, String>),
    /// New labels for all current labels, in current order.
    List(Vec<String>),
}

impl RenameSpec {
    pub fn map<S: Into<String>>(pairs: Vec<(S, S)>) -> Self {
        RenameSpec::Map(pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect())
    }

    pub fn list<S: Into<String>>(labels: Vec<S>) -> Self {
        RenameSpec::List(labels.into_iter().map(Into::into).collect())
    }

    /// Complete `old → new` map for `current`, checked to be bijective.
    ///
    /// Errors
    /// ------
    /// - `SystemError::RenameCollision` when two labels end up equal.
    /// - `SystemError::RenameLength` when a list does not hold exactly one
    ///   label per existing label.
    pub fn resolve(&self, level: &str, current: &[String]) -> SystemResult<HashMap<String, String>> {
        let map: HashMap<String, String> = match self {
            RenameSpec::Map(map) => map.clone(),
            RenameSpec::List(labels) => {
                if labels.len() != current.len() {
                    return Err(SystemError::RenameLength {
                        level: level.to_string(),
                        expected: current.len(),
                        found: labels.len(),
                    });
                }
                current.iter().cloned().zip(labels.iter().cloned()).collect()
            }
        };

        let renamed: Vec<String> =
            current.iter().map(|c| map.get(c).cloned().unwrap_or_else(|| c.clone())).collect();
        let distinct = unique_in_order(renamed.clone());
        if distinct.len() != renamed.len() {
            let mut seen = std::collections::HashSet::new();
            let label = renamed.into_iter().find(|l| !seen.insert(l.clone())).unwrap_or_default();
            return Err(SystemError::RenameCollision { level: level.to_string(), label });
        }
        Ok(map)
    }
}

impl Extension {
    /// Relabel `level` on every table axis and the units that carry it.
    pub fn rename_labels(&mut self, level: &str, map: &HashMap<String, String>) -> SystemResult<()> {
        let mut tables = self.tables.clone();
        for table in tables.values_mut() {
            *table = table.rename_labels(level, map)?;
        }
        let unit = match &self.unit {
            Some(u) if u.index().has_level(level) => Some(u.rename_labels(level, map)?),
            other => other.clone(),
        };
        self.tables = tables;
        self.unit = unit;
        Ok(())
    }
}

impl IOSystem {
    pub fn rename_regions(&mut self, spec: &RenameSpec) -> SystemResult<()> {
        let current = self.get_regions();
        self.rename_level(REGION, &current, spec)
    }

    pub fn rename_sectors(&mut self, spec: &RenameSpec) -> SystemResult<()> {
        let current = self.get_sectors();
        self.rename_level(SECTOR, &current, spec)
    }

    pub fn rename_y_categories(&mut self, spec: &RenameSpec) -> SystemResult<()> {
        let current = self.get_y_categories();
        self.rename_level(CATEGORY, &current, spec)
    }

    /// Relabel `level` across core tables, units, population and extensions.
    fn rename_level(&mut self, level: &str, current: &[String], spec: &RenameSpec) -> SystemResult<()> {
        let map = spec.resolve(level, current)?;
        let mut work = self.clone();
        for table in work.tables.values_mut() {
            *table = table.rename_labels(level, &map)?;
        }
        if let Some(pop) = &work.population {
            work.population = Some(pop.rename_labels(level, &map)?);
        }
        if let Some(unit) = &work.unit {
            if unit.index().has_level(level) {
                work.unit = Some(unit.rename_labels(level, &map)?);
            }
        }
        for ext in work.extensions.values_mut() {
            ext.rename_labels(level, &map)?;
        }
        let changed = map.iter().filter(|(a, b)| a != b && current.contains(a)).count();
        work.events.modification(format!("Renamed {} {} labels", changed, level));
        *self = work;
        Ok(())
    }
}
