//! Unit labels per row of a system or extension.
//!
//! `Units` pairs an [`Index`] with one unit string per key. The core's
//! units are keyed by region × sector, an extension's by its stressor rows.
//! Unit tables follow their tables through selection, renaming, grouping
//! and concatenation.
use crate::system::errors::{SystemError, SystemResult};
use crate::table::{Index, Key, TableError};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Units {
    index: Index,
    units: Vec<String>,
}

impl Units {
    /// Errors
    /// ------
    /// - `TableError::ShapeMismatch` when lengths differ.
    pub fn new<S: Into<String>>(index: Index, units: Vec<S>) -> SystemResult<Self> {
        let units: Vec<String> = units.into_iter().map(Into::into).collect();
        if units.len() != index.len() {
            return Err(SystemError::Table(TableError::ShapeMismatch {
                expected: (index.len(), 1),
                actual: (units.len(), 1),
            }));
        }
        Ok(Units { index, units })
    }

    /// Every row in the same unit.
    pub fn uniform(index: Index, unit: &str) -> Self {
        let units = vec![unit.to_string(); index.len()];
        Units { index, units }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, key: &[String]) -> Option<&str> {
        self.index.position(key).map(|p| self.units[p].as_str())
    }

    /// Distinct units in first-appearance order.
    pub fn distinct(&self) -> Vec<String> {
        crate::table::index::unique_in_order(self.units.clone())
    }

    pub fn is_uniform(&self) -> bool {
        self.distinct().len() <= 1
    }

    pub fn select(&self, positions: &[usize]) -> Units {
        Units {
            index: self.index.select(positions),
            units: positions.iter().filter_map(|&p| self.units.get(p).cloned()).collect(),
        }
    }

    /// Units for `target` keys; absent keys get `fill`, or fail when `None`.
    pub fn reindex(&self, target: &Index, fill: Option<&str>) -> SystemResult<Units> {
        let lookup = self.index.position_map();
        let mut units = Vec::with_capacity(target.len());
        let mut missing: Vec<Key> = Vec::new();
        for key in target.keys() {
            match (lookup.get(key.as_slice()), fill) {
                (Some(&p), _) => units.push(self.units[p].clone()),
                (None, Some(f)) => units.push(f.to_string()),
                (None, None) => missing.push(key.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(SystemError::Table(TableError::MissingKeys { keys: missing }));
        }
        Ok(Units { index: target.clone(), units })
    }

    pub fn rename_labels(&self, level: &str, map: &HashMap<String, String>) -> SystemResult<Units> {
        Ok(Units { index: self.index.rename_labels(level, map)?, units: self.units.clone() })
    }

    pub fn with_index(&self, index: Index) -> SystemResult<Units> {
        Units::new(index, self.units.clone())
    }

    /// One entry per distinct key; the first unit wins.
    pub fn dedup(&self) -> Units {
        let (index, groups) = self.index.group_duplicates();
        let mut units: Vec<Option<String>> = vec![None; index.len()];
        for (pos, g) in groups.iter().enumerate() {
            if units[*g].is_none() {
                units[*g] = Some(self.units[pos].clone());
            }
        }
        Units { index, units: units.into_iter().map(Option::unwrap_or_default).collect() }
    }

    /// Append other unit tables; level names must agree.
    pub fn concat(&self, others: &[&Units]) -> SystemResult<Units> {
        let idx: Vec<&Index> = others.iter().map(|u| &u.index).collect();
        let index = self.index.concat(&idx)?;
        let mut units = self.units.clone();
        for o in others {
            units.extend(o.units.iter().cloned());
        }
        Ok(Units { index, units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::STRESSOR;

    #[test]
    // Purpose
    // -------
    // Reindexing keeps units per key and fills or fails for new keys.
    fn reindex_fills_or_fails() {
        let units = Units::new(Index::single(STRESSOR, ["co2", "ch4"]), vec!["kg", "t"]).unwrap();
        let target = Index::single(STRESSOR, ["ch4", "n2o"]);

        let filled = units.reindex(&target, Some("")).unwrap();
        assert_eq!(filled.units(), &["t".to_string(), "".to_string()]);
        assert!(units.reindex(&target, None).is_err());
        assert!(!units.is_uniform());
    }

    #[test]
    // Purpose
    // -------
    // Duplicate keys collapse with the first unit kept.
    fn dedup_keeps_first_unit() {
        let units = Units::new(Index::single(STRESSOR, ["co2", "co2", "ch4"]), vec!["kg", "t", "kg"])
            .unwrap();
        let d = units.dedup();
        assert_eq!(d.len(), 2);
        assert_eq!(d.get(&["co2".to_string()]), Some("kg"));
    }
}
