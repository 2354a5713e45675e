//! characterization::validation — consistency report for factor tables.
//!
//! Two findings are fatal and stop a characterization from producing an
//! extension: an impact listed with more than one unit, and a factor whose
//! stressor unit disagrees with the unit the extension records. Everything
//! else (factors for stressors, regions or sectors the extension does not
//! have, extension rows no factor covers) is reported as a warning and
//! treated as a zero contribution.
use crate::characterization::factors::CharacterizationTable;
use crate::system::extension::Extension;
use crate::table::{index::unique_in_order, Key, REGION, SECTOR};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Stressor unit in a factor that differs from the extension's unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressorUnitMismatch {
    pub extension: String,
    pub stressor: Key,
    pub expected: String,
    pub found: String,
}

/// Findings of a factor table checked against one or more extensions.
///
/// Fields
/// ------
/// - `impact_unit_conflicts`: `Vec<(String, Vec<String>)>`
///   Impacts with several units (fatal).
/// - `stressor_unit_mismatches`: `Vec<StressorUnitMismatch>` (fatal)
/// - `missing_stressors`: `Vec<(String, Key)>`
///   `(extension, stressor)` pairs named by factors but absent.
/// - `missing_regions` / `missing_sectors`: `Vec<String>`
///   Labels factors are restricted to that no extension column carries.
/// - `unmatched_rows`: `Vec<(String, Key)>`
///   Extension rows without any factor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterizationValidation {
    pub impact_unit_conflicts: Vec<(String, Vec<String>)>,
    pub stressor_unit_mismatches: Vec<StressorUnitMismatch>,
    pub missing_stressors: Vec<(String, Key)>,
    pub missing_regions: Vec<String>,
    pub missing_sectors: Vec<String>,
    pub unmatched_rows: Vec<(String, Key)>,
}

impl CharacterizationValidation {
    /// Check `table` against `ext`; every factor is assumed to apply to it
    /// and to carry a key for each row level.
    pub fn check(table: &CharacterizationTable, ext: &Extension) -> Self {
        let mut report = CharacterizationValidation {
            impact_unit_conflicts: impact_unit_conflicts(table),
            ..Default::default()
        };
        let Some(rows) = ext.rows() else { return report };
        let levels = rows.names().to_vec();

        let mut covered: HashSet<Key> = HashSet::new();
        let mut missing: Vec<Key> = Vec::new();
        for f in table.factors() {
            let Some(key) = f.stressor_key(&levels) else { continue };
            if !rows.contains(&key) {
                missing.push(key);
                continue;
            }
            if let (Some(expected), Some(found)) = (&f.stressor_unit, ext.unit().and_then(|u| u.get(&key))) {
                if expected != found {
                    report.stressor_unit_mismatches.push(StressorUnitMismatch {
                        extension: ext.name().to_string(),
                        stressor: key.clone(),
                        expected: expected.clone(),
                        found: found.to_string(),
                    });
                }
            }
            covered.insert(key);
        }
        report.missing_stressors =
            unique_in_order(missing).into_iter().map(|k| (ext.name().to_string(), k)).collect();
        report.unmatched_rows = rows
            .keys()
            .iter()
            .filter(|k| !covered.contains(*k))
            .map(|k| (ext.name().to_string(), k.clone()))
            .collect();

        let (regions, sectors) = column_labels(ext);
        report.missing_regions = unique_in_order(
            table.factors().iter().filter_map(|f| f.region.clone()).filter(|r| !regions.contains(r)).collect(),
        );
        report.missing_sectors = unique_in_order(
            table.factors().iter().filter_map(|f| f.sector.clone()).filter(|s| !sectors.contains(s)).collect(),
        );
        report
    }

    /// True when no extension may be produced.
    pub fn is_fatal(&self) -> bool {
        !self.impact_unit_conflicts.is_empty() || !self.stressor_unit_mismatches.is_empty()
    }

    /// True when nothing at all was found.
    pub fn is_clean(&self) -> bool {
        self == &CharacterizationValidation::default()
    }

    /// Fold in the report for another extension.
    ///
    /// Regions and sectors count as missing only when missing everywhere.
    pub fn merge(&mut self, other: CharacterizationValidation) {
        for conflict in other.impact_unit_conflicts {
            if !self.impact_unit_conflicts.contains(&conflict) {
                self.impact_unit_conflicts.push(conflict);
            }
        }
        self.stressor_unit_mismatches.extend(other.stressor_unit_mismatches);
        self.missing_stressors.extend(other.missing_stressors);
        self.unmatched_rows.extend(other.unmatched_rows);
        self.missing_regions.retain(|r| other.missing_regions.contains(r));
        self.missing_sectors.retain(|s| other.missing_sectors.contains(s));
    }

    /// Human-readable findings, fatal ones first.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (impact, units) in &self.impact_unit_conflicts {
            out.push(format!("impact '{}' has inconsistent units {:?}", impact, units));
        }
        for m in &self.stressor_unit_mismatches {
            out.push(format!(
                "stressor {:?} of extension {} has unit '{}', factor expects '{}'",
                m.stressor, m.extension, m.found, m.expected
            ));
        }
        for (ext, key) in &self.missing_stressors {
            out.push(format!("stressor {:?} not present in extension {}", key, ext));
        }
        if !self.missing_regions.is_empty() {
            out.push(format!("regions {:?} not present in the extension", self.missing_regions));
        }
        if !self.missing_sectors.is_empty() {
            out.push(format!("sectors {:?} not present in the extension", self.missing_sectors));
        }
        for (ext, key) in &self.unmatched_rows {
            out.push(format!("row {:?} of extension {} has no characterization factor", key, ext));
        }
        out
    }
}

// ---- Helper methods ----

/// Impacts listed with more than one unit.
pub(crate) fn impact_unit_conflicts(table: &CharacterizationTable) -> Vec<(String, Vec<String>)> {
    let mut units: IndexMap<&str, Vec<String>> = IndexMap::new();
    for f in table.factors() {
        let entry = units.entry(f.impact.as_str()).or_default();
        if !entry.contains(&f.impact_unit) {
            entry.push(f.impact_unit.clone());
        }
    }
    units.into_iter().filter(|(_, u)| u.len() > 1).map(|(i, u)| (i.to_string(), u)).collect()
}

/// Regions and sectors on the column axes of the extension's tables.
fn column_labels(ext: &Extension) -> (HashSet<String>, HashSet<String>) {
    let mut regions = HashSet::new();
    let mut sectors = HashSet::new();
    for (_, table) in ext.tables() {
        if let Ok(values) = table.cols().level_values(REGION) {
            regions.extend(values);
        }
        if let Ok(values) = table.cols().level_values(SECTOR) {
            sectors.extend(values);
        }
    }
    (regions, sectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characterization::factors::CharacterizationFactor;
    use crate::system::Units;
    use crate::table::{Index, Table, STRESSOR};
    use ndarray::array;

    fn extension() -> Extension {
        let cols = Index::product(&[REGION, SECTOR], &[vec!["R1".into()], vec!["a".into(), "b".into()]]).unwrap();
        let rows = Index::single(STRESSOR, ["co2", "ch4", "n2o"]);
        let f = Table::new(array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]], rows.clone(), cols).unwrap();
        Extension::from_flows("em", f, None, Some(Units::new(rows, vec!["kg", "kg", "g"]).unwrap())).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Warnings and fatal findings are separated.
    //
    // Given
    // -----
    // - Factors for co2 (with region R9 and sector zz), ch4, and so2 (absent);
    //   n2o without any factor.
    //
    // Expect
    // ------
    // - Not fatal; so2 missing; n2o unmatched; R9 and zz missing.
    fn warnings_are_not_fatal() {
        let table = CharacterizationTable::new(vec![
            CharacterizationFactor::new(vec![(STRESSOR, "co2")], "gwp", "kg co2eq", 1.0).in_region("R9"),
            CharacterizationFactor::new(vec![(STRESSOR, "co2")], "gwp", "kg co2eq", 1.0).in_sector("zz"),
            CharacterizationFactor::new(vec![(STRESSOR, "ch4")], "gwp", "kg co2eq", 28.0).with_stressor_unit("kg"),
            CharacterizationFactor::new(vec![(STRESSOR, "so2")], "acid", "kg so2eq", 1.0),
        ])
        .unwrap();
        let v = CharacterizationValidation::check(&table, &extension());
        assert!(!v.is_fatal());
        assert!(!v.is_clean());
        assert_eq!(v.missing_stressors, vec![("em".to_string(), vec!["so2".to_string()])]);
        assert_eq!(v.unmatched_rows, vec![("em".to_string(), vec!["n2o".to_string()])]);
        assert_eq!(v.missing_regions, vec!["R9".to_string()]);
        assert_eq!(v.missing_sectors, vec!["zz".to_string()]);
        assert_eq!(v.messages().len(), 4);
    }

    #[test]
    // Purpose
    // -------
    // Impact unit conflicts and stressor unit mismatches are fatal.
    fn unit_problems_are_fatal() {
        let table = CharacterizationTable::new(vec![
            CharacterizationFactor::new(vec![(STRESSOR, "co2")], "gwp", "kg co2eq", 1.0),
            CharacterizationFactor::new(vec![(STRESSOR, "ch4")], "gwp", "t co2eq", 0.028),
            CharacterizationFactor::new(vec![(STRESSOR, "n2o")], "ozone", "kg", 1.0).with_stressor_unit("kg"),
        ])
        .unwrap();
        let v = CharacterizationValidation::check(&table, &extension());
        assert!(v.is_fatal());
        assert_eq!(v.impact_unit_conflicts.len(), 1);
        assert_eq!(v.stressor_unit_mismatches.len(), 1);
        assert_eq!(v.stressor_unit_mismatches[0].found, "g");
    }
}
