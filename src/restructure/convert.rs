//! restructure::convert — bridging extension rows onto a new classification.
//!
//! Purpose
//! -------
//! Map the rows of an extension (e.g. `stressor × compartment`) onto new
//! row keys (e.g. `impact`) through a [`ConversionBridge`]: every bridge row
//! names regex patterns per source level, a target key and a factor. The
//! converted value of a target row is the factor-weighted sum of all
//! source rows it matches.
//!
//! Key behaviors
//! -------------
//! - Source patterns are matched as full-label regexes.
//! - The conversion is a `target × source` matrix applied to every table
//!   of the extension; all extension tables are linear in their rows.
//! - Source levels that are neither matched by a pattern nor listed as
//!   replaced are summed away by default, or carried into the target key.
//! - Source rows no bridge row matches are dropped with a warning.
//! - An optional target order reindexes the result, zero-filling or
//!   rejecting absent target rows and dropping rows outside the order.
//!
//! Conventions
//! -----------
//! - Units are checked against `unit_orig` when requested; the unit of a
//!   target row is `unit_new`, or else the source unit.
use crate::restructure::concat::extension_concate;
use crate::system::{
    errors::{SystemError, SystemResult},
    extension::Extension,
    iosystem::IOSystem,
    units::Units,
};
use crate::table::{
    index::unique_in_order, selection::LabelMatcher, FillPolicy, Index, Key, MatchMode, Table, NULL_LABEL,
};
use indexmap::IndexMap;
use ndarray::Array2;

/// One entry of a conversion bridge.
///
/// Fields
/// ------
/// - `extension`: `Option<String>`
///   Restrict the entry to one extension (system-level conversion only).
/// - `source`: `Vec<(String, String)>`
///   `(level, regex)` pairs; a source row matches when all patterns match.
/// - `target`: `Vec<String>`
///   Target labels, one per target level of the bridge.
/// - `factor`: `f64`
/// - `unit_orig` / `unit_new`: `Option<String>`
///   Expected source unit and unit of the target row.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeRow {
    pub extension: Option<String>,
    pub source: Vec<(String, String)>,
    pub target: Vec<String>,
    pub factor: f64,
    pub unit_orig: Option<String>,
    pub unit_new: Option<String>,
}

impl BridgeRow {
    pub fn new(source: Vec<(&str, &str)>, target: Vec<&str>, factor: f64) -> Self {
        BridgeRow {
            extension: None,
            source: source.into_iter().map(|(l, p)| (l.to_string(), p.to_string())).collect(),
            target: target.into_iter().map(str::to_string).collect(),
            factor,
            unit_orig: None,
            unit_new: None,
        }
    }

    pub fn with_units(mut self, unit_orig: &str, unit_new: &str) -> Self {
        self.unit_orig = Some(unit_orig.to_string());
        self.unit_new = Some(unit_new.to_string());
        self
    }

    pub fn for_extension(mut self, name: &str) -> Self {
        self.extension = Some(name.to_string());
        self
    }
}

/// Bridge from source row keys to target row keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionBridge {
    target_levels: Vec<String>,
    replaces: Vec<String>,
    rows: Vec<BridgeRow>,
}

impl ConversionBridge {
    /// Errors
    /// ------
    /// - `SystemError::InvalidBridge` when a row has no source pattern,
    ///   a target of the wrong length, or a non-finite factor.
    /// - `TableError::InvalidPattern` for a malformed regex.
    pub fn new<S: Into<String>>(target_levels: Vec<S>, rows: Vec<BridgeRow>) -> SystemResult<Self> {
        let target_levels: Vec<String> = target_levels.into_iter().map(Into::into).collect();
        if target_levels.is_empty() {
            return Err(invalid("no target levels"));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.source.is_empty() {
                return Err(invalid(&format!("row {} has no source pattern", i)));
            }
            if row.target.len() != target_levels.len() {
                return Err(invalid(&format!(
                    "row {} has {} target labels for {} target levels",
                    i,
                    row.target.len(),
                    target_levels.len()
                )));
            }
            if !row.factor.is_finite() {
                return Err(invalid(&format!("row {} has a non-finite factor", i)));
            }
            for (_, pattern) in &row.source {
                LabelMatcher::new(MatchMode::FullMatch, pattern)?;
            }
        }
        Ok(ConversionBridge { target_levels, replaces: Vec::new(), rows })
    }

    /// Source levels replaced by the target levels without being matched.
    pub fn replacing<S: Into<String>>(mut self, levels: Vec<S>) -> Self {
        self.replaces = levels.into_iter().map(Into::into).collect();
        self
    }

    pub fn target_levels(&self) -> &[String] {
        &self.target_levels
    }

    pub fn rows(&self) -> &[BridgeRow] {
        &self.rows
    }

    /// Source levels the bridge consumes, in first-mention order.
    fn bridged_levels(&self) -> Vec<String> {
        let named = self.rows.iter().flat_map(|r| r.source.iter().map(|(l, _)| l.clone()));
        unique_in_order(named.chain(self.replaces.iter().cloned()).collect())
    }

    fn subset(&self, positions: &[usize]) -> ConversionBridge {
        ConversionBridge {
            target_levels: self.target_levels.clone(),
            replaces: self.replaces.clone(),
            rows: positions.iter().filter_map(|&p| self.rows.get(p).cloned()).collect(),
        }
    }
}

/// Options for [`Extension::convert`] and [`IOSystem::extension_convert`].
///
/// Fields
/// ------
/// - `target_order`: `Option<Index>`
///   Final row order; rows outside it are dropped.
/// - `fill_missing`: `bool`
///   Zero-fill target rows the conversion did not produce (else error).
/// - `drop_not_bridged_index`: `bool`
///   Sum over source levels the bridge does not consume (default), or
///   carry them into the target key.
/// - `check_units`: `bool`
///   Compare source units with `unit_orig` and reject conflicting target units.
/// - `name`: `Option<String>`
///   Name of the result; defaults to `<name>_converted`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub target_order: Option<Index>,
    pub fill_missing: bool,
    pub drop_not_bridged_index: bool,
    pub check_units: bool,
    pub name: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            target_order: None,
            fill_missing: true,
            drop_not_bridged_index: true,
            check_units: true,
            name: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_target_order(mut self, order: Index, fill_missing: bool) -> Self {
        self.target_order = Some(order);
        self.fill_missing = fill_missing;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Converted extension and what the conversion left behind.
///
/// Fields
/// ------
/// - `extension`: `Extension`
/// - `unbridged_rows`: `Vec<(String, Key)>`
///   `(extension, row)` pairs no bridge row matched.
/// - `unused_bridge_rows`: `Vec<usize>`
///   Positions of bridge rows that matched nothing.
/// - `dropped_rows`: `Vec<Key>`
///   Converted rows outside the target order.
/// - `warnings`: `Vec<String>`
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertReport {
    pub extension: Extension,
    pub unbridged_rows: Vec<(String, Key)>,
    pub unused_bridge_rows: Vec<usize>,
    pub dropped_rows: Vec<Key>,
    pub warnings: Vec<String>,
}

impl ConvertReport {
    fn warn(&mut self, message: String) {
        tracing::warn!(target: "rust_mrio", extension = %self.extension.name(), "{}", message);
        self.warnings.push(message);
    }
}

impl Extension {
    /// Convert the rows of every table through `bridge`.
    ///
    /// Errors
    /// ------
    /// - `SystemError::InvalidBridge` when a bridged level is not a row
    ///   level, a target level clashes with a carried level, or target
    ///   units conflict under `check_units`.
    /// - `SystemError::UnitMismatch` when a source unit differs from `unit_orig`.
    /// - `TableError::MissingKeys` for absent target rows without `fill_missing`.
    pub fn convert(&self, bridge: &ConversionBridge, opts: &ConvertOptions) -> SystemResult<ConvertReport> {
        let rows = self.rows().ok_or_else(|| SystemError::Underdetermined {
            operation: format!("convert of extension {}", self.name),
            missing: vec!["F".to_string()],
        })?;
        let (transfer, unit, matched, used) = self.transfer_matrix(rows, bridge, opts)?;

        let name = opts.name.clone().unwrap_or_else(|| format!("{}_converted", self.name));
        let mut converted = Extension::new(&name);
        for (which, table) in &self.tables {
            converted.set_table(*which, transfer.dot(table)?)?;
        }
        if let Some(unit) = unit {
            converted.set_unit(unit)?;
        }

        let mut report = ConvertReport {
            extension: converted,
            unbridged_rows: Vec::new(),
            unused_bridge_rows: used.iter().enumerate().filter(|(_, u)| !**u).map(|(i, _)| i).collect(),
            dropped_rows: Vec::new(),
            warnings: Vec::new(),
        };
        for (i, key) in rows.keys().iter().enumerate() {
            if !matched[i] {
                report.unbridged_rows.push((self.name.clone(), key.clone()));
            }
        }
        if !report.unbridged_rows.is_empty() {
            let n = report.unbridged_rows.len();
            report.warn(format!("{} rows of extension {} not covered by the bridge and dropped", n, self.name));
        }
        if !report.unused_bridge_rows.is_empty() {
            let n = report.unused_bridge_rows.len();
            report.warn(format!("{} bridge rows matched nothing in extension {}", n, self.name));
        }
        if let Some(order) = &opts.target_order {
            report.apply_target_order(order, opts.fill_missing)?;
        }
        Ok(report)
    }

    /// Reorder rows to `target`: absent rows are zero-filled (or rejected
    /// without `fill_missing`), rows outside `target` are dropped.
    pub fn reorder_rows(&self, target: &Index, fill_missing: bool) -> SystemResult<ConvertReport> {
        let mut report = ConvertReport {
            extension: self.clone(),
            unbridged_rows: Vec::new(),
            unused_bridge_rows: Vec::new(),
            dropped_rows: Vec::new(),
            warnings: Vec::new(),
        };
        report.apply_target_order(target, fill_missing)?;
        Ok(report)
    }

    /// `target × source` conversion matrix, target units, and which source
    /// rows and bridge rows matched.
    #[allow(clippy::type_complexity)]
    fn transfer_matrix(
        &self, rows: &Index, bridge: &ConversionBridge, opts: &ConvertOptions,
    ) -> SystemResult<(Table, Option<Units>, Vec<bool>, Vec<bool>)> {
        let bridged = bridge.bridged_levels();
        for level in &bridged {
            if !rows.has_level(level) {
                return Err(invalid(&format!(
                    "level '{}' is not a row level of extension {}",
                    level, self.name
                )));
            }
        }
        let carried: Vec<usize> = if opts.drop_not_bridged_index {
            Vec::new()
        } else {
            rows.names().iter().enumerate().filter(|(_, n)| !bridged.contains(n)).map(|(i, _)| i).collect()
        };
        let mut names = bridge.target_levels.clone();
        for &c in &carried {
            let level = &rows.names()[c];
            if names.contains(level) {
                return Err(invalid(&format!("target level '{}' clashes with a carried row level", level)));
            }
            names.push(level.clone());
        }

        let mut targets: IndexMap<Key, Vec<(usize, f64)>> = IndexMap::new();
        let mut target_units: IndexMap<Key, Option<String>> = IndexMap::new();
        let mut matched = vec![false; rows.len()];
        let mut used = vec![false; bridge.rows.len()];

        for (b, row) in bridge.rows.iter().enumerate() {
            let mut matchers = Vec::with_capacity(row.source.len());
            for (level, pattern) in &row.source {
                matchers.push((rows.level_position(level)?, LabelMatcher::new(MatchMode::FullMatch, pattern)?));
            }
            for (i, key) in rows.keys().iter().enumerate() {
                if !matchers.iter().all(|(pos, m)| m.is_match(&key[*pos])) {
                    continue;
                }
                matched[i] = true;
                used[b] = true;

                let source_unit = self.unit.as_ref().and_then(|u| u.get(key)).map(str::to_string);
                if opts.check_units {
                    if let (Some(expected), Some(found)) = (&row.unit_orig, &source_unit) {
                        if expected != found {
                            return Err(SystemError::UnitMismatch {
                                row: key.clone(),
                                expected: expected.clone(),
                                found: found.clone(),
                            });
                        }
                    }
                }

                let mut target = row.target.clone();
                target.extend(carried.iter().map(|&c| key[c].clone()));
                let unit = row.unit_new.clone().or(source_unit);
                match target_units.get(&target) {
                    Some(prev) if opts.check_units && unit.is_some() && prev.is_some() && *prev != unit => {
                        return Err(invalid(&format!(
                            "target {:?} receives units {:?} and {:?}",
                            target,
                            prev.as_deref().unwrap_or_default(),
                            unit.as_deref().unwrap_or_default()
                        )));
                    }
                    Some(Some(_)) => {}
                    _ => {
                        target_units.insert(target.clone(), unit);
                    }
                }
                targets.entry(target).or_default().push((i, row.factor));
            }
        }

        let mut data = Array2::<f64>::zeros((targets.len(), rows.len()));
        for (t, contributions) in targets.values().enumerate() {
            for (i, factor) in contributions {
                data[[t, *i]] += factor;
            }
        }
        let target_index = Index::new(names, targets.keys().cloned().collect())?;
        let transfer = Table::new(data, target_index.clone(), rows.clone())?;

        let unit = if target_units.values().any(Option::is_some) {
            let units: Vec<String> = target_index
                .keys()
                .iter()
                .map(|k| target_units.get(k).cloned().flatten().unwrap_or_else(|| NULL_LABEL.to_string()))
                .collect();
            Some(Units::new(target_index, units)?)
        } else {
            None
        };
        Ok((transfer, unit, matched, used))
    }
}

impl ConvertReport {
    fn apply_target_order(&mut self, order: &Index, fill_missing: bool) -> SystemResult<()> {
        let fill = if fill_missing { FillPolicy::Value(0.0) } else { FillPolicy::Fail };
        if let Some(rows) = self.extension.rows() {
            order.ensure_names(rows.names())?;
            self.dropped_rows = rows.keys().iter().filter(|k| !order.contains(k)).cloned().collect();
        }
        let mut tables = self.extension.tables.clone();
        for table in tables.values_mut() {
            *table = table.reindex_rows(order, fill)?;
        }
        let unit = match &self.extension.unit {
            Some(u) => Some(u.reindex(order, Some(NULL_LABEL))?),
            None => None,
        };
        self.extension.tables = tables;
        self.extension.unit = unit;
        if !self.dropped_rows.is_empty() {
            let n = self.dropped_rows.len();
            self.warn(format!("{} rows outside the target order dropped", n));
        }
        Ok(())
    }
}

impl IOSystem {
    /// Convert all extensions the bridge applies to and sum the results
    /// into one extension.
    ///
    /// Bridge rows naming an extension apply to it alone; rows without an
    /// extension apply to every extension carrying all their source levels.
    /// Target rows produced by several extensions are summed.
    ///
    /// Errors
    /// ------
    /// - `SystemError::UnknownExtension` when a bridge row names an absent extension.
    /// - `SystemError::Underdetermined` when the bridge applies to no extension.
    /// - Errors of [`Extension::convert`].
    pub fn extension_convert(
        &self, bridge: &ConversionBridge, opts: &ConvertOptions,
    ) -> SystemResult<ConvertReport> {
        for row in &bridge.rows {
            if let Some(name) = &row.extension {
                if !self.extensions.contains_key(name) {
                    return Err(SystemError::UnknownExtension { name: name.clone() });
                }
            }
        }

        let per_extension = ConvertOptions { target_order: None, name: None, ..opts.clone() };
        let mut converted: Vec<Extension> = Vec::new();
        let mut unbridged = Vec::new();
        let mut warnings = Vec::new();
        let mut used = vec![false; bridge.rows.len()];
        for ext in self.extensions.values() {
            let Some(rows) = ext.rows() else { continue };
            let applicable: Vec<usize> = (0..bridge.rows.len())
                .filter(|&b| match &bridge.rows[b].extension {
                    Some(name) => name == &ext.name,
                    None => bridge.rows[b].source.iter().all(|(level, _)| rows.has_level(level)),
                })
                .collect();
            if applicable.is_empty() {
                continue;
            }
            let sub = bridge.subset(&applicable);
            let report = ext.convert(&sub, &per_extension)?;
            for (j, b) in applicable.iter().enumerate() {
                used[*b] = used[*b] || !report.unused_bridge_rows.contains(&j);
            }
            unbridged.extend(report.unbridged_rows);
            warnings.extend(report.warnings);
            converted.push(report.extension);
        }
        if converted.is_empty() {
            return Err(SystemError::Underdetermined {
                operation: "extension_convert".to_string(),
                missing: vec!["extension matching the bridge".to_string()],
            });
        }

        let name = opts.name.clone().unwrap_or_else(|| "converted".to_string());
        let refs: Vec<&Extension> = converted.iter().collect();
        let mut merged = extension_concate(&refs, &name)?;
        for table in merged.tables.values_mut() {
            *table = table.sum_duplicates();
        }
        if let Some(unit) = &merged.unit {
            if opts.check_units {
                let (_, groups) = unit.index().group_duplicates();
                let mut first: IndexMap<usize, &str> = IndexMap::new();
                for (pos, g) in groups.iter().enumerate() {
                    let u = unit.units()[pos].as_str();
                    match first.get(g) {
                        Some(prev) if *prev != u && *prev != NULL_LABEL && u != NULL_LABEL => {
                            return Err(invalid(&format!(
                                "row {:?} converted to units {} and {}",
                                unit.index().keys()[pos],
                                prev,
                                u
                            )));
                        }
                        Some(_) => {}
                        None => {
                            first.insert(*g, u);
                        }
                    }
                }
            }
            merged.unit = Some(unit.dedup());
        }

        let mut report = ConvertReport {
            extension: merged,
            unbridged_rows: unbridged,
            unused_bridge_rows: used.iter().enumerate().filter(|(_, u)| !**u).map(|(i, _)| i).collect(),
            dropped_rows: Vec::new(),
            warnings,
        };
        if let Some(order) = &opts.target_order {
            report.apply_target_order(order, opts.fill_missing)?;
        }
        tracing::info!(
            target: "rust_mrio",
            extension = %name,
            inputs = converted.len(),
            rows = report.extension.rows().map(|r| r.len()).unwrap_or(0),
            "extensions converted"
        );
        Ok(report)
    }
}

// ---- Helper methods ----

fn invalid(reason: &str) -> SystemError {
    SystemError::InvalidBridge { reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::ExtensionTable;
    use crate::table::{CATEGORY, IMPACT, REGION, SECTOR, STRESSOR};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Weighted many-to-many conversion with regex source patterns.
    // - Unit checks, carried levels and target ordering.
    // - Conversion across several extensions of a system.
    // -------------------------------------------------------------------------

    fn core() -> Index {
        Index::product(&[REGION, SECTOR], &[vec!["R1".into()], vec!["a".into(), "b".into()]]).unwrap()
    }

    fn emissions() -> Extension {
        let rows = Index::new(
            vec![STRESSOR, "compartment"],
            vec![
                vec!["co2".into(), "air".into()],
                vec!["ch4".into(), "air".into()],
                vec!["ch4".into(), "water".into()],
                vec!["n2o".into(), "air".into()],
            ],
        )
        .unwrap();
        let f = Table::new(array![[1.0, 2.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]], rows.clone(), core()).unwrap();
        let unit = Units::new(rows, vec!["kg", "kg", "kg", "g"]).unwrap();
        Extension::from_flows("emissions", f, None, Some(unit)).unwrap()
    }

    fn gwp_bridge() -> ConversionBridge {
        ConversionBridge::new(
            vec![IMPACT],
            vec![
                BridgeRow::new(vec![(STRESSOR, "co2"), ("compartment", "air")], vec!["gwp"], 1.0)
                    .with_units("kg", "kg co2eq"),
                BridgeRow::new(vec![(STRESSOR, "ch4"), ("compartment", ".*")], vec!["gwp"], 28.0)
                    .with_units("kg", "kg co2eq"),
                BridgeRow::new(vec![(STRESSOR, "co2|ch4")], vec!["carbon"], 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Targets are factor-weighted sums over all matching source rows.
    //
    // Given
    // -----
    // - co2 (air), ch4 (air, water), n2o (air) and a GWP / carbon bridge.
    //
    // Expect
    // ------
    // - gwp = co2 + 28·ch4; carbon = co2 + ch4; n2o reported unbridged.
    fn convert_sums_weighted_matches() {
        let report = emissions().convert(&gwp_bridge(), &ConvertOptions::default()).unwrap();
        let f = report.extension.f().unwrap();
        assert_eq!(f.rows().keys(), &[vec!["gwp".to_string()], vec!["carbon".to_string()]]);
        assert_eq!(f.data(), &array![[29.0, 30.0], [2.0, 3.0]]);
        assert_eq!(report.extension.name(), "emissions_converted");
        assert_eq!(
            report.extension.unit().unwrap().units(),
            &["kg co2eq".to_string(), "kg".to_string()]
        );
        assert_eq!(report.unbridged_rows.len(), 1);
        assert_eq!(report.unbridged_rows[0].1, vec!["n2o".to_string(), "air".to_string()]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Unit checks and bridge validation reject inconsistent input.
    fn convert_checks_units_and_levels() {
        let wrong_unit = ConversionBridge::new(
            vec![IMPACT],
            vec![BridgeRow::new(vec![(STRESSOR, "n2o")], vec!["gwp"], 265.0).with_units("kg", "kg co2eq")],
        )
        .unwrap();
        let err = emissions().convert(&wrong_unit, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, SystemError::UnitMismatch { .. }));

        let unchecked = ConvertOptions { check_units: false, ..ConvertOptions::default() };
        assert!(emissions().convert(&wrong_unit, &unchecked).is_ok());

        let bad_level =
            ConversionBridge::new(vec![IMPACT], vec![BridgeRow::new(vec![("medium", "air")], vec!["x"], 1.0)]).unwrap();
        let err = emissions().convert(&bad_level, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, SystemError::InvalidBridge { .. }));

        assert!(ConversionBridge::new(vec![IMPACT], vec![BridgeRow::new(vec![], vec!["x"], 1.0)]).is_err());
        assert!(ConversionBridge::new(vec![IMPACT], vec![BridgeRow::new(vec![(STRESSOR, "(")], vec!["x"], 1.0)])
            .is_err());
    }

    #[test]
    // Purpose
    // -------
    // Unbridged levels can be carried, and a target order fixes the rows.
    //
    // Expect
    // ------
    // - Carrying `compartment` splits ch4 into (ch4_total, air) and
    //   (ch4_total, water).
    // - Target order with an extra row zero-fills it; without fill it fails.
    fn convert_carries_levels_and_orders_rows() {
        let bridge = ConversionBridge::new(
            vec!["gas"],
            vec![BridgeRow::new(vec![(STRESSOR, "ch4")], vec!["ch4_total"], 1.0)],
        )
        .unwrap();
        let carry = ConvertOptions { drop_not_bridged_index: false, ..ConvertOptions::default() };
        let report = emissions().convert(&bridge, &carry).unwrap();
        let f = report.extension.f().unwrap();
        assert_eq!(f.rows().names(), &["gas".to_string(), "compartment".to_string()]);
        assert_eq!(f.data(), &array![[1.0, 0.0], [0.0, 1.0]]);

        let order = Index::single(IMPACT, ["carbon", "acid", "gwp"]);
        let ordered = emissions()
            .convert(&gwp_bridge(), &ConvertOptions::default().with_target_order(order.clone(), true))
            .unwrap();
        assert_eq!(ordered.extension.f().unwrap().data(), &array![[2.0, 3.0], [0.0, 0.0], [29.0, 30.0]]);
        assert_eq!(ordered.extension.unit().unwrap().get(&["acid".to_string()]), Some(NULL_LABEL));

        let strict = ConvertOptions::default().with_target_order(order, false);
        assert!(emissions().convert(&gwp_bridge(), &strict).is_err());

        let reordered = emissions().reorder_rows(&Index::new(
            vec![STRESSOR, "compartment"],
            vec![vec!["n2o".into(), "air".into()]],
        )
        .unwrap(), false)
        .unwrap();
        assert_eq!(reordered.extension.f().unwrap().data(), &array![[5.0, 5.0]]);
        assert_eq!(reordered.dropped_rows.len(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Conversion across extensions sums targets produced by several sources.
    //
    // Given
    // -----
    // - "emissions" (stressor × compartment) and "fuel" (stressor) both
    //   contributing to gwp, plus F_Y only on "fuel".
    //
    // Expect
    // ------
    // - One gwp row with the sum of both conversions; F_Y kept with zeros
    //   from "emissions".
    fn extension_convert_sums_across_extensions() {
        let rc = Index::product(&[REGION, CATEGORY], &[vec!["R1".into()], vec!["hh".into()]]).unwrap();
        let z = Table::new(array![[1.0, 1.0], [1.0, 1.0]], core(), core()).unwrap();
        let y = Table::new(array![[1.0], [1.0]], core(), rc.clone()).unwrap();
        let mut sys = IOSystem::from_flows("conv", z, y).unwrap();
        sys.add_extension(emissions()).unwrap();
        let fuel_rows = Index::single(STRESSOR, ["co2_fuel"]);
        let fuel = Extension::from_flows(
            "fuel",
            Table::new(array![[10.0, 20.0]], fuel_rows.clone(), core()).unwrap(),
            Some(Table::new(array![[3.0]], fuel_rows, rc).unwrap()),
            None,
        )
        .unwrap();
        sys.add_extension(fuel).unwrap();

        let bridge = ConversionBridge::new(
            vec![IMPACT],
            vec![
                BridgeRow::new(vec![(STRESSOR, "co2"), ("compartment", "air")], vec!["gwp"], 1.0)
                    .for_extension("emissions"),
                BridgeRow::new(vec![(STRESSOR, "co2_fuel")], vec!["gwp"], 1.0),
            ],
        )
        .unwrap();
        let report = sys.extension_convert(&bridge, &ConvertOptions::default().with_name("gwp")).unwrap();
        let ext = &report.extension;
        assert_eq!(ext.name(), "gwp");
        assert_eq!(ext.f().unwrap().data(), &array![[11.0, 22.0]]);
        assert_eq!(ext.f_y().unwrap().data(), &array![[3.0]]);
        assert_eq!(ext.present_tables(), vec![ExtensionTable::F, ExtensionTable::FY]);
        assert!(report.unused_bridge_rows.is_empty());

        let unknown = ConversionBridge::new(
            vec![IMPACT],
            vec![BridgeRow::new(vec![(STRESSOR, "x")], vec!["y"], 1.0).for_extension("nope")],
        )
        .unwrap();
        assert!(matches!(
            sys.extension_convert(&unknown, &ConvertOptions::default()),
            Err(SystemError::UnknownExtension { .. })
        ));
    }
}
