//! characterization::engine — stressors to impacts.
//!
//! Purpose
//! -------
//! Turn an extension's stressor rows into impact rows: every output value
//! is `Σ factor · stressor` over the stressor rows a factor covers, with
//! the factor chosen per cell by specificity (region and sector, then
//! region or sector, then global).
//!
//! Key behaviors
//! -------------
//! - `F`, `F_Y`, `S` and `S_Y` are characterized when present. Other
//!   derived tables are not carried; recalculate them on the system.
//! - On final-demand tables only global and region factors apply, the
//!   region being the consuming region of the column.
//! - Output rows follow the first appearance of impacts in the table.
//!   Impacts without any matching stressor are dropped, or kept as zero
//!   rows with `zero_fill_missing`.
//! - A fatal validation finding returns the report without an extension.
//!
//! Downstream usage
//! ----------------
//! - `IOSystem::extension_characterize` characterizes every extension a
//!   factor applies to and sums rows of the same impact into one result.
use crate::characterization::{
    factors::{CharacterizationTable, FactorLookup, FactorPrecedence},
    validation::{impact_unit_conflicts, CharacterizationValidation},
};
use crate::restructure::concat::extension_concate;
use crate::system::{
    errors::{SystemError, SystemResult},
    extension::Extension,
    iosystem::IOSystem,
    tables::ExtensionTable,
    units::Units,
};
use crate::table::{FillPolicy, Index, Key, Table, IMPACT, REGION, SECTOR};
use indexmap::IndexMap;
use ndarray::Array2;

/// Options for a characterization run.
///
/// Fields
/// ------
/// - `precedence`: `FactorPrecedence`
///   Resolution of region-only versus sector-only factors for one cell.
/// - `only_validation`: `bool`
///   Return the validation report without computing.
/// - `zero_fill_missing`: `bool`
///   Keep impacts with no matching stressor as zero rows.
/// - `name`: `Option<String>`
///   Name of the result; defaults to `<name>_characterized` for one
///   extension and `impacts` across a system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterizationOptions {
    pub precedence: FactorPrecedence,
    pub only_validation: bool,
    pub zero_fill_missing: bool,
    pub name: Option<String>,
}

impl CharacterizationOptions {
    pub fn new(precedence: FactorPrecedence) -> Self {
        CharacterizationOptions { precedence, ..Default::default() }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Validation report and, unless validation failed or was all that was
/// asked for, the characterized extension.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterizationOutcome {
    pub validation: CharacterizationValidation,
    pub extension: Option<Extension>,
}

const CHARACTERIZED: [ExtensionTable; 4] =
    [ExtensionTable::F, ExtensionTable::FY, ExtensionTable::S, ExtensionTable::SY];

impl Extension {
    /// Characterize with every factor of `table`.
    ///
    /// Errors
    /// ------
    /// - `SystemError::InvalidCharacterization` when a factor does not name
    ///   exactly the row levels of the extension, or scopes repeat.
    /// - `SystemError::AmbiguousCharacterization` under `FactorPrecedence::Strict`.
    /// - `SystemError::Underdetermined` when the extension has no tables.
    pub fn characterize(
        &self, table: &CharacterizationTable, opts: &CharacterizationOptions,
    ) -> SystemResult<CharacterizationOutcome> {
        let rows = self.rows().ok_or_else(|| SystemError::Underdetermined {
            operation: format!("characterize of extension {}", self.name),
            missing: vec![ExtensionTable::F.to_string()],
        })?;
        let levels = rows.names().to_vec();
        for f in table.factors() {
            if !names_levels(&f.stressor, &levels) {
                return Err(SystemError::InvalidCharacterization {
                    reason: format!(
                        "factor for '{}' names levels {:?}, extension {} has {:?}",
                        f.impact,
                        f.stressor.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>(),
                        self.name,
                        levels
                    ),
                });
            }
        }

        let validation = CharacterizationValidation::check(table, self);
        for message in validation.messages() {
            tracing::warn!(target: "rust_mrio", extension = %self.name, "{}", message);
        }
        if opts.only_validation || validation.is_fatal() {
            return Ok(CharacterizationOutcome { validation, extension: None });
        }

        let lookups = build_lookups(table, &levels)?;
        let impacts: Vec<&String> = lookups
            .iter()
            .filter(|(_, by_stressor)| opts.zero_fill_missing || by_stressor.keys().any(|k| rows.contains(k)))
            .map(|(impact, _)| impact)
            .collect();
        let impact_index = Index::single(IMPACT, impacts.iter().map(|s| s.to_string()));

        let name = opts.name.clone().unwrap_or_else(|| format!("{}_characterized", self.name));
        let mut out = Extension::new(&name);
        for which in CHARACTERIZED {
            let Some(source) = self.table(which) else { continue };
            let mut data = Array2::<f64>::zeros((impacts.len(), source.ncols()));
            for (i, impact) in impacts.iter().enumerate() {
                let by_stressor = &lookups[*impact];
                characterize_row(source, which, impact, by_stressor, opts.precedence, &mut data, i)?;
            }
            out.set_table(which, Table::new(data, impact_index.clone(), source.cols().clone())?)?;
        }

        let units: Vec<String> = impacts
            .iter()
            .map(|impact| {
                table
                    .factors()
                    .iter()
                    .find(|f| &&f.impact == impact)
                    .map(|f| f.impact_unit.clone())
                    .unwrap_or_default()
            })
            .collect();
        out.set_unit(Units::new(impact_index, units)?)?;

        tracing::info!(
            target: "rust_mrio",
            extension = %self.name,
            result = %name,
            impacts = impacts.len(),
            "extension characterized"
        );
        Ok(CharacterizationOutcome { validation, extension: Some(out) })
    }
}

impl IOSystem {
    /// Characterize all extensions the table applies to into one extension.
    ///
    /// A factor naming an extension applies to it alone; a factor without
    /// one applies to every extension whose row levels it names. Impact
    /// rows from several extensions are summed.
    ///
    /// Errors
    /// ------
    /// - `SystemError::UnknownExtension` when a factor names an absent extension.
    /// - `SystemError::Underdetermined` when no factor applies anywhere.
    /// - Errors of [`Extension::characterize`].
    pub fn extension_characterize(
        &self, table: &CharacterizationTable, opts: &CharacterizationOptions,
    ) -> SystemResult<CharacterizationOutcome> {
        for f in table.factors() {
            if let Some(name) = &f.extension {
                if !self.extensions.contains_key(name) {
                    return Err(SystemError::UnknownExtension { name: name.clone() });
                }
            }
        }

        let per_extension = CharacterizationOptions { name: None, ..opts.clone() };
        let mut validation: Option<CharacterizationValidation> = None;
        let mut results: Vec<Extension> = Vec::new();
        for ext in self.extensions.values() {
            let Some(rows) = ext.rows() else { continue };
            let levels = rows.names().to_vec();
            let applicable: Vec<_> = table
                .factors()
                .iter()
                .filter(|f| match &f.extension {
                    Some(name) => name == &ext.name,
                    None => names_levels(&f.stressor, &levels),
                })
                .cloned()
                .collect();
            if applicable.is_empty() {
                continue;
            }
            let outcome = ext.characterize(&CharacterizationTable::new(applicable)?, &per_extension)?;
            match &mut validation {
                Some(v) => v.merge(outcome.validation),
                None => validation = Some(outcome.validation),
            }
            if let Some(result) = outcome.extension {
                results.push(result);
            }
        }

        let Some(mut validation) = validation else {
            return Err(SystemError::Underdetermined {
                operation: "extension_characterize".to_string(),
                missing: vec!["extension matching the characterization table".to_string()],
            });
        };
        validation.impact_unit_conflicts = impact_unit_conflicts(table);
        if opts.only_validation || validation.is_fatal() {
            return Ok(CharacterizationOutcome { validation, extension: None });
        }

        let name = opts.name.clone().unwrap_or_else(|| "impacts".to_string());
        let refs: Vec<&Extension> = results.iter().collect();
        let mut merged = extension_concate(&refs, &name)?;
        let order: Vec<String> = {
            let present = merged.rows().map(|r| r.keys().to_vec()).unwrap_or_default();
            table.impacts().into_iter().filter(|i| present.contains(&vec![i.clone()])).collect()
        };
        let order = Index::single(IMPACT, order);
        for t in merged.tables.values_mut() {
            *t = t.sum_duplicates().reindex_rows(&order, FillPolicy::Fail)?;
        }
        if let Some(unit) = &merged.unit {
            merged.unit = Some(unit.dedup().reindex(&order, None)?);
        }

        tracing::info!(
            target: "rust_mrio",
            result = %name,
            extensions = results.len(),
            impacts = order.len(),
            "extensions characterized"
        );
        Ok(CharacterizationOutcome { validation, extension: Some(merged) })
    }
}

// ---- Helper methods ----

/// True when `stressor` names exactly the levels `levels`.
fn names_levels(stressor: &[(String, String)], levels: &[String]) -> bool {
    stressor.len() == levels.len() && levels.iter().all(|l| stressor.iter().any(|(s, _)| s == l))
}

/// Factors per impact (first-appearance order) and stressor key.
fn build_lookups(
    table: &CharacterizationTable, levels: &[String],
) -> SystemResult<IndexMap<String, IndexMap<Key, FactorLookup>>> {
    let mut lookups: IndexMap<String, IndexMap<Key, FactorLookup>> = IndexMap::new();
    for f in table.factors() {
        let Some(key) = f.stressor_key(levels) else { continue };
        lookups.entry(f.impact.clone()).or_default().entry(key).or_default().insert(f)?;
    }
    Ok(lookups)
}

/// Fill row `i` of `out` with one impact of `source`.
fn characterize_row(
    source: &Table, which: ExtensionTable, impact: &str, by_stressor: &IndexMap<Key, FactorLookup>,
    precedence: FactorPrecedence, out: &mut Array2<f64>, i: usize,
) -> SystemResult<()> {
    let final_demand = which.is_final_demand();
    let regions = source.cols().level_values(REGION)?;
    let sectors = if final_demand { Vec::new() } else { source.cols().level_values(SECTOR)? };

    for (key, lookup) in by_stressor {
        let Some(p) = source.rows().position(key) else { continue };
        let values = source.data().row(p);
        let scoped = !(lookup.by_region.is_empty() && lookup.by_sector.is_empty() && lookup.by_cell.is_empty());
        if !scoped {
            if let Some(g) = lookup.global {
                out.row_mut(i).scaled_add(g, &values);
            }
            continue;
        }
        for (j, v) in values.iter().enumerate() {
            let factor = if final_demand {
                lookup.for_final_demand(&regions[j])
            } else {
                lookup.for_cell(&regions[j], &sectors[j], precedence, key, impact)?
            };
            if let Some(factor) = factor {
                out[[i, j]] += factor * v;
            }
        }
    }
    Ok(())
}
