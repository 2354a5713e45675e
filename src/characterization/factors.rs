//! characterization::factors — long-format characterization factors.
//!
//! A [`CharacterizationTable`] lists one factor per row: which stressor
//! (by the labels of every row level of the extension) contributes to
//! which impact, optionally restricted to a region and/or sector and to
//! one extension. [`FactorLookup`] indexes the rows of one impact and
//! stressor by specificity and resolves the factor for a cell according
//! to a [`FactorPrecedence`].
use crate::system::errors::{SystemError, SystemResult};
use crate::table::Key;
use std::collections::HashMap;

/// One characterization factor.
///
/// Fields
/// ------
/// - `extension`: `Option<String>`
///   Extension the factor applies to; `None` applies to all.
/// - `stressor`: `Vec<(String, String)>`
///   `(level, label)` for every row level of the extension.
/// - `region` / `sector`: `Option<String>`
///   Restrict the factor to cells of this region and/or sector.
/// - `impact`, `impact_unit`: `String`
/// - `stressor_unit`: `Option<String>`
///   Expected unit of the stressor, checked against the extension.
/// - `factor`: `f64`
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterizationFactor {
    pub extension: Option<String>,
    pub stressor: Vec<(String, String)>,
    pub region: Option<String>,
    pub sector: Option<String>,
    pub impact: String,
    pub impact_unit: String,
    pub stressor_unit: Option<String>,
    pub factor: f64,
}

impl CharacterizationFactor {
    pub fn new(stressor: Vec<(&str, &str)>, impact: &str, impact_unit: &str, factor: f64) -> Self {
        CharacterizationFactor {
            extension: None,
            stressor: stressor.into_iter().map(|(l, s)| (l.to_string(), s.to_string())).collect(),
            region: None,
            sector: None,
            impact: impact.to_string(),
            impact_unit: impact_unit.to_string(),
            stressor_unit: None,
            factor,
        }
    }

    pub fn in_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn in_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    pub fn with_stressor_unit(mut self, unit: &str) -> Self {
        self.stressor_unit = Some(unit.to_string());
        self
    }

    pub fn for_extension(mut self, name: &str) -> Self {
        self.extension = Some(name.to_string());
        self
    }

    /// Stressor labels in the order of `levels`, if every level is named.
    pub fn stressor_key(&self, levels: &[String]) -> Option<Key> {
        levels
            .iter()
            .map(|level| self.stressor.iter().find(|(l, _)| l == level).map(|(_, s)| s.clone()))
            .collect()
    }

    pub fn applies_to(&self, extension: &str) -> bool {
        self.extension.as_deref().map(|e| e == extension).unwrap_or(true)
    }
}

/// Ordered list of characterization factors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterizationTable {
    factors: Vec<CharacterizationFactor>,
}

impl CharacterizationTable {
    /// Errors
    /// ------
    /// - `SystemError::InvalidCharacterization` for a factor without
    ///   stressor labels or with a non-finite value.
    pub fn new(factors: Vec<CharacterizationFactor>) -> SystemResult<Self> {
        for (i, f) in factors.iter().enumerate() {
            if f.stressor.is_empty() {
                return Err(SystemError::InvalidCharacterization {
                    reason: format!("factor {} names no stressor", i),
                });
            }
            if !f.factor.is_finite() {
                return Err(SystemError::InvalidCharacterization {
                    reason: format!("factor {} is not finite", i),
                });
            }
        }
        Ok(CharacterizationTable { factors })
    }

    pub fn factors(&self) -> &[CharacterizationFactor] {
        &self.factors
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Impacts in order of first appearance.
    pub fn impacts(&self) -> Vec<String> {
        crate::table::index::unique_in_order(self.factors.iter().map(|f| f.impact.clone()).collect())
    }

    /// Factors that apply to the extension `name`.
    pub fn for_extension(&self, name: &str) -> CharacterizationTable {
        CharacterizationTable { factors: self.factors.iter().filter(|f| f.applies_to(name)).cloned().collect() }
    }
}

/// Choice between a region-only and a sector-only factor for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactorPrecedence {
    /// Both applying is an `AmbiguousCharacterization` error.
    #[default]
    Strict,
    PreferRegion,
    PreferSector,
}

/// Factors of one (stressor, impact) pair, by specificity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorLookup {
    pub global: Option<f64>,
    pub by_region: HashMap<String, f64>,
    pub by_sector: HashMap<String, f64>,
    pub by_cell: HashMap<(String, String), f64>,
}

impl FactorLookup {
    /// Register one factor; a second factor with the same scope is an error.
    pub fn insert(&mut self, f: &CharacterizationFactor) -> SystemResult<()> {
        let duplicate = match (&f.region, &f.sector) {
            (Some(r), Some(s)) => self.by_cell.insert((r.clone(), s.clone()), f.factor).is_some(),
            (Some(r), None) => self.by_region.insert(r.clone(), f.factor).is_some(),
            (None, Some(s)) => self.by_sector.insert(s.clone(), f.factor).is_some(),
            (None, None) => self.global.replace(f.factor).is_some(),
        };
        if duplicate {
            return Err(SystemError::InvalidCharacterization {
                reason: format!(
                    "impact '{}' defined twice for stressor {:?} (region {:?}, sector {:?})",
                    f.impact, f.stressor, f.region, f.sector
                ),
            });
        }
        Ok(())
    }

    /// Factor for a `(region, sector)` cell, `None` when nothing applies.
    ///
    /// Errors
    /// ------
    /// - `SystemError::AmbiguousCharacterization` under `Strict` when a
    ///   region-only and a sector-only factor both apply.
    pub fn for_cell(
        &self, region: &str, sector: &str, precedence: FactorPrecedence, stressor: &Key, impact: &str,
    ) -> SystemResult<Option<f64>> {
        if let Some(v) = self.by_cell.get(&(region.to_string(), sector.to_string())) {
            return Ok(Some(*v));
        }
        match (self.by_region.get(region), self.by_sector.get(sector)) {
            (Some(r), Some(s)) => match precedence {
                FactorPrecedence::PreferRegion => Ok(Some(*r)),
                FactorPrecedence::PreferSector => Ok(Some(*s)),
                FactorPrecedence::Strict => Err(SystemError::AmbiguousCharacterization {
                    stressor: stressor.clone(),
                    impact: impact.to_string(),
                    region: region.to_string(),
                    sector: sector.to_string(),
                }),
            },
            (Some(r), None) => Ok(Some(*r)),
            (None, Some(s)) => Ok(Some(*s)),
            (None, None) => Ok(self.global),
        }
    }

    /// Factor for a final-demand column of `region`; sector factors do not apply.
    pub fn for_final_demand(&self, region: &str) -> Option<f64> {
        self.by_region.get(region).copied().or(self.global)
    }
}
