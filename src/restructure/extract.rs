//! restructure::extract — row subsets of extensions.
//!
//! Purpose
//! -------
//! Pull the rows matched by a [`RowSelector`] out of every table of an
//! extension, either as a bundle of tables or as a new standalone
//! [`Extension`]. The system-level variant applies one selector to all
//! extensions and can merge the hits into a single extension.
//!
//! Conventions
//! -----------
//! - Extracted rows keep their index order; units follow the rows.
//! - At system level an explicit key absent from an extension simply does
//!   not match there; for a single extension it is an error.
use crate::restructure::concat::extension_concate;
use crate::system::{
    errors::SystemResult, extension::Extension, iosystem::IOSystem, tables::ExtensionTable, units::Units,
};
use crate::table::{Index, RowSelector, Table};
use indexmap::IndexMap;

/// Which tables to extract and whether empty hits are kept.
///
/// Fields
/// ------
/// - `tables`: `Option<Vec<ExtensionTable>>`
///   Restrict the extraction to these tables; `None` takes all present ones.
/// - `include_empty`: `bool`
///   At system level, also return extensions where nothing matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    pub tables: Option<Vec<ExtensionTable>>,
    pub include_empty: bool,
}

impl ExtractOptions {
    pub fn new(tables: Option<Vec<ExtensionTable>>, include_empty: bool) -> Self {
        ExtractOptions { tables, include_empty }
    }
}

/// Result shape of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractReturn {
    /// Plain tables per extension.
    Tables,
    /// A new extension per source extension, named `<name>_extracted`.
    Extensions,
    /// All hits concatenated into one extension with the given name.
    Merged(String),
}

/// Rows extracted from one extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractResult {
    Tables {
        tables: IndexMap<ExtensionTable, Table>,
        unit: Option<Units>,
    },
    Extension(Extension),
}

impl ExtractResult {
    /// Number of extracted rows.
    pub fn nrows(&self) -> usize {
        match self {
            ExtractResult::Tables { tables, unit } => tables
                .values()
                .next()
                .map(|t| t.nrows())
                .or_else(|| unit.as_ref().map(|u| u.len()))
                .unwrap_or(0),
            ExtractResult::Extension(ext) => ext.rows().map(|r| r.len()).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    pub fn into_extension(self) -> Option<Extension> {
        match self {
            ExtractResult::Extension(ext) => Some(ext),
            ExtractResult::Tables { .. } => None,
        }
    }
}

/// Extraction across all extensions of a system.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemExtract {
    PerExtension(IndexMap<String, ExtractResult>),
    Merged(Extension),
}

impl Extension {
    /// Rows matched by `selector` in the tables chosen by `opts`.
    ///
    /// With `as_extension` the result is a new extension of that name,
    /// otherwise a bundle of tables.
    ///
    /// Errors
    /// ------
    /// - `TableError::MissingKeys` when an explicit key is not a row.
    /// - `TableError::InvalidPattern` for a malformed regex.
    pub fn extract(
        &self, selector: &RowSelector, opts: &ExtractOptions, as_extension: Option<&str>,
    ) -> SystemResult<ExtractResult> {
        let positions = match self.rows() {
            Some(rows) => selector.select(rows)?,
            None => Vec::new(),
        };
        self.extract_positions(&positions, opts, as_extension)
    }

    fn extract_positions(
        &self, positions: &[usize], opts: &ExtractOptions, as_extension: Option<&str>,
    ) -> SystemResult<ExtractResult> {
        let wanted = |t: &ExtensionTable| opts.tables.as_ref().map(|w| w.contains(t)).unwrap_or(true);

        let mut tables = IndexMap::new();
        for (which, table) in self.tables.iter().filter(|(t, _)| wanted(t)) {
            tables.insert(*which, table.select_rows(positions));
        }
        let unit = self.unit.as_ref().map(|u| {
            let rows = self.rows().map(|r| r.select(positions)).unwrap_or_else(|| u.index().select(positions));
            u.reindex(&rows, None).unwrap_or_else(|_| u.select(positions))
        });

        match as_extension {
            None => Ok(ExtractResult::Tables { tables, unit }),
            Some(name) => {
                let mut ext = Extension::new(name);
                for (which, table) in tables {
                    ext.set_table(which, table)?;
                }
                if let Some(unit) = unit {
                    ext.set_unit(unit)?;
                }
                Ok(ExtractResult::Extension(ext))
            }
        }
    }
}

impl IOSystem {
    /// Apply `selector` to every extension.
    ///
    /// Extensions without a match are skipped unless `opts.include_empty`.
    /// `ExtractReturn::Merged` concatenates the extracted extensions, with
    /// row levels harmonized as in [`extension_concate`].
    ///
    /// Errors
    /// ------
    /// - `TableError::InvalidPattern` for a malformed regex.
    /// - `SystemError::Underdetermined` when a merge finds nothing to merge.
    pub fn extension_extract(
        &self, selector: &RowSelector, opts: &ExtractOptions, ret: &ExtractReturn,
    ) -> SystemResult<SystemExtract> {
        let mut found: IndexMap<String, ExtractResult> = IndexMap::new();
        for ext in self.extensions.values() {
            let positions = match ext.rows() {
                Some(rows) => lenient_select(selector, rows)?,
                None => Vec::new(),
            };
            if positions.is_empty() && !opts.include_empty {
                continue;
            }
            let as_extension = match ret {
                ExtractReturn::Tables => None,
                ExtractReturn::Extensions | ExtractReturn::Merged(_) => Some(format!("{}_extracted", ext.name)),
            };
            found.insert(ext.name.clone(), ext.extract_positions(&positions, opts, as_extension.as_deref())?);
        }
        tracing::debug!(target: "rust_mrio", matched = found.len(), "extension_extract");

        match ret {
            ExtractReturn::Merged(name) => {
                let extensions: Vec<Extension> = found.into_values().filter_map(|r| r.into_extension()).collect();
                let refs: Vec<&Extension> = extensions.iter().collect();
                Ok(SystemExtract::Merged(extension_concate(&refs, name)?))
            }
            _ => Ok(SystemExtract::PerExtension(found)),
        }
    }
}

/// Like [`RowSelector::select`], but absent explicit keys do not match.
fn lenient_select(selector: &RowSelector, rows: &Index) -> SystemResult<Vec<usize>> {
    match selector {
        RowSelector::Keys(keys) => Ok(keys.iter().filter_map(|k| rows.position(k)).collect()),
        _ => Ok(selector.select(rows)?),
    }
}
