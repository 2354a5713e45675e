//! restructure::concat — stacking extensions into one.
//!
//! Rows of all inputs are appended in input order. Row levels are
//! harmonized first: when the leading level names disagree, the leading
//! level of every input is renamed to [`INDICATOR`]; then every input is
//! conformed to the union of level names, absent levels filled with
//! [`NULL_LABEL`]. Only tables present in all inputs are kept, except
//! `F_Y`, which is zero-filled for inputs that lack it.
//!
//! Duplicate rows are kept as they are; merge them with a subsequent
//! `aggregate_duplicates` on the owning system if needed.
use crate::system::{
    errors::{SystemError, SystemResult},
    extension::Extension,
    tables::ExtensionTable,
    units::Units,
};
use crate::table::{index::unique_in_order, FillPolicy, Index, Table, INDICATOR, NULL_LABEL};

/// Concatenate the rows of `extensions` into a new extension `name`.
///
/// Errors
/// ------
/// - `SystemError::Underdetermined` when no extension is given or one has
///   no tables.
/// - `TableError::MissingKeys` when the column axes of a table differ
///   between inputs.
pub fn extension_concate(extensions: &[&Extension], name: &str) -> SystemResult<Extension> {
    let underdetermined = |missing: &str| SystemError::Underdetermined {
        operation: "extension_concate".to_string(),
        missing: vec![missing.to_string()],
    };
    if extensions.is_empty() {
        return Err(underdetermined("extensions"));
    }
    let mut rows: Vec<Index> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        match ext.rows() {
            Some(r) if !ext.tables.is_empty() => rows.push(r.clone()),
            _ => return Err(underdetermined(&format!("tables of extension {}", ext.name()))),
        }
    }

    let rows = harmonize_levels(rows)?;

    let mut kept: Vec<ExtensionTable> = ExtensionTable::ALL
        .iter()
        .copied()
        .filter(|t| extensions.iter().all(|e| e.tables.contains_key(t)))
        .collect();
    let f_y_cols = extensions.iter().find_map(|e| e.f_y()).map(|t| t.cols().clone());
    if f_y_cols.is_some() && !kept.contains(&ExtensionTable::FY) {
        kept.push(ExtensionTable::FY);
        kept.sort();
    }

    let mut out = Extension::new(name);
    for which in kept {
        let mut parts: Vec<Table> = Vec::with_capacity(extensions.len());
        let mut cols: Option<Index> = None;
        for (ext, rows) in extensions.iter().zip(rows.iter()) {
            let part = match (ext.table(which), &f_y_cols) {
                (Some(t), _) => t.with_rows(rows.clone())?,
                (None, Some(fill_cols)) => Table::zeros(rows.clone(), fill_cols.clone()),
                (None, None) => return Err(underdetermined(&format!("{} of extension {}", which, ext.name()))),
            };
            let part = match &cols {
                Some(c) => part.reindex_cols(c, FillPolicy::Fail)?,
                None => {
                    cols = Some(part.cols().clone());
                    part
                }
            };
            parts.push(part);
        }
        let refs: Vec<&Table> = parts.iter().collect();
        out.set_table(which, Table::concat_rows(&refs)?)?;
    }

    if extensions.iter().any(|e| e.unit.is_some()) {
        let mut units: Vec<Units> = Vec::with_capacity(extensions.len());
        for (ext, rows) in extensions.iter().zip(rows.iter()) {
            let own = ext.rows().cloned().unwrap_or_else(|| rows.clone());
            let unit = match &ext.unit {
                Some(u) => u.reindex(&own, Some(NULL_LABEL))?,
                None => Units::uniform(own, NULL_LABEL),
            };
            units.push(unit.with_index(rows.clone())?);
        }
        let (first, rest) = units.split_at(1);
        let rest: Vec<&Units> = rest.iter().collect();
        out.set_unit(first[0].concat(&rest)?)?;
    }

    tracing::debug!(
        target: "rust_mrio",
        extension = name,
        inputs = extensions.len(),
        "extensions concatenated"
    );
    Ok(out)
}

/// Bring all row indices to one set of level names.
fn harmonize_levels(rows: Vec<Index>) -> SystemResult<Vec<Index>> {
    let names_agree = rows.windows(2).all(|w| w[0].names() == w[1].names());
    if names_agree {
        return Ok(rows);
    }
    let leading_agree = rows.windows(2).all(|w| w[0].names().first() == w[1].names().first());
    let renamed: Vec<Index> = if leading_agree {
        rows
    } else {
        rows.into_iter()
            .map(|r| {
                let mut names = r.names().to_vec();
                if let Some(first) = names.first_mut() {
                    *first = INDICATOR.to_string();
                }
                r.with_names(names)
            })
            .collect::<Result<_, _>>()?
    };
    let union = unique_in_order(renamed.iter().flat_map(|r| r.names().to_vec()).collect());
    Ok(renamed.iter().map(|r| r.conform_levels(&union)).collect::<Result<_, _>>()?)
}
