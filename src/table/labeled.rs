//! table::labeled — dense numeric matrix with two labeled axes.
//!
//! Purpose
//! -------
//! Provide [`Table`], the single data carrier of the crate: an
//! `ndarray::Array2<f64>` together with a row [`Index`] and a column
//! [`Index`]. All accounting, aggregation, restructuring and
//! characterization code operates through this type.
//!
//! Key behaviors
//! -------------
//! - Axis-preserving arithmetic: matrix product, elementwise sum and
//!   difference, row/column scaling and guarded division (`x / 0 → 0`).
//! - Reindexing against a target axis with an explicit [`FillPolicy`];
//!   keys present in the target but absent from the source fail loudly
//!   unless a fill value is supplied.
//! - Level-wise selection and group sums by one level, keeping groups in
//!   first-appearance order.
//! - Order-insensitive approximate comparison ([`Table::approx_eq`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - `data.nrows() == rows.len()` and `data.ncols() == cols.len()` at all
//!   times; every constructor checks this.
//! - Operations that assume aligned axes check [`Index::same_order`] first
//!   and return [`TableError::IndexMismatch`] otherwise. Nothing is
//!   silently reordered.
//!
//! Conventions
//! -----------
//! - Every operation is pure and returns a new `Table`.
//! - Column vectors (e.g. industry output) are `n × 1` tables whose single
//!   column carries a descriptive label such as `indout`.
use crate::table::{
    errors::{TableError, TableResult},
    index::{Index, Key},
};
use ndarray::{Array1, Array2, Axis};
use std::collections::HashMap;

/// What to do with target keys that the source axis lacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPolicy {
    /// Missing keys are an error.
    Fail,
    /// Missing keys are filled with the given value.
    Value(f64),
}

/// Table — dense `f64` matrix with labeled rows and columns.
///
/// Fields
/// ------
/// - `data`: `Array2<f64>`
///   Values, `rows.len() × cols.len()`.
/// - `rows`: [`Index`]
///   Row axis.
/// - `cols`: [`Index`]
///   Column axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    data: Array2<f64>,
    rows: Index,
    cols: Index,
}

impl Table {
    /// Build a table, checking that the data shape matches both axes.
    ///
    /// Errors
    /// ------
    /// - `TableError::ShapeMismatch` when `data` is not `rows.len() × cols.len()`.
    pub fn new(data: Array2<f64>, rows: Index, cols: Index) -> TableResult<Self> {
        let expected = (rows.len(), cols.len());
        let actual = (data.nrows(), data.ncols());
        if expected != actual {
            return Err(TableError::ShapeMismatch { expected, actual });
        }
        Ok(Table { data, rows, cols })
    }

    pub fn zeros(rows: Index, cols: Index) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: Index, cols: Index, value: f64) -> Self {
        let data = Array2::from_elem((rows.len(), cols.len()), value);
        Table { data, rows, cols }
    }

    /// Identity matrix labeled by `index` on both axes.
    pub fn identity(index: &Index) -> Self {
        Table { data: Array2::eye(index.len()), rows: index.clone(), cols: index.clone() }
    }

    /// Column vector `n × 1` with one named column.
    pub fn column(values: Array1<f64>, rows: Index, name: &str) -> TableResult<Self> {
        let n = values.len();
        let data = values.into_shape_with_order((n, 1)).map_err(|e| anyhow::anyhow!(e))?;
        Table::new(data, rows, Index::single(name, [name]))
    }

    /// Row vector `1 × n` with one named row.
    pub fn row(values: Array1<f64>, name: &str, cols: Index) -> TableResult<Self> {
        let n = values.len();
        let data = values.into_shape_with_order((1, n)).map_err(|e| anyhow::anyhow!(e))?;
        Table::new(data, Index::single(name, [name]), cols)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn rows(&self) -> &Index {
        &self.rows
    }

    pub fn cols(&self) -> &Index {
        &self.cols
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    pub fn into_parts(self) -> (Array2<f64>, Index, Index) {
        (self.data, self.rows, self.cols)
    }

    /// Value at the first occurrence of `(row, col)`.
    pub fn get(&self, row: &[String], col: &[String]) -> Option<f64> {
        let i = self.rows.position(row)?;
        let j = self.cols.position(col)?;
        Some(self.data[[i, j]])
    }

    /// Replace the data, keeping both axes.
    pub fn with_data(&self, data: Array2<f64>) -> TableResult<Table> {
        Table::new(data, self.rows.clone(), self.cols.clone())
    }

    /// Same data under a new row axis of equal length.
    pub fn with_rows(&self, rows: Index) -> TableResult<Table> {
        Table::new(self.data.clone(), rows, self.cols.clone())
    }

    /// Same data under a new column axis of equal length.
    pub fn with_cols(&self, cols: Index) -> TableResult<Table> {
        Table::new(self.data.clone(), self.rows.clone(), cols)
    }

    pub fn transpose(&self) -> Table {
        Table { data: self.data.t().to_owned(), rows: self.cols.clone(), cols: self.rows.clone() }
    }

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Table {
        Table { data: self.data.mapv(f), rows: self.rows.clone(), cols: self.cols.clone() }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn total(&self) -> f64 {
        self.data.sum()
    }

    // ---- Arithmetic ----

    /// Matrix product; `self.cols` must equal `other.rows` in order.
    pub fn dot(&self, other: &Table) -> TableResult<Table> {
        if self.cols.keys() != other.rows.keys() {
            return Err(TableError::IndexMismatch { operation: "matrix product".to_string() });
        }
        Ok(Table {
            data: self.data.dot(&other.data),
            rows: self.rows.clone(),
            cols: other.cols.clone(),
        })
    }

    /// Elementwise sum of two identically labeled tables.
    pub fn add(&self, other: &Table) -> TableResult<Table> {
        self.ensure_aligned(other, "addition")?;
        Ok(Table { data: &self.data + &other.data, rows: self.rows.clone(), cols: self.cols.clone() })
    }

    /// Elementwise difference of two identically labeled tables.
    pub fn sub(&self, other: &Table) -> TableResult<Table> {
        self.ensure_aligned(other, "subtraction")?;
        Ok(Table { data: &self.data - &other.data, rows: self.rows.clone(), cols: self.cols.clone() })
    }

    pub fn scale(&self, k: f64) -> Table {
        self.map(|v| v * k)
    }

    /// Multiply column `j` by `v[j]` (`self · diag(v)`).
    pub fn scale_columns(&self, v: &Array1<f64>) -> TableResult<Table> {
        self.ensure_len(v.len(), self.ncols(), "column scaling")?;
        let data = &self.data * &v.view().insert_axis(Axis(0));
        Ok(Table { data, rows: self.rows.clone(), cols: self.cols.clone() })
    }

    /// Multiply row `i` by `v[i]` (`diag(v) · self`).
    pub fn scale_rows(&self, v: &Array1<f64>) -> TableResult<Table> {
        self.ensure_len(v.len(), self.nrows(), "row scaling")?;
        let data = &self.data * &v.view().insert_axis(Axis(1));
        Ok(Table { data, rows: self.rows.clone(), cols: self.cols.clone() })
    }

    /// Divide column `j` by `v[j]`; columns with `v[j] == 0` become 0.
    pub fn div_columns_guarded(&self, v: &Array1<f64>) -> TableResult<Table> {
        self.scale_columns(&guarded_reciprocal(v))
    }

    /// Divide row `i` by `v[i]`; rows with `v[i] == 0` become 0.
    pub fn div_rows_guarded(&self, v: &Array1<f64>) -> TableResult<Table> {
        self.scale_rows(&guarded_reciprocal(v))
    }

    pub fn row_sums(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(1))
    }

    pub fn col_sums(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(0))
    }

    /// Row sums as an `n × 1` table with column label `name`.
    pub fn row_totals(&self, name: &str) -> TableResult<Table> {
        Table::column(self.row_sums(), self.rows.clone(), name)
    }

    // ---- Grouping ----

    /// Sum columns sharing the same label of `level`.
    ///
    /// The result has a single-level column index named `level`, groups
    /// in first-appearance order.
    pub fn sum_columns_by_level(&self, level: &str) -> TableResult<Table> {
        let (groups, assignment) = self.cols.group_by_level(level)?;
        let data = sum_groups(&self.data.t().to_owned(), &assignment, groups.len());
        Ok(Table { data: data.t().to_owned(), rows: self.rows.clone(), cols: groups })
    }

    /// Sum rows sharing the same label of `level`.
    pub fn sum_rows_by_level(&self, level: &str) -> TableResult<Table> {
        let (groups, assignment) = self.rows.group_by_level(level)?;
        let data = sum_groups(&self.data, &assignment, groups.len());
        Ok(Table { data, rows: groups, cols: self.cols.clone() })
    }

    /// Sum rows and columns carrying identical keys.
    pub fn sum_duplicates(&self) -> Table {
        let (rows, row_assign) = self.rows.group_duplicates();
        let (cols, col_assign) = self.cols.group_duplicates();
        let by_row = sum_groups(&self.data, &row_assign, rows.len());
        let by_col = sum_groups(&by_row.t().to_owned(), &col_assign, cols.len());
        Table { data: by_col.t().to_owned(), rows, cols }
    }

    // ---- Selection ----

    pub fn select_rows(&self, positions: &[usize]) -> Table {
        Table {
            data: self.data.select(Axis(0), positions),
            rows: self.rows.select(positions),
            cols: self.cols.clone(),
        }
    }

    pub fn select_cols(&self, positions: &[usize]) -> Table {
        Table {
            data: self.data.select(Axis(1), positions),
            rows: self.rows.clone(),
            cols: self.cols.select(positions),
        }
    }

    /// Rows whose `level` label equals `value`, other levels untouched.
    pub fn select_rows_by_level(&self, level: &str, value: &str) -> TableResult<Table> {
        let values = self.rows.level_values(level)?;
        let positions: Vec<usize> =
            values.iter().enumerate().filter(|(_, v)| v.as_str() == value).map(|(i, _)| i).collect();
        Ok(self.select_rows(&positions))
    }

    /// Columns whose `level` label equals `value`.
    pub fn select_cols_by_level(&self, level: &str, value: &str) -> TableResult<Table> {
        let values = self.cols.level_values(level)?;
        let positions: Vec<usize> =
            values.iter().enumerate().filter(|(_, v)| v.as_str() == value).map(|(i, _)| i).collect();
        Ok(self.select_cols(&positions))
    }

    // ---- Reindexing ----

    /// Reorder rows to `target`; source rows absent from `target` are dropped.
    ///
    /// Errors
    /// ------
    /// - `TableError::LevelMismatch` when level names differ.
    /// - `TableError::MissingKeys` for absent target keys under `FillPolicy::Fail`.
    pub fn reindex_rows(&self, target: &Index, fill: FillPolicy) -> TableResult<Table> {
        let positions = resolve_positions(&self.rows, target, fill)?;
        let mut data = Array2::zeros((target.len(), self.ncols()));
        for (i, pos) in positions.iter().enumerate() {
            match pos {
                Some(p) => data.row_mut(i).assign(&self.data.row(*p)),
                None => data.row_mut(i).fill(fill_value(fill)),
            }
        }
        Ok(Table { data, rows: target.clone(), cols: self.cols.clone() })
    }

    /// Reorder columns to `target`; see [`Table::reindex_rows`].
    pub fn reindex_cols(&self, target: &Index, fill: FillPolicy) -> TableResult<Table> {
        Ok(self.transpose().reindex_rows(target, fill)?.transpose())
    }

    /// Reindex both axes to those of `other`, failing on any missing key.
    pub fn align_to(&self, other: &Table) -> TableResult<Table> {
        self.reindex_rows(&other.rows, FillPolicy::Fail)?.reindex_cols(&other.cols, FillPolicy::Fail)
    }

    /// Stack tables with identical column axes on top of each other.
    pub fn concat_rows(tables: &[&Table]) -> TableResult<Table> {
        let first = tables
            .first()
            .ok_or_else(|| anyhow::anyhow!("cannot concatenate an empty list of tables"))?;
        let mut rows: Vec<&Index> = Vec::with_capacity(tables.len());
        let mut views = Vec::with_capacity(tables.len());
        for t in tables {
            if !t.cols.same_order(&first.cols) {
                return Err(TableError::IndexMismatch {
                    operation: "row concatenation".to_string(),
                });
            }
            rows.push(&t.rows);
            views.push(t.data.view());
        }
        let index = first.rows.concat(&rows[1..])?;
        let data = ndarray::concatenate(Axis(0), &views).map_err(|e| anyhow::anyhow!(e))?;
        Table::new(data, index, first.cols.clone())
    }

    /// Relabel `level` on whichever axes carry it.
    pub fn rename_labels(&self, level: &str, map: &HashMap<String, String>) -> TableResult<Table> {
        let rows =
            if self.rows.has_level(level) { self.rows.rename_labels(level, map)? } else { self.rows.clone() };
        let cols =
            if self.cols.has_level(level) { self.cols.rename_labels(level, map)? } else { self.cols.clone() };
        Ok(Table { data: self.data.clone(), rows, cols })
    }

    /// Zero every entry whose row and column carry the same `level` label.
    pub fn zero_domestic_blocks(&self, level: &str) -> TableResult<Table> {
        let row_labels = self.rows.level_values(level)?;
        let col_labels = self.cols.level_values(level)?;
        let mut data = self.data.clone();
        for (i, r) in row_labels.iter().enumerate() {
            for (j, c) in col_labels.iter().enumerate() {
                if r == c {
                    data[[i, j]] = 0.0;
                }
            }
        }
        Ok(Table { data, rows: self.rows.clone(), cols: self.cols.clone() })
    }

    // ---- Comparison ----

    /// Equality within `tol`, independent of row and column order.
    pub fn approx_eq(&self, other: &Table, tol: f64) -> bool {
        if !self.rows.same_labels(&other.rows) || !self.cols.same_labels(&other.cols) {
            return false;
        }
        match other.align_to(self) {
            Ok(aligned) => self
                .data
                .iter()
                .zip(aligned.data.iter())
                .all(|(a, b)| (a - b).abs() <= tol || (a.is_nan() && b.is_nan())),
            Err(_) => false,
        }
    }

    fn ensure_aligned(&self, other: &Table, operation: &str) -> TableResult<()> {
        if self.rows.same_order(&other.rows) && self.cols.same_order(&other.cols) {
            Ok(())
        } else {
            Err(TableError::IndexMismatch { operation: operation.to_string() })
        }
    }

    fn ensure_len(&self, actual: usize, expected: usize, operation: &str) -> TableResult<()> {
        if actual == expected {
            Ok(())
        } else {
            Err(TableError::IndexMismatch {
                operation: format!("{} (vector of length {}, axis of length {})", operation, actual, expected),
            })
        }
    }
}

// ---- Helper methods ----

/// `1 / v` elementwise with `1 / 0 := 0`.
pub fn guarded_reciprocal(v: &Array1<f64>) -> Array1<f64> {
    v.mapv(|x| if x == 0.0 { 0.0 } else { 1.0 / x })
}

fn fill_value(fill: FillPolicy) -> f64 {
    match fill {
        FillPolicy::Fail => 0.0,
        FillPolicy::Value(v) => v,
    }
}

/// For every target key, the source position holding it.
fn resolve_positions(source: &Index, target: &Index, fill: FillPolicy) -> TableResult<Vec<Option<usize>>> {
    target.ensure_names(source.names())?;
    let lookup = source.position_map();
    let positions: Vec<Option<usize>> =
        target.keys().iter().map(|k| lookup.get(k.as_slice()).copied()).collect();
    if fill == FillPolicy::Fail {
        let missing: Vec<Key> = target
            .keys()
            .iter()
            .zip(&positions)
            .filter(|(_, p)| p.is_none())
            .map(|(k, _)| k.clone())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::MissingKeys { keys: missing });
        }
    }
    Ok(positions)
}

/// Sum rows of `data` into `n_groups` rows according to `assignment`.
fn sum_groups(data: &Array2<f64>, assignment: &[usize], n_groups: usize) -> Array2<f64> {
    let mut out = Array2::zeros((n_groups, data.ncols()));
    for (i, g) in assignment.iter().enumerate() {
        let mut target = out.row_mut(*g);
        target += &data.row(i);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Shape validation on construction.
    // - Matrix product alignment checks and guarded division.
    // - Reindexing with and without a fill policy.
    // - Grouped sums by level and by duplicate keys.
    // - Order-insensitive approximate equality.
    //
    // They intentionally DO NOT cover:
    // - Accounting identities, which live in `math`.
    // -------------------------------------------------------------------------

    fn reg_sec() -> Index {
        Index::product(
            &["region", "sector"],
            &[vec!["r1".into(), "r2".into()], vec!["a".into(), "b".into()]],
        )
        .unwrap()
    }

    fn key(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    // Purpose
    // -------
    // Construction fails when the data shape disagrees with the axes.
    fn new_rejects_shape_mismatch() {
        let res = Table::new(Array2::zeros((3, 4)), reg_sec(), reg_sec());
        assert_eq!(res, Err(TableError::ShapeMismatch { expected: (4, 4), actual: (3, 4) }));
    }

    #[test]
    // Purpose
    // -------
    // Matrix product refuses misaligned inner axes.
    //
    // Given
    // -----
    // - A 4×4 table and a table whose rows are the same keys reversed.
    //
    // Expect
    // ------
    // - `IndexMismatch` rather than a silently wrong product.
    fn dot_rejects_misaligned_inner_axes() {
        let t = Table::identity(&reg_sec());
        let reversed = reg_sec().select(&[3, 2, 1, 0]);
        let other = Table::zeros(reversed, Index::single("x", ["x"]));

        assert!(matches!(t.dot(&other), Err(TableError::IndexMismatch { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Guarded column division maps division by zero to zero.
    fn div_columns_guarded_sets_zero_divisor_columns_to_zero() {
        let t = Table::new(
            array![[2.0, 3.0], [4.0, 5.0]],
            Index::single("sector", ["a", "b"]),
            Index::single("sector", ["a", "b"]),
        )
        .unwrap();
        let out = t.div_columns_guarded(&array![2.0, 0.0]).unwrap();

        assert_eq!(out.data(), &array![[1.0, 0.0], [2.0, 0.0]]);
        assert!(out.is_finite());
    }

    #[test]
    // Purpose
    // -------
    // Reindexing fails loudly on missing keys unless a fill is supplied.
    fn reindex_rows_requires_fill_for_missing_keys() {
        let t = Table::filled(
            Index::single("sector", ["a", "b"]),
            Index::single("col", ["c"]),
            1.0,
        );
        let target = Index::single("sector", ["b", "z", "a"]);

        let failed = t.reindex_rows(&target, FillPolicy::Fail);
        assert_eq!(failed, Err(TableError::MissingKeys { keys: vec![key(&["z"])] }));

        let filled = t.reindex_rows(&target, FillPolicy::Value(0.0)).unwrap();
        assert_eq!(filled.data(), &array![[1.0], [0.0], [1.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Column sums by level collapse sectors within regions in order.
    //
    // Given
    // -----
    // - A 1×4 row over (r1,a), (r1,b), (r2,a), (r2,b) with values 1..4.
    //
    // Expect
    // ------
    // - Two columns r1 = 3, r2 = 7.
    fn sum_columns_by_level_groups_regions() {
        let t = Table::new(array![[1.0, 2.0, 3.0, 4.0]], Index::single("s", ["CO2"]), reg_sec())
            .unwrap();
        let out = t.sum_columns_by_level("region").unwrap();

        assert_eq!(out.cols().keys(), &[key(&["r1"]), key(&["r2"])]);
        assert_eq!(out.data(), &array![[3.0, 7.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Duplicate keys are summed on both axes.
    fn sum_duplicates_merges_identical_keys() {
        let t = Table::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            Index::single("sector", ["a", "a"]),
            Index::single("sector", ["a", "a"]),
        )
        .unwrap();
        let out = t.sum_duplicates();

        assert_eq!(out.shape(), (1, 1));
        assert_eq!(out.data()[[0, 0]], 10.0);
    }

    #[test]
    // Purpose
    // -------
    // Approximate equality ignores row and column order.
    fn approx_eq_is_order_insensitive() {
        let t = Table::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            Index::single("sector", ["a", "b"]),
            Index::single("sector", ["a", "b"]),
        )
        .unwrap();
        let swapped = Table::new(
            array![[4.0, 3.0], [2.0, 1.0 + 1e-12]],
            Index::single("sector", ["b", "a"]),
            Index::single("sector", ["b", "a"]),
        )
        .unwrap();

        assert!(t.approx_eq(&swapped, 1e-9));
        assert!(!t.approx_eq(&swapped.scale(2.0), 1e-9));
    }

    #[test]
    // Purpose
    // -------
    // Domestic blocks are zeroed by matching region labels.
    fn zero_domestic_blocks_clears_same_region_entries() {
        let t = Table::filled(reg_sec(), Index::single("region", ["r1", "r2"]), 1.0);
        let out = t.zero_domestic_blocks("region").unwrap();

        assert_eq!(out.data(), &array![[0.0, 1.0], [0.0, 1.0], [1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Row concatenation requires identical column axes.
    fn concat_rows_stacks_rows() {
        let a = Table::filled(Index::single("s", ["x"]), Index::single("c", ["c1", "c2"]), 1.0);
        let b = Table::filled(Index::single("s", ["y"]), Index::single("c", ["c1", "c2"]), 2.0);
        let out = Table::concat_rows(&[&a, &b]).unwrap();

        assert_eq!(out.rows().keys(), &[key(&["x"]), key(&["y"])]);
        assert_eq!(out.data(), &array![[1.0, 1.0], [2.0, 2.0]]);

        let c = Table::filled(Index::single("s", ["z"]), Index::single("c", ["c2", "c1"]), 0.0);
        assert!(Table::concat_rows(&[&a, &c]).is_err());
    }
}
