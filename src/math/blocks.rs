//! math::blocks — block diagonalization helpers for region × sector layouts.
//!
//! Final demand aggregated per consuming region (`n × r`) is spread into an
//! `n × (r·s)` matrix whose column `(c, j)` carries region `c`'s demand for
//! product `j` from every producing region, zero elsewhere. This is the
//! form in which the Leontief inverse turns final demand into
//! sector-resolved output.
use crate::math::errors::{MathError, MathResult};
use crate::table::{Index, Table};
use ndarray::Array2;

/// Diagonalize every `blocksize` section of every column.
///
/// Input `m × k` with `m` a multiple of `blocksize` gives `m × (k·blocksize)`;
/// output column `c·blocksize + j` holds input column `c` restricted to the
/// rows at offset `j` of each block.
///
/// Errors
/// ------
/// - `MathError::BlockSize` when `blocksize` does not divide the row count.
pub fn diagonalize_blocks(arr: &Array2<f64>, blocksize: usize) -> MathResult<Array2<f64>> {
    let (nr_row, nr_col) = arr.dim();
    if blocksize == 0 || nr_row % blocksize != 0 {
        return Err(MathError::BlockSize { rows: nr_row, block: blocksize });
    }
    let mut out = Array2::<f64>::zeros((nr_row, nr_col * blocksize));
    for c in 0..nr_col {
        for i in 0..nr_row {
            out[[i, c * blocksize + i % blocksize]] = arr[[i, c]];
        }
    }
    Ok(out)
}

/// Resolve columns of `table` by the row level `level`.
///
/// Columns become `(original column key…, level value)` and each original
/// column is diagonalized across the unique values of `level`. The row
/// index must repeat those values in the same order within every block,
/// as a region × sector product does.
pub fn diagonalize_columns_to_sectors(table: &Table, level: &str) -> MathResult<Table> {
    let sectors = table.rows().unique_level_values(level)?;
    let row_values = table.rows().level_values(level)?;
    let block = sectors.len();
    let layout_ok = block > 0
        && row_values.len() % block == 0
        && row_values.iter().enumerate().all(|(i, v)| *v == sectors[i % block]);
    if !layout_ok {
        return Err(MathError::BlockSize { rows: row_values.len(), block });
    }
    let data = diagonalize_blocks(table.data(), block)?;

    let mut names: Vec<String> = table.cols().names().to_vec();
    names.push(level.to_string());
    let keys = table
        .cols()
        .keys()
        .iter()
        .flat_map(|k| {
            sectors.iter().map(move |s| {
                let mut key = k.clone();
                key.push(s.clone());
                key
            })
        })
        .collect();
    let cols = Index::new(names, keys)?;
    Ok(Table::new(data, table.rows().clone(), cols)?)
}
