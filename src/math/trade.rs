//! math::trade — gross bilateral trade from flows and final demand.
//!
//! Bilateral flows are the entries of `Z` and `Y` with domestic blocks set
//! to zero, summed per importing region: rows are exporting region ×
//! sector, columns are importing regions. Totals report gross exports and
//! gross imports per region × sector.
use crate::math::errors::MathResult;
use crate::table::{FillPolicy, Index, Table, REGION, SECTOR};
use ndarray::Array2;

/// Bilateral flows and their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct GrossTrade {
    /// Rows: exporting (region, sector); columns: importing region.
    pub bilat_flows: Table,
    /// Rows: (region, sector); columns: `exports`, `imports`.
    pub totals: Table,
}

/// Gross trade of an MRIO from `Z` and `Y`.
pub fn calc_gross_trade(z: &Table, y: &Table) -> MathResult<GrossTrade> {
    let z_exp = z.zero_domestic_blocks(REGION)?.sum_columns_by_level(REGION)?;
    let y_exp = y
        .zero_domestic_blocks(REGION)?
        .sum_columns_by_level(REGION)?
        .reindex_cols(z_exp.cols(), FillPolicy::Value(0.0))?;
    let bilat_flows = z_exp.add(&y_exp)?;

    let exports = bilat_flows.row_sums();
    let exporters = bilat_flows.rows().level_values(REGION)?;
    let products = bilat_flows.rows().level_values(SECTOR)?;
    let importers = bilat_flows.cols().level_values(REGION)?;

    let mut imports = vec![0.0; bilat_flows.nrows()];
    for (i, product) in products.iter().enumerate() {
        for (j, importer) in importers.iter().enumerate() {
            let target = exporters
                .iter()
                .zip(products.iter())
                .position(|(r, s)| r == importer && s == product);
            if let Some(t) = target {
                imports[t] += bilat_flows.data()[[i, j]];
            }
        }
    }

    let mut data = Array2::<f64>::zeros((bilat_flows.nrows(), 2));
    for i in 0..bilat_flows.nrows() {
        data[[i, 0]] = exports[i];
        data[[i, 1]] = imports[i];
    }
    let totals = Table::new(data, bilat_flows.rows().clone(), Index::single("trade", ["exports", "imports"]))?;
    Ok(GrossTrade { bilat_flows, totals })
}
