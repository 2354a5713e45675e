//! utils — conversion helpers for the Python bindings.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! turns numpy / pandas / sequence inputs into the labeled tables of
//! [`crate::table`], and tables back into numpy arrays.

#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};

#[cfg(feature = "python-bindings")]
use crate::table::{Index, Table};

/// Dense `f64` matrix from a 2-D numpy array, a pandas DataFrame or a
/// nested sequence.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix(raw_data: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err("rows of the nested sequence differ in length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((flat.len() / ncols.max(1), ncols), flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Labeled table from a Python matrix and the row and column indices.
#[cfg(feature = "python-bindings")]
pub fn extract_table(raw_data: &Bound<'_, PyAny>, rows: Index, cols: Index) -> PyResult<Table> {
    let data = extract_f64_matrix(raw_data)?;
    if data.iter().any(|v| !v.is_finite()) {
        return Err(PyValueError::new_err("table values must be finite"));
    }
    Ok(Table::new(data, rows, cols)?)
}

/// Copy of the table values as a numpy array.
#[cfg(feature = "python-bindings")]
pub fn table_to_numpy<'py>(py: Python<'py>, table: &Table) -> Bound<'py, PyArray2<f64>> {
    table.data().clone().into_pyarray(py)
}
