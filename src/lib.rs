//! rust_mrio — multi-regional input-output accounting with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, with the `python-bindings`
//! feature, as the PyO3 bridge exposing a thin `MRIOSystem` class through
//! the `_rust_mrio` extension module.
//!
//! Key behaviors
//! -------------
//! - [`table`]: labeled dense matrices with multi-level row/column indices.
//! - [`math`]: Leontief and Ghosh identities, stressor accounts, gross trade.
//! - [`system`]: `IOSystem` and `Extension` with explicit table maps, an
//!   event log, completeness queries, calculation and resets.
//! - [`aggregation`]: Kronecker-structured region/sector/category aggregation.
//! - [`restructure`]: rename, extract, concatenate and convert.
//! - [`characterization`]: impact assessment with scoped factors.
//!
//! Invariants & assumptions
//! ------------------------
//! - All tables of a system share the `(region, sector)` axis in one order;
//!   final-demand tables use `(region, category)`.
//! - Operations that fail leave the system unchanged.
//! - The library logs through `tracing` and never installs a subscriber.
//!
//! Conventions
//! -----------
//! - Errors are per-component enums (`TableError`, `MathError`,
//!   `SystemError`) converted to `PyValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Rust callers import [`prelude`] or the component modules directly and
//!   can ignore the items guarded by `python-bindings`.
//! - Parsers build the `(Z, Y, extensions)` bundle and hand it to
//!   [`system::IOSystem::from_flows`] / [`system::IOSystem::add_extension`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code; `tests/` holds the end-to-end
//!   pipeline test and property tests.

pub mod aggregation;
pub mod characterization;
pub mod math;
pub mod restructure;
pub mod system;
pub mod table;
pub mod utils;

pub mod prelude {
    pub use crate::aggregation::prelude::*;
    pub use crate::characterization::prelude::*;
    pub use crate::math::prelude::*;
    pub use crate::restructure::prelude::*;
    pub use crate::system::prelude::*;
    pub use crate::table::prelude::*;
}

#[cfg(feature = "python-bindings")]
use numpy::PyArray2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    aggregation::{AggregationOptions, AggregationSpec},
    system::{CalcOptions, Extension, ExtensionTable, IOSystem, SystemTable, Units},
    table::{Index, CATEGORY, REGION, SECTOR, STRESSOR},
    utils::{extract_table, table_to_numpy},
};

/// MRIOSystem — Python-facing wrapper around [`IOSystem`].
///
/// Purpose
/// -------
/// Build a system from numpy flows and label lists, attach extensions,
/// calculate and read results back as numpy arrays.
///
/// Parameters
/// ----------
/// Constructed from Python via `MRIOSystem(Z, Y, regions, sectors, categories, name="mrio")`:
/// - `Z`: `(r·s) × (r·s)` array-like, rows and columns region-major.
/// - `Y`: `(r·s) × (r·c)` array-like.
/// - `regions`, `sectors`, `categories`: label lists.
///
/// Fields
/// ------
/// - `inner`: [`IOSystem`]
///
/// Notes
/// -----
/// - Native Rust code should use [`IOSystem`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_mrio", unsendable)]
pub struct MRIOSystem {
    inner: IOSystem,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MRIOSystem {
    #[new]
    #[pyo3(
        signature = (z, y, regions, sectors, categories, name = "mrio"),
        text_signature = "(z, y, regions, sectors, categories, /, name='mrio')"
    )]
    pub fn new(
        z: &Bound<'_, PyAny>, y: &Bound<'_, PyAny>, regions: Vec<String>, sectors: Vec<String>,
        categories: Vec<String>, name: &str,
    ) -> PyResult<Self> {
        let core = Index::product(&[REGION, SECTOR], &[regions.clone(), sectors])?;
        let fd = Index::product(&[REGION, CATEGORY], &[regions, categories])?;
        let z = extract_table(z, core.clone(), core.clone())?;
        let y = extract_table(y, core, fd)?;
        Ok(MRIOSystem { inner: IOSystem::from_flows(name, z, y)? })
    }

    /// Attach an extension with stressor rows `stressors`.
    #[pyo3(signature = (name, f, stressors, f_y = None, units = None))]
    pub fn add_extension(
        &mut self, name: &str, f: &Bound<'_, PyAny>, stressors: Vec<String>, f_y: Option<&Bound<'_, PyAny>>,
        units: Option<Vec<String>>,
    ) -> PyResult<()> {
        let core = self
            .inner
            .core_index()
            .cloned()
            .ok_or_else(|| PyValueError::new_err("system has no core tables"))?;
        let rows = Index::single(STRESSOR, stressors);
        let f = extract_table(f, rows.clone(), core)?;
        let f_y = match (f_y, self.inner.y()) {
            (Some(raw), Some(y)) => Some(extract_table(raw, rows.clone(), y.cols().clone())?),
            (Some(_), None) => return Err(PyValueError::new_err("F_Y given but the system has no Y")),
            (None, _) => None,
        };
        let unit = units.map(|u| Units::new(rows, u)).transpose()?;
        self.inner.add_extension(Extension::from_flows(name, f, f_y, unit)?)?;
        Ok(())
    }

    /// Calculate every missing table of the system and its extensions.
    #[pyo3(signature = (include_ghosh = false))]
    pub fn calc_all(&mut self, include_ghosh: bool) -> PyResult<()> {
        Ok(self.inner.calc_all(&CalcOptions::new(include_ghosh))?)
    }

    /// Aggregate with one group label per region and/or sector.
    #[pyo3(signature = (region_groups = None, sector_groups = None))]
    pub fn aggregate(
        &mut self, region_groups: Option<Vec<String>>, sector_groups: Option<Vec<String>>,
    ) -> PyResult<()> {
        let spec = |groups: Option<Vec<String>>| groups.map(AggregationSpec::groups).unwrap_or_default();
        self.inner.aggregate(
            &spec(region_groups),
            &spec(sector_groups),
            &AggregationSpec::Identity,
            &AggregationOptions::default(),
        )?;
        Ok(())
    }

    /// Values of a core table (`"Z"`, `"Y"`, `"x"`, `"A"`, `"L"`, ...).
    pub fn table<'py>(&self, py: Python<'py>, name: &str) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let which: SystemTable = name.parse()?;
        let table = self
            .inner
            .table(which)
            .ok_or_else(|| PyValueError::new_err(format!("table {} is not available", name)))?;
        Ok(table_to_numpy(py, table))
    }

    /// Values of an extension table (`"F"`, `"D_cba_reg"`, ...).
    pub fn extension_table<'py>(
        &self, py: Python<'py>, extension: &str, name: &str,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let which: ExtensionTable = name.parse()?;
        let table = self.inner.extension(extension)?.table(which).ok_or_else(|| {
            PyValueError::new_err(format!("table {} of extension {} is not available", name, extension))
        })?;
        Ok(table_to_numpy(py, table))
    }

    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    #[getter]
    pub fn regions(&self) -> Vec<String> {
        self.inner.get_regions()
    }

    #[getter]
    pub fn sectors(&self) -> Vec<String> {
        self.inner.get_sectors()
    }

    #[getter]
    pub fn y_categories(&self) -> Vec<String> {
        self.inner.get_y_categories()
    }

    #[getter]
    pub fn extension_names(&self) -> Vec<String> {
        self.inner.extension_names()
    }

    /// Messages of the event log, oldest first.
    #[getter]
    pub fn history(&self) -> Vec<String> {
        self.inner.events().events().iter().map(|e| e.message.clone()).collect()
    }
}

/// _rust_mrio — PyO3 module initializer.
///
/// Invoked by Python when importing the compiled extension; registers
/// [`MRIOSystem`].
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_mrio<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<MRIOSystem>()?;
    Ok(())
}
