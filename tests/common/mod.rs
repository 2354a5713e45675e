//! Shared fixtures for the integration and property tests.
//!
//! Every fixture is deterministic and built only through the public API
//! (`Index`, `Table`, `IOSystem::from_flows`, `Extension::from_flows`).
#![allow(dead_code)]

use ndarray::{array, Array2};
use rust_mrio::{
    system::{Extension, IOSystem, Units},
    table::{Index, Table, CATEGORY, POPULATION, REGION, SECTOR, STRESSOR},
};

/// Purpose
/// -------
/// Labels as owned strings.
pub fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Purpose
/// -------
/// Region-major `(region, sector)` index.
pub fn core_index(regions: &[String], sectors: &[String]) -> Index {
    Index::product(&[REGION, SECTOR], &[regions.to_vec(), sectors.to_vec()]).expect("core index")
}

/// Purpose
/// -------
/// Region-major `(region, category)` index.
pub fn fd_index(regions: &[String], categories: &[String]) -> Index {
    Index::product(&[REGION, CATEGORY], &[regions.to_vec(), categories.to_vec()]).expect("final demand index")
}

/// Purpose
/// -------
/// The two-sector textbook economy (one region) with a value-added
/// extension.
///
/// Returns
/// -------
/// - `IOSystem` named `"miller_blair"` with `Z`, `Y` and the extension
///   `"factor_inputs"` (one row, `"value added"`, unit `"EUR"`).
///
/// Invariants
/// ----------
/// - `x = [1000, 2000]`, `A = [[0.15, 0.25], [0.20, 0.05]]` and the
///   value-added coefficients are `[0.65, 0.70]`.
pub fn miller_blair() -> IOSystem {
    let regions = labels(&["reg"]);
    let sectors = labels(&["s1", "s2"]);
    let core = core_index(&regions, &sectors);
    let fd = fd_index(&regions, &labels(&["final"]));

    let z = Table::new(array![[150.0, 500.0], [200.0, 100.0]], core.clone(), core.clone()).expect("Z");
    let y = Table::new(array![[350.0], [1700.0]], core.clone(), fd).expect("Y");
    let mut io = IOSystem::from_flows("miller_blair", z, y).expect("system");

    let rows = Index::single(STRESSOR, ["value added"]);
    let f = Table::new(array![[650.0, 1400.0]], rows.clone(), core).expect("F");
    let unit = Units::new(rows, vec!["EUR"]).expect("units");
    io.add_extension(Extension::from_flows("factor_inputs", f, None, Some(unit)).expect("extension"))
        .expect("add extension");
    io
}

/// Purpose
/// -------
/// A two-region, two-sector system with trade, household emissions and
/// population.
///
/// Returns
/// -------
/// - `IOSystem` named `"two_region"`, regions `R1`, `R2`, sectors `a`, `b`,
///   one category `hh`, extension `"emissions"` with rows `co2`, `ch4`
///   (unit `kg`) and an `F_Y` block, population `[10, 40]`.
pub fn two_region() -> IOSystem {
    let regions = labels(&["R1", "R2"]);
    let sectors = labels(&["a", "b"]);
    let core = core_index(&regions, &sectors);
    let fd = fd_index(&regions, &labels(&["hh"]));

    let z = Table::new(
        array![
            [10.0, 20.0, 5.0, 2.0],
            [4.0, 12.0, 3.0, 6.0],
            [6.0, 1.0, 14.0, 8.0],
            [2.0, 5.0, 7.0, 16.0],
        ],
        core.clone(),
        core.clone(),
    )
    .expect("Z");
    let y = Table::new(array![[50.0, 13.0], [40.0, 15.0], [9.0, 62.0], [12.0, 58.0]], core.clone(), fd.clone())
        .expect("Y");
    let mut io = IOSystem::from_flows("two_region", z, y).expect("system");

    let rows = Index::single(STRESSOR, ["co2", "ch4"]);
    let f = Table::new(array![[30.0, 12.0, 25.0, 9.0], [2.0, 1.0, 3.0, 4.0]], rows.clone(), core).expect("F");
    let f_y = Table::new(array![[7.0, 11.0], [0.0, 0.5]], rows.clone(), fd).expect("F_Y");
    let unit = Units::uniform(rows, "kg");
    io.add_extension(Extension::from_flows("emissions", f, Some(f_y), Some(unit)).expect("extension"))
        .expect("add extension");

    let population =
        Table::row(array![10.0, 40.0], POPULATION, Index::single(REGION, regions)).expect("population");
    io.set_population(population).expect("set population");
    io
}

/// Purpose
/// -------
/// A larger deterministic system for aggregation tests.
///
/// Parameters
/// ----------
/// - `nreg`, `nsec`, `ncat`: numbers of regions, sectors and categories;
///   all must be `> 0`.
///
/// Returns
/// -------
/// - `IOSystem` named `"generated"` with regions `R0..`, sectors `s0..`,
///   categories `c0..` and an extension `"pollution"` with two stressor
///   rows (`air`, `water`, unit `t`).
///
/// Invariants
/// ----------
/// - Intermediate use of every column stays well below its output, so
///   `I − A` is invertible.
pub fn generated(nreg: usize, nsec: usize, ncat: usize) -> IOSystem {
    let regions: Vec<String> = (0..nreg).map(|i| format!("R{}", i)).collect();
    let sectors: Vec<String> = (0..nsec).map(|i| format!("s{}", i)).collect();
    let categories: Vec<String> = (0..ncat).map(|i| format!("c{}", i)).collect();
    let core = core_index(&regions, &sectors);
    let fd = fd_index(&regions, &categories);
    let n = nreg * nsec;

    let z = Array2::from_shape_fn((n, n), |(i, j)| ((i * 7 + j * 3) % 11) as f64 + 1.0);
    let y = Array2::from_shape_fn((n, nreg * ncat), |(i, j)| ((i * 5 + j * 2) % 13) as f64 + 10.0 * n as f64);
    let f = Array2::from_shape_fn((2, n), |(k, j)| ((k + 1) * (j % 5 + 1)) as f64);

    let z = Table::new(z, core.clone(), core.clone()).expect("Z");
    let y = Table::new(y, core.clone(), fd).expect("Y");
    let mut io = IOSystem::from_flows("generated", z, y).expect("system");

    let rows = Index::single(STRESSOR, ["air", "water"]);
    let f = Table::new(f, rows.clone(), core).expect("F");
    io.add_extension(Extension::from_flows("pollution", f, None, Some(Units::uniform(rows, "t"))).expect("ext"))
        .expect("add extension");
    io
}

/// Purpose
/// -------
/// Assert elementwise closeness of two arrays with a readable message.
pub fn assert_close(actual: &Array2<f64>, expected: &Array2<f64>, tol: f64) {
    assert_eq!(actual.dim(), expected.dim(), "shape mismatch");
    for ((idx, a), e) in actual.indexed_iter().zip(expected.iter()) {
        assert!((a - e).abs() <= tol, "entry {:?}: {} vs {} (tol {})", idx, a, e, tol);
    }
}
