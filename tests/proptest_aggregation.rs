//! Property tests for aggregation, renaming, characterization and
//! conversion.
//!
//! Checks the algebraic laws these operations must satisfy on arbitrary
//! (small) systems rather than on hand-picked values.
mod common;

use common::{core_index, generated, labels};
use ndarray::Array2;
use proptest::prelude::*;
use rust_mrio::{
    aggregation::{AggregationOptions, AggregationSpec},
    characterization::{CharacterizationFactor, CharacterizationOptions, CharacterizationTable},
    restructure::{BridgeRow, ConversionBridge, ConvertOptions, RenameSpec},
    system::{CalcOptions, Extension, Units},
    table::{Index, Table, STRESSOR},
};

// ============================================================================
// Generators
// ============================================================================

/// Extension with `nstress` stressors over a 2 × 3 core and positive values.
fn arb_extension(nstress: usize) -> impl Strategy<Value = Extension> {
    proptest::collection::vec(0.0f64..100.0, nstress * 6).prop_map(move |values| {
        let core = core_index(&labels(&["R1", "R2"]), &labels(&["a", "b", "c"]));
        let names: Vec<String> = (0..nstress).map(|i| format!("st{}", i)).collect();
        let rows = Index::single(STRESSOR, names);
        let f = Table::new(Array2::from_shape_vec((nstress, 6), values).expect("shape"), rows.clone(), core)
            .expect("F");
        Extension::from_flows("ext", f, None, Some(Units::uniform(rows, "kg"))).expect("extension")
    })
}

/// Global factor table: stressor `i` goes to impact `i % nimpacts`.
fn factor_table(weights: &[f64], nimpacts: usize) -> CharacterizationTable {
    let factors = weights
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let stressor = format!("st{}", i);
            let impact = format!("imp{}", i % nimpacts);
            CharacterizationFactor::new(vec![(STRESSOR, stressor.as_str())], &impact, "eq", *w)
        })
        .collect();
    CharacterizationTable::new(factors).expect("factor table")
}

// ============================================================================
// Aggregation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Identity concordances leave a calculated system unchanged
    #[test]
    fn identity_aggregation_is_a_no_op(nreg in 1usize..4, nsec in 1usize..4, ncat in 1usize..3) {
        let mut io = generated(nreg, nsec, ncat);
        io.calc_all(&CalcOptions::default()).expect("calc_all");
        let before = io.clone();
        io.aggregate(
            &AggregationSpec::Identity,
            &AggregationSpec::Identity,
            &AggregationSpec::Identity,
            &AggregationOptions::default(),
        ).expect("aggregate");
        prop_assert!(io.approx_eq(&before, 1e-9));
    }

    /// Aggregating in two steps equals aggregating once with the composed map
    #[test]
    fn sector_aggregation_composes(
        nsec in 2usize..6,
        first in proptest::collection::vec(0usize..4, 6),
        second in proptest::collection::vec(0usize..2, 4),
    ) {
        let mut stepwise = generated(2, nsec, 1);
        let mut direct = stepwise.clone();

        let first_labels: Vec<String> = (0..nsec).map(|i| format!("g{}", first[i])).collect();
        stepwise.aggregate_sectors(&AggregationSpec::groups(first_labels), &AggregationOptions::default())
            .expect("first step");
        let pairs: Vec<(String, String)> = stepwise
            .get_sectors()
            .into_iter()
            .map(|g| {
                let j: usize = g[1..].parse().expect("group number");
                let h = format!("h{}", second[j]);
                (g, h)
            })
            .collect();
        stepwise.aggregate_sectors(&AggregationSpec::mapping(pairs), &AggregationOptions::default())
            .expect("second step");

        let composed: Vec<String> = (0..nsec).map(|i| format!("h{}", second[first[i]])).collect();
        direct.aggregate_sectors(&AggregationSpec::groups(composed), &AggregationOptions::default())
            .expect("direct");

        prop_assert_eq!(stepwise.get_sectors(), direct.get_sectors());
        prop_assert!(stepwise.approx_eq(&direct, 1e-7));
    }

    /// Aggregation conserves the grand totals of Z, Y and F
    #[test]
    fn aggregation_conserves_totals(
        nreg in 2usize..5,
        groups in proptest::collection::vec(0usize..2, 5),
    ) {
        let mut io = generated(nreg, 3, 2);
        let z = io.z().expect("Z").total();
        let y = io.y().expect("Y").total();
        let f = io.extension("pollution").expect("ext").f().expect("F").total();

        let region_groups: Vec<String> = (0..nreg).map(|i| format!("G{}", groups[i])).collect();
        io.aggregate_regions(&AggregationSpec::groups(region_groups), &AggregationOptions::default())
            .expect("aggregate");

        prop_assert!((io.z().expect("Z").total() - z).abs() < 1e-8 * z.max(1.0));
        prop_assert!((io.y().expect("Y").total() - y).abs() < 1e-8 * y.max(1.0));
        let f_after = io.extension("pollution").expect("ext").f().expect("F").total();
        prop_assert!((f_after - f).abs() < 1e-8 * f.max(1.0));
    }
}

// ============================================================================
// Renaming
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Renaming regions and sectors and renaming back restores the system
    #[test]
    fn rename_round_trip(nreg in 1usize..4, nsec in 1usize..4, suffix in "[a-z]{1,4}") {
        let mut io = generated(nreg, nsec, 1);
        io.calc_all(&CalcOptions::default()).expect("calc_all");
        let before = io.clone();
        let regions = io.get_regions();
        let sectors = io.get_sectors();

        let renamed: Vec<String> = regions.iter().map(|r| format!("{}_{}", r, suffix)).collect();
        io.rename_regions(&RenameSpec::list(renamed.clone())).expect("rename regions");
        io.rename_sectors(&RenameSpec::map(sectors.iter().map(|s| (s.clone(), s.to_uppercase())).collect()))
            .expect("rename sectors");
        prop_assert_eq!(io.get_regions(), renamed);

        io.rename_regions(&RenameSpec::list(regions)).expect("rename regions back");
        io.rename_sectors(&RenameSpec::list(sectors)).expect("rename sectors back");
        prop_assert!(io.approx_eq(&before, 0.0));
    }
}

// ============================================================================
// Characterization and conversion
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Characterization is linear in the stressors
    #[test]
    fn characterization_is_linear(
        ext in arb_extension(4),
        weights in proptest::collection::vec(0.0f64..50.0, 4),
        k in 0.1f64..10.0,
        nimpacts in 1usize..4,
    ) {
        let table = factor_table(&weights, nimpacts);
        let opts = CharacterizationOptions::default();
        let base = ext.characterize(&table, &opts).expect("characterize").extension.expect("result");

        let f = ext.f().expect("F");
        let scaled = Extension::from_flows("ext", f.scale(k), None, ext.unit().cloned()).expect("scaled");
        let scaled = scaled.characterize(&table, &opts).expect("characterize").extension.expect("result");

        let expected = base.f().expect("F").scale(k);
        prop_assert!(scaled.f().expect("F").approx_eq(&expected, 1e-9 * expected.total().max(1.0)));

        let weighted: f64 = weights.iter().enumerate().map(|(i, w)| w * f.data().row(i).sum()).sum();
        let total = base.f().expect("F").total();
        prop_assert!((total - weighted).abs() <= 1e-9 * weighted.max(1.0));
    }

    /// A one-to-one bridge with unit factors reproduces the extension
    #[test]
    fn identity_bridge_preserves_extension(ext in arb_extension(3)) {
        let rows: Vec<BridgeRow> = ext
            .get_rows()
            .iter()
            .map(|key| BridgeRow::new(vec![(STRESSOR, key[0].as_str())], vec![key[0].as_str()], 1.0))
            .collect();
        let bridge = ConversionBridge::new(vec![STRESSOR], rows).expect("bridge");
        let report = ext.convert(&bridge, &ConvertOptions::default()).expect("convert");

        prop_assert!(report.unbridged_rows.is_empty());
        prop_assert!(report.unused_bridge_rows.is_empty());
        prop_assert_eq!(report.extension.name(), "ext_converted");
        prop_assert!(report.extension.f().expect("F").approx_eq(ext.f().expect("F"), 1e-12));
        prop_assert_eq!(report.extension.unit().expect("unit").units(), ext.unit().expect("unit").units());
    }
}
