//! aggregation — block aggregation of systems and extensions.
//!
//! Purpose
//! -------
//! Coarsen the region, sector and final-demand category classifications
//! of an `IOSystem` and every attached extension consistently.
//!
//! Key behaviors
//! -------------
//! - [`concordance`]: partition specs ([`AggregationSpec`]) resolved to 0/1
//!   matrices ([`Concordance`], [`build_agg_matrix`]).
//! - [`engine`]: `IOSystem::aggregate` with Kronecker-structured operators,
//!   plus `aggregate_regions` / `aggregate_sectors` shorthands.
//! - [`duplicates`]: `IOSystem::aggregate_duplicates` for repeated labels.
//!
//! Invariants & assumptions
//! ------------------------
//! - Aggregation is all-or-nothing; specs are validated as total,
//!   non-overlapping partitions before any table changes.
//! - Aggregating by the identity partition reproduces the flows exactly,
//!   and aggregations compose.
//!
//! Testing notes
//! -------------
//! - Projection and composition are property-tested in
//!   `tests/proptest_aggregation.rs`.

pub mod concordance;
pub mod duplicates;
pub mod engine;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::concordance::{build_agg_matrix, AggregationSpec, Concordance};
pub use self::engine::AggregationOptions;

pub mod prelude {
    pub use super::concordance::AggregationSpec;
    pub use super::engine::AggregationOptions;
}
