//! table — labeled dense matrices with multi-level axes.
//!
//! Purpose
//! -------
//! Provide the substrate every other module computes on: [`Index`], an
//! ordered axis of multi-level keys, and [`Table`], an `f64` matrix with a
//! row and a column index. Row predicates for extraction and search live in
//! [`selection`].
//!
//! Key behaviors
//! -------------
//! - Axis-preserving arithmetic with zero-guarded division.
//! - Reindexing with an explicit [`FillPolicy`], failing loudly otherwise.
//! - Level selection and first-appearance group sums.
//! - Order-insensitive approximate equality.
//!
//! Invariants & assumptions
//! ------------------------
//! - Tables are pure values; no operation mutates its receiver.
//! - Level names are significant: axes with different level names never
//!   reconcile, whatever their keys.
//!
//! Conventions
//! -----------
//! - Level names used throughout the crate are collected below
//!   ([`REGION`], [`SECTOR`], [`CATEGORY`], ...).
//! - Structural problems surface as [`TableError`]; callers in `math` and
//!   `system` wrap them into their own error types via `From`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each type and cover construction, alignment
//!   checks, reindexing, grouping and comparison.

pub mod errors;
pub mod index;
pub mod labeled;
pub mod selection;

// ---- Level names ----

pub const REGION: &str = "region";
pub const SECTOR: &str = "sector";
pub const CATEGORY: &str = "category";
pub const STRESSOR: &str = "stressor";
pub const IMPACT: &str = "impact";
pub const INDICATOR: &str = "indicator";

// ---- Single-column labels ----

pub const INDOUT: &str = "indout";
pub const POPULATION: &str = "population";

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{TableError, TableResult};
pub use self::index::{Index, Key, NULL_LABEL};
pub use self::labeled::{FillPolicy, Table};
pub use self::selection::{MatchMode, RowSelector};

pub mod prelude {
    pub use super::errors::{TableError, TableResult};
    pub use super::index::{Index, Key, NULL_LABEL};
    pub use super::labeled::{FillPolicy, Table};
    pub use super::selection::{MatchMode, RowSelector};
    pub use super::{CATEGORY, REGION, SECTOR};
}
