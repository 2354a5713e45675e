//! characterization — impact assessment of extension stressors.
//!
//! Purpose
//! -------
//! Weight the stressor rows of extensions with characterization factors
//! and sum them into impact categories (global warming potential,
//! acidification, ...).
//!
//! Key behaviors
//! -------------
//! - [`factors`]: long-format factor tables ([`CharacterizationTable`])
//!   with optional region, sector and extension scope, and the explicit
//!   [`FactorPrecedence`] between region-only and sector-only factors.
//! - [`validation`]: unit consistency and coverage report
//!   ([`CharacterizationValidation`]).
//! - [`engine`]: `Extension::characterize` and
//!   `IOSystem::extension_characterize` ([`CharacterizationOptions`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Characterization is linear: scaling the stressors scales the impacts.
//! - A factor names a label for every row level of the extension it is
//!   applied to.
//! - Missing factors, stressors, regions or sectors contribute zero and
//!   are reported; inconsistent units produce no result.
//!
//! Testing notes
//! -------------
//! - Linearity and identity bridges are property-tested in
//!   `tests/proptest_aggregation.rs`.

pub mod engine;
pub mod factors;
pub mod validation;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::engine::{CharacterizationOptions, CharacterizationOutcome};
pub use self::factors::{CharacterizationFactor, CharacterizationTable, FactorLookup, FactorPrecedence};
pub use self::validation::{CharacterizationValidation, StressorUnitMismatch};

pub mod prelude {
    pub use super::engine::CharacterizationOptions;
    pub use super::factors::{CharacterizationFactor, CharacterizationTable, FactorPrecedence};
}
