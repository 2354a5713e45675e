//! system — the stateful MRIO model: core tables, extensions, history.
//!
//! Purpose
//! -------
//! Tie the pure accounting functions of `math` to a model that knows which
//! tables are present, which can be derived, and in which order. This is
//! the object every restructuring operation reads and returns.
//!
//! Key behaviors
//! -------------
//! - [`IOSystem`]: economic core plus named [`Extension`]s in insertion
//!   order, unit and population tables, and an [`EventLog`].
//! - Explicit table tags ([`SystemTable`], [`ExtensionTable`]) with typed
//!   accessors and lookup by conventional name.
//! - Completeness queries (`missing_derivable`) and dependency-ordered,
//!   idempotent calculation.
//! - Resets to flows, to coefficients, or fully.
//!
//! Invariants & assumptions
//! ------------------------
//! - One `(region, sector)` axis, identically ordered, across all core
//!   tables and all extension tables that use it.
//! - Failing operations leave the system unchanged.
//!
//! Conventions
//! -----------
//! - All fallible operations return [`SystemResult`]; lower-layer errors
//!   arrive wrapped as `SystemError::Table` or `SystemError::Math`.
//! - Options are plain structs with `Default` ([`CalcOptions`],
//!   [`ResetOptions`]).
//!
//! Downstream usage
//! ----------------
//! - `aggregation`, `restructure` and `characterization` add further
//!   `impl IOSystem` / `impl Extension` blocks on top of these types.
//!
//! Testing notes
//! -------------
//! - Unit tests per file; the end-to-end pipeline lives in `tests/`.

pub mod errors;
pub mod events;
pub mod extension;
pub mod iosystem;
pub mod options;
pub mod tables;
pub mod units;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{SystemError, SystemResult};
pub use self::events::{Event, EventKind, EventLog};
pub use self::extension::{CalcContext, Extension};
pub use self::iosystem::{FindResult, IOSystem};
pub use self::options::{CalcOptions, ResetOptions};
pub use self::tables::{ExtensionTable, SystemTable};
pub use self::units::Units;

pub mod prelude {
    pub use super::errors::{SystemError, SystemResult};
    pub use super::extension::Extension;
    pub use super::iosystem::IOSystem;
    pub use super::options::{CalcOptions, ResetOptions};
    pub use super::tables::{ExtensionTable, SystemTable};
}
