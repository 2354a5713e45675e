//! restructure — relabeling, extraction, concatenation and conversion.
//!
//! Purpose
//! -------
//! Reshape the classifications of a system and the row axes of its
//! extensions without aggregating the economic core.
//!
//! Key behaviors
//! -------------
//! - [`rename`]: bijective renames of regions, sectors and final-demand
//!   categories across every table ([`RenameSpec`]).
//! - [`extract`]: row subsets of one or all extensions ([`ExtractOptions`],
//!   [`ExtractReturn`]).
//! - [`concat`]: stacking extensions with harmonized row levels
//!   ([`extension_concate`]).
//! - [`convert`]: regex bridges mapping extension rows onto new keys
//!   ([`ConversionBridge`], [`ConvertOptions`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Renames never merge labels; a rename that would is rejected.
//! - Operations on an `IOSystem` either apply completely or leave it as it was.
//! - Recoverable losses (unbridged rows, rows outside a target order) are
//!   reported in the returned [`ConvertReport`] and logged with `tracing`.

pub mod concat;
pub mod convert;
pub mod extract;
pub mod rename;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::concat::extension_concate;
pub use self::convert::{BridgeRow, ConversionBridge, ConvertOptions, ConvertReport};
pub use self::extract::{ExtractOptions, ExtractResult, ExtractReturn, SystemExtract};
pub use self::rename::RenameSpec;

pub mod prelude {
    pub use super::concat::extension_concate;
    pub use super::convert::{BridgeRow, ConversionBridge, ConvertOptions};
    pub use super::extract::{ExtractOptions, ExtractReturn};
    pub use super::rename::RenameSpec;
}
