//! Unified error handling for systems, extensions and their transforms.
//!
//! `SystemError` is shared by the system model and by the aggregation,
//! restructuring and characterization engines, which all operate on an
//! `IOSystem` or `Extension`. Structural and numeric failures from lower
//! layers are wrapped through `From`. An alias `SystemResult<T>`
//! standardizes the return type.
use crate::math::MathError;
use crate::table::TableError;

/// Unified error type for system-level operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemError {
    // ---- Lower layers ----
    /// Structural mismatch from the table substrate.
    Table(TableError),

    /// Numeric failure from the accounting math (e.g. singular `I - A`).
    Math(MathError),

    // ---- Completeness ----
    /// Tables required for a calculation are absent.
    Underdetermined {
        operation: String,
        missing: Vec<String>,
    },

    /// Reset would leave the system without a basis for recomputation.
    ResetNotPossible {
        missing: Vec<String>,
    },

    // ---- Extensions ----
    UnknownExtension {
        name: String,
    },

    DuplicateExtension {
        name: String,
    },

    /// Unknown table name in a by-name lookup.
    UnknownTable {
        name: String,
    },

    // ---- Aggregation ----
    /// Mapping is not a total, non-overlapping partition.
    InvalidAggregation {
        dimension: String,
        reason: String,
    },

    /// Aggregation of tables with mixed units.
    HybridUnits {
        units: Vec<String>,
    },

    // ---- Restructuring ----
    /// Rename would merge distinct labels.
    RenameCollision {
        level: String,
        label: String,
    },

    /// Positional rename with a different number of labels than exist.
    RenameLength {
        level: String,
        expected: usize,
        found: usize,
    },

    /// Conversion bridge is malformed or contradicts the extension.
    InvalidBridge {
        reason: String,
    },

    /// Units in a bridge disagree with the extension.
    UnitMismatch {
        row: Vec<String>,
        expected: String,
        found: String,
    },

    // ---- Characterization ----
    /// Region-only and sector-only factors both apply and precedence is strict.
    AmbiguousCharacterization {
        stressor: Vec<String>,
        impact: String,
        region: String,
        sector: String,
    },

    InvalidCharacterization {
        reason: String,
    },

    // ---- Anyhow catchall ----
    Anyhow(String),
}

pub type SystemResult<T> = Result<T, SystemError>;

impl From<TableError> for SystemError {
    fn from(err: TableError) -> Self {
        SystemError::Table(err)
    }
}

impl From<MathError> for SystemError {
    fn from(err: MathError) -> Self {
        SystemError::Math(err)
    }
}

impl From<anyhow::Error> for SystemError {
    fn from(err: anyhow::Error) -> Self {
        SystemError::Anyhow(err.to_string())
    }
}

impl std::error::Error for SystemError {}

impl std::fmt::Display for SystemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Lower layers ----
            SystemError::Table(err) => write!(f, "System Error: {}", err),
            SystemError::Math(err) => write!(f, "System Error: {}", err),

            // ---- Completeness ----
            SystemError::Underdetermined { operation, missing } => write!(
                f,
                "System Error: Cannot perform {} - missing tables {:?}",
                operation, missing
            ),
            SystemError::ResetNotPossible { missing } => write!(
                f,
                "System Error: Too few tables to recalculate the system after reset ({:?} missing) - force the reset to proceed anyway",
                missing
            ),

            // ---- Extensions ----
            SystemError::UnknownExtension { name } => {
                write!(f, "System Error: No extension named '{}'", name)
            }
            SystemError::DuplicateExtension { name } => {
                write!(f, "System Error: Extension '{}' already exists", name)
            }
            SystemError::UnknownTable { name } => {
                write!(f, "System Error: Unknown table '{}'", name)
            }

            // ---- Aggregation ----
            SystemError::InvalidAggregation { dimension, reason } => {
                write!(f, "System Error: Invalid {} aggregation: {}", dimension, reason)
            }
            SystemError::HybridUnits { units } => write!(
                f,
                "System Error: Aggregation not possible for hybrid tables (units {:?})",
                units
            ),

            // ---- Restructuring ----
            SystemError::RenameCollision { level, label } => write!(
                f,
                "System Error: Renaming {} would merge distinct labels into '{}'",
                level, label
            ),
            SystemError::RenameLength { level, expected, found } => write!(
                f,
                "System Error: Renaming {} needs {} labels, got {}",
                level, expected, found
            ),
            SystemError::InvalidBridge { reason } => {
                write!(f, "System Error: Invalid conversion bridge: {}", reason)
            }
            SystemError::UnitMismatch { row, expected, found } => write!(
                f,
                "System Error: Unit of row {:?} is '{}' but the bridge states '{}'",
                row, expected, found
            ),

            // ---- Characterization ----
            SystemError::AmbiguousCharacterization { stressor, impact, region, sector } => write!(
                f,
                "System Error: Both region-specific and sector-specific factors apply to {:?} -> {} at ({}, {})",
                stressor, impact, region, sector
            ),
            SystemError::InvalidCharacterization { reason } => {
                write!(f, "System Error: Invalid characterization table: {}", reason)
            }

            // ---- Anyhow catchall ----
            SystemError::Anyhow(msg) => write!(f, "System Error: {}", msg),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<SystemError> for pyo3::PyErr {
    fn from(err: SystemError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
