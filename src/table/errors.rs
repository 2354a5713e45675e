//! Unified error handling for the labeled matrix substrate.
//!
//! This module defines `TableError`, the error type raised whenever two
//! label axes cannot be reconciled, a requested key or level is absent, or a
//! row pattern fails to compile. An alias `TableResult<T>` standardizes the
//! return type across the substrate.

/// Unified error type for labeled table operations.
///
/// Covers structural mismatches between axes (shape, level names, key
/// order), missing keys during reindexing, invalid labels and regex
/// compilation failures. Integrates with `anyhow::Error` via `From` and
/// renders readable diagnostics through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    // ---- Construction ----
    /// Data shape does not agree with the attached axes.
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A key carries a different number of labels than the index has levels.
    KeyLength {
        expected: usize,
        actual: usize,
    },

    /// Level-wise construction received levels of unequal length.
    RaggedLevels,

    // ---- Axis reconciliation ----
    /// Level names of two axes differ.
    LevelMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Two axes hold different keys or the same keys in a different order.
    IndexMismatch {
        operation: String,
    },

    /// Keys of the target index are absent from the source and no fill was given.
    MissingKeys {
        keys: Vec<Vec<String>>,
    },

    /// Named level does not exist on the axis.
    UnknownLevel {
        level: String,
    },

    /// Operation requires unique keys on an axis.
    DuplicateKeys {
        keys: Vec<Vec<String>>,
    },

    // ---- Selection ----
    /// Row pattern is not a valid regular expression.
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    // ---- Anyhow catchall ----
    Anyhow(String),
}

pub type TableResult<T> = Result<T, TableError>;

impl From<anyhow::Error> for TableError {
    fn from(err: anyhow::Error) -> Self {
        TableError::Anyhow(err.to_string())
    }
}

impl std::error::Error for TableError {}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Construction ----
            TableError::ShapeMismatch { expected, actual } => write!(
                f,
                "Table Error: Shape mismatch (expected {}x{}, got {}x{})",
                expected.0, expected.1, actual.0, actual.1
            ),
            TableError::KeyLength { expected, actual } => write!(
                f,
                "Table Error: Key has {} labels but the index has {} levels",
                actual, expected
            ),
            TableError::RaggedLevels => {
                write!(f, "Table Error: Index levels have different lengths")
            }

            // ---- Axis reconciliation ----
            TableError::LevelMismatch { expected, actual } => write!(
                f,
                "Table Error: Level names differ (expected {:?}, got {:?})",
                expected, actual
            ),
            TableError::IndexMismatch { operation } => {
                write!(f, "Table Error: Axes are not aligned for {}", operation)
            }
            TableError::MissingKeys { keys } => {
                write!(f, "Table Error: Keys missing from source index: {:?}", keys)
            }
            TableError::UnknownLevel { level } => {
                write!(f, "Table Error: Unknown index level '{}'", level)
            }
            TableError::DuplicateKeys { keys } => {
                write!(f, "Table Error: Duplicate keys on axis: {:?}", keys)
            }

            // ---- Selection ----
            TableError::InvalidPattern { pattern, reason } => {
                write!(f, "Table Error: Invalid pattern '{}': {}", pattern, reason)
            }

            // ---- Anyhow catchall ----
            TableError::Anyhow(msg) => write!(f, "Table Error: {}", msg),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<TableError> for pyo3::PyErr {
    fn from(err: TableError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
