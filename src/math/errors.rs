//! Unified error handling for the accounting math.
//!
//! `MathError` covers the failures of the pure IO identities: structural
//! problems inherited from the table substrate, non-invertible systems and
//! block layouts that do not fit the region × sector structure. An alias
//! `MathResult<T>` standardizes the return type across `math`.
use crate::table::TableError;

/// Unified error type for accounting math.
#[derive(Debug, Clone, PartialEq)]
pub enum MathError {
    // ---- Structure ----
    /// Axis mismatch or missing level reported by the table substrate.
    Table(TableError),

    /// Rows of a blocked table are not a multiple of the block size.
    BlockSize {
        rows: usize,
        block: usize,
    },

    // ---- Linear algebra ----
    /// `(I - A)` or `(I - B)` (or another inverted table) is singular.
    SingularMatrix {
        table: String,
    },

    /// Matrix to invert is not square.
    NotSquare {
        table: String,
        shape: (usize, usize),
    },

    // ---- Anyhow catchall ----
    Anyhow(String),
}

pub type MathResult<T> = Result<T, MathError>;

impl From<TableError> for MathError {
    fn from(err: TableError) -> Self {
        MathError::Table(err)
    }
}

impl From<anyhow::Error> for MathError {
    fn from(err: anyhow::Error) -> Self {
        MathError::Anyhow(err.to_string())
    }
}

impl std::error::Error for MathError {}

impl std::fmt::Display for MathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Structure ----
            MathError::Table(err) => write!(f, "Math Error: {}", err),
            MathError::BlockSize { rows, block } => write!(
                f,
                "Math Error: {} rows cannot be split into blocks of {}",
                rows, block
            ),

            // ---- Linear algebra ----
            MathError::SingularMatrix { table } => {
                write!(f, "Math Error: Matrix for {} is singular and cannot be inverted", table)
            }
            MathError::NotSquare { table, shape } => write!(
                f,
                "Math Error: Matrix for {} is not square ({}x{})",
                table, shape.0, shape.1
            ),

            // ---- Anyhow catchall ----
            MathError::Anyhow(msg) => write!(f, "Math Error: {}", msg),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<MathError> for pyo3::PyErr {
    fn from(err: MathError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
