//! Option structs for calculation and reset.
use crate::table::Table;

/// CalcOptions — switches for `calc_system`, `calc_extensions` and `calc_all`.
///
/// Fields
/// ------
/// - `include_ghosh`: `bool`
///   Also compute `B`, `G` and the downstream multipliers `M_down`.
/// - `y_agg`: `Option<Table>`
///   Final demand per consuming region (rows: region × sector, columns:
///   region) used for the consumption-based accounts. Defaults to `Y`
///   summed over categories; supply a subset (e.g. households only) to
///   restrict the footprint.
/// - `extensions`: `Option<Vec<String>>`
///   Restrict extension calculation to these names; `None` means all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalcOptions {
    pub include_ghosh: bool,
    pub y_agg: Option<Table>,
    pub extensions: Option<Vec<String>>,
}

impl CalcOptions {
    pub fn new(include_ghosh: bool) -> Self {
        CalcOptions { include_ghosh, ..Default::default() }
    }

    pub fn with_y_agg(mut self, y_agg: Table) -> Self {
        self.y_agg = Some(y_agg);
        self
    }

    pub fn with_extensions<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        self.extensions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn includes_extension(&self, name: &str) -> bool {
        match &self.extensions {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

/// ResetOptions — `force` proceeds (with a warning) when a reset would
/// leave too few tables to recalculate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetOptions {
    pub force: bool,
}

impl ResetOptions {
    pub fn forced() -> Self {
        ResetOptions { force: true }
    }
}
