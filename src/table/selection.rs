//! table::selection — row predicates over multi-level indices.
//!
//! Rows are selected either by an explicit list of keys or by string
//! patterns per level. Pattern matching follows four modes:
//!
//! - `Exact`: label equals the pattern literally.
//! - `Contains`: the regex matches anywhere in the label.
//! - `Match`: the regex matches at the start of the label.
//! - `FullMatch`: the regex matches the whole label.
//!
//! With per-level patterns a row is selected when every pattern whose
//! level exists on the index matches; patterns naming absent levels are
//! ignored. A `find_all` pattern instead selects rows where any level
//! matches. A selector with no applicable pattern selects nothing and
//! emits a `debug` event naming the levels it looked for.
use crate::table::{
    errors::{TableError, TableResult},
    index::{Index, Key},
};
use regex::Regex;

/// Matching semantics for string patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Contains,
    Match,
    FullMatch,
}

/// Predicate over the rows of an [`Index`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowSelector {
    /// Explicit keys; all must exist, result follows the given order.
    Keys(Vec<Key>),
    /// Patterns per level (conjunction) or over all levels (disjunction).
    Pattern {
        mode: MatchMode,
        find_all: Option<String>,
        levels: Vec<(String, String)>,
    },
}

impl RowSelector {
    pub fn keys(keys: Vec<Key>) -> Self {
        RowSelector::Keys(keys)
    }

    /// Empty pattern selector; add constraints with [`RowSelector::level`].
    pub fn pattern(mode: MatchMode) -> Self {
        RowSelector::Pattern { mode, find_all: None, levels: Vec::new() }
    }

    /// Select rows where any level matches `pattern`.
    pub fn find_all(mode: MatchMode, pattern: &str) -> Self {
        RowSelector::Pattern { mode, find_all: Some(pattern.to_string()), levels: Vec::new() }
    }

    /// Add a constraint on one level. No effect on a `Keys` selector.
    pub fn level(mut self, level: &str, pattern: &str) -> Self {
        if let RowSelector::Pattern { levels, .. } = &mut self {
            levels.push((level.to_string(), pattern.to_string()));
        }
        self
    }

    /// Matched row positions.
    ///
    /// Errors
    /// ------
    /// - `TableError::MissingKeys` when an explicit key is absent.
    /// - `TableError::InvalidPattern` when a regex fails to compile.
    pub fn select(&self, index: &Index) -> TableResult<Vec<usize>> {
        match self {
            RowSelector::Keys(keys) => {
                let lookup = index.position_map();
                let mut positions = Vec::with_capacity(keys.len());
                let mut missing = Vec::new();
                for k in keys {
                    match lookup.get(k.as_slice()) {
                        Some(p) => positions.push(*p),
                        None => missing.push(k.clone()),
                    }
                }
                if missing.is_empty() {
                    Ok(positions)
                } else {
                    Err(TableError::MissingKeys { keys: missing })
                }
            }
            RowSelector::Pattern { mode, find_all, levels } => match find_all {
                Some(pattern) => {
                    let matcher = LabelMatcher::new(*mode, pattern)?;
                    Ok(index
                        .keys()
                        .iter()
                        .enumerate()
                        .filter(|(_, k)| k.iter().any(|label| matcher.is_match(label)))
                        .map(|(i, _)| i)
                        .collect())
                }
                None => {
                    let mut applicable = Vec::new();
                    for (level, pattern) in levels {
                        if let Ok(pos) = index.level_position(level) {
                            applicable.push((pos, LabelMatcher::new(*mode, pattern)?));
                        }
                    }
                    if applicable.is_empty() {
                        tracing::debug!(
                            target: "rust_mrio",
                            "Row pattern on levels {:?} matches nothing: index has levels {:?}",
                            levels.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>(),
                            index.names()
                        );
                        return Ok(Vec::new());
                    }
                    Ok(index
                        .keys()
                        .iter()
                        .enumerate()
                        .filter(|(_, k)| applicable.iter().all(|(pos, m)| m.is_match(&k[*pos])))
                        .map(|(i, _)| i)
                        .collect())
                }
            },
        }
    }

    /// Matched keys, in the order [`RowSelector::select`] returns them.
    pub fn matched_keys(&self, index: &Index) -> TableResult<Vec<Key>> {
        Ok(self.select(index)?.into_iter().filter_map(|p| index.key(p).cloned()).collect())
    }
}

/// Compiled single-label matcher.
#[derive(Debug, Clone)]
pub enum LabelMatcher {
    Exact(String),
    Regex(Regex),
}

impl LabelMatcher {
    pub fn new(mode: MatchMode, pattern: &str) -> TableResult<Self> {
        let source = match mode {
            MatchMode::Exact => return Ok(LabelMatcher::Exact(pattern.to_string())),
            MatchMode::Contains => pattern.to_string(),
            MatchMode::Match => format!("^(?:{})", pattern),
            MatchMode::FullMatch => format!("^(?:{})$", pattern),
        };
        Regex::new(&source).map(LabelMatcher::Regex).map_err(|e| TableError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn is_match(&self, label: &str) -> bool {
        match self {
            LabelMatcher::Exact(s) => s == label,
            LabelMatcher::Regex(re) => re.is_match(label),
        }
    }
}
