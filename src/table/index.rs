//! table::index — ordered multi-level label axes.
//!
//! Purpose
//! -------
//! Represent one axis of a labeled table: an ordered sequence of keys, each
//! key a tuple of string labels with one label per named level (for example
//! `("region", "sector")`). Every higher component addresses rows and
//! columns exclusively through this type.
//!
//! Key behaviors
//! -------------
//! - Construct axes from explicit keys ([`Index::new`]), from a single list
//!   of labels ([`Index::single`]) or as a cartesian product of level
//!   values ([`Index::product`]), first level varying slowest.
//! - Query level positions, level values and the unique values of a level
//!   in first-appearance order.
//! - Group keys by one level or by the full key, preserving the order in
//!   which groups first appear.
//! - Relabel, reorder or extend levels, filling missing levels with
//!   [`NULL_LABEL`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Every key has exactly `names.len()` labels.
//! - Keys may repeat; operations needing unique keys say so and return
//!   [`TableError::DuplicateKeys`].
//!
//! Conventions
//! -----------
//! - Key order is significant. [`Index::same_order`] compares keys in
//!   order, [`Index::same_labels`] compares them as sets.
use crate::table::errors::{TableError, TableResult};
use std::collections::{HashMap, HashSet};

/// One multi-level label tuple.
pub type Key = Vec<String>;

/// Placeholder label for a level a key does not carry.
pub const NULL_LABEL: &str = "";

/// Index — ordered, named, multi-level label axis.
///
/// Fields
/// ------
/// - `names`: `Vec<String>`
///   Level names, outermost first.
/// - `keys`: `Vec<Key>`
///   Keys in axis order; each has `names.len()` labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    names: Vec<String>,
    keys: Vec<Key>,
}

impl Index {
    /// Build an index from level names and full keys.
    ///
    /// Errors
    /// ------
    /// - `TableError::KeyLength` when a key does not carry one label per level.
    pub fn new<S: Into<String>>(names: Vec<S>, keys: Vec<Key>) -> TableResult<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for key in &keys {
            if key.len() != names.len() {
                return Err(TableError::KeyLength { expected: names.len(), actual: key.len() });
            }
        }
        Ok(Index { names, keys })
    }

    /// Single-level index from a list of labels.
    pub fn single<S, I, L>(name: S, labels: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Index {
            names: vec![name.into()],
            keys: labels.into_iter().map(|l| vec![l.into()]).collect(),
        }
    }

    /// Cartesian product of level values; the first level varies slowest.
    ///
    /// Errors
    /// ------
    /// - `TableError::KeyLength` when the number of names differs from the
    ///   number of level value lists.
    pub fn product<S: AsRef<str>>(names: &[S], levels: &[Vec<String>]) -> TableResult<Self> {
        if names.len() != levels.len() {
            return Err(TableError::KeyLength { expected: names.len(), actual: levels.len() });
        }
        let mut keys: Vec<Key> = vec![Vec::new()];
        for level in levels {
            let mut next = Vec::with_capacity(keys.len() * level.len());
            for prefix in &keys {
                for label in level {
                    let mut key = prefix.clone();
                    key.push(label.clone());
                    next.push(key);
                }
            }
            keys = next;
        }
        if levels.is_empty() {
            keys.clear();
        }
        Ok(Index { names: names.iter().map(|n| n.as_ref().to_string()).collect(), keys })
    }

    /// Build an index from level-wise label columns of equal length.
    pub fn from_levels<S: Into<String>>(names: Vec<S>, levels: Vec<Vec<String>>) -> TableResult<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != levels.len() {
            return Err(TableError::KeyLength { expected: names.len(), actual: levels.len() });
        }
        let n = levels.first().map(|l| l.len()).unwrap_or(0);
        if levels.iter().any(|l| l.len() != n) {
            return Err(TableError::RaggedLevels);
        }
        let keys = (0..n).map(|i| levels.iter().map(|l| l[i].clone()).collect()).collect();
        Ok(Index { names, keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn nlevels(&self) -> usize {
        self.names.len()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key(&self, pos: usize) -> Option<&Key> {
        self.keys.get(pos)
    }

    pub fn has_level(&self, level: &str) -> bool {
        self.names.iter().any(|n| n == level)
    }

    /// Position of a named level.
    pub fn level_position(&self, level: &str) -> TableResult<usize> {
        self.names
            .iter()
            .position(|n| n == level)
            .ok_or_else(|| TableError::UnknownLevel { level: level.to_string() })
    }

    /// Label of `level` for every key, in axis order.
    pub fn level_values(&self, level: &str) -> TableResult<Vec<String>> {
        let pos = self.level_position(level)?;
        Ok(self.keys.iter().map(|k| k[pos].clone()).collect())
    }

    /// Distinct labels of `level` in order of first appearance.
    pub fn unique_level_values(&self, level: &str) -> TableResult<Vec<String>> {
        let values = self.level_values(level)?;
        Ok(unique_in_order(values))
    }

    /// Position of the first occurrence of `key`.
    pub fn position(&self, key: &[String]) -> Option<usize> {
        self.keys.iter().position(|k| k.as_slice() == key)
    }

    pub fn contains(&self, key: &[String]) -> bool {
        self.position(key).is_some()
    }

    /// Map from key to its first position.
    pub fn position_map(&self) -> HashMap<&[String], usize> {
        let mut map = HashMap::with_capacity(self.keys.len());
        for (pos, key) in self.keys.iter().enumerate() {
            map.entry(key.as_slice()).or_insert(pos);
        }
        map
    }

    /// Keys that occur more than once, each reported once.
    pub fn duplicated_keys(&self) -> Vec<Key> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut dups = Vec::new();
        for key in &self.keys {
            if !seen.insert(key) && reported.insert(key) {
                dups.push(key.clone());
            }
        }
        dups
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicated_keys().is_empty()
    }

    /// Fail with `DuplicateKeys` unless every key is unique.
    pub fn ensure_unique(&self) -> TableResult<()> {
        let dups = self.duplicated_keys();
        if dups.is_empty() {
            Ok(())
        } else {
            Err(TableError::DuplicateKeys { keys: dups })
        }
    }

    /// Identical level names and identical keys in identical order.
    pub fn same_order(&self, other: &Index) -> bool {
        self == other
    }

    /// Identical level names and the same set of keys, order ignored.
    pub fn same_labels(&self, other: &Index) -> bool {
        if self.names != other.names || self.keys.len() != other.keys.len() {
            return false;
        }
        let mine: HashSet<&Key> = self.keys.iter().collect();
        let theirs: HashSet<&Key> = other.keys.iter().collect();
        mine == theirs
    }

    /// Fail with `LevelMismatch` unless level names equal `expected`.
    pub fn ensure_names<S: AsRef<str>>(&self, expected: &[S]) -> TableResult<()> {
        let matches = self.names.len() == expected.len()
            && self.names.iter().zip(expected).all(|(a, b)| a == b.as_ref());
        if matches {
            Ok(())
        } else {
            Err(TableError::LevelMismatch {
                expected: expected.iter().map(|s| s.as_ref().to_string()).collect(),
                actual: self.names.clone(),
            })
        }
    }

    /// Sub-index of the keys at `positions`, in the given order.
    pub fn select(&self, positions: &[usize]) -> Index {
        Index {
            names: self.names.clone(),
            keys: positions.iter().filter_map(|&p| self.keys.get(p).cloned()).collect(),
        }
    }

    /// Same keys under new level names.
    pub fn with_names<S: Into<String>>(&self, names: Vec<S>) -> TableResult<Index> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.names.len() {
            return Err(TableError::KeyLength { expected: self.names.len(), actual: names.len() });
        }
        Ok(Index { names, keys: self.keys.clone() })
    }

    /// Replace labels of one level through `map`; unmapped labels are kept.
    pub fn rename_labels(&self, level: &str, map: &HashMap<String, String>) -> TableResult<Index> {
        let pos = self.level_position(level)?;
        let keys = self
            .keys
            .iter()
            .map(|k| {
                let mut key = k.clone();
                if let Some(new) = map.get(&key[pos]) {
                    key[pos] = new.clone();
                }
                key
            })
            .collect();
        Ok(Index { names: self.names.clone(), keys })
    }

    /// Reorder and extend levels to `names`.
    ///
    /// Levels of `self` absent from `names` are an error; levels of `names`
    /// absent from `self` are filled with [`NULL_LABEL`].
    pub fn conform_levels<S: AsRef<str>>(&self, names: &[S]) -> TableResult<Index> {
        for own in &self.names {
            if !names.iter().any(|n| n.as_ref() == own) {
                return Err(TableError::LevelMismatch {
                    expected: names.iter().map(|n| n.as_ref().to_string()).collect(),
                    actual: self.names.clone(),
                });
            }
        }
        let source: Vec<Option<usize>> =
            names.iter().map(|n| self.names.iter().position(|o| o == n.as_ref())).collect();
        let keys = self
            .keys
            .iter()
            .map(|k| {
                source
                    .iter()
                    .map(|s| match s {
                        Some(p) => k[*p].clone(),
                        None => NULL_LABEL.to_string(),
                    })
                    .collect()
            })
            .collect();
        Ok(Index { names: names.iter().map(|n| n.as_ref().to_string()).collect(), keys })
    }

    /// Append the keys of all `others`; level names must agree.
    pub fn concat(&self, others: &[&Index]) -> TableResult<Index> {
        let mut keys = self.keys.clone();
        for other in others {
            other.ensure_names(&self.names)?;
            keys.extend(other.keys.iter().cloned());
        }
        Ok(Index { names: self.names.clone(), keys })
    }

    /// Group keys by one level.
    ///
    /// Returns the single-level index of group labels (first appearance
    /// order) and, for every key, the position of its group.
    pub fn group_by_level(&self, level: &str) -> TableResult<(Index, Vec<usize>)> {
        let pos = self.level_position(level)?;
        let mut groups: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut assignment = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let label = &key[pos];
            let g = match lookup.get(label) {
                Some(g) => *g,
                None => {
                    groups.push(label.clone());
                    lookup.insert(label.clone(), groups.len() - 1);
                    groups.len() - 1
                }
            };
            assignment.push(g);
        }
        Ok((Index::single(level, groups), assignment))
    }

    /// Group identical keys; returns the deduplicated index and assignments.
    pub fn group_duplicates(&self) -> (Index, Vec<usize>) {
        let mut unique: Vec<Key> = Vec::new();
        let mut lookup: HashMap<Key, usize> = HashMap::new();
        let mut assignment = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let g = match lookup.get(key) {
                Some(g) => *g,
                None => {
                    unique.push(key.clone());
                    lookup.insert(key.clone(), unique.len() - 1);
                    unique.len() - 1
                }
            };
            assignment.push(g);
        }
        (Index { names: self.names.clone(), keys: unique }, assignment)
    }
}

/// Distinct values in order of first appearance.
pub fn unique_in_order<T: Clone + Eq + std::hash::Hash>(values: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
