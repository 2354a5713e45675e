//! aggregation::concordance — partition specs and 0/1 aggregation matrices.
//!
//! An [`AggregationSpec`] describes how the labels of one dimension
//! (regions, sectors or final-demand categories) fall into groups. It is
//! resolved against the actual labels into a [`Concordance`]: the ordered
//! group names and a `groups × originals` matrix with exactly one 1 per
//! column.
//!
//! Every spec is validated as a total, non-overlapping partition before it
//! is used; a violation is `SystemError::InvalidAggregation`.
use crate::system::errors::{SystemError, SystemResult};
use crate::table::index::unique_in_order;
use ndarray::Array2;
use std::collections::HashMap;

/// Grouping of one dimension.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AggregationSpec {
    /// Keep every label as its own group.
    #[default]
    Identity,
    /// Everything into one group with the given name.
    Total(String),
    /// One group label per original label, in original order. Groups are
    /// ordered by first appearance unless `order` lists them.
    Groups {
        labels: Vec<String>,
        order: Option<Vec<String>>,
    },
    /// One group number per original label, numbered from zero. Group
    /// names default to a generic prefix with the group number.
    Indices {
        groups: Vec<usize>,
        names: Option<Vec<String>>,
    },
    /// Explicit `groups × originals` 0/1 matrix.
    Matrix {
        matrix: Array2<f64>,
        names: Option<Vec<String>>,
    },
    /// `(original, group)` pairs covering every original label once.
    Mapping(Vec<(String, String)>),
}

impl AggregationSpec {
    pub fn total(name: &str) -> Self {
        AggregationSpec::Total(name.to_string())
    }

    pub fn groups<S: Into<String>>(labels: Vec<S>) -> Self {
        AggregationSpec::Groups { labels: labels.into_iter().map(Into::into).collect(), order: None }
    }

    pub fn indices(groups: Vec<usize>) -> Self {
        AggregationSpec::Indices { groups, names: None }
    }

    pub fn mapping<S: Into<String>>(pairs: Vec<(S, S)>) -> Self {
        AggregationSpec::Mapping(pairs.into_iter().map(|(o, g)| (o.into(), g.into())).collect())
    }
}

/// Resolved grouping of one dimension.
///
/// Fields
/// ------
/// - `groups`: `Vec<String>`
///   Group names, one per matrix row.
/// - `originals`: `Vec<String>`
///   Original labels, one per matrix column.
/// - `matrix`: `Array2<f64>`
///   `groups.len() × originals.len()`, one 1 per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Concordance {
    pub groups: Vec<String>,
    pub originals: Vec<String>,
    pub matrix: Array2<f64>,
}

impl Concordance {
    /// Resolve `spec` for `originals`.
    ///
    /// `dimension` names the dimension in errors, `prefix` is used for
    /// generic group names (`reg0`, `sec1`, ...).
    ///
    /// Errors
    /// ------
    /// - `SystemError::InvalidAggregation` when the spec does not map every
    ///   original label to exactly one non-empty group.
    pub fn from_spec(
        spec: &AggregationSpec, originals: &[String], dimension: &str, prefix: &str,
    ) -> SystemResult<Self> {
        let invalid = |reason: String| SystemError::InvalidAggregation {
            dimension: dimension.to_string(),
            reason,
        };
        let n = originals.len();

        let (assignment, groups): (Vec<usize>, Vec<String>) = match spec {
            AggregationSpec::Identity => ((0..n).collect(), originals.to_vec()),
            AggregationSpec::Total(name) => (vec![0; n], vec![name.clone()]),
            AggregationSpec::Groups { labels, order } => {
                if labels.len() != n {
                    return Err(invalid(format!("{} group labels for {} entries", labels.len(), n)));
                }
                let groups = match order {
                    Some(order) => {
                        let distinct = unique_in_order(order.clone());
                        if distinct.len() != order.len() {
                            return Err(invalid("group order lists a group twice".to_string()));
                        }
                        order.clone()
                    }
                    None => unique_in_order(labels.clone()),
                };
                let lookup: HashMap<&str, usize> =
                    groups.iter().enumerate().map(|(i, g)| (g.as_str(), i)).collect();
                let mut assignment = Vec::with_capacity(n);
                for label in labels {
                    match lookup.get(label.as_str()) {
                        Some(&g) => assignment.push(g),
                        None => return Err(invalid(format!("group '{}' missing from the group order", label))),
                    }
                }
                (assignment, groups)
            }
            AggregationSpec::Indices { groups, names } => {
                if groups.len() != n {
                    return Err(invalid(format!("{} group numbers for {} entries", groups.len(), n)));
                }
                let count = groups.iter().max().map(|m| m + 1).unwrap_or(0);
                let names = group_names(names.as_ref(), count, prefix).map_err(invalid)?;
                (groups.clone(), names)
            }
            AggregationSpec::Matrix { matrix, names } => {
                if matrix.ncols() != n {
                    return Err(invalid(format!("matrix has {} columns for {} entries", matrix.ncols(), n)));
                }
                if matrix.iter().any(|v| *v != 0.0 && *v != 1.0) {
                    return Err(invalid("matrix entries must be 0 or 1".to_string()));
                }
                let mut assignment = Vec::with_capacity(n);
                for (j, col) in matrix.columns().into_iter().enumerate() {
                    let ones: Vec<usize> =
                        col.iter().enumerate().filter(|(_, v)| **v == 1.0).map(|(i, _)| i).collect();
                    if ones.len() != 1 {
                        return Err(invalid(format!(
                            "'{}' belongs to {} groups instead of one",
                            originals[j],
                            ones.len()
                        )));
                    }
                    assignment.push(ones[0]);
                }
                let names = group_names(names.as_ref(), matrix.nrows(), prefix).map_err(invalid)?;
                (assignment, names)
            }
            AggregationSpec::Mapping(pairs) => {
                let mut map: HashMap<&str, &str> = HashMap::new();
                for (original, group) in pairs {
                    if !originals.contains(original) {
                        return Err(invalid(format!("unknown entry '{}'", original)));
                    }
                    if let Some(prev) = map.insert(original.as_str(), group.as_str()) {
                        if prev != group {
                            return Err(invalid(format!("'{}' mapped to '{}' and '{}'", original, prev, group)));
                        }
                    }
                }
                let mut labels = Vec::with_capacity(n);
                for original in originals {
                    match map.get(original.as_str()) {
                        Some(g) => labels.push(g.to_string()),
                        None => return Err(invalid(format!("'{}' is not mapped", original))),
                    }
                }
                let groups = unique_in_order(labels.clone());
                let assignment = labels.iter().filter_map(|l| groups.iter().position(|g| g == l)).collect();
                (assignment, groups)
            }
        };

        let mut members = vec![0usize; groups.len()];
        for g in &assignment {
            members[*g] += 1;
        }
        if let Some(empty) = members.iter().position(|m| *m == 0) {
            return Err(invalid(format!("group '{}' has no members", groups[empty])));
        }
        let distinct = unique_in_order(groups.clone());
        if distinct.len() != groups.len() {
            return Err(invalid("group names are not unique".to_string()));
        }

        Ok(Concordance { matrix: build_agg_matrix(&assignment, groups.len()), groups, originals: originals.to_vec() })
    }

    pub fn ngroups(&self) -> usize {
        self.groups.len()
    }

    /// Group position of every original label.
    pub fn assignment(&self) -> Vec<usize> {
        self.matrix
            .columns()
            .into_iter()
            .map(|c| c.iter().position(|v| *v == 1.0).unwrap_or(0))
            .collect()
    }

    /// True when every label stays its own group under the same name.
    pub fn is_identity(&self) -> bool {
        self.groups == self.originals
    }
}

/// `ngroups × assignment.len()` matrix with a 1 at `(assignment[j], j)`.
pub fn build_agg_matrix(assignment: &[usize], ngroups: usize) -> Array2<f64> {
    let mut m = Array2::<f64>::zeros((ngroups, assignment.len()));
    for (j, g) in assignment.iter().enumerate() {
        if *g < ngroups {
            m[[*g, j]] = 1.0;
        }
    }
    m
}

fn group_names(names: Option<&Vec<String>>, count: usize, prefix: &str) -> Result<Vec<String>, String> {
    match names {
        Some(names) if names.len() == count => Ok(names.clone()),
        Some(names) => Err(format!("{} group names for {} groups", names.len(), count)),
        None => Ok((0..count).map(|i| format!("{}{}", prefix, i)).collect()),
    }
}
