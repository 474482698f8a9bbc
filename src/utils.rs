// src/utils.rs
use crate::core::{Result, RfiError, SampleTable};
use ndarray::Array3;
use std::fmt;

/// Order- and duplicate-insensitive identity of a feature set.
///
/// Holds the sorted, deduplicated identifiers, which is also the canonical
/// column order used when a set is materialized as a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FeatureSetKey(Vec<String>);

impl FeatureSetKey {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = features
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        names.sort_unstable();
        names.dedup();
        FeatureSetKey(names)
    }

    /// Identifiers in canonical (sorted) order.
    pub fn features(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|probe| probe.as_str().cmp(name)).is_ok()
    }

    pub fn is_subset_of(&self, other: &FeatureSetKey) -> bool {
        self.0.iter().all(|name| other.contains(name))
    }
}

impl fmt::Display for FeatureSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// Canonical key of a feature set.
pub fn key<I, S>(features: I) -> FeatureSetKey
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    FeatureSetKey::new(features)
}

/// Positions of each of `subset` within `superset`, in `subset` order.
pub fn fset_to_ix<S: AsRef<str>, T: AsRef<str>>(superset: &[S], subset: &[T]) -> Result<Vec<usize>> {
    subset
        .iter()
        .map(|name| {
            let name = name.as_ref();
            superset
                .iter()
                .position(|s| s.as_ref() == name)
                .ok_or_else(|| {
                    RfiError::Validation(format!("Feature '{}' not found in feature set.", name))
                })
        })
        .collect()
}

/// Lays a `(num_samples, observations, features)` block out as a table.
///
/// Rows are sample-major: row `s * observations + i` holds `block[[s, i, ..]]`
/// and is labelled `(s, i)`.
pub fn encode_samples(block: Array3<f64>, columns: Vec<String>) -> Result<SampleTable> {
    let (num_samples, num_obs, num_features) = block.dim();

    if num_features != columns.len() {
        return Err(RfiError::Shape {
            shape: block.shape().to_vec(),
            reason: format!(
                "sample block has {} feature columns but {} names were given",
                num_features,
                columns.len()
            ),
        });
    }

    let values = block
        .as_standard_layout()
        .into_owned()
        .into_shape((num_samples * num_obs, num_features))?;

    let index = (0..num_samples)
        .flat_map(|s| (0..num_obs).map(move |i| (s, i)))
        .collect();

    Ok(SampleTable::from_parts(index, columns, values, num_obs))
}
