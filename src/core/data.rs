// src/core/data.rs
use crate::core::{Result, RfiError};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::collections::HashSet;
use std::fmt;

/// A table of observations (rows) by named features (columns).
///
/// Used both for the reference data a sampler is built on and for the test
/// data it samples for. Values are `f64`; categorical features are expected
/// to be numerically encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Dataset {
    pub fn new<S: Into<String>>(columns: Vec<S>, values: Array2<f64>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if columns.len() != values.ncols() {
            return Err(RfiError::Validation(format!(
                "Dataset has {} column names but {} value columns.",
                columns.len(),
                values.ncols()
            )));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(RfiError::Validation(format!(
                    "Duplicate column name '{}' in dataset.",
                    name
                )));
            }
        }

        Ok(Dataset { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name)
            .map(|idx| self.values.column(idx))
    }

    /// Copies the named columns, in the order given, into a new 2D block
    /// (observations x names.len()).
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>> {
        let indices = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column_index(name).ok_or_else(|| {
                    RfiError::Validation(format!(
                        "Feature '{}' is not a column of the dataset.",
                        name
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(self.values.select(Axis(1), &indices))
    }
}

/// Sampled values laid out as a table with a composite `(sample, observation)`
/// row index.
///
/// Rows are ordered sample-major: all observations for sample 0, then all
/// observations for sample 1, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    index: Vec<(usize, usize)>,
    columns: Vec<String>,
    values: Array2<f64>,
    num_observations: usize,
}

impl SampleTable {
    pub(crate) fn from_parts(
        index: Vec<(usize, usize)>,
        columns: Vec<String>,
        values: Array2<f64>,
        num_observations: usize,
    ) -> Self {
        SampleTable {
            index,
            columns,
            values,
            num_observations,
        }
    }

    /// The `(sample, observation)` label of every row.
    pub fn index(&self) -> &[(usize, usize)] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn num_observations(&self) -> usize {
        self.num_observations
    }

    pub fn num_samples(&self) -> usize {
        if self.num_observations == 0 {
            0
        } else {
            self.nrows() / self.num_observations
        }
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.values.column(idx))
    }

    /// Values of the row labelled `(sample, observation)`.
    pub fn row(&self, sample: usize, observation: usize) -> Option<ArrayView1<'_, f64>> {
        if observation >= self.num_observations || sample >= self.num_samples() {
            return None;
        }
        Some(self.values.row(sample * self.num_observations + observation))
    }

    /// All rows belonging to one sample index, in observation order.
    pub fn sample_block(&self, sample: usize) -> Option<ArrayView2<'_, f64>> {
        if sample >= self.num_samples() {
            return None;
        }
        let start = sample * self.num_observations;
        Some(
            self.values
                .slice(ndarray::s![start..start + self.num_observations, ..]),
        )
    }
}

impl fmt::Display for SampleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8} {:>8}", "sample", "i")?;
        for name in &self.columns {
            write!(f, " {:>10}", name)?;
        }
        writeln!(f)?;
        for ((sample, obs), row) in self.index.iter().zip(self.values.rows()) {
            write!(f, "{:>8} {:>8}", sample, obs)?;
            for val in row.iter() {
                write!(f, " {:>10.4}", val)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
