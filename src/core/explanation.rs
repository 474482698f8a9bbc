// src/core/explanation.rs
use crate::core::{Result, RfiError};
use ndarray::{Array1, Array2, Array4, ArrayD, Axis, Ix4};
use std::fmt;

/// Relative feature importance results for one importance computation.
///
/// Holds the loss tensor indexed `[feature, run, observation, ordering]`
/// and exposes aggregated views of it. All aggregation methods are pure.
#[derive(Debug, Clone)]
pub struct Explanation {
    fsoi: Vec<String>,
    fsoi_names: Vec<String>,
    lss: Array4<f64>,
    ex_name: String,
}

/// One feature's headline statistics, as returned by [`Explanation::ranked`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

impl Explanation {
    /// Builds an explanation from the features of interest and their loss tensor.
    ///
    /// `lss` must have 3 axes `(feature, run, observation)` or 4 axes
    /// `(feature, run, observation, ordering)`; a 3-axis tensor gets a
    /// singleton ordering axis appended. `fsoi_names` default to the
    /// identifiers and `ex_name` defaults to `"Unknown"`.
    pub fn new<S: Into<String>>(
        fsoi: Vec<S>,
        lss: ArrayD<f64>,
        fsoi_names: Option<Vec<String>>,
        ex_name: Option<String>,
    ) -> Result<Self> {
        let fsoi: Vec<String> = fsoi.into_iter().map(Into::into).collect();
        let lss = normalize_loss_tensor(lss)?;

        if lss.len_of(Axis(0)) != fsoi.len() {
            return Err(RfiError::Shape {
                shape: lss.shape().to_vec(),
                reason: format!(
                    "feature axis has length {} but there are {} features of interest",
                    lss.len_of(Axis(0)),
                    fsoi.len()
                ),
            });
        }
        if lss.shape().iter().any(|&len| len == 0) {
            return Err(RfiError::Shape {
                shape: lss.shape().to_vec(),
                reason: "loss tensor axes must be non-empty".to_string(),
            });
        }

        let fsoi_names = match fsoi_names {
            Some(names) if names.len() != fsoi.len() => {
                return Err(RfiError::Validation(format!(
                    "Got {} feature names for {} features of interest.",
                    names.len(),
                    fsoi.len()
                )));
            }
            Some(names) => names,
            None => fsoi.clone(),
        };

        Ok(Explanation {
            fsoi,
            fsoi_names,
            lss,
            ex_name: ex_name.unwrap_or_else(|| "Unknown".to_string()),
        })
    }

    pub fn fsoi(&self) -> &[String] {
        &self.fsoi
    }

    pub fn fsoi_names(&self) -> &[String] {
        &self.fsoi_names
    }

    pub fn ex_name(&self) -> &str {
        &self.ex_name
    }

    /// The raw loss tensor, always 4-dimensional.
    pub fn lss(&self) -> &Array4<f64> {
        &self.lss
    }

    pub fn num_runs(&self) -> usize {
        self.lss.len_of(Axis(1))
    }

    pub fn num_observations(&self) -> usize {
        self.lss.len_of(Axis(2))
    }

    pub fn num_orderings(&self) -> usize {
        self.lss.len_of(Axis(3))
    }

    /// Mean over observations and orderings: one value per (feature, run).
    pub fn per_run_importance(&self) -> Array2<f64> {
        let denom = (self.num_observations() * self.num_orderings()) as f64;
        self.lss.sum_axis(Axis(3)).sum_axis(Axis(2)) / denom
    }

    /// Mean over runs and orderings: one value per (feature, observation).
    pub fn per_observation_importance(&self) -> Array2<f64> {
        let denom = (self.num_runs() * self.num_orderings()) as f64;
        self.lss.sum_axis(Axis(3)).sum_axis(Axis(1)) / denom
    }

    /// Headline importance score per feature.
    pub fn mean_importance(&self) -> Array1<f64> {
        self.per_run_importance().sum_axis(Axis(1)) / self.num_runs() as f64
    }

    /// Population standard deviation (ddof = 0) across runs of the per-run
    /// importance.
    pub fn std_importance(&self) -> Array1<f64> {
        self.per_run_importance().std_axis(Axis(1), 0.0)
    }

    /// Features sorted by decreasing mean importance.
    pub fn ranked(&self) -> Vec<RankedFeature> {
        let means = self.mean_importance();
        let stds = self.std_importance();
        let mut ranked: Vec<RankedFeature> = self
            .fsoi_names
            .iter()
            .zip(means.iter().zip(stds.iter()))
            .map(|(name, (&mean, &std))| RankedFeature {
                name: name.clone(),
                mean,
                std,
            })
            .collect();
        ranked.sort_by(|a, b| b.mean.total_cmp(&a.mean));
        ranked
    }
}

/// Brings a loss tensor to the `(feature, run, observation, ordering)` layout.
///
/// Three axes get a length-1 ordering axis appended; four axes pass through
/// unchanged; any other rank is a [`RfiError::Shape`].
pub fn normalize_loss_tensor(lss: ArrayD<f64>) -> Result<Array4<f64>> {
    let lss = match lss.ndim() {
        3 => lss.insert_axis(Axis(3)),
        4 => lss,
        n => {
            return Err(RfiError::Shape {
                shape: lss.shape().to_vec(),
                reason: format!("loss tensor must have 3 or 4 axes, got {}", n),
            })
        }
    };
    Ok(lss.into_dimensionality::<Ix4>()?)
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explanation: {}", self.ex_name)?;
        writeln!(
            f,
            "  Runs: {}, Observations: {}, Orderings: {}",
            self.num_runs(),
            self.num_observations(),
            self.num_orderings()
        )?;
        writeln!(f, "  Importance (mean +/- std):")?;
        for feature in self.ranked() {
            writeln!(f, "    {}: {:.4} +/- {:.4}", feature.name, feature.mean, feature.std)?;
        }
        Ok(())
    }
}
