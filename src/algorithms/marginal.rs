// src/algorithms/marginal.rs
use crate::algorithms::SamplerCache;
use crate::core::{Dataset, Result, RfiError};
use crate::traits::{SamplingFunction, Trainer};
use crate::utils::FeatureSetKey;
use ndarray::{Array2, Array3, ArrayView2};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};

/// Configuration for the marginal trainer.
#[derive(Debug, Clone)]
pub struct MarginalConfig {
    /// Standard deviation of Gaussian jitter added to continuous sampled
    /// columns. Categorical columns are never jittered.
    pub noise_std_dev: f64,
}

impl Default for MarginalConfig {
    fn default() -> Self {
        MarginalConfig { noise_std_dev: 0.0 }
    }
}

/// Baseline trainer that ignores G and resamples J from the reference data.
///
/// Each `(sample, observation)` draws one reference row uniformly at random
/// and takes its J values jointly, so dependence within J is kept while
/// dependence on G is broken.
#[derive(Debug, Clone, Default)]
pub struct MarginalTrainer {
    config: MarginalConfig,
}

impl MarginalTrainer {
    pub fn new(config: Option<MarginalConfig>) -> Self {
        MarginalTrainer {
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &MarginalConfig {
        &self.config
    }
}

impl Trainer for MarginalTrainer {
    fn fit(
        &self,
        j: &FeatureSetKey,
        g: &FeatureSetKey,
        reference: &Dataset,
        cat_inputs: &[String],
        cache: &mut SamplerCache,
    ) -> Result<()> {
        if reference.nrows() == 0 {
            return Err(RfiError::Training(
                "Cannot fit a marginal sampler on empty reference data.".to_string(),
            ));
        }
        if self.config.noise_std_dev < 0.0 || !self.config.noise_std_dev.is_finite() {
            return Err(RfiError::Training(format!(
                "noise_std_dev must be finite and non-negative, got {}",
                self.config.noise_std_dev
            )));
        }

        let pool = reference.select(j.features())?;
        let continuous = j
            .features()
            .iter()
            .map(|name| !cat_inputs.contains(name))
            .collect();

        let sampler = MarginalSampler {
            pool,
            continuous,
            noise_std_dev: self.config.noise_std_dev,
        };
        cache.store(j.clone(), g.clone(), Box::new(sampler));
        Ok(())
    }
}

/// Sampling function produced by [`MarginalTrainer`].
#[derive(Debug, Clone)]
pub struct MarginalSampler {
    pool: Array2<f64>,
    continuous: Vec<bool>,
    noise_std_dev: f64,
}

impl SamplingFunction for MarginalSampler {
    fn apply(
        &self,
        conditioning: ArrayView2<'_, f64>,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Array3<f64>> {
        let n_obs = conditioning.nrows();
        let n_pool = self.pool.nrows();
        let n_j = self.pool.ncols();

        let mut block = Array3::zeros((num_samples, n_obs, n_j));
        for s in 0..num_samples {
            for i in 0..n_obs {
                let drawn = self.pool.row(rng.gen_range(0..n_pool));
                for (k, &val) in drawn.iter().enumerate() {
                    let mut val = val;
                    if self.continuous[k] && self.noise_std_dev > 0.0 {
                        let noise_sample: f64 = StandardNormal.sample(rng);
                        val += noise_sample * self.noise_std_dev;
                    }
                    block[[s, i, k]] = val;
                }
            }
        }
        Ok(block)
    }
}
