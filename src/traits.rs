// src/traits.rs
use crate::algorithms::SamplerCache;
use crate::core::{Dataset, Result};
use crate::utils::FeatureSetKey;
use ndarray::{Array3, ArrayView2};
use rand::RngCore;

/// A sampling function trained for exactly one (J, G) pair.
pub trait SamplingFunction {
    /// Draws samples of J conditional on each row of `conditioning`.
    ///
    /// `conditioning` is observations x |G| with columns in canonical G order.
    /// The result must have shape `(num_samples, observations, |J|)` with the
    /// last axis in canonical J order.
    fn apply(
        &self,
        conditioning: ArrayView2<'_, f64>,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Array3<f64>>;
}

/// Fits sampling functions for (J, G) pairs that are not degenerate.
///
/// An implementation must register its result through
/// [`SamplerCache::store`] before returning `Ok(())`.
pub trait Trainer {
    fn fit(
        &self,
        j: &FeatureSetKey,
        g: &FeatureSetKey,
        reference: &Dataset,
        cat_inputs: &[String],
        cache: &mut SamplerCache,
    ) -> Result<()>;
}
