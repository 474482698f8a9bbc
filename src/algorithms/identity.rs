// src/algorithms/identity.rs
use crate::core::{Result, RfiError};
use crate::traits::SamplingFunction;
use ndarray::{Array3, ArrayView2, Axis};
use rand::RngCore;

/// Exact sampler for J contained in G: returns the J columns of the
/// conditioning block itself, repeated for every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySampler {
    j_ixs: Vec<usize>,
}

impl IdentitySampler {
    /// `j_ixs` are the positions of canonical J within canonical G.
    pub fn new(j_ixs: Vec<usize>) -> Self {
        IdentitySampler { j_ixs }
    }

    pub fn indices(&self) -> &[usize] {
        &self.j_ixs
    }
}

impl SamplingFunction for IdentitySampler {
    fn apply(
        &self,
        conditioning: ArrayView2<'_, f64>,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<Array3<f64>> {
        if let Some(&max_ix) = self.j_ixs.iter().max() {
            if max_ix >= conditioning.ncols() {
                return Err(RfiError::Shape {
                    shape: conditioning.shape().to_vec(),
                    reason: format!(
                        "conditioning block has {} columns, identity sampler needs column {}",
                        conditioning.ncols(),
                        max_ix
                    ),
                });
            }
        }

        let selected = conditioning.select(Axis(1), &self.j_ixs);
        let (n_obs, n_j) = selected.dim();
        let block = selected
            .insert_axis(Axis(0))
            .broadcast((num_samples, n_obs, n_j))
            .map(|view| view.to_owned())
            .ok_or_else(|| RfiError::Shape {
                shape: vec![n_obs, n_j],
                reason: format!("cannot replicate selection across {} samples", num_samples),
            })?;
        Ok(block)
    }
}
