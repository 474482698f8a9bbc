// src/lib.rs

//! `rfi_rs` computes relative feature importance (RFI): how much each feature
//! contributes to a model's loss, conditional on an arbitrary relative set G.
//!
//! The crate provides the pieces an importance driver needs:
//! - [`ConditionalSampler`] trains and caches samplers of J given G, resolves
//!   J-contained-in-G exactly, and emits `(sample, observation)`-indexed tables.
//! - [`Explanation`] stores the `(feature, run, observation, ordering)` loss
//!   tensor and aggregates it into per-feature statistics.
//!
//! ```
//! use ndarray::array;
//! use rfi_rs::{ConditionalSampler, Dataset, MarginalTrainer};
//!
//! let data = Dataset::new(vec!["a", "b"], array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
//! let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None).unwrap();
//! sampler.train(&["a"], &["a", "b"]).unwrap();
//! let table = sampler.sample(&data, &["a"], &["a", "b"], 3).unwrap();
//! assert_eq!(table.nrows(), 6);
//! ```

pub mod algorithms;
pub mod core;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{
    ConditionalSampler, IdentitySampler, MarginalConfig, MarginalTrainer, SamplerCache,
    SamplerConfig,
};
pub use crate::core::explanation::{normalize_loss_tensor, RankedFeature};
pub use crate::core::{Dataset, Explanation, Result, RfiError, SampleTable};
pub use crate::traits::{SamplingFunction, Trainer};
pub use crate::utils::{encode_samples, key, FeatureSetKey};
