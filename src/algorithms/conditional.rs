// src/algorithms/conditional.rs
use crate::algorithms::IdentitySampler;
use crate::core::{Dataset, Result, RfiError, SampleTable};
use crate::traits::{SamplingFunction, Trainer};
use crate::utils::{encode_samples, fset_to_ix, key, FeatureSetKey};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fmt;

/// Configuration for the conditional sampler.
#[derive(Debug, Clone, Default)]
pub struct SamplerConfig {
    /// Reference columns to be treated as categorical by trainers.
    pub cat_inputs: Vec<String>,
    /// Seed for the sampler's RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// Trained sampling functions keyed by `(key(J), key(G))`.
///
/// [`SamplerCache::store`] is the only way to add or replace an entry.
#[derive(Default)]
pub struct SamplerCache {
    funcs: HashMap<(FeatureSetKey, FeatureSetKey), Box<dyn SamplingFunction>>,
}

impl SamplerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `func` for (J, G), replacing any previous entry.
    pub fn store(&mut self, j: FeatureSetKey, g: FeatureSetKey, func: Box<dyn SamplingFunction>) {
        let replaced = self.funcs.insert((j, g), func).is_some();
        if replaced {
            info!("Training ended. Sampler replaced.");
        } else {
            info!("Training ended. Sampler saved.");
        }
    }

    pub fn get(&self, j: &FeatureSetKey, g: &FeatureSetKey) -> Option<&dyn SamplingFunction> {
        self.funcs
            .get(&(j.clone(), g.clone()))
            .map(|func| func.as_ref())
    }

    pub fn contains(&self, j: &FeatureSetKey, g: &FeatureSetKey) -> bool {
        self.funcs.contains_key(&(j.clone(), g.clone()))
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// All trained `(J, G)` pairs, in canonical order.
    pub fn keys(&self) -> Vec<(FeatureSetKey, FeatureSetKey)> {
        let mut keys: Vec<_> = self.funcs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for SamplerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerCache")
            .field("trained", &self.keys())
            .finish()
    }
}

/// Trains, caches and applies samplers of a feature set J conditional on a
/// feature set G, for one reference dataset.
///
/// Configurations with J contained in G are resolved here with an exact
/// identity sampler; everything else is handed to the configured [`Trainer`].
#[derive(Debug)]
pub struct ConditionalSampler<'a, T: Trainer> {
    reference: &'a Dataset,
    trainer: T,
    config: SamplerConfig,
    cache: SamplerCache,
    rng: StdRng,
}

impl<'a, T: Trainer> ConditionalSampler<'a, T> {
    pub fn new(reference: &'a Dataset, trainer: T, config: Option<SamplerConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        for name in &config.cat_inputs {
            if !reference.has_column(name) {
                return Err(RfiError::Validation(format!(
                    "Categorical feature '{}' is not a column of the reference data.",
                    name
                )));
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Sampler initialized. Using following features as categorical {:?}",
            config.cat_inputs
        );

        Ok(ConditionalSampler {
            reference,
            trainer,
            config,
            cache: SamplerCache::new(),
            rng,
        })
    }

    pub fn reference(&self) -> &'a Dataset {
        self.reference
    }

    pub fn cat_inputs(&self) -> &[String] {
        &self.config.cat_inputs
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    pub fn cache(&self) -> &SamplerCache {
        &self.cache
    }

    pub fn num_trained(&self) -> usize {
        self.cache.len()
    }

    /// Whether a sampling function exists for (J, G).
    pub fn is_trained<S: AsRef<str>, U: AsRef<str>>(&self, j: &[S], g: &[U]) -> bool {
        self.cache.contains(&key(j), &key(g))
    }

    /// Trains a sampler of J conditional on G, replacing any existing one.
    ///
    /// Errors from the trainer are returned unchanged.
    pub fn train<S: AsRef<str>, U: AsRef<str>>(&mut self, j: &[S], g: &[U]) -> Result<()> {
        let (j_key, g_key) = self.validated_keys(j, g)?;
        info!("Training Sampler for: {} | {}", j_key, g_key);

        if self.train_degenerate(&j_key, &g_key)? {
            return Ok(());
        }

        self.trainer.fit(
            &j_key,
            &g_key,
            self.reference,
            &self.config.cat_inputs,
            &mut self.cache,
        )?;

        if !self.cache.contains(&j_key, &g_key) {
            return Err(RfiError::Training(format!(
                "Trainer returned without storing a sampler for {} | {}",
                j_key, g_key
            )));
        }
        Ok(())
    }

    /// Handles configurations that need no fitting. Returns whether one applied.
    fn train_degenerate(&mut self, j: &FeatureSetKey, g: &FeatureSetKey) -> Result<bool> {
        if j.is_subset_of(g) {
            debug!("Degenerate Training: J subseteq G");
            let j_ixs = fset_to_ix(g.features(), j.features())?;
            self.cache
                .store(j.clone(), g.clone(), Box::new(IdentitySampler::new(j_ixs)));
            Ok(true)
        } else {
            debug!("Training not degenerate.");
            Ok(false)
        }
    }

    /// Registers an externally built sampling function for (J, G).
    pub fn store_samplefunc<S: AsRef<str>, U: AsRef<str>>(
        &mut self,
        j: &[S],
        g: &[U],
        func: Box<dyn SamplingFunction>,
    ) -> Result<()> {
        let (j_key, g_key) = self.validated_keys(j, g)?;
        self.cache.store(j_key, g_key, func);
        Ok(())
    }

    /// Samples J for every row of `x_test`, conditional on its G values.
    ///
    /// Returns `num_samples * x_test.nrows()` rows indexed by
    /// `(sample, observation)`, sample-major, with columns in sorted J order.
    pub fn sample<S: AsRef<str>, U: AsRef<str>>(
        &mut self,
        x_test: &Dataset,
        j: &[S],
        g: &[U],
        num_samples: usize,
    ) -> Result<SampleTable> {
        let (j_key, g_key) = self.validated_keys(j, g)?;
        if num_samples == 0 {
            return Err(RfiError::Validation(
                "num_samples must be at least 1.".to_string(),
            ));
        }

        let func = self
            .cache
            .get(&j_key, &g_key)
            .ok_or_else(|| RfiError::NotTrained {
                j: j_key.features().to_vec(),
                g: g_key.features().to_vec(),
            })?;

        let conditioning = x_test.select(g_key.features())?;
        let block = func.apply(conditioning.view(), num_samples, &mut self.rng)?;

        let expected = (num_samples, x_test.nrows(), j_key.len());
        if block.dim() != expected {
            return Err(RfiError::Shape {
                shape: block.shape().to_vec(),
                reason: format!(
                    "sampling function for {} | {} must return shape {:?}",
                    j_key, g_key, expected
                ),
            });
        }
        debug!(
            "Sampled {} x {} x {} for {} | {}",
            expected.0, expected.1, expected.2, j_key, g_key
        );

        encode_samples(block, j_key.features().to_vec())
    }

    fn validated_keys<S: AsRef<str>, U: AsRef<str>>(
        &self,
        j: &[S],
        g: &[U],
    ) -> Result<(FeatureSetKey, FeatureSetKey)> {
        let j_key = key(j);
        let g_key = key(g);

        if j_key.is_empty() {
            return Err(RfiError::Validation(
                "Feature set J must not be empty.".to_string(),
            ));
        }
        for name in j_key.features().iter().chain(g_key.features()) {
            if !self.reference.has_column(name) {
                return Err(RfiError::Validation(format!(
                    "Feature '{}' is not a column of the reference data.",
                    name
                )));
            }
        }
        Ok((j_key, g_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::MarginalTrainer;
    use ndarray::{array, Array2, Array3, ArrayView2, Axis};
    use rand::RngCore;

    fn reference() -> Dataset {
        Dataset::new(
            vec!["a", "b", "c"],
            array![
                [1.0, 2.0, 3.0],
                [4.0, 5.0, 6.0],
                [7.0, 8.0, 9.0],
                [10.0, 11.0, 12.0]
            ],
        )
        .expect("valid dataset")
    }

    /// Trainer that succeeds without storing anything.
    struct ForgetfulTrainer;

    impl Trainer for ForgetfulTrainer {
        fn fit(
            &self,
            _j: &FeatureSetKey,
            _g: &FeatureSetKey,
            _reference: &Dataset,
            _cat_inputs: &[String],
            _cache: &mut SamplerCache,
        ) -> Result<()> {
            Ok(())
        }
    }

    /// Trainer that always fails, as a non-converging fit would.
    struct FailingTrainer;

    impl Trainer for FailingTrainer {
        fn fit(
            &self,
            _j: &FeatureSetKey,
            _g: &FeatureSetKey,
            _reference: &Dataset,
            _cat_inputs: &[String],
            _cache: &mut SamplerCache,
        ) -> Result<()> {
            Err(RfiError::Training("did not converge".to_string()))
        }
    }

    /// Returns a constant block, to observe overwrites.
    struct ConstantSampler(f64);

    impl SamplingFunction for ConstantSampler {
        fn apply(
            &self,
            conditioning: ArrayView2<'_, f64>,
            num_samples: usize,
            _rng: &mut dyn RngCore,
        ) -> Result<Array3<f64>> {
            Ok(Array3::from_elem((num_samples, conditioning.nrows(), 1), self.0))
        }
    }

    /// Returns a block with samples and observations transposed.
    struct TransposingSampler;

    impl SamplingFunction for TransposingSampler {
        fn apply(
            &self,
            conditioning: ArrayView2<'_, f64>,
            num_samples: usize,
            _rng: &mut dyn RngCore,
        ) -> Result<Array3<f64>> {
            Ok(Array3::zeros((conditioning.nrows(), num_samples, 1)))
        }
    }

    #[test]
    fn untrained_pair_is_reported() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None)?;
        assert!(!sampler.is_trained(&["a"], &["b"]));
        match sampler.sample(&data, &["a"], &["b"], 1) {
            Err(RfiError::NotTrained { j, g }) => {
                assert_eq!(j, vec!["a".to_string()]);
                assert_eq!(g, vec!["b".to_string()]);
            }
            other => panic!("expected NotTrained, got {:?}", other.map(|t| t.nrows())),
        }
        Ok(())
    }

    #[test]
    fn is_trained_ignores_order() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None)?;
        sampler.train(&["b", "a"], &["c"])?;
        assert!(sampler.is_trained(&["a", "b"], &["c"]));
        assert!(sampler.is_trained(&["a", "b", "a"], &["c", "c"]));
        assert!(!sampler.is_trained(&["a"], &["c"]));
        assert_eq!(sampler.num_trained(), 1);
        Ok(())
    }

    #[test]
    fn degenerate_pair_skips_trainer() -> Result<()> {
        let data = reference();
        // A trainer that would fail proves the identity path never reaches it.
        let mut sampler = ConditionalSampler::new(&data, FailingTrainer, None)?;
        sampler.train(&["c", "a"], &["a", "b", "c"])?;
        assert!(sampler.is_trained(&["a", "c"], &["c", "b", "a"]));

        let table = sampler.sample(&data, &["c", "a"], &["b", "a", "c"], 2)?;
        assert_eq!(table.columns(), &["a", "c"]);
        for s in 0..2 {
            let block = table.sample_block(s).map(|b| b.to_owned());
            assert_eq!(block, Some(data.select(&["a", "c"])?));
        }
        Ok(())
    }

    #[test]
    fn trainer_errors_propagate() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, FailingTrainer, None)?;
        let res = sampler.train(&["a"], &["b"]);
        assert!(matches!(res, Err(RfiError::Training(ref msg)) if msg == "did not converge"));
        assert!(!sampler.is_trained(&["a"], &["b"]));
        Ok(())
    }

    #[test]
    fn trainer_must_store_its_result() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, ForgetfulTrainer, None)?;
        assert!(matches!(
            sampler.train(&["a"], &["b"]),
            Err(RfiError::Training(_))
        ));
        Ok(())
    }

    #[test]
    fn retraining_overwrites_entry() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, ForgetfulTrainer, None)?;
        sampler.store_samplefunc(&["a"], &["b"], Box::new(ConstantSampler(1.0)))?;
        sampler.store_samplefunc(&["a"], &["b"], Box::new(ConstantSampler(2.0)))?;
        assert_eq!(sampler.num_trained(), 1);

        let table = sampler.sample(&data, &["a"], &["b"], 1)?;
        assert!(table.values().iter().all(|&v| v == 2.0));
        Ok(())
    }

    #[test]
    fn invalid_feature_sets_are_rejected() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None)?;
        let empty: [&str; 0] = [];
        assert!(matches!(sampler.train(&empty, &["a"]), Err(RfiError::Validation(_))));
        assert!(matches!(sampler.train(&["a"], &["zzz"]), Err(RfiError::Validation(_))));
        assert!(matches!(sampler.train(&["zzz"], &["a"]), Err(RfiError::Validation(_))));
        assert!(matches!(
            sampler.sample(&data, &["a"], &["zzz"], 1),
            Err(RfiError::Validation(_))
        ));
        assert!(sampler.cache().is_empty());
        Ok(())
    }

    #[test]
    fn zero_samples_is_rejected() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None)?;
        sampler.train(&["a"], &["a"])?;
        assert!(matches!(
            sampler.sample(&data, &["a"], &["a"], 0),
            Err(RfiError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn test_data_must_carry_conditioning_columns() -> Result<()> {
        let data = reference();
        let x_test = Dataset::new(vec!["a"], array![[1.0], [2.0]])?;
        let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None)?;
        sampler.train(&["a"], &["b"])?;
        assert!(matches!(
            sampler.sample(&x_test, &["a"], &["b"], 1),
            Err(RfiError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn wrongly_shaped_samples_are_rejected() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, ForgetfulTrainer, None)?;
        sampler.store_samplefunc(&["a"], &["b"], Box::new(TransposingSampler))?;
        assert!(matches!(
            sampler.sample(&data, &["a"], &["b"], 3),
            Err(RfiError::Shape { .. })
        ));
        Ok(())
    }

    #[test]
    fn unknown_categorical_input_is_rejected() {
        let data = reference();
        let config = SamplerConfig {
            cat_inputs: vec!["nope".to_string()],
            seed: None,
        };
        let res = ConditionalSampler::new(&data, MarginalTrainer::default(), Some(config));
        assert!(matches!(res, Err(RfiError::Validation(_))));
    }

    #[test]
    fn seeded_samplers_are_reproducible() -> Result<()> {
        let data = reference();
        let config = SamplerConfig {
            cat_inputs: vec!["c".to_string()],
            seed: Some(42),
        };
        let mut first = ConditionalSampler::new(&data, MarginalTrainer::default(), Some(config.clone()))?;
        let mut second = ConditionalSampler::new(&data, MarginalTrainer::default(), Some(config))?;
        assert_eq!(first.cat_inputs(), &["c".to_string()]);

        first.train(&["a"], &["b"])?;
        second.train(&["a"], &["b"])?;
        let x: Array2<f64> = first.sample(&data, &["a"], &["b"], 5)?.values().clone();
        let y: Array2<f64> = second.sample(&data, &["a"], &["b"], 5)?.values().clone();
        assert_eq!(x, y);
        assert_eq!(x.len_of(Axis(0)), 20);
        Ok(())
    }

    #[test]
    fn cache_keys_are_canonical() -> Result<()> {
        let data = reference();
        let mut sampler = ConditionalSampler::new(&data, MarginalTrainer::default(), None)?;
        sampler.train(&["b"], &["c", "a"])?;
        sampler.train(&["a"], &["a"])?;
        assert_eq!(
            sampler.cache().keys(),
            vec![(key(["a"]), key(["a"])), (key(["b"]), key(["a", "c"]))]
        );
        Ok(())
    }
}
