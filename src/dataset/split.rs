//! Train/Validation Split
//!
//! Deterministic splitting of labeled samples governed by a validation
//! fraction and a random seed. The same seed and input order always produce
//! the same split; this is a correctness requirement for reproducible
//! experiments, not a nicety.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::vocab::Sample;
use crate::utils::error::{DogBreedError, Result};

/// Configuration for dataset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of samples held out for validation
    pub validation_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    /// Create a new split configuration, validating the fraction
    pub fn new(validation_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(DogBreedError::Config(format!(
                "validation fraction must be in [0.0, 1.0), got {}",
                validation_fraction
            )));
        }
        Ok(Self {
            validation_fraction,
            seed,
        })
    }
}

/// The result of splitting: disjoint train and validation sets that together
/// cover every input sample.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<Sample>,
    pub validation: Vec<Sample>,
}

impl DatasetSplit {
    /// Total number of samples across both subsets
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len()
    }
}

/// Split samples into train and validation subsets.
///
/// The validation set holds `round(n * validation_fraction)` samples, chosen
/// by a seeded shuffle; the remainder trains. The partition is disjoint and
/// complete.
pub fn split_samples(samples: Vec<Sample>, config: &SplitConfig) -> Result<DatasetSplit> {
    if samples.is_empty() {
        return Err(DogBreedError::Config(
            "no samples provided for splitting".to_string(),
        ));
    }

    let n = samples.len();
    let n_val = (n as f64 * config.validation_fraction).round() as usize;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let mut in_validation = vec![false; n];
    for &i in indices.iter().take(n_val) {
        in_validation[i] = true;
    }

    // Both subsets keep the original relative sample order, so downstream
    // evaluation order matches a held label reference.
    let mut train = Vec::with_capacity(n - n_val);
    let mut validation = Vec::with_capacity(n_val);
    for (i, sample) in samples.into_iter().enumerate() {
        if in_validation[i] {
            validation.push(sample);
        } else {
            train.push(sample);
        }
    }

    Ok(DatasetSplit { train, validation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn make_samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                path: PathBuf::from(format!("train/img_{}.jpg", i)),
                breed: Some(format!("breed_{}", i % 5)),
            })
            .collect()
    }

    #[test]
    fn test_split_completeness_and_disjointness() {
        let samples = make_samples(103);
        let config = SplitConfig::default();
        let split = split_samples(samples.clone(), &config).unwrap();

        assert_eq!(split.total(), 103);

        let train_paths: HashSet<_> = split.train.iter().map(|s| s.path.clone()).collect();
        let val_paths: HashSet<_> = split.validation.iter().map(|s| s.path.clone()).collect();
        assert!(train_paths.is_disjoint(&val_paths));

        let all: HashSet<_> = samples.iter().map(|s| s.path.clone()).collect();
        let merged: HashSet<_> = train_paths.union(&val_paths).cloned().collect();
        assert_eq!(all, merged);
    }

    #[test]
    fn test_split_sizes_match_fraction() {
        let samples = make_samples(100);
        let config = SplitConfig::new(0.2, 7).unwrap();
        let split = split_samples(samples, &config).unwrap();
        assert_eq!(split.validation.len(), 20);
        assert_eq!(split.train.len(), 80);
    }

    #[test]
    fn test_split_determinism() {
        let config = SplitConfig::new(0.3, 1234).unwrap();
        let a = split_samples(make_samples(50), &config).unwrap();
        let b = split_samples(make_samples(50), &config).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.validation, b.validation);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = split_samples(make_samples(50), &SplitConfig::new(0.3, 1).unwrap()).unwrap();
        let b = split_samples(make_samples(50), &SplitConfig::new(0.3, 2).unwrap()).unwrap();
        assert_ne!(a.validation, b.validation);
    }

    #[test]
    fn test_five_sample_scenario() {
        // 5 samples, fraction 0.2 => 1 validation and 4 training samples
        let samples = make_samples(5);
        let config = SplitConfig::new(0.2, 42).unwrap();
        let split = split_samples(samples.clone(), &config).unwrap();
        assert_eq!(split.validation.len(), 1);
        assert_eq!(split.train.len(), 4);

        // Deterministic selection
        let again = split_samples(samples, &config).unwrap();
        assert_eq!(split.validation, again.validation);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(SplitConfig::new(1.0, 42).is_err());
        assert!(SplitConfig::new(-0.1, 42).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = split_samples(Vec::new(), &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, DogBreedError::Config(_)));
    }
}
