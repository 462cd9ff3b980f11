//! Prediction
//!
//! Runs batches through a trained model and turns the softmax output into
//! per-image probability vectors over the breed vocabulary.

use burn::tensor::backend::Backend;

use crate::dataset::batcher::DogBatch;
use crate::dataset::vocab::{argmax, BreedVocabulary};
use crate::model::net::BreedClassifier;
use crate::utils::error::{DogBreedError, Result};

/// Predict probabilities for every image in the given batches.
///
/// Returns one probability vector per image, in batch order; each vector has
/// one entry per breed and sums to 1.
pub fn predict<B: Backend>(
    model: &BreedClassifier<B>,
    batches: &[DogBatch<B>],
) -> Result<Vec<Vec<f32>>> {
    let num_classes = model.num_classes();
    let mut rows = Vec::new();

    for batch in batches {
        let probs = model.forward_softmax(batch.images.clone());
        let data: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| DogBreedError::Training(format!("prediction readback failed: {:?}", e)))?;

        for row in data.chunks(num_classes) {
            rows.push(row.to_vec());
        }
    }

    Ok(rows)
}

/// A single interpreted prediction
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Full probability vector in vocabulary order
    pub probabilities: Vec<f32>,
    /// Predicted breed (arg-max of the probabilities)
    pub breed: String,
    /// Probability of the predicted breed
    pub confidence: f32,
}

impl PredictionResult {
    /// Interpret a probability vector against the vocabulary.
    pub fn from_probabilities(probabilities: Vec<f32>, vocab: &BreedVocabulary) -> Result<Self> {
        let breed = vocab.decode(&probabilities)?.to_string();
        let confidence = argmax(&probabilities)
            .map(|i| probabilities[i])
            .unwrap_or(0.0);
        Ok(Self {
            probabilities,
            breed,
            confidence,
        })
    }

    /// The `k` most probable breeds, highest first. Ties keep vocabulary
    /// order.
    pub fn top_k(&self, k: usize, vocab: &BreedVocabulary) -> Vec<(String, f32)> {
        let mut indexed: Vec<(usize, f32)> = self
            .probabilities
            .iter()
            .copied()
            .enumerate()
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed
            .into_iter()
            .take(k)
            .filter_map(|(i, p)| vocab.get(i).map(|breed| (breed.to_string(), p)))
            .collect()
    }

    /// Whether the prediction matches a known ground truth
    pub fn matches(&self, truth: &str) -> bool {
        self.breed == truth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::batcher::{DogBatcher, DogItem, ImageTensor};
    use crate::model::config::ModelConfig;
    use burn::data::dataloader::batcher::Batcher;

    fn item(fill: f32, size: usize) -> DogItem {
        DogItem::from_data(
            ImageTensor {
                data: vec![fill; size * size * 3],
                size,
            },
            None,
            format!("img_{}.jpg", fill),
        )
    }

    #[test]
    fn test_predictions_are_probability_vectors() {
        let device = Default::default();
        let size = 32;
        let vocab = BreedVocabulary::from_labels(&["beagle", "boxer", "pug"]);

        let mut config = ModelConfig::new(vocab.len());
        config.image_size = size;
        let model = config.init::<DefaultBackend>(&device).unwrap();

        let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, size);
        let batches = vec![
            batcher.batch(vec![item(0.1, size), item(0.5, size)]),
            batcher.batch(vec![item(0.9, size)]),
        ];

        let rows = predict(&model, &batches).unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.len(), vocab.len());
            assert!(row.iter().all(|&p| p >= 0.0));
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_result_interpretation() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "boxer", "pug"]);
        let result =
            PredictionResult::from_probabilities(vec![0.1, 0.2, 0.7], &vocab).unwrap();

        assert_eq!(result.breed, "pug");
        assert!((result.confidence - 0.7).abs() < f32::EPSILON);
        assert!(result.matches("pug"));
        assert!(!result.matches("beagle"));
    }

    #[test]
    fn test_top_k_sorted_descending() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "boxer", "pug"]);
        let result =
            PredictionResult::from_probabilities(vec![0.3, 0.1, 0.6], &vocab).unwrap();

        let top = result.top_k(2, &vocab);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "pug");
        assert_eq!(top[1].0, "beagle");
        assert!(top[0].1 >= top[1].1);
    }

    #[test]
    fn test_wrong_length_vector_rejected() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "pug"]);
        let err = PredictionResult::from_probabilities(vec![0.5, 0.3, 0.2], &vocab).unwrap_err();
        assert!(matches!(err, DogBreedError::Encoding(_)));
    }
}
