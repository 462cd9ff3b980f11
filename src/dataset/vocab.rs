//! Breed Vocabulary and Label Encoding
//!
//! The vocabulary is the sorted set of distinct breed names derived from the
//! training labels. It fixes the one-hot index order used everywhere: it is
//! derived once and then reused unchanged for encoding and decoding.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{DogBreedError, Result};
use crate::IMAGE_EXTENSION;

/// A single sample: an image path plus an optional breed label.
/// The label is `None` for test and custom images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Path to the image file
    pub path: PathBuf,
    /// Ground-truth breed, if known
    pub breed: Option<String>,
}

/// Ordered set of unique breed names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedVocabulary {
    breeds: Vec<String>,
}

impl BreedVocabulary {
    /// Derive the vocabulary from a list of breed labels.
    ///
    /// The result is the sorted set of distinct breeds, independent of the
    /// input order.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let set: BTreeSet<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        Self {
            breeds: set.into_iter().collect(),
        }
    }

    /// Rebuild a vocabulary from an already-ordered breed list (e.g. loaded
    /// from persisted model metadata).
    pub fn from_ordered(breeds: Vec<String>) -> Self {
        Self { breeds }
    }

    /// Number of breeds
    pub fn len(&self) -> usize {
        self.breeds.len()
    }

    /// Check if the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.breeds.is_empty()
    }

    /// Breed names in vocabulary order
    pub fn breeds(&self) -> &[String] {
        &self.breeds
    }

    /// Breed name at the given index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.breeds.get(index).map(|s| s.as_str())
    }

    /// Index of the given breed in the vocabulary
    pub fn index_of(&self, breed: &str) -> Option<usize> {
        // The breed list is sorted, so binary search applies.
        self.breeds.binary_search_by(|b| b.as_str().cmp(breed)).ok()
    }

    /// Encode a breed as a one-hot vector over the vocabulary.
    ///
    /// Fails with `Encoding` if the breed is absent from the vocabulary,
    /// which guards against use of a stale vocabulary.
    pub fn encode(&self, breed: &str) -> Result<Vec<f32>> {
        let index = self.index_of(breed).ok_or_else(|| {
            DogBreedError::Encoding(format!("breed '{}' is not in the vocabulary", breed))
        })?;
        let mut one_hot = vec![0.0f32; self.breeds.len()];
        one_hot[index] = 1.0;
        Ok(one_hot)
    }

    /// Decode a prediction (or one-hot) vector back to a breed name.
    ///
    /// Returns the breed at the arg-max index; ties break toward the lowest
    /// index. Fails with `Encoding` if the vector length does not match the
    /// vocabulary size.
    pub fn decode<'a>(&'a self, vector: &[f32]) -> Result<&'a str> {
        if vector.len() != self.breeds.len() {
            return Err(DogBreedError::Encoding(format!(
                "vector length {} does not match vocabulary size {}",
                vector.len(),
                self.breeds.len()
            )));
        }
        let index = argmax(vector).ok_or_else(|| {
            DogBreedError::Encoding("cannot decode an empty vector".to_string())
        })?;
        Ok(&self.breeds[index])
    }
}

/// Index of the maximum entry; ties break toward the lowest index.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Build labeled samples from parallel id/breed lists.
///
/// Paths are `<base_dir>/<id>.jpg`. Fails with `Encoding` if the lists differ
/// in length.
pub fn build_samples<S: AsRef<str>>(
    base_dir: &Path,
    ids: &[S],
    breeds: &[S],
) -> Result<Vec<Sample>> {
    if ids.len() != breeds.len() {
        return Err(DogBreedError::Encoding(format!(
            "identifier list ({}) and breed list ({}) differ in length",
            ids.len(),
            breeds.len()
        )));
    }

    Ok(ids
        .iter()
        .zip(breeds.iter())
        .map(|(id, breed)| Sample {
            path: base_dir.join(format!("{}.{}", id.as_ref(), IMAGE_EXTENSION)),
            breed: Some(breed.as_ref().to_string()),
        })
        .collect())
}

/// Build unlabeled samples (test or custom images) from a list of paths.
pub fn unlabeled_samples(paths: Vec<PathBuf>) -> Vec<Sample> {
    paths
        .into_iter()
        .map(|path| Sample { path, breed: None })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_sorted_and_unique() {
        let labels = ["pug", "beagle", "pug", "akita", "beagle"];
        let vocab = BreedVocabulary::from_labels(&labels);
        assert_eq!(vocab.breeds(), &["akita", "beagle", "pug"]);
    }

    #[test]
    fn test_vocabulary_independent_of_input_order() {
        let a = BreedVocabulary::from_labels(&["pug", "beagle", "akita"]);
        let b = BreedVocabulary::from_labels(&["akita", "pug", "beagle", "pug"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_one_hot_round_trip() {
        let vocab = BreedVocabulary::from_labels(&["pug", "beagle", "akita"]);
        for breed in vocab.breeds().to_vec() {
            let encoded = vocab.encode(&breed).unwrap();
            assert_eq!(encoded.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(encoded.iter().filter(|&&v| v == 0.0).count(), 2);
            assert_eq!(vocab.decode(&encoded).unwrap(), breed);
        }
    }

    #[test]
    fn test_encode_scenario() {
        // breeds ["pug","pug","beagle","beagle","beagle"] => ["beagle","pug"]
        let vocab = BreedVocabulary::from_labels(&["pug", "pug", "beagle", "beagle", "beagle"]);
        assert_eq!(vocab.breeds(), &["beagle", "pug"]);
        assert_eq!(vocab.encode("pug").unwrap(), vec![0.0, 1.0]);
        assert_eq!(vocab.encode("beagle").unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_unknown_breed_is_encoding_error() {
        let vocab = BreedVocabulary::from_labels(&["pug"]);
        let err = vocab.encode("chinchilla").unwrap_err();
        assert!(matches!(err, DogBreedError::Encoding(_)));
    }

    #[test]
    fn test_decode_tie_breaks_to_lowest_index() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "boxer", "pug"]);
        assert_eq!(vocab.decode(&[0.4, 0.4, 0.2]).unwrap(), "beagle");
    }

    #[test]
    fn test_decode_length_mismatch() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "pug"]);
        assert!(vocab.decode(&[0.5, 0.3, 0.2]).is_err());
    }

    #[test]
    fn test_build_samples_paths() {
        let samples =
            build_samples(Path::new("data/train"), &["abc123", "def456"], &["pug", "beagle"])
                .unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].path, Path::new("data/train/abc123.jpg"));
        assert_eq!(samples[0].breed.as_deref(), Some("pug"));
    }

    #[test]
    fn test_build_samples_length_mismatch() {
        let err = build_samples(Path::new("data"), &["a", "b"], &["pug"]).unwrap_err();
        assert!(matches!(err, DogBreedError::Encoding(_)));
    }
}
