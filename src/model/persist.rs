//! Model Persistence
//!
//! Saves a trained classifier as two artifacts that live side by side: the
//! weight record (Burn's compact MessagePack format) and a JSON metadata file
//! carrying the architecture configuration and the breed vocabulary. Loading
//! rebuilds the model from both, so a restored model predicts with the exact
//! vocabulary it was trained with.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::vocab::BreedVocabulary;
use crate::model::config::ModelConfig;
use crate::model::net::BreedClassifier;
use crate::utils::error::{DogBreedError, Result};

/// Metadata format version, bumped on breaking layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Sidecar metadata stored next to the weight record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,
    pub config: ModelConfig,
    /// Breed names in vocabulary order
    pub vocabulary: Vec<String>,
    /// Save timestamp, human readable
    pub saved_at: String,
}

/// Build the base file name for a save: timestamp plus an optional suffix
/// describing the run (e.g. `20260825-143000-full-dataset`).
fn model_basename(suffix: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    if suffix.is_empty() {
        timestamp.to_string()
    } else {
        format!("{}-{}", timestamp, suffix)
    }
}

/// Save a trained model into `dir`, returning the base path (no extension).
///
/// Writes `<base>.mpk` (weights) and `<base>.json` (metadata).
pub fn save_model<B: Backend>(
    model: &BreedClassifier<B>,
    config: &ModelConfig,
    vocab: &BreedVocabulary,
    dir: &Path,
    suffix: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DogBreedError::persistence(dir, e))?;

    let base = dir.join(model_basename(suffix));

    model
        .clone()
        .save_file(base.clone(), &CompactRecorder::new())
        .map_err(|e| DogBreedError::persistence(&base, e))?;

    let metadata = ModelMetadata {
        format_version: FORMAT_VERSION,
        config: config.clone(),
        vocabulary: vocab.breeds().to_vec(),
        saved_at: Local::now().to_rfc3339(),
    };
    let metadata_path = base.with_extension("json");
    let json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| DogBreedError::persistence(&metadata_path, e))?;
    std::fs::write(&metadata_path, json)
        .map_err(|e| DogBreedError::persistence(&metadata_path, e))?;

    info!("Saved model to {:?}", base);
    Ok(base)
}

/// Load a model saved by [`save_model`] from its base path (no extension).
///
/// Fails with `Persistence` when either artifact is missing or the metadata
/// format version does not match.
pub fn load_model<B: Backend>(
    base: &Path,
    device: &B::Device,
) -> Result<(BreedClassifier<B>, BreedVocabulary, ModelConfig)> {
    let metadata_path = base.with_extension("json");
    if !metadata_path.exists() {
        return Err(DogBreedError::persistence(
            &metadata_path,
            "model metadata file does not exist",
        ));
    }

    let json = std::fs::read_to_string(&metadata_path)
        .map_err(|e| DogBreedError::persistence(&metadata_path, e))?;
    let metadata: ModelMetadata = serde_json::from_str(&json)
        .map_err(|e| DogBreedError::persistence(&metadata_path, e))?;

    if metadata.format_version != FORMAT_VERSION {
        return Err(DogBreedError::persistence(
            &metadata_path,
            format!(
                "unsupported format version {} (expected {})",
                metadata.format_version, FORMAT_VERSION
            ),
        ));
    }

    // The saved record already carries the backbone weights, so the model is
    // initialized without re-reading any pretrained record.
    let mut config = metadata.config.clone();
    config.pretrained = None;

    let model = config
        .init::<B>(device)?
        .load_file(base, &CompactRecorder::new(), device)
        .map_err(|e| DogBreedError::persistence(base, e))?;

    let vocab = BreedVocabulary::from_ordered(metadata.vocabulary);

    if vocab.len() != metadata.config.num_classes {
        return Err(DogBreedError::persistence(
            &metadata_path,
            format!(
                "vocabulary size {} does not match model classes {}",
                vocab.len(),
                metadata.config.num_classes
            ),
        ));
    }

    info!("Loaded model from {:?} ({} breeds)", base, vocab.len());
    Ok((model, vocab, metadata.config))
}
