//! # Dog Breed Identifier
//!
//! A Rust library for multi-class dog breed classification using transfer
//! learning with the Burn framework.
//!
//! ## Pipeline
//!
//! 1. Load the `labels.csv` file mapping image ids to breed names
//! 2. Build image paths and one-hot encode breeds against the breed vocabulary
//! 3. Split into train/validation sets deterministically
//! 4. Decode, resize, and batch images into tensors
//! 5. Train a classification head on top of a frozen feature extractor
//!    with early stopping
//! 6. Persist the trained model, run inference, and export a submission file
//!
//! ## Modules
//!
//! - `dataset`: Label loading, vocabulary/encoding, splitting, and batching
//! - `model`: Classifier architecture, configuration, and persistence
//! - `training`: Training loop with validation and early stopping
//! - `inference`: Prediction, decoding, and reporting
//! - `utils`: Errors, logging, and chart rendering

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::batcher::{
    create_batches, load_items, process_image, DogBatch, DogBatcher, DogItem, ImageTensor,
};
pub use dataset::labels::{LabelFile, LabelRecord, LabelStats};
pub use dataset::split::{split_samples, DatasetSplit, SplitConfig};
pub use dataset::vocab::{build_samples, unlabeled_samples, BreedVocabulary, Sample};
pub use inference::predictor::{predict, PredictionResult};
pub use model::config::ModelConfig;
pub use model::persist::{load_model, save_model};
pub use model::BreedClassifier;
pub use training::trainer::{
    EarlyStopping, RestorePolicy, Trainer, TrainerConfig, TrainingOutcome, TrainingState,
};
pub use utils::error::{DogBreedError, Result};

/// Image edge length expected by the feature extractor (square images)
pub const IMG_SIZE: usize = 224;

/// Default batch size for training and inference
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Fixed image file extension for dataset images
pub const IMAGE_EXTENSION: &str = "jpg";

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
