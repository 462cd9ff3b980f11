//! Model architecture, configuration, and persistence

pub mod config;
pub mod net;
pub mod persist;

pub use config::ModelConfig;
pub use net::{BreedClassifier, ConvBlock, FeatureExtractor};
pub use persist::{load_model, save_model, ModelMetadata, FORMAT_VERSION};
