//! Model Configuration
//!
//! Architecture hyperparameters for the breed classifier, serializable so a
//! saved model can be rebuilt exactly when loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{DogBreedError, Result};
use crate::IMG_SIZE;

/// Configuration for the breed classifier architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of output classes (breeds)
    pub num_classes: usize,

    /// Input image size (width and height, assumed square)
    pub image_size: usize,

    /// Number of filters in the first convolutional block; each following
    /// block doubles it
    pub base_filters: usize,

    /// Freeze the convolutional backbone so only the classification head
    /// trains (transfer-learning mode)
    pub freeze_backbone: bool,

    /// Optional path to a pretrained backbone weight record to load at
    /// initialization
    pub pretrained: Option<PathBuf>,
}

impl ModelConfig {
    /// Create a configuration for the given number of breeds with defaults
    /// for everything else
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            image_size: IMG_SIZE,
            base_filters: 32,
            freeze_backbone: true,
            pretrained: None,
        }
    }

    /// Use a pretrained backbone weight record
    pub fn with_pretrained(mut self, path: PathBuf) -> Self {
        self.pretrained = Some(path);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(DogBreedError::Config(
                "num_classes must be greater than 0".to_string(),
            ));
        }
        if self.image_size == 0 || self.image_size % 16 != 0 {
            return Err(DogBreedError::Config(
                "image_size must be a positive multiple of 16".to_string(),
            ));
        }
        if self.base_filters == 0 {
            return Err(DogBreedError::Config(
                "base_filters must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Save the configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DogBreedError::persistence(path, e))?;
        std::fs::write(path, json).map_err(|e| DogBreedError::persistence(path, e))
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| DogBreedError::persistence(path, e))?;
        serde_json::from_str(&json).map_err(|e| DogBreedError::persistence(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ModelConfig::new(120);
        assert_eq!(config.num_classes, 120);
        assert_eq!(config.image_size, 224);
        assert!(config.freeze_backbone);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ModelConfig::new(0);
        assert!(config.validate().is_err());

        config = ModelConfig::new(10);
        config.image_size = 100;
        assert!(config.validate().is_err());

        config = ModelConfig::new(10);
        config.base_filters = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let path = std::env::temp_dir().join("dogbreed_model_config.json");
        let config = ModelConfig::new(120).with_pretrained(PathBuf::from("weights/backbone"));
        config.save(&path).unwrap();
        let loaded = ModelConfig::load(&path).unwrap();
        assert_eq!(config, loaded);
        let _ = std::fs::remove_file(&path);
    }
}
