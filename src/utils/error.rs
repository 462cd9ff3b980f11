//! Error Handling Module
//!
//! Defines the error types for the dog breed identification pipeline.
//! Uses thiserror for ergonomic error definitions. Every error carries the
//! offending path or identifier and the stage that detected it, since the
//! expected recovery is a human rerunning the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dog breed identification operations
#[derive(Error, Debug)]
pub enum DogBreedError {
    /// The label file is missing or malformed
    #[error("Failed to load label data from '{path}': {reason}")]
    DataLoad { path: PathBuf, reason: String },

    /// Label encoding failed (mismatched lengths or unknown breed)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// An image file could not be read or decoded
    #[error("Failed to decode image at '{path}': {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    /// Unrecoverable failure during a training pass
    #[error("Training error: {0}")]
    Training(String),

    /// Model save/load failure
    #[error("Persistence error at '{path}': {reason}")]
    Persistence { path: PathBuf, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DogBreedError {
    /// Build a `DataLoad` error for the given path
    pub fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an `ImageDecode` error for the given path
    pub fn image_decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ImageDecode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a `Persistence` error for the given path
    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type for dog breed identification operations
pub type Result<T> = std::result::Result<T, DogBreedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = DogBreedError::image_decode("/data/train/abc123.jpg", "not a JPEG");
        let msg = format!("{}", err);
        assert!(msg.contains("abc123.jpg"));
        assert!(msg.contains("not a JPEG"));
    }

    #[test]
    fn test_data_load_error() {
        let err = DogBreedError::data_load("labels.csv", "missing column 'breed'");
        assert!(format!("{}", err).contains("labels.csv"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DogBreedError = io.into();
        assert!(matches!(err, DogBreedError::Io(_)));
    }
}
