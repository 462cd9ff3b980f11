//! Dataset loading, encoding, splitting, and batching

pub mod batcher;
pub mod labels;
pub mod split;
pub mod vocab;

pub use batcher::{
    create_batches, load_items, process_image, process_image_sized, DogBatch, DogBatcher, DogItem,
    ImageTensor,
};
pub use labels::{LabelFile, LabelRecord, LabelStats};
pub use split::{split_samples, DatasetSplit, SplitConfig};
pub use vocab::{build_samples, unlabeled_samples, BreedVocabulary, Sample};

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::utils::error::{DogBreedError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// List image files directly inside `dir`, sorted by path.
///
/// Only files with a recognized image extension are returned; anything else
/// (subdirectories included) is skipped.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DogBreedError::data_load(dir, "not a directory"));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_image_files_filters_and_sorts() {
        let dir = std::env::temp_dir().join("dogbreed_list_images");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.jpg", "a.jpg", "c.png", "notes.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let files = list_image_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.png"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_is_data_load_error() {
        let err = list_image_files(Path::new("/nonexistent/images")).unwrap_err();
        assert!(matches!(err, DogBreedError::DataLoad { .. }));
    }
}
