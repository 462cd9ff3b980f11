//! Label File Loader
//!
//! Reads the tabular label file (`labels.csv`) mapping image ids to breed
//! names. One row per training image, columns `id` and `breed`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::list_image_files;
use crate::utils::error::{DogBreedError, Result};

/// A single row of the label file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Image identifier (filename stem)
    pub id: String,
    /// Breed name
    pub breed: String,
}

/// The loaded label file
#[derive(Debug, Clone)]
pub struct LabelFile {
    /// Path the labels were loaded from
    pub path: PathBuf,
    /// All rows, in file order
    pub records: Vec<LabelRecord>,
}

impl LabelFile {
    /// Load a label file from disk.
    ///
    /// Fails with `DataLoad` if the file is missing or does not carry the
    /// expected `id` and `breed` columns.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DogBreedError::data_load(path, "label file does not exist"));
        }

        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DogBreedError::data_load(path, e))?;

        let headers = reader
            .headers()
            .map_err(|e| DogBreedError::data_load(path, e))?;
        for expected in ["id", "breed"] {
            if !headers.iter().any(|h| h == expected) {
                return Err(DogBreedError::data_load(
                    path,
                    format!("missing expected column '{}'", expected),
                ));
            }
        }

        let mut records = Vec::new();
        for row in reader.deserialize::<LabelRecord>() {
            let record = row.map_err(|e| DogBreedError::data_load(path, e))?;
            records.push(record);
        }

        info!("Loaded {} label rows from {:?}", records.len(), path);

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the label file is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Image identifiers, in file order
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Breed names, in file order (parallel to `ids`)
    pub fn breeds(&self) -> Vec<String> {
        self.records.iter().map(|r| r.breed.clone()).collect()
    }

    /// Compute per-breed statistics
    pub fn stats(&self) -> LabelStats {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.breed.clone()).or_default() += 1;
        }

        let mut sorted: Vec<usize> = counts.values().copied().collect();
        sorted.sort_unstable();
        let median = match sorted.len() {
            0 => 0.0,
            n if n % 2 == 1 => sorted[n / 2] as f64,
            n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
        };

        LabelStats {
            total_rows: self.records.len(),
            num_breeds: counts.len(),
            breed_counts: counts,
            median_per_breed: median,
        }
    }

    /// Check that the number of label rows matches the number of image files
    /// in `dir`. Returns the on-disk file count.
    pub fn check_against_dir(&self, dir: &Path) -> Result<usize> {
        let files = list_image_files(dir)?;
        if files.len() == self.records.len() {
            info!("Filenames match the label rows ({} files)", files.len());
        } else {
            tracing::warn!(
                "Label rows ({}) do not match image files in {:?} ({})",
                self.records.len(),
                dir,
                files.len()
            );
        }
        Ok(files.len())
    }
}

/// Statistics about the label file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelStats {
    pub total_rows: usize,
    pub num_breeds: usize,
    /// Images per breed, keyed by breed name
    pub breed_counts: BTreeMap<String, usize>,
    pub median_per_breed: f64,
}

impl std::fmt::Display for LabelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Label Statistics:")?;
        writeln!(f, "  Total images: {}", self.total_rows)?;
        writeln!(f, "  Number of breeds: {}", self.num_breeds)?;
        writeln!(f, "  Median images per breed: {:.1}", self.median_per_breed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_label_file() {
        let path = write_temp_csv(
            "dogbreed_labels_valid.csv",
            "id,breed\nabc123,pug\ndef456,beagle\nghi789,beagle\n",
        );
        let labels = LabelFile::load(&path).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.records[0].id, "abc123");
        assert_eq!(labels.records[0].breed, "pug");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let err = LabelFile::load(Path::new("/nonexistent/labels.csv")).unwrap_err();
        assert!(matches!(err, DogBreedError::DataLoad { .. }));
    }

    #[test]
    fn test_missing_column_is_data_load_error() {
        let path = write_temp_csv(
            "dogbreed_labels_nocol.csv",
            "id,species\nabc123,dog\n",
        );
        let err = LabelFile::load(&path).unwrap_err();
        assert!(format!("{}", err).contains("breed"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_stats_counts_and_median() {
        let path = write_temp_csv(
            "dogbreed_labels_stats.csv",
            "id,breed\na,pug\nb,pug\nc,beagle\nd,beagle\ne,beagle\n",
        );
        let labels = LabelFile::load(&path).unwrap();
        let stats = labels.stats();
        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.num_breeds, 2);
        assert_eq!(stats.breed_counts["beagle"], 3);
        assert_eq!(stats.breed_counts["pug"], 2);
        assert!((stats.median_per_breed - 2.5).abs() < f64::EPSILON);
        let _ = std::fs::remove_file(&path);
    }
}
