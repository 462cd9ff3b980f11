//! Prediction Reporting
//!
//! Writes the submission CSV (one probability column per breed), saves and
//! reloads raw prediction matrices so a long inference run never has to be
//! repeated, and renders per-image confidence charts.

use std::path::Path;

use tracing::info;

use crate::dataset::vocab::BreedVocabulary;
use crate::inference::predictor::PredictionResult;
use crate::utils::charts;
use crate::utils::error::{DogBreedError, Result};

/// Write a submission file: header `id,<breed...>`, then one row of
/// probabilities per image identifier.
pub fn write_submission(
    path: &Path,
    ids: &[String],
    vocab: &BreedVocabulary,
    rows: &[Vec<f32>],
) -> Result<()> {
    if ids.len() != rows.len() {
        return Err(DogBreedError::Encoding(format!(
            "{} identifiers but {} prediction rows",
            ids.len(),
            rows.len()
        )));
    }

    let mut writer =
        csv::Writer::from_path(path).map_err(|e| DogBreedError::persistence(path, e))?;

    let mut header = vec!["id".to_string()];
    header.extend(vocab.breeds().iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| DogBreedError::persistence(path, e))?;

    for (id, row) in ids.iter().zip(rows.iter()) {
        if row.len() != vocab.len() {
            return Err(DogBreedError::Encoding(format!(
                "prediction row for '{}' has {} entries, vocabulary has {}",
                id,
                row.len(),
                vocab.len()
            )));
        }
        let mut record = vec![id.clone()];
        record.extend(row.iter().map(|p| p.to_string()));
        writer
            .write_record(&record)
            .map_err(|e| DogBreedError::persistence(path, e))?;
    }

    writer
        .flush()
        .map_err(|e| DogBreedError::persistence(path, e))?;
    info!("Wrote submission with {} rows to {:?}", ids.len(), path);
    Ok(())
}

/// Save a raw prediction matrix as headerless CSV.
pub fn save_prediction_matrix(path: &Path, rows: &[Vec<f32>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| DogBreedError::persistence(path, e))?;

    for row in rows {
        let record: Vec<String> = row.iter().map(|p| p.to_string()).collect();
        writer
            .write_record(&record)
            .map_err(|e| DogBreedError::persistence(path, e))?;
    }

    writer
        .flush()
        .map_err(|e| DogBreedError::persistence(path, e))?;
    info!("Cached {} prediction rows to {:?}", rows.len(), path);
    Ok(())
}

/// Load a prediction matrix previously written by [`save_prediction_matrix`].
pub fn load_prediction_matrix(path: &Path) -> Result<Vec<Vec<f32>>> {
    if !path.exists() {
        return Err(DogBreedError::data_load(
            path,
            "cached predictions file does not exist",
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| DogBreedError::data_load(path, e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DogBreedError::data_load(path, e))?;
        let row: Vec<f32> = record
            .iter()
            .map(|field| {
                field
                    .parse::<f32>()
                    .map_err(|e| DogBreedError::data_load(path, e))
            })
            .collect::<Result<_>>()?;
        rows.push(row);
    }

    info!("Loaded {} cached prediction rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Render a top-10 confidence bar chart for one prediction. When the ground
/// truth is known its bar is highlighted.
pub fn render_prediction_chart(
    result: &PredictionResult,
    vocab: &BreedVocabulary,
    truth: Option<&str>,
    path: &Path,
) -> Result<()> {
    let entries = result.top_k(10, vocab);
    let title = format!("{} ({:.1}%)", result.breed, result.confidence * 100.0);
    charts::top_k_chart(&title, &entries, truth, path)
        .map_err(|e| DogBreedError::persistence(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_submission_header_and_rows() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "pug"]);
        let ids = vec!["abc".to_string(), "def".to_string()];
        let rows = vec![vec![0.9, 0.1], vec![0.25, 0.75]];

        let path = temp_path("dogbreed_submission_test.csv");
        write_submission(&path, &ids, &vocab, &rows).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("id,beagle,pug"));
        assert_eq!(lines.next(), Some("abc,0.9,0.1"));
        assert_eq!(lines.next(), Some("def,0.25,0.75"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_submission_length_mismatch_rejected() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "pug"]);
        let path = temp_path("dogbreed_submission_mismatch.csv");

        let err = write_submission(
            &path,
            &["abc".to_string()],
            &vocab,
            &[vec![0.9, 0.1], vec![0.2, 0.8]],
        )
        .unwrap_err();
        assert!(matches!(err, DogBreedError::Encoding(_)));

        let err = write_submission(&path, &["abc".to_string()], &vocab, &[vec![0.9]]).unwrap_err();
        assert!(matches!(err, DogBreedError::Encoding(_)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_prediction_cache_round_trip() {
        let rows = vec![vec![0.5f32, 0.25, 0.25], vec![0.0, 1.0, 0.0]];
        let path = temp_path("dogbreed_pred_cache_test.csv");

        save_prediction_matrix(&path, &rows).unwrap();
        let loaded = load_prediction_matrix(&path).unwrap();
        assert_eq!(loaded, rows);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_cache_is_data_load_error() {
        let err = load_prediction_matrix(Path::new("/nonexistent/preds.csv")).unwrap_err();
        assert!(matches!(err, DogBreedError::DataLoad { .. }));
    }

    #[test]
    fn test_corrupt_cache_is_data_load_error() {
        let path = temp_path("dogbreed_pred_cache_corrupt.csv");
        std::fs::write(&path, "0.5,not-a-number\n").unwrap();
        let err = load_prediction_matrix(&path).unwrap_err();
        assert!(matches!(err, DogBreedError::DataLoad { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_render_prediction_chart() {
        let vocab = BreedVocabulary::from_labels(&["beagle", "boxer", "pug"]);
        let result = PredictionResult::from_probabilities(vec![0.2, 0.1, 0.7], &vocab).unwrap();

        let path = temp_path("dogbreed_prediction_chart.svg");
        render_prediction_chart(&result, &vocab, Some("pug"), &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("pug"));
        let _ = std::fs::remove_file(&path);
    }
}
