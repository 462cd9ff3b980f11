//! Prediction and reporting

pub mod predictor;
pub mod report;

pub use predictor::{predict, PredictionResult};
pub use report::{
    load_prediction_matrix, render_prediction_chart, save_prediction_matrix, write_submission,
};
