//! Errors, logging, and chart rendering utilities

pub mod charts;
pub mod error;
pub mod logging;

pub use error::{DogBreedError, Result};
