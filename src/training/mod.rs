//! Training loop, early stopping, and run history

pub mod trainer;

pub use trainer::{
    evaluate, EarlyStopping, RestorePolicy, Trainer, TrainerConfig, TrainingOutcome, TrainingState,
};
