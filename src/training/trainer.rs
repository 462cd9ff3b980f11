//! Training Loop
//!
//! A custom epoch loop built directly on Burn 0.15's optimizer API rather
//! than the high-level LearnerBuilder. Each epoch runs every training batch
//! through cross-entropy loss and an Adam step, then measures accuracy on
//! the validation batches. Validation accuracy drives early stopping and
//! best-model tracking.

use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use serde::{Deserialize, Serialize};

use crate::dataset::batcher::DogBatch;
use crate::model::net::BreedClassifier;
use crate::utils::error::{DogBreedError, Result};
use crate::utils::logging::TrainingLogger;

/// Which model weights to keep when training finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestorePolicy {
    /// Restore the weights from the epoch with the best validation accuracy
    Best,
    /// Keep the weights from the final epoch
    Final,
}

impl Default for RestorePolicy {
    fn default() -> Self {
        Self::Best
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Maximum number of epochs
    pub max_epochs: usize,
    /// Stop after this many epochs without validation improvement;
    /// `None` disables early stopping
    pub patience: Option<usize>,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Weight policy at the end of training
    pub restore: RestorePolicy,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_epochs: 100,
            patience: Some(3),
            learning_rate: 1e-3,
            restore: RestorePolicy::Best,
        }
    }
}

/// Early stopping on a maximized metric with strict improvement
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best: Option<f64>,
    epochs_without_improvement: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best: None,
            epochs_without_improvement: 0,
        }
    }

    /// Record an epoch's metric. Returns true when it strictly improves on
    /// the best seen so far; an equal value counts as no improvement.
    pub fn observe(&mut self, value: f64) -> bool {
        match self.best {
            Some(best) if value <= best => {
                self.epochs_without_improvement += 1;
                false
            }
            _ => {
                self.best = Some(value);
                self.epochs_without_improvement = 0;
                true
            }
        }
    }

    /// Whether the non-improvement streak has reached the patience limit
    pub fn should_stop(&self) -> bool {
        self.epochs_without_improvement >= self.patience
    }

    /// Best metric value observed so far
    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

/// Per-epoch history recorded during a training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingState {
    /// Number of epochs actually run
    pub epochs_run: usize,
    /// Average training loss per epoch
    pub train_losses: Vec<f64>,
    /// Validation accuracy per epoch, in [0, 1]
    pub val_accuracies: Vec<f64>,
    /// Best validation accuracy seen
    pub best_val_accuracy: f64,
    /// Whether training stopped before `max_epochs`
    pub stopped_early: bool,
}

impl TrainingState {
    fn record_epoch(&mut self, train_loss: f64, val_accuracy: f64) {
        self.epochs_run += 1;
        self.train_losses.push(train_loss);
        self.val_accuracies.push(val_accuracy);
        if val_accuracy > self.best_val_accuracy {
            self.best_val_accuracy = val_accuracy;
        }
    }
}

/// The trained model together with its run history
pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model: BreedClassifier<B>,
    pub state: TrainingState,
}

/// Trainer owning the model and optimizer state for one run
pub struct Trainer<B: AutodiffBackend> {
    model: BreedClassifier<B>,
    optimizer: OptimizerAdaptor<Adam<B::InnerBackend>, BreedClassifier<B>, B>,
    config: TrainerConfig,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(model: BreedClassifier<B>, config: TrainerConfig) -> Result<Self> {
        if config.max_epochs == 0 {
            return Err(DogBreedError::Training(
                "max_epochs must be greater than 0".to_string(),
            ));
        }
        if config.learning_rate <= 0.0 {
            return Err(DogBreedError::Training(
                "learning rate must be positive".to_string(),
            ));
        }

        let optimizer = AdamConfig::new().init();

        Ok(Self {
            model,
            optimizer,
            config,
        })
    }

    /// Run the full training loop.
    ///
    /// Training batches must carry targets; validation batches run on the
    /// inner (non-autodiff) backend. Consumes the trainer and returns the
    /// model selected by the restore policy plus the run history.
    pub fn train(
        mut self,
        train_batches: &[DogBatch<B>],
        val_batches: &[DogBatch<B::InnerBackend>],
    ) -> Result<TrainingOutcome<B>> {
        if train_batches.is_empty() {
            return Err(DogBreedError::Training(
                "no training batches provided".to_string(),
            ));
        }

        let mut model = self.model;
        let mut best_model: Option<BreedClassifier<B>> = None;
        let mut state = TrainingState::default();
        let mut stopping = self.config.patience.map(EarlyStopping::new);
        let mut logger = TrainingLogger::new(self.config.max_epochs);

        for epoch in 0..self.config.max_epochs {
            logger.start_epoch(epoch);

            let mut epoch_loss = 0.0f64;
            for batch in train_batches {
                let targets = batch.targets.clone().ok_or_else(|| {
                    DogBreedError::Training(
                        "training batch is missing targets (unlabeled data?)".to_string(),
                    )
                })?;

                let logits = model.forward(batch.images.clone());
                let loss = CrossEntropyLossConfig::new()
                    .init(&logits.device())
                    .forward(logits, targets);

                let loss_value: f64 = loss.clone().into_scalar().elem();
                epoch_loss += loss_value;

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = self
                    .optimizer
                    .step(self.config.learning_rate, model, grads);
            }

            let avg_loss = epoch_loss / train_batches.len() as f64;
            let val_accuracy = evaluate(&model, val_batches)?;

            // Strict improvement tracks both the best model and the
            // early-stopping counter on the same signal.
            let improved = match &mut stopping {
                Some(stopping) => stopping.observe(val_accuracy),
                None => val_accuracy > state.best_val_accuracy,
            };

            state.record_epoch(avg_loss, val_accuracy);
            logger.end_epoch(avg_loss, val_accuracy);
            if improved {
                best_model = Some(model.clone());
                logger.log_new_best(val_accuracy);
            }

            if let Some(stopping) = &stopping {
                if stopping.should_stop() {
                    state.stopped_early = true;
                    logger.log_early_stop(stopping.patience);
                    break;
                }
            }
        }

        logger.log_complete(state.best_val_accuracy);

        let model = match (self.config.restore, best_model) {
            (RestorePolicy::Best, Some(best)) => best,
            _ => model,
        };

        Ok(TrainingOutcome { model, state })
    }
}

/// Accuracy of the model on labeled batches, evaluated on the inner backend
/// without gradient tracking.
pub fn evaluate<B: AutodiffBackend>(
    model: &BreedClassifier<B>,
    batches: &[DogBatch<B::InnerBackend>],
) -> Result<f64> {
    let inner_model = model.clone().valid();
    let mut correct = 0usize;
    let mut total = 0usize;

    for batch in batches {
        let targets = batch.targets.clone().ok_or_else(|| {
            DogBreedError::Training("validation batch is missing targets".to_string())
        })?;

        let output = inner_model.forward(batch.images.clone());
        let predictions = output.argmax(1).squeeze::<1>(1);

        let batch_correct: i64 = predictions
            .equal(targets)
            .int()
            .sum()
            .into_scalar()
            .elem();
        correct += batch_correct as usize;
        total += batch.size;
    }

    if total == 0 {
        return Err(DogBreedError::Training(
            "no validation samples to evaluate".to_string(),
        ));
    }
    Ok(correct as f64 / total as f64)
}
