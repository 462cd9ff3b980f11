//! Dog Breed Identifier CLI
//!
//! Command-line entry point for training the breed classifier, predicting
//! breeds for new images, and producing a submission file for the Kaggle
//! dog breed identification challenge.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use dogbreed::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use dogbreed::dataset::{
    self, build_samples, create_batches, load_items, split_samples, unlabeled_samples,
    BreedVocabulary, DogBatcher, LabelFile, SplitConfig,
};
use dogbreed::inference::{
    load_prediction_matrix, predict, render_prediction_chart, save_prediction_matrix,
    write_submission, PredictionResult,
};
use dogbreed::model::{load_model, save_model, ModelConfig};
use dogbreed::training::{RestorePolicy, Trainer, TrainerConfig};
use dogbreed::utils::charts;
use dogbreed::utils::logging::{init_logging, LogConfig};

/// Dog Breed Identification
///
/// Trains a convolutional classifier over dog photos labeled with one of 120
/// breeds, then predicts breeds for unseen images.
#[derive(Parser, Debug)]
#[command(name = "dogbreed")]
#[command(version)]
#[command(about = "Dog breed image classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the breed classifier
    Train {
        /// Path to the labels CSV file (columns: id, breed)
        #[arg(short, long, default_value = "data/labels.csv")]
        labels: String,

        /// Directory with training images named `<id>.jpg`
        #[arg(short, long, default_value = "data/train")]
        train_dir: String,

        /// Directory to save the trained model into
        #[arg(short, long, default_value = "output/models")]
        output_dir: String,

        /// Maximum number of training epochs
        #[arg(short, long, default_value = "100")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Adam learning rate
        #[arg(long, default_value = "0.001")]
        learning_rate: f64,

        /// Fraction of samples held out for validation
        #[arg(long, default_value = "0.2")]
        val_fraction: f64,

        /// Random seed for splitting and shuffling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Epochs without validation improvement before stopping
        #[arg(long, default_value = "3")]
        patience: usize,

        /// Disable early stopping entirely
        #[arg(long, default_value = "false")]
        no_early_stop: bool,

        /// Keep the final-epoch weights instead of the best-validation ones
        #[arg(long, default_value = "false")]
        restore_final: bool,

        /// Train on only the first N images (subset experiments)
        #[arg(long)]
        num_images: Option<usize>,

        /// Path to a pretrained backbone weight record
        #[arg(long)]
        pretrained: Option<String>,

        /// Suffix appended to the timestamped model file name
        #[arg(long, default_value = "full-dataset")]
        suffix: String,
    },

    /// Predict breeds for an image file or directory
    Predict {
        /// Path to a saved model (base path, no extension)
        #[arg(short, long)]
        model: String,

        /// Path to an input image or a directory of images
        #[arg(short, long)]
        input: String,

        /// Directory to write per-image confidence charts into
        #[arg(long)]
        charts_dir: Option<String>,

        /// Batch size for inference
        #[arg(short, long, default_value = "32")]
        batch_size: usize,
    },

    /// Predict the test set and write a submission CSV
    Submit {
        /// Path to a saved model (base path, no extension)
        #[arg(short, long)]
        model: String,

        /// Directory with test images
        #[arg(short, long, default_value = "data/test")]
        test_dir: String,

        /// Output path for the submission CSV
        #[arg(short, long, default_value = "output/submission.csv")]
        output: String,

        /// Reuse cached predictions from this CSV instead of running inference
        #[arg(long)]
        cached_preds: Option<String>,

        /// Save raw predictions to this CSV for later reuse
        #[arg(long)]
        save_preds: Option<String>,

        /// Batch size for inference
        #[arg(short, long, default_value = "32")]
        batch_size: usize,
    },

    /// Show label file statistics
    Stats {
        /// Path to the labels CSV file
        #[arg(short, long, default_value = "data/labels.csv")]
        labels: String,

        /// Also check the image count in this training directory
        #[arg(short, long)]
        train_dir: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    match cli.command {
        Commands::Train {
            labels,
            train_dir,
            output_dir,
            epochs,
            batch_size,
            learning_rate,
            val_fraction,
            seed,
            patience,
            no_early_stop,
            restore_final,
            num_images,
            pretrained,
            suffix,
        } => cmd_train(TrainArgs {
            labels,
            train_dir,
            output_dir,
            epochs,
            batch_size,
            learning_rate,
            val_fraction,
            seed,
            patience: if no_early_stop { None } else { Some(patience) },
            restore: if restore_final {
                RestorePolicy::Final
            } else {
                RestorePolicy::Best
            },
            num_images,
            pretrained: pretrained.map(PathBuf::from),
            suffix,
        }),

        Commands::Predict {
            model,
            input,
            charts_dir,
            batch_size,
        } => cmd_predict(&model, &input, charts_dir.as_deref(), batch_size),

        Commands::Submit {
            model,
            test_dir,
            output,
            cached_preds,
            save_preds,
            batch_size,
        } => cmd_submit(
            &model,
            &test_dir,
            &output,
            cached_preds.as_deref(),
            save_preds.as_deref(),
            batch_size,
        ),

        Commands::Stats { labels, train_dir } => cmd_stats(&labels, train_dir.as_deref()),
    }
}

struct TrainArgs {
    labels: String,
    train_dir: String,
    output_dir: String,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    val_fraction: f64,
    seed: u64,
    patience: Option<usize>,
    restore: RestorePolicy,
    num_images: Option<usize>,
    pretrained: Option<PathBuf>,
    suffix: String,
}

fn cmd_train(args: TrainArgs) -> Result<()> {
    println!("{}", "Loading Labels...".cyan().bold());
    let label_file = LabelFile::load(Path::new(&args.labels))?;
    let stats = label_file.stats();
    print!("{}", stats);

    let vocab = BreedVocabulary::from_labels(&label_file.breeds());
    println!("  Vocabulary size: {}", vocab.len());

    let mut samples = build_samples(
        Path::new(&args.train_dir),
        &label_file.ids(),
        &label_file.breeds(),
    )?;
    if let Some(n) = args.num_images {
        println!(
            "{}",
            format!("Subset mode: using the first {} images", n).yellow()
        );
        samples.truncate(n);
    }

    println!();
    println!("{}", "Splitting Dataset...".cyan().bold());
    let split_config = SplitConfig::new(args.val_fraction, args.seed)?;
    let split = split_samples(samples, &split_config)?;
    println!("  Training samples:   {}", split.train.len());
    println!("  Validation samples: {}", split.validation.len());

    let mut model_config = ModelConfig::new(vocab.len());
    if let Some(path) = args.pretrained {
        model_config = model_config.with_pretrained(path);
    }
    let image_size = model_config.image_size;

    println!();
    println!("{}", "Loading Images...".cyan().bold());
    let train_items = load_items(&split.train, Some(&vocab), image_size)?;
    let val_items = load_items(&split.validation, Some(&vocab), image_size)?;

    let device = default_device();
    let train_batcher = DogBatcher::<TrainingBackend>::with_image_size(device.clone(), image_size);
    let val_batcher = DogBatcher::<DefaultBackend>::with_image_size(device.clone(), image_size);

    // Only the training set is shuffled; validation keeps its order.
    let train_batches = create_batches(
        &train_batcher,
        train_items,
        args.batch_size,
        Some(args.seed),
    )?;
    let val_batches = create_batches(&val_batcher, val_items, args.batch_size, None)?;

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Epochs:        {}", args.epochs);
    println!("  Batch size:    {}", args.batch_size);
    println!("  Learning rate: {}", args.learning_rate);
    println!("  Patience:      {:?}", args.patience);
    println!("  Backend:       {}", backend_name());
    println!();

    println!("{}", "Starting Training...".green().bold());
    let model = model_config.init::<TrainingBackend>(&device)?;
    let trainer_config = TrainerConfig {
        max_epochs: args.epochs,
        patience: args.patience,
        learning_rate: args.learning_rate,
        restore: args.restore,
    };
    let outcome = Trainer::new(model, trainer_config)?.train(&train_batches, &val_batches)?;

    let output_dir = PathBuf::from(&args.output_dir);
    std::fs::create_dir_all(&output_dir)?;

    let history_path = output_dir.join("training-history.svg");
    charts::training_history_chart(
        &outcome.state.train_losses,
        &outcome.state.val_accuracies,
        &history_path,
    )?;
    info!("Wrote training history chart to {:?}", history_path);

    println!();
    println!("{}", "Saving Model...".cyan());
    let base = save_model(
        &outcome.model,
        &model_config,
        &vocab,
        &output_dir,
        &args.suffix,
    )?;

    println!();
    println!("{}", "Training Complete!".green().bold());
    println!(
        "  Best validation accuracy: {:.2}%",
        outcome.state.best_val_accuracy * 100.0
    );
    println!("  Model saved to: {:?}", base);
    Ok(())
}

fn cmd_predict(
    model_path: &str,
    input: &str,
    charts_dir: Option<&str>,
    batch_size: usize,
) -> Result<()> {
    println!("{}", "Loading Model...".cyan().bold());
    let device = default_device();
    let (model, vocab, config) = load_model::<DefaultBackend>(Path::new(model_path), &device)?;
    println!("  Breeds:  {}", vocab.len());
    println!("  Backend: {}", backend_name());

    let input_path = Path::new(input);
    let files = if input_path.is_dir() {
        dataset::list_image_files(input_path)?
    } else {
        vec![input_path.to_path_buf()]
    };
    if files.is_empty() {
        println!("{} No images found in {}", "Error:".red(), input);
        return Ok(());
    }

    println!();
    println!("{}", format!("Predicting {} image(s)...", files.len()).cyan());
    let samples = unlabeled_samples(files.clone());
    let items = load_items(&samples, None, config.image_size)?;
    let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, config.image_size);
    let batches = create_batches(&batcher, items, batch_size, None)?;
    let rows = predict(&model, &batches)?;

    if let Some(dir) = charts_dir {
        std::fs::create_dir_all(dir)?;
    }

    println!();
    for (file, row) in files.iter().zip(rows) {
        let result = PredictionResult::from_probabilities(row, &vocab)?;
        println!(
            "{}",
            file.file_name().unwrap_or_default().to_string_lossy()
        );
        println!(
            "  Predicted: {} ({:.1}%)",
            result.breed.green(),
            result.confidence * 100.0
        );
        println!("  Top-5:");
        for (i, (breed, prob)) in result.top_k(5, &vocab).iter().enumerate() {
            println!("    {}. {} ({:.1}%)", i + 1, breed, prob * 100.0);
        }

        if let Some(dir) = charts_dir {
            let stem = file
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let chart_path = Path::new(dir).join(format!("{}.svg", stem));
            render_prediction_chart(&result, &vocab, None, &chart_path)?;
            println!("  Chart: {:?}", chart_path);
        }
        println!();
    }

    Ok(())
}

fn cmd_submit(
    model_path: &str,
    test_dir: &str,
    output: &str,
    cached_preds: Option<&str>,
    save_preds: Option<&str>,
    batch_size: usize,
) -> Result<()> {
    println!("{}", "Loading Model...".cyan().bold());
    let device = default_device();
    let (model, vocab, config) = load_model::<DefaultBackend>(Path::new(model_path), &device)?;

    let files = dataset::list_image_files(Path::new(test_dir))?;
    if files.is_empty() {
        println!("{} No test images found in {}", "Error:".red(), test_dir);
        return Ok(());
    }
    let ids: Vec<String> = files
        .iter()
        .map(|p| p.file_stem().unwrap_or_default().to_string_lossy().to_string())
        .collect();
    println!("  Test images: {}", files.len());

    let rows = match cached_preds {
        Some(path) => {
            println!("{}", "Loading Cached Predictions...".cyan());
            let rows = load_prediction_matrix(Path::new(path))?;
            if rows.len() != ids.len() {
                anyhow::bail!(
                    "cached predictions have {} rows but the test directory has {} images",
                    rows.len(),
                    ids.len()
                );
            }
            rows
        }
        None => {
            println!("{}", "Running Inference...".cyan());
            let samples = unlabeled_samples(files);
            let items = load_items(&samples, None, config.image_size)?;
            let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, config.image_size);
            let batches = create_batches(&batcher, items, batch_size, None)?;
            predict(&model, &batches)?
        }
    };

    if let Some(path) = save_preds {
        save_prediction_matrix(Path::new(path), &rows)?;
        println!("  Cached predictions to: {}", path);
    }

    if let Some(parent) = Path::new(output).parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_submission(Path::new(output), &ids, &vocab, &rows)?;

    println!();
    println!("{}", "Submission Complete!".green().bold());
    println!("  Wrote {} rows to {}", ids.len(), output);
    Ok(())
}

fn cmd_stats(labels: &str, train_dir: Option<&str>) -> Result<()> {
    let label_file = LabelFile::load(Path::new(labels))?;
    let stats = label_file.stats();

    println!("{}", "Label Statistics:".cyan().bold());
    println!("  Total images:     {}", stats.total_rows);
    println!("  Number of breeds: {}", stats.num_breeds);
    println!("  Median per breed: {:.1}", stats.median_per_breed);
    println!();

    println!("{}", "Breed Distribution:".cyan().bold());
    for (breed, count) in &stats.breed_counts {
        let pct = 100.0 * *count as f64 / stats.total_rows as f64;
        println!("  {:40} {:>5} ({:>4.1}%)", breed, count, pct);
    }

    if let Some(dir) = train_dir {
        println!();
        let count = label_file.check_against_dir(Path::new(dir))?;
        if count == label_file.len() {
            println!("{} Image files match label rows ({})", "OK:".green(), count);
        } else {
            println!(
                "{} {} label rows but {} image files in {}",
                "Warning:".yellow(),
                label_file.len(),
                count,
                dir
            );
        }
    }

    Ok(())
}
