use anyhow::Context;
use clap::Parser;
use log::{error, info};
use major_recommender::{TrainingConfig, TrainingPipeline};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "Train the major recommender from historical answers", long_about = None)]
struct Args {
    /// Labelled answers CSV (defaults to $MAJOR_RECOMMENDER_DATA or student_answers.csv)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory the classifier and encoder artifacts are written to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Number of trees in the forest
    #[arg(long)]
    trees: Option<usize>,

    /// Seed for the split and the forest
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = TrainingConfig::from_env();
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(dir) = args.out_dir {
        config.artifacts_dir = dir;
    }
    if let Some(trees) = args.trees {
        config.forest.n_estimators = trees;
    }
    if let Some(seed) = args.seed {
        config.split_seed = seed;
        config.forest.seed = seed;
    }

    let start_time = Instant::now();
    info!("=== Starting training run ===");
    let report = TrainingPipeline::new(config)
        .run()
        .map_err(|e| {
            error!("Training failed: {}", e);
            e
        })
        .context("Training run did not produce artifacts")?;

    info!(
        "Trained on {} rows ({} train / {} test, {} classes), accuracy {:.4}",
        report.n_rows, report.n_train, report.n_test, report.n_classes, report.accuracy
    );
    info!("=== Training process completed (took {:.2?}) ===", start_time.elapsed());
    Ok(())
}
