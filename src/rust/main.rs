use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use major_recommender::{ArtifactStore, Recommender, SubjectRecord, DEFAULT_PLACEHOLDER};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "Recommend majors from survey answers", long_about = None)]
struct Args {
    /// Answers as `slot=value`, e.g. `favorite_subject=Math`
    #[arg(value_name = "SLOT=VALUE")]
    answers: Vec<String>,

    /// Number of recommendations to print
    #[arg(short = 'n', long, default_value_t = 3)]
    top: usize,

    /// Classifier artifact (defaults to the artifact directory)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Encoder artifact (defaults to the artifact directory)
    #[arg(long)]
    encoders: Option<PathBuf>,

    /// Value used for unanswered slots
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    placeholder: String,

    /// Print the model summary before predicting
    #[arg(short, long)]
    info: bool,
}

fn parse_answer(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((slot, value)) if !slot.trim().is_empty() => Ok((slot.trim().to_string(), value.trim().to_string())),
        _ => bail!("Answer '{}' is not of the form slot=value", raw),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let default_store = ArtifactStore::new_default();
    let store = ArtifactStore::new(
        args.model.unwrap_or_else(|| default_store.classifier_path().to_path_buf()),
        args.encoders.unwrap_or_else(|| default_store.encoders_path().to_path_buf()),
    );

    let start_time = Instant::now();
    info!("Loading recommender...");
    let recommender = Recommender::from_store(&store)
        .context("Recommendations unavailable: trained artifacts could not be loaded")?
        .with_placeholder(args.placeholder);
    info!("Recommender loaded (took {:.2?})", start_time.elapsed());

    if args.info {
        let info = recommender.info();
        println!("Classifier: {:?}", info.classifier_path);
        println!("  Features: {}", info.feature_names.join(", "));
        println!("  Classes ({}): {}", info.num_classes, info.class_labels.join(", "));
        println!("  Trees: {} (average depth {:.1})", info.num_trees, info.avg_depth);
    }

    let answers = args
        .answers
        .iter()
        .map(|raw| parse_answer(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let record = SubjectRecord::from_answers(recommender.schema().clone(), answers)?;
    let missing = record.missing_slots();
    if !missing.is_empty() {
        info!("Unanswered slots filled with placeholder: {:?}", missing);
    }

    let predict_start = Instant::now();
    let recommendations = recommender.predict_top_n_for(&record, args.top)?;
    info!("Prediction took {:.2?}", predict_start.elapsed());

    println!("\nRecommended majors:");
    for (i, rec) in recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }

    Ok(())
}
