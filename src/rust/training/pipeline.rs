use std::fmt;
use std::path::PathBuf;

use log::{debug, info};
use ndarray::Axis;
use serde::Serialize;

use super::dataset::Dataset;
use super::metrics::ClassificationReport;
use super::split::train_test_split;
use crate::artifacts::ArtifactStore;
use crate::classifier::{ForestBuilder, ProbabilisticClassifier, RandomForest};
use crate::config::TrainingConfig;
use crate::encoder::EncoderSet;
use crate::error::Result;

/// Steps of a training run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Clean,
    FitEncoders,
    Split,
    FitClassifier,
    Evaluate,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::FitEncoders => "fit encoders",
            Stage::Split => "split",
            Stage::FitClassifier => "fit classifier",
            Stage::Evaluate => "evaluate",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Output of [`TrainingPipeline::fit`]: the matched pair plus held-out
/// diagnostics. Nothing has been written to disk yet.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub forest: RandomForest,
    pub encoders: EncoderSet,
    pub n_train: usize,
    pub n_test: usize,
    pub report: ClassificationReport,
}

/// Summary of a completed [`TrainingPipeline::run`].
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_classes: usize,
    pub accuracy: f64,
    pub classification: ClassificationReport,
    pub classifier_path: PathBuf,
    pub encoders_path: PathBuf,
}

/// Offline batch job that turns a labelled answers file into the
/// (classifier, encoders) artifact pair.
///
/// Stages run strictly in order; any failure aborts the run before the
/// persist stage, so no artifact is written from a failed run.
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load and clean: reads the configured dataset, filling gaps with the
    /// placeholder.
    ///
    /// # Errors
    /// - `Io` if the dataset file is missing
    /// - `DatasetValidation` if a schema column or the target column is absent
    pub fn load(&self) -> Result<Dataset> {
        info!("Stage: {}", Stage::Load);
        let dataset = Dataset::from_csv_path(&self.config.data_path, &self.config.schema, &self.config.placeholder)?;
        info!("Stage: {} ({} rows kept)", Stage::Clean, dataset.n_rows());
        Ok(dataset)
    }

    /// Runs encoder fitting, the split, classifier fitting and evaluation
    /// on an already loaded dataset.
    ///
    /// # Errors
    /// - `DatasetValidation` if the dataset is empty or too small to split
    /// - `Training` if the forest configuration is invalid
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedModel> {
        info!("Stage: {}", Stage::FitEncoders);
        let encoded = dataset.fit_encoders()?;
        let n_classes = encoded.encoders.num_classes();
        info!("Target classes: {:?}", encoded.encoders.target().classes());

        info!("Stage: {}", Stage::Split);
        let split = train_test_split(&encoded.y, self.config.min_test_fraction, self.config.split_seed)?;
        info!(
            "Split {} rows into {} train / {} test",
            dataset.n_rows(),
            split.train.len(),
            split.test.len()
        );

        let x_train = encoded.x.select(Axis(0), &split.train);
        let x_test = encoded.x.select(Axis(0), &split.test);
        let y_train: Vec<usize> = split.train.iter().map(|&row| encoded.y[row]).collect();
        let y_test: Vec<usize> = split.test.iter().map(|&row| encoded.y[row]).collect();

        info!("Stage: {}", Stage::FitClassifier);
        let forest = ForestBuilder::new()
            .with_config(self.config.forest.clone())
            .fit(x_train.view(), &y_train, n_classes)?;

        info!("Stage: {}", Stage::Evaluate);
        let predictions = forest.predict_batch(x_test.view())?;
        debug!("Test predictions: {:?}", predictions);
        let report = ClassificationReport::new(&y_test, &predictions, encoded.encoders.target())?;
        info!("Model accuracy: {:.2}", report.accuracy);
        info!("Classification report:\n{}", report);

        Ok(TrainedModel {
            forest,
            encoders: encoded.encoders,
            n_train: split.train.len(),
            n_test: split.test.len(),
            report,
        })
    }

    /// Writes the pair to the configured artifact paths.
    pub fn persist(&self, model: &TrainedModel) -> Result<ArtifactStore> {
        info!("Stage: {}", Stage::Persist);
        let store = ArtifactStore::new(self.config.classifier_path(), self.config.encoders_path());
        store.save(&model.forest, &model.encoders)?;
        info!("Model saved to {:?}", store.classifier_path());
        info!("Encoders saved to {:?}", store.encoders_path());
        Ok(store)
    }

    /// Runs every stage end to end.
    pub fn run(&self) -> Result<TrainingReport> {
        let dataset = self.load()?;
        let model = self.fit(&dataset)?;
        let store = self.persist(&model)?;

        Ok(TrainingReport {
            n_rows: dataset.n_rows(),
            n_train: model.n_train,
            n_test: model.n_test,
            n_classes: model.encoders.num_classes(),
            accuracy: model.report.accuracy,
            classification: model.report,
            classifier_path: store.classifier_path().to_path_buf(),
            encoders_path: store.encoders_path().to_path_buf(),
        })
    }
}
