use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::features::DEFAULT_PLACEHOLDER;
use crate::schema::FeatureSchema;

pub const DATA_PATH_ENV: &str = "MAJOR_RECOMMENDER_DATA";
pub const ARTIFACTS_DIR_ENV: &str = "MAJOR_RECOMMENDER_ARTIFACTS";

pub const DEFAULT_DATA_PATH: &str = "student_answers.csv";
pub const DEFAULT_CLASSIFIER_FILE: &str = "major_recommender_model.json";
pub const DEFAULT_ENCODERS_FILE: &str = "label_encoders.json";

/// How many features each split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl MaxFeatures {
    /// Resolves to a concrete count in `1..=n_features`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(c) => c,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Per-class sample weighting applied while growing trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    Uniform,
    /// `n_samples / (n_present_classes * class_count)`
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub class_weight: ClassWeight,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Balanced,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Settings for one offline training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub classifier_file: String,
    pub encoders_file: String,
    pub schema: FeatureSchema,
    pub placeholder: String,
    /// Lower bound on the held-out share; the class count may raise it
    pub min_test_fraction: f64,
    pub split_seed: u64,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            artifacts_dir: PathBuf::from("."),
            classifier_file: DEFAULT_CLASSIFIER_FILE.to_string(),
            encoders_file: DEFAULT_ENCODERS_FILE.to_string(),
            schema: FeatureSchema::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            min_test_fraction: 0.2,
            split_seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Defaults with the dataset path and artifact directory taken from the
    /// environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var(DATA_PATH_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var(ARTIFACTS_DIR_ENV) {
            config.artifacts_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.classifier_file)
    }

    pub fn encoders_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.encoders_file)
    }
}
