//! Recommends academic majors from a fixed set of categorical survey
//! answers, using a random forest trained offline on historical answers.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use major_recommender::{Dataset, FeatureSchema, Recommender, TrainingPipeline};
//!
//! let schema = FeatureSchema::new(vec!["favorite_subject", "budget"], "target")?;
//! let csv = "favorite_subject,budget,target\n\
//!     Math,Low,Engineering\nMath,High,Engineering\nPhysics,Low,Engineering\n\
//!     Biology,Low,Medicine\nBiology,High,Medicine\nChemistry,High,Medicine\n";
//! let dataset = Dataset::from_reader(csv.as_bytes(), &schema, "Unknown")?;
//!
//! let model = TrainingPipeline::default().fit(&dataset)?;
//! let recommender = Recommender::new(model.forest, model.encoders)?;
//!
//! for rec in recommender.predict_top_n([("favorite_subject", "Biology"), ("budget", "Low")], 2)? {
//!     println!("{}", rec);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A [`Recommender`] is immutable once built and can be shared across
//! threads with `Arc`:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use major_recommender::Recommender;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let recommender = Arc::new(Recommender::load_artifacts(
//!     "major_recommender_model.json",
//!     "label_encoders.json",
//! )?);
//!
//! let mut handles = vec![];
//! for subject in ["Math", "Biology", "History"] {
//!     let recommender = Arc::clone(&recommender);
//!     handles.push(thread::spawn(move || {
//!         recommender.predict_top_n([("favorite_subject", subject)], 3)
//!     }));
//! }
//!
//! for handle in handles {
//!     let _ = handle.join();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod ranker;
pub mod recommender;
pub mod schema;
pub mod training;

pub use artifacts::ArtifactStore;
pub use classifier::{ClassifierInfo, DecisionTree, ForestBuilder, ProbabilisticClassifier, RandomForest};
pub use config::{ClassWeight, ForestConfig, MaxFeatures, TrainingConfig};
pub use encoder::{CategoryEncoder, EncoderSet};
pub use error::{RecommenderError, Result};
pub use features::{FeatureVector, FeatureVectorBuilder, SubjectRecord, DEFAULT_PLACEHOLDER};
pub use ranker::{rank, Recommendation};
pub use recommender::Recommender;
pub use schema::FeatureSchema;
pub use training::{ClassificationReport, Dataset, TrainingPipeline, TrainingReport};

pub fn init_logger() {
    env_logger::init();
}
