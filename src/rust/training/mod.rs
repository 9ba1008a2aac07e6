//! Offline training: load, clean, fit encoders, split, fit the forest,
//! evaluate, persist.

mod dataset;
mod metrics;
mod pipeline;
mod split;

pub use dataset::{Dataset, EncodedDataset};
pub use metrics::{accuracy, ClassMetrics, ClassificationReport};
pub use pipeline::{Stage, TrainedModel, TrainingPipeline, TrainingReport};
pub use split::{test_size, train_test_split, SplitIndices};
