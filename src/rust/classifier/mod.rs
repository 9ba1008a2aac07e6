mod model;
mod tree;
mod forest;
pub mod builder;
mod utils;

pub use model::ProbabilisticClassifier;
pub use tree::DecisionTree;
pub use forest::RandomForest;
pub use builder::ForestBuilder;
pub(crate) use utils::argmax;

/// Information about a fitted classifier and the vocabulary it predicts over
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path the classifier artifact was loaded from, if any
    pub classifier_path: Option<String>,
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Labels of the classes, in class-index order
    pub class_labels: Vec<String>,
    /// Feature slots, in vector order
    pub feature_names: Vec<String>,
    /// Number of trees in the ensemble
    pub num_trees: usize,
    /// Mean depth of the trees
    pub avg_depth: f64,
}
