use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::model::ProbabilisticClassifier;
use super::tree::DecisionTree;
use super::utils::{average_vectors, normalize_distribution};
use crate::config::ForestConfig;
use crate::error::{RecommenderError, Result};

/// A bagged ensemble of [`DecisionTree`]s. Class probabilities are the mean
/// of the leaf distributions reached in every tree.
///
/// # Thread Safety
///
/// The forest is immutable once fitted and holds only owned plain data, so it
/// is `Send + Sync` and can be shared by reference (or `Arc`) across any
/// number of concurrent prediction calls without locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    config: ForestConfig,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<RandomForest>();
    }
};

impl RandomForest {
    /// Creates a new ForestBuilder for fluent construction
    pub fn builder() -> super::builder::ForestBuilder {
        super::builder::ForestBuilder::new()
    }

    pub(crate) fn from_trees(
        trees: Vec<DecisionTree>,
        n_features: usize,
        n_classes: usize,
        config: ForestConfig,
    ) -> Self {
        Self {
            trees,
            n_features,
            n_classes,
            config,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural check run after loading from disk.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(RecommenderError::ArtifactLoad("Forest contains no trees".into()));
        }
        if self.n_classes == 0 || self.n_features == 0 {
            return Err(RecommenderError::ArtifactLoad(
                "Forest must have at least one class and one feature".into(),
            ));
        }
        for tree in &self.trees {
            if tree.n_classes() != self.n_classes || tree.n_features() != self.n_features {
                return Err(RecommenderError::ArtifactLoad(
                    "Inconsistent class or feature count across trees".into(),
                ));
            }
            tree.validate()?;
        }
        Ok(())
    }

    /// Mean tree depth, reported after training.
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView1<'_, usize>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        let per_tree = self
            .trees
            .iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<_>>>()?;
        Ok(normalize_distribution(&average_vectors(&per_tree, self.n_classes)))
    }
}
