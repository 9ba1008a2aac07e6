use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use log::{debug, info};

use super::forest::RandomForest;
use super::tree::{DecisionTree, TreeParams};
use crate::config::{ClassWeight, ForestConfig, MaxFeatures};
use crate::error::{RecommenderError, Result};

/// A builder for fitting a [`RandomForest`] with a fluent interface.
///
/// # Example
/// ```
/// use major_recommender::{MaxFeatures, ProbabilisticClassifier, RandomForest};
/// use ndarray::array;
///
/// let x = array![[0usize, 1], [0, 0], [1, 1], [1, 0]];
/// let y = [0, 0, 1, 1];
/// let forest = RandomForest::builder()
///     .with_n_estimators(10)?
///     .with_max_features(MaxFeatures::All)
///     .with_bootstrap(false)
///     .fit(x.view(), &y, 2)?;
/// assert_eq!(forest.predict(array![1usize, 1].view())?, 1);
/// # Ok::<(), major_recommender::RecommenderError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForestBuilder {
    config: ForestConfig,
}

impl ForestBuilder {
    /// Creates a builder with the default configuration (100 trees,
    /// sqrt features per split, balanced class weights)
    pub fn new() -> Self {
        Self {
            config: ForestConfig::default(),
        }
    }

    /// Replaces the whole configuration
    pub fn with_config(mut self, config: ForestConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of trees
    ///
    /// # Errors
    /// - `Training` if `n` is zero
    pub fn with_n_estimators(mut self, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(RecommenderError::Training("A forest needs at least one tree".into()));
        }
        self.config.n_estimators = n;
        Ok(self)
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.max_features = max_features;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.config.class_weight = class_weight;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Validates training data according to the following rules:
    /// - At least one row and one feature
    /// - One label per row
    /// - Every label is below `n_classes`
    fn validate_training_data(x: ArrayView2<'_, usize>, y: &[usize], n_classes: usize) -> Result<()> {
        if x.nrows() == 0 {
            return Err(RecommenderError::Training("Training data has no rows".into()));
        }
        if x.ncols() == 0 {
            return Err(RecommenderError::Training("Training data has no features".into()));
        }
        if x.nrows() != y.len() {
            return Err(RecommenderError::Training(format!(
                "Feature rows ({}) and labels ({}) differ in length",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(RecommenderError::Training(format!(
                "Label {} is out of range for {} classes",
                bad, n_classes
            )));
        }
        Ok(())
    }

    fn validate_config(config: &ForestConfig) -> Result<()> {
        if config.n_estimators == 0 {
            return Err(RecommenderError::Training("A forest needs at least one tree".into()));
        }
        if config.min_samples_split < 2 {
            return Err(RecommenderError::Training("min_samples_split must be at least 2".into()));
        }
        if config.min_samples_leaf < 1 {
            return Err(RecommenderError::Training("min_samples_leaf must be at least 1".into()));
        }
        Ok(())
    }

    /// Per-class weights for the labels actually present in `y`.
    fn class_weights(&self, y: &[usize], n_classes: usize) -> Vec<f64> {
        match self.config.class_weight {
            ClassWeight::Uniform => vec![1.0; n_classes],
            ClassWeight::Balanced => {
                let mut counts = vec![0usize; n_classes];
                for &label in y {
                    counts[label] += 1;
                }
                let present = counts.iter().filter(|&&c| c > 0).count();
                counts
                    .iter()
                    .map(|&c| {
                        if c == 0 {
                            0.0
                        } else {
                            y.len() as f64 / (present * c) as f64
                        }
                    })
                    .collect()
            }
        }
    }

    /// Fits the forest on encoded rows `x` and class indices `y`.
    ///
    /// `n_classes` is the size of the target vocabulary; classes that do not
    /// occur in `y` keep probability zero.
    ///
    /// # Errors
    /// - `Training` if the data or configuration is invalid
    pub fn fit(self, x: ArrayView2<'_, usize>, y: &[usize], n_classes: usize) -> Result<RandomForest> {
        Self::validate_config(&self.config)?;
        Self::validate_training_data(x, y, n_classes)?;

        let class_weights = self.class_weights(y, n_classes);
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(x.ncols()),
        };
        let n_rows = x.nrows();

        info!(
            "Fitting {} trees on {} rows x {} features ({} classes)",
            self.config.n_estimators,
            n_rows,
            x.ncols(),
            n_classes
        );

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for t in 0..self.config.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(t as u64));

            // Bootstrap multiplicity folds into the sample weight.
            let mut multiplicity = vec![0usize; n_rows];
            if self.config.bootstrap {
                for _ in 0..n_rows {
                    multiplicity[rng.gen_range(0..n_rows)] += 1;
                }
            } else {
                multiplicity.iter_mut().for_each(|m| *m = 1);
            }

            let weights: Vec<f64> = (0..n_rows)
                .map(|row| class_weights[y[row]] * multiplicity[row] as f64)
                .collect();
            let samples: Vec<usize> = (0..n_rows).filter(|&row| multiplicity[row] > 0).collect();

            let tree = DecisionTree::fit(x, y, &weights, samples, n_classes, params, &mut rng)?;
            debug!("Tree {} grown: {} nodes, depth {}", t, tree.n_nodes(), tree.depth());
            trees.push(tree);
        }

        Ok(RandomForest::from_trees(trees, x.ncols(), n_classes, self.config))
    }
}
