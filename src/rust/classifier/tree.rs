use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::model::ProbabilisticClassifier;
use super::utils::gini;
use crate::error::{RecommenderError, Result};

const IMPURITY_EPSILON: f64 = 1e-12;
const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Normalised weighted class distribution of the training rows that reached it
    Leaf { distribution: Vec<f64> },
}

/// Growth limits for a single tree, already resolved against the data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

/// A CART classification tree over integer-coded categorical features,
/// stored as a flat node arena with the root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

struct Grower<'a, 'r> {
    x: ArrayView2<'a, usize>,
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    params: TreeParams,
    rng: &'r mut StdRng,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl DecisionTree {
    /// Grows a tree on the rows listed in `samples`, each weighted by
    /// `weights[row]`. Rows absent from `samples` do not participate.
    pub(crate) fn fit(
        x: ArrayView2<'_, usize>,
        y: &[usize],
        weights: &[f64],
        samples: Vec<usize>,
        n_classes: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(RecommenderError::Training("Cannot grow a tree without samples".into()));
        }
        let mut grower = Grower {
            x: x.view(),
            y,
            weights,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(samples, 0);
        Ok(Self {
            nodes: grower.nodes,
            n_features: x.ncols(),
            n_classes,
        })
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], i: usize) -> usize {
            match &nodes[i] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn leaf_for(&self, x: ArrayView1<'_, usize>) -> Result<&[f64]> {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(Node::Leaf { distribution }) => return Ok(distribution),
                Some(Node::Split { feature, threshold, left, right }) => {
                    i = if (x[*feature] as f64) <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(RecommenderError::ArtifactLoad(format!(
                        "Tree node {} out of range ({} nodes)",
                        i,
                        self.nodes.len()
                    )))
                }
            }
        }
    }

    /// Checks node references after deserialization.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(RecommenderError::ArtifactLoad("Tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, left, right, .. } => {
                    if *feature >= self.n_features
                        || *left <= i
                        || *right <= i
                        || *left >= self.nodes.len()
                        || *right >= self.nodes.len()
                    {
                        return Err(RecommenderError::ArtifactLoad(format!("Tree node {} is malformed", i)));
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != self.n_classes {
                        return Err(RecommenderError::ArtifactLoad(format!(
                            "Leaf {} has {} classes, expected {}",
                            i,
                            distribution.len(),
                            self.n_classes
                        )));
                    }
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
                        return Err(RecommenderError::ArtifactLoad(format!(
                            "Leaf {} holds a value outside [0, 1]",
                            i
                        )));
                    }
                    let sum: f64 = distribution.iter().sum();
                    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
                        return Err(RecommenderError::ArtifactLoad(format!(
                            "Leaf {} sums to {}, expected 1",
                            i, sum
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView1<'_, usize>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        Ok(Array1::from(self.leaf_for(x)?.to_vec()))
    }
}

impl Grower<'_, '_> {
    fn class_weights(&self, samples: &[usize]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for &s in samples {
            totals[self.y[s]] += self.weights[s];
        }
        totals
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let totals = self.class_weights(&samples);
        let impurity = gini(&totals);

        let at_depth_limit = self.params.max_depth.is_some_and(|max| depth >= max);
        let stop = at_depth_limit
            || samples.len() < self.params.min_samples_split
            || samples.len() < 2 * self.params.min_samples_leaf
            || impurity <= IMPURITY_EPSILON;

        let split = if stop { None } else { self.best_split(&samples, &totals, impurity) };

        let Some(split) = split else {
            return self.push_leaf(totals);
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| (self.x[[s, split.feature]] as f64) <= split.threshold);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { distribution: Vec::new() });
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn push_leaf(&mut self, totals: Vec<f64>) -> usize {
        let sum: f64 = totals.iter().sum();
        let distribution = if sum > 0.0 {
            totals.iter().map(|w| w / sum).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    /// Searches a random subset of non-constant features for the threshold
    /// with the lowest weighted child impurity.
    fn best_split(&mut self, samples: &[usize], totals: &[f64], impurity: f64) -> Option<BestSplit> {
        let total_weight: f64 = totals.iter().sum();
        let parent_score = impurity * total_weight;

        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;
        for feature in features {
            if visited >= self.params.max_features {
                break;
            }
            let mut order: Vec<usize> = samples.to_vec();
            order.sort_by_key(|&s| self.x[[s, feature]]);
            let first = self.x[[order[0], feature]];
            let last = self.x[[order[order.len() - 1], feature]];
            if first == last {
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.scan_feature(feature, &order, totals) {
                if candidate.score < parent_score - IMPURITY_EPSILON
                    && best.as_ref().map_or(true, |b| candidate.score < b.score)
                {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn scan_feature(&self, feature: usize, order: &[usize], totals: &[f64]) -> Option<BestSplit> {
        let min_leaf = self.params.min_samples_leaf;
        let mut left = vec![0.0; self.n_classes];
        let mut best: Option<BestSplit> = None;

        for i in 0..order.len() - 1 {
            let s = order[i];
            left[self.y[s]] += self.weights[s];

            let here = self.x[[s, feature]];
            let next = self.x[[order[i + 1], feature]];
            if here == next {
                continue;
            }
            let n_left = i + 1;
            if n_left < min_leaf || order.len() - n_left < min_leaf {
                continue;
            }

            let right: Vec<f64> = totals.iter().zip(&left).map(|(t, l)| t - l).collect();
            let w_left: f64 = left.iter().sum();
            let w_right: f64 = right.iter().sum();
            let score = w_left * gini(&left) + w_right * gini(&right);

            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(BestSplit {
                    feature,
                    threshold: (here as f64 + next as f64) / 2.0,
                    score,
                });
            }
        }
        best
    }
}
