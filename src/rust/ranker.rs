use std::cmp::Ordering;
use std::fmt;

use ndarray::ArrayView1;
use serde::Serialize;

use crate::encoder::CategoryEncoder;
use crate::error::Result;

/// One ranked suggestion: a decoded target label and its probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub label: String,
    pub score: f64,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.score * 100.0)
    }
}

/// Class indices with nonzero probability, best first. Equal scores keep
/// ascending class index order.
pub fn rank_indices(proba: ArrayView1<'_, f64>, n: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = proba
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, p)| p > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Top `n` classes of `proba`, decoded through the target encoder.
///
/// Returns `min(n, classes with nonzero probability)` entries.
///
/// # Errors
/// - `InvalidCode` if `proba` is wider than the target vocabulary
pub fn rank(proba: ArrayView1<'_, f64>, n: usize, target: &CategoryEncoder) -> Result<Vec<Recommendation>> {
    rank_indices(proba, n)
        .into_iter()
        .map(|(class, score)| {
            Ok(Recommendation {
                label: target.inverse_transform(class)?.to_string(),
                score,
            })
        })
        .collect()
}
