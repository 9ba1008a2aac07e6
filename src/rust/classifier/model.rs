use ndarray::{Array1, ArrayView1, ArrayView2};

use super::utils::argmax;
use crate::error::{RecommenderError, Result};

/// A fitted multi-class model producing a probability per class for one
/// encoded feature vector.
///
/// Implementors only provide `predict_proba`; `predict` is always the argmax
/// of it, with the lowest class index winning ties.
pub trait ProbabilisticClassifier {
    /// Number of target classes (length of every `predict_proba` output)
    fn n_classes(&self) -> usize;

    /// Number of features every input vector must have
    fn n_features(&self) -> usize;

    /// Probability per class index; entries sum to 1 within float tolerance.
    ///
    /// # Errors
    /// - `SchemaMismatch` if `x` has the wrong number of features
    fn predict_proba(&self, x: ArrayView1<'_, usize>) -> Result<Array1<f64>>;

    /// Most probable class index.
    fn predict(&self, x: ArrayView1<'_, usize>) -> Result<usize> {
        let proba = self.predict_proba(x)?;
        argmax(proba.view())
            .ok_or_else(|| RecommenderError::ArtifactLoad("Classifier has no classes".into()))
    }

    /// Most probable class for every row of `x`.
    fn predict_batch(&self, x: ArrayView2<'_, usize>) -> Result<Vec<usize>> {
        x.rows().into_iter().map(|row| self.predict(row)).collect()
    }

    /// Rejects vectors whose width differs from the trained feature count.
    fn check_width(&self, x: ArrayView1<'_, usize>) -> Result<()> {
        if x.len() != self.n_features() {
            return Err(RecommenderError::SchemaMismatch(format!(
                "Feature vector has {} entries, model expects {}",
                x.len(),
                self.n_features()
            )));
        }
        Ok(())
    }
}
