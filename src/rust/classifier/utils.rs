use ndarray::{Array1, ArrayView1};

/// Scales `vec` so its entries sum to 1. An all-zero vector stays zero.
pub(crate) fn normalize_distribution(vec: &Array1<f64>) -> Array1<f64> {
    let total: f64 = vec.sum();
    if total > 1e-12 {
        vec / total
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn average_vectors(vectors: &[Array1<f64>], size: usize) -> Array1<f64> {
    if vectors.is_empty() {
        return Array1::zeros(size);
    }
    let sum = vectors.iter().fold(Array1::zeros(vectors[0].len()), |acc, v| acc + v);
    sum / vectors.len() as f64
}

/// Index of the largest entry; the lowest index wins ties.
pub(crate) fn argmax(values: ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Gini impurity of a weighted class histogram.
pub(crate) fn gini(class_weights: &[f64]) -> f64 {
    let total: f64 = class_weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - class_weights.iter().map(|w| (w / total).powi(2)).sum::<f64>()
}
