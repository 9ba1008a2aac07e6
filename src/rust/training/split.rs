use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{RecommenderError, Result};

/// Row indices of a train/test partition, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of held-out rows: the larger of the class count and
/// `floor(min_test_fraction * n_rows)`.
///
/// # Errors
/// - `DatasetValidation` if that would leave no training rows
pub fn test_size(n_rows: usize, n_classes: usize, min_test_fraction: f64) -> Result<usize> {
    let by_fraction = (min_test_fraction * n_rows as f64).floor() as usize;
    let size = n_classes.max(by_fraction);
    if size >= n_rows {
        return Err(RecommenderError::DatasetValidation(format!(
            "Not enough samples to split: {} samples, {} classes",
            n_rows, n_classes
        )));
    }
    Ok(size)
}

/// Partitions rows labelled `y` (class indices) into train and test sets.
///
/// With more than one class present the split is stratified: every class
/// keeps at least one row on each side and the remaining test rows are
/// allotted in proportion to class frequency.
///
/// # Errors
/// - `DatasetValidation` if the dataset is too small for the test size rule,
///   a class has a single row, or the training side would hold fewer rows
///   than there are classes
pub fn train_test_split(y: &[usize], min_test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    let n_rows = y.len();
    let mut by_class: Vec<Vec<usize>> = Vec::new();
    for (row, &label) in y.iter().enumerate() {
        if label >= by_class.len() {
            by_class.resize_with(label + 1, Vec::new);
        }
        by_class[label].push(row);
    }
    by_class.retain(|rows| !rows.is_empty());
    let n_classes = by_class.len();

    let n_test = test_size(n_rows, n_classes, min_test_fraction)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let (mut train, mut test) = if n_classes <= 1 {
        let mut rows: Vec<usize> = (0..n_rows).collect();
        rows.shuffle(&mut rng);
        let train = rows.split_off(n_test);
        (train, rows)
    } else {
        let allocation = stratified_allocation(&by_class, n_rows, n_test)?;
        let mut train = Vec::with_capacity(n_rows - n_test);
        let mut test = Vec::with_capacity(n_test);
        for (mut rows, take) in by_class.into_iter().zip(allocation) {
            rows.shuffle(&mut rng);
            let rest = rows.split_off(take);
            test.extend(rows);
            train.extend(rest);
        }
        (train, test)
    };

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

/// Test rows per class summing to `n_test`, each in `1..=count-1`.
fn stratified_allocation(by_class: &[Vec<usize>], n_rows: usize, n_test: usize) -> Result<Vec<usize>> {
    let n_classes = by_class.len();
    if let Some(rows) = by_class.iter().find(|rows| rows.len() < 2) {
        return Err(RecommenderError::DatasetValidation(format!(
            "The least populated class has only {} member; every class needs at least 2 to stratify",
            rows.len()
        )));
    }
    let n_train = n_rows - n_test;
    if n_train < n_classes {
        return Err(RecommenderError::DatasetValidation(format!(
            "Training split of {} rows cannot cover {} classes",
            n_train, n_classes
        )));
    }

    let ideal: Vec<f64> = by_class
        .iter()
        .map(|rows| n_test as f64 * rows.len() as f64 / n_rows as f64)
        .collect();
    let mut take: Vec<usize> = by_class
        .iter()
        .zip(&ideal)
        .map(|(rows, &share)| (share.floor() as usize).clamp(1, rows.len() - 1))
        .collect();

    // Largest shortfall gains a row, largest surplus gives one back; ties go
    // to the lower class index.
    let mut assigned: usize = take.iter().sum();
    while assigned < n_test {
        let next = (0..n_classes)
            .filter(|&k| take[k] < by_class[k].len() - 1)
            .max_by(|&a, &b| {
                let (da, db) = (ideal[a] - take[a] as f64, ideal[b] - take[b] as f64);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal).then(b.cmp(&a))
            });
        match next {
            Some(k) => take[k] += 1,
            None => break,
        }
        assigned += 1;
    }
    while assigned > n_test {
        let next = (0..n_classes).filter(|&k| take[k] > 1).max_by(|&a, &b| {
            let (sa, sb) = (take[a] as f64 - ideal[a], take[b] as f64 - ideal[b]);
            sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal).then(b.cmp(&a))
        });
        match next {
            Some(k) => take[k] -= 1,
            None => break,
        }
        assigned -= 1;
    }

    if assigned != n_test {
        return Err(RecommenderError::DatasetValidation(format!(
            "Cannot stratify {} test rows across {} classes",
            n_test, n_classes
        )));
    }
    Ok(take)
}
