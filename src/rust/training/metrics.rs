use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::encoder::CategoryEncoder;
use crate::error::{RecommenderError, Result};

/// Fraction of positions where `truth` and `pred` agree. Zero for empty input.
pub fn accuracy(truth: &[usize], pred: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Occurrences in the ground truth
    pub support: usize,
}

/// Per-class held-out metrics with accuracy and macro/weighted averages.
///
/// Rows cover every class that appears in either the ground truth or the
/// predictions, in class-index order. A ratio with a zero denominator is
/// reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// # Errors
    /// - `Training` if `truth` and `pred` differ in length
    /// - `InvalidCode` if a class index is outside the target encoder
    pub fn new(truth: &[usize], pred: &[usize], target: &CategoryEncoder) -> Result<Self> {
        if truth.len() != pred.len() {
            return Err(RecommenderError::Training(format!(
                "Report needs equal-length inputs, got {} labels and {} predictions",
                truth.len(),
                pred.len()
            )));
        }

        let present: BTreeSet<usize> = truth.iter().chain(pred).copied().collect();
        let mut classes = Vec::with_capacity(present.len());
        for class in present {
            let tp = count(truth, pred, |t, p| t == class && p == class);
            let fp = count(truth, pred, |t, p| t != class && p == class);
            let fn_ = count(truth, pred, |t, p| t == class && p != class);
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            classes.push(ClassMetrics {
                label: target.inverse_transform(class)?.to_string(),
                precision,
                recall,
                f1: f1(precision, recall),
                support: tp + fn_,
            });
        }

        let total: usize = classes.iter().map(|c| c.support).sum();
        let macro_avg = average(&classes, "macro avg", |_| 1.0);
        let weighted_avg = average(&classes, "weighted avg", |c| c.support as f64);

        Ok(Self {
            accuracy: accuracy(truth, pred),
            macro_avg: ClassMetrics { support: total, ..macro_avg },
            weighted_avg: ClassMetrics { support: total, ..weighted_avg },
            classes,
        })
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn count(truth: &[usize], pred: &[usize], hit: impl Fn(usize, usize) -> bool) -> usize {
    truth.iter().zip(pred).filter(|&(&t, &p)| hit(t, p)).count()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn average(classes: &[ClassMetrics], label: &str, weight: impl Fn(&ClassMetrics) -> f64) -> ClassMetrics {
    let total: f64 = classes.iter().map(&weight).sum();
    let mean = |field: fn(&ClassMetrics) -> f64| {
        if total == 0.0 {
            0.0
        } else {
            classes.iter().map(|c| field(c) * weight(c)).sum::<f64>() / total
        }
    };
    ClassMetrics {
        label: label.to_string(),
        precision: mean(|c| c.precision),
        recall: mean(|c| c.recall),
        f1: mean(|c| c.f1),
        support: 0,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);
        let row = |f: &mut fmt::Formatter<'_>, m: &ClassMetrics| {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label,
                m.precision,
                m.recall,
                m.f1,
                m.support,
                width = width
            )
        };

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = width
        )?;
        writeln!(f)?;
        for class in &self.classes {
            row(f, class)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support,
            width = width
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}
