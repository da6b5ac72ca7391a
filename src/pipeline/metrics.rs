//! Classifier evaluation: confusion tallies and derived statistics
//!
//! All functions take aligned slices of truth labels (0/1, 1 = churn),
//! predicted labels and positive-class probabilities, and are deterministic.

use serde::Serialize;

use super::error::{PrepError, PrepResult};

/// Default probability cut-off for turning scores into labels
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Counts of the four prediction outcomes at a fixed decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    /// Tally aligned truth and predicted labels
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> PrepResult<Self> {
        check_non_empty(truth.len())?;
        check_same_length("predicted", truth.len(), predicted.len())?;
        check_binary("truth", truth)?;
        check_binary("predicted", predicted)?;

        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (1, 1) => cm.true_positive += 1,
                (0, 1) => cm.false_positive += 1,
                (0, 0) => cm.true_negative += 1,
                _ => cm.false_negative += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// TP / (TP + FP); 0 when no positive predictions were made
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// TP / (TP + FN); 0 when there are no positive cases
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// TN / (TN + FP); 0 when there are no negative cases
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }

    /// Weighted harmonic mean of precision and recall; 0 when both are 0
    pub fn f_beta(&self, beta: f64) -> PrepResult<f64> {
        if !(beta > 0.0 && beta.is_finite()) {
            return Err(PrepError::invalid(
                "beta",
                format!("must be a positive finite number, got {}", beta),
            ));
        }

        Ok(self.f_beta_unchecked(beta))
    }

    pub fn f1(&self) -> f64 {
        self.f_beta_unchecked(1.0)
    }

    fn f_beta_unchecked(&self, beta: f64) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        let b2 = beta * beta;
        (1.0 + b2) * p * r / (b2 * p + r)
    }
}

/// Points of the ROC curve as (false-positive rate, true-positive rate),
/// starting at (0, 0) and ending at (1, 1).
///
/// Rows are swept by descending probability; rows sharing a probability
/// move the curve in one combined step, so the result does not depend on
/// the order of tied rows.
pub fn roc_curve(truth: &[u8], probability: &[f64]) -> PrepResult<Vec<(f64, f64)>> {
    check_non_empty(truth.len())?;
    check_same_length("probability", truth.len(), probability.len())?;
    check_binary("truth", truth)?;
    check_probabilities(probability)?;

    let total_pos = truth.iter().filter(|&&t| t == 1).count();
    let total_neg = truth.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return Err(PrepError::degenerate(
            "truth",
            "ROC needs both positive and negative cases",
        ));
    }

    let mut order: Vec<usize> = (0..truth.len()).collect();
    order.sort_by(|&a, &b| probability[b].total_cmp(&probability[a]));

    let mut points = Vec::with_capacity(order.len() + 1);
    points.push((0.0, 0.0));

    let n = order.len();
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;

    while i < n {
        let current = probability[order[i]];
        let mut j = i;

        // Consume the whole tie group before emitting a point
        while j < n && probability[order[j]] == current {
            if truth[order[j]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            j += 1;
        }

        points.push((fp as f64 / total_neg as f64, tp as f64 / total_pos as f64));
        i = j;
    }

    Ok(points)
}

/// Area under the ROC curve by trapezoidal integration
pub fn roc_auc(truth: &[u8], probability: &[f64]) -> PrepResult<f64> {
    let points = roc_curve(truth, probability)?;
    let area = points
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum::<f64>();
    Ok(area.clamp(0.0, 1.0))
}

/// Label each row 1 when its probability is at or above `threshold`
pub fn labels_from_probabilities(probability: &[f64], threshold: f64) -> PrepResult<Vec<u8>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PrepError::invalid(
            "threshold",
            format!("must be between 0 and 1, got {}", threshold),
        ));
    }
    check_probabilities(probability)?;
    Ok(probability
        .iter()
        .map(|&p| u8::from(p >= threshold))
        .collect())
}

/// Fixed-shape evaluation report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc: f64,
}

/// Compute the full report from aligned truth, predicted labels and probabilities
pub fn evaluate(truth: &[u8], predicted: &[u8], probability: &[f64]) -> PrepResult<MetricsReport> {
    let confusion = ConfusionMatrix::from_labels(truth, predicted)?;
    let auc = roc_auc(truth, probability)?;

    Ok(MetricsReport {
        accuracy: confusion.accuracy(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1: confusion.f1(),
        auc,
        confusion,
    })
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn check_non_empty(len: usize) -> PrepResult<()> {
    if len == 0 {
        return Err(PrepError::EmptyInput(
            "metrics need at least one prediction".to_string(),
        ));
    }
    Ok(())
}

fn check_same_length(name: &str, expected: usize, actual: usize) -> PrepResult<()> {
    if expected != actual {
        return Err(PrepError::invalid(
            name,
            format!("has {} values, truth has {}", actual, expected),
        ));
    }
    Ok(())
}

fn check_binary(name: &str, labels: &[u8]) -> PrepResult<()> {
    match labels.iter().find(|&&l| l > 1) {
        Some(bad) => Err(PrepError::invalid(
            name,
            format!("labels must be 0 or 1, found {}", bad),
        )),
        None => Ok(()),
    }
}

fn check_probabilities(probability: &[f64]) -> PrepResult<()> {
    match probability.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        Some(bad) => Err(PrepError::invalid(
            "probability",
            format!("values must lie in [0, 1], found {}", bad),
        )),
        None => Ok(()),
    }
}
