//! Model evaluation: accuracy and per-class precision/recall/F1

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::forest::Classifier;
use crate::error::{PipelineError, Result};

/// Precision, recall, F1 and support for one class or one average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    /// Number of true instances
    pub support: usize,
}

/// Per-class breakdown plus overall accuracy and the macro/weighted averages.
///
/// Serializes as one flat mapping: class labels as keys, followed by
/// `accuracy`, `macro avg` and `weighted avg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub classes: BTreeMap<String, ClassScores>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassScores,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassScores,
}

/// Evaluation result persisted alongside the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Fraction of correct test predictions, in [0, 1]
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
    /// When the evaluation ran; also names the artifact set
    pub timestamp: DateTime<Local>,
}

/// Evaluation stage: predict the test partition and score the predictions.
///
/// # Errors
/// `DataShape` if the model rejects `x_test`, the test set is empty, or the
/// prediction count differs from `y_test`.
pub fn evaluate_model<C: Classifier + ?Sized>(
    model: &C,
    x_test: ArrayView2<f64>,
    y_test: ArrayView1<usize>,
) -> Result<MetricsRecord> {
    tracing::info!(n_test = y_test.len(), "Evaluating model performance");

    let predictions = model.predict(x_test)?;
    let accuracy = accuracy_score(y_test, predictions.view())?;
    let classification_report = classification_report(y_test, predictions.view())?;

    tracing::info!("Test accuracy: {:.4}", accuracy);

    Ok(MetricsRecord {
        accuracy,
        classification_report,
        timestamp: Local::now(),
    })
}

/// Fraction of positions where `y_pred` equals `y_true`
pub fn accuracy_score(y_true: ArrayView1<usize>, y_pred: ArrayView1<usize>) -> Result<f64> {
    check_aligned(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Per-class scores over every label present in either vector.
///
/// Undefined ratios (zero denominators) are reported as 0.0.
pub fn classification_report(
    y_true: ArrayView1<usize>,
    y_pred: ArrayView1<usize>,
) -> Result<ClassificationReport> {
    check_aligned(y_true, y_pred)?;

    let labels: BTreeSet<usize> = y_true.iter().chain(y_pred.iter()).copied().collect();
    let mut true_positive: BTreeMap<usize, usize> = BTreeMap::new();
    let mut predicted: BTreeMap<usize, usize> = BTreeMap::new();
    let mut actual: BTreeMap<usize, usize> = BTreeMap::new();

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        *actual.entry(t).or_insert(0) += 1;
        *predicted.entry(p).or_insert(0) += 1;
        if t == p {
            *true_positive.entry(t).or_insert(0) += 1;
        }
    }

    let per_class: Vec<(usize, ClassScores)> = labels
        .iter()
        .map(|label| {
            let tp = true_positive.get(label).copied().unwrap_or(0) as f64;
            let n_pred = predicted.get(label).copied().unwrap_or(0) as f64;
            let support = actual.get(label).copied().unwrap_or(0);

            let precision = safe_ratio(tp, n_pred);
            let recall = safe_ratio(tp, support as f64);
            let f1_score = safe_ratio(2.0 * precision * recall, precision + recall);
            (
                *label,
                ClassScores {
                    precision,
                    recall,
                    f1_score,
                    support,
                },
            )
        })
        .collect();

    let total_support = y_true.len();
    let n_labels = per_class.len() as f64;
    let macro_avg = ClassScores {
        precision: per_class.iter().map(|(_, s)| s.precision).sum::<f64>() / n_labels,
        recall: per_class.iter().map(|(_, s)| s.recall).sum::<f64>() / n_labels,
        f1_score: per_class.iter().map(|(_, s)| s.f1_score).sum::<f64>() / n_labels,
        support: total_support,
    };
    let weighted = |score: fn(&ClassScores) -> f64| {
        per_class
            .iter()
            .map(|(_, s)| score(s) * s.support as f64)
            .sum::<f64>()
            / total_support as f64
    };
    let weighted_avg = ClassScores {
        precision: weighted(|s| s.precision),
        recall: weighted(|s| s.recall),
        f1_score: weighted(|s| s.f1_score),
        support: total_support,
    };

    Ok(ClassificationReport {
        classes: per_class
            .into_iter()
            .map(|(label, scores)| (label.to_string(), scores))
            .collect(),
        accuracy: accuracy_score(y_true, y_pred)?,
        macro_avg,
        weighted_avg,
    })
}

fn check_aligned(y_true: ArrayView1<usize>, y_pred: ArrayView1<usize>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::DataShape(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::DataShape(
            "cannot score an empty test set".to_string(),
        ));
    }
    Ok(())
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_score() {
        let y_true = array![0usize, 1, 1, 0];
        let y_pred = array![0usize, 1, 0, 0];
        assert_eq!(accuracy_score(y_true.view(), y_pred.view()).unwrap(), 0.75);
    }

    #[test]
    fn test_accuracy_rejects_misaligned() {
        let result = accuracy_score(array![0usize, 1].view(), array![0usize].view());
        assert!(matches!(result, Err(PipelineError::DataShape(_))));
    }

    #[test]
    fn test_classification_report_values() {
        // class 0: tp=2, predicted=3, actual=2 -> p=2/3, r=1
        // class 1: tp=1, predicted=1, actual=2 -> p=1,   r=1/2
        let y_true = array![0usize, 0, 1, 1];
        let y_pred = array![0usize, 0, 0, 1];
        let report = classification_report(y_true.view(), y_pred.view()).unwrap();

        let zero = report.classes["0"];
        assert!((zero.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(zero.recall, 1.0);
        assert!((zero.f1_score - 0.8).abs() < 1e-12);
        assert_eq!(zero.support, 2);

        let one = report.classes["1"];
        assert_eq!(one.precision, 1.0);
        assert_eq!(one.recall, 0.5);

        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.macro_avg.support, 4);
        assert!((report.macro_avg.recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_label_never_predicted_scores_zero() {
        let y_true = array![0usize, 1, 1];
        let y_pred = array![0usize, 0, 0];
        let report = classification_report(y_true.view(), y_pred.view()).unwrap();

        let one = report.classes["1"];
        assert_eq!(one.precision, 0.0);
        assert_eq!(one.f1_score, 0.0);
    }

    #[test]
    fn test_report_serializes_as_flat_mapping() {
        let y = array![0usize, 1];
        let report = classification_report(y.view(), y.view()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["0"]["f1-score"].is_number());
        assert!(json["1"]["support"].is_number());
        assert_eq!(json["accuracy"], 1.0);
        assert!(json["macro avg"]["precision"].is_number());
        assert!(json["weighted avg"]["recall"].is_number());
    }
}
