//! Accuracy and group fairness measures
//!
//! Fairness is reported as the spread of a per-group rate: the true-positive
//! rate for equalized odds (DEO) and the positive-prediction rate for
//! demographic parity (DDP).

use crate::core::{ConstraintType, FairSvmError, Result};
use crate::fairness::GroupPartition;
use ndarray::ArrayView1;

fn check_lengths(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(FairSvmError::DimensionMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(FairSvmError::EmptyDataset);
    }
    Ok(())
}

/// Fraction of exact label matches
pub fn accuracy(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(actual, predicted)| actual == predicted)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Confusion-matrix counts with the derived binary metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Count outcomes; positive means a label above zero
    pub fn from_predictions(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let mut metrics = Self::new(0, 0, 0, 0);
        for (&actual, &predicted) in y_true.iter().zip(y_pred.iter()) {
            match (predicted > 0.0, actual > 0.0) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        Ok(metrics)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    /// TP / (TP + FN), the true-positive rate
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(
            self.true_negatives,
            self.true_negatives + self.false_positives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Rate of positive predictions within one sensitive group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupRate {
    pub value: f64,
    pub rate: f64,
    /// Examples the rate is computed over
    pub support: usize,
}

/// Positive-prediction rate per sensitive group, over the examples the
/// constraint type admits (positives for EO, everyone for DP)
pub fn group_rates(
    y_true: ArrayView1<f64>,
    y_pred: ArrayView1<f64>,
    sensitive: &[f64],
    constraint: ConstraintType,
) -> Result<Vec<GroupRate>> {
    check_lengths(y_true, y_pred)?;
    let partition = GroupPartition::new(y_true, sensitive, constraint)?;

    Ok(partition
        .groups()
        .iter()
        .map(|group| {
            let positive = group.indices.iter().filter(|&&i| y_pred[i] > 0.0).count();
            GroupRate {
                value: group.value,
                rate: ratio(positive, group.len()),
                support: group.len(),
            }
        })
        .collect())
}

/// Per-group true-positive rate
pub fn true_positive_rates(
    y_true: ArrayView1<f64>,
    y_pred: ArrayView1<f64>,
    sensitive: &[f64],
) -> Result<Vec<GroupRate>> {
    group_rates(y_true, y_pred, sensitive, ConstraintType::EqualizedOdds)
}

/// Per-group positive-prediction rate
pub fn positive_rates(
    y_true: ArrayView1<f64>,
    y_pred: ArrayView1<f64>,
    sensitive: &[f64],
) -> Result<Vec<GroupRate>> {
    group_rates(y_true, y_pred, sensitive, ConstraintType::DemographicParity)
}

/// Largest minus smallest rate among groups with support; 0 for fewer
/// than two such groups
pub fn max_rate_gap(rates: &[GroupRate]) -> f64 {
    let supported: Vec<f64> = rates
        .iter()
        .filter(|r| r.support > 0)
        .map(|r| r.rate)
        .collect();
    if supported.len() < 2 {
        return 0.0;
    }
    let max = supported.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = supported.iter().cloned().fold(f64::INFINITY, f64::min);
    max - min
}

/// Difference of equalized odds (DEO)
pub fn equalized_odds_gap(
    y_true: ArrayView1<f64>,
    y_pred: ArrayView1<f64>,
    sensitive: &[f64],
) -> Result<f64> {
    Ok(max_rate_gap(&true_positive_rates(y_true, y_pred, sensitive)?))
}

/// Difference of demographic parity (DDP)
pub fn demographic_parity_gap(
    y_true: ArrayView1<f64>,
    y_pred: ArrayView1<f64>,
    sensitive: &[f64],
) -> Result<f64> {
    Ok(max_rate_gap(&positive_rates(y_true, y_pred, sensitive)?))
}
