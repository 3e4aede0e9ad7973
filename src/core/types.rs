//! Core type definitions for the fair SVM estimators

use crate::core::{FairSvmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Build a prediction from a raw decision value.
    ///
    /// A decision value of exactly zero is labelled +1.
    pub fn from_decision_value(decision_value: f64) -> Self {
        Self::new(label_from_decision(decision_value), decision_value)
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Map a decision value to a class label in {-1, +1} (zero maps to +1)
pub fn label_from_decision(decision_value: f64) -> f64 {
    if decision_value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Fairness notion encoded by the constraint rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Equal true-positive rates: groups contain positive examples only
    #[default]
    #[serde(rename = "EO")]
    EqualizedOdds,
    /// Equal positive-prediction rates: groups contain every example
    #[serde(rename = "DP")]
    DemographicParity,
}

impl ConstraintType {
    /// Whether a training example with `label` belongs to its group
    pub fn admits(&self, label: f64) -> bool {
        match self {
            ConstraintType::EqualizedOdds => label == 1.0,
            ConstraintType::DemographicParity => true,
        }
    }
}

impl FromStr for ConstraintType {
    type Err = FairSvmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EO" => Ok(ConstraintType::EqualizedOdds),
            "DP" => Ok(ConstraintType::DemographicParity),
            _ => Err(FairSvmError::InvalidParameter(format!(
                "Unknown constraint type: {s}. Use 'EO' or 'DP'"
            ))),
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::EqualizedOdds => write!(f, "EO"),
            ConstraintType::DemographicParity => write!(f, "DP"),
        }
    }
}

/// Prior ratio between a group and the reference group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prior {
    /// One ratio shared by every non-reference group
    Scalar(f64),
    /// One ratio per non-reference group, in sorted group order
    PerGroup(Vec<f64>),
}

impl Prior {
    /// Ratio for the `k`-th non-reference group (zero-based)
    pub fn ratio(&self, k: usize) -> Result<f64> {
        match self {
            Prior::Scalar(pi) => Ok(*pi),
            Prior::PerGroup(ratios) => ratios.get(k).copied().ok_or_else(|| {
                FairSvmError::InvalidParameter(format!(
                    "Prior list has {} entries, no ratio for non-reference group {}",
                    ratios.len(),
                    k + 1
                ))
            }),
        }
    }

    /// Every ratio is a finite number
    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|pi| pi.is_finite())
    }

    fn values(&self) -> &[f64] {
        match self {
            Prior::Scalar(pi) => std::slice::from_ref(pi),
            Prior::PerGroup(ratios) => ratios,
        }
    }
}

impl Default for Prior {
    fn default() -> Self {
        Prior::Scalar(1.0)
    }
}

impl From<f64> for Prior {
    fn from(pi: f64) -> Self {
        Prior::Scalar(pi)
    }
}

impl From<Vec<f64>> for Prior {
    fn from(ratios: Vec<f64>) -> Self {
        Prior::PerGroup(ratios)
    }
}

/// Readable and writable hyperparameters of the kernel fair SVM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparams {
    /// Kernel name; unknown names resolve to the linear kernel
    pub kernel: String,
    /// Soft-margin bound, `None` for a hard margin
    #[serde(rename = "C")]
    pub c: Option<f64>,
    /// Per-example group values; `None` disables the fairness constraint
    pub sensible_feature: Option<Vec<f64>>,
    /// RBF bandwidth
    pub gamma: f64,
    /// Enable prior-ratio blending
    pub prior: bool,
    pub pi: Prior,
    pub constraint: ConstraintType,
    /// Blend factor between the prior ratio and the neutral ratio 1
    pub lamda: f64,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            kernel: "rbf".to_string(),
            c: Some(1.0),
            sensible_feature: None,
            gamma: 1.0,
            prior: false,
            pi: Prior::default(),
            constraint: ConstraintType::default(),
            lamda: 0.5,
        }
    }
}

impl Hyperparams {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(c) = self.c {
            if !(c.is_finite() && c > 0.0) {
                return Err(FairSvmError::InvalidParameter(format!(
                    "C must be positive and finite, got: {c}"
                )));
            }
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(FairSvmError::InvalidParameter(format!(
                "Gamma must be positive, got: {}",
                self.gamma
            )));
        }
        if !(0.0..=1.0).contains(&self.lamda) {
            return Err(FairSvmError::InvalidParameter(format!(
                "Lambda must lie in [0, 1], got: {}",
                self.lamda
            )));
        }
        if !self.pi.is_finite() {
            return Err(FairSvmError::InvalidParameter(
                "Prior ratios must be finite".to_string(),
            ));
        }
        if let Some(sensitive) = &self.sensible_feature {
            if sensitive.iter().any(|v| v.is_nan()) {
                return Err(FairSvmError::InvalidParameter(
                    "Sensitive feature contains NaN".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Effective weight applied to the reference group of the `k`-th fairness row
    pub fn group_weight(&self, k: usize) -> Result<f64> {
        if self.prior {
            Ok(crate::fairness::prior_weight(self.pi.ratio(k)?, self.lamda))
        } else {
            Ok(1.0)
        }
    }
}
