//! Training sets with a protected attribute
//!
//! A [`FairDataset`] bundles the feature matrix, the {-1, +1} labels and the
//! per-example sensitive value, and keeps them the same length.

pub mod csv;

pub use self::csv::*;

use crate::core::{FairSvmError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Check shapes, label encoding and finiteness of a labelled sample
pub fn validate_examples(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    sensitive: Option<&[f64]>,
) -> Result<()> {
    if x.nrows() == 0 {
        return Err(FairSvmError::EmptyDataset);
    }
    if y.len() != x.nrows() {
        return Err(FairSvmError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if let Some(&label) = y.iter().find(|&&label| label != 1.0 && label != -1.0) {
        return Err(FairSvmError::InvalidLabel(label));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(FairSvmError::InvalidDataset(
            "Feature matrix contains non-finite values".to_string(),
        ));
    }
    if let Some(sensitive) = sensitive {
        if sensitive.len() != x.nrows() {
            return Err(FairSvmError::DimensionMismatch {
                expected: x.nrows(),
                actual: sensitive.len(),
            });
        }
    }
    Ok(())
}

/// [`validate_examples`] plus the requirement that both classes occur
pub fn validate_training_set(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    sensitive: Option<&[f64]>,
) -> Result<()> {
    validate_examples(x, y, sensitive)?;
    let positives = y.iter().filter(|&&label| label > 0.0).count();
    if positives == 0 || positives == y.len() {
        return Err(FairSvmError::InvalidDataset(
            "Training labels must contain both classes".to_string(),
        ));
    }
    Ok(())
}

/// Feature matrix, labels and sensitive values of one sample
#[derive(Debug, Clone, PartialEq)]
pub struct FairDataset {
    x: Array2<f64>,
    y: Array1<f64>,
    sensitive: Vec<f64>,
}

impl FairDataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>, sensitive: Vec<f64>) -> Result<Self> {
        validate_examples(x.view(), y.view(), Some(&sensitive))?;
        if sensitive.iter().any(|v| v.is_nan()) {
            return Err(FairSvmError::InvalidDataset(
                "Sensitive feature contains NaN".to_string(),
            ));
        }
        Ok(Self { x, y, sensitive })
    }

    /// Dataset whose sensitive values are taken from feature column `column`
    pub fn with_sensitive_column(x: Array2<f64>, y: Array1<f64>, column: usize) -> Result<Self> {
        if column >= x.ncols() {
            return Err(FairSvmError::InvalidParameter(format!(
                "Sensitive column {column} out of range for {} features",
                x.ncols()
            )));
        }
        let sensitive = x.column(column).to_vec();
        Self::new(x, y, sensitive)
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    pub fn sensitive(&self) -> &[f64] {
        &self.sensitive
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Distinct sensitive values in ascending order
    pub fn sensitive_values(&self) -> Vec<f64> {
        crate::fairness::sorted_unique(&self.sensitive)
    }

    /// Rows at the given indices, in the given order
    pub fn select(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&row) = rows.iter().find(|&&row| row >= self.len()) {
            return Err(FairSvmError::InvalidParameter(format!(
                "Row index {row} out of range for {} examples",
                self.len()
            )));
        }
        Ok(Self {
            x: self.x.select(Axis(0), rows),
            y: self.y.select(Axis(0), rows),
            sensitive: rows.iter().map(|&row| self.sensitive[row]).collect(),
        })
    }

    /// Sequential split: the first `train_ratio` share of rows trains
    pub fn split(&self, train_ratio: f64) -> Result<(Self, Self)> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(FairSvmError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }
        let n_train = (self.len() as f64 * train_ratio) as usize;
        if n_train == 0 || n_train == self.len() {
            return Err(FairSvmError::InvalidDataset(format!(
                "Cannot split {} examples with ratio {train_ratio}",
                self.len()
            )));
        }
        let train: Vec<usize> = (0..n_train).collect();
        let test: Vec<usize> = (n_train..self.len()).collect();
        Ok((self.select(&train)?, self.select(&test)?))
    }
}
