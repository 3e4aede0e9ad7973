//! Single-direction feature projection

use crate::core::{FairSvmError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Pivot magnitudes at or below this are treated as zero
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Removes one direction `u` from feature space
///
/// Every example becomes `ex - u * ex[p] / u[p]`, which zeroes coordinate
/// `p` (the largest |u_i|, first on ties); that coordinate is then dropped,
/// so the output has one column fewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionStep {
    direction: Array1<f64>,
    pivot: usize,
}

impl ProjectionStep {
    pub fn from_direction(direction: Array1<f64>) -> Result<Self> {
        if direction.is_empty() {
            return Err(FairSvmError::InvalidDataset(
                "Projection direction has no components".to_string(),
            ));
        }
        if direction.iter().any(|v| !v.is_finite()) {
            return Err(FairSvmError::InvalidDataset(
                "Projection direction contains non-finite values".to_string(),
            ));
        }

        let mut pivot = 0;
        for (i, v) in direction.iter().enumerate() {
            if v.abs() > direction[pivot].abs() {
                pivot = i;
            }
        }
        if direction[pivot].abs() <= PIVOT_TOLERANCE {
            return Err(FairSvmError::ZeroPivot { index: pivot });
        }

        Ok(Self { direction, pivot })
    }

    pub fn direction(&self) -> ArrayView1<'_, f64> {
        self.direction.view()
    }

    /// Coordinate removed by this step
    pub fn pivot(&self) -> usize {
        self.pivot
    }

    pub fn input_dim(&self) -> usize {
        self.direction.len()
    }

    pub fn output_dim(&self) -> usize {
        self.direction.len() - 1
    }

    /// Project every row of `x`
    pub fn apply(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.input_dim() {
            return Err(FairSvmError::DimensionMismatch {
                expected: self.input_dim(),
                actual: x.ncols(),
            });
        }

        let pivot_value = self.direction[self.pivot];
        let scale = x.column(self.pivot).mapv(|v| v / pivot_value);
        let shift = &scale.view().insert_axis(Axis(1))
            * &self.direction.view().insert_axis(Axis(0));
        let projected = &x - &shift;
        Ok(projected.select(Axis(1), &self.kept_columns()))
    }

    /// Project a single vector
    pub fn apply_vector(&self, v: ArrayView1<f64>) -> Result<Array1<f64>> {
        Ok(self
            .apply(v.insert_axis(Axis(0)))?
            .index_axis_move(Axis(0), 0))
    }

    fn kept_columns(&self) -> Vec<usize> {
        (0..self.input_dim()).filter(|&j| j != self.pivot).collect()
    }
}
