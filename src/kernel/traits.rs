//! Kernel trait definition

use ndarray::{Array2, ArrayView1, ArrayView2};

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM,
/// so the Gram matrix over any training set is symmetric positive semi-definite.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64;

    /// Compute the n x m block of kernel values between the rows of `x` (n x d)
    /// and the rows of `y` (m x d)
    fn matrix(&self, x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
        let mut block = Array2::zeros((x.nrows(), y.nrows()));
        for (i, xi) in x.rows().into_iter().enumerate() {
            for (j, yj) in y.rows().into_iter().enumerate() {
                block[[i, j]] = self.compute(xi, yj);
            }
        }
        block
    }

    /// Gram matrix of a training set, exactly symmetric
    fn gram(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let block = self.matrix(x, x);
        (&block + &block.t()) * 0.5
    }
}
