//! Gaussian radial-basis kernel

use crate::kernel::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// `K(x, y) = exp(-gamma * |x - y|^2)`; values lie in (0, 1] with 1 on the diagonal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    /// # Panics
    /// If `gamma` is not positive. Estimators validate it before building a kernel.
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "RBF bandwidth must be positive, got {gamma}");
        Self { gamma }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RbfKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for RbfKernel {
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        let squared_distance: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum();
        (-self.gamma * squared_distance).exp()
    }

    fn matrix(&self, x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
        // |x - y|^2 = |x|^2 + |y|^2 - 2 x·y
        let x_norms = x.map_axis(Axis(1), |row| row.dot(&row));
        let y_norms = y.map_axis(Axis(1), |row| row.dot(&row));
        let mut block = x.dot(&y.t());

        for ((i, j), value) in block.indexed_iter_mut() {
            // Clamp round-off below zero
            let squared_distance = (x_norms[i] + y_norms[j] - 2.0 * *value).max(0.0);
            *value = (-self.gamma * squared_distance).exp();
        }
        block
    }
}
