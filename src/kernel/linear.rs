//! Linear kernel implementation

use crate::kernel::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Linear kernel: K(x, y) = x^T * y
///
/// The block form is a single matrix product `X * Y^T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        x.dot(&y)
    }

    fn matrix(&self, x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
        x.dot(&y.t())
    }
}
