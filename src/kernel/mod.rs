//! Kernel functions for the fair SVM

pub mod linear;
pub mod rbf;
pub mod traits;

pub use self::linear::*;
pub use self::rbf::*;
pub use self::traits::*;

use ndarray::{Array2, ArrayView1, ArrayView2};

/// Closed set of kernels selectable by name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelKind {
    Linear(LinearKernel),
    Rbf(RbfKernel),
}

impl KernelKind {
    /// Resolve a kernel by name.
    ///
    /// `"rbf"` selects the radial-basis kernel with the given bandwidth,
    /// `"linear"` and every unrecognised name select the linear kernel.
    pub fn from_name(name: &str, gamma: f64) -> Self {
        match name {
            "rbf" => KernelKind::Rbf(RbfKernel::new(gamma)),
            "linear" => KernelKind::Linear(LinearKernel::new()),
            other => {
                log::debug!("Unknown kernel '{other}', using the linear kernel");
                KernelKind::Linear(LinearKernel::new())
            }
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, KernelKind::Linear(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            KernelKind::Linear(_) => "linear",
            KernelKind::Rbf(_) => "rbf",
        }
    }
}

impl Default for KernelKind {
    fn default() -> Self {
        KernelKind::Linear(LinearKernel::new())
    }
}

impl Kernel for KernelKind {
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        match self {
            KernelKind::Linear(k) => k.compute(x, y),
            KernelKind::Rbf(k) => k.compute(x, y),
        }
    }

    fn matrix(&self, x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
        match self {
            KernelKind::Linear(k) => k.matrix(x, y),
            KernelKind::Rbf(k) => k.matrix(x, y),
        }
    }
}
