//! Fairness-constrained support vector machines
//!
//! Two routes to equalized odds or demographic parity across protected groups:
//!
//! * Kernel fair SVM ([`Ferm`], [`Pferm`]): the SVM dual gains one linear
//!   equality constraint per non-reference group, built from group-averaged
//!   kernel columns.
//! * Linear fair projection ([`LinearFerm`], [`LinearPferm`]): the direction
//!   separating the groups' positive-class means is projected out of feature
//!   space before any wrapped classifier is trained.

pub mod api;
pub mod core;
pub mod data;
pub mod fairness;
pub mod kernel;
pub mod metrics;
pub mod model_selection;
pub mod optimizer;
pub mod projection;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{FairSvm, Ferm, GroupingStrategy, MultiGroup, Pferm, TwoGroup};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{CsvOptions, FairDataset};
pub use crate::kernel::{Kernel, KernelKind, LinearKernel, RbfKernel};
pub use crate::metrics::{EvaluationMetrics, GroupRate};
pub use crate::model_selection::{GridSearch, ParamGrid, StratifiedKFold};
pub use crate::optimizer::{DualModel, DualOptimizer};
pub use crate::projection::{LinearFerm, LinearPferm, ProjectionStep};
pub use crate::solver::{QpProblem, QpSolver, SolverConfig, SolverError};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
