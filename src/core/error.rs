//! Error types for the fair SVM implementation

use crate::solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FairSvmError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Optimization failed: {0}")]
    OptimizationError(String),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,

    /// A group used by a fairness constraint or projection has no members
    #[error("Degenerate group (sensitive value {value}): {reason}")]
    DegenerateGroup { value: f64, reason: String },

    /// The pivot component of a projection direction is zero
    #[error("Projection direction has a zero pivot component at index {index}")]
    ZeroPivot { index: usize },

    #[error("QP solver failed: {0}")]
    Solver(#[from] SolverError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FairSvmError>;
