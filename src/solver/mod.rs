//! Convex QP solving
//!
//! The fair SVM hands its dual problem to this module as `(P, q, G, h, A, b)`
//! and receives the primal solution back. Any solver for
//! "minimize ½xᵀPx + qᵀx subject to Gx ≤ h, Ax = b" fits this boundary; the
//! one provided here delegates to the Clarabel interior-point solver.

pub mod qp;

pub use self::qp::*;

use thiserror::Error;

/// Failures surfaced by the QP solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// The constraints admit no point, or the objective is unbounded below
    #[error("Problem is infeasible or unbounded ({status})")]
    Infeasible { status: String },

    #[error("Numerical failure after {iteration} iterations ({status})")]
    NumericalFailure { iteration: usize, status: String },

    #[error(
        "No convergence after {iterations} iterations \
         (primal residual {primal_residual:.3e}, dual residual {dual_residual:.3e}, gap {gap:.3e})"
    )]
    NotConverged {
        iterations: usize,
        primal_residual: f64,
        dual_residual: f64,
        gap: f64,
    },
}
