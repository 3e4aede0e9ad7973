//! Dense convex quadratic programs solved with Clarabel
//!
//! Problems are stated as
//!
//! ```text
//! minimize    ½ xᵀPx + qᵀx
//! subject to  Gx ≤ h
//!             Ax = b
//! ```
//!
//! and handed to Clarabel in its conic form `Mx + s = c, s ∈ K` by stacking the
//! rows:
//!
//! ```text
//!        ┏   ┓       ┏   ┓
//!   M =  ┃ A ┃   c = ┃ b ┃   K = {0}^n_eq × R+^m
//!        ┃ G ┃       ┃ h ┃
//!        ┗   ┛       ┗   ┛
//! ```

use crate::solver::SolverError;
use clarabel::algebra::CscMatrix;
use clarabel::solver::*;
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView2};

/// Configuration for the QP solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum number of interior-point iterations
    pub max_iterations: usize,
    /// Absolute duality gap tolerance
    pub abstol: f64,
    /// Relative duality gap tolerance
    pub reltol: f64,
    /// Primal and dual feasibility tolerance
    pub feastol: f64,
    /// Print the solver's iteration log
    pub show_progress: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abstol: 1e-8,
            reltol: 1e-8,
            feastol: 1e-8,
            show_progress: false,
        }
    }
}

/// Dense convex QP in standard form `(P, q, G, h, A, b)`
#[derive(Debug, Clone)]
pub struct QpProblem {
    pub p: Array2<f64>,
    pub q: Array1<f64>,
    pub g: Array2<f64>,
    pub h: Array1<f64>,
    pub a: Array2<f64>,
    pub b: Array1<f64>,
}

impl QpProblem {
    /// Build a problem, checking that all shapes agree
    pub fn new(
        p: Array2<f64>,
        q: Array1<f64>,
        g: Array2<f64>,
        h: Array1<f64>,
        a: Array2<f64>,
        b: Array1<f64>,
    ) -> Result<Self, SolverError> {
        let n = q.len();
        if p.dim() != (n, n) {
            return Err(SolverError::InvalidProblem(format!(
                "P must be {n}x{n}, got {:?}",
                p.dim()
            )));
        }
        if g.ncols() != n || g.nrows() != h.len() {
            return Err(SolverError::InvalidProblem(format!(
                "G must be {}x{n}, got {:?}",
                h.len(),
                g.dim()
            )));
        }
        if a.ncols() != n || a.nrows() != b.len() {
            return Err(SolverError::InvalidProblem(format!(
                "A must be {}x{n}, got {:?}",
                b.len(),
                a.dim()
            )));
        }
        Ok(Self { p, q, g, h, a, b })
    }

    pub fn n_variables(&self) -> usize {
        self.q.len()
    }

    pub fn n_inequalities(&self) -> usize {
        self.h.len()
    }

    pub fn n_equalities(&self) -> usize {
        self.b.len()
    }

    /// Objective value ½ xᵀPx + qᵀx
    pub fn objective(&self, x: &Array1<f64>) -> f64 {
        0.5 * x.dot(&self.p.dot(x)) + self.q.dot(x)
    }

    /// Upper triangle of P, the only part Clarabel reads
    fn quadratic_part(&self) -> CscMatrix<f64> {
        dense_to_csc(&[self.p.view()], true)
    }

    /// `[A; G]` in compressed column form
    fn constraint_matrix(&self) -> CscMatrix<f64> {
        dense_to_csc(&[self.a.view(), self.g.view()], false)
    }

    fn constraint_rhs(&self) -> Vec<f64> {
        self.b.iter().chain(self.h.iter()).copied().collect()
    }

    /// Equalities first, then the inequalities
    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let mut cones = Vec::with_capacity(2);
        if self.n_equalities() > 0 {
            cones.push(ZeroConeT(self.n_equalities()));
        }
        if self.n_inequalities() > 0 {
            cones.push(NonnegativeConeT(self.n_inequalities()));
        }
        cones
    }
}

/// Primal and dual solution of a QP
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// Primal variables
    pub x: Array1<f64>,
    /// Multipliers of the equality constraints
    pub y: Array1<f64>,
    /// Multipliers of the inequality constraints
    pub z: Array1<f64>,
    /// Inequality slacks h - Gx
    pub s: Array1<f64>,
    pub iterations: usize,
    pub primal_objective: f64,
    /// Difference between the primal and dual objectives
    pub gap: f64,
}

/// Interior-point QP solver
#[derive(Debug, Clone, Default)]
pub struct QpSolver {
    config: SolverConfig,
}

impl QpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn settings(&self) -> DefaultSettings<f64> {
        DefaultSettings {
            max_iter: u32::try_from(self.config.max_iterations).unwrap_or(u32::MAX),
            tol_gap_abs: self.config.abstol,
            tol_gap_rel: self.config.reltol,
            tol_feas: self.config.feastol,
            equilibrate_enable: true,
            verbose: self.config.show_progress,
            ..DefaultSettings::default()
        }
    }

    /// Solve the problem. Anything short of an optimal (or nearly optimal)
    /// termination is reported as an error.
    pub fn solve(&self, problem: &QpProblem) -> Result<QpSolution, SolverError> {
        let quad = problem.quadratic_part();
        let constraints = problem.constraint_matrix();
        let rhs = problem.constraint_rhs();
        let cones = problem.cones();
        let linear = problem.q.to_vec();

        let mut solver = DefaultSolver::new(
            &quad,
            &linear,
            &constraints,
            &rhs,
            &cones,
            self.settings(),
        );
        solver.solve();

        let result = &solver.solution;
        let iterations = result.iterations as usize;
        let gap = (result.obj_val - result.obj_val_dual).abs();
        let summary = format!(
            "{:?} after {iterations} iterations: pcost {:+.6e} dcost {:+.6e} \
             pres {:.2e} dres {:.2e}",
            result.status, result.obj_val, result.obj_val_dual, result.r_prim, result.r_dual
        );
        if self.config.show_progress {
            info!("{summary}");
        } else {
            debug!("{summary}");
        }

        match result.status {
            SolverStatus::Solved => {}
            SolverStatus::AlmostSolved => {
                warn!("QP solved to reduced accuracy only ({summary})");
            }
            SolverStatus::PrimalInfeasible
            | SolverStatus::DualInfeasible
            | SolverStatus::AlmostPrimalInfeasible
            | SolverStatus::AlmostDualInfeasible => {
                return Err(SolverError::Infeasible {
                    status: format!("{:?}", result.status),
                });
            }
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
                return Err(SolverError::NumericalFailure {
                    iteration: iterations,
                    status: format!("{:?}", result.status),
                });
            }
            _ => {
                return Err(SolverError::NotConverged {
                    iterations,
                    primal_residual: result.r_prim,
                    dual_residual: result.r_dual,
                    gap,
                });
            }
        }

        let n_eq = problem.n_equalities();
        let x = Array1::from(result.x.clone());
        Ok(QpSolution {
            y: Array1::from(result.z[..n_eq].to_vec()),
            z: Array1::from(result.z[n_eq..].to_vec()),
            s: Array1::from(result.s[n_eq..].to_vec()),
            iterations,
            primal_objective: problem.objective(&x),
            x,
            gap,
        })
    }
}

/// Stack dense blocks vertically into one compressed sparse column matrix.
/// With `upper_only`, entries below the diagonal are dropped.
fn dense_to_csc(blocks: &[ArrayView2<f64>], upper_only: bool) -> CscMatrix<f64> {
    let n_rows = blocks.iter().map(|block| block.nrows()).sum();
    let n_cols = blocks.first().map_or(0, |block| block.ncols());

    let mut col_ptr = Vec::with_capacity(n_cols + 1);
    let mut row_val = Vec::new();
    let mut nonzero = Vec::new();

    for j in 0..n_cols {
        col_ptr.push(row_val.len());
        let mut offset = 0;
        for block in blocks {
            for (i, &value) in block.column(j).iter().enumerate() {
                let row = offset + i;
                if upper_only && row > j {
                    break;
                }
                if value != 0.0 {
                    row_val.push(row);
                    nonzero.push(value);
                }
            }
            offset += block.nrows();
        }
    }
    col_ptr.push(row_val.len());

    CscMatrix::new(n_rows, n_cols, col_ptr, row_val, nonzero)
}
