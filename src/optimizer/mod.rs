//! Dual SVM optimization
//!
//! This module assembles the standard SVM dual as a dense QP, appends any
//! fairness rows to its equality constraints, hands it to the QP solver and
//! turns the multipliers into a trained decision function.

use crate::core::{label_from_decision, FairSvmError, Prediction, Result};
use crate::kernel::{Kernel, KernelKind};
use crate::solver::{QpProblem, QpSolver, SolverConfig};
use log::{debug, info};
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Multipliers above this value mark support vectors
pub const SUPPORT_VECTOR_THRESHOLD: f64 = 1e-7;

/// Builds and solves the (fairness-constrained) SVM dual
#[derive(Debug, Clone)]
pub struct DualOptimizer {
    kernel: KernelKind,
    c: Option<f64>,
    solver: QpSolver,
}

impl DualOptimizer {
    /// Create an optimizer; `c = None` gives a hard margin
    pub fn new(kernel: KernelKind, c: Option<f64>, config: SolverConfig) -> Self {
        Self {
            kernel,
            c,
            solver: QpSolver::new(config),
        }
    }

    pub fn kernel(&self) -> &KernelKind {
        &self.kernel
    }

    pub fn c(&self) -> Option<f64> {
        self.c
    }

    /// Assemble the dual QP:
    ///
    /// ```text
    /// minimize    ½ aᵀ (y yᵀ ⊙ K) a - 1ᵀa
    /// subject to  yᵀa = 0,  row_k · a = 0 for every fairness row
    ///             0 ≤ a (≤ C)
    /// ```
    pub fn build_problem(
        &self,
        gram: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        fairness_rows: &[Array1<f64>],
    ) -> Result<QpProblem> {
        let n = labels.len();
        if gram.dim() != (n, n) {
            return Err(FairSvmError::DimensionMismatch {
                expected: n,
                actual: gram.nrows(),
            });
        }

        let label_outer = &labels.insert_axis(Axis(1)) * &labels.insert_axis(Axis(0));
        let p = label_outer * &gram;
        let q = Array1::from_elem(n, -1.0);

        let lower = -Array2::<f64>::eye(n);
        let (g, h) = match self.c {
            None => (lower, Array1::zeros(n)),
            Some(c) => {
                let upper = Array2::<f64>::eye(n);
                let g = concatenate(Axis(0), &[lower.view(), upper.view()])?;
                let h = concatenate(
                    Axis(0),
                    &[Array1::zeros(n).view(), Array1::from_elem(n, c).view()],
                )?;
                (g, h)
            }
        };

        let mut a = Array2::zeros((1 + fairness_rows.len(), n));
        a.row_mut(0).assign(&labels);
        for (k, row) in fairness_rows.iter().enumerate() {
            if row.len() != n {
                return Err(FairSvmError::DimensionMismatch {
                    expected: n,
                    actual: row.len(),
                });
            }
            a.row_mut(k + 1).assign(row);
        }
        let b = Array1::zeros(a.nrows());

        Ok(QpProblem::new(p, q, g, h, a, b)?)
    }

    /// Solve the dual and extract support vectors, intercept and (for the
    /// linear kernel) the explicit weight vector
    pub fn train(
        &self,
        x: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        gram: ArrayView2<f64>,
        fairness_rows: &[Array1<f64>],
    ) -> Result<DualModel> {
        let problem = self.build_problem(gram, labels, fairness_rows)?;
        debug!(
            "Solving dual QP: {} variables, {} equality rows, {} inequality rows",
            problem.n_variables(),
            problem.n_equalities(),
            problem.n_inequalities()
        );

        let solution = self.solver.solve(&problem)?;
        let multipliers = solution.x;

        // Support vectors have non-negligible multipliers
        let support_indices: Vec<usize> = multipliers
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| {
                if a > SUPPORT_VECTOR_THRESHOLD {
                    Some(i)
                } else {
                    None
                }
            })
            .collect();

        if support_indices.is_empty() {
            return Err(FairSvmError::OptimizationError(
                "no multiplier exceeds the support vector threshold".to_string(),
            ));
        }

        let alpha = multipliers.select(Axis(0), &support_indices);
        let support_vectors = x.select(Axis(0), &support_indices);
        let support_labels = labels.select(Axis(0), &support_indices);
        let alpha_y = &alpha * &support_labels;

        // Intercept: mean residual over support vectors on the support sub-Gram matrix
        let sub_gram = gram
            .select(Axis(0), &support_indices)
            .select(Axis(1), &support_indices);
        let residuals = &support_labels - &sub_gram.dot(&alpha_y);
        let bias = residuals.sum() / support_indices.len() as f64;

        let weights = if self.kernel.is_linear() {
            Some(support_vectors.t().dot(&alpha_y))
        } else {
            None
        };

        info!(
            "{} support vectors out of {} points ({} QP iterations)",
            support_indices.len(),
            labels.len(),
            solution.iterations
        );

        Ok(DualModel {
            kernel: self.kernel,
            multipliers,
            support_vectors,
            support_labels,
            alpha,
            alpha_y,
            support_indices,
            bias,
            weights,
            iterations: solution.iterations,
            objective_value: solution.primal_objective,
        })
    }
}

/// A trained dual SVM; immutable once built
#[derive(Debug, Clone)]
pub struct DualModel {
    kernel: KernelKind,
    multipliers: Array1<f64>,
    support_vectors: Array2<f64>,
    support_labels: Array1<f64>,
    alpha: Array1<f64>,
    alpha_y: Array1<f64>,
    support_indices: Vec<usize>,
    bias: f64,
    weights: Option<Array1<f64>>,
    iterations: usize,
    objective_value: f64,
}

impl DualModel {
    /// Raw decision values `Σ a_n y_n K(x, sv_n) + b`, or `X·w + b` when
    /// the weight vector is available
    pub fn project(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(FairSvmError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }

        let scores = match &self.weights {
            Some(w) => x.dot(w),
            None => self
                .kernel
                .matrix(x, self.support_vectors.view())
                .dot(&self.alpha_y),
        };
        Ok(scores + self.bias)
    }

    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.project(x)
    }

    /// Labels in {-1, +1}; a zero decision value maps to +1
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.project(x)?.mapv(label_from_decision))
    }

    /// Label and decision value per row
    pub fn predictions(&self, x: ArrayView2<f64>) -> Result<Vec<Prediction>> {
        Ok(self
            .project(x)?
            .iter()
            .map(|&v| Prediction::from_decision_value(v))
            .collect())
    }

    pub fn kernel(&self) -> &KernelKind {
        &self.kernel
    }

    /// Multipliers of every training example
    pub fn dual_coefficients(&self) -> &Array1<f64> {
        &self.multipliers
    }

    pub fn support_vectors(&self) -> &Array2<f64> {
        &self.support_vectors
    }

    pub fn support_labels(&self) -> &Array1<f64> {
        &self.support_labels
    }

    /// Multipliers of the support vectors
    pub fn alpha_values(&self) -> &Array1<f64> {
        &self.alpha
    }

    /// Indices of support vectors in the training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_indices.len()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Explicit weight vector, set only for the linear kernel
    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    pub fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }
}
