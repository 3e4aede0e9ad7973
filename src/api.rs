//! High-level fair SVM estimators
//!
//! [`FairSvm`] trains a kernel SVM whose dual carries fairness equality
//! constraints. How groups turn into constraint rows is chosen by the
//! [`GroupingStrategy`] type parameter:
//!
//! * [`Ferm`] compares the largest sensitive value against the smallest
//!   (one row).
//! * [`Pferm`] compares every group against the smallest value (one row per
//!   non-reference group).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fairsvm::api::Ferm;
//! use fairsvm::core::Classifier;
//! use ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
//! let y = array![-1.0, -1.0, 1.0, 1.0];
//!
//! let mut svm = Ferm::new()
//!     .with_kernel("linear")
//!     .with_c(1.0)
//!     .with_sensible_feature(vec![0.0, 1.0, 0.0, 1.0]);
//! svm.fit(x.view(), y.view())?;
//!
//! println!("Accuracy: {:.2}%", svm.score(x.view(), y.view())? * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    Classifier, ConstraintType, Estimator, FairSvmError, Hyperparams, Prediction, Prior, Result,
};
use crate::data::validate_training_set;
use crate::fairness::{multi_group_rows, two_group_rows, GroupPartition};
use crate::kernel::{Kernel, KernelKind};
use crate::optimizer::{DualModel, DualOptimizer};
use crate::solver::SolverConfig;
use log::{debug, info};
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::marker::PhantomData;

/// Turns a group partition into fairness constraint rows
pub trait GroupingStrategy: Clone + Default {
    /// Short algorithm name used in logs
    const NAME: &'static str;

    fn constraint_rows(
        gram: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        partition: &GroupPartition,
        params: &Hyperparams,
    ) -> Result<Vec<Array1<f64>>>;
}

/// Smallest against largest sensitive value, a single constraint row
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoGroup;

impl GroupingStrategy for TwoGroup {
    const NAME: &'static str = "FERM";

    fn constraint_rows(
        gram: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        partition: &GroupPartition,
        params: &Hyperparams,
    ) -> Result<Vec<Array1<f64>>> {
        two_group_rows(gram, labels, partition, params)
    }
}

/// Every group against the smallest sensitive value
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiGroup;

impl GroupingStrategy for MultiGroup {
    const NAME: &'static str = "PFERM";

    fn constraint_rows(
        gram: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        partition: &GroupPartition,
        params: &Hyperparams,
    ) -> Result<Vec<Array1<f64>>> {
        multi_group_rows(gram, labels, partition, params)
    }
}

/// Kernel SVM with fairness constraints on the dual multipliers
#[derive(Debug, Clone, Default)]
pub struct FairSvm<S: GroupingStrategy = MultiGroup> {
    params: Hyperparams,
    solver: SolverConfig,
    model: Option<DualModel>,
    strategy: PhantomData<S>,
}

/// Two-group fair SVM
pub type Ferm = FairSvm<TwoGroup>;

/// Multi-group fair SVM
pub type Pferm = FairSvm<MultiGroup>;

impl<S: GroupingStrategy> FairSvm<S> {
    /// Create an estimator with default hyperparameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator from a full hyperparameter set
    pub fn with_params(params: Hyperparams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Set kernel by name (`"linear"`, `"rbf"`; anything else is linear)
    pub fn with_kernel(mut self, kernel: impl Into<String>) -> Self {
        self.params.kernel = kernel.into();
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = Some(c);
        self
    }

    /// Remove the upper bound on the multipliers
    pub fn with_hard_margin(mut self) -> Self {
        self.params.c = None;
        self
    }

    /// Set RBF bandwidth
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.params.gamma = gamma;
        self
    }

    /// Set the per-example sensitive values of the training set
    pub fn with_sensible_feature(mut self, sensitive: Vec<f64>) -> Self {
        self.params.sensible_feature = Some(sensitive);
        self
    }

    /// Enable prior blending with the given ratio(s)
    pub fn with_prior(mut self, pi: impl Into<Prior>) -> Self {
        self.params.prior = true;
        self.params.pi = pi.into();
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintType) -> Self {
        self.params.constraint = constraint;
        self
    }

    pub fn with_lamda(mut self, lamda: f64) -> Self {
        self.params.lamda = lamda;
        self
    }

    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver = config;
        self
    }

    pub fn params(&self) -> &Hyperparams {
        &self.params
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Trained dual model
    pub fn model(&self) -> Result<&DualModel> {
        self.model.as_ref().ok_or(FairSvmError::ModelNotTrained)
    }

    /// Train on `x` and `y`; the sensitive feature, if set, must align with
    /// the rows of `x`
    pub fn train(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        self.model = None;
        self.params.validate()?;
        let sensitive = self.params.sensible_feature.as_deref();
        validate_training_set(x, y, sensitive)?;

        let kernel = KernelKind::from_name(&self.params.kernel, self.params.gamma);
        debug!(
            "{}: training on {} examples with {} features, {} kernel",
            S::NAME,
            x.nrows(),
            x.ncols(),
            kernel.name()
        );
        let gram = kernel.gram(x);

        let rows = match sensitive {
            Some(sensitive) => {
                let partition = GroupPartition::new(y, sensitive, self.params.constraint)?;
                for group in partition.groups() {
                    debug!(
                        "Group {}: {} examples under {}",
                        group.value,
                        group.len(),
                        partition.constraint()
                    );
                }
                S::constraint_rows(gram.view(), y, &partition, &self.params)?
            }
            None => Vec::new(),
        };

        let optimizer = DualOptimizer::new(kernel, self.params.c, self.solver.clone());
        let model = optimizer.train(x, y, gram.view(), &rows)?;
        info!(
            "{}: trained with {} fairness constraints, {} support vectors",
            S::NAME,
            rows.len(),
            model.n_support_vectors()
        );
        self.model = Some(model);
        Ok(())
    }

    /// Raw decision values
    pub fn project(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.model()?.project(x)
    }

    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.project(x)
    }

    /// Label and decision value per row
    pub fn predictions(&self, x: ArrayView2<f64>) -> Result<Vec<Prediction>> {
        self.model()?.predictions(x)
    }

    pub fn support_vectors(&self) -> Result<ArrayView2<'_, f64>> {
        Ok(self.model()?.support_vectors().view())
    }

    /// Multipliers of the support vectors
    pub fn alpha(&self) -> Result<ArrayView1<'_, f64>> {
        Ok(self.model()?.alpha_values().view())
    }

    pub fn bias(&self) -> Result<f64> {
        Ok(self.model()?.bias())
    }

    /// Explicit weight vector, present for the linear kernel
    pub fn weights(&self) -> Result<Option<ArrayView1<'_, f64>>> {
        Ok(self.model()?.weights().map(|w| w.view()))
    }

    pub fn n_support_vectors(&self) -> Result<usize> {
        Ok(self.model()?.n_support_vectors())
    }
}

impl<S: GroupingStrategy> Classifier for FairSvm<S> {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        self.train(x, y)
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.model()?.predict(x)
    }
}

impl<S: GroupingStrategy> Estimator for FairSvm<S> {
    fn hyperparams(&self) -> Hyperparams {
        self.params.clone()
    }

    fn set_hyperparams(&mut self, params: Hyperparams) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.model = None;
        Ok(())
    }

    fn restrict_to(&self, rows: &[usize]) -> Self {
        let mut params = self.params.clone();
        params.sensible_feature = params
            .sensible_feature
            .map(|values| rows.iter().filter_map(|&row| values.get(row).copied()).collect());
        Self {
            params,
            solver: self.solver.clone(),
            model: None,
            strategy: PhantomData,
        }
    }
}
