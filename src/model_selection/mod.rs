//! Cross-validated hyperparameter search
//!
//! [`GridSearch`] drives any [`Estimator`] over the cartesian product of a
//! [`ParamGrid`], scores each candidate by mean accuracy over
//! [`StratifiedKFold`] folds and refits the best one on the full data.

use crate::core::{Classifier, Estimator, FairSvmError, Hyperparams, Result};
use log::{debug, info, warn};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Values to try per hyperparameter; an empty list keeps the estimator's value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub kernel: Vec<String>,
    #[serde(rename = "C")]
    pub c: Vec<f64>,
    pub gamma: Vec<f64>,
    pub lamda: Vec<f64>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kernels<I, S>(mut self, kernels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kernel = kernels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_c(mut self, values: Vec<f64>) -> Self {
        self.c = values;
        self
    }

    pub fn with_gamma(mut self, values: Vec<f64>) -> Self {
        self.gamma = values;
        self
    }

    pub fn with_lamda(mut self, values: Vec<f64>) -> Self {
        self.lamda = values;
        self
    }

    /// Parse a grid such as `{"kernel": ["rbf"], "C": [0.1, 1, 10], "gamma": [0.1, 0.01]}`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Number of candidates the grid expands to
    pub fn len(&self) -> usize {
        [self.kernel.len(), self.c.len(), self.gamma.len(), self.lamda.len()]
            .iter()
            .map(|&n| n.max(1))
            .product()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every combination, applied on top of `base`
    pub fn candidates(&self, base: &Hyperparams) -> Vec<Hyperparams> {
        let kernels = axis_or(&self.kernel, base.kernel.clone());
        let cs: Vec<Option<f64>> = if self.c.is_empty() {
            vec![base.c]
        } else {
            self.c.iter().map(|&c| Some(c)).collect()
        };
        let gammas = axis_or(&self.gamma, base.gamma);
        let lamdas = axis_or(&self.lamda, base.lamda);

        let mut candidates = Vec::with_capacity(self.len());
        for kernel in &kernels {
            for &c in &cs {
                for &gamma in &gammas {
                    for &lamda in &lamdas {
                        candidates.push(Hyperparams {
                            kernel: kernel.clone(),
                            c,
                            gamma,
                            lamda,
                            ..base.clone()
                        });
                    }
                }
            }
        }
        candidates
    }
}

fn axis_or<T: Clone>(values: &[T], fallback: T) -> Vec<T> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

/// Deterministic stratified k-fold splitter
///
/// Within each class, examples are dealt to folds round-robin in index
/// order, so every fold keeps the class proportions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        Self { n_splits: 3 }
    }
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(FairSvmError::InvalidParameter(format!(
                "Cross-validation needs at least 2 folds, got: {n_splits}"
            )));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// `(train, test)` index lists, both ascending
    pub fn split(&self, y: ArrayView1<f64>) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if y.len() < self.n_splits {
            return Err(FairSvmError::InvalidParameter(format!(
                "Cannot split {} examples into {} folds",
                y.len(),
                self.n_splits
            )));
        }

        let mut fold_of = vec![0; y.len()];
        let mut positives = 0;
        let mut negatives = 0;
        for (i, &label) in y.iter().enumerate() {
            let counter = if label > 0.0 {
                &mut positives
            } else {
                &mut negatives
            };
            fold_of[i] = *counter % self.n_splits;
            *counter += 1;
        }

        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| fold_of[i] == fold);
                (train, test)
            })
            .collect())
    }
}

/// Cross-validation outcome of one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub params: Hyperparams,
    pub fold_scores: Vec<f64>,
    /// `None` when fitting failed on some fold
    pub mean_score: Option<f64>,
}

/// Exhaustive search over a [`ParamGrid`]
#[derive(Debug, Clone)]
pub struct GridSearch<E> {
    estimator: E,
    grid: ParamGrid,
    cv: StratifiedKFold,
    results: Vec<CandidateResult>,
    best_index: Option<usize>,
    best_estimator: Option<E>,
}

impl<E: Estimator> GridSearch<E> {
    pub fn new(estimator: E, grid: ParamGrid) -> Self {
        Self {
            estimator,
            grid,
            cv: StratifiedKFold::default(),
            results: Vec::new(),
            best_index: None,
            best_estimator: None,
        }
    }

    pub fn with_cv(mut self, cv: StratifiedKFold) -> Self {
        self.cv = cv;
        self
    }

    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// Results of the last `fit`, in grid order
    pub fn results(&self) -> &[CandidateResult] {
        &self.results
    }

    pub fn best_params(&self) -> Option<&Hyperparams> {
        self.best_index.map(|i| &self.results[i].params)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_index.and_then(|i| self.results[i].mean_score)
    }

    /// Best candidate refitted on all training data
    pub fn best_estimator(&self) -> Option<&E> {
        self.best_estimator.as_ref()
    }

    fn cross_validate(
        &self,
        params: &Hyperparams,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        folds: &[(Vec<usize>, Vec<usize>)],
    ) -> Result<Vec<f64>> {
        let mut candidate = self.estimator.clone();
        candidate.set_hyperparams(params.clone())?;

        folds
            .iter()
            .map(|(train, test)| {
                let mut model = candidate.restrict_to(train);
                let x_train = x.select(Axis(0), train);
                let y_train = y.select(Axis(0), train);
                model.fit(x_train.view(), y_train.view())?;

                let x_test = x.select(Axis(0), test);
                let y_test = y.select(Axis(0), test);
                model.score(x_test.view(), y_test.view())
            })
            .collect()
    }
}

impl<E: Estimator> Classifier for GridSearch<E> {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        self.results.clear();
        self.best_index = None;
        self.best_estimator = None;

        let folds = self.cv.split(y)?;
        let candidates = self.grid.candidates(&self.estimator.hyperparams());
        debug!(
            "Grid search over {} candidates with {} folds",
            candidates.len(),
            folds.len()
        );

        let mut results = Vec::with_capacity(candidates.len());
        for params in candidates {
            let result = match self.cross_validate(&params, x, y, &folds) {
                Ok(scores) => {
                    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                    info!(
                        "kernel={} C={:?} gamma={} lamda={}: mean accuracy {:.4}",
                        params.kernel, params.c, params.gamma, params.lamda, mean
                    );
                    CandidateResult {
                        params,
                        fold_scores: scores,
                        mean_score: Some(mean),
                    }
                }
                Err(e) => {
                    warn!(
                        "kernel={} C={:?} gamma={} lamda={}: excluded ({e})",
                        params.kernel, params.c, params.gamma, params.lamda
                    );
                    CandidateResult {
                        params,
                        fold_scores: Vec::new(),
                        mean_score: None,
                    }
                }
            };
            results.push(result);
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, result) in results.iter().enumerate() {
            if let Some(score) = result.mean_score {
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((i, score));
                }
            }
        }
        let (best_index, best_score) = best.ok_or_else(|| {
            FairSvmError::OptimizationError("no grid candidate could be fitted".to_string())
        })?;

        let mut refit = self.estimator.clone();
        refit.set_hyperparams(results[best_index].params.clone())?;
        refit.fit(x, y)?;
        info!("Best candidate #{best_index} with mean accuracy {best_score:.4}");

        self.results = results;
        self.best_index = Some(best_index);
        self.best_estimator = Some(refit);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.best_estimator
            .as_ref()
            .ok_or(FairSvmError::ModelNotTrained)?
            .predict(x)
    }
}
