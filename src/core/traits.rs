//! Core traits shared by every classifier in the crate

use crate::core::{Hyperparams, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A binary classifier with a fit / predict / score contract
///
/// Labels are encoded as -1.0 and +1.0.
pub trait Classifier {
    /// Train on a feature matrix (one row per example) and its labels
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()>;

    /// Predict a label for every row of `x`
    ///
    /// Fails with [`crate::core::FairSvmError::ModelNotTrained`] before `fit`.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;

    /// Fraction of rows whose predicted label equals the given label
    fn score(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        crate::metrics::accuracy(y, predictions.view())
    }
}

/// A classifier whose hyperparameters can be read and replaced, so it can be
/// driven by a generic search such as [`crate::model_selection::GridSearch`]
pub trait Estimator: Classifier + Clone {
    /// Current hyperparameters
    fn hyperparams(&self) -> Hyperparams;

    /// Replace the hyperparameters, discarding any trained state
    fn set_hyperparams(&mut self, params: Hyperparams) -> Result<()>;

    /// Copy of this estimator whose per-example hyperparameters only cover
    /// the given training rows
    fn restrict_to(&self, _rows: &[usize]) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Predicts the majority label seen during fit
    #[derive(Debug, Clone, Default)]
    struct Majority {
        params: Hyperparams,
        label: Option<f64>,
    }

    impl Classifier for Majority {
        fn fit(&mut self, _x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
            self.label = Some(if y.sum() >= 0.0 { 1.0 } else { -1.0 });
            Ok(())
        }

        fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
            let label = self
                .label
                .ok_or(crate::core::FairSvmError::ModelNotTrained)?;
            Ok(Array1::from_elem(x.nrows(), label))
        }
    }

    impl Estimator for Majority {
        fn hyperparams(&self) -> Hyperparams {
            self.params.clone()
        }

        fn set_hyperparams(&mut self, params: Hyperparams) -> Result<()> {
            self.params = params;
            self.label = None;
            Ok(())
        }
    }

    #[test]
    fn test_default_score_is_accuracy() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0, -1.0];
        let mut model = Majority::default();
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.score(x.view(), y.view()).unwrap(), 0.75);
    }

    #[test]
    fn test_default_restriction_is_a_plain_copy() {
        let x = array![[0.0], [1.0]];
        let y = array![-1.0, -1.0];
        let mut model = Majority {
            params: Hyperparams {
                c: Some(3.0),
                ..Hyperparams::default()
            },
            label: None,
        };
        model.fit(x.view(), y.view()).unwrap();

        let restricted = model.restrict_to(&[1]);
        assert_eq!(restricted.hyperparams(), model.hyperparams());
        assert_eq!(restricted.label, Some(-1.0));
    }
}
