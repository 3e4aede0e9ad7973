//! Multi-group linear fair projection
//!
//! For groups sorted by sensitive value, with the smallest as reference,
//! one direction is built per other group:
//!
//! ```text
//! u_k = pi_k * mean_reference - mean_k
//! ```
//!
//! The directions are removed one after another. Each `u_k` is first mapped
//! through the steps already learned, so the composite projection sends
//! every `u_k` to zero and drops exactly one column per non-reference group.

use crate::core::{Classifier, FairSvmError, Prior, Result};
use crate::data::validate_training_set;
use crate::projection::{positive_group_means, ProjectionStep};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

#[derive(Debug, Clone)]
pub struct LinearPferm<M> {
    model: M,
    sensible_feature: Vec<f64>,
    prior: bool,
    pi: Prior,
    directions: Vec<Array1<f64>>,
    steps: Vec<ProjectionStep>,
    representation: Option<Array2<f64>>,
}

impl<M: Classifier> LinearPferm<M> {
    pub fn new(model: M, sensible_feature: Vec<f64>) -> Self {
        Self {
            model,
            sensible_feature,
            prior: false,
            pi: Prior::default(),
            directions: Vec::new(),
            steps: Vec::new(),
            representation: None,
        }
    }

    /// Scale the reference mean by `pi` (one ratio, or one per non-reference group)
    pub fn with_prior(mut self, pi: impl Into<Prior>) -> Self {
        self.prior = true;
        self.pi = pi.into();
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Raw group directions `u_k` in the original feature space
    pub fn directions(&self) -> &[Array1<f64>] {
        &self.directions
    }

    /// Learned projections, in application order
    pub fn steps(&self) -> &[ProjectionStep] {
        &self.steps
    }

    pub fn is_fitted(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn training_representation(&self) -> Option<ArrayView2<'_, f64>> {
        self.representation.as_ref().map(|r| r.view())
    }

    /// Apply every learned projection to new examples
    pub fn new_representation(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted() {
            return Err(FairSvmError::ModelNotTrained);
        }
        apply_all(&self.steps, x)
    }

    fn group_directions(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Vec<Array1<f64>>> {
        let means = positive_group_means(x, y, &self.sensible_feature)?;
        let (_, reference) = &means[0];

        means[1..]
            .iter()
            .enumerate()
            .map(|(k, (value, mean))| {
                let weight = if self.prior { self.pi.ratio(k)? } else { 1.0 };
                debug!("Direction {k}: group {value} with weight {weight}");
                Ok(weight * reference - mean)
            })
            .collect()
    }
}

fn apply_all(steps: &[ProjectionStep], x: ArrayView2<f64>) -> Result<Array2<f64>> {
    let mut current = x.to_owned();
    for step in steps {
        current = step.apply(current.view())?;
    }
    Ok(current)
}

impl<M: Classifier> Classifier for LinearPferm<M> {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        self.directions.clear();
        self.steps.clear();
        self.representation = None;
        if !self.pi.is_finite() {
            return Err(FairSvmError::InvalidParameter(format!(
                "Prior ratios must be finite, got: {:?}",
                self.pi
            )));
        }
        validate_training_set(x, y, Some(&self.sensible_feature))?;

        let directions = self.group_directions(x, y)?;
        if directions.len() >= x.ncols() {
            return Err(FairSvmError::InvalidDataset(format!(
                "{} groups need more than {} features to project",
                directions.len() + 1,
                x.ncols()
            )));
        }

        let mut steps: Vec<ProjectionStep> = Vec::with_capacity(directions.len());
        for direction in &directions {
            let mapped = apply_all(&steps, direction.view().insert_axis(Axis(0)))?;
            let step = ProjectionStep::from_direction(mapped.row(0).to_owned())?;
            steps.push(step);
        }

        let representation = apply_all(&steps, x)?;
        info!(
            "Removed {} directions ({} -> {} features)",
            steps.len(),
            x.ncols(),
            representation.ncols()
        );

        self.model.fit(representation.view(), y)?;
        self.directions = directions;
        self.steps = steps;
        self.representation = Some(representation);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let projected = self.new_representation(x)?;
        self.model.predict(projected.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Pferm;
    use crate::projection::LinearFerm;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn linear_svm() -> Pferm {
        Pferm::new().with_kernel("linear").with_c(10.0)
    }

    fn three_groups() -> (Array2<f64>, Array1<f64>, Vec<f64>) {
        let x = array![
            [1.0, 2.0, 0.5, 0.0],
            [2.0, 1.0, 1.0, 0.5],
            [-1.0, -0.5, 0.0, 0.2],
            [1.5, 3.0, 2.0, 1.0],
            [2.5, 2.5, 3.0, 0.0],
            [-1.5, 1.0, 2.0, 0.3],
            [0.5, 1.0, -1.0, 2.0],
            [1.0, 0.0, -0.5, 3.0],
            [-0.5, -1.0, 0.5, 1.0]
        ];
        let y = array![1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, -1.0];
        let sensitive = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        (x, y, sensitive)
    }

    #[test]
    fn test_sequential_projection_annihilates_every_direction() {
        let (x, y, sensitive) = three_groups();
        let mut algorithm = LinearPferm::new(linear_svm(), sensitive);
        algorithm.fit(x.view(), y.view()).unwrap();

        assert_eq!(algorithm.directions().len(), 2);
        assert_eq!(algorithm.steps().len(), 2);
        assert_eq!(algorithm.training_representation().unwrap().ncols(), 2);

        for u in algorithm.directions() {
            let image = algorithm
                .new_representation(u.view().insert_axis(Axis(0)))
                .unwrap();
            assert!(image.iter().all(|v| v.abs() < 1e-9));
        }
    }

    #[test]
    fn test_directions_against_reference_group() {
        let (x, y, sensitive) = three_groups();
        let mut algorithm = LinearPferm::new(linear_svm(), sensitive).with_prior(vec![1.0, 2.0]);
        algorithm.fit(x.view(), y.view()).unwrap();

        // positive means: [1.5, 1.5, 0.75, 0.25], [2.0, 2.75, 2.5, 0.5], [0.75, 0.5, -0.75, 2.5]
        let u = algorithm.directions();
        assert_abs_diff_eq!(u[0][1], 1.5 - 2.75, epsilon = 1e-12);
        assert_abs_diff_eq!(u[1][3], 2.0 * 0.25 - 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_two_groups_match_linear_ferm() {
        let x = array![
            [1.0, 2.0, 0.5],
            [2.0, 1.5, 1.0],
            [-1.0, -0.5, 0.0],
            [1.5, 3.0, 2.5],
            [2.5, 2.0, 3.0],
            [-1.5, 1.0, 2.0]
        ];
        let y = array![1.0, 1.0, -1.0, 1.0, 1.0, -1.0];
        let sensitive = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut multi = LinearPferm::new(linear_svm(), sensitive.clone());
        let mut two = LinearFerm::new(linear_svm(), sensitive);
        multi.fit(x.view(), y.view()).unwrap();
        two.fit(x.view(), y.view()).unwrap();

        assert_eq!(multi.steps()[0], *two.step().unwrap());
        assert_eq!(
            multi.training_representation().unwrap(),
            two.training_representation().unwrap()
        );
    }

    #[test]
    fn test_parallel_directions_give_zero_pivot() {
        // Group means of positives lie on one line through the reference mean
        let x = array![
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [2.0, 0.0, 1.0],
            [2.0, 4.0, -1.0],
            [0.0, 3.0, 1.0]
        ];
        let y = array![1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let sensitive = vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut algorithm = LinearPferm::new(linear_svm(), sensitive);

        assert!(matches!(
            algorithm.fit(x.view(), y.view()),
            Err(FairSvmError::ZeroPivot { .. })
        ));
        assert!(!algorithm.is_fitted());
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _, sensitive) = three_groups();
        let algorithm = LinearPferm::new(linear_svm(), sensitive);
        assert!(matches!(
            algorithm.predict(x.view()),
            Err(FairSvmError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_non_finite_prior_rejected() {
        let (x, y, sensitive) = three_groups();
        for pi in [vec![1.0, f64::NAN], vec![f64::INFINITY, 2.0]] {
            let mut algorithm = LinearPferm::new(linear_svm(), sensitive.clone()).with_prior(pi);
            assert!(matches!(
                algorithm.fit(x.view(), y.view()),
                Err(FairSvmError::InvalidParameter(_))
            ));
            assert!(!algorithm.is_fitted());
        }

        let mut algorithm = LinearPferm::new(linear_svm(), sensitive).with_prior(f64::NAN);
        assert!(matches!(
            algorithm.fit(x.view(), y.view()),
            Err(FairSvmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_too_many_groups_for_features() {
        let x = array![[1.0], [2.0], [3.0], [-1.0]];
        let y = array![1.0, 1.0, 1.0, -1.0];
        let mut algorithm = LinearPferm::new(linear_svm(), vec![0.0, 1.0, 2.0, 0.0]);
        assert!(matches!(
            algorithm.fit(x.view(), y.view()),
            Err(FairSvmError::InvalidDataset(_))
        ));
    }
}
