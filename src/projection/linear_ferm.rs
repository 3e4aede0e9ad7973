//! Two-group linear fair projection

use crate::core::{Classifier, FairSvmError, Result};
use crate::data::validate_training_set;
use crate::projection::{positive_group_means, ProjectionStep};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Projects out the difference between the positive-class means of the
/// largest and smallest sensitive value, then trains `M` on the result
///
/// With a prior ratio `pi` the direction is `pi * mean_min - mean_max`;
/// without it `pi` is 1.
#[derive(Debug, Clone)]
pub struct LinearFerm<M> {
    model: M,
    sensible_feature: Vec<f64>,
    prior: bool,
    pi: f64,
    step: Option<ProjectionStep>,
    representation: Option<Array2<f64>>,
}

impl<M: Classifier> LinearFerm<M> {
    pub fn new(model: M, sensible_feature: Vec<f64>) -> Self {
        Self {
            model,
            sensible_feature,
            prior: false,
            pi: 1.0,
            step: None,
            representation: None,
        }
    }

    /// Scale the smallest value's mean by `pi`
    pub fn with_prior(mut self, pi: f64) -> Self {
        self.prior = true;
        self.pi = pi;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Learned projection, set by `fit`
    pub fn step(&self) -> Option<&ProjectionStep> {
        self.step.as_ref()
    }

    /// Training features after projection
    pub fn training_representation(&self) -> Option<ArrayView2<'_, f64>> {
        self.representation.as_ref().map(|r| r.view())
    }

    /// Apply the learned projection to new examples
    pub fn new_representation(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.step
            .as_ref()
            .ok_or(FairSvmError::ModelNotTrained)?
            .apply(x)
    }

    fn direction(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>> {
        let means = positive_group_means(x, y, &self.sensible_feature)?;
        let (min_value, min_mean) = &means[0];
        let (max_value, max_mean) = &means[means.len() - 1];
        debug!("Projecting out group {max_value} against group {min_value}");

        let weight = if self.prior { self.pi } else { 1.0 };
        Ok(weight * min_mean - max_mean)
    }
}

impl<M: Classifier> Classifier for LinearFerm<M> {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        self.step = None;
        self.representation = None;
        if !self.pi.is_finite() {
            return Err(FairSvmError::InvalidParameter(format!(
                "Prior ratio must be finite, got: {}",
                self.pi
            )));
        }
        validate_training_set(x, y, Some(&self.sensible_feature))?;

        let step = ProjectionStep::from_direction(self.direction(x, y)?)?;
        let representation = step.apply(x)?;
        info!(
            "Removed feature {} ({} -> {} features)",
            step.pivot(),
            step.input_dim(),
            step.output_dim()
        );

        self.model.fit(representation.view(), y)?;
        self.step = Some(step);
        self.representation = Some(representation);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let projected = self.new_representation(x)?;
        self.model.predict(projected.view())
    }
}
