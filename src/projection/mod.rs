//! Fairness through feature-space projection
//!
//! Instead of constraining the dual, these estimators remove the direction
//! separating the groups' positive-class means from feature space and then
//! train any wrapped classifier on the projected data.

pub mod linear_ferm;
pub mod linear_pferm;
pub mod step;

pub use self::linear_ferm::*;
pub use self::linear_pferm::*;
pub use self::step::*;

use crate::core::{ConstraintType, FairSvmError, Result};
use crate::fairness::{Group, GroupPartition};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Positive-class examples per sensitive value, with the group feature means
///
/// Fails if the sensitive feature has a single value or if a group has no
/// positive example.
pub(crate) fn positive_group_means(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    sensitive: &[f64],
) -> Result<Vec<(f64, Array1<f64>)>> {
    let partition = GroupPartition::new(y, sensitive, ConstraintType::EqualizedOdds)?;
    if partition.len() < 2 {
        return Err(FairSvmError::DegenerateGroup {
            value: partition.reference().map_or(f64::NAN, |g| g.value),
            reason: "a single sensitive value leaves no direction to remove".to_string(),
        });
    }

    partition
        .groups()
        .iter()
        .map(|group| {
            partition.require_members(group)?;
            Ok((group.value, group_mean(x, group)?))
        })
        .collect()
}

fn group_mean(x: ArrayView2<f64>, group: &Group) -> Result<Array1<f64>> {
    x.select(Axis(0), &group.indices)
        .mean_axis(Axis(0))
        .ok_or_else(|| FairSvmError::DegenerateGroup {
            value: group.value,
            reason: "no members to average".to_string(),
        })
}
