//! Linear fairness constraints on the SVM dual multipliers
//!
//! Each constraint row asks that the average kernel-weighted margin
//! contribution of one group equals that of the reference group, optionally
//! rescaled by a prior ratio:
//!
//! ```text
//! tau_i = mean_{j in group} K[j, i] - weight * mean_{j in reference} K[j, i]
//! row   = y ⊙ tau,   row · a = 0
//! ```

use crate::core::{FairSvmError, Hyperparams, Result};
use crate::fairness::partition::{Group, GroupPartition};
use log::{debug, warn};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Convex combination of a prior ratio with the neutral ratio 1
///
/// `lamda = 0` uses the prior fully, `lamda = 1` ignores it.
pub fn prior_weight(pi: f64, lamda: f64) -> f64 {
    (1.0 - lamda) * pi + lamda
}

/// One fairness constraint row for `group` against `reference`
pub fn fairness_row(
    gram: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    group: &Group,
    reference: &Group,
    weight: f64,
) -> Result<Array1<f64>> {
    let group_mean = column_means(gram, group)?;
    let reference_mean = column_means(gram, reference)?;
    let tau = group_mean - weight * reference_mean;
    Ok(&labels * &tau)
}

/// Mean over the group's rows of every Gram column
fn column_means(gram: ArrayView2<f64>, group: &Group) -> Result<Array1<f64>> {
    gram.select(Axis(0), &group.indices)
        .mean_axis(Axis(0))
        .ok_or_else(|| FairSvmError::DegenerateGroup {
            value: group.value,
            reason: "no members to average".to_string(),
        })
}

/// Single row comparing the largest sensitive value against the smallest
///
/// Groups between the extremes do not take part. With fewer than two
/// distinct values no row is produced.
pub fn two_group_rows(
    gram: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    partition: &GroupPartition,
    params: &Hyperparams,
) -> Result<Vec<Array1<f64>>> {
    let (reference, group) = match (partition.reference(), partition.last()) {
        (Some(reference), Some(group)) if partition.len() >= 2 => (reference, group),
        _ => {
            warn!("Sensitive feature has a single value, fairness constraint skipped");
            return Ok(Vec::new());
        }
    };
    if partition.len() > 2 {
        debug!(
            "Two-group constraint uses values {} and {}, ignoring {} other groups",
            reference.value,
            group.value,
            partition.len() - 2
        );
    }

    partition.require_members(reference)?;
    partition.require_members(group)?;

    let row = fairness_row(gram, labels, group, reference, params.group_weight(0)?)?;
    Ok(vec![row])
}

/// One row per non-reference group, each against the reference group
pub fn multi_group_rows(
    gram: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    partition: &GroupPartition,
    params: &Hyperparams,
) -> Result<Vec<Array1<f64>>> {
    let reference = match partition.reference() {
        Some(reference) if partition.len() >= 2 => reference,
        _ => {
            warn!("Sensitive feature has a single value, fairness constraints skipped");
            return Ok(Vec::new());
        }
    };

    for group in partition.groups() {
        partition.require_members(group)?;
    }

    partition
        .others()
        .iter()
        .enumerate()
        .map(|(k, group)| {
            fairness_row(gram, labels, group, reference, params.group_weight(k)?)
        })
        .collect()
}
