//! Partition of training examples into sensitive groups

use crate::core::{ConstraintType, FairSvmError, Result};
use ndarray::ArrayView1;

/// Examples sharing one sensitive value
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub value: f64,
    /// Training row indices, in ascending order
    pub indices: Vec<usize>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Groups ordered by ascending sensitive value
///
/// Every distinct value of the sensitive feature gets a group, even if the
/// constraint type admits none of its examples; such a group is empty.
#[derive(Debug, Clone)]
pub struct GroupPartition {
    groups: Vec<Group>,
    constraint: ConstraintType,
}

impl GroupPartition {
    /// Partition in a single stable pass over the examples
    pub fn new(
        labels: ArrayView1<f64>,
        sensitive: &[f64],
        constraint: ConstraintType,
    ) -> Result<Self> {
        if labels.len() != sensitive.len() {
            return Err(FairSvmError::DimensionMismatch {
                expected: labels.len(),
                actual: sensitive.len(),
            });
        }
        if sensitive.iter().any(|v| v.is_nan()) {
            return Err(FairSvmError::InvalidDataset(
                "Sensitive feature contains NaN".to_string(),
            ));
        }

        let values = sorted_unique(sensitive);
        let mut groups: Vec<Group> = values
            .iter()
            .map(|&value| Group {
                value,
                indices: Vec::new(),
            })
            .collect();

        for (i, (&label, &value)) in labels.iter().zip(sensitive).enumerate() {
            if !constraint.admits(label) {
                continue;
            }
            let value = value + 0.0;
            if let Ok(slot) = values.binary_search_by(|existing| existing.total_cmp(&value)) {
                groups[slot].indices.push(i);
            }
        }

        Ok(Self { groups, constraint })
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn constraint(&self) -> ConstraintType {
        self.constraint
    }

    /// Group with the smallest sensitive value
    pub fn reference(&self) -> Option<&Group> {
        self.groups.first()
    }

    /// Groups after the reference, in ascending value order
    pub fn others(&self) -> &[Group] {
        self.groups.get(1..).unwrap_or(&[])
    }

    /// Group with the largest sensitive value
    pub fn last(&self) -> Option<&Group> {
        self.groups.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.groups.iter().map(|g| g.value).collect()
    }

    /// Fail if the group has no members under this partition's constraint
    pub fn require_members(&self, group: &Group) -> Result<()> {
        if group.is_empty() {
            let reason = match self.constraint {
                ConstraintType::EqualizedOdds => "no positive examples in group",
                ConstraintType::DemographicParity => "no examples in group",
            };
            return Err(FairSvmError::DegenerateGroup {
                value: group.value,
                reason: reason.to_string(),
            });
        }
        Ok(())
    }
}

/// Distinct values in ascending order (-0.0 and 0.0 are the same value)
pub fn sorted_unique(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().map(|&v| v + 0.0).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted
}
