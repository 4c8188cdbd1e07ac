//! Cluster quality and descriptive statistics for a finished clustering.
use std::collections::BTreeMap;
use log::debug;
use serde::Serialize;

use crate::clustering::Assignment;
use crate::matrix::{euclidean, FeatureMatrix};

pub mod bcubed;

pub use self::bcubed::BCubed;

/// Summary attached to a clustering run.
///
/// Always complete: an undefined silhouette is reported as `None`, never as an error.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub n_samples : usize,
    /// Distinct labels actually present.
    pub n_clusters : usize,
    /// Width of the matrix the clustering ran on.
    pub n_encoded_features : usize,
    pub silhouette_score : Option<f64>,
    /// Sample count per label, ordered by label.
    pub cluster_sizes : BTreeMap<usize, usize>
}

impl MetricsSummary {
    /// Plain nested mapping, ready for storage next to the run.
    pub fn to_json(&self) -> serde_json::Value {
        // Serialization of plain maps and numbers cannot fail; NaN is impossible since the silhouette is bounded.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Mean silhouette coefficient over all samples.
///
/// For each sample, `a` is its mean distance to the other members of its cluster and `b` the smallest
/// mean distance to the members of any other cluster; its coefficient is `(b - a) / max(a, b)`.
/// A sample alone in its cluster scores zero.
///
///   - returns - `None` when there are fewer than two distinct labels, every sample is its own cluster,
///     or the assignment does not hold exactly one label per row; otherwise a value in `[-1, 1]`.
pub fn silhouette_score(matrix : &FeatureMatrix, assignment : &Assignment) -> Option<f64> {
    let n = matrix.n_rows();
    if assignment.len() != n {
        debug!("Silhouette undefined: {} labels for {} rows", assignment.len(), n);
        return None;
    }
    let members = assignment.members();
    let n_labels = members.len();
    if n_labels < 2 || n_labels >= n {
        return None;
    }

    let mut total = 0.0;
    for sample in 0..n {
        let own_label = assignment.label(sample);
        let point = matrix.row(sample);
        let mut a = 0.0;
        let mut b = f64::INFINITY;
        for (label, cluster) in members.iter() {
            let sum : f64 = cluster.iter().map(|&other| euclidean(point, matrix.row(other))).sum();
            if *label == own_label {
                if cluster.len() == 1 {
                    a = f64::NAN;
                }
                else {
                    a = sum / (cluster.len() - 1) as f64;
                }
            }
            else {
                b = b.min(sum / cluster.len() as f64);
            }
        }
        if a.is_nan() { continue; }
        let denominator = a.max(b);
        if denominator > 0.0 {
            total += (b - a) / denominator;
        }
    }
    Some((total / n as f64).max(-1.0).min(1.0))
}

/// Sample count per label.
pub fn cluster_sizes(assignment : &Assignment) -> BTreeMap<usize, usize> {
    assignment.sizes()
}

/// Compute the full metrics summary for a clustering.
///
///   - `matrix` - The matrix the clustering ran on (after any reduction).
///   - `assignment` - One label per row of `matrix`. Otherwise the silhouette is reported as `None`.
pub fn compile_metrics(matrix : &FeatureMatrix, assignment : &Assignment) -> MetricsSummary {
    let cluster_sizes = cluster_sizes(assignment);
    let silhouette = silhouette_score(matrix, assignment);
    debug!("Silhouette score: {:?}", silhouette);
    MetricsSummary {
        n_samples : assignment.len(),
        n_clusters : cluster_sizes.len(),
        n_encoded_features : matrix.n_cols(),
        silhouette_score : silhouette,
        cluster_sizes
    }
}
