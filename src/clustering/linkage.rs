use std::cmp::Ordering;
use log::debug;

use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use super::{LinkageMethod, LinkageStructure, Merge};

// ........................... CondensedDistances ..........................................

/// Upper triangle of a symmetric distance matrix, stored row by row without the diagonal.
#[derive(Clone, Debug)]
struct CondensedDistances {
    n : usize,
    distances : Vec<f64>
}

impl CondensedDistances {
    /// Euclidean distances between all pairs of rows.
    fn euclidean(matrix : &FeatureMatrix) -> Self {
        let n = matrix.n_rows();
        let mut distances = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                distances.push(matrix.distance(i, j));
            }
        }
        CondensedDistances { n, distances }
    }

    fn index(&self, a : usize, b : usize) -> usize {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        self.n * i - i * (i + 1) / 2 + (j - i - 1)
    }

    fn get(&self, a : usize, b : usize) -> f64 { self.distances[self.index(a, b)] }

    fn set(&mut self, a : usize, b : usize, distance : f64) {
        let index = self.index(a, b);
        self.distances[index] = distance;
    }
}

// ........................... ActiveCluster ..........................................

/// A cluster that has not yet been merged into another, parked in one slot of the distance matrix.
#[derive(Copy, Clone, Debug)]
struct ActiveCluster {
    slot : usize,
    id : usize,
    size : usize
}

/// Candidate pair ordering: smaller distance first, then the lexicographically smaller `(lower id, higher id)`.
///
/// Uses the IEEE total order, so a distance that overflowed to infinity still ranks and a NaN ranks last.
/// Adding zero folds `-0.0` into `0.0` before comparing.
fn precedes(distance : f64, ids : (usize, usize), best : Option<(f64, (usize, usize))>) -> bool {
    match best {
        None => true,
        Some((best_distance, best_ids)) =>
            (distance + 0.0).total_cmp(&(best_distance + 0.0)).then(ids.cmp(&best_ids)) == Ordering::Less
    }
}

fn ordered_ids(a : usize, b : usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Agglomerate the rows of the matrix into a single cluster, recording every merge.
///
/// Starts with one singleton cluster per row and repeatedly merges the closest pair under the
/// chosen linkage method, updating distances with the Lance-Williams recurrence.
/// Ties go to the pair with the lowest `(lower id, higher id)`, so identical input always yields an identical tree.
///
/// Runs in `O(n³)` time and `O(n²)` memory; callers are expected to bound the number of rows.
///
///   - returns - `EmptyDataset` if the matrix has no rows. A single row yields a structure with no merges.
///   - returns - `NonFiniteValue` if an entry of the matrix is infinite or NaN.
pub fn compute_linkage(matrix : &FeatureMatrix, method : LinkageMethod) -> Result<LinkageStructure> {
    let n = matrix.n_rows();
    if n == 0 {
        return Err(Error::EmptyDataset);
    }
    if let Some((row, col)) = matrix.first_non_finite() {
        return Err(Error::NonFiniteValue { column : format!("feature {}", col), row });
    }
    debug!("Computing {} linkage over {} samples with {} features", method, n, matrix.n_cols());

    let mut distances = CondensedDistances::euclidean(matrix);
    let mut active : Vec<ActiveCluster> = (0..n).map(|i| ActiveCluster { slot : i, id : i, size : 1 }).collect();
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..(n - 1) {
        let mut best = (0, 1);
        let mut best_pair : Option<(f64, (usize, usize))> = None;
        for x in 0..active.len() {
            for y in (x + 1)..active.len() {
                let distance = distances.get(active[x].slot, active[y].slot);
                let ids = ordered_ids(active[x].id, active[y].id);
                if precedes(distance, ids, best_pair) {
                    best = (x, y);
                    best_pair = Some((distance, ids));
                }
            }
        }
        let (d_ab, (left, right)) = match best_pair {
            Some(pair) => pair,
            None => return Err(Error::MalformedLinkage(format!("no pair left to merge at step {}", step)))
        };

        let (x, y) = best;
        let a = active[x];
        let b = active[y];
        let merged_size = a.size + b.size;
        merges.push(Merge { left, right, distance : d_ab, size : merged_size });

        // The union takes over the slot of `a`; `b`'s slot is abandoned.
        for k in active.iter() {
            if k.slot == a.slot || k.slot == b.slot { continue; }
            let updated = method.updated_distance(
                distances.get(k.slot, a.slot),
                distances.get(k.slot, b.slot),
                d_ab,
                a.size,
                b.size,
                k.size
            );
            distances.set(k.slot, a.slot, updated);
        }
        active[x] = ActiveCluster { slot : a.slot, id : n + step, size : merged_size };
        active.remove(y);
    }

    LinkageStructure::from_merges(n, method, merges)
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use spectral::prelude::*;
    use super::*;

    fn line(points : &[f64]) -> FeatureMatrix {
        FeatureMatrix::from_rows(&points.iter().map(|x| vec![*x]).collect::<Vec<_>>())
    }

    #[test]
    fn single_linkage_on_a_line() {
        let linkage = compute_linkage(&line(&[0.0, 1.0, 3.0, 7.0]), LinkageMethod::Single).unwrap();
        let merges = linkage.merges();
        asserting("Three merges").that(&merges.len()).is_equal_to(3);
        asserting("First merge").that(&merges[0]).is_equal_to(Merge { left : 0, right : 1, distance : 1.0, size : 2 });
        asserting("Second merge").that(&merges[1]).is_equal_to(Merge { left : 2, right : 4, distance : 2.0, size : 3 });
        asserting("Third merge").that(&merges[2]).is_equal_to(Merge { left : 3, right : 5, distance : 4.0, size : 4 });
    }

    #[test]
    fn complete_and_average_on_a_line() {
        let complete = compute_linkage(&line(&[0.0, 1.0, 3.0, 7.0]), LinkageMethod::Complete).unwrap();
        asserting("Complete second merge").that(&complete.merges()[1].distance).is_equal_to(3.0);
        asserting("Complete last merge").that(&complete.merges()[2].distance).is_equal_to(7.0);

        let average = compute_linkage(&line(&[0.0, 1.0, 3.0, 7.0]), LinkageMethod::Average).unwrap();
        asserting("Average second merge").that(&average.merges()[1].distance).is_equal_to(2.5);
        // (7 + 6 + 4) / 3
        asserting("Average last merge").that(&((average.merges()[2].distance - 17.0 / 3.0).abs() < 1e-12)).is_equal_to(true);
    }

    #[test]
    fn ward_distance_reflects_variance_increase() {
        // Two pairs: {0, 2} and {10, 12}. Merging the pairs costs sqrt(2 * |c1 - c2|^2 * n1 * n2 / (n1 + n2)).
        let linkage = compute_linkage(&line(&[0.0, 2.0, 10.0, 12.0]), LinkageMethod::Ward).unwrap();
        let last = linkage.merges()[2];
        let expected = (2.0 * 100.0 * 2.0 * 2.0 / 4.0_f64).sqrt();
        asserting(&format!("Ward top merge {}", last.distance)).that(&((last.distance - expected).abs() < 1e-9)).is_equal_to(true);
        asserting("Top merge joins the two pairs").that(&(last.left, last.right)).is_equal_to((4, 5));
    }

    #[test]
    fn ties_go_to_lowest_ids() {
        let linkage = compute_linkage(&line(&[5.0, 5.0, 5.0, 5.0]), LinkageMethod::Single).unwrap();
        let pairs : Vec<(usize, usize)> = linkage.merges().iter().map(|m| (m.left, m.right)).collect();
        asserting("Deterministic tie order").that(&pairs).is_equal_to(vec![(0, 1), (2, 3), (4, 5)]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let matrix = FeatureMatrix::from_rows(&[
            vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![0.5, 0.5]
        ]);
        for method in LinkageMethod::ALL.iter() {
            let first = compute_linkage(&matrix, *method).unwrap();
            let second = compute_linkage(&matrix, *method).unwrap();
            asserting(&format!("{} is deterministic", method)).that(&first).is_equal_to(second);
        }
    }

    #[test]
    fn output_is_a_valid_tree() {
        let matrix = FeatureMatrix::from_rows(&[
            vec![3.0, 1.0], vec![-2.0, 4.0], vec![0.5, 0.5], vec![9.0, -1.0], vec![3.5, 1.5], vec![-2.5, 3.0]
        ]);
        for method in LinkageMethod::ALL.iter() {
            let linkage = compute_linkage(&matrix, *method).unwrap();
            let rebuilt = LinkageStructure::from_merges(6, *method, linkage.merges().to_vec());
            asserting(&format!("{} tree is well formed", method)).that(&rebuilt.is_ok()).is_equal_to(true);
            asserting(&format!("{} root holds every sample", method)).that(&linkage.merges()[4].size).is_equal_to(6);
        }
    }

    #[test]
    fn distances_beyond_the_float_range_still_form_a_tree() {
        // Every pairwise distance overflows to infinity.
        let linkage = compute_linkage(&line(&[-1.7e308, 0.0, 1.7e308]), LinkageMethod::Ward).unwrap();
        let pairs : Vec<(usize, usize)> = linkage.merges().iter().map(|m| (m.left, m.right)).collect();
        asserting("Lowest ids first").that(&pairs).is_equal_to(vec![(0, 1), (2, 3)]);
        asserting("Root holds every sample").that(&linkage.merges()[1].size).is_equal_to(3);
    }

    #[test]
    fn non_finite_entries_are_rejected() {
        let matrix = FeatureMatrix::from_rows(&[vec![0.0, 1.0], vec![f64::NAN, 2.0], vec![3.0, 4.0]]);
        let result = compute_linkage(&matrix, LinkageMethod::Single);
        asserting("Non finite").that(&matches!(result, Err(Error::NonFiniteValue { row : 1, .. }))).is_equal_to(true);
    }

    #[test]
    fn single_sample_has_no_merges() {
        let linkage = compute_linkage(&line(&[1.0]), LinkageMethod::Ward).unwrap();
        asserting("No merges").that(&linkage.is_empty()).is_equal_to(true);
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let result = compute_linkage(&FeatureMatrix::from_rows(&[]), LinkageMethod::Ward);
        asserting("Empty").that(&matches!(result, Err(Error::EmptyDataset))).is_equal_to(true);
    }
}
