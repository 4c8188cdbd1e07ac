use std::collections::{HashMap, hash_map::Entry};

use crate::clustering::Assignment;
use crate::error::{Error, Result};

/// The B-Cubed extrinsic measure of the similarity of two flat clusterings of the same samples.
///
/// A similarity of one means perfect concordance between the clusters and the reference segments.
/// The closer the similarity gets to zero, the worse the concordance.
/// Label values themselves are irrelevant; only which samples share a label matters.
///
/// The measure was proposed by **A. Bagga and B. Baldwin**, _Entity-based cross-document coreferencing
/// using the vector space model_, ACL '98. The definition used here is the plain (not the unbalanced-dataset)
/// variant.
///
/// ```text
///   F = 1 / (alpha / P + (1 - alpha) / R)
///
///   P = 1/N  Σ over solution clusters c   (1/|c|)  Σ over x, y in c   [x and y share a reference label]
///   R = 1/N  Σ over reference segments s  (1/|s|)  Σ over x, y in s   [x and y share a solution label]
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BCubed {
    /// Homogeneity. Are only related samples grouped together (high precision),
    /// or are they mixed with unrelated ones (low precision)?
    precision : f64,

    /// Completeness. Are related samples gathered into a single cluster (high recall)
    /// or split across several (low recall)?
    recall : f64,

    /// Weight between zero and one combining `precision` and `recall`.
    ///    - If `alpha` is 0.5, both are weighted equally.
    ///    - If `alpha` is zero, only `recall` is used.
    ///    - If `alpha` is one, only `precision` is used.
    alpha : f64
}

impl BCubed {
    pub fn new(precision : f64, recall : f64, alpha : f64) -> Self {
        BCubed { precision, recall, alpha }
    }

    pub fn precision(&self) -> f64 { self.precision }

    pub fn recall(&self) -> f64 { self.recall }

    pub fn alpha(&self) -> f64 { self.alpha }

    /// The weighted harmonic mean of precision and recall.
    pub fn similarity(&self) -> f64 {
        let denominator = self.alpha * self.recall + (1.0 - self.alpha) * self.precision;
        if denominator <= 0.0 { 0.0 }
        else { self.precision * self.recall / denominator }
    }

    /// Compare a clustering against a reference segmentation of the same samples.
    ///
    ///   - `solution` - The assignment whose quality is to be assessed.
    ///   - `reference` - The assignment taken as truth.
    ///   - `alpha` - Weight between zero and one used to combine precision and recall.
    ///   - returns - `AssignmentMismatch` if the two assignments cover different numbers of samples.
    pub fn compare(solution : &Assignment, reference : &Assignment, alpha : f64) -> Result<Self> {
        if solution.len() != reference.len() {
            return Err(Error::AssignmentMismatch { left : solution.len(), right : reference.len() });
        }
        Ok(BCubed::new(
            Self::compute_precision(solution, reference),
            Self::compute_precision(reference, solution),
            alpha))
    }

    /// Recall is precision with the two assignments swapped.
    fn compute_precision(solution : &Assignment, reference : &Assignment) -> f64 {
        if solution.is_empty() {
            return 1.0;
        }
        let mut weighted_sum = 0_f64;
        for members in solution.members().values() {
            let sum_of_squares = Self::tally_squares(members.iter().map(|m| reference.label(*m))) as f64;
            weighted_sum += sum_of_squares / members.len() as f64;
        }
        weighted_sum / solution.len() as f64
    }

    /// Count how many times each label appears and sum the squares of the counts.
    ///
    /// Equivalent to counting every ordered pair of members (self-pairs included) that share a label,
    /// in a single pass instead of a doubly-nested loop.
    fn tally_squares<I : Iterator<Item = usize>>(labels : I) -> u64 {
        let mut sum_of_squares = 0_u64;
        let mut tallies : HashMap<usize, u64> = HashMap::new();
        for label in labels {
            match tallies.entry(label) {
                Entry::Occupied(mut entry) => {
                    let current_tally = *entry.get();
                    sum_of_squares += 2 * current_tally + 1;
                    *entry.get_mut() = current_tally + 1;
                },
                Entry::Vacant(entry) => {
                    sum_of_squares += 1;
                    entry.insert(1);
                }
            }
        }
        sum_of_squares
    }
}
