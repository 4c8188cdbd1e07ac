//! Agglomerative hierarchical clustering and flat cluster extraction.
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::Serialize;

use crate::error::{Error, Result};

pub mod extract;
pub mod linkage;

pub use self::extract::{extract_flat_clusters, Assignment};
pub use self::linkage::compute_linkage;

// ........................... LinkageMethod ..........................................

/// Rule for measuring the distance between two clusters during agglomeration.
///
/// All methods use the Euclidean distance between samples as their base metric.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkageMethod {
    /// Merge the pair whose union least increases the total within-cluster variance.
    Ward,
    /// Maximum pairwise distance between members.
    Complete,
    /// Mean pairwise distance between members.
    Average,
    /// Minimum pairwise distance between members. Prone to chaining.
    Single
}

impl LinkageMethod {
    /// All methods, in the order they are usually offered.
    pub const ALL : [LinkageMethod; 4] = [LinkageMethod::Ward, LinkageMethod::Complete, LinkageMethod::Average, LinkageMethod::Single];

    pub fn name(&self) -> &'static str {
        match self {
            LinkageMethod::Ward => "ward",
            LinkageMethod::Complete => "complete",
            LinkageMethod::Average => "average",
            LinkageMethod::Single => "single"
        }
    }

    /// Lance-Williams update: distance from cluster `k` to the union of clusters `a` and `b`.
    ///
    ///   - `d_ka`, `d_kb`, `d_ab` - Current distances between the three clusters.
    ///   - `n_a`, `n_b`, `n_k` - Cluster sizes.
    pub fn updated_distance(&self, d_ka : f64, d_kb : f64, d_ab : f64, n_a : usize, n_b : usize, n_k : usize) -> f64 {
        match self {
            LinkageMethod::Single => d_ka.min(d_kb),
            LinkageMethod::Complete => d_ka.max(d_kb),
            LinkageMethod::Average => {
                let (n_a, n_b) = (n_a as f64, n_b as f64);
                (n_a * d_ka + n_b * d_kb) / (n_a + n_b)
            },
            LinkageMethod::Ward => {
                let (n_a, n_b, n_k) = (n_a as f64, n_b as f64, n_k as f64);
                let numerator = (n_a + n_k) * d_ka * d_ka + (n_b + n_k) * d_kb * d_kb - n_k * d_ab * d_ab;
                (numerator.max(0.0) / (n_a + n_b + n_k)).sqrt()
            }
        }
    }
}

impl Default for LinkageMethod {
    fn default() -> Self { LinkageMethod::Ward }
}

impl Display for LinkageMethod {
    fn fmt(&self, f : &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LinkageMethod {
    type Err = Error;

    /// Parse a method name, ignoring case and surrounding whitespace.
    fn from_str(s : &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        LinkageMethod::ALL.iter()
            .find(|m| m.name() == lowered)
            .copied()
            .ok_or_else(|| Error::UnknownLinkage(s.to_string()))
    }
}

// ........................... Merge & LinkageStructure ..........................................

/// One agglomeration step.
///
/// Leaves are identified by their sample index `0..n`; the cluster formed by the `i`-th merge is `n + i`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Merge {
    /// Lower of the two merged cluster ids.
    pub left : usize,
    /// Higher of the two merged cluster ids.
    pub right : usize,
    /// Linkage distance between the two clusters when they were merged.
    pub distance : f64,
    /// Number of samples in the resulting cluster.
    pub size : usize
}

/// The complete merge tree: `n - 1` merges over `n` samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkageStructure {
    n_samples : usize,
    method : LinkageMethod,
    merges : Vec<Merge>
}

impl LinkageStructure {
    /// Assemble a linkage structure from merge records, checking that they form a strict binary tree.
    ///
    ///   - returns - `MalformedLinkage` if there are not `n - 1` merges, an id refers to a cluster that
    ///     does not exist yet, a cluster is merged twice, or a recorded size is wrong.
    pub fn from_merges(n_samples : usize, method : LinkageMethod, merges : Vec<Merge>) -> Result<Self> {
        if n_samples == 0 {
            return Err(Error::EmptyDataset);
        }
        if merges.len() != n_samples - 1 {
            return Err(Error::MalformedLinkage(format!("{} merges for {} samples", merges.len(), n_samples)));
        }
        let mut sizes = vec![1_usize; n_samples];
        let mut consumed = vec![false; 2 * n_samples - 1];
        for (i, merge) in merges.iter().enumerate() {
            let next_id = n_samples + i;
            if merge.left >= merge.right || merge.right >= next_id {
                return Err(Error::MalformedLinkage(format!("merge {} joins {} and {}", i, merge.left, merge.right)));
            }
            for id in [merge.left, merge.right].iter() {
                if consumed[*id] {
                    return Err(Error::MalformedLinkage(format!("cluster {} merged twice", id)));
                }
                consumed[*id] = true;
            }
            let size = sizes[merge.left] + sizes[merge.right];
            if size != merge.size {
                return Err(Error::MalformedLinkage(format!("merge {} has size {}, expected {}", i, merge.size, size)));
            }
            sizes.push(size);
        }
        Ok(LinkageStructure { n_samples, method, merges })
    }

    /// Number of leaves.
    pub fn n_samples(&self) -> usize { self.n_samples }

    pub fn method(&self) -> LinkageMethod { self.method }

    pub fn merges(&self) -> &[Merge] { &self.merges }

    /// Number of merges, always `n_samples - 1`.
    pub fn len(&self) -> usize { self.merges.len() }

    pub fn is_empty(&self) -> bool { self.merges.is_empty() }

    /// Id of the cluster created by the given merge.
    pub fn cluster_id(&self, merge_index : usize) -> usize { self.n_samples + merge_index }

    /// Largest merge distance, or zero when there are no merges.
    pub fn max_distance(&self) -> f64 {
        self.merges.iter().map(|m| m.distance).fold(0.0, f64::max)
    }

    /// Are the merge distances non-decreasing?
    pub fn is_monotonic(&self) -> bool {
        self.merges.windows(2).all(|pair| pair[0].distance <= pair[1].distance)
    }

    /// Number of distinct merge distances.
    pub fn distinct_levels(&self) -> usize {
        let mut distances : Vec<f64> = self.merges.iter().map(|m| m.distance).collect();
        distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        distances.dedup();
        distances.len()
    }
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use spectral::prelude::*;
    use super::*;

    #[test]
    fn parse_method_names() {
        asserting("Upper case").that(&"WARD".parse::<LinkageMethod>().unwrap()).is_equal_to(LinkageMethod::Ward);
        asserting("Padded").that(&" single ".parse::<LinkageMethod>().unwrap()).is_equal_to(LinkageMethod::Single);
        let unknown = "centroid".parse::<LinkageMethod>();
        asserting("Unknown").that(&matches!(unknown, Err(Error::UnknownLinkage(_)))).is_equal_to(true);
    }

    #[test]
    fn ward_update_matches_centroid_criterion() {
        // Singletons a and b lie 2 apart; k is 5 from a and 3 from b.
        let d = LinkageMethod::Ward.updated_distance(5.0, 3.0, 2.0, 1, 1, 1);
        let expected = ((2.0 * 25.0 + 2.0 * 9.0 - 4.0) / 3.0_f64).sqrt();
        asserting("Ward distance").that(&d).is_equal_to(expected);
    }

    #[test]
    fn well_formed_tree_is_accepted() {
        let merges = vec![
            Merge { left : 0, right : 1, distance : 1.0, size : 2 },
            Merge { left : 2, right : 3, distance : 2.0, size : 3 }
        ];
        let linkage = LinkageStructure::from_merges(3, LinkageMethod::Single, merges).unwrap();
        asserting("Max distance").that(&linkage.max_distance()).is_equal_to(2.0);
        asserting("Monotonic").that(&linkage.is_monotonic()).is_equal_to(true);
    }

    #[test]
    fn reused_cluster_is_rejected() {
        let merges = vec![
            Merge { left : 0, right : 1, distance : 1.0, size : 2 },
            Merge { left : 0, right : 2, distance : 2.0, size : 2 }
        ];
        let result = LinkageStructure::from_merges(3, LinkageMethod::Single, merges);
        asserting("Malformed").that(&matches!(result, Err(Error::MalformedLinkage(_)))).is_equal_to(true);
    }
}
