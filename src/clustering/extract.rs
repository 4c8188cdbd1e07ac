use std::collections::{BTreeMap, HashMap};
use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};
use super::LinkageStructure;

// ........................... Assignment ..........................................

/// Zero-based cluster label for every sample, indexed by sample.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Assignment {
    labels : Vec<usize>
}

impl Assignment {
    /// Wrap labels that were produced elsewhere (for example, loaded from a previous run).
    pub fn from_labels(labels : Vec<usize>) -> Self {
        Assignment { labels }
    }

    pub fn labels(&self) -> &[usize] { &self.labels }

    pub fn into_labels(self) -> Vec<usize> { self.labels }

    /// Label of one sample.
    pub fn label(&self, sample : usize) -> usize { self.labels[sample] }

    /// Number of samples.
    pub fn len(&self) -> usize { self.labels.len() }

    pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    /// Number of distinct labels.
    pub fn cluster_count(&self) -> usize { self.sizes().len() }

    /// Sample count per label, ordered by label.
    pub fn sizes(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for label in self.labels.iter() {
            *sizes.entry(*label).or_insert(0) += 1;
        }
        sizes
    }

    /// Samples grouped by label, each group in ascending sample order.
    pub fn members(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut members : BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (sample, label) in self.labels.iter().enumerate() {
            members.entry(*label).or_insert_with(Vec::new).push(sample);
        }
        members
    }
}

// ........................... Forest ..........................................

/// Disjoint-set forest over sample indices, with path halving and union by size.
struct Forest {
    parent : Vec<usize>,
    size : Vec<usize>
}

impl Forest {
    fn new(n : usize) -> Self {
        Forest { parent : (0..n).collect(), size : vec![1; n] }
    }

    fn find(&mut self, mut item : usize) -> usize {
        while self.parent[item] != item {
            self.parent[item] = self.parent[self.parent[item]];
            item = self.parent[item];
        }
        item
    }

    fn union(&mut self, a : usize, b : usize) {
        let (mut root_a, mut root_b) = (self.find(a), self.find(b));
        if root_a == root_b { return; }
        if self.size[root_a] < self.size[root_b] {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b] = root_a;
        self.size[root_a] += self.size[root_b];
    }
}

/// Cut the merge tree into exactly `k` flat clusters.
///
/// Replays all but the last `k - 1` merges; the connected components that remain are the clusters.
/// Labels are handed out in order of each component's lowest sample index, so the component holding
/// sample zero is always label zero and ties between otherwise identical runs label the same way.
///
///   - returns - `InvalidClusterCount` if `k` is not in `[2, n_samples]`.
pub fn extract_flat_clusters(linkage : &LinkageStructure, k : usize) -> Result<Assignment> {
    let n = linkage.n_samples();
    if k < 2 || k > n {
        return Err(Error::InvalidClusterCount { requested : k, n_samples : n });
    }

    let mut forest = Forest::new(n);
    // A leaf standing in for each merged cluster id >= n.
    let mut representative : Vec<usize> = Vec::with_capacity(n - k);
    let leaf_of = |id : usize, representative : &Vec<usize>| if id < n { id } else { representative[id - n] };
    for merge in linkage.merges().iter().take(n - k) {
        let left = leaf_of(merge.left, &representative);
        let right = leaf_of(merge.right, &representative);
        forest.union(left, right);
        representative.push(left);
    }

    let mut label_of_root : HashMap<usize, usize> = HashMap::new();
    let mut labels = Vec::with_capacity(n);
    for sample in 0..n {
        let root = forest.find(sample);
        let next_label = label_of_root.len();
        labels.push(*label_of_root.entry(root).or_insert(next_label));
    }
    debug!("Cut {} samples into {} clusters", n, label_of_root.len());
    Ok(Assignment { labels })
}
