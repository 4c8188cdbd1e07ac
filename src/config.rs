//! Request bounds, rendering constants and artifact naming.
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::clustering::LinkageMethod;
use crate::error::{Error, Result};

/// Fewest clusters a request may ask for.
pub const MIN_CLUSTERS : usize = 2;

/// Most clusters a request may ask for.
pub const MAX_CLUSTERS : usize = 15;

pub const DEFAULT_CLUSTERS : usize = 3;

/// Fewest principal components a request may ask for.
pub const MIN_PCA_COMPONENTS : usize = 2;

/// Dendrograms over more samples than this are truncated to their last this-many clusters.
pub const DENDROGRAM_DISPLAY_CAP : usize = 50;

/// Dendrogram subtrees below this fraction of the largest merge distance are colored.
pub const COLOR_THRESHOLD_RATIO : f64 = 0.7;

// ........................... ClusteringRequest ..........................................

/// What the caller wants from one clustering run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusteringRequest {
    pub linkage : LinkageMethod,
    pub n_clusters : usize,
    /// Reduce the encoded features with PCA before clustering.
    pub use_pca : bool,
    /// Target component count when `use_pca` is set. Without one, PCA is skipped.
    pub pca_components : Option<usize>
}

impl Default for ClusteringRequest {
    fn default() -> Self {
        ClusteringRequest {
            linkage : LinkageMethod::default(),
            n_clusters : DEFAULT_CLUSTERS,
            use_pca : false,
            pca_components : None
        }
    }
}

impl ClusteringRequest {
    pub fn new(linkage : LinkageMethod, n_clusters : usize) -> Self {
        ClusteringRequest { linkage, n_clusters, ..Default::default() }
    }

    /// Ask for PCA down to the given number of components.
    pub fn with_pca(mut self, components : usize) -> Self {
        self.use_pca = true;
        self.pca_components = Some(components);
        self
    }

    /// Check the request bounds.
    ///
    ///   - returns - `InvalidRequest` if `n_clusters` is outside `[2, 15]`, or a component count below two is given.
    ///     `use_pca` without a component count is valid and runs without reduction.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters < MIN_CLUSTERS || self.n_clusters > MAX_CLUSTERS {
            return Err(Error::InvalidRequest(format!(
                "n_clusters must be between {} and {}, got {}", MIN_CLUSTERS, MAX_CLUSTERS, self.n_clusters)));
        }
        match self.pca_components {
            Some(components) if components < MIN_PCA_COMPONENTS => Err(Error::InvalidRequest(format!(
                "pca_components must be at least {}, got {}", MIN_PCA_COMPONENTS, components))),
            _ => Ok(())
        }
    }

    /// Component count to reduce to, when reduction was asked for with a count.
    pub fn reduction_target(&self) -> Option<usize> {
        if self.use_pca { self.pca_components } else { None }
    }
}

// ........................... OutputSettings ..........................................

/// Where the artifacts of a run are written, and under which names.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSettings {
    pub output_dir : PathBuf
}

impl OutputSettings {
    pub fn new<P : Into<PathBuf>>(output_dir : P) -> Self {
        OutputSettings { output_dir : output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path { &self.output_dir }

    /// The run report: request, feature configuration, metrics and labeled rows.
    pub fn report_path(&self, run_id : &str) -> PathBuf {
        self.output_dir.join(format!("run_{}.json", run_id))
    }

    pub fn dendrogram_path(&self, run_id : &str) -> PathBuf {
        self.output_dir.join(format!("dendrogram_run_{}.png", run_id))
    }

    pub fn scatter_path(&self, run_id : &str) -> PathBuf {
        self.output_dir.join(format!("scatter_plot_run_{}.png", run_id))
    }

    pub fn distribution_path(&self, run_id : &str) -> PathBuf {
        self.output_dir.join(format!("distribution_run_{}.png", run_id))
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings::new("output")
    }
}
