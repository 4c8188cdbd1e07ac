//! # Segmentree
//!
//! Customer segmentation by agglomerative hierarchical clustering.
//!
//! Given a tabular dataset, the pipeline
//!
//!   1. classifies columns as numeric or categorical ([`features`]),
//!   2. standardizes numeric columns and one-hot encodes categorical ones, optionally reducing
//!      the result with principal component analysis ([`preprocessing`]),
//!   3. builds a merge tree with `ward`, `complete`, `average` or `single` linkage and cuts it
//!      into a fixed number of flat clusters ([`clustering`]),
//!   4. reports sample counts, cluster sizes and the silhouette score ([`metrics`]),
//!   5. renders a dendrogram, a scatter plot and a size distribution chart as PNG images ([`visualize`]).
//!
//! [`pipeline::run_clustering`] chains steps 1 to 4. Every function is pure over its inputs,
//! so independent runs may proceed concurrently without coordination.
//!
//! ```no_run
//! use segmentree::{run_clustering, ClusteringRequest, Dataset, LinkageMethod};
//!
//! let dataset = Dataset::from_path("customers.csv")?;
//! let run = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 4))?;
//! println!("silhouette: {:?}", run.metrics.silhouette_score);
//! # Ok::<(), segmentree::Error>(())
//! ```

pub mod clustering;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod matrix;
pub mod metrics;
pub mod pipeline;
pub mod preprocessing;
pub mod visualize;

#[cfg(test)]
pub(crate) mod test_data;

pub use crate::clustering::{compute_linkage, extract_flat_clusters, Assignment, LinkageMethod, LinkageStructure, Merge};
pub use crate::config::{ClusteringRequest, OutputSettings};
pub use crate::dataset::{Column, ColumnType, Dataset, LabeledRow, Value};
pub use crate::error::{Error, Result};
pub use crate::features::{detect_feature_types, FeatureSchema};
pub use crate::matrix::FeatureMatrix;
pub use crate::metrics::{compile_metrics, BCubed, MetricsSummary};
pub use crate::pipeline::{run_clustering, ClusteringRun, FeatureConfig, RunComparison};
pub use crate::preprocessing::{apply_dimensionality_reduction, build_and_apply_preprocessing};
pub use crate::visualize::{render_dendrogram, render_distribution, render_scatter, DendrogramContext};
