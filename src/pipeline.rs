//! One clustering run end to end: typing, preprocessing, optional PCA, linkage, cut and metrics.
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use crate::clustering::{compute_linkage, extract_flat_clusters, Assignment, LinkageStructure};
use crate::config::ClusteringRequest;
use crate::dataset::{Dataset, LabeledRow};
use crate::error::{Error, Result};
use crate::features::detect_feature_types;
use crate::metrics::{compile_metrics, BCubed, MetricsSummary};
use crate::preprocessing::{apply_dimensionality_reduction, Preprocessor};

/// How the original columns became the matrix that was clustered.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureConfig {
    pub numeric_features : Vec<String>,
    pub categorical_features : Vec<String>,
    pub total_original_features : usize,
    /// Width of the matrix that was clustered, after any reduction.
    pub encoded_features : usize,
    /// Names of the encoded features before any reduction.
    pub encoded_feature_names : Vec<String>,
    pub pca_applied : bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pca_components : Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pca_explained_variance : Option<f64>
}

/// How closely a candidate run agrees with a reference run over the same dataset, by B-Cubed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunComparison {
    pub reference : ClusteringRequest,
    pub candidate : ClusteringRequest,
    pub precision : f64,
    pub recall : f64,
    /// Precision and recall weighted equally.
    pub f_measure : f64
}

/// Everything a successful run produces. Never partially filled: any failing stage fails the whole run.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteringRun {
    pub request : ClusteringRequest,
    pub feature_config : FeatureConfig,
    pub linkage : LinkageStructure,
    pub assignment : Assignment,
    pub metrics : MetricsSummary
}

impl ClusteringRun {
    /// Each dataset row with its cluster label and raw values.
    ///
    ///   - `dataset` - The dataset the run was computed from.
    pub fn labeled_rows(&self, dataset : &Dataset) -> Vec<LabeledRow> {
        LabeledRow::from_labels(dataset, self.assignment.labels())
    }

    /// B-Cubed agreement of `candidate` with this run, taken as the reference.
    ///
    ///   - returns - `AssignmentMismatch` if the runs labeled different numbers of samples.
    pub fn compare_with(&self, candidate : &ClusteringRun) -> Result<RunComparison> {
        let measure = BCubed::compare(&candidate.assignment, &self.assignment, 0.5)?;
        debug!("{} run agrees with {} run: F = {:.3}", candidate.request.linkage, self.request.linkage, measure.similarity());
        Ok(RunComparison {
            reference : self.request.clone(),
            candidate : candidate.request.clone(),
            precision : measure.precision(),
            recall : measure.recall(),
            f_measure : measure.similarity()
        })
    }

    /// Full report of the run as a plain nested mapping.
    pub fn to_json(&self, dataset : &Dataset) -> Result<serde_json::Value> {
        Ok(json!({
            "request" : serde_json::to_value(&self.request)?,
            "feature_config" : serde_json::to_value(&self.feature_config)?,
            "metrics" : self.metrics.to_json(),
            "assignments" : serde_json::to_value(self.labeled_rows(dataset))?
        }))
    }
}

/// Run the whole segmentation pipeline on a dataset.
///
///   1. Validate the request.
///   2. Partition columns into numeric and categorical features.
///   3. Standardize and one-hot encode them.
///   4. If PCA is requested and the component count is below the number of encoded features, reduce.
///   5. Build the merge tree with the requested linkage and cut it into `n_clusters` clusters.
///   6. Compile metrics.
///
///   - returns - `InvalidRequest`, `EmptyDataset`, `NoFeaturesFound`, `NoValidFeatures`, `MissingValue`,
///     `NonFiniteValue` or `InvalidClusterCount` (fewer samples than clusters) from the failing stage.
pub fn run_clustering(dataset : &Dataset, request : &ClusteringRequest) -> Result<ClusteringRun> {
    request.validate()?;
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let n_samples = dataset.n_rows();
    if n_samples < request.n_clusters {
        return Err(Error::InvalidClusterCount { requested : request.n_clusters, n_samples });
    }

    let schema = detect_feature_types(dataset)?;
    info!("Features: {} numeric {:?}, {} categorical {:?}", schema.numeric.len(), schema.numeric, schema.categorical.len(), schema.categorical);

    let fitted = Preprocessor::build(&schema.numeric, &schema.categorical)?.fit(dataset)?;
    let mut matrix = fitted.transform(dataset)?;
    let encoded_feature_names = fitted.feature_names();
    debug!("Encoded features: {:?}", encoded_feature_names);

    let mut pca_explained_variance = None;
    let mut pca_components = None;
    if let Some(requested) = request.reduction_target() {
        if requested < matrix.n_cols() {
            let (reduced, retained) = apply_dimensionality_reduction(&matrix, requested)?;
            info!("PCA reduced {} features to {} components ({:.1}% variance)", matrix.n_cols(), reduced.n_cols(), retained * 100.0);
            pca_components = Some(reduced.n_cols());
            pca_explained_variance = Some(retained);
            matrix = reduced;
        }
        else {
            info!("Skipping PCA: {} components requested for {} encoded features", requested, matrix.n_cols());
        }
    }

    let linkage = compute_linkage(&matrix, request.linkage)?;
    let assignment = extract_flat_clusters(&linkage, request.n_clusters)?;
    let metrics = compile_metrics(&matrix, &assignment);
    info!(
        "Clustered {} samples into {} clusters with {} linkage, silhouette {:?}",
        metrics.n_samples, metrics.n_clusters, request.linkage, metrics.silhouette_score
    );

    let feature_config = FeatureConfig {
        total_original_features : schema.len(),
        numeric_features : schema.numeric,
        categorical_features : schema.categorical,
        encoded_features : matrix.n_cols(),
        encoded_feature_names,
        pca_applied : pca_components.is_some(),
        pca_components,
        pca_explained_variance
    };
    Ok(ClusteringRun { request : request.clone(), feature_config, linkage, assignment, metrics })
}
