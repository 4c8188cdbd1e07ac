//! Integration Tests
mod data;

#[allow(unused_imports)]
use spectral::prelude::*;
use segmentree::preprocessing::Preprocessor;
use segmentree::{
    build_and_apply_preprocessing, compute_linkage, detect_feature_types, extract_flat_clusters,
    render_dendrogram, render_distribution, render_scatter, run_clustering,
    BCubed, ClusteringRequest, Column, Dataset, DendrogramContext, Error, FeatureMatrix, LinkageMethod
};
use crate::data::{customers, two_blobs};

const PNG_SIGNATURE : [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn is_png(bytes : &[u8]) -> bool {
    bytes.len() > 8 && bytes[..8] == PNG_SIGNATURE
}

/// Ten points in two far apart blobs split five and five, with a near perfect silhouette.
#[test]
fn two_blobs_ward() {
    let run = run_clustering(&two_blobs(), &ClusteringRequest::new(LinkageMethod::Ward, 2)).unwrap();
    let sizes : Vec<(usize, usize)> = run.metrics.cluster_sizes.clone().into_iter().collect();
    asserting("Five and five").that(&sizes).is_equal_to(vec![(0, 5), (1, 5)]);
    let silhouette = run.metrics.silhouette_score.unwrap_or(0.0);
    asserting(&format!("Silhouette {} > 0.9", silhouette)).that(&(silhouette > 0.9)).is_equal_to(true);
    asserting("Identifier excluded").that(&run.feature_config.numeric_features).is_equal_to(vec!["x".to_string(), "y".to_string()]);
}

/// Six identical vectors still cut into three non-empty clusters.
#[test]
fn identical_vectors_single_linkage() {
    let matrix = FeatureMatrix::from_rows(&vec![vec![4.0, 2.0, 7.0]; 6]);
    let linkage = compute_linkage(&matrix, LinkageMethod::Single).unwrap();
    let assignment = extract_flat_clusters(&linkage, 3).unwrap();
    asserting("Six labels").that(&assignment.len()).is_equal_to(6);
    asserting("Three clusters").that(&assignment.cluster_count()).is_equal_to(3);
    asserting("Label zero holds sample zero").that(&assignment.label(0)).is_equal_to(0);
}

/// Only an identifier and one constant categorical column: a single all-ones column, not a crash.
#[test]
fn identifier_and_constant_category() {
    let dataset = Dataset::new(vec![
        Column::numeric("id", &[1.0, 2.0, 3.0, 4.0]),
        Column::text("plan", &["basic", "basic", "basic", "basic"])
    ]).unwrap();
    let schema = detect_feature_types(&dataset).unwrap();
    asserting("Only the category survives").that(&schema.categorical).is_equal_to(vec!["plan".to_string()]);
    let matrix = build_and_apply_preprocessing(&dataset, &schema.numeric, &schema.categorical).unwrap();
    asserting("One column").that(&matrix.n_cols()).is_equal_to(1);
    asserting("All ones").that(&matrix.column(0)).is_equal_to(vec![1.0; 4]);
}

#[test]
fn one_sample_two_clusters() {
    let matrix = FeatureMatrix::from_rows(&[vec![1.0, 1.0]]);
    let linkage = compute_linkage(&matrix, LinkageMethod::Ward).unwrap();
    let result = extract_flat_clusters(&linkage, 2);
    asserting("Invalid cluster count").that(&matches!(result, Err(Error::InvalidClusterCount { requested : 2, n_samples : 1 }))).is_equal_to(true);

    let dataset = Dataset::new(vec![Column::numeric("spend", &[10.0])]).unwrap();
    let result = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 2));
    asserting("Pipeline agrees").that(&matches!(result, Err(Error::InvalidClusterCount { .. }))).is_equal_to(true);
}

#[test]
fn unseen_category_encodes_as_zeros() {
    let fitted_on = Dataset::new(vec![Column::text("region", &["north", "south"])]).unwrap();
    let applied_to = Dataset::new(vec![Column::text("region", &["south", "mars"])]).unwrap();
    let fitted = Preprocessor::build(&[], &["region".to_string()]).unwrap().fit(&fitted_on).unwrap();
    let matrix = fitted.transform(&applied_to).unwrap();
    asserting("Known category").that(&matrix.row(0).to_vec()).is_equal_to(vec![0.0, 1.0]);
    asserting("Unknown category").that(&matrix.row(1).to_vec()).is_equal_to(vec![0.0, 0.0]);
}

#[test]
fn standardizing_twice_changes_nothing() {
    let dataset = customers();
    let schema = detect_feature_types(&dataset).unwrap();
    let once = build_and_apply_preprocessing(&dataset, &schema.numeric, &[]).unwrap();
    let restandardized = Dataset::new(
        schema.numeric.iter().enumerate().map(|(j, name)| Column::numeric(name.as_str(), &once.column(j))).collect()
    ).unwrap();
    let twice = build_and_apply_preprocessing(&restandardized, &schema.numeric, &[]).unwrap();
    let largest_change = (0..once.n_rows())
        .flat_map(|i| (0..once.n_cols()).map(move |j| (i, j)))
        .map(|(i, j)| (once.get(i, j) - twice.get(i, j)).abs())
        .fold(0.0, f64::max);
    asserting(&format!("Largest change {}", largest_change)).that(&(largest_change < 1e-9)).is_equal_to(true);
}

/// Spending near the largest float still clusters instead of overflowing.
#[test]
fn spending_near_float_limit() {
    let dataset = Dataset::from_reader("spend,age\n1e308,1\n1e308,2\n1e308,3\n0,4\n".as_bytes()).unwrap();
    let run = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 2)).unwrap();
    asserting("Outlier alone").that(&run.assignment.labels().to_vec()).is_equal_to(vec![0, 0, 0, 1]);
    let all_finite = run.linkage.merges().iter().all(|m| m.distance.is_finite());
    asserting("Finite merge distances").that(&all_finite).is_equal_to(true);
}

/// Spending beyond the float range is reported, not clustered.
#[test]
fn spending_beyond_float_range() {
    let dataset = Dataset::from_reader("spend,age\n1e400,1\n2,2\n3,3\n".as_bytes()).unwrap();
    let result = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 2));
    asserting("Non finite").that(&matches!(result, Err(Error::NonFiniteValue { row : 0, .. }))).is_equal_to(true);
}

#[test]
fn no_usable_columns() {
    let dataset = Dataset::new(vec![
        Column::numeric("ID", &[1.0, 2.0]),
        Column::new("active", segmentree::ColumnType::Boolean, vec![segmentree::Value::Bool(true), segmentree::Value::Bool(false)])
    ]).unwrap();
    let result = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 2));
    asserting("No features").that(&matches!(result, Err(Error::NoFeaturesFound))).is_equal_to(true);
}

#[test]
fn missing_source_file() {
    let result = Dataset::from_path("no/such/customers.csv");
    asserting("Source not found").that(&matches!(result, Err(Error::SourceNotFound(_)))).is_equal_to(true);
}

/// Every linkage strategy recovers the three customer segments, and labels every row.
#[test]
fn customer_segments_across_linkages() {
    let dataset = customers();
    let expected : Vec<usize> = (0..24).map(|row| row % 3).collect();
    let ward = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 3)).unwrap();
    asserting("Ward segments").that(&ward.assignment.labels().to_vec()).is_equal_to(expected);
    for method in LinkageMethod::ALL.iter() {
        let run = run_clustering(&dataset, &ClusteringRequest::new(*method, 3)).unwrap();
        asserting(&format!("{} labels every row", method)).that(&run.assignment.len()).is_equal_to(24);
        asserting(&format!("{} yields three clusters", method)).that(&run.metrics.n_clusters).is_equal_to(3);
        let silhouette = run.metrics.silhouette_score.unwrap_or(-2.0);
        asserting(&format!("{} silhouette {} in range", method, silhouette)).that(&(-1.0..=1.0).contains(&silhouette)).is_equal_to(true);
    }
}

/// A ward run compared with itself is perfect; compared with a reduced run it stays close.
#[test]
fn compare_runs_with_bcubed() {
    let dataset = customers();
    let ward = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 3)).unwrap();
    let same = BCubed::compare(&ward.assignment, &ward.assignment, 0.5).unwrap();
    asserting("Perfect").that(&same.similarity()).is_equal_to(1.0);

    let reduced = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Ward, 3).with_pca(3)).unwrap();
    let measure = BCubed::compare(&reduced.assignment, &ward.assignment, 0.5).unwrap();
    asserting(&format!("Similarity {}", measure.similarity())).that(&(measure.similarity() > 0.8)).is_equal_to(true);
}

/// All three charts render for a real run.
#[test]
fn charts_for_customer_run() {
    let dataset = customers();
    let run = run_clustering(&dataset, &ClusteringRequest::new(LinkageMethod::Average, 3)).unwrap();

    let dendrogram = render_dendrogram(&run.linkage, &DendrogramContext::default().with_dataset_label("customers")).unwrap();
    asserting("Dendrogram").that(&is_png(&dendrogram)).is_equal_to(true);

    let rows = run.labeled_rows(&dataset);
    let scatter = render_scatter(&rows, "age", "annual_income").unwrap();
    asserting("Scatter").that(&is_png(&scatter)).is_equal_to(true);
    let categorical = render_scatter(&rows, "region", "membership");
    asserting("Text columns cannot be plotted").that(&matches!(categorical, Err(Error::NoPlottableData { .. }))).is_equal_to(true);

    let distribution = render_distribution(&run.metrics.cluster_sizes).unwrap();
    asserting("Distribution").that(&is_png(&distribution)).is_equal_to(true);
}
