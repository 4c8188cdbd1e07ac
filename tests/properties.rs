use proptest::prelude::*;
use segmentree::metrics::silhouette_score;
use segmentree::preprocessing::Pca;
use segmentree::{compute_linkage, extract_flat_clusters, Assignment, FeatureMatrix, LinkageMethod, LinkageStructure};

fn method_strategy() -> impl Strategy<Value = LinkageMethod> {
    prop::sample::select(LinkageMethod::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_extract_labels_every_sample(
        rows in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 2..25),
        k in 2usize..8,
        method in method_strategy()
    ) {
        if k <= rows.len() {
            let matrix = FeatureMatrix::from_rows(&rows);
            let linkage = compute_linkage(&matrix, method).unwrap();
            let assignment = extract_flat_clusters(&linkage, k).unwrap();

            prop_assert_eq!(assignment.len(), rows.len());
            prop_assert_eq!(assignment.cluster_count(), k);
            prop_assert_eq!(assignment.label(0), 0);
            for &label in assignment.labels() {
                prop_assert!(label < k);
            }
        }
    }

    #[test]
    fn prop_linkage_is_a_valid_tree(
        rows in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 3), 1..20),
        method in method_strategy()
    ) {
        let linkage = compute_linkage(&FeatureMatrix::from_rows(&rows), method).unwrap();
        prop_assert_eq!(linkage.len(), rows.len() - 1);
        prop_assert!(LinkageStructure::from_merges(rows.len(), method, linkage.merges().to_vec()).is_ok());
        if let Some(root) = linkage.merges().last() {
            prop_assert_eq!(root.size, rows.len());
        }
    }

    #[test]
    fn prop_silhouette_bounded(
        rows in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 2..20),
        labels in prop::collection::vec(0usize..4, 20)
    ) {
        let matrix = FeatureMatrix::from_rows(&rows);
        let assignment = Assignment::from_labels(labels[..rows.len()].to_vec());
        let distinct = assignment.cluster_count();
        match silhouette_score(&matrix, &assignment) {
            None => prop_assert!(distinct < 2 || distinct == rows.len()),
            Some(score) => {
                prop_assert!(distinct >= 2 && distinct < rows.len());
                prop_assert!((-1.0..=1.0).contains(&score));
            }
        }
    }

    #[test]
    fn prop_pca_never_exceeds_shape(
        rows in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 4), 1..8),
        requested in 1usize..10
    ) {
        let pca = Pca::fit(&FeatureMatrix::from_rows(&rows), requested).unwrap();
        prop_assert!(pca.n_components() <= requested.min(4).min(rows.len()));
        prop_assert!(pca.variance_retained() <= 1.0 + 1e-9);
    }
}
