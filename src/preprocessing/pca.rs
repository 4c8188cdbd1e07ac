use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};

use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

/// Principal component analysis by eigen-decomposition of the sample covariance matrix.
///
/// Explained variance of a component is its covariance eigenvalue (divisor `n - 1`),
/// and its ratio divides that by the total variance (the covariance trace).
/// Each component's sign is fixed so that its largest-magnitude loading is positive,
/// which makes the projection reproducible for identical input.
#[derive(Clone, Debug, PartialEq)]
pub struct Pca {
    mean : Vec<f64>,
    /// One row per component, one column per input feature.
    components : Vec<Vec<f64>>,
    explained_variance : Vec<f64>,
    total_variance : f64
}

impl Pca {
    /// Fit `n_components` components to the matrix.
    ///
    ///   - `n_components` - Clamped to `min(n_components, n_features, n_samples)`.
    ///   - returns - `InvalidComponentCount` if `n_components` is zero, `EmptyDataset` if the matrix has no rows.
    pub fn fit(matrix : &FeatureMatrix, n_components : usize) -> Result<Self> {
        let (n_samples, n_features) = matrix.shape();
        if n_components == 0 {
            return Err(Error::InvalidComponentCount(n_components));
        }
        if n_samples == 0 {
            return Err(Error::EmptyDataset);
        }
        let n_components = n_components.min(n_features).min(n_samples);
        if n_components == 0 {
            return Err(Error::InvalidComponentCount(n_components));
        }

        let mean : Vec<f64> = (0..n_features)
            .map(|j| matrix.rows().map(|row| row[j]).sum::<f64>() / n_samples as f64)
            .collect();

        let divisor = n_samples.saturating_sub(1).max(1) as f64;
        let mut covariance = vec![0.0; n_features * n_features];
        for row in matrix.rows() {
            for a in 0..n_features {
                let da = row[a] - mean[a];
                for b in a..n_features {
                    covariance[a * n_features + b] += da * (row[b] - mean[b]);
                }
            }
        }
        for a in 0..n_features {
            for b in a..n_features {
                let value = covariance[a * n_features + b] / divisor;
                covariance[a * n_features + b] = value;
                covariance[b * n_features + a] = value;
            }
        }
        let total_variance : f64 = (0..n_features).map(|j| covariance[j * n_features + j]).sum();

        let eigen = SymmetricEigen::new(DMatrix::from_row_slice(n_features, n_features, &covariance));

        // Descending eigenvalue, ties by position so the order is stable.
        let mut order : Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b].partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut components = Vec::with_capacity(n_components);
        let mut explained_variance = Vec::with_capacity(n_components);
        for &index in order.iter().take(n_components) {
            let mut component : Vec<f64> = eigen.eigenvectors.column(index).iter().copied().collect();
            let dominant = component.iter()
                .copied()
                .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
            if dominant < 0.0 {
                component.iter_mut().for_each(|x| *x = -*x);
            }
            components.push(component);
            explained_variance.push(eigen.eigenvalues[index].max(0.0));
        }

        Ok(Pca { mean, components, explained_variance, total_variance })
    }

    /// Number of components kept.
    pub fn n_components(&self) -> usize { self.components.len() }

    pub fn components(&self) -> &[Vec<f64>] { &self.components }

    pub fn explained_variance(&self) -> &[f64] { &self.explained_variance }

    /// Fraction of the total variance captured by each kept component.
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        if self.total_variance <= 0.0 {
            return vec![0.0; self.explained_variance.len()];
        }
        self.explained_variance.iter().map(|v| v / self.total_variance).collect()
    }

    /// Fraction of the total variance captured by all kept components together.
    ///
    /// Data with no variance at all loses nothing, so it reports `1.0`.
    pub fn variance_retained(&self) -> f64 {
        if self.total_variance <= 0.0 { 1.0 }
        else { self.explained_variance_ratio().iter().sum::<f64>().min(1.0) }
    }

    /// Project the rows onto the kept components.
    ///
    ///   - panics - If the matrix has a different number of features than the one fitted.
    pub fn transform(&self, matrix : &FeatureMatrix) -> FeatureMatrix {
        assert_eq!(matrix.n_cols(), self.mean.len(), "PCA fitted on a different number of features");
        let rows : Vec<Vec<f64>> = matrix.rows().map(|row| {
            self.components.iter().map(|component| {
                component.iter().zip(row.iter()).zip(self.mean.iter())
                    .map(|((c, x), m)| c * (x - m))
                    .sum()
            }).collect()
        }).collect();
        FeatureMatrix::from_vec(
            matrix.n_rows(),
            self.components.len(),
            rows.into_iter().flatten().collect()
        )
    }
}

/// Reduce the matrix to at most `requested` principal components.
///
///   - returns - The projected matrix and the fraction of total variance it retains.
pub fn apply_dimensionality_reduction(matrix : &FeatureMatrix, requested : usize) -> Result<(FeatureMatrix, f64)> {
    let pca = Pca::fit(matrix, requested)?;
    let reduced = pca.transform(matrix);
    let retained = pca.variance_retained();
    debug!("PCA kept {} of {} features, retaining {:.4} of the variance", pca.n_components(), matrix.n_cols(), retained);
    Ok((reduced, retained))
}
