use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the segmentation pipeline and its renderers.
///
/// Every error is scoped to the single request that produced it.
/// Render errors never invalidate an already computed clustering run.
#[derive(Debug, Error)]
pub enum Error {
    /// The dataset has no rows.
    #[error("dataset is empty")]
    EmptyDataset,

    /// No numeric or categorical columns remain after identifier columns are excluded.
    #[error("no valid features found in dataset")]
    NoFeaturesFound,

    /// The preprocessor was asked to build without any numeric or categorical columns.
    #[error("no valid features to build a preprocessor from")]
    NoValidFeatures,

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_samples} samples")]
    InvalidClusterCount {
        requested : usize,
        n_samples : usize
    },

    /// Neither of the requested scatter features could be read as a number for any row.
    #[error("no plottable points for features '{x}' and '{y}'")]
    NoPlottableData {
        x : String,
        y : String
    },

    /// The dataset file referenced by the caller does not exist.
    #[error("CSV file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A numeric feature has an empty cell.
    #[error("missing value in numeric column '{column}' at row {row}")]
    MissingValue {
        column : String,
        row : usize
    },

    /// A numeric feature or a feature matrix entry is infinite or NaN.
    #[error("non-finite value in column '{column}' at row {row}")]
    NonFiniteValue {
        column : String,
        row : usize
    },

    /// A feature column named by the caller is not in the dataset.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A column does not hold one value per row.
    #[error("column '{column}' has {found} values, expected {expected}")]
    ColumnLengthMismatch {
        column : String,
        expected : usize,
        found : usize
    },

    /// The linkage strategy name is not one of ward, complete, average or single.
    #[error("unknown linkage strategy '{0}'")]
    UnknownLinkage(String),

    /// Merge records do not form a strict binary tree over the samples.
    #[error("malformed linkage: {0}")]
    MalformedLinkage(String),

    /// Dimensionality reduction was asked for zero components.
    #[error("invalid component count {0}")]
    InvalidComponentCount(usize),

    /// The clustering request violates one of its bounds.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Two assignments being compared do not cover the same samples.
    #[error("assignments differ in length: {left} vs {right}")]
    AssignmentMismatch {
        left : usize,
        right : usize
    },

    /// A chart was requested for empty input.
    #[error("nothing to render")]
    NothingToRender,

    /// The drawing backend or the image encoder failed.
    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error)
}

impl<E : std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>> for Error {
    fn from(err : plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err : image::ImageError) -> Self {
        Error::Render(err.to_string())
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
