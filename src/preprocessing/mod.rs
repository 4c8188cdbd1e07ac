//! Turn mixed-type tabular data into a dense numeric feature matrix.
//!
//! Numeric columns are standardized, categorical columns are one-hot encoded,
//! and the two blocks are concatenated: numeric columns first, then one indicator block per categorical column.
//! An optional principal component analysis (see [`pca`]) can follow.
use std::cmp::Ordering;
use std::collections::HashMap;
use log::debug;

use crate::dataset::{Column, Dataset, Value};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

pub mod pca;

pub use self::pca::{apply_dimensionality_reduction, Pca};

// ........................... StandardScaler ..........................................

/// Centers each column on its mean and divides by its population standard deviation.
///
/// Statistics are fitted on the same data they transform; there is no held-out split.
/// Each column is first divided by a power of two near its largest magnitude, so values close to
/// `f64::MAX` neither overflow the mean nor the variance. The division is exact.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardScaler {
    magnitude : Vec<f64>,
    mean : Vec<f64>,
    scale : Vec<f64>,
    constant : Vec<bool>
}

/// Largest power of two not above the largest absolute value, or one for an all zero column.
fn magnitude_of(column : &[f64]) -> f64 {
    let largest = column.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if largest == 0.0 || !largest.is_finite() {
        return 1.0;
    }
    let exponent = (largest.log2().floor() as i32).max(-1022).min(1023);
    2.0_f64.powi(exponent)
}

impl StandardScaler {
    /// Compute the mean and population standard deviation of every column.
    ///
    /// A column with (near) zero variance relative to its magnitude gets a scale of one, so it standardizes to all zeros.
    /// Values are expected to be finite; `build_and_apply_preprocessing` rejects anything else before fitting.
    pub fn fit(columns : &[Vec<f64>]) -> Self {
        let mut magnitude = Vec::with_capacity(columns.len());
        let mut mean = Vec::with_capacity(columns.len());
        let mut scale = Vec::with_capacity(columns.len());
        let mut constant = Vec::with_capacity(columns.len());
        for column in columns {
            let m = magnitude_of(column);
            let n = column.len().max(1) as f64;
            let mu = column.iter().map(|x| x / m).sum::<f64>() / n;
            let variance = column.iter().map(|x| (x / m - mu) * (x / m - mu)).sum::<f64>() / n;
            let std = variance.sqrt();
            magnitude.push(m);
            mean.push(mu);
            constant.push(std < 10.0 * f64::EPSILON);
            scale.push(if std < 10.0 * f64::EPSILON { 1.0 } else { std });
        }
        StandardScaler { magnitude, mean, scale, constant }
    }

    /// Standardize columns with the fitted statistics.
    ///
    ///   - panics - If the number of columns differs from the number fitted.
    pub fn transform(&self, columns : &[Vec<f64>]) -> Vec<Vec<f64>> {
        assert_eq!(columns.len(), self.mean.len(), "scaler fitted on a different number of columns");
        columns.iter().enumerate()
            .map(|(j, column)| column.iter().map(|x| (x / self.magnitude[j] - self.mean[j]) / self.scale[j]).collect())
            .collect()
    }

    /// Fitted column means, in the units of the data.
    pub fn mean(&self) -> Vec<f64> {
        self.mean.iter().zip(self.magnitude.iter()).map(|(mu, m)| mu * m).collect()
    }

    /// Fitted standard deviations, in the units of the data. Constant columns report one.
    pub fn scale(&self) -> Vec<f64> {
        self.scale.iter().zip(self.magnitude.iter()).zip(self.constant.iter())
            .map(|((std, m), constant)| if *constant { 1.0 } else { std * m })
            .collect()
    }
}

// ........................... OneHotEncoder ..........................................

/// A category observed in a categorical column. `None` stands for a missing value.
pub type Category = Option<String>;

fn category_of(value : &Value) -> Category {
    match value {
        Value::Missing => None,
        other => Some(other.to_string())
    }
}

/// Text categories sort lexicographically; the missing category sorts last.
fn compare_categories(a : &Category, b : &Category) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal
    }
}

/// Expands each categorical column into one indicator column per category seen at fit time.
///
/// A category that was not seen at fit time encodes as all zeros for its block rather than failing.
#[derive(Clone, Debug, PartialEq)]
pub struct OneHotEncoder {
    categories : Vec<Vec<Category>>
}

impl OneHotEncoder {
    /// Learn the sorted vocabulary of every column.
    pub fn fit(columns : &[&[Value]]) -> Self {
        let categories = columns.iter().map(|values| {
            let mut vocabulary : Vec<Category> = Vec::new();
            for value in values.iter() {
                let category = category_of(value);
                if !vocabulary.contains(&category) {
                    vocabulary.push(category);
                }
            }
            vocabulary.sort_by(compare_categories);
            vocabulary
        }).collect();
        OneHotEncoder { categories }
    }

    /// The fitted vocabulary of each column, in output order.
    pub fn categories(&self) -> &[Vec<Category>] { &self.categories }

    /// Total number of indicator columns produced.
    pub fn n_outputs(&self) -> usize { self.categories.iter().map(|c| c.len()).sum() }

    /// Encode columns into indicator columns, block by block.
    ///
    ///   - panics - If the number of columns differs from the number fitted.
    pub fn transform(&self, columns : &[&[Value]]) -> Vec<Vec<f64>> {
        assert_eq!(columns.len(), self.categories.len(), "encoder fitted on a different number of columns");
        let mut encoded = Vec::with_capacity(self.n_outputs());
        for (values, vocabulary) in columns.iter().zip(self.categories.iter()) {
            let positions : HashMap<&Category, usize> = vocabulary.iter().enumerate().map(|(i, c)| (c, i)).collect();
            let mut block = vec![vec![0.0; values.len()]; vocabulary.len()];
            for (row, value) in values.iter().enumerate() {
                // Unknown categories leave the whole block at zero.
                if let Some(position) = positions.get(&category_of(value)) {
                    block[*position][row] = 1.0;
                }
            }
            encoded.extend(block);
        }
        encoded
    }
}

// ........................... Preprocessor ..........................................

/// Column-wise transformation plan: which columns are scaled and which are encoded.
///
/// Columns not named here are dropped from the output.
#[derive(Clone, Debug, PartialEq)]
pub struct Preprocessor {
    numeric : Vec<String>,
    categorical : Vec<String>
}

impl Preprocessor {
    /// Plan the transformation.
    ///
    ///   - returns - `NoValidFeatures` if both column lists are empty.
    pub fn build(numeric : &[String], categorical : &[String]) -> Result<Self> {
        if numeric.is_empty() && categorical.is_empty() {
            return Err(Error::NoValidFeatures);
        }
        Ok(Preprocessor { numeric : numeric.to_vec(), categorical : categorical.to_vec() })
    }

    /// Fit scaler statistics and category vocabularies on the dataset.
    pub fn fit(&self, dataset : &Dataset) -> Result<FittedPreprocessor> {
        let scaler =
            if self.numeric.is_empty() { None }
            else { Some(StandardScaler::fit(&numeric_columns(dataset, &self.numeric)?)) };
        let encoder =
            if self.categorical.is_empty() { None }
            else { Some(OneHotEncoder::fit(&categorical_columns(dataset, &self.categorical)?)) };
        Ok(FittedPreprocessor { plan : self.clone(), scaler, encoder })
    }
}

/// A `Preprocessor` whose statistics and vocabularies have been learned.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedPreprocessor {
    plan : Preprocessor,
    scaler : Option<StandardScaler>,
    encoder : Option<OneHotEncoder>
}

impl FittedPreprocessor {
    /// Produce the feature matrix for the dataset: scaled numeric columns followed by one-hot blocks.
    pub fn transform(&self, dataset : &Dataset) -> Result<FeatureMatrix> {
        let mut output : Vec<Vec<f64>> = Vec::with_capacity(self.n_features());
        if let Some(scaler) = &self.scaler {
            output.extend(scaler.transform(&numeric_columns(dataset, &self.plan.numeric)?));
        }
        if let Some(encoder) = &self.encoder {
            output.extend(encoder.transform(&categorical_columns(dataset, &self.plan.categorical)?));
        }
        Ok(FeatureMatrix::from_columns(dataset.n_rows(), &output))
    }

    /// Number of encoded features the transform produces.
    pub fn n_features(&self) -> usize {
        self.plan.numeric.len() + self.encoder.as_ref().map_or(0, |e| e.n_outputs())
    }

    /// Names of the encoded features, `num__<column>` and `cat__<column>_<category>`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names : Vec<String> = self.plan.numeric.iter().map(|c| format!("num__{}", c)).collect();
        if let Some(encoder) = &self.encoder {
            for (column, vocabulary) in self.plan.categorical.iter().zip(encoder.categories()) {
                for category in vocabulary {
                    names.push(format!("cat__{}_{}", column, category.as_deref().unwrap_or("nan")));
                }
            }
        }
        names
    }

    pub fn scaler(&self) -> Option<&StandardScaler> { self.scaler.as_ref() }

    pub fn encoder(&self) -> Option<&OneHotEncoder> { self.encoder.as_ref() }
}

fn find_column<'a>(dataset : &'a Dataset, name : &str) -> Result<&'a Column> {
    dataset.column(name).ok_or_else(|| Error::UnknownColumn(name.to_string()))
}

/// Read numeric columns, rejecting gaps and infinities.
fn numeric_columns(dataset : &Dataset, names : &[String]) -> Result<Vec<Vec<f64>>> {
    names.iter().map(|name| {
        let column = find_column(dataset, name)?;
        column.values().iter().enumerate()
            .map(|(row, value)| match value.as_number() {
                None => Err(Error::MissingValue { column : name.clone(), row }),
                Some(x) if !x.is_finite() => Err(Error::NonFiniteValue { column : name.clone(), row }),
                Some(x) => Ok(x)
            })
            .collect()
    }).collect()
}

fn categorical_columns<'a>(dataset : &'a Dataset, names : &[String]) -> Result<Vec<&'a [Value]>> {
    names.iter().map(|name| find_column(dataset, name).map(|c| c.values())).collect()
}

/// Fit the column-wise transformation on the dataset and apply it in one pass.
///
///   - returns - `NoValidFeatures` if both column lists are empty.
///   - returns - `MissingValue` if a numeric column has a gap.
///   - returns - `NonFiniteValue` if a numeric column holds an infinity or NaN.
pub fn build_and_apply_preprocessing(dataset : &Dataset, numeric : &[String], categorical : &[String]) -> Result<FeatureMatrix> {
    let fitted = Preprocessor::build(numeric, categorical)?.fit(dataset)?;
    let matrix = fitted.transform(dataset)?;
    debug!("Preprocessed {} rows into {} encoded features", matrix.n_rows(), matrix.n_cols());
    Ok(matrix)
}
