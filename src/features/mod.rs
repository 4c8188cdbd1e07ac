//! Partition dataset columns into numeric and categorical features.
use log::debug;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Column names that denote row identifiers rather than features. Compared case-insensitively.
///
/// This is an exact-name list: a column such as `user_id` is NOT excluded and will be typed like any other column.
pub const RESERVED_IDENTIFIERS : [&str; 4] = ["id", "customer_id", "customerid", "index"];

/// Ordered numeric and categorical column names of a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Default)]
pub struct FeatureSchema {
    pub numeric : Vec<String>,
    pub categorical : Vec<String>
}

impl FeatureSchema {
    /// Number of original columns used as features.
    pub fn len(&self) -> usize { self.numeric.len() + self.categorical.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Is this column name one of the `RESERVED_IDENTIFIERS`?
pub fn is_identifier(column_name : &str) -> bool {
    let lowered = column_name.to_lowercase();
    RESERVED_IDENTIFIERS.iter().any(|id| *id == lowered)
}

/// Classify every column by its declared type.
///
///   - Identifier columns are excluded before typing.
///   - Integer and float columns are numeric, text columns categorical, anything else is dropped.
///   - Both groups keep the original column order.
///   - returns - `NoFeaturesFound` if neither group has any column.
pub fn detect_feature_types(dataset : &Dataset) -> Result<FeatureSchema> {
    let mut schema = FeatureSchema::default();
    for column in dataset.columns() {
        if is_identifier(column.name()) {
            debug!("Excluding identifier column '{}'", column.name());
            continue;
        }
        let column_type = column.column_type();
        if column_type.is_numeric() {
            schema.numeric.push(column.name().to_string());
        }
        else if column_type.is_categorical() {
            schema.categorical.push(column.name().to_string());
        }
        else {
            debug!("Dropping column '{}' of unsupported type {:?}", column.name(), column_type);
        }
    }
    if schema.is_empty() {
        return Err(Error::NoFeaturesFound);
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use spectral::prelude::*;
    use super::*;
    use crate::dataset::{Column, ColumnType, Dataset, Value};

    #[test]
    fn identifiers_are_excluded() {
        asserting("ID").that(&is_identifier("ID")).is_equal_to(true);
        asserting("CustomerID").that(&is_identifier("CustomerID")).is_equal_to(true);
        asserting("user_id is not reserved").that(&is_identifier("user_id")).is_equal_to(false);
    }

    #[test]
    fn partitions_in_original_order() {
        let dataset = Dataset::new(vec![
            Column::numeric("Customer_ID", &[1.0, 2.0]),
            Column::text("Region", &["north", "south"]),
            Column::numeric("Age", &[30.0, 40.0]),
            Column::new("Active", ColumnType::Boolean, vec![Value::Bool(true), Value::Bool(false)]),
            Column::text("Gender", &["f", "m"]),
            Column::numeric("Income", &[10.0, 20.0])
        ]).unwrap();
        let schema = detect_feature_types(&dataset).unwrap();
        asserting("Numeric").that(&schema.numeric).is_equal_to(vec!["Age".to_string(), "Income".to_string()]);
        asserting("Categorical").that(&schema.categorical).is_equal_to(vec!["Region".to_string(), "Gender".to_string()]);
    }

    #[test]
    fn only_identifiers() {
        let dataset = Dataset::new(vec![Column::numeric("index", &[0.0, 1.0])]).unwrap();
        let result = detect_feature_types(&dataset);
        asserting("No features").that(&matches!(result, Err(Error::NoFeaturesFound))).is_equal_to(true);
    }
}
