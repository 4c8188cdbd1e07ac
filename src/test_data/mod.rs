//! Data for segmentation tests
use std::include_str;
use crate::dataset::Dataset;
use crate::matrix::FeatureMatrix;

/// Twenty four customers in three segments: rows `0, 3, 6, ...` are young low earners who spend a lot,
/// rows `1, 4, 7, ...` well paid and frugal, rows `2, 5, 8, ...` seniors in between.
pub fn load_customers() -> &'static str {
    include_str!("customers.csv")
}

pub fn customers() -> Dataset {
    match Dataset::from_reader(load_customers().as_bytes()) {
        Ok(dataset) => dataset,
        Err(err) => panic!("Unable to parse customers. {:?}", err)
    }
}

/// Five points near (0, 0) followed by five near (10, 10).
pub fn two_blobs() -> FeatureMatrix {
    FeatureMatrix::from_rows(&[
        vec![0.0, 0.0], vec![0.3, -0.2], vec![-0.1, 0.4], vec![0.2, 0.1], vec![-0.3, -0.1],
        vec![10.0, 10.0], vec![10.2, 9.8], vec![9.7, 10.1], vec![10.1, 10.3], vec![9.9, 9.6]
    ])
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use spectral::prelude::*;
    use super::*;
    use crate::dataset::ColumnType;

    /// Verify that the CSV file parses with the expected column types.
    #[test]
    fn parse_customers() {
        let dataset = customers();
        asserting("Rows").that(&dataset.n_rows()).is_equal_to(24);
        let types : Vec<ColumnType> = dataset.columns().iter().map(|c| c.column_type()).collect();
        asserting("Column types").that(&types).is_equal_to(vec![
            ColumnType::Integer, ColumnType::Integer, ColumnType::Integer, ColumnType::Integer,
            ColumnType::Text, ColumnType::Text, ColumnType::Boolean
        ]);
    }
}
