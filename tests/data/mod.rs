use std::include_str;
use segmentree::{Column, Dataset};

/// Twenty four customers in three interleaved segments (row index modulo 3).
pub fn load_customers() -> &'static str {
    include_str!("customers.csv")
}

pub fn customers() -> Dataset {
    match Dataset::from_reader(load_customers().as_bytes()) {
        Ok(dataset) => dataset,
        Err(err) => panic!("Unable to parse customers. {:?}", err)
    }
}

/// Five points near (0, 0) and five near (10, 10), with an identifier column.
#[allow(dead_code)]
pub fn two_blobs() -> Dataset {
    let xs = [0.0, 0.3, -0.1, 0.2, -0.3, 10.0, 10.2, 9.7, 10.1, 9.9];
    let ys = [0.0, -0.2, 0.4, 0.1, -0.1, 10.0, 9.8, 10.1, 10.3, 9.6];
    let ids : Vec<f64> = (1..=10).map(|i| i as f64).collect();
    match Dataset::new(vec![Column::numeric("id", &ids), Column::numeric("x", &xs), Column::numeric("y", &ys)]) {
        Ok(dataset) => dataset,
        Err(err) => panic!("Unable to build blobs. {:?}", err)
    }
}
