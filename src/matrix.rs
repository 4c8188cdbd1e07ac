use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Dense, row-major matrix of encoded features.
///
/// Rows are samples in their original dataset order; columns are encoded features.
/// Once produced by preprocessing or reduction it is never mutated.
#[derive(Clone, PartialEq)]
pub struct FeatureMatrix {
    n_rows : usize,
    n_cols : usize,
    data : Vec<f64>
}

impl FeatureMatrix {
    /// Create a matrix from row-major data.
    ///
    ///   - panics - If `data.len() != n_rows * n_cols`.
    pub fn from_vec(n_rows : usize, n_cols : usize, data : Vec<f64>) -> Self {
        assert_eq!(data.len(), n_rows * n_cols, "matrix data does not match its shape");
        FeatureMatrix { n_rows, n_cols, data }
    }

    /// Create a matrix from a list of equally long rows.
    ///
    ///   - panics - If the rows differ in length.
    pub fn from_rows(rows : &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for row in rows {
            assert_eq!(row.len(), n_cols, "ragged rows");
            data.extend_from_slice(row);
        }
        FeatureMatrix { n_rows : rows.len(), n_cols, data }
    }

    /// Build a matrix by stacking column vectors side by side.
    pub fn from_columns(n_rows : usize, columns : &[Vec<f64>]) -> Self {
        let n_cols = columns.len();
        let mut data = vec![0.0; n_rows * n_cols];
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                data[i * n_cols + j] = *value;
            }
        }
        FeatureMatrix { n_rows, n_cols, data }
    }

    /// Number of samples.
    pub fn n_rows(&self) -> usize { self.n_rows }

    /// Number of encoded features.
    pub fn n_cols(&self) -> usize { self.n_cols }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) { (self.n_rows, self.n_cols) }

    pub fn is_empty(&self) -> bool { self.n_rows == 0 }

    pub fn get(&self, row : usize, col : usize) -> f64 { self.data[row * self.n_cols + col] }

    /// All features of one sample.
    pub fn row(&self, row : usize) -> &[f64] {
        let start = row * self.n_cols;
        &self.data[start .. start + self.n_cols]
    }

    /// Copy of one encoded feature across all samples.
    pub fn column(&self, col : usize) -> Vec<f64> {
        (0..self.n_rows).map(|i| self.get(i, col)).collect()
    }

    /// Iterate over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Position `(row, col)` of the first infinite or NaN entry, if any.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data.iter().position(|x| !x.is_finite()).map(|i| (i / self.n_cols, i % self.n_cols))
    }

    /// Euclidean distance between two samples.
    pub fn distance(&self, a : usize, b : usize) -> f64 {
        euclidean(self.row(a), self.row(b))
    }
}

/// Euclidean distance between two points of equal dimension.
pub fn euclidean(a : &[f64], b : &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

impl Debug for FeatureMatrix {
    fn fmt(&self, f : &mut Formatter) -> FmtResult {
        write!(f, "FeatureMatrix {}x{}", self.n_rows, self.n_cols)?;
        for row in self.rows().take(5) {
            write!(f, "\n  {:?}", row)?;
        }
        if self.n_rows > 5 { write!(f, "\n  ...")?; }
        Ok(())
    }
}
