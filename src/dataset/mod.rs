//! Typed tabular data: the raw input of the segmentation pipeline.
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use csv::ReaderBuilder;
use log::debug;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Declared value type of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text
}

impl ColumnType {
    /// Integer and float columns are numeric features.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Text columns are categorical features.
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnType::Text)
    }
}

/// A single cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing
}

impl Value {
    /// Coerce the value to a number if it holds one, or holds text that parses as one.
    ///
    /// Booleans and missing values do not coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) if x.is_finite() => Some(*x),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None
        }
    }

    pub fn is_missing(&self) -> bool { matches!(self, Value::Missing) }
}

impl Display for Value {
    fn fmt(&self, f : &mut Formatter) -> FmtResult {
        match self {
            Value::Number(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Missing => write!(f, "nan")
        }
    }
}

impl Serialize for Value {
    fn serialize<S : Serializer>(&self, serializer : S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Number(x) if x.fract() == 0.0 && x.abs() < 9.0e15 => serializer.serialize_i64(*x as i64),
            Value::Number(x) => serializer.serialize_f64(*x),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Missing => serializer.serialize_none()
        }
    }
}

/// A named column with one value per row.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name : String,
    column_type : ColumnType,
    values : Vec<Value>
}

impl Column {
    pub fn new<S : Into<String>>(name : S, column_type : ColumnType, values : Vec<Value>) -> Self {
        Column { name : name.into(), column_type, values }
    }

    /// Convenience constructor for a float column without gaps.
    pub fn numeric<S : Into<String>>(name : S, values : &[f64]) -> Self {
        Column::new(name, ColumnType::Float, values.iter().map(|x| Value::Number(*x)).collect())
    }

    /// Convenience constructor for a text column without gaps.
    pub fn text<S : Into<String>>(name : S, values : &[&str]) -> Self {
        Column::new(name, ColumnType::Text, values.iter().map(|s| Value::Text((*s).to_string())).collect())
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn column_type(&self) -> ColumnType { self.column_type }

    pub fn values(&self) -> &[Value] { &self.values }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

/// Ordered set of equally long columns.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dataset {
    columns : Vec<Column>,
    n_rows : usize
}

impl Dataset {
    /// Assemble a dataset from typed columns.
    ///
    ///   - returns - `ColumnLengthMismatch` if any column differs in length from the first.
    pub fn new(columns : Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, |c| c.len());
        for column in columns.iter() {
            if column.len() != n_rows {
                return Err(Error::ColumnLengthMismatch {
                    column : column.name.clone(),
                    expected : n_rows,
                    found : column.len()
                });
            }
        }
        Ok(Dataset { columns, n_rows })
    }

    /// Load a CSV file with a header row.
    ///
    ///   - returns - `SourceNotFound` if there is no file at `path`.
    pub fn from_path<P : AsRef<Path>>(path : P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }
        debug!("Loading dataset from {}", path.display());
        Dataset::from_reader(File::open(path)?)
    }

    /// Parse CSV text with a header row, inferring each column's type from its cells.
    pub fn from_reader<R : Read>(reader : R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers : Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut cells : Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (j, column_cells) in cells.iter_mut().enumerate() {
                column_cells.push(record.get(j).unwrap_or("").to_string());
            }
        }
        let columns = headers.into_iter()
            .zip(cells.into_iter())
            .map(|(name, raw)| infer_column(name, raw))
            .collect();
        Dataset::new(columns)
    }

    pub fn n_rows(&self) -> usize { self.n_rows }

    pub fn n_cols(&self) -> usize { self.columns.len() }

    pub fn is_empty(&self) -> bool { self.n_rows == 0 }

    pub fn columns(&self) -> &[Column] { &self.columns }

    pub fn column_names(&self) -> Vec<&str> { self.columns.iter().map(|c| c.name()).collect() }

    /// Find a column by exact name.
    pub fn column(&self, name : &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All values of one row, keyed by column name.
    pub fn row_payload(&self, row : usize) -> BTreeMap<String, Value> {
        self.columns.iter()
            .map(|c| (c.name.clone(), c.values[row].clone()))
            .collect()
    }
}

/// A sample's cluster label together with its raw values, as handed to persistence and to the scatter renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabeledRow {
    pub row_index : usize,
    pub cluster_label : usize,
    pub payload : BTreeMap<String, Value>
}

impl LabeledRow {
    /// Pair every row of the dataset with its label.
    ///
    ///   - panics - If `labels` is not exactly one label per row.
    pub fn from_labels(dataset : &Dataset, labels : &[usize]) -> Vec<LabeledRow> {
        assert_eq!(labels.len(), dataset.n_rows(), "one label per row is required");
        labels.iter().enumerate()
            .map(|(row_index, label)| LabeledRow {
                row_index,
                cluster_label : *label,
                payload : dataset.row_payload(row_index)
            })
            .collect()
    }
}

/// Cell contents a dataframe reader treats as a missing value.
const MISSING_MARKERS : [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null"
];

fn is_missing_marker(cell : &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

fn parse_bool(cell : &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None
    }
}

/// Decide a column's type from its raw cells, the way a dataframe reader would.
///
/// Empty cells and the usual missing markers (`NA`, `NaN`, `null`, `None`, `N/A`, ...) count as gaps.
///
///   - Every non-empty cell an integer → `Integer`, or `Float` if there are gaps.
///   - Every non-empty cell a float → `Float`.
///   - Every cell a boolean literal and no gaps → `Boolean`.
///   - No non-empty cells at all → `Float`, every value missing.
///   - Anything else → `Text`.
fn infer_column(name : String, raw : Vec<String>) -> Column {
    let filled : Vec<&String> = raw.iter().filter(|c| !is_missing_marker(c)).collect();
    let has_gaps = filled.len() < raw.len();
    let all_int = filled.iter().all(|c| c.parse::<i64>().is_ok());
    let all_float = filled.iter().all(|c| c.parse::<f64>().is_ok());
    let all_bool = !filled.is_empty() && filled.iter().all(|c| parse_bool(c).is_some());

    let column_type =
        if filled.is_empty() { ColumnType::Float }
        else if all_int { if has_gaps { ColumnType::Float } else { ColumnType::Integer } }
        else if all_float { ColumnType::Float }
        else if all_bool && !has_gaps { ColumnType::Boolean }
        else { ColumnType::Text };

    let values = raw.into_iter().map(|cell| {
        if is_missing_marker(&cell) { return Value::Missing; }
        match column_type {
            ColumnType::Integer | ColumnType::Float => cell.parse::<f64>().map_or(Value::Missing, Value::Number),
            ColumnType::Boolean => parse_bool(&cell).map_or(Value::Missing, Value::Bool),
            ColumnType::Text => Value::Text(cell)
        }
    }).collect();
    Column::new(name, column_type, values)
}
