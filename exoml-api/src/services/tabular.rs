//! Tabular Reader
//!
//! Parses comma-separated text with a header row into the numeric columns
//! the normalizer works on. Malformed rows are skipped, not fatal:
//! - a row with more fields than the header is dropped
//! - a row the CSV reader cannot decode is dropped
//! - a row with fewer fields keeps its cells; the absent ones are missing
//!
//! A column is numeric when the table has at least one data row and every
//! present cell parses as a real number. Missing-value tokens count as
//! missing, so a column of only missing cells is still numeric.

use tracing::debug;

use super::feature_normalizer::PreprocessError;

/// Cell contents treated as a missing value
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A",
    "#NA", "<NA>",
];

/// Numeric columns of a parsed table; `None` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    pub columns: Vec<String>,
    /// Row-major, each row has `columns.len()` cells
    pub rows: Vec<Vec<Option<f64>>>,
    /// Data rows dropped as malformed
    pub skipped_rows: usize,
}

impl NumericTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Mean of the finite values in one column
    pub fn column_mean(&self, col: usize) -> Option<f64> {
        let (sum, count) = self
            .rows
            .iter()
            .filter_map(|row| row[col])
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Missing,
    Number(f64),
    Text,
}

fn classify(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed) {
        return Cell::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => Cell::Missing,
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text,
    }
}

/// Parse raw CSV text and keep only its numeric columns
pub fn read_numeric_table(raw: &str) -> Result<NumericTable, PreprocessError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PreprocessError::MalformedInput {
            cause: e.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let width = headers.len();
    let mut cells: Vec<Vec<Cell>> = Vec::new();
    let mut skipped_rows = 0;

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!(row = line + 1, error = %e, "Skipping undecodable row");
                skipped_rows += 1;
                continue;
            }
        };

        if record.len() > width {
            debug!(row = line + 1, fields = record.len(), width, "Skipping over-long row");
            skipped_rows += 1;
            continue;
        }

        let mut row: Vec<Cell> = record.iter().map(classify).collect();
        row.resize(width, Cell::Missing);
        cells.push(row);
    }

    let numeric: Vec<usize> = if cells.is_empty() {
        Vec::new()
    } else {
        (0..width)
            .filter(|&col| cells.iter().all(|row| row[col] != Cell::Text))
            .collect()
    };

    let columns = numeric.iter().map(|&col| headers[col].clone()).collect();
    let rows = cells
        .iter()
        .map(|row| {
            numeric
                .iter()
                .map(|&col| match row[col] {
                    Cell::Number(v) => Some(v),
                    _ => None,
                })
                .collect()
        })
        .collect();

    Ok(NumericTable {
        columns,
        rows,
        skipped_rows,
    })
}
