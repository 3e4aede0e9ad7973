//! CSV loading for fairness datasets
//!
//! Supports files where:
//! - The last column is the label (positive values map to +1, the rest to -1,
//!   so both {0, 1} and {-1, +1} encodings load)
//! - All other columns are features, one of which holds the sensitive value
//! - First row can be headers (automatically detected)

use crate::core::{FairSvmError, Result};
use crate::data::FairDataset;
use log::debug;
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// How to read a CSV file into a [`FairDataset`]
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// Feature column holding the sensitive value (label column excluded)
    pub sensitive_column: usize,
    /// Remove the sensitive column from the feature matrix
    pub drop_sensitive: bool,
    pub auto_detect_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            sensitive_column: 0,
            drop_sensitive: false,
            auto_detect_header: true,
        }
    }
}

impl CsvOptions {
    pub fn new(sensitive_column: usize) -> Self {
        Self {
            sensitive_column,
            ..Self::default()
        }
    }

    pub fn with_drop_sensitive(mut self, drop: bool) -> Self {
        self.drop_sensitive = drop;
        self
    }

    pub fn with_header_detection(mut self, enabled: bool) -> Self {
        self.auto_detect_header = enabled;
        self
    }
}

impl FairDataset {
    /// Load a dataset from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, options: &CsvOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(BufReader::new(file), options)
    }

    /// Load a dataset from any buffered reader
    pub fn from_csv_reader<R: BufRead>(reader: R, options: &CsvOptions) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut labels = Vec::new();
        let mut first_data_line = true;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if first_data_line {
                first_data_line = false;
                if options.auto_detect_header && is_header_line(line) {
                    debug!("Skipping CSV header: {line}");
                    continue;
                }
            }

            let (features, label) = parse_data_line(line)?;
            if let Some(first) = rows.first() {
                if first.len() != features.len() {
                    return Err(FairSvmError::ParseError(format!(
                        "Expected {} features, found {} in line: {line}",
                        first.len(),
                        features.len()
                    )));
                }
            }
            rows.push(features);
            labels.push(label);
        }

        if rows.is_empty() {
            return Err(FairSvmError::EmptyDataset);
        }

        let n_columns = rows[0].len();
        if options.sensitive_column >= n_columns {
            return Err(FairSvmError::InvalidParameter(format!(
                "Sensitive column {} out of range for {n_columns} features",
                options.sensitive_column
            )));
        }

        let sensitive: Vec<f64> = rows
            .iter()
            .map(|row| row[options.sensitive_column])
            .collect();

        let kept: Vec<usize> = (0..n_columns)
            .filter(|&j| !(options.drop_sensitive && j == options.sensitive_column))
            .collect();
        let flat: Vec<f64> = rows
            .iter()
            .flat_map(|row| kept.iter().map(move |&j| row[j]))
            .collect();
        let x = Array2::from_shape_vec((rows.len(), kept.len()), flat)?;

        debug!(
            "Loaded {} examples with {} features from CSV",
            rows.len(),
            kept.len()
        );
        FairDataset::new(x, Array1::from(labels), sensitive)
    }
}

/// Check if a line appears to be a header
fn is_header_line(line: &str) -> bool {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 2 {
        return false;
    }

    // Most feature fields non-numeric means a header
    let non_numeric_count = fields
        .iter()
        .take(fields.len() - 1)
        .filter(|field| field.trim().parse::<f64>().is_err())
        .count();

    non_numeric_count > fields.len() / 2
}

/// Parse a CSV data line into dense features and a {-1, +1} label
fn parse_data_line(line: &str) -> Result<(Vec<f64>, f64)> {
    let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
    if fields.len() < 2 {
        return Err(FairSvmError::ParseError(format!(
            "Line has too few fields: {line}"
        )));
    }

    let label_str = fields[fields.len() - 1];
    let label = label_str
        .parse::<f64>()
        .map_err(|_| FairSvmError::ParseError(format!("Invalid label: {label_str}")))?;
    let label = if label > 0.0 { 1.0 } else { -1.0 };

    let features = fields[..fields.len() - 1]
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            field.parse::<f64>().map_err(|_| {
                FairSvmError::ParseError(format!(
                    "Invalid feature value at column {}: {field}",
                    idx + 1
                ))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok((features, label))
}
