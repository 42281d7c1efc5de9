//! Loader for dataset CSV files written by [`super::write_dataset`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use super::DatasetError;
use super::record::{
    CATEGORICAL_COLUMNS, FEATURE_COLUMNS, FieldValue, INDICATOR_COLUMNS, LABEL_COLUMN, RawRecord,
    canonical_category,
};

/// Feature rows with their aligned labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub rows: Vec<RawRecord>,
    pub labels: Vec<bool>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Labels as class indices (`0` or `1`).
    pub fn label_indices(&self) -> Vec<usize> {
        self.labels.iter().map(|&label| usize::from(label)).collect()
    }

    /// Copy out the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Frame {
        Frame {
            rows: indices.iter().map(|&idx| self.rows[idx].clone()).collect(),
            labels: indices.iter().map(|&idx| self.labels[idx]).collect(),
        }
    }
}

/// Load a labeled dataset, validating the header before reading any row.
pub fn load_dataset(path: &Path) -> Result<Frame, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::io(path, source))?;
    let frame = read_frame(BufReader::new(file)).map_err(|err| err.with_path(path))?;
    debug!("Loaded {} rows from {}", frame.len(), path.display());
    Ok(frame)
}

/// Parse CSV text from any reader.
pub fn read_frame<R: Read>(reader: BufReader<R>) -> Result<Frame, DatasetError> {
    let mut lines = reader.lines().enumerate();
    let header = match lines.next() {
        Some((_, line)) => line.map_err(|source| DatasetError::io("<input>", source))?,
        None => return Err(DatasetError::Empty),
    };
    let header: Vec<String> = split_cells(&header).map(str::to_string).collect();
    let positions = column_positions(&header)?;

    let mut frame = Frame::default();
    for (idx, line) in lines {
        let line = line.map_err(|source| DatasetError::io("<input>", source))?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let cells: Vec<&str> = split_cells(&line).collect();
        if cells.len() != header.len() {
            return Err(DatasetError::RowWidth {
                line: line_no,
                expected: header.len(),
                found: cells.len(),
            });
        }
        let mut row = RawRecord::new();
        for (column, &pos) in FEATURE_COLUMNS.iter().zip(&positions.features) {
            let cell = cells[pos];
            let value = if INDICATOR_COLUMNS.contains(column) {
                FieldValue::indicator(parse_binary(cell, line_no, column)?)
            } else {
                debug_assert!(CATEGORICAL_COLUMNS.contains(column));
                let category = canonical_category(column, cell)
                    .map_err(|_| DatasetError::invalid(line_no, column, cell))?;
                FieldValue::category(category)
            };
            row.insert(*column, value);
        }
        let label = parse_binary(cells[positions.label], line_no, LABEL_COLUMN)?;
        frame.rows.push(row);
        frame.labels.push(label);
    }

    if frame.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(frame)
}

struct ColumnPositions {
    features: Vec<usize>,
    label: usize,
}

fn column_positions(header: &[String]) -> Result<ColumnPositions, DatasetError> {
    let find = |name: &str| header.iter().position(|column| column == name);
    let mut missing = Vec::new();
    let mut features = Vec::with_capacity(FEATURE_COLUMNS.len());
    for column in FEATURE_COLUMNS {
        match find(column) {
            Some(pos) => features.push(pos),
            None => missing.push(column.to_string()),
        }
    }
    let label = find(LABEL_COLUMN);
    if label.is_none() {
        missing.push(LABEL_COLUMN.to_string());
    }
    match label {
        Some(label) if missing.is_empty() => Ok(ColumnPositions { features, label }),
        _ => Err(DatasetError::MissingColumns {
            path: None,
            missing,
        }),
    }
}

fn split_cells(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches(['\r', '\n']).split(',').map(str::trim)
}

fn parse_binary(cell: &str, line: usize, column: &str) -> Result<bool, DatasetError> {
    match cell {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(DatasetError::invalid(line, column, cell)),
    }
}
