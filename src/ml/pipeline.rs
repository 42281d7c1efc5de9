//! One-hot feature encoding with a schema learned at fit time.
//!
//! Categorical columns expand into one output column per observed category
//! (sorted), followed by the indicator columns unchanged. A category that was
//! not seen during fit encodes as an all-zero block.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::record::{CATEGORICAL_COLUMNS, FieldValue, INDICATOR_COLUMNS, RawRecord};

/// Raised when a row does not line up with the learned columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaMismatch {
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("unexpected columns: {}", .0.join(", "))]
    UnexpectedColumns(Vec<String>),
    #[error("column {column} expects {expected}")]
    WrongKind {
        column: String,
        expected: &'static str,
    },
    #[error("encoded row has {found} values, schema expects {expected}")]
    Width { expected: usize, found: usize },
}

/// Learned categories of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|category| category.as_str().cmp(value))
            .ok()
    }
}

/// Column layout and encoding rules fixed at fit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub categorical: Vec<CategoricalColumn>,
    pub indicators: Vec<String>,
}

/// Values recovered from an encoded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    /// `None` when the block was all zeros (unseen category).
    pub categories: Vec<(String, Option<String>)>,
    pub indicators: Vec<(String, u8)>,
}

impl FeatureSchema {
    /// Learn categories for the standard dataset columns and encode `rows`.
    pub fn fit(rows: &[RawRecord]) -> Result<(Self, Array2<f64>), SchemaMismatch> {
        Self::fit_columns(rows, &CATEGORICAL_COLUMNS, &INDICATOR_COLUMNS)
    }

    /// Learn categories for an explicit column split and encode `rows`.
    pub fn fit_columns(
        rows: &[RawRecord],
        categorical: &[&str],
        indicators: &[&str],
    ) -> Result<(Self, Array2<f64>), SchemaMismatch> {
        let mut columns = Vec::with_capacity(categorical.len());
        for &name in categorical {
            let mut seen = BTreeSet::new();
            for row in rows {
                seen.insert(category_value(row, name)?.to_string());
            }
            columns.push(CategoricalColumn {
                name: name.to_string(),
                categories: seen.into_iter().collect(),
            });
        }
        let schema = FeatureSchema {
            categorical: columns,
            indicators: indicators.iter().map(|name| name.to_string()).collect(),
        };
        let encoded = schema.transform_rows(rows)?;
        Ok((schema, encoded))
    }

    /// Input column names, categorical first.
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.categorical
            .iter()
            .map(|column| column.name.as_str())
            .chain(self.indicators.iter().map(String::as_str))
    }

    /// Width of an encoded row.
    pub fn width(&self) -> usize {
        self.categorical
            .iter()
            .map(|column| column.categories.len())
            .sum::<usize>()
            + self.indicators.len()
    }

    /// Encoded column names, e.g. `role_Designer` or `uses_design_tools`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        for column in &self.categorical {
            for category in &column.categories {
                names.push(format!("{}_{category}", column.name));
            }
        }
        names.extend(self.indicators.iter().cloned());
        names
    }

    /// Keep exactly the schema's columns, dropping any extras.
    pub fn reindex(&self, raw: &RawRecord) -> Result<RawRecord, SchemaMismatch> {
        let missing: Vec<String> = self
            .input_columns()
            .filter(|column| !raw.contains(column))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(SchemaMismatch::MissingColumns(missing));
        }
        Ok(self
            .input_columns()
            .filter_map(|column| raw.get(column).map(|value| (column.to_string(), value.clone())))
            .collect())
    }

    /// Encode one row. The column set must match the schema exactly.
    pub fn transform(&self, raw: &RawRecord) -> Result<Array1<f64>, SchemaMismatch> {
        self.check_columns(raw)?;
        let mut out = Array1::zeros(self.width());
        let mut offset = 0;
        for column in &self.categorical {
            let value = category_value(raw, &column.name)?;
            if let Some(pos) = column.position(value) {
                out[offset + pos] = 1.0;
            }
            offset += column.categories.len();
        }
        for name in &self.indicators {
            out[offset] = f64::from(indicator_value(raw, name)?);
            offset += 1;
        }
        Ok(out)
    }

    /// Encode many rows into a matrix, one row per record.
    pub fn transform_rows(&self, rows: &[RawRecord]) -> Result<Array2<f64>, SchemaMismatch> {
        let mut out = Array2::zeros((rows.len(), self.width()));
        for (idx, raw) in rows.iter().enumerate() {
            out.row_mut(idx).assign(&self.transform(raw)?);
        }
        Ok(out)
    }

    /// Map an encoded row back to column values.
    pub fn decode(&self, row: ArrayView1<'_, f64>) -> Result<DecodedRow, SchemaMismatch> {
        if row.len() != self.width() {
            return Err(SchemaMismatch::Width {
                expected: self.width(),
                found: row.len(),
            });
        }
        let mut offset = 0;
        let mut categories = Vec::with_capacity(self.categorical.len());
        for column in &self.categorical {
            let block = row.slice(ndarray::s![offset..offset + column.categories.len()]);
            let value = block
                .iter()
                .position(|&v| v > 0.5)
                .map(|pos| column.categories[pos].clone());
            categories.push((column.name.clone(), value));
            offset += column.categories.len();
        }
        let indicators = self
            .indicators
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), u8::from(row[offset + idx] > 0.5)))
            .collect();
        Ok(DecodedRow {
            categories,
            indicators,
        })
    }

    fn check_columns(&self, raw: &RawRecord) -> Result<(), SchemaMismatch> {
        let expected: BTreeSet<&str> = self.input_columns().collect();
        let missing: Vec<String> = expected
            .iter()
            .filter(|column| !raw.contains(column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaMismatch::MissingColumns(missing));
        }
        let unexpected: Vec<String> = raw
            .columns()
            .filter(|column| !expected.contains(column))
            .map(str::to_string)
            .collect();
        if !unexpected.is_empty() {
            return Err(SchemaMismatch::UnexpectedColumns(unexpected));
        }
        Ok(())
    }
}

fn category_value<'a>(raw: &'a RawRecord, column: &str) -> Result<&'a str, SchemaMismatch> {
    match raw.get(column) {
        Some(FieldValue::Category(value)) => Ok(value),
        Some(FieldValue::Indicator(_)) => Err(SchemaMismatch::WrongKind {
            column: column.to_string(),
            expected: "a category string",
        }),
        None => Err(SchemaMismatch::MissingColumns(vec![column.to_string()])),
    }
}

fn indicator_value(raw: &RawRecord, column: &str) -> Result<u8, SchemaMismatch> {
    match raw.get(column) {
        Some(FieldValue::Indicator(value @ (0 | 1))) => Ok(*value),
        Some(_) => Err(SchemaMismatch::WrongKind {
            column: column.to_string(),
            expected: "0 or 1",
        }),
        None => Err(SchemaMismatch::MissingColumns(vec![column.to_string()])),
    }
}
