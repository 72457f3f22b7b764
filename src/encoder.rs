//! Categorical feature encoding.
//!
//! Turns feature rows into fixed-order numeric vectors. Each categorical
//! column gets a value -> code mapping learned at fit time; codes start at 1
//! in order of first appearance and code 0 is reserved for values never seen
//! during fit. Numeric columns pass through unchanged.

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Code assigned to categorical values absent from the fitted mapping
pub const UNKNOWN_CODE: u32 = 0;

/// A single raw feature value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Numeric(f64),
    Category(&'a str),
}

/// Named feature values of one record
pub type FeatureRow<'a> = Vec<(&'a str, FeatureValue<'a>)>;

/// Mapping learned for one categorical column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryMapping {
    /// Observed values; the value at position `i` has code `i + 1`
    values: Vec<String>,
    #[serde(skip)]
    codes: HashMap<String, u32>,
}

impl CategoryMapping {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            codes: HashMap::new(),
        }
    }

    fn observe(&mut self, value: &str) {
        if !self.codes.contains_key(value) {
            self.values.push(value.to_string());
            self.codes.insert(value.to_string(), self.values.len() as u32);
        }
    }

    fn rebuild_index(&mut self) {
        self.codes = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u32 + 1))
            .collect();
    }

    /// Code for a value, falling back to [`UNKNOWN_CODE`]
    pub fn code(&self, value: &str) -> u32 {
        self.codes.get(value).copied().unwrap_or(UNKNOWN_CODE)
    }

    /// Observed values in code order
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// State produced by `fit`, never mutated afterwards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FittedState {
    /// Feature column order shared by fit and every transform
    columns: Vec<String>,
    mappings: HashMap<String, CategoryMapping>,
}

/// Ordinal encoder for categorical columns with unknown-value fallback.
///
/// Deserialization rebuilds the lookup tables and checks the fitted state,
/// so a loaded encoder encodes exactly like the one that was saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawEncoder")]
pub struct CategoricalEncoder {
    /// Columns treated as categorical
    categorical_columns: Vec<String>,
    fitted: Option<FittedState>,
}

/// Unvalidated wire form of [`CategoricalEncoder`]
#[derive(Deserialize)]
struct RawEncoder {
    categorical_columns: Vec<String>,
    #[serde(default)]
    fitted: Option<FittedState>,
}

impl TryFrom<RawEncoder> for CategoricalEncoder {
    type Error = String;

    fn try_from(raw: RawEncoder) -> std::result::Result<Self, String> {
        let mut fitted = raw.fitted;
        if let Some(state) = fitted.as_mut() {
            if let Some(column) = first_duplicate(state.columns.iter().map(String::as_str)) {
                return Err(format!("duplicate feature column `{}`", column));
            }
            for column in &raw.categorical_columns {
                if !state.columns.contains(column) {
                    return Err(format!(
                        "categorical column `{}` is not a fitted feature column",
                        column
                    ));
                }
                if !state.mappings.contains_key(column) {
                    return Err(format!("missing mapping for categorical column `{}`", column));
                }
            }
            for (column, mapping) in state.mappings.iter_mut() {
                if !raw.categorical_columns.contains(column) {
                    return Err(format!("mapping for non-categorical column `{}`", column));
                }
                mapping.rebuild_index();
                if mapping.codes.len() != mapping.values.len() {
                    return Err(format!("duplicate values in mapping for column `{}`", column));
                }
            }
        }
        Ok(Self {
            categorical_columns: raw.categorical_columns,
            fitted,
        })
    }
}

impl CategoricalEncoder {
    /// Create an unfitted encoder for the given categorical columns
    pub fn new<I, S>(categorical_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categorical_columns: categorical_columns.into_iter().map(Into::into).collect(),
            fitted: None,
        }
    }

    /// Load a serialized encoder and rebuild its lookup tables
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ScoringError::from_artifact_json)
    }

    /// Serialize the encoder, including its fitted mapping
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn state(&self) -> Result<&FittedState> {
        self.fitted
            .as_ref()
            .ok_or(ScoringError::NotFitted("CategoricalEncoder"))
    }

    /// Learn the column order and categorical mappings.
    ///
    /// Column order is taken from the first row; every row must present the
    /// same columns in the same order.
    pub fn fit(&mut self, rows: &[FeatureRow<'_>]) -> Result<()> {
        if self.fitted.is_some() {
            return Err(ScoringError::AlreadyFitted);
        }
        let first = rows.first().ok_or_else(|| {
            ScoringError::Validation("cannot fit encoder on an empty batch".to_string())
        })?;
        let columns: Vec<String> = first.iter().map(|(name, _)| name.to_string()).collect();
        if let Some(column) = first_duplicate(columns.iter().map(String::as_str)) {
            return Err(ScoringError::Validation(format!(
                "duplicate feature column `{}` in fit data",
                column
            )));
        }

        for column in &self.categorical_columns {
            if !columns.contains(column) {
                return Err(ScoringError::Validation(format!(
                    "categorical column `{}` not present in fit data",
                    column
                )));
            }
        }

        let mut mappings: HashMap<String, CategoryMapping> = self
            .categorical_columns
            .iter()
            .map(|c| (c.clone(), CategoryMapping::new()))
            .collect();

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len()
                || row.iter().zip(&columns).any(|((name, _), col)| *name != col.as_str())
            {
                return Err(ScoringError::Validation(format!(
                    "row {}: columns differ from the first fit row",
                    index
                )));
            }
            for (name, value) in row {
                match (mappings.get_mut(*name), value) {
                    (Some(mapping), FeatureValue::Category(v)) => mapping.observe(v),
                    (None, FeatureValue::Numeric(_)) => {}
                    _ => return Err(kind_mismatch(index, name)),
                }
            }
        }

        self.fitted = Some(FittedState { columns, mappings });
        Ok(())
    }

    /// Encode rows into a feature matrix in fitted column order.
    ///
    /// Unseen categorical values map to [`UNKNOWN_CODE`]; missing columns or
    /// values of the wrong kind fail the whole call.
    pub fn transform(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<Vec<f64>>> {
        let state = self.state()?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                state
                    .columns
                    .iter()
                    .map(|column| {
                        let value = row
                            .iter()
                            .find(|(name, _)| *name == column.as_str())
                            .map(|(_, value)| value)
                            .ok_or_else(|| {
                                ScoringError::Validation(format!(
                                    "row {}: missing feature column `{}`",
                                    index, column
                                ))
                            })?;
                        match (state.mappings.get(column), value) {
                            (Some(mapping), FeatureValue::Category(v)) => Ok(mapping.code(v) as f64),
                            (None, FeatureValue::Numeric(x)) => Ok(*x),
                            _ => Err(kind_mismatch(index, column)),
                        }
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect()
    }

    /// Fitted column order
    pub fn feature_names(&self) -> Result<&[String]> {
        Ok(&self.state()?.columns)
    }

    /// Fitted mapping of a categorical column
    pub fn mapping(&self, column: &str) -> Option<&CategoryMapping> {
        self.fitted.as_ref()?.mappings.get(column)
    }
}

fn first_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.find(|name| !seen.insert(*name))
}

fn kind_mismatch(index: usize, column: &str) -> ScoringError {
    ScoringError::Validation(format!(
        "row {}: column `{}` has the wrong value kind",
        index, column
    ))
}
