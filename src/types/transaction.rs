//! Transaction data structures submitted for fraud scoring

use crate::encoder::{FeatureRow, FeatureValue};
use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned when the top-level payload is not a list of transactions
pub const EXPECTED_ARRAY_MESSAGE: &str = "Expected a JSON array of transaction dictionaries";

/// Kind of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CashIn,
    CashOut,
    Debit,
    Payment,
    Transfer,
}

impl TransactionType {
    /// Wire name, also the categorical value seen by the encoder
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashIn => "CASH_IN",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Debit => "DEBIT",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single financial movement to be scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Sequence index of the simulation step (one step = one hour)
    pub step: u64,

    /// Transaction kind
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Amount moved
    pub amount: f64,

    /// Origin balance before the transaction
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_orig: f64,

    /// Origin balance after the transaction
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: f64,

    /// Destination balance before the transaction
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: f64,

    /// Destination balance after the transaction
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: f64,

    /// Origin account identifier, never used as a feature
    #[serde(rename = "nameOrig", default, skip_serializing_if = "Option::is_none")]
    pub name_orig: Option<String>,

    /// Destination account identifier, never used as a feature
    #[serde(rename = "nameDest", default, skip_serializing_if = "Option::is_none")]
    pub name_dest: Option<String>,
}

impl TransactionRecord {
    /// Feature columns in the order they are presented to the encoder.
    /// Identifiers are not part of this list.
    pub const FEATURE_COLUMNS: [&'static str; 7] = [
        "step",
        "type",
        "amount",
        "oldbalanceOrg",
        "newbalanceOrig",
        "oldbalanceDest",
        "newbalanceDest",
    ];

    /// Categorical feature columns
    pub const CATEGORICAL_COLUMNS: [&'static str; 1] = ["type"];

    /// Create a record without identifiers
    pub fn new(
        step: u64,
        kind: TransactionType,
        amount: f64,
        balances_orig: (f64, f64),
        balances_dest: (f64, f64),
    ) -> Self {
        Self {
            step,
            kind,
            amount,
            old_balance_orig: balances_orig.0,
            new_balance_orig: balances_orig.1,
            old_balance_dest: balances_dest.0,
            new_balance_dest: balances_dest.1,
            name_orig: None,
            name_dest: None,
        }
    }

    /// Attach account identifiers
    pub fn with_names(mut self, name_orig: &str, name_dest: &str) -> Self {
        self.name_orig = Some(name_orig.to_string());
        self.name_dest = Some(name_dest.to_string());
        self
    }

    /// Check value constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let numeric = [
            ("amount", self.amount),
            ("oldbalanceOrg", self.old_balance_orig),
            ("newbalanceOrig", self.new_balance_orig),
            ("oldbalanceDest", self.old_balance_dest),
            ("newbalanceDest", self.new_balance_dest),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(ScoringError::Validation(format!(
                    "field `{}` must be a finite number",
                    field
                )));
            }
        }
        if self.amount < 0.0 {
            return Err(ScoringError::Validation(format!(
                "field `amount` must be non-negative, got {}",
                self.amount
            )));
        }
        Ok(())
    }

    /// Feature view of this record with identifiers dropped
    pub fn feature_row(&self) -> FeatureRow<'_> {
        vec![
            ("step", FeatureValue::Numeric(self.step as f64)),
            ("type", FeatureValue::Category(self.kind.as_str())),
            ("amount", FeatureValue::Numeric(self.amount)),
            ("oldbalanceOrg", FeatureValue::Numeric(self.old_balance_orig)),
            ("newbalanceOrig", FeatureValue::Numeric(self.new_balance_orig)),
            ("oldbalanceDest", FeatureValue::Numeric(self.old_balance_dest)),
            ("newbalanceDest", FeatureValue::Numeric(self.new_balance_dest)),
        ]
    }

    /// Parse and validate a whole request payload.
    ///
    /// The payload must be a JSON array; the first malformed row fails the
    /// entire batch and the error names its index.
    pub fn parse_batch(payload: &serde_json::Value) -> Result<Vec<Self>> {
        let rows = payload
            .as_array()
            .ok_or_else(|| ScoringError::Validation(EXPECTED_ARRAY_MESSAGE.to_string()))?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                if !row.is_object() {
                    return Err(ScoringError::Validation(format!(
                        "row {}: expected a transaction object",
                        index
                    )));
                }
                let record = Self::deserialize(row).map_err(|e| {
                    ScoringError::Validation(format!("row {}: {}", index, e))
                })?;
                record
                    .validate()
                    .map_err(|e| ScoringError::Validation(format!("row {}: {}", index, e)))?;
                Ok(record)
            })
            .collect()
    }
}
