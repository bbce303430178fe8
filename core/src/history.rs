//! Spin history — append-only ledger of past outcomes, newest first.

use crate::types::{Amount, SpinNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One past outcome, wins and non-wins alike. The timestamp is purely
/// informational and never feeds back into selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinRecord {
    pub timestamp: DateTime<Utc>,
    /// Label of the prize at the time it was won.
    pub prize: String,
    /// 0 for the no-win outcome.
    pub amount: Amount,
    pub spin_number: SpinNumber,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpinHistory {
    records: Vec<SpinRecord>,
}

impl SpinHistory {
    pub fn new(records: Vec<SpinRecord>) -> Self {
        Self { records }
    }

    /// Append a record at the front. Records are never mutated or deleted
    /// except by a full reset.
    pub fn record(&mut self, record: SpinRecord) {
        self.records.insert(0, record);
    }

    /// Newest first.
    pub fn records(&self) -> &[SpinRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Σ amount across all records. Must reconcile with the ledger's
    /// spent figure at all times.
    pub fn total_won(&self) -> Amount {
        self.records.iter().map(|r| r.amount).sum()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
