//! Prize catalog — the ordered table of winnable prizes.
//!
//! The catalog holds only real prizes. The no-win sentinel (id 0) is a
//! constant with unlimited availability and is never stored, mutated or
//! decremented; it is returned whenever no real prize qualifies.

use crate::{
    error::{EngineError, EngineResult},
    types::{Amount, PrizeId},
};
use serde::{Deserialize, Serialize};

/// Reserved id of the no-win sentinel.
pub const NO_WIN_ID: PrizeId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: PrizeId,
    pub value: Amount,
    pub label: String,
    pub message: String,
    pub color: String,
    pub quantity: u64,
}

impl Prize {
    pub fn is_no_win(&self) -> bool {
        self.id == NO_WIN_ID
    }
}

/// The zero-value outcome returned when no real prize qualifies.
pub fn no_win() -> Prize {
    Prize {
        id: NO_WIN_ID,
        value: 0,
        label: "Better luck next time".to_string(),
        message: "Better luck next time!".to_string(),
        color: "#95A5A6".to_string(),
        quantity: 0,
    }
}

/// Partial field set for catalog updates. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeUpdate {
    pub value: Option<Amount>,
    pub label: Option<String>,
    pub message: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<u64>,
}

impl PrizeUpdate {
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.label.is_none()
            && self.message.is_none()
            && self.color.is_none()
            && self.quantity.is_none()
    }
}

/// Ordered prize collection. Order is configuration order and is stable
/// for the lifetime of the catalog; the wheel and the selection walk
/// both depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrizeCatalog {
    prizes: Vec<Prize>,
}

impl PrizeCatalog {
    pub fn new(prizes: Vec<Prize>) -> Self {
        Self { prizes }
    }

    pub fn list(&self) -> &[Prize] {
        &self.prizes
    }

    /// Prizes still in stock, in catalog order.
    pub fn available(&self) -> Vec<&Prize> {
        self.prizes.iter().filter(|p| p.quantity > 0).collect()
    }

    pub fn get(&self, id: PrizeId) -> Option<&Prize> {
        self.prizes.iter().find(|p| p.id == id)
    }

    /// Merge partial fields into the matching prize.
    pub fn apply(&mut self, id: PrizeId, update: &PrizeUpdate) -> EngineResult<()> {
        let prize = self
            .prizes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(EngineError::PrizeNotFound { id })?;

        if let Some(value) = update.value {
            prize.value = value;
        }
        if let Some(label) = &update.label {
            prize.label = label.clone();
        }
        if let Some(message) = &update.message {
            prize.message = message.clone();
        }
        if let Some(color) = &update.color {
            prize.color = color.clone();
        }
        if let Some(quantity) = update.quantity {
            prize.quantity = quantity;
        }
        Ok(())
    }

    /// Take one unit of stock. Returns false if the prize is unknown or
    /// already exhausted — quantities never go below zero.
    pub(crate) fn decrement(&mut self, id: PrizeId) -> bool {
        match self.prizes.iter_mut().find(|p| p.id == id) {
            Some(p) if p.quantity > 0 => {
                p.quantity -= 1;
                true
            }
            _ => false,
        }
    }

    /// Σ value × quantity over the whole catalog — the configuration-time
    /// budget check input.
    pub fn total_configured_value(&self) -> Amount {
        self.prizes.iter().map(|p| p.value * p.quantity).sum()
    }
}
