//! Engine configuration — prize table, total budget, fairness variant.
//!
//! The compiled-in default is the standard promotion setup: a 7-tier
//! prize table under a 20,000,000 budget, with the schedule gate
//! active. A JSON file can replace it.

use crate::{
    error::{EngineError, EngineResult},
    fairness::CooldownCondition,
    prize::{Prize, NO_WIN_ID},
    types::Amount,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_TOTAL_BUDGET: Amount = 20_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub total_budget: Amount,
    pub prizes: Vec<Prize>,
    #[serde(default)]
    pub fairness: FairnessMode,
}

/// Which fairness gate the engine runs. Exactly one is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FairnessMode {
    #[default]
    Schedule,
    Cooldown {
        #[serde(default)]
        condition: CooldownCondition,
    },
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            total_budget: DEFAULT_TOTAL_BUDGET,
            prizes: default_prizes(),
            fairness: FairnessMode::Schedule,
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would violate engine invariants:
    /// duplicate or reserved prize ids, zero-value prizes, or a prize
    /// table worth more than the budget.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for prize in &self.prizes {
            if prize.id == NO_WIN_ID {
                return Err(EngineError::Other(anyhow::anyhow!(
                    "prize id 0 is reserved for the no-win outcome"
                )));
            }
            if !seen.insert(prize.id) {
                return Err(EngineError::Other(anyhow::anyhow!(
                    "duplicate prize id {}",
                    prize.id
                )));
            }
            if prize.value == 0 {
                return Err(EngineError::Other(anyhow::anyhow!(
                    "prize {} has zero value",
                    prize.id
                )));
            }
        }

        let configured: Amount = self.prizes.iter().map(|p| p.value * p.quantity).sum();
        if configured > self.total_budget {
            return Err(EngineError::BudgetExceeded {
                required: configured,
                available: self.total_budget,
            });
        }

        if let FairnessMode::Cooldown { condition } = &self.fairness {
            if condition.min_spins > condition.max_spins {
                return Err(EngineError::Other(anyhow::anyhow!(
                    "cooldown minSpins {} exceeds maxSpins {}",
                    condition.min_spins,
                    condition.max_spins
                )));
            }
        }

        Ok(())
    }
}

fn tier(id: u32, value: Amount, label: &str, quantity: u64, color: &str) -> Prize {
    Prize {
        id,
        value,
        label: label.to_string(),
        message: format!("Congratulations! You won {label}!"),
        color: color.to_string(),
        quantity,
    }
}

/// The 7-tier default table. Σ value × quantity is 8,850,000, leaving
/// the rest of the budget as headroom for quantity increases.
pub fn default_prizes() -> Vec<Prize> {
    vec![
        tier(1, 500_000, "500K", 1, "#FFD700"),
        tier(2, 400_000, "400K", 2, "#FF6347"),
        tier(3, 300_000, "300K", 3, "#FF69B4"),
        tier(4, 250_000, "250K", 5, "#9370DB"),
        tier(5, 200_000, "200K", 8, "#4169E1"),
        tier(6, 150_000, "150K", 12, "#32CD32"),
        tier(7, 100_000, "100K", 20, "#00CED1"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_within_budget() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        let configured: Amount = config.prizes.iter().map(|p| p.value * p.quantity).sum();
        assert_eq!(configured, 8_850_000);
        assert!(configured <= DEFAULT_TOTAL_BUDGET);
    }

    #[test]
    fn over_budget_table_is_rejected() {
        let mut config = EngineConfig::default();
        config.total_budget = 1_000_000;
        assert!(matches!(
            config.validate(),
            Err(EngineError::BudgetExceeded { .. })
        ));
    }

    #[test]
    fn reserved_id_is_rejected() {
        let mut config = EngineConfig::default();
        config.prizes[0].id = NO_WIN_ID;
        assert!(config.validate().is_err());
    }
}
