//! Fairness gate — restricts or overrides candidate selection
//! independent of raw weighting.
//!
//! Two alternative policies exist, selected by configuration; exactly
//! one is active per engine:
//!   - [`SpinSchedule`]: forces specific future spin numbers to specific
//!     prize outcomes. A hard override checked before the weighted draw.
//!   - [`CooldownGate`]: suppresses designated high-value prizes from the
//!     weighted candidate set until a spin-count threshold is met, then
//!     the window restarts.

use crate::{
    prize::PrizeCatalog,
    types::{Amount, PrizeId, SpinNumber},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum FairnessGate {
    Schedule(SpinSchedule),
    Cooldown(CooldownGate),
}

impl FairnessGate {
    pub fn schedule(&self) -> Option<&SpinSchedule> {
        match self {
            Self::Schedule(s) => Some(s),
            Self::Cooldown(_) => None,
        }
    }

    pub fn cooldown(&self) -> Option<&CooldownGate> {
        match self {
            Self::Schedule(_) => None,
            Self::Cooldown(c) => Some(c),
        }
    }
}

// ── Schedule variant ───────────────────────────────────────────────

/// Mapping from future spin number to forced prize id. Entries are
/// consumed when their spin number is reached and pruned when stale or
/// no longer covered by the target prize's stock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpinSchedule {
    entries: BTreeMap<SpinNumber, PrizeId>,
}

impl SpinSchedule {
    pub fn restore(entries: BTreeMap<SpinNumber, PrizeId>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<SpinNumber, PrizeId> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forced prize for a spin number, if one is scheduled. Deliverability
    /// (stock, affordability) is the caller's check.
    pub fn forced_for(&self, spin_number: SpinNumber) -> Option<PrizeId> {
        self.entries.get(&spin_number).copied()
    }

    /// Number of pending entries targeting a prize.
    pub fn pending_for(&self, id: PrizeId) -> usize {
        self.entries.values().filter(|&&p| p == id).count()
    }

    pub(crate) fn insert(&mut self, spin_number: SpinNumber, id: PrizeId) {
        self.entries.insert(spin_number, id);
    }

    /// Remove an entry. Idempotent.
    pub(crate) fn remove(&mut self, spin_number: SpinNumber) -> bool {
        self.entries.remove(&spin_number).is_some()
    }

    /// Drop the entry for a spin number that has just executed.
    pub(crate) fn consume(&mut self, spin_number: SpinNumber) {
        self.entries.remove(&spin_number);
    }

    /// Prune entries that can no longer be honored. Runs whenever catalog
    /// quantities or the current spin number change.
    ///
    /// Drops entries whose spin number is ≤ current, then for each prize
    /// drops excess entries beyond its remaining quantity, keeping the
    /// smallest spin numbers. Returns true if anything was removed.
    pub(crate) fn cleanup(&mut self, catalog: &PrizeCatalog, current: SpinNumber) -> bool {
        let before = self.entries.len();

        self.entries.retain(|&n, _| n > current);

        for prize in catalog.list() {
            // Ascending BTreeMap order, so this is already earliest-first.
            let pending: Vec<SpinNumber> = self
                .entries
                .iter()
                .filter(|(_, &id)| id == prize.id)
                .map(|(&n, _)| n)
                .collect();
            if pending.len() as u64 > prize.quantity {
                for n in &pending[prize.quantity as usize..] {
                    self.entries.remove(n);
                }
            }
        }

        self.entries.len() != before
    }
}

// ── Cooldown variant ───────────────────────────────────────────────

/// Administrative parameters of the cooldown gate, persisted as one
/// JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownCondition {
    pub enabled: bool,
    /// Spins that must elapse in the window before restricted prizes
    /// become eligible.
    pub min_spins: u64,
    /// Window length; reaching it restarts the gating window.
    pub max_spins: u64,
    /// Prize values (not ids) excluded during the cooldown phase.
    pub restricted_prizes: Vec<Amount>,
}

impl Default for CooldownCondition {
    fn default() -> Self {
        Self {
            enabled: false,
            min_spins: 10,
            max_spins: 20,
            restricted_prizes: vec![500_000],
        }
    }
}

/// Count-based suppression window. The counter advances once per spin,
/// wins and non-wins alike, and wraps at `max_spins`.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    condition: CooldownCondition,
    counter: u64,
}

impl CooldownGate {
    pub fn new(condition: CooldownCondition) -> Self {
        Self {
            condition,
            counter: 0,
        }
    }

    pub fn restore(condition: CooldownCondition, counter: u64) -> Self {
        Self { condition, counter }
    }

    pub fn condition(&self) -> &CooldownCondition {
        &self.condition
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Whether a prize of this value is currently excluded from the
    /// weighted candidate set.
    pub fn blocks(&self, value: Amount) -> bool {
        self.condition.enabled
            && self.counter < self.condition.min_spins
            && self.condition.restricted_prizes.contains(&value)
    }

    /// Advance the per-spin counter; called at the start of every spin,
    /// before the candidate filter consults the gate.
    pub(crate) fn advance(&mut self) {
        self.counter += 1;
        if self.counter >= self.condition.max_spins {
            self.counter = 0;
        }
    }

    pub(crate) fn set_condition(&mut self, condition: CooldownCondition) {
        self.condition = condition;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prize::{Prize, PrizeCatalog};

    fn prize(id: PrizeId, value: Amount, quantity: u64) -> Prize {
        Prize {
            id,
            value,
            label: format!("P{id}"),
            message: String::new(),
            color: "#000000".to_string(),
            quantity,
        }
    }

    #[test]
    fn cleanup_keeps_earliest_entries_on_quantity_drop() {
        let catalog = PrizeCatalog::new(vec![prize(1, 100, 1)]);
        let mut sched = SpinSchedule::default();
        sched.insert(5, 1);
        sched.insert(12, 1);
        sched.insert(8, 1);

        assert!(sched.cleanup(&catalog, 0));
        assert_eq!(sched.entries().len(), 1);
        assert_eq!(sched.forced_for(5), Some(1));
    }

    #[test]
    fn cleanup_drops_stale_spin_numbers() {
        let catalog = PrizeCatalog::new(vec![prize(1, 100, 5)]);
        let mut sched = SpinSchedule::default();
        sched.insert(2, 1);
        sched.insert(9, 1);

        assert!(sched.cleanup(&catalog, 3));
        assert_eq!(sched.forced_for(2), None);
        assert_eq!(sched.forced_for(9), Some(1));
    }

    #[test]
    fn cooldown_counter_wraps_at_max() {
        let mut gate = CooldownGate::new(CooldownCondition {
            enabled: true,
            min_spins: 2,
            max_spins: 4,
            restricted_prizes: vec![500],
        });
        assert!(gate.blocks(500));
        gate.advance(); // 1
        assert!(gate.blocks(500));
        gate.advance(); // 2
        assert!(!gate.blocks(500));
        gate.advance(); // 3
        gate.advance(); // 4 -> wraps to 0
        assert!(gate.blocks(500));
    }

    #[test]
    fn disabled_gate_blocks_nothing() {
        let gate = CooldownGate::new(CooldownCondition {
            enabled: false,
            ..CooldownCondition::default()
        });
        assert!(!gate.blocks(500_000));
    }
}
