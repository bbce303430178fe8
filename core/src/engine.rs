//! The allocation engine — owns prize inventory, budget accounting,
//! spin history and the fairness gate, and commits every spin as one
//! unit.
//!
//! SPIN SEQUENCE (fixed, never reordered):
//!   1. Re-entrancy check — a previous call that aborted mid-apply
//!      poisons the engine rather than exposing partial state.
//!   2. Advance the spin number (and the cooldown counter, when that
//!      gate is active).
//!   3. Select: schedule override first, else the cooldown-filtered
//!      weighted draw.
//!   4. Apply: decrement stock and charge the ledger on a win; append a
//!      history record and settle gate state on every spin.
//!   5. Persist every touched slice.
//!
//! The outcome is decided and committed at call time. Any wheel
//! animation downstream is playback of an already-decided result.

use crate::{
    config::{EngineConfig, FairnessMode},
    error::{EngineError, EngineResult},
    fairness::{CooldownCondition, CooldownGate, FairnessGate, SpinSchedule},
    history::{SpinHistory, SpinRecord},
    ledger::BudgetLedger,
    policy,
    prize::{self, Prize, PrizeCatalog, PrizeUpdate},
    rng::SpinRng,
    store::{keys, StateStore},
    types::{Amount, PrizeId, SpinNumber},
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

pub struct SpinEngine {
    config: EngineConfig,
    catalog: PrizeCatalog,
    ledger: BudgetLedger,
    history: SpinHistory,
    gate: FairnessGate,
    spin_number: SpinNumber,
    rng: SpinRng,
    store: Box<dyn StateStore>,
    in_flight: bool,
}

/// The committed result of one spin.
#[derive(Debug, Clone)]
pub struct SpinOutcome {
    pub prize: Prize,
    pub spin_number: SpinNumber,
    /// False when a storage write failed. The in-memory state is still
    /// committed; it just may not survive a restart.
    pub persisted: bool,
}

impl SpinEngine {
    /// Build an engine over an injected store, restoring every persisted
    /// state slice or seeding it from `config` defaults.
    pub fn load(
        store: Box<dyn StateStore>,
        config: EngineConfig,
        seed: u64,
    ) -> EngineResult<Self> {
        config.validate()?;

        let catalog = PrizeCatalog::new(
            read_slice(store.as_ref(), keys::PRIZES)?.unwrap_or_else(|| config.prizes.clone()),
        );
        let total: Amount =
            read_slice(store.as_ref(), keys::TOTAL_BUDGET)?.unwrap_or(config.total_budget);
        let spent: Amount = read_slice(store.as_ref(), keys::SPENT_AMOUNT)?.unwrap_or(0);
        let ledger = BudgetLedger::restore(total, spent);
        let history =
            SpinHistory::new(read_slice(store.as_ref(), keys::SPIN_HISTORY)?.unwrap_or_default());

        let (gate, spin_number) = match &config.fairness {
            FairnessMode::Schedule => {
                let entries: BTreeMap<SpinNumber, PrizeId> =
                    read_slice(store.as_ref(), keys::SCHEDULED_SPINS)?.unwrap_or_default();
                let n: SpinNumber =
                    read_slice(store.as_ref(), keys::CURRENT_SPIN_NUMBER)?.unwrap_or(0);
                (FairnessGate::Schedule(SpinSchedule::restore(entries)), n)
            }
            FairnessMode::Cooldown { condition } => {
                let stored: CooldownCondition =
                    read_slice(store.as_ref(), keys::HIGH_VALUE_CONDITION)?
                        .unwrap_or_else(|| condition.clone());
                let counter: u64 =
                    read_slice(store.as_ref(), keys::HIGH_VALUE_SPIN_COUNT)?.unwrap_or(0);
                // The spin number is not its own slice in this variant;
                // every spin leaves a history record, so recount.
                let n = history.len() as SpinNumber;
                (
                    FairnessGate::Cooldown(CooldownGate::restore(stored, counter)),
                    n,
                )
            }
        };

        log::info!(
            "engine: loaded prizes={} spins={} spent={} remaining={}",
            catalog.list().len(),
            spin_number,
            ledger.spent(),
            ledger.remaining()
        );

        let mut engine = Self {
            config,
            catalog,
            ledger,
            history,
            gate,
            spin_number,
            rng: SpinRng::seed_from_u64(seed),
            store,
            in_flight: false,
        };

        // A restored schedule may hold entries the restored catalog can
        // no longer honor.
        let pruned = match &mut engine.gate {
            FairnessGate::Schedule(sched) => sched
                .cleanup(&engine.catalog, engine.spin_number)
                .then(|| sched.entries().clone()),
            FairnessGate::Cooldown(_) => None,
        };
        if let Some(entries) = pruned {
            engine.persist_slice(keys::SCHEDULED_SPINS, &entries)?;
        }

        Ok(engine)
    }

    // ── Spin path ──────────────────────────────────────────────────

    /// Execute one spin: select, apply, persist. Always yields a definite
    /// outcome; an empty or unaffordable catalog degrades to the no-win
    /// result rather than erroring.
    pub fn spin(&mut self) -> EngineResult<SpinOutcome> {
        if self.in_flight {
            return Err(EngineError::SpinInFlight);
        }
        self.in_flight = true;

        let spin_number = self.spin_number + 1;

        // The cooldown counter ticks on every spin, before the candidate
        // filter consults it.
        if let FairnessGate::Cooldown(gate) = &mut self.gate {
            gate.advance();
        }

        let prize = self.select(spin_number);
        let won = !prize.is_no_win();

        self.spin_number = spin_number;
        if won {
            let decremented = self.catalog.decrement(prize.id);
            debug_assert!(decremented, "selected prize must have stock");
            // Selection only offers affordable prizes; a failure here is
            // a broken invariant and poisons the engine via in_flight.
            self.ledger.charge(prize.value)?;
        }

        if let FairnessGate::Schedule(sched) = &mut self.gate {
            sched.consume(spin_number);
            sched.cleanup(&self.catalog, spin_number);
        }

        self.history.record(SpinRecord {
            timestamp: Utc::now(),
            prize: prize.label.clone(),
            amount: prize.value,
            spin_number,
        });

        let persisted = self.persist_after_spin(won);
        self.in_flight = false;

        if won {
            log::info!(
                "spin={spin_number} outcome: {} ({}), remaining={}",
                prize.label,
                prize.value,
                self.ledger.remaining()
            );
        } else {
            log::info!("spin={spin_number} outcome: no win");
        }

        Ok(SpinOutcome {
            prize,
            spin_number,
            persisted,
        })
    }

    /// Pick the outcome for `spin_number`. Only the RNG stream advances;
    /// applying the consequence is the caller's job.
    fn select(&mut self, spin_number: SpinNumber) -> Prize {
        let remaining = self.ledger.remaining();

        // A scheduled outcome is a hard override, honored exactly as
        // long as it is still deliverable.
        if let FairnessGate::Schedule(sched) = &self.gate {
            if let Some(id) = sched.forced_for(spin_number) {
                match self.catalog.get(id) {
                    Some(p) if p.quantity > 0 && p.value <= remaining => {
                        log::debug!("spin={spin_number} select: scheduled {} honored", p.label);
                        return p.clone();
                    }
                    _ => {
                        log::warn!(
                            "spin={spin_number} select: scheduled prize {id} no longer deliverable"
                        );
                    }
                }
            }
        }

        let candidates: Vec<&Prize> = self
            .catalog
            .available()
            .into_iter()
            .filter(|p| match &self.gate {
                FairnessGate::Cooldown(gate) => !gate.blocks(p.value),
                FairnessGate::Schedule(_) => true,
            })
            .collect();

        match policy::select_weighted(&candidates, remaining, &mut self.rng) {
            Some(p) => p.clone(),
            None => prize::no_win(),
        }
    }

    // ── Administrative mutations ───────────────────────────────────

    /// Merge partial fields into a prize. Atomic accept-or-reject: the
    /// post-update catalog must stay within the total budget, and the
    /// whole update is refused otherwise with the computed totals in the
    /// error. An empty field set is a no-op.
    pub fn update_prize(&mut self, id: PrizeId, update: &PrizeUpdate) -> EngineResult<()> {
        let prize = self
            .catalog
            .get(id)
            .ok_or(EngineError::PrizeNotFound { id })?;

        let new_value = update.value.unwrap_or(prize.value);
        let new_quantity = update.quantity.unwrap_or(prize.quantity);
        if new_value == 0 {
            return Err(EngineError::Other(anyhow::anyhow!(
                "prize value must be positive"
            )));
        }

        let configured = self.catalog.total_configured_value() - prize.value * prize.quantity
            + new_value * new_quantity;
        if configured > self.ledger.total() {
            return Err(EngineError::BudgetExceeded {
                required: configured,
                available: self.ledger.total(),
            });
        }

        let quantity_changed = new_quantity != prize.quantity;
        self.catalog.apply(id, update)?;

        // A quantity drop can strand scheduled entries.
        if quantity_changed {
            let pruned = match &mut self.gate {
                FairnessGate::Schedule(sched) => sched
                    .cleanup(&self.catalog, self.spin_number)
                    .then(|| sched.entries().clone()),
                FairnessGate::Cooldown(_) => None,
            };
            if let Some(entries) = pruned {
                self.persist_slice(keys::SCHEDULED_SPINS, &entries)?;
            }
        }

        self.persist_slice(keys::PRIZES, &self.catalog)?;
        log::debug!("update: prize {id} merged, configured total {configured}");
        Ok(())
    }

    /// Restore everything to configuration defaults and clear the store.
    /// Irreversible.
    pub fn reset(&mut self) -> EngineResult<()> {
        self.catalog = PrizeCatalog::new(self.config.prizes.clone());
        self.ledger = BudgetLedger::new(self.config.total_budget);
        self.history.clear();
        self.spin_number = 0;
        self.gate = match &self.config.fairness {
            FairnessMode::Schedule => FairnessGate::Schedule(SpinSchedule::default()),
            FairnessMode::Cooldown { condition } => {
                FairnessGate::Cooldown(CooldownGate::new(condition.clone()))
            }
        };
        self.in_flight = false;
        self.store.clear()?;
        log::info!("engine: reset to defaults");
        Ok(())
    }

    // ── Schedule gate operations ───────────────────────────────────

    /// Force a future spin to a prize. Rejected with a reason and no
    /// state change when the slot is in the past or occupied, or the
    /// prize cannot cover one more pending entry.
    pub fn schedule_spin(&mut self, spin_number: SpinNumber, id: PrizeId) -> EngineResult<()> {
        let prize = self
            .catalog
            .get(id)
            .ok_or(EngineError::PrizeNotFound { id })?
            .clone();
        let current = self.spin_number;
        let remaining = self.ledger.remaining();

        let FairnessGate::Schedule(sched) = &mut self.gate else {
            return Err(EngineError::ScheduleUnavailable);
        };

        let reject = |reason: &str| EngineError::InvalidScheduleEntry {
            spin_number,
            reason: reason.to_string(),
        };
        if spin_number <= current {
            return Err(reject("spin number already passed"));
        }
        if sched.forced_for(spin_number).is_some() {
            return Err(reject("spin number already scheduled"));
        }
        if sched.pending_for(id) as u64 >= prize.quantity {
            return Err(reject("exceeds remaining quantity for that prize"));
        }
        // Spent only grows, so an entry unaffordable now stays that way.
        if prize.value > remaining {
            return Err(reject("prize value exceeds remaining budget"));
        }

        sched.insert(spin_number, id);
        let entries = sched.entries().clone();
        self.persist_slice(keys::SCHEDULED_SPINS, &entries)?;
        log::info!("schedule: spin {spin_number} -> prize {id}");
        Ok(())
    }

    /// Remove a scheduled entry. Idempotent.
    pub fn unschedule_spin(&mut self, spin_number: SpinNumber) -> EngineResult<()> {
        let FairnessGate::Schedule(sched) = &mut self.gate else {
            return Err(EngineError::ScheduleUnavailable);
        };
        if sched.remove(spin_number) {
            let entries = sched.entries().clone();
            self.persist_slice(keys::SCHEDULED_SPINS, &entries)?;
        }
        Ok(())
    }

    pub fn scheduled_spins(&self) -> EngineResult<&BTreeMap<SpinNumber, PrizeId>> {
        self.gate
            .schedule()
            .map(SpinSchedule::entries)
            .ok_or(EngineError::ScheduleUnavailable)
    }

    // ── Cooldown gate operations ───────────────────────────────────

    pub fn cooldown(&self) -> EngineResult<&CooldownCondition> {
        self.gate
            .cooldown()
            .map(CooldownGate::condition)
            .ok_or(EngineError::CooldownUnavailable)
    }

    pub fn cooldown_spin_count(&self) -> EngineResult<u64> {
        self.gate
            .cooldown()
            .map(CooldownGate::counter)
            .ok_or(EngineError::CooldownUnavailable)
    }

    /// Replace the cooldown parameters. The window counter carries over.
    pub fn set_cooldown(&mut self, condition: CooldownCondition) -> EngineResult<()> {
        if condition.min_spins > condition.max_spins {
            return Err(EngineError::Other(anyhow::anyhow!(
                "cooldown minSpins {} exceeds maxSpins {}",
                condition.min_spins,
                condition.max_spins
            )));
        }
        let FairnessGate::Cooldown(gate) = &mut self.gate else {
            return Err(EngineError::CooldownUnavailable);
        };
        gate.set_condition(condition.clone());
        self.persist_slice(keys::HIGH_VALUE_CONDITION, &condition)?;
        Ok(())
    }

    // ── Query accessors ────────────────────────────────────────────

    pub fn prizes(&self) -> &[Prize] {
        self.catalog.list()
    }

    pub fn available_prizes(&self) -> Vec<&Prize> {
        self.catalog.available()
    }

    /// The ordered item list a wheel component renders: every in-stock
    /// prize plus the no-win slot at the end.
    pub fn wheel_display(&self) -> Vec<Prize> {
        let mut items: Vec<Prize> = self.catalog.available().into_iter().cloned().collect();
        items.push(prize::no_win());
        items
    }

    pub fn total_budget(&self) -> Amount {
        self.ledger.total()
    }

    pub fn spent_amount(&self) -> Amount {
        self.ledger.spent()
    }

    pub fn remaining_budget(&self) -> Amount {
        self.ledger.remaining()
    }

    /// Σ value × quantity across the catalog, the figure a settings
    /// surface shows next to the total budget.
    pub fn configured_prize_value(&self) -> Amount {
        self.catalog.total_configured_value()
    }

    pub fn history(&self) -> &[SpinRecord] {
        self.history.records()
    }

    pub fn current_spin_number(&self) -> SpinNumber {
        self.spin_number
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Write the slices a spin touched. Storage failures do not roll
    /// back the committed in-memory state; they are logged and reported
    /// through [`SpinOutcome::persisted`].
    fn persist_after_spin(&self, won: bool) -> bool {
        let mut slices: Vec<(&str, EngineResult<String>)> =
            vec![(keys::SPIN_HISTORY, to_json(&self.history))];
        if won {
            slices.push((keys::PRIZES, to_json(&self.catalog)));
            slices.push((keys::SPENT_AMOUNT, to_json(&self.ledger.spent())));
        }
        match &self.gate {
            FairnessGate::Schedule(sched) => {
                slices.push((keys::CURRENT_SPIN_NUMBER, to_json(&self.spin_number)));
                slices.push((keys::SCHEDULED_SPINS, to_json(sched.entries())));
            }
            FairnessGate::Cooldown(gate) => {
                slices.push((keys::HIGH_VALUE_SPIN_COUNT, to_json(&gate.counter())));
            }
        }
        // Kept fresh so a new store round-trips the full layout.
        slices.push((keys::TOTAL_BUDGET, to_json(&self.ledger.total())));

        let mut ok = true;
        for (key, json) in slices {
            if let Err(e) = json.and_then(|j| self.store.set(key, &j)) {
                log::error!("persist: {key} failed: {e}");
                ok = false;
            }
        }
        ok
    }

    fn persist_slice<T: Serialize>(&self, key: &str, value: &T) -> EngineResult<()> {
        self.store.set(key, &serde_json::to_string(value)?)
    }
}

fn to_json<T: Serialize>(value: &T) -> EngineResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn read_slice<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> EngineResult<Option<T>> {
    match store.get(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
