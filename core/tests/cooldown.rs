//! Cooldown gate: restricted high-value prizes stay out of the draw
//! until the spin-count threshold is met, and the window restarts at its
//! upper bound.

use luckyspin_core::{
    config::{EngineConfig, FairnessMode},
    engine::SpinEngine,
    error::EngineError,
    fairness::CooldownCondition,
    prize::{Prize, NO_WIN_ID},
    store::SqliteStore,
    types::Amount,
};

fn prize(id: u32, value: Amount, label: &str, quantity: u64) -> Prize {
    Prize {
        id,
        value,
        label: label.to_string(),
        message: format!("You won {label}!"),
        color: "#FFFFFF".to_string(),
        quantity,
    }
}

fn cooldown_engine(condition: CooldownCondition, prizes: Vec<Prize>, budget: Amount, seed: u64) -> SpinEngine {
    let config = EngineConfig {
        total_budget: budget,
        prizes,
        fairness: FairnessMode::Cooldown { condition },
    };
    let store = SqliteStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    SpinEngine::load(Box::new(store), config, seed).expect("engine load")
}

/// With min_spins = 10 the 500K prize is untouchable for spins 1–9 even
/// when it is the only in-stock, affordable candidate. Spin 10 may — and
/// here, must — return it.
#[test]
fn restricted_prize_suppressed_until_min_spins() {
    let condition = CooldownCondition {
        enabled: true,
        min_spins: 10,
        max_spins: 1_000,
        restricted_prizes: vec![500_000],
    };
    let mut engine = cooldown_engine(condition, vec![prize(1, 500_000, "500K", 1)], 500_000, 3);

    for n in 1..=9u64 {
        let outcome = engine.spin().expect("spin").prize;
        assert_eq!(
            outcome.id, NO_WIN_ID,
            "spin {n} must not release the restricted prize"
        );
    }
    let tenth = engine.spin().expect("spin").prize;
    assert_eq!(tenth.id, 1, "spin 10 must release the restricted prize");
}

#[test]
fn counter_advances_every_spin_and_wraps_at_max() {
    let condition = CooldownCondition {
        enabled: true,
        min_spins: 2,
        max_spins: 3,
        restricted_prizes: vec![500_000],
    };
    // No stock at all: every spin is a no-win, but the window still turns.
    let mut engine = cooldown_engine(condition, vec![prize(1, 500_000, "500K", 0)], 500_000, 4);

    let expected = [1, 2, 0, 1, 2, 0];
    for want in expected {
        engine.spin().expect("spin");
        assert_eq!(engine.cooldown_spin_count().unwrap(), want);
    }
}

#[test]
fn disabled_gate_filters_nothing() {
    let condition = CooldownCondition {
        enabled: false,
        min_spins: 10,
        max_spins: 20,
        restricted_prizes: vec![500_000],
    };
    let mut engine = cooldown_engine(condition, vec![prize(1, 500_000, "500K", 1)], 500_000, 5);

    let outcome = engine.spin().expect("spin").prize;
    assert_eq!(outcome.id, 1, "disabled gate must not restrict anything");
}

#[test]
fn condition_updates_are_validated_and_applied() {
    let mut engine = cooldown_engine(
        CooldownCondition::default(),
        vec![prize(1, 500_000, "500K", 1)],
        500_000,
        6,
    );

    assert!(engine
        .set_cooldown(CooldownCondition {
            enabled: true,
            min_spins: 30,
            max_spins: 20,
            restricted_prizes: vec![500_000],
        })
        .is_err());
    // Rejected update left the stored condition alone.
    assert!(!engine.cooldown().unwrap().enabled);

    engine
        .set_cooldown(CooldownCondition {
            enabled: true,
            min_spins: 5,
            max_spins: 10,
            restricted_prizes: vec![500_000, 400_000],
        })
        .expect("valid condition");
    assert_eq!(engine.cooldown().unwrap().restricted_prizes.len(), 2);
}

#[test]
fn cooldown_operations_require_cooldown_gate() {
    let store = SqliteStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let mut engine =
        SpinEngine::load(Box::new(store), EngineConfig::default(), 7).expect("engine load");

    assert!(matches!(engine.cooldown(), Err(EngineError::CooldownUnavailable)));
    assert!(matches!(
        engine.set_cooldown(CooldownCondition::default()),
        Err(EngineError::CooldownUnavailable)
    ));
}
