//! Two engines, same seed, same configuration: they must produce the
//! identical outcome sequence. Any divergence means selection is
//! drawing randomness from somewhere outside its seeded stream.

use luckyspin_core::{config::EngineConfig, engine::SpinEngine, store::SqliteStore};

fn build_engine(seed: u64) -> SpinEngine {
    let store = SqliteStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    SpinEngine::load(Box::new(store), EngineConfig::default(), seed).expect("engine load")
}

fn outcome_sequence(engine: &mut SpinEngine, spins: u64) -> Vec<(u32, u64)> {
    (0..spins)
        .map(|_| {
            let outcome = engine.spin().expect("spin");
            (outcome.prize.id, outcome.spin_number)
        })
        .collect()
}

#[test]
fn same_seed_produces_identical_outcome_sequences() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    const SPINS: u64 = 300;

    let mut engine_a = build_engine(SEED);
    let mut engine_b = build_engine(SEED);

    let seq_a = outcome_sequence(&mut engine_a, SPINS);
    let seq_b = outcome_sequence(&mut engine_b, SPINS);

    for (i, (a, b)) in seq_a.iter().zip(seq_b.iter()).enumerate() {
        assert_eq!(a, b, "outcome sequence diverged at spin {i}: {a:?} vs {b:?}");
    }
    assert_eq!(engine_a.spent_amount(), engine_b.spent_amount());
}

#[test]
fn different_seeds_produce_different_sequences() {
    let mut engine_a = build_engine(42);
    let mut engine_b = build_engine(99);

    let seq_a = outcome_sequence(&mut engine_a, 300);
    let seq_b = outcome_sequence(&mut engine_b, 300);

    let any_different = seq_a.iter().zip(seq_b.iter()).any(|(a, b)| a != b);
    assert!(
        any_different,
        "different seeds produced identical sequences — the seed is not being used"
    );
}
