//! Weighted prize selection — the core draw.
//!
//! Each affordable candidate gets weight `WEIGHT_SCALE / value`: lower
//! values draw proportionally more often, spending small prizes down
//! first and conserving the budget for the tail of the promotion.

use crate::{
    prize::Prize,
    rng::SpinRng,
    types::Amount,
};

/// Fixed numerator of the inverse-value weight.
pub const WEIGHT_SCALE: f64 = 1_000_000.0;

fn weight(prize: &Prize) -> f64 {
    WEIGHT_SCALE / prize.value as f64
}

/// Pick one prize from `candidates`, or None for the no-win outcome.
///
/// `candidates` must already be filtered to in-stock prizes with any
/// gate exclusions applied; this function only adds the affordability
/// filter and the draw itself. P(prize_i) = w_i / Σw over the affordable
/// set, walked in catalog order.
pub fn select_weighted<'a>(
    candidates: &[&'a Prize],
    remaining: Amount,
    rng: &mut SpinRng,
) -> Option<&'a Prize> {
    if remaining == 0 {
        return None;
    }

    let affordable: Vec<&Prize> = candidates
        .iter()
        .filter(|p| p.value <= remaining)
        .copied()
        .collect();
    if affordable.is_empty() {
        return None;
    }

    let total: f64 = affordable.iter().map(|p| weight(p)).sum();
    let mut roll = rng.next_f64() * total;

    for &prize in &affordable {
        roll -= weight(prize);
        if roll <= 0.0 {
            return Some(prize);
        }
    }

    // Floating-point dust can leave the walk unfinished; the draw still
    // owes a prize when affordable candidates exist.
    Some(affordable[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrizeId;

    fn prize(id: PrizeId, value: Amount) -> Prize {
        Prize {
            id,
            value,
            label: format!("P{id}"),
            message: String::new(),
            color: "#000000".to_string(),
            quantity: 1,
        }
    }

    #[test]
    fn empty_candidates_yield_no_win() {
        let mut rng = SpinRng::seed_from_u64(1);
        assert!(select_weighted(&[], 1_000_000, &mut rng).is_none());
    }

    #[test]
    fn zero_budget_yields_no_win() {
        let p = prize(1, 100);
        let mut rng = SpinRng::seed_from_u64(1);
        assert!(select_weighted(&[&p], 0, &mut rng).is_none());
    }

    #[test]
    fn unaffordable_candidates_yield_no_win() {
        let p = prize(1, 500_000);
        let mut rng = SpinRng::seed_from_u64(1);
        assert!(select_weighted(&[&p], 400_000, &mut rng).is_none());
    }

    #[test]
    fn single_affordable_candidate_always_wins() {
        let a = prize(1, 500_000);
        let b = prize(2, 100_000);
        let mut rng = SpinRng::seed_from_u64(42);
        for _ in 0..100 {
            let chosen = select_weighted(&[&a, &b], 300_000, &mut rng).unwrap();
            assert_eq!(chosen.id, 2);
        }
    }

    #[test]
    fn lower_values_draw_more_often() {
        let cheap = prize(1, 100_000);
        let dear = prize(2, 500_000);
        let mut rng = SpinRng::seed_from_u64(7);

        let mut cheap_hits = 0u32;
        for _ in 0..10_000 {
            let chosen = select_weighted(&[&cheap, &dear], 1_000_000, &mut rng).unwrap();
            if chosen.id == 1 {
                cheap_hits += 1;
            }
        }
        // Expected share 10/12 ≈ 0.833 of draws.
        assert!(cheap_hits > 7_500, "cheap prize drawn only {cheap_hits}/10000");
    }
}
