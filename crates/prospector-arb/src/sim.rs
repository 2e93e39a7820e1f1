//! Reserve-based swap simulation.
//!
//! Constant-product with fee for V2-style pairs; the same formula stands in
//! for V3/V4 until tick-walking lands. Anything else falls back to a bare
//! fee deduction.

use crate::graph::GraphEdge;
use alloy_primitives::U256;
use prospector_core::types::Protocol;

/// Lossy conversion for simulation arithmetic; wei-scale precision is not
/// needed at the discovery stage.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .enumerate()
        .map(|(i, &limb)| limb as f64 * 2f64.powi(64 * i as i32))
        .sum()
}

/// Simulate one hop. `None` means the step fails and the cycle is rejected:
/// missing reserves, empty pool, or a non-positive output.
pub fn simulate_swap(edge: &GraphEdge, amount_in: f64) -> Option<f64> {
    if amount_in <= 0.0 {
        return None;
    }

    let pool = &edge.pool;
    let reserve0 = u256_to_f64(pool.reserve0);
    let reserve1 = u256_to_f64(pool.reserve1);
    if reserve0 <= 0.0 || reserve1 <= 0.0 {
        return None;
    }

    let amount_out = match pool.protocol {
        Protocol::V2Like | Protocol::V3 | Protocol::V4 => {
            let (reserve_in, reserve_out) = if edge.from_token == pool.token0 {
                (reserve0, reserve1)
            } else {
                (reserve1, reserve0)
            };
            // 0.30% fee gives the canonical 997/1000 multiplier.
            let fee_multiplier = 1000.0 - edge.fee * 10.0;
            let amount_in_with_fee = amount_in * fee_multiplier;
            (amount_in_with_fee * reserve_out) / (reserve_in * 1000.0 + amount_in_with_fee)
        }
        Protocol::V1Like => amount_in * (1.0 - edge.fee / 100.0),
    };

    (amount_out > 0.0).then_some(amount_out)
}

/// Run `initial` through every hop of a cycle. `None` if any step fails.
pub fn simulate_path(initial: f64, path: &[GraphEdge]) -> Option<f64> {
    if path.is_empty() {
        return None;
    }
    let mut amount = initial;
    for edge in path {
        amount = simulate_swap(edge, amount)?;
    }
    Some(amount)
}
