//! Scaffolding modifier: the discount earned by declared safety controls.

use crate::constants::{
    KILL_SWITCH_DISCOUNT_PCT, MCP_DISCOUNT_PCT, SANDBOX_DISCOUNT_PCT, SCAFFOLDING_FLOOR,
};
use crate::manifest::ScaffoldingSignals;

/// Total discount in percentage points, before the floor is applied.
pub fn discount_points(signals: &ScaffoldingSignals) -> u32 {
    [
        (signals.mcp, MCP_DISCOUNT_PCT),
        (signals.sandbox, SANDBOX_DISCOUNT_PCT),
        (signals.kill_switch, KILL_SWITCH_DISCOUNT_PCT),
    ]
    .iter()
    .filter(|(present, _)| *present)
    .map(|(_, points)| points)
    .sum()
}

/// Multiplicative modifier S ∈ [0.70, 1.00].
///
/// Discounts are additive and the floor is clamped once, after summing.
pub fn scaffolding_modifier(signals: &ScaffoldingSignals) -> f64 {
    let points = discount_points(signals).min(100);
    let modifier = f64::from(100 - points) / 100.0;
    modifier.max(SCAFFOLDING_FLOOR)
}
