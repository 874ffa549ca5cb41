//! Scoring constants.
//!
//! These values are provisional calibration points. They are fixed at build
//! time; changing any of them changes the meaning of every tier produced.

/// Agency factor when the agent declares no tools.
pub const AGENCY_NO_TOOLS: u8 = 1;
/// Agency factor when every tool is read-only.
pub const AGENCY_READ_ONLY: u8 = 2;
/// Agency factor when any tool can change state.
pub const AGENCY_STATE_CHANGING: u8 = 4;
/// Agency factor for critical execution or a dangerous capability flag.
pub const AGENCY_CRITICAL: u8 = 6;

/// Discount for MCP / orchestrator mediated tool access, in percentage points.
pub const MCP_DISCOUNT_PCT: u32 = 10;
/// Discount for sandboxed execution, in percentage points.
pub const SANDBOX_DISCOUNT_PCT: u32 = 15;
/// Discount for a kill switch or circuit breaker, in percentage points.
pub const KILL_SWITCH_DISCOUNT_PCT: u32 = 10;
/// Lowest value the scaffolding modifier may take.
pub const SCAFFOLDING_FLOOR: f64 = 0.70;

/// Lower bound (inclusive) of tier 2.
pub const TIER_2_MIN_SCORE: f64 = 5.0;
/// Lower bound (inclusive) of tier 3.
pub const TIER_3_MIN_SCORE: f64 = 20.0;
/// Lower bound (inclusive) of tier 4.
pub const TIER_4_MIN_SCORE: f64 = 50.0;

/// Training compute at or above which tier 4 is forced.
pub const TRAINING_COMPUTE_OVERRIDE_FLOPS: f64 = 1e25;

/// Capability flags that force tier 4 and count as critical agency.
///
/// Order here is the order override reasons are reported in.
pub const DANGEROUS_CAPABILITIES: [&str; 4] = [
    "self-replication",
    "cbrn",
    "autonomous_weapons",
    "critical_infrastructure_control",
];

/// Human-readable form of the scoring formula.
pub const FORMULA: &str = "R = A × U × e^P × S";
