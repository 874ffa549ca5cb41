//! Score computation and UART tier classification.
//!
//! `score = A × U × e^P × S`. The baseline tier comes from the unrounded
//! score; tier-4 overrides are applied afterwards and can only raise it.
//!
//! Not applied: a HOOTL minimum of tier 3. It is documented as a future rule
//! but is not part of the current scoring contract, so a HOOTL manifest with a
//! low score keeps its baseline tier until a calibration decision enables it.

use serde::{Deserialize, Serialize};

use crate::constants::{
    TIER_2_MIN_SCORE, TIER_3_MIN_SCORE, TIER_4_MIN_SCORE, TRAINING_COMPUTE_OVERRIDE_FLOPS,
};
use crate::manifest::NormalizedManifest;

/// Unified Agentic Risk Tier.
///
/// Serialized as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum UartTier {
    Tier0,
    Tier1,
    Tier2,
    Tier3,
    Tier4,
}

impl UartTier {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Tier0 => 0,
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
            Self::Tier4 => 4,
        }
    }

    /// Baseline tier for an unrounded score.
    pub fn from_score(score: f64) -> Self {
        if score <= 0.0 {
            Self::Tier0
        } else if score < TIER_2_MIN_SCORE {
            Self::Tier1
        } else if score < TIER_3_MIN_SCORE {
            Self::Tier2
        } else if score < TIER_4_MIN_SCORE {
            Self::Tier3
        } else {
            Self::Tier4
        }
    }

    /// Score interval covered by this tier, for reports.
    pub fn threshold_label(self) -> &'static str {
        match self {
            Self::Tier0 => "R = 0",
            Self::Tier1 => "0 < R < 5",
            Self::Tier2 => "5 ≤ R < 20",
            Self::Tier3 => "20 ≤ R < 50",
            Self::Tier4 => "R ≥ 50",
        }
    }

    pub const ALL: [UartTier; 5] = [
        Self::Tier0,
        Self::Tier1,
        Self::Tier2,
        Self::Tier3,
        Self::Tier4,
    ];
}

impl From<UartTier> for u8 {
    fn from(tier: UartTier) -> Self {
        tier.as_u8()
    }
}

impl TryFrom<u8> for UartTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("UART tier must be 0-4, got {value}"))
    }
}

impl std::fmt::Display for UartTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UART Tier {}", self.as_u8())
    }
}

/// Unrounded composite score.
pub fn risk_score(agency: u8, autonomy: u8, persistence: u8, modifier: f64) -> f64 {
    f64::from(agency) * f64::from(autonomy) * f64::from(persistence).exp() * modifier
}

/// Round to one decimal place for output.
pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Reasons that force tier 4, in a fixed order: compute first, then each
/// dangerous capability flag.
pub fn tier_4_overrides(manifest: &NormalizedManifest) -> Vec<String> {
    let mut reasons = Vec::new();
    if manifest.model.training_compute_flops >= TRAINING_COMPUTE_OVERRIDE_FLOPS {
        reasons.push("training compute ≥ 10^25 FLOPs".to_string());
    }
    for capability in manifest.dangerous_capabilities() {
        reasons.push(format!("declared capability: {capability}"));
    }
    reasons
}

/// Final tier: the baseline, raised to tier 4 when any override applies.
pub fn classify(score: f64, overrides: &[String]) -> UartTier {
    let baseline = UartTier::from_score(score);
    if overrides.is_empty() {
        baseline
    } else {
        baseline.max(UartTier::Tier4)
    }
}
