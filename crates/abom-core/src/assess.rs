//! The assessment entry point: one manifest in, one result out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{classify, risk_score, round_score, tier_4_overrides, UartTier};
use crate::error::Result;
use crate::factors::Factors;
use crate::manifest::{normalize, parse_manifest, NormalizedManifest};
use crate::scaffolding::scaffolding_modifier;

/// Outcome of assessing one manifest.
///
/// # Invariants
///
/// `tier` is consistent with the unrounded score and `tier_4_overrides`:
/// a non-empty override list always comes with `UartTier::Tier4`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub agency: u8,
    pub autonomy: u8,
    pub persistence: u8,
    pub scaffolding_modifier: f64,
    /// Composite score rounded to one decimal place.
    pub score: f64,
    pub tier: UartTier,
    pub tier_4_overrides: Vec<String>,
}

/// Assess a parsed manifest.
///
/// # Errors
///
/// Returns `AbomError::InvalidManifest` if the manifest is not a JSON object.
pub fn assess(manifest: &Value) -> Result<AssessmentResult> {
    let normalized = normalize(manifest)?;
    Ok(assess_normalized(&normalized))
}

/// Parse a raw JSON payload and assess it.
///
/// # Errors
///
/// Returns `AbomError::MalformedInput` for non-JSON input and
/// `AbomError::InvalidManifest` for a non-object top level.
pub fn assess_json(raw: &str) -> Result<AssessmentResult> {
    assess(&parse_manifest(raw)?)
}

/// Score already-normalized signals. Total: never fails.
pub fn assess_normalized(manifest: &NormalizedManifest) -> AssessmentResult {
    let factors = Factors::of(manifest);
    let modifier = scaffolding_modifier(&manifest.scaffolding);
    let score = risk_score(
        factors.agency,
        factors.autonomy,
        factors.persistence,
        modifier,
    );
    let overrides = tier_4_overrides(manifest);
    let tier = classify(score, &overrides);

    AssessmentResult {
        agency: factors.agency,
        autonomy: factors.autonomy,
        persistence: factors.persistence,
        scaffolding_modifier: modifier,
        score: round_score(score),
        tier,
        tier_4_overrides: overrides,
    }
}
