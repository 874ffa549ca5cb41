//! Structured observability hooks around an assessment.
//!
//! The scoring functions themselves never log. Callers on the I/O side
//! (the CLI) enter an [`AssessmentSpan`] and emit these events around each
//! call so log lines can be joined on the manifest digest.

use tracing::{debug, info, warn};

use crate::assess::AssessmentResult;
use crate::manifest::NormalizationNote;

/// RAII guard that enters an assessment-scoped span.
///
/// # Example
///
/// ```ignore
/// let _span = AssessmentSpan::enter("3f2a...");
/// // every event below carries manifest_digest = "3f2a..."
/// ```
pub struct AssessmentSpan {
    _span: tracing::span::EnteredSpan,
}

impl AssessmentSpan {
    pub fn enter(manifest_digest: &str) -> Self {
        let span = tracing::info_span!("abom.assessment", manifest_digest = %manifest_digest);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: manifest file read and parsed.
pub fn emit_manifest_loaded(source: &str, bytes: usize) {
    debug!(event = "manifest.loaded", source = %source, bytes = bytes);
}

/// Emit event: one lowest-risk default substituted during normalization.
pub fn emit_normalization_note(note: &NormalizationNote) {
    debug!(event = "manifest.default_applied", field = %note.field, message = %note.message);
}

/// Emit event: assessment completed with its factors and tier.
pub fn emit_assessment_completed(result: &AssessmentResult) {
    info!(
        event = "assessment.completed",
        agency = result.agency,
        autonomy = result.autonomy,
        persistence = result.persistence,
        scaffolding_modifier = result.scaffolding_modifier,
        score = result.score,
        tier = result.tier.as_u8(),
        overrides = result.tier_4_overrides.len(),
    );
    for reason in &result.tier_4_overrides {
        emit_tier_4_override(reason);
    }
}

/// Emit event: a tier-4 override fired.
pub fn emit_tier_4_override(reason: &str) {
    warn!(event = "assessment.tier_4_override", reason = %reason);
}

/// Emit event: the manifest was rejected before a result could be produced.
pub fn emit_assessment_rejected(error: &dyn std::fmt::Display) {
    warn!(event = "assessment.rejected", error = %error);
}

/// Emit event: report written to disk.
pub fn emit_report_written(path: &str, tier: u8) {
    info!(event = "report.written", path = %path, tier = tier);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_span_create() {
        let _span = AssessmentSpan::enter("test-digest");
        emit_manifest_loaded("inline", 2);
    }
}
