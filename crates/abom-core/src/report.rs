//! Downloadable risk reports.
//!
//! A report wraps an [`AssessmentResult`] with the manifest it was computed
//! from, the formula and tier thresholds in force, and the normalization
//! notes that explain every default the engine substituted.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assess::{assess_normalized, AssessmentResult};
use crate::classify::UartTier;
use crate::constants::FORMULA;
use crate::digest::compute_digest;
use crate::manifest::{normalize, NormalizationNote, NormalizedManifest};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Default file name used when a report is downloaded.
pub const DEFAULT_REPORT_FILE: &str = "abom_risk_report.json";

/// Default file name for the markdown rendering of a report.
pub const DEFAULT_REPORT_MD_FILE: &str = "abom_risk_report.md";

/// Assessment section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentSection {
    #[serde(flatten)]
    pub result: AssessmentResult,
    pub tier_description: String,
}

/// Full report as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub manifest_digest: String,
    pub abom_input: Value,
    pub risk_assessment: RiskAssessmentSection,
    pub formula: String,
    pub tier_thresholds: BTreeMap<String, String>,
    pub normalization_notes: Vec<NormalizationNote>,
}

fn tier_thresholds() -> BTreeMap<String, String> {
    UartTier::ALL
        .iter()
        .map(|tier| {
            (
                format!("Tier {}", tier.as_u8()),
                tier.threshold_label().to_string(),
            )
        })
        .collect()
}

/// Assess `manifest` and wrap the result in a report.
///
/// # Errors
///
/// Fails only when the manifest is not a JSON object.
pub fn build_report(manifest: &Value, generated_at: DateTime<Utc>) -> crate::Result<RiskReport> {
    let normalized = normalize(manifest)?;
    let result = assess_normalized(&normalized);
    Ok(build_report_from(manifest, &normalized, result, generated_at))
}

/// Wrap an assessment already computed from `normalized` in a report.
///
/// `normalized` must be the normalization of `manifest` and `result` its
/// assessment.
pub fn build_report_from(
    manifest: &Value,
    normalized: &NormalizedManifest,
    result: AssessmentResult,
    generated_at: DateTime<Utc>,
) -> RiskReport {
    let tier_description = result.tier.to_string();

    RiskReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at,
        manifest_digest: compute_digest(manifest),
        abom_input: manifest.clone(),
        risk_assessment: RiskAssessmentSection {
            result,
            tier_description,
        },
        formula: FORMULA.to_string(),
        tier_thresholds: tier_thresholds(),
        normalization_notes: normalized.notes.clone(),
    }
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &RiskReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize risk report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write the markdown rendering of the report.
pub fn write_report_md(path: &Path, report: &RiskReport) -> Result<()> {
    std::fs::write(path, render_report_md(report)).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Read a report previously written with [`write_report_json`].
pub fn read_report_json(path: &Path) -> Result<RiskReport> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse report {:?}", path))
}

/// Render a markdown summary of the report.
pub fn render_report_md(report: &RiskReport) -> String {
    let r = &report.risk_assessment.result;
    let mut out = String::new();
    out.push_str("# ABOM Risk Assessment\n\n");
    out.push_str(&format!(
        "**{}** (score {:.1})\n\n",
        report.risk_assessment.tier_description, r.score
    ));
    out.push_str("## Factors\n");
    out.push_str(&format!(
        "- agency (A): {}\n- autonomy (U): {}\n- persistence (P): {}\n- scaffolding modifier (S): {:.2}\n- formula: `{}`\n\n",
        r.agency, r.autonomy, r.persistence, r.scaffolding_modifier, report.formula
    ));

    if !r.tier_4_overrides.is_empty() {
        out.push_str("## Tier 4 Overrides\n");
        for reason in &r.tier_4_overrides {
            out.push_str(&format!("- {}\n", reason));
        }
        out.push('\n');
    }

    if !report.normalization_notes.is_empty() {
        out.push_str("## Defaults Applied\n");
        for note in &report.normalization_notes {
            out.push_str(&format!("- `{}`: {}\n", note.field, note.message));
        }
        out.push('\n');
    }

    out.push_str(&format!("Manifest digest: `{}`\n", report.manifest_digest));
    out
}
