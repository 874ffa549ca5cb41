//! ABOM - Agentic Bill of Materials risk CLI
//!
//! The `abom` command scores an ABOM manifest and assigns its UART tier.
//!
//! ## Commands
//!
//! - `calculate-risk`: Assess a manifest and print the result
//! - `download-report`: Assess a manifest and write a full report (JSON or markdown)

use std::path::{Path, PathBuf};

use abom_core::digest::compute_digest;
use abom_core::{
    assess_normalized, build_report_from, emit_assessment_completed, emit_assessment_rejected,
    emit_manifest_loaded, emit_normalization_note, emit_report_written, normalize,
    parse_manifest, render_report_md, write_report_json, write_report_md, AssessmentResult,
    AssessmentSpan, NormalizedManifest, RiskReport, DEFAULT_REPORT_FILE, DEFAULT_REPORT_MD_FILE,
};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "abom")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "ABOM risk scoring engine (UART tiering)", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "ABOM_VERBOSE")]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "ABOM_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a manifest and print factors, score and tier
    CalculateRisk {
        /// Path to the ABOM manifest (JSON)
        manifest: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Score a manifest and write a report that echoes it
    DownloadReport {
        /// Path to the ABOM manifest (JSON)
        manifest: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,

        /// Where to write the report [default: abom_risk_report.json or .md]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Json,
    Md,
}

impl ReportFormat {
    fn default_file(self) -> &'static str {
        match self {
            Self::Json => DEFAULT_REPORT_FILE,
            Self::Md => DEFAULT_REPORT_MD_FILE,
        }
    }

    fn write(self, path: &Path, report: &RiskReport) -> Result<()> {
        match self {
            Self::Json => write_report_json(path, report),
            Self::Md => write_report_md(path, report),
        }
    }

    fn render(self, report: &RiskReport) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(report).context("serialize report"),
            Self::Md => Ok(render_report_md(report)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    abom_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::CalculateRisk { manifest, format } => cmd_calculate_risk(&manifest, format),
        Commands::DownloadReport {
            manifest,
            format,
            output,
            stdout,
        } => {
            let target = if stdout {
                None
            } else {
                Some(output.unwrap_or_else(|| PathBuf::from(format.default_file())))
            };
            cmd_download_report(&manifest, format, target.as_deref())
        }
    }
}

/// Read and parse a manifest file. Non-JSON content is rejected here,
/// before the engine sees it.
fn load_manifest(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {:?}", path))?;
    emit_manifest_loaded(&path.display().to_string(), raw.len());

    match parse_manifest(&raw) {
        Ok(manifest) => Ok(manifest),
        Err(e) => {
            emit_assessment_rejected(&e);
            Err(e).with_context(|| format!("Invalid JSON format in {:?}", path))
        }
    }
}

fn assess_loaded(manifest: &Value) -> Result<(NormalizedManifest, AssessmentResult)> {
    let normalized = match normalize(manifest) {
        Ok(normalized) => normalized,
        Err(e) => {
            emit_assessment_rejected(&e);
            return Err(e).context("Manifest cannot be assessed");
        }
    };
    for note in &normalized.notes {
        emit_normalization_note(note);
    }
    let result = assess_normalized(&normalized);
    emit_assessment_completed(&result);
    Ok((normalized, result))
}

/// Assess a manifest and print the result
fn cmd_calculate_risk(path: &Path, format: OutputFormat) -> Result<()> {
    let manifest = load_manifest(path)?;
    let digest = compute_digest(&manifest);
    let _span = AssessmentSpan::enter(&digest);

    let (_, result) = assess_loaded(&manifest)?;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("serialize assessment")?
            );
        }
        OutputFormat::Text => print!("{}", render_text(&result)),
    }
    Ok(())
}

/// Assess a manifest and write (or print) the full report
fn cmd_download_report(path: &Path, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let manifest = load_manifest(path)?;
    let digest = compute_digest(&manifest);
    let _span = AssessmentSpan::enter(&digest);

    let (normalized, result) = assess_loaded(&manifest)?;
    let report = build_report_from(&manifest, &normalized, result, Utc::now());
    let tier = report.risk_assessment.result.tier;

    match output {
        Some(target) => {
            format.write(target, &report)?;
            emit_report_written(&target.display().to_string(), tier.as_u8());
            info!("Report written to {}", target.display());
            println!("{} -> {}", tier, target.display());
        }
        None => println!("{}", format.render(&report)?),
    }
    Ok(())
}

fn render_text(result: &AssessmentResult) -> String {
    let mut out = format!("{} (score {:.1})\n", result.tier, result.score);
    out.push_str(&format!("  agency       A = {}\n", result.agency));
    out.push_str(&format!("  autonomy     U = {}\n", result.autonomy));
    out.push_str(&format!("  persistence  P = {}\n", result.persistence));
    out.push_str(&format!(
        "  scaffolding  S = {:.2}\n",
        result.scaffolding_modifier
    ));
    for reason in &result.tier_4_overrides {
        out.push_str(&format!("  override: {}\n", reason));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_manifest(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write manifest");
        path
    }

    #[test]
    fn parses_calculate_risk_defaults() {
        let cli = Cli::try_parse_from(["abom", "calculate-risk", "agent.json"]).unwrap();
        match cli.command {
            Commands::CalculateRisk { manifest, format } => {
                assert_eq!(manifest, PathBuf::from("agent.json"));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected calculate-risk"),
        }
    }

    #[test]
    fn parses_download_report_output() {
        let cli = Cli::try_parse_from([
            "abom",
            "--verbose",
            "download-report",
            "agent.json",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::DownloadReport {
                format,
                output,
                stdout,
                ..
            } => {
                assert_eq!(format, ReportFormat::Json);
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(!stdout);
            }
            _ => panic!("expected download-report"),
        }
    }

    #[test]
    fn stdout_conflicts_with_output() {
        assert!(Cli::try_parse_from([
            "abom",
            "download-report",
            "agent.json",
            "--stdout",
            "--output",
            "x.json",
        ])
        .is_err());
    }

    #[test]
    fn malformed_file_is_rejected_before_assessment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_manifest(dir.path(), "bad.json", "{ not json");
        let err = load_manifest(&path).unwrap_err();
        assert!(format!("{err:#}").contains("malformed input"));
    }

    #[test]
    fn non_object_manifest_fails() {
        let err = assess_loaded(&json!(42)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid manifest"));
    }

    #[test]
    fn download_report_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_manifest(
            dir.path(),
            "agent.json",
            r#"{"agency_profile": {"tools": []}, "autonomy_leash": "HITL", "persistence_layer": "none"}"#,
        );
        let out = dir.path().join(DEFAULT_REPORT_FILE);
        cmd_download_report(&path, ReportFormat::Json, Some(&out)).expect("download report");

        let report = abom_core::read_report_json(&out).expect("read report");
        assert_eq!(report.risk_assessment.result.score, 1.0);
        assert_eq!(report.risk_assessment.tier_description, "UART Tier 1");
    }

    #[test]
    fn download_report_writes_markdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_manifest(
            dir.path(),
            "agent.json",
            r#"{"model_core": {"training_flops": 2e25}, "persistence_layer": "session"}"#,
        );
        let out = dir.path().join(DEFAULT_REPORT_MD_FILE);
        cmd_download_report(&path, ReportFormat::Md, Some(&out)).expect("download report");

        let md = std::fs::read_to_string(&out).expect("read markdown");
        assert!(md.starts_with("# ABOM Risk Assessment"));
        assert!(md.contains("UART Tier 4"));
        assert!(md.contains("## Tier 4 Overrides"));
    }

    #[test]
    fn markdown_format_defaults_to_md_file() {
        let cli = Cli::try_parse_from(["abom", "download-report", "agent.json", "--format", "md"])
            .unwrap();
        match cli.command {
            Commands::DownloadReport { format, output, .. } => {
                assert_eq!(format, ReportFormat::Md);
                assert_eq!(output, None);
                assert_eq!(format.default_file(), DEFAULT_REPORT_MD_FILE);
            }
            _ => panic!("expected download-report"),
        }
    }

    #[test]
    fn text_rendering_lists_overrides() {
        let result = abom_core::assess(&json!({
            "model_core": { "training_flops": 3e25 }
        }))
        .unwrap();
        let text = render_text(&result);
        assert!(text.starts_with("UART Tier 4 (score 1.0)"));
        assert!(text.contains("override: training compute"));
        assert!(text.contains("S = 1.00"));
    }
}
