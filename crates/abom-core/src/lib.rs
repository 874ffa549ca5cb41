//! ABOM Risk Engine
//!
//! Computes a deterministic risk score and UART governance tier for an
//! Agentic Bill of Materials: `score = A × U × e^P × S`, mapped to tiers 0–4
//! with tier-4 overrides for extreme training compute and dangerous declared
//! capabilities.
//!
//! The engine is a pure, synchronous function of one manifest. It holds no
//! state between calls and may be invoked concurrently without locking.

pub mod assess;
pub mod classify;
pub mod constants;
pub mod digest;
pub mod error;
pub mod factors;
pub mod manifest;
pub mod obs;
pub mod report;
pub mod scaffolding;
pub mod telemetry;

pub use assess::{assess, assess_json, assess_normalized, AssessmentResult};
pub use classify::UartTier;
pub use error::{AbomError, Result};
pub use manifest::{
    normalize, parse_manifest, AutonomyMode, ModelMetadata, NormalizationNote,
    NormalizedManifest, PersistenceBucket, ScaffoldingSignals, ToolPermission,
};
pub use obs::{
    emit_assessment_completed, emit_assessment_rejected, emit_manifest_loaded,
    emit_normalization_note, emit_report_written, emit_tier_4_override, AssessmentSpan,
};
pub use report::{
    build_report, build_report_from, read_report_json, render_report_md, write_report_json,
    write_report_md, RiskReport, DEFAULT_REPORT_FILE, DEFAULT_REPORT_MD_FILE,
};
pub use telemetry::init_tracing;

/// ABOM engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
