//! Agency, autonomy and persistence factors.
//!
//! Each calculator is a total function of normalized signals. A manifest
//! with no recognizable signal yields the lowest factor.

use crate::constants::{
    AGENCY_CRITICAL, AGENCY_NO_TOOLS, AGENCY_READ_ONLY, AGENCY_STATE_CHANGING,
};
use crate::manifest::{AutonomyMode, NormalizedManifest, PersistenceBucket, ToolPermission};

/// Agency factor A ∈ {1, 2, 4, 6}.
///
/// The highest applicable level wins: any critical tool or dangerous
/// capability flag gives 6, any state-changing tool 4, read-only tools 2,
/// and no tools 1. A dangerous flag applies even when no tool is declared.
/// Tools declared with no access do not count as tools.
pub fn agency_factor(tools: &[ToolPermission], has_dangerous_capability: bool) -> u8 {
    if has_dangerous_capability {
        return AGENCY_CRITICAL;
    }
    match tools.iter().copied().max() {
        Some(ToolPermission::ExecuteCritical) => AGENCY_CRITICAL,
        Some(ToolPermission::Write) => AGENCY_STATE_CHANGING,
        Some(ToolPermission::Read) => AGENCY_READ_ONLY,
        Some(ToolPermission::NoAccess) | None => AGENCY_NO_TOOLS,
    }
}

/// Autonomy factor U ∈ {1, 2, 3}.
pub fn autonomy_factor(mode: AutonomyMode) -> u8 {
    match mode {
        AutonomyMode::Hitl => 1,
        AutonomyMode::Hotl => 2,
        AutonomyMode::Hootl => 3,
    }
}

/// Persistence factor P ∈ {0, 1, 2}, used as the exponent of e.
pub fn persistence_factor(bucket: PersistenceBucket) -> u8 {
    match bucket {
        PersistenceBucket::Stateless => 0,
        PersistenceBucket::Session => 1,
        PersistenceBucket::LongTerm => 2,
    }
}

/// The three factors for one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Factors {
    pub agency: u8,
    pub autonomy: u8,
    pub persistence: u8,
}

impl Factors {
    pub fn of(manifest: &NormalizedManifest) -> Self {
        Self {
            agency: agency_factor(
                &manifest.tools,
                !manifest.dangerous_capabilities().is_empty(),
            ),
            autonomy: autonomy_factor(manifest.autonomy),
            persistence: persistence_factor(manifest.persistence),
        }
    }
}
