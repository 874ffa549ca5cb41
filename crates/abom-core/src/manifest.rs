//! Manifest normalization.
//!
//! An ABOM manifest arrives as loosely typed JSON in one of several known
//! shapes (older manifests use bare strings where newer ones use objects).
//! This module dispatches each section to a small closed set of shape
//! variants by structural inspection and reduces it to typed signals.
//!
//! Normalization never fails past the top-level object check. Anything
//! missing, mistyped or unrecognized is replaced by the lowest-risk default
//! for that dimension, and the substitution is recorded as a
//! [`NormalizationNote`] so the resulting score stays auditable.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::DANGEROUS_CAPABILITIES;
use crate::error::{json_kind, AbomError, Result};

// ---------------------------------------------------------------------------
// Normalized signal types
// ---------------------------------------------------------------------------

/// Permission level of a single declared tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolPermission {
    /// Declared, but grants no access.
    #[serde(rename = "none")]
    NoAccess,
    Read,
    /// Any state-changing access.
    Write,
    /// Arbitrary or critical execution.
    #[serde(rename = "execute-critical")]
    ExecuteCritical,
}

const WRITE_VERBS: [&str; 7] = [
    "write", "delete", "modify", "create", "update", "remove", "send",
];

impl ToolPermission {
    /// Map an explicit permission string. Returns `None` when unrecognized.
    pub fn from_permission(text: &str) -> Option<Self> {
        let key = text.trim().to_lowercase().replace('_', "-");
        match key.as_str() {
            "none" | "no-access" => Some(Self::NoAccess),
            "read" | "read-only" | "readonly" | "r" => Some(Self::Read),
            "write" | "read-write" | "readwrite" | "rw" | "delete" | "modify" | "create"
            | "update" | "remove" => Some(Self::Write),
            "execute" | "exec" | "execute-critical" | "critical" => Some(Self::ExecuteCritical),
            _ => None,
        }
    }

    /// Classify an old-style bare tool name by keyword.
    pub fn from_tool_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("exec") {
            Self::ExecuteCritical
        } else if WRITE_VERBS.iter().any(|verb| name.contains(verb)) {
            Self::Write
        } else {
            Self::Read
        }
    }

    /// Classify a declared `scope` string. Empty scope declares nothing.
    pub fn from_scope(scope: &str) -> Option<Self> {
        let scope = scope.trim().to_lowercase();
        if scope.is_empty() {
            None
        } else if scope == "none" || scope.contains("no tools") {
            Some(Self::NoAccess)
        } else if scope.contains("critical") || scope.contains("exec") {
            Some(Self::ExecuteCritical)
        } else if scope.contains("state-changing")
            || scope.contains("state changing")
            || scope.contains("write")
        {
            Some(Self::Write)
        } else {
            Some(Self::Read)
        }
    }
}

/// Degree of human oversight over agent actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AutonomyMode {
    /// Human-in-the-loop: every action is approved.
    #[default]
    Hitl,
    /// Human-on-the-loop: actions proceed under supervision.
    Hotl,
    /// Human-out-of-the-loop.
    Hootl,
}

impl AutonomyMode {
    /// Parse a mode string, case-insensitively. Returns `None` when unrecognized.
    pub fn parse(text: &str) -> Option<Self> {
        let key = text.trim().to_lowercase().replace(['_', ' '], "-");
        match key.as_str() {
            "hitl" | "human-in-the-loop" => Some(Self::Hitl),
            "hotl" | "human-on-the-loop" => Some(Self::Hotl),
            "hootl" | "human-out-of-the-loop" => Some(Self::Hootl),
            _ => None,
        }
    }
}

impl std::fmt::Display for AutonomyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hitl => write!(f, "HITL"),
            Self::Hotl => write!(f, "HOTL"),
            Self::Hootl => write!(f, "HOOTL"),
        }
    }
}

/// How long agent memory survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistenceBucket {
    #[default]
    #[serde(rename = "none")]
    Stateless,
    Session,
    LongTerm,
}

const LONG_TERM_MARKERS: [&str; 7] = [
    "long-term",
    "cross-session",
    "permanent",
    "persistent",
    "vector-db",
    "vector-database",
    "vector-store",
];

const NEGATED_PERSISTENCE: [&str; 3] = ["non-persistent", "nonpersistent", "not-persistent"];

impl PersistenceBucket {
    /// Bucket a free-text memory descriptor. Returns `None` when no keyword matches.
    ///
    /// Underscores and spaces are folded to `-` before matching. Negated
    /// forms such as `non-persistent` are removed first, and long-term
    /// markers are checked before `session` since `cross-session` contains it.
    pub fn from_descriptor(text: &str) -> Option<Self> {
        let mut text = text.trim().to_lowercase().replace(['_', ' '], "-");
        let negated = NEGATED_PERSISTENCE.iter().any(|m| text.contains(m));
        for marker in NEGATED_PERSISTENCE {
            text = text.replace(marker, "");
        }

        if LONG_TERM_MARKERS.iter().any(|m| text.contains(m)) {
            Some(Self::LongTerm)
        } else if text.contains("session") || text.contains("short-term") {
            Some(Self::Session)
        } else if negated
            || text.contains("none")
            || text.contains("ephemeral")
            || text.contains("stateless")
        {
            Some(Self::Stateless)
        } else {
            None
        }
    }
}

/// Safety controls detected in the scaffolding inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaffoldingSignals {
    /// MCP or another orchestrator mediates tool access.
    pub mcp: bool,
    pub sandbox: bool,
    /// Kill switch or circuit breaker.
    pub kill_switch: bool,
}

impl ScaffoldingSignals {
    fn mark(&mut self, text: &str) {
        if text.contains("mcp")
            || text.contains("orchestrat")
            || text.contains("model context protocol")
        {
            self.mcp = true;
        }
        if text.contains("sandbox") || text.contains("isolat") {
            self.sandbox = true;
        }
        if ["kill_switch", "kill-switch", "killswitch", "kill switch", "circuit", "breaker"]
            .iter()
            .any(|marker| text.contains(marker))
        {
            self.kill_switch = true;
        }
    }

    /// Whether no control was detected.
    pub fn is_empty(&self) -> bool {
        !(self.mcp || self.sandbox || self.kill_switch)
    }
}

/// Model metadata that feeds the override rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Training compute in FLOPs; `0.0` when absent or unparsable.
    pub training_compute_flops: f64,
}

/// A lowest-risk default that normalization substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationNote {
    /// Dotted path of the manifest field concerned.
    pub field: String,
    pub message: String,
}

impl NormalizationNote {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Typed signals extracted from one manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedManifest {
    /// Permission level per declared tool, in declaration order.
    pub tools: Vec<ToolPermission>,
    pub autonomy: AutonomyMode,
    pub persistence: PersistenceBucket,
    pub scaffolding: ScaffoldingSignals,
    pub model: ModelMetadata,
    /// Lower-cased capability flags, unknown ones included.
    pub capability_flags: BTreeSet<String>,
    pub notes: Vec<NormalizationNote>,
}

impl NormalizedManifest {
    /// Dangerous capabilities present among the flags, in canonical order.
    ///
    /// Hyphen, underscore and space spellings are treated as equivalent.
    pub fn dangerous_capabilities(&self) -> Vec<&'static str> {
        let declared: BTreeSet<String> = self
            .capability_flags
            .iter()
            .map(|flag| canonical_flag(flag))
            .collect();
        DANGEROUS_CAPABILITIES
            .iter()
            .copied()
            .filter(|cap| declared.contains(&canonical_flag(cap)))
            .collect()
    }
}

fn canonical_flag(flag: &str) -> String {
    flag.replace(['_', ' '], "-")
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a raw payload as JSON.
///
/// # Errors
///
/// Returns `AbomError::MalformedInput` if `raw` is not valid JSON.
pub fn parse_manifest(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

/// Normalize a parsed manifest into typed signals.
///
/// # Errors
///
/// Returns `AbomError::InvalidManifest` if the top level is not an object.
/// No other condition is an error.
pub fn normalize(manifest: &Value) -> Result<NormalizedManifest> {
    let root = manifest.as_object().ok_or(AbomError::InvalidManifest {
        found: json_kind(manifest),
    })?;

    let mut out = NormalizedManifest::default();
    extract_tools(root.get("agency_profile"), &mut out);
    extract_autonomy(root.get("autonomy_leash"), &mut out);
    extract_persistence(root.get("persistence_layer"), &mut out);
    extract_scaffolding(root.get("scaffolding_inventory"), &mut out);
    extract_model(root.get("model_core"), &mut out);

    for section in ["agency_profile", "model_core"] {
        if let Some(Value::Object(map)) = root.get(section) {
            collect_capability_flags(map, &mut out.capability_flags);
        }
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Agency
// ---------------------------------------------------------------------------

enum AgencyShape<'a> {
    Absent,
    Tools(&'a [Value]),
    Scope(&'a str),
    Profile(&'a Map<String, Value>),
    Unrecognized,
}

impl<'a> AgencyShape<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::Array(items)) => Self::Tools(items),
            Some(Value::String(scope)) => Self::Scope(scope),
            Some(Value::Object(map)) => Self::Profile(map),
            Some(_) => Self::Unrecognized,
        }
    }
}

enum ToolShape<'a> {
    Named(&'a str),
    Described(&'a Map<String, Value>),
    Unrecognized,
}

impl<'a> ToolShape<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::String(name) => Self::Named(name),
            Value::Object(map) => Self::Described(map),
            _ => Self::Unrecognized,
        }
    }
}

fn extract_tools(value: Option<&Value>, out: &mut NormalizedManifest) {
    match AgencyShape::of(value) {
        AgencyShape::Absent => out.notes.push(NormalizationNote::new(
            "agency_profile",
            "absent; no tools assumed",
        )),
        AgencyShape::Tools(items) => push_tools(items, "agency_profile", out),
        AgencyShape::Scope(scope) => push_scope(scope, "agency_profile", out),
        AgencyShape::Profile(map) => {
            match map.get("tools") {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => push_tools(items, "agency_profile.tools", out),
                Some(other) => out.notes.push(NormalizationNote::new(
                    "agency_profile.tools",
                    format!("expected an array, found {}; ignored", json_kind(other)),
                )),
            }
            if let Some(Value::String(scope)) = map.get("scope") {
                push_scope(scope, "agency_profile.scope", out);
            }
        }
        AgencyShape::Unrecognized => out.notes.push(NormalizationNote::new(
            "agency_profile",
            "unrecognized shape; no tools assumed",
        )),
    }
}

fn push_tools(items: &[Value], field: &str, out: &mut NormalizedManifest) {
    for (index, item) in items.iter().enumerate() {
        let permission = match ToolShape::of(item) {
            ToolShape::Named(name) => ToolPermission::from_tool_name(name),
            ToolShape::Described(map) => described_permission(map, &format!("{field}[{index}]"), out),
            ToolShape::Unrecognized => {
                out.notes.push(NormalizationNote::new(
                    format!("{field}[{index}]"),
                    format!("unrecognized tool entry ({}); skipped", json_kind(item)),
                ));
                continue;
            }
        };
        out.tools.push(permission);
    }
}

fn described_permission(
    map: &Map<String, Value>,
    field: &str,
    out: &mut NormalizedManifest,
) -> ToolPermission {
    let declared = map
        .get("permission")
        .or_else(|| map.get("access"))
        .and_then(Value::as_str);
    match declared {
        Some(text) => ToolPermission::from_permission(text).unwrap_or_else(|| {
            out.notes.push(NormalizationNote::new(
                format!("{field}.permission"),
                format!("unknown permission {text:?}; treated as read"),
            ));
            ToolPermission::Read
        }),
        None => ToolPermission::Read,
    }
}

fn push_scope(scope: &str, field: &str, out: &mut NormalizedManifest) {
    if let Some(permission) = ToolPermission::from_scope(scope) {
        out.tools.push(permission);
    } else {
        out.notes.push(NormalizationNote::new(field, "empty scope; ignored"));
    }
}

// ---------------------------------------------------------------------------
// Autonomy
// ---------------------------------------------------------------------------

enum LeashShape<'a> {
    Absent,
    Mode(&'a str),
    Object(Option<&'a str>),
    Unrecognized,
}

impl<'a> LeashShape<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(mode)) => Self::Mode(mode),
            Some(Value::Object(map)) => Self::Object(map.get("mode").and_then(Value::as_str)),
            Some(_) => Self::Unrecognized,
        }
    }
}

fn extract_autonomy(value: Option<&Value>, out: &mut NormalizedManifest) {
    let declared = match LeashShape::of(value) {
        LeashShape::Mode(mode) | LeashShape::Object(Some(mode)) => Some(mode),
        LeashShape::Absent | LeashShape::Object(None) | LeashShape::Unrecognized => None,
    };
    out.autonomy = match declared.and_then(AutonomyMode::parse) {
        Some(mode) => mode,
        None => {
            let message = match declared {
                Some(text) => format!("unrecognized mode {text:?}; defaulted to HITL"),
                None => "no mode declared; defaulted to HITL".to_string(),
            };
            out.notes
                .push(NormalizationNote::new("autonomy_leash", message));
            AutonomyMode::Hitl
        }
    };
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

enum PersistenceShape<'a> {
    Absent,
    Descriptor(&'a str),
    Fields {
        memory_type: Option<&'a str>,
        retention: Option<&'a str>,
    },
    Unrecognized,
}

impl<'a> PersistenceShape<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(text)) => Self::Descriptor(text),
            Some(Value::Object(map)) => Self::Fields {
                memory_type: map
                    .get("memory_type")
                    .or_else(|| map.get("type"))
                    .and_then(Value::as_str),
                retention: map.get("retention").and_then(Value::as_str),
            },
            Some(_) => Self::Unrecognized,
        }
    }
}

fn extract_persistence(value: Option<&Value>, out: &mut NormalizedManifest) {
    let descriptors: Vec<(&str, &str)> = match PersistenceShape::of(value) {
        PersistenceShape::Absent | PersistenceShape::Unrecognized => Vec::new(),
        PersistenceShape::Descriptor(text) => vec![("persistence_layer", text)],
        PersistenceShape::Fields {
            memory_type,
            retention,
        } => memory_type
            .map(|t| ("persistence_layer.memory_type", t))
            .into_iter()
            .chain(retention.map(|r| ("persistence_layer.retention", r)))
            .collect(),
    };

    if descriptors.is_empty() {
        out.notes.push(NormalizationNote::new(
            "persistence_layer",
            "no memory descriptor; assumed none",
        ));
    }

    // Disagreeing descriptors resolve to the higher-risk bucket.
    let mut bucket = PersistenceBucket::Stateless;
    for (field, text) in descriptors {
        match PersistenceBucket::from_descriptor(text) {
            Some(found) => bucket = bucket.max(found),
            None => out.notes.push(NormalizationNote::new(
                field,
                format!("unrecognized descriptor {text:?}; assumed none"),
            )),
        }
    }
    out.persistence = bucket;
}

// ---------------------------------------------------------------------------
// Scaffolding
// ---------------------------------------------------------------------------

const SCAFFOLDING_MAX_DEPTH: usize = 4;

const NEGATIVE_WORDS: [&str; 9] = [
    "", "none", "no", "false", "0", "disabled", "off", "n/a", "absent",
];

/// Value prefixes that say a control is missing or not yet in place.
const NEGATIVE_PREFIXES: [&str; 9] = [
    "not ", "not-", "no ", "no-", "non-", "un", "planned", "missing", "disable",
];

/// Key prefixes that name the absence of a control, as in `no_sandbox`.
const NEGATED_KEY_PREFIXES: [&str; 6] = ["no_", "no-", "not_", "not-", "disable", "without"];

fn is_negative_value(text: &str) -> bool {
    NEGATIVE_WORDS.contains(&text) || NEGATIVE_PREFIXES.iter().any(|p| text.starts_with(p))
}

fn is_negated_key(key: &str) -> bool {
    NEGATED_KEY_PREFIXES.iter().any(|p| key.starts_with(p))
}

fn extract_scaffolding(value: Option<&Value>, out: &mut NormalizedManifest) {
    match value {
        None | Some(Value::Null) => out.notes.push(NormalizationNote::new(
            "scaffolding_inventory",
            "absent; no controls assumed",
        )),
        Some(value) => detect_controls(value, "", 0, &mut out.scaffolding),
    }
}

/// Walk the inventory, marking controls named either by a truthy entry's key
/// path or by the text of a string value.
fn detect_controls(value: &Value, path: &str, depth: usize, signals: &mut ScaffoldingSignals) {
    if depth > SCAFFOLDING_MAX_DEPTH {
        return;
    }
    match value {
        Value::Bool(true) => signals.mark(path),
        Value::Number(n) => {
            if n.as_f64().is_some_and(|v| v > 0.0) {
                signals.mark(path);
            }
        }
        Value::String(text) => {
            let text = text.trim().to_lowercase();
            if !is_negative_value(&text) {
                signals.mark(path);
                signals.mark(&text);
            }
        }
        Value::Array(items) => {
            for item in items {
                detect_controls(item, path, depth + 1, signals);
            }
        }
        Value::Object(map) => {
            let disabled = ["enabled", "active", "present"]
                .iter()
                .any(|key| matches!(map.get(*key), Some(Value::Bool(false))))
                || matches!(map.get("disabled"), Some(Value::Bool(true)));
            if disabled {
                return;
            }
            for (key, child) in map {
                let key = key.to_lowercase();
                if is_negated_key(&key) {
                    continue;
                }
                let child_path = if path.is_empty() {
                    key
                } else {
                    format!("{path}.{key}")
                };
                detect_controls(child, &child_path, depth + 1, signals);
            }
        }
        Value::Bool(false) | Value::Null => {}
    }
}

// ---------------------------------------------------------------------------
// Model metadata & capability flags
// ---------------------------------------------------------------------------

const COMPUTE_KEYS: [&str; 4] = [
    "training_flops",
    "training_compute",
    "training_compute_flops",
    "flops",
];

fn extract_model(value: Option<&Value>, out: &mut NormalizedManifest) {
    let Some(Value::Object(map)) = value else {
        return;
    };
    let Some((key, raw)) = COMPUTE_KEYS
        .iter()
        .find_map(|key| map.get(*key).map(|raw| (*key, raw)))
    else {
        return;
    };
    match parse_compute(raw) {
        Some(flops) => out.model.training_compute_flops = flops,
        None => out.notes.push(NormalizationNote::new(
            format!("model_core.{key}"),
            "unparsable training compute; assumed 0",
        )),
    }
}

/// Parse a training compute value to FLOPs.
///
/// Accepts JSON numbers and numeric strings in plain, exponent
/// (`1.1e25`) or power (`1.1 x 10^25`) notation, with an optional `FLOPs`
/// suffix. Non-finite and negative values are rejected.
pub fn parse_compute(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => parse_numeric_text(text),
        _ => None,
    };
    parsed.filter(|flops| flops.is_finite() && *flops >= 0.0)
}

fn power_notation() -> &'static Regex {
    static POWER: OnceLock<Regex> = OnceLock::new();
    POWER.get_or_init(|| {
        Regex::new(r"^(?:([0-9]*\.?[0-9]+)[x×*])?10(?:\^|\*\*)([+-]?[0-9]+)$")
            .expect("power notation pattern is valid")
    })
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let compact: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != ',')
        .collect();
    let compact = compact
        .strip_suffix("flops")
        .or_else(|| compact.strip_suffix("flop"))
        .unwrap_or(compact.as_str());

    if let Ok(value) = compact.parse::<f64>() {
        return Some(value);
    }

    // Rebuild as exponent notation so the decimal is rounded once, exactly
    // as a literal would be.
    let caps = power_notation().captures(compact)?;
    let mantissa = caps.get(1).map_or("1", |m| m.as_str());
    format!("{mantissa}e{}", &caps[2]).parse().ok()
}

fn collect_capability_flags(section: &Map<String, Value>, flags: &mut BTreeSet<String>) {
    let Some(value) = section
        .get("capability_flags")
        .or_else(|| section.get("capabilities"))
    else {
        return;
    };
    let mut insert = |flag: &str| {
        let flag = flag.trim().to_lowercase();
        if !flag.is_empty() {
            flags.insert(flag);
        }
    };
    match value {
        Value::String(flag) => insert(flag),
        Value::Array(items) => items.iter().filter_map(Value::as_str).for_each(insert),
        Value::Object(map) => map
            .iter()
            .filter(|(_, enabled)| matches!(enabled, Value::Bool(true)))
            .for_each(|(flag, _)| insert(flag.as_str())),
        _ => {}
    }
}
