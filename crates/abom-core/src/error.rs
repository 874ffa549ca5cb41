//! Error taxonomy for ABOM assessment.
//!
//! Only two conditions are errors. Everything else a manifest can get wrong
//! (missing sections, mistyped fields, unknown strings) degrades to the
//! lowest-risk default during normalization and never reaches this type.

/// Errors produced by the assessment entry points.
#[derive(Debug, thiserror::Error)]
pub enum AbomError {
    /// The raw payload could not be parsed as JSON at all.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    /// The payload parsed, but its top level is not a JSON object.
    #[error("invalid manifest: expected a JSON object at the top level, found {found}")]
    InvalidManifest { found: &'static str },
}

/// Result type for ABOM assessment operations.
pub type Result<T> = std::result::Result<T, AbomError>;

/// Human-readable name of a JSON value's kind, used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
