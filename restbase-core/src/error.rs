// restbase-core/src/error.rs
// Error kinds for the query engine, mutation engine and store.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RestError>;

/// A single field-level validation failure, surfaced in 400 payloads.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors produced by the core.
///
/// `Validation`, `Conflict` and `NotFound` are request-local and map onto
/// 400/409/404 responses. `UnsupportedShape` and `Schema` are startup
/// errors: routing cannot be constructed over a malformed store, so the
/// server aborts instead of serving.
#[derive(Debug, Error)]
pub enum RestError {
    /// Schema rejected a record. `resource` carries the offending record
    /// when the surrounding protocol echoes it back (replace/update).
    #[error("validation failed")]
    Validation {
        resource: Option<Value>,
        errors: Vec<FieldError>,
    },

    /// Duplicate id on create, or create attempted on a singular resource.
    /// Carries the complete response body.
    #[error("conflict")]
    Conflict { body: Value },

    #[error("{0}")]
    NotFound(String),

    /// A top-level store entry is neither a record nor a list of records.
    #[error("type of \"{resource}\" ({found}) is not supported, use objects or arrays of objects")]
    UnsupportedShape {
        resource: String,
        found: &'static str,
    },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
