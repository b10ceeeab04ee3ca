//! JSON export.

use serde_json::Value;

use crate::audit::AuditResult;
use crate::validation::validate_audit_result;
use crate::{AuditError, Result};

/// Serializes a result to a JSON value.
pub fn to_json_value(result: &AuditResult) -> Result<Value> {
    serde_json::to_value(result).map_err(|e| AuditError::Serialization {
        context: format!("Failed to serialize audit result for '{}'", result.table_name),
        source: e,
    })
}

/// Serializes a result to pretty JSON after validating it against the
/// audit result schema.
///
/// # Errors
/// Returns a serialization error, or an export error when the document
/// fails validation.
pub fn to_json(result: &AuditResult) -> Result<String> {
    let value = to_json_value(result)?;
    validate_audit_result(&value)?;
    tracing::debug!("Audit result for '{}' passed validation", result.table_name);

    serde_json::to_string_pretty(&value).map_err(|e| AuditError::Serialization {
        context: format!("Failed to render audit result for '{}'", result.table_name),
        source: e,
    })
}
