//! JSON Schema validation for exported audit output.
//!
//! Exported audit results are checked against an embedded JSON Schema
//! before they are written, and exported audit logs are scanned for
//! credentials that survived redaction.
//!
//! # Security Guarantees
//! - Audit log entries never carry URL passwords or `password=` values
//! - Result documents only contain the documented fields
//!
//! # Example
//! ```rust
//! use dwaudit_core::validation::{initialize_schema_validator, validate_audit_result};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_schema_validator()?;
//! let result = json!({
//!     "table_name": "orders",
//!     "total_rows": 3,
//!     "sampled": false,
//!     "analyzed_rows": 3,
//!     "columns": {},
//!     "timestamp": "2024-01-15T10:30:00Z"
//! });
//! validate_audit_result(&result)?;
//! # Ok(())
//! # }
//! ```

use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::security::{REDACTED, contains_url_credentials};

/// Validation errors with field-level reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Document does not match the schema
    #[error("Schema validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// A credential was found in the output
    #[error("Security validation failed: {reason}")]
    SecurityViolation { reason: String },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

impl From<ValidationError> for crate::AuditError {
    fn from(error: ValidationError) -> Self {
        crate::AuditError::export(error.to_string())
    }
}

/// Embedded JSON Schema for an exported audit result
const AUDIT_RESULT_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "dwaudit Audit Result",
  "type": "object",
  "required": ["table_name", "total_rows", "sampled", "analyzed_rows", "columns", "timestamp"],
  "properties": {
    "table_name": { "type": "string" },
    "total_rows": { "type": "integer", "minimum": 0 },
    "sampled": { "type": "boolean" },
    "analyzed_rows": { "type": "integer", "minimum": 0 },
    "timestamp": { "type": "string", "minLength": 1 },
    "columns": {
      "type": "object",
      "additionalProperties": { "$ref": "#/$defs/column" }
    }
  },
  "additionalProperties": false,
  "$defs": {
    "column": {
      "type": "object",
      "required": ["dtype", "null_count", "null_pct", "issues"],
      "properties": {
        "dtype": { "type": "string" },
        "null_count": { "type": "integer", "minimum": 0 },
        "null_pct": { "type": "number", "minimum": 0, "maximum": 100 },
        "issues": {
          "type": "array",
          "minItems": 1,
          "items": { "$ref": "#/$defs/issue" }
        }
      }
    },
    "issue": {
      "type": "object",
      "required": ["type", "examples"],
      "properties": {
        "type": {
          "enum": [
            "LEADING_SPACES", "TRAILING_SPACES", "CASE_DUPLICATES",
            "SPECIAL_CHARACTERS", "NUMERIC_STRINGS", "CONSTANT_HOUR",
            "ALWAYS_MIDNIGHT", "DATES_TOO_OLD", "DATES_TOO_FAR_FUTURE",
            "SUSPICIOUS_YEAR", "FUTURE_DATES"
          ]
        },
        "count": { "type": "integer", "minimum": 0 },
        "pct": { "type": "number", "minimum": 0, "maximum": 100 },
        "examples": { "type": "array", "maxItems": 10 },
        "suggestion": { "type": "string" },
        "hour": { "type": "integer", "minimum": 0, "maximum": 23 },
        "year": { "type": "integer" },
        "threshold_year": { "type": "integer" },
        "special_chars": { "type": "array", "items": { "type": "string" } },
        "max_days_in_future": { "type": "integer", "minimum": 0 }
      }
    }
  }
}"##;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Initialize and compile the audit result schema.
///
/// Safe to call more than once.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_schema_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json: Value = serde_json::from_str(AUDIT_RESULT_SCHEMA).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Failed to parse embedded schema: {}", e),
        }
    })?;

    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    let _ = COMPILED_SCHEMA.set(compiled);
    Ok(())
}

fn validator() -> Result<&'static Validator, ValidationError> {
    initialize_schema_validator()?;
    COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Schema validator not initialized".to_string(),
        })
}

/// Validate an exported audit result.
///
/// Initializes the validator on first use.
///
/// # Errors
/// Returns `ValidationFailed` describing the first schema violation.
pub fn validate_audit_result(json_value: &Value) -> Result<(), ValidationError> {
    let schema = validator()?;

    if let Err(validation_error) = schema.validate(json_value) {
        return Err(ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec![format!("Schema validation failed: {}", validation_error)],
        });
    }
    Ok(())
}

/// Parse and validate an audit result document.
pub fn validate_and_parse_result(json_str: &str) -> Result<crate::audit::AuditResult, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;
    validate_audit_result(&json_value)?;
    Ok(serde_json::from_value(json_value)?)
}

/// Scan an exported audit log for credentials.
///
/// Every string in the document is checked for URL passwords and
/// unredacted `password=` style values.
///
/// # Errors
/// Returns `SecurityViolation` naming the offending path.
pub fn validate_audit_log(json_value: &Value) -> Result<(), ValidationError> {
    let key_value = Regex::new(r#"(?i)\b(?:password|passwd|pwd)\s*=\s*('[^']*'|"[^"]*"|[^;\s&]+)"#)
        .map_err(|e| ValidationError::SchemaCompilation {
            message: format!("Credential pattern error: {}", e),
        })?;
    scan_for_credentials(json_value, "", &key_value)
}

fn scan_for_credentials(value: &Value, path: &str, key_value: &Regex) -> Result<(), ValidationError> {
    match value {
        Value::String(s) => {
            if contains_url_credentials(s) {
                return Err(ValidationError::SecurityViolation {
                    reason: format!("Connection string with password found at path '{}'", path),
                });
            }
            let leaked = key_value.captures_iter(s).any(|captures| {
                captures
                    .get(1)
                    .is_some_and(|secret| secret.as_str().trim_matches(['\'', '"']) != REDACTED)
            });
            if leaked {
                return Err(ValidationError::SecurityViolation {
                    reason: format!("Potential password found at path '{}'", path),
                });
            }
        }
        Value::Object(obj) => {
            for (key, val) in obj {
                let new_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                scan_for_credentials(val, &new_path, key_value)?;
            }
        }
        Value::Array(arr) => {
            for (index, item) in arr.iter().enumerate() {
                scan_for_credentials(item, &format!("{}[{}]", path, index), key_value)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Get the embedded audit result schema as a parsed Value
pub fn get_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(AUDIT_RESULT_SCHEMA).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}
