//! Core library for dwaudit, a column auditor for tabular data.
//!
//! This crate provides the dataset model, the defect detectors, the audit
//! orchestrator, result exporters, and loaders for files and SQLite.
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - PII columns are masked before auditing unless disabled
//! - All database operations are read-only
//!
//! # Architecture
//! - Detectors are pure functions of a dataset, a column, and thresholds
//! - The dispatcher picks detectors by semantic type and isolates failures
//! - Loaders implement the `TableSource` trait and stay outside the
//!   decision logic

pub mod audit;
pub mod dataset;
pub mod error;
pub mod export;
pub mod logging;
pub mod security;
pub mod sources;
pub mod validation;

// Re-export commonly used types
pub use audit::{
    AuditConfig, AuditLogEntry, AuditResult, Auditor, Check, CheckConfig, ColumnResult, Issue,
    IssueKind, Thresholds,
};
pub use dataset::{Column, ColumnValues, Dataset, SemanticType};
pub use error::{AuditError, Result};
pub use sources::{FileSource, TableSource};
#[cfg(feature = "sqlite")]
pub use sources::SqliteSource;

pub use validation::{
    ValidationError, initialize_schema_validator, validate_audit_log, validate_audit_result,
};
