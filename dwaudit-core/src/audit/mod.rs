//! Column audit engine.
//!
//! Detects data-quality defects column by column:
//! - **Strings**: leading/trailing spaces, case duplicates, special
//!   characters, numbers stored as text
//! - **Timestamps**: constant hour, always midnight, out-of-range and
//!   placeholder years, future dates
//!
//! # Security Guarantees
//! - PII columns can be masked before any value is inspected
//! - Audit log entries store redacted source descriptors only
//! - Examples are capped per issue
//!
//! # Example
//! ```rust
//! use dwaudit_core::audit::{AuditConfig, Auditor, IssueKind};
//! use dwaudit_core::dataset::{Column, Dataset};
//!
//! let dataset = Dataset::new(vec![Column::text(
//!     "code",
//!     vec![Some("1"), Some("2"), Some("3"), Some("4")],
//! )])
//! .unwrap();
//!
//! let result = Auditor::new(AuditConfig::default()).audit(&dataset, "codes", None);
//! assert_eq!(result.columns["code"].issues[0].kind, IssueKind::NumericStrings);
//! ```

mod auditor;
mod config;
mod dispatch;
pub mod masking;
mod models;
pub mod sampling;
pub mod strings;
pub mod timestamps;

pub use auditor::Auditor;
pub use config::{
    AuditConfig, Check, CheckConfig, ConfigValidationError, DEFAULT_SPECIAL_CHARS_PATTERN,
    MaskingConfig, ReferenceTime, Thresholds,
};
pub use dispatch::audit_column;
pub use masking::{MaskOutcome, PII_MASK_SENTINEL, is_masked, mask_pii_columns};
pub use models::{
    AuditLogEntry, AuditResult, ColumnResult, Example, Issue, IssueKind, MAX_EXAMPLES, percent,
};
