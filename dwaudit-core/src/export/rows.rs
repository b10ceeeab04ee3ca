//! Flat issue rows.
//!
//! One row per issue, suitable for spreadsheets and for loading audit
//! history into a warehouse table.

use serde::Serialize;

use crate::audit::AuditResult;
use crate::{AuditError, Result};

/// One issue flattened together with its table and column context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub table_name: String,
    pub total_rows: u64,
    pub analyzed_rows: u64,
    pub sampled: bool,
    pub column_name: String,
    pub column_dtype: String,
    pub null_count: u64,
    pub null_pct: f64,
    pub issue_type: String,
    pub issue_count: u64,
    pub issue_pct: f64,
    pub suggestion: String,
    /// Examples joined with ` | `
    pub examples: String,
    pub audit_timestamp: String,
}

/// Flattens a result into issue rows, in column name order.
pub fn issue_rows(result: &AuditResult) -> Vec<IssueRow> {
    let timestamp = result.timestamp.to_rfc3339();
    result
        .columns
        .iter()
        .flat_map(|(column_name, column)| {
            let timestamp = timestamp.clone();
            column.issues.iter().map(move |issue| IssueRow {
                table_name: result.table_name.clone(),
                total_rows: result.total_rows,
                analyzed_rows: result.analyzed_rows,
                sampled: result.sampled,
                column_name: column_name.clone(),
                column_dtype: column.dtype.clone(),
                null_count: column.null_count,
                null_pct: column.null_pct,
                issue_type: issue.kind.as_str().to_string(),
                issue_count: issue.count.unwrap_or(0),
                issue_pct: issue.pct.unwrap_or(0.0),
                suggestion: issue.suggestion.clone().unwrap_or_default(),
                examples: issue
                    .examples
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" | "),
                audit_timestamp: timestamp.clone(),
            })
        })
        .collect()
}

/// Renders the issue rows of several results as CSV with a header row.
///
/// The header is written even when there are no issues.
pub fn to_csv(results: &[AuditResult]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record([
            "table_name",
            "total_rows",
            "analyzed_rows",
            "sampled",
            "column_name",
            "column_dtype",
            "null_count",
            "null_pct",
            "issue_type",
            "issue_count",
            "issue_pct",
            "suggestion",
            "examples",
            "audit_timestamp",
        ])
        .map_err(|e| AuditError::export(format!("Failed to write CSV header: {}", e)))?;

    for row in results.iter().flat_map(issue_rows) {
        writer
            .serialize(&row)
            .map_err(|e| AuditError::export(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AuditError::export(format!("Failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AuditError::export(format!("CSV output is not UTF-8: {}", e)))
}
