//! Summary statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::audit::AuditResult;

/// High-level view of one audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub table_name: String,
    pub total_rows: u64,
    pub analyzed_rows: u64,
    pub sampled: bool,
    pub total_issues: usize,
    pub columns_with_issues: usize,
    /// Issue count per issue type name
    pub issue_breakdown: BTreeMap<String, usize>,
    pub timestamp: DateTime<Utc>,
}

/// Summarizes a result.
pub fn summary(result: &AuditResult) -> SummaryStats {
    let mut issue_breakdown = BTreeMap::new();
    for issue in result.columns.values().flat_map(|c| &c.issues) {
        *issue_breakdown
            .entry(issue.kind.as_str().to_string())
            .or_insert(0) += 1;
    }

    SummaryStats {
        table_name: result.table_name.clone(),
        total_rows: result.total_rows,
        analyzed_rows: result.analyzed_rows,
        sampled: result.sampled,
        total_issues: result.total_issues(),
        columns_with_issues: result.columns.len(),
        issue_breakdown,
        timestamp: result.timestamp,
    }
}
