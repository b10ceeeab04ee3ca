//! HTML audit report rendered with askama.

use askama::Template;
use dwaudit_core::export::{issue_headline, summary};
use dwaudit_core::{AuditError, AuditResult, Result};

/// One issue, pre-formatted for display.
pub struct IssueView {
    pub title: String,
    pub headline: String,
    pub details: Vec<String>,
    pub examples: Vec<String>,
    pub suggestion: String,
}

/// One flagged column.
pub struct ColumnView {
    pub name: String,
    pub dtype: String,
    pub nulls: String,
    pub issues: Vec<IssueView>,
}

/// Issue count per issue type.
pub struct BreakdownRow {
    pub kind: String,
    pub count: usize,
}

/// Full-page report for a single table.
#[derive(Template)]
#[template(path = "report.html")]
pub struct HtmlReport {
    pub table_name: String,
    pub total_rows: u64,
    pub analyzed_rows: u64,
    pub sampled: bool,
    pub timestamp: String,
    pub total_issues: usize,
    pub columns_with_issues: usize,
    pub breakdown: Vec<BreakdownRow>,
    pub columns: Vec<ColumnView>,
}

impl HtmlReport {
    /// Builds the view model from an audit result.
    pub fn from_result(result: &AuditResult) -> Self {
        let stats = summary(result);

        let columns = result
            .columns
            .iter()
            .map(|(name, column)| ColumnView {
                name: name.clone(),
                dtype: column.dtype.clone(),
                nulls: if column.null_count > 0 {
                    format!("{} ({:.1}%)", column.null_count, column.null_pct)
                } else {
                    String::new()
                },
                issues: column
                    .issues
                    .iter()
                    .map(|issue| {
                        let mut details = Vec::new();
                        if let Some(chars) = &issue.special_chars {
                            details.push(format!("Characters: {}", chars.join(" ")));
                        }
                        if let Some(days) = issue.max_days_in_future {
                            details.push(format!("Furthest: {} days ahead", days));
                        }
                        IssueView {
                            title: issue.kind.title(),
                            headline: issue_headline(issue),
                            details,
                            examples: issue.examples.iter().map(ToString::to_string).collect(),
                            suggestion: issue.suggestion.clone().unwrap_or_default(),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            table_name: stats.table_name,
            total_rows: stats.total_rows,
            analyzed_rows: stats.analyzed_rows,
            sampled: stats.sampled,
            timestamp: stats.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            total_issues: stats.total_issues,
            columns_with_issues: stats.columns_with_issues,
            breakdown: stats
                .issue_breakdown
                .into_iter()
                .map(|(kind, count)| BreakdownRow { kind, count })
                .collect(),
            columns,
        }
    }
}

/// Renders the HTML report for one result.
///
/// # Errors
/// Returns an export error if the template fails to render.
pub fn render_html(result: &AuditResult) -> Result<String> {
    HtmlReport::from_result(result)
        .render()
        .map_err(|e| AuditError::export(format!("Failed to render HTML report: {}", e)))
}
