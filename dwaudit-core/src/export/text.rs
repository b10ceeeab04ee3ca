//! Plain-text console report.

use std::fmt::Write;

use crate::audit::{AuditResult, Issue, IssueKind};

/// One-line summary of an issue's statistics.
pub fn issue_headline(issue: &Issue) -> String {
    let count = issue.count.unwrap_or(0);
    let pct = issue.pct.unwrap_or(0.0);
    match issue.kind {
        IssueKind::CaseDuplicates => {
            format!("{} values with case variations", count)
        }
        IssueKind::ConstantHour => format!(
            "{:.1}% at hour {}",
            pct,
            issue.hour.map_or_else(|| "?".to_string(), |h| h.to_string())
        ),
        IssueKind::AlwaysMidnight => format!("{:.1}% of timestamps", pct),
        IssueKind::SuspiciousYear => format!(
            "year {}: {} rows ({:.2}%)",
            issue.year.map_or_else(|| "?".to_string(), |y| y.to_string()),
            count,
            pct
        ),
        _ => format!("{} rows ({:.2}%)", count, pct),
    }
}

/// Renders a result as a human-readable report.
pub fn render_text(result: &AuditResult) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Audit: {}", result.table_name);
    let _ = writeln!(out, "Total rows: {}", result.total_rows);
    if result.sampled {
        let _ = writeln!(out, "Analyzed rows: {} (sampled)", result.analyzed_rows);
    }
    let _ = writeln!(out, "{}", rule);

    if result.is_clean() {
        let _ = writeln!(out, "No issues found");
        return out;
    }

    for (name, column) in &result.columns {
        let _ = writeln!(out);
        let _ = writeln!(out, "Column: {} ({})", name, column.dtype);
        if column.null_count > 0 {
            let _ = writeln!(out, "  Nulls: {} ({:.1}%)", column.null_count, column.null_pct);
        }

        for issue in &column.issues {
            let _ = writeln!(out, "  - {}: {}", issue.kind.title(), issue_headline(issue));
            if let Some(chars) = &issue.special_chars {
                let _ = writeln!(out, "    Characters: {}", chars.join(" "));
            }
            if let Some(days) = issue.max_days_in_future {
                let _ = writeln!(out, "    Furthest: {} days ahead", days);
            }
            match issue.kind {
                IssueKind::CaseDuplicates => {
                    for example in &issue.examples {
                        let _ = writeln!(out, "    {}", example);
                    }
                }
                _ if !issue.examples.is_empty() => {
                    let examples: Vec<String> = issue.examples.iter().map(ToString::to_string).collect();
                    let _ = writeln!(out, "    Examples: {}", examples.join(", "));
                }
                _ => {}
            }
            if let Some(suggestion) = &issue.suggestion {
                let _ = writeln!(out, "    Suggestion: {}", suggestion);
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} issue(s) in {} column(s)",
        result.total_issues(),
        result.columns.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ColumnResult, Example};

    #[test]
    fn test_render_clean_result() {
        let text = render_text(&AuditResult::new("t", 5, 5));
        assert!(text.contains("Audit: t"));
        assert!(text.contains("No issues found"));
        assert!(!text.contains("sampled"));
    }

    #[test]
    fn test_render_issues() {
        let mut result = AuditResult::new("events", 2_000_000, 100_000);
        result.insert_column(
            "created_at",
            ColumnResult::new("datetime", 10, 100_000).with_issues(vec![
                Issue::new(IssueKind::ConstantHour)
                    .with_count(99_000)
                    .with_pct(99.0)
                    .with_hour(0)
                    .with_suggestion("Check whether the time component is meaningful"),
            ]),
        );
        result.insert_column(
            "city",
            ColumnResult::new("text", 0, 100_000).with_issues(vec![
                Issue::new(IssueKind::CaseDuplicates)
                    .with_count(1)
                    .with_examples(vec![Example::CaseVariants(
                        "paris".into(),
                        vec!["Paris".into(), "PARIS".into()],
                    )]),
            ]),
        );

        let text = render_text(&result);
        assert!(text.contains("Analyzed rows: 100000 (sampled)"));
        assert!(text.contains("Constant Hour: 99.0% at hour 0"));
        assert!(text.contains("Nulls: 10"));
        assert!(text.contains("'paris' -> [Paris, PARIS]"));
        assert!(text.contains("Suggestion: Check whether"));
        assert!(text.contains("2 issue(s) in 2 column(s)"));
    }
}
