//! Column dispatcher.
//!
//! Picks the detectors that apply to a column's semantic type, runs the
//! enabled ones in a fixed order, and concatenates their issues.

use tracing::{debug, warn};

use crate::dataset::{Dataset, SemanticType};
use crate::{AuditError, Result};

use super::config::{Check, CheckConfig};
use super::masking::is_masked;
use super::models::{ColumnResult, Issue};
use super::strings::{
    check_case_duplicates, check_leading_trailing_spaces, check_numeric_strings,
    check_special_characters,
};
use super::timestamps::{check_date_outliers, check_future_dates, check_timestamp_patterns};

/// Audits a single column.
///
/// All-null and masked columns return immediately with no issues. Text
/// columns run spaces, case, special character and numeric checks in that
/// order; temporal columns run pattern, outlier and future checks. Other
/// types run nothing.
///
/// A failing detector is logged and contributes no issues. Configuration
/// errors (for example a timezone mismatch) fail the whole column.
///
/// # Errors
/// Returns an error if the column does not exist or a detector reports a
/// configuration error.
pub fn audit_column(dataset: &Dataset, column: &str, config: &CheckConfig) -> Result<ColumnResult> {
    let col = dataset.require_column(column)?;
    let total_rows = dataset.row_count();
    let null_count = col.null_count();
    let result = ColumnResult::new(col.dtype(), null_count, total_rows);

    if null_count == total_rows {
        debug!("Column '{}' skipped: all values null", column);
        return Ok(result);
    }
    if is_masked(col) {
        debug!("Column '{}' skipped: PII masked", column);
        return Ok(result);
    }

    let thresholds = &config.thresholds;
    let mut issues = Vec::new();
    let semantic_type = col.semantic_type();

    match semantic_type {
        SemanticType::Text => {
            if config.is_enabled(Check::TrailingSpaces) {
                collect(&mut issues, column, Check::TrailingSpaces, || {
                    check_leading_trailing_spaces(dataset, column)
                })?;
            }
            if config.is_enabled(Check::CaseDuplicates) {
                collect(&mut issues, column, Check::CaseDuplicates, || {
                    check_case_duplicates(dataset, column)
                })?;
            }
            if config.is_enabled(Check::SpecialChars) {
                collect(&mut issues, column, Check::SpecialChars, || {
                    check_special_characters(dataset, column, &thresholds.special_chars_pattern)
                })?;
            }
            if config.is_enabled(Check::NumericStrings) {
                collect(&mut issues, column, Check::NumericStrings, || {
                    check_numeric_strings(dataset, column, thresholds.numeric_string_threshold)
                })?;
            }
        }
        ref temporal if temporal.is_temporal() => {
            if config.is_enabled(Check::TimestampPatterns) {
                collect(&mut issues, column, Check::TimestampPatterns, || {
                    check_timestamp_patterns(
                        dataset,
                        column,
                        thresholds.constant_hour_threshold,
                        thresholds.midnight_threshold,
                    )
                })?;
            }
            if config.is_enabled(Check::DateOutliers) {
                collect(&mut issues, column, Check::DateOutliers, || {
                    check_date_outliers(
                        dataset,
                        column,
                        thresholds.min_year,
                        thresholds.max_year,
                        thresholds.outlier_min_pct,
                    )
                })?;
            }
            if config.is_enabled(Check::FutureDates) {
                collect(&mut issues, column, Check::FutureDates, || {
                    check_future_dates(
                        dataset,
                        column,
                        thresholds.future_threshold,
                        thresholds.reference_time,
                    )
                })?;
            }
        }
        other => {
            debug!(
                "Column '{}' skipped: no detectors for type {}",
                column,
                other.label()
            );
        }
    }

    Ok(result.with_issues(issues))
}

/// Runs one detector, keeping its issues or logging its failure.
fn collect(
    issues: &mut Vec<Issue>,
    column: &str,
    check: Check,
    detector: impl FnOnce() -> Result<Vec<Issue>>,
) -> Result<()> {
    match detector() {
        Ok(found) => {
            debug!("Column '{}': {} reported {} issue(s)", column, check, found.len());
            issues.extend(found);
            Ok(())
        }
        Err(e @ AuditError::Configuration { .. }) => Err(e),
        Err(e) => {
            warn!("Detector {} failed on column '{}': {}", check, column, e);
            Ok(())
        }
    }
}
