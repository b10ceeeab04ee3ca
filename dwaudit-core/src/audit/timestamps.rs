//! Timestamp detectors.
//!
//! These run on date and datetime columns. Pure date columns have no
//! time-of-day component, so the hour and midnight checks skip them.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::dataset::{ColumnValues, Dataset};
use crate::{AuditError, Result};

use super::config::ReferenceTime;
use super::models::{Example, Issue, IssueKind, percent};

/// Example cap for time-of-day issues.
pub const TIME_PATTERN_EXAMPLE_LIMIT: usize = 3;

/// Example cap for date outlier and future date issues.
pub const DATE_EXAMPLE_LIMIT: usize = 5;

/// Years commonly used as placeholders.
pub const SUSPICIOUS_YEARS: [i32; 5] = [1900, 1970, 2099, 2999, 9999];

/// Maximum distinct hours for a column to count as constant-hour.
const MAX_DISTINCT_HOURS: usize = 3;

const CONSTANT_HOUR_SUGGESTION: &str = "Timestamp appears to be date-only, consider using DATE type";
const MIDNIGHT_SUGGESTION: &str = "All timestamps at midnight - use DATE type instead";
const FUTURE_SUGGESTION: &str = "Values lie after the reference time; check for clock skew or placeholder dates";

trait ToExample {
    fn to_example(&self) -> Example;
}

impl ToExample for NaiveDate {
    fn to_example(&self) -> Example {
        Example::Date(*self)
    }
}

impl ToExample for NaiveDateTime {
    fn to_example(&self) -> Example {
        Example::DateTime(*self)
    }
}

impl ToExample for DateTime<FixedOffset> {
    fn to_example(&self) -> Example {
        Example::DateTimeTz(*self)
    }
}

fn non_null<T>(values: &[Option<T>]) -> Vec<&T> {
    values.iter().flatten().collect()
}

fn examples<T: ToExample>(values: &[&T], limit: usize) -> Vec<Example> {
    values.iter().take(limit).map(|v| v.to_example()).collect()
}

/// Detects constant-hour and midnight-only timestamps.
///
/// `CONSTANT_HOUR` fires when at most three distinct hours occur and the
/// most frequent one covers strictly more than `constant_hour_threshold`
/// of the rows. Ties resolve to the lowest hour. `ALWAYS_MIDNIGHT` fires
/// independently when the 00:00:00 share strictly exceeds
/// `midnight_threshold`.
pub fn check_timestamp_patterns(
    dataset: &Dataset,
    column: &str,
    constant_hour_threshold: f64,
    midnight_threshold: f64,
) -> Result<Vec<Issue>> {
    let col = dataset.require_column(column)?;
    match col.values() {
        ColumnValues::Date(_) => Ok(Vec::new()),
        ColumnValues::DateTime(values) => Ok(time_pattern_issues(
            &non_null(values),
            constant_hour_threshold,
            midnight_threshold,
        )),
        ColumnValues::DateTimeTz(values) => Ok(time_pattern_issues(
            &non_null(values),
            constant_hour_threshold,
            midnight_threshold,
        )),
        _ => Err(AuditError::unsupported(column, "timestamp_patterns", col.dtype())),
    }
}

fn time_pattern_issues<T: Timelike + ToExample>(
    values: &[&T],
    constant_hour_threshold: f64,
    midnight_threshold: f64,
) -> Vec<Issue> {
    let total = values.len();
    if total == 0 {
        return Vec::new();
    }

    let mut issues = Vec::new();
    let mut hour_counts = [0usize; 24];
    for value in values {
        if let Some(slot) = hour_counts.get_mut(value.hour() as usize) {
            *slot = slot.saturating_add(1);
        }
    }

    let distinct_hours = hour_counts.iter().filter(|&&n| n > 0).count();
    if distinct_hours <= MAX_DISTINCT_HOURS {
        let mut top_hour = 0u32;
        let mut top_count = 0usize;
        for (hour, &count) in (0u32..).zip(hour_counts.iter()) {
            if count > top_count {
                top_hour = hour;
                top_count = count;
            }
        }

        let share = top_count as f64 / total as f64;
        if share > constant_hour_threshold {
            issues.push(
                Issue::new(IssueKind::ConstantHour)
                    .with_hour(top_hour)
                    .with_count(top_count)
                    .with_pct(percent(top_count, total))
                    .with_suggestion(CONSTANT_HOUR_SUGGESTION)
                    .with_examples(examples(values, TIME_PATTERN_EXAMPLE_LIMIT)),
            );
        }
    }

    let midnight = values
        .iter()
        .filter(|v| v.hour() == 0 && v.minute() == 0 && v.second() == 0)
        .count();
    if midnight as f64 / total as f64 > midnight_threshold {
        issues.push(
            Issue::new(IssueKind::AlwaysMidnight)
                .with_count(midnight)
                .with_pct(percent(midnight, total))
                .with_suggestion(MIDNIGHT_SUGGESTION)
                .with_examples(examples(values, TIME_PATTERN_EXAMPLE_LIMIT)),
        );
    }

    issues
}

/// Detects years outside `[min_year, max_year]` and placeholder years.
///
/// Each direction is its own issue carrying the most extreme year seen.
/// Every year in [`SUSPICIOUS_YEARS`] that occurs yields a
/// `SUSPICIOUS_YEAR` issue. All three are reported only when their
/// percentage is at least `min_pct`.
pub fn check_date_outliers(
    dataset: &Dataset,
    column: &str,
    min_year: i32,
    max_year: i32,
    min_pct: f64,
) -> Result<Vec<Issue>> {
    let col = dataset.require_column(column)?;
    match col.values() {
        ColumnValues::Date(values) => Ok(outlier_issues(&non_null(values), min_year, max_year, min_pct)),
        ColumnValues::DateTime(values) => {
            Ok(outlier_issues(&non_null(values), min_year, max_year, min_pct))
        }
        ColumnValues::DateTimeTz(values) => {
            Ok(outlier_issues(&non_null(values), min_year, max_year, min_pct))
        }
        _ => Err(AuditError::unsupported(column, "date_outliers", col.dtype())),
    }
}

fn outlier_issues<T: Datelike + ToExample>(
    values: &[&T],
    min_year: i32,
    max_year: i32,
    min_pct: f64,
) -> Vec<Issue> {
    let total = values.len();
    let mut issues = Vec::new();

    let too_old: Vec<&T> = values.iter().copied().filter(|v| v.year() < min_year).collect();
    let pct = percent(too_old.len(), total);
    if !too_old.is_empty() && pct >= min_pct {
        let oldest = too_old.iter().map(|v| v.year()).min().unwrap_or(min_year);
        issues.push(
            Issue::new(IssueKind::DatesTooOld)
                .with_count(too_old.len())
                .with_pct(pct)
                .with_year(oldest)
                .with_threshold_year(min_year)
                .with_suggestion(format!(
                    "Dates before {} are likely placeholders or entry errors",
                    min_year
                ))
                .with_examples(examples(&too_old, DATE_EXAMPLE_LIMIT)),
        );
    }

    let too_new: Vec<&T> = values.iter().copied().filter(|v| v.year() > max_year).collect();
    let pct = percent(too_new.len(), total);
    if !too_new.is_empty() && pct >= min_pct {
        let newest = too_new.iter().map(|v| v.year()).max().unwrap_or(max_year);
        issues.push(
            Issue::new(IssueKind::DatesTooFarFuture)
                .with_count(too_new.len())
                .with_pct(pct)
                .with_year(newest)
                .with_threshold_year(max_year)
                .with_suggestion(format!(
                    "Dates after {} are likely placeholders or entry errors",
                    max_year
                ))
                .with_examples(examples(&too_new, DATE_EXAMPLE_LIMIT)),
        );
    }

    for year in SUSPICIOUS_YEARS {
        let hits: Vec<&T> = values.iter().copied().filter(|v| v.year() == year).collect();
        let pct = percent(hits.len(), total);
        if !hits.is_empty() && pct >= min_pct {
            issues.push(
                Issue::new(IssueKind::SuspiciousYear)
                    .with_year(year)
                    .with_count(hits.len())
                    .with_pct(pct)
                    .with_suggestion(format!(
                        "Year {} is a common placeholder value; verify these rows",
                        year
                    ))
                    .with_examples(examples(&hits, DATE_EXAMPLE_LIMIT)),
            );
        }
    }

    issues
}

/// Detects values later than the reference time.
///
/// Date columns compare against the reference's calendar date. Datetime
/// columns require a reference with the same timezone awareness; a mismatch
/// is a configuration error. Without a fixed reference the current UTC time
/// is used. Fires when the future share strictly exceeds `threshold`.
pub fn check_future_dates(
    dataset: &Dataset,
    column: &str,
    threshold: f64,
    reference: Option<ReferenceTime>,
) -> Result<Vec<Issue>> {
    let col = dataset.require_column(column)?;
    match col.values() {
        ColumnValues::Date(values) => {
            let today = match reference {
                None => Utc::now().date_naive(),
                Some(ReferenceTime::Naive(r)) => r.date(),
                Some(ReferenceTime::Aware(r)) => r.date_naive(),
            };
            Ok(future_issues(&non_null(values), threshold, |d| {
                (**d > today).then(|| (**d - today).num_days())
            }))
        }
        ColumnValues::DateTime(values) => {
            let now = match reference {
                None => Utc::now().naive_utc(),
                Some(ReferenceTime::Naive(r)) => r,
                Some(ReferenceTime::Aware(_)) => {
                    return Err(AuditError::configuration(format!(
                        "Column '{}' is timezone-naive but the reference time is timezone-aware",
                        column
                    )));
                }
            };
            Ok(future_issues(&non_null(values), threshold, |dt| {
                (**dt > now).then(|| (**dt - now).num_days())
            }))
        }
        ColumnValues::DateTimeTz(values) => {
            let now = match reference {
                None => Utc::now().fixed_offset(),
                Some(ReferenceTime::Aware(r)) => r,
                Some(ReferenceTime::Naive(_)) => {
                    return Err(AuditError::configuration(format!(
                        "Column '{}' is timezone-aware but the reference time is timezone-naive",
                        column
                    )));
                }
            };
            Ok(future_issues(&non_null(values), threshold, |dt| {
                (**dt > now).then(|| (**dt - now).num_days())
            }))
        }
        _ => Err(AuditError::unsupported(column, "future_dates", col.dtype())),
    }
}

/// `days_ahead` returns `Some(days)` for values after the reference.
fn future_issues<T: ToExample>(
    values: &[&T],
    threshold: f64,
    days_ahead: impl Fn(&&T) -> Option<i64>,
) -> Vec<Issue> {
    let total = values.len();
    let mut future: Vec<&T> = Vec::new();
    let mut max_days = 0i64;
    for value in values {
        if let Some(days) = days_ahead(value) {
            max_days = max_days.max(days);
            future.push(*value);
        }
    }

    if future.is_empty() || future.len() as f64 / total as f64 <= threshold {
        return Vec::new();
    }

    vec![
        Issue::new(IssueKind::FutureDates)
            .with_count(future.len())
            .with_pct(percent(future.len(), total))
            .with_max_days_in_future(max_days)
            .with_suggestion(FUTURE_SUGGESTION)
            .with_examples(examples(&future, DATE_EXAMPLE_LIMIT)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        ymd(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    fn datetime_dataset(values: Vec<Option<NaiveDateTime>>) -> Dataset {
        Dataset::new(vec![Column::datetime("ts", values)]).unwrap()
    }

    fn date_dataset(values: Vec<Option<NaiveDate>>) -> Dataset {
        Dataset::new(vec![Column::date("d", values)]).unwrap()
    }

    #[test]
    fn test_all_midnight_fires_both() {
        let values = (0..1000)
            .map(|i| Some(at(2024, 1, 1, 0, 0, 0) + chrono::Duration::days(i % 300)))
            .collect();
        let dataset = datetime_dataset(values);
        let issues = check_timestamp_patterns(&dataset, "ts", 0.9, 0.95).unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::ConstantHour);
        assert_eq!(issues[0].hour, Some(0));
        assert_eq!(issues[0].pct, Some(100.0));
        assert_eq!(issues[0].examples.len(), TIME_PATTERN_EXAMPLE_LIMIT);
        assert_eq!(issues[1].kind, IssueKind::AlwaysMidnight);
        assert_eq!(issues[1].pct, Some(100.0));
    }

    #[test]
    fn test_date_columns_skip_time_checks() {
        let dataset = date_dataset(vec![Some(ymd(2024, 1, 1)); 10]);
        assert!(check_timestamp_patterns(&dataset, "d", 0.0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_constant_hour_not_midnight() {
        let values = (0..20).map(|i| Some(at(2024, 2, 1 + i % 20, 9, 30, 0))).collect();
        let dataset = datetime_dataset(values);
        let issues = check_timestamp_patterns(&dataset, "ts", 0.9, 0.95).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ConstantHour);
        assert_eq!(issues[0].hour, Some(9));
    }

    #[test]
    fn test_many_distinct_hours_not_constant() {
        let values = (0..24).map(|h| Some(at(2024, 1, 1, h, 0, 0))).collect();
        let dataset = datetime_dataset(values);
        assert!(check_timestamp_patterns(&dataset, "ts", 0.0, 0.95).unwrap().is_empty());
    }

    #[test]
    fn test_constant_hour_tie_breaks_to_lowest_hour() {
        let values = vec![
            Some(at(2024, 1, 1, 14, 0, 0)),
            Some(at(2024, 1, 2, 6, 0, 0)),
            Some(at(2024, 1, 3, 14, 0, 0)),
            Some(at(2024, 1, 4, 6, 0, 0)),
        ];
        let dataset = datetime_dataset(values);
        let issues = check_timestamp_patterns(&dataset, "ts", 0.4, 0.95).unwrap();
        assert_eq!(issues[0].hour, Some(6));
        assert_eq!(issues[0].pct, Some(50.0));
    }

    #[test]
    fn test_aware_timestamps_use_local_hour() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let values = (1..=5)
            .map(|d| Some(offset.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()))
            .collect();
        let dataset = Dataset::new(vec![Column::datetime_tz("ts", values)]).unwrap();
        let issues = check_timestamp_patterns(&dataset, "ts", 0.9, 0.95).unwrap();
        assert!(issues.iter().any(|i| i.kind == IssueKind::AlwaysMidnight));
    }

    #[test]
    fn test_single_suspicious_year_among_many() {
        let mut values = vec![Some(ymd(2020, 6, 15)); 9999];
        values.push(Some(ymd(1900, 1, 1)));
        let dataset = date_dataset(values);
        let issues = check_date_outliers(&dataset, "d", 1950, 2100, 0.0).unwrap();

        let suspicious = issues
            .iter()
            .find(|i| i.kind == IssueKind::SuspiciousYear)
            .unwrap();
        assert_eq!(suspicious.year, Some(1900));
        assert_eq!(suspicious.count, Some(1));
        assert!((suspicious.pct.unwrap() - 0.01).abs() < 1e-9);

        let too_old = issues.iter().find(|i| i.kind == IssueKind::DatesTooOld).unwrap();
        assert_eq!(too_old.year, Some(1900));
        assert_eq!(too_old.threshold_year, Some(1950));
    }

    #[test]
    fn test_outliers_report_extreme_years() {
        let dataset = date_dataset(vec![
            Some(ymd(1920, 1, 1)),
            Some(ymd(1801, 5, 5)),
            Some(ymd(2150, 1, 1)),
            Some(ymd(3000, 1, 1)),
            Some(ymd(2000, 1, 1)),
            None,
        ]);
        let issues = check_date_outliers(&dataset, "d", 1950, 2100, 0.0).unwrap();

        assert_eq!(issues[0].kind, IssueKind::DatesTooOld);
        assert_eq!(issues[0].year, Some(1801));
        assert_eq!(issues[0].count, Some(2));
        assert_eq!(issues[0].pct, Some(40.0));
        assert_eq!(issues[1].kind, IssueKind::DatesTooFarFuture);
        assert_eq!(issues[1].year, Some(3000));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_outlier_min_pct_gate_is_inclusive() {
        let dataset = date_dataset(vec![
            Some(ymd(1800, 1, 1)),
            Some(ymd(2000, 1, 1)),
            Some(ymd(2000, 1, 1)),
            Some(ymd(2000, 1, 1)),
        ]);
        let at_boundary = check_date_outliers(&dataset, "d", 1950, 2100, 25.0).unwrap();
        assert_eq!(at_boundary.len(), 1);

        let above = check_date_outliers(&dataset, "d", 1950, 2100, 25.1).unwrap();
        assert!(above.is_empty());
    }

    #[test]
    fn test_outlier_examples_capped() {
        let values = (0..12).map(|i| Some(ymd(1900, 1, 1 + i))).collect();
        let dataset = date_dataset(values);
        let issues = check_date_outliers(&dataset, "d", 1950, 2100, 0.0).unwrap();
        for issue in issues {
            assert!(issue.examples.len() <= DATE_EXAMPLE_LIMIT);
        }
    }

    #[test]
    fn test_future_dates_naive() {
        let reference = ReferenceTime::Naive(at(2024, 1, 1, 0, 0, 0));
        let dataset = datetime_dataset(vec![
            Some(at(2023, 12, 31, 23, 0, 0)),
            Some(at(2024, 1, 11, 0, 0, 0)),
            Some(at(2024, 3, 1, 12, 0, 0)),
            None,
        ]);
        let issues = check_future_dates(&dataset, "ts", 0.0, Some(reference)).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::FutureDates);
        assert_eq!(issues[0].count, Some(2));
        assert_eq!(issues[0].max_days_in_future, Some(60));
        assert!((issues[0].pct.unwrap() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_future_dates_threshold_is_exclusive() {
        let reference = ReferenceTime::Naive(at(2024, 1, 1, 0, 0, 0));
        let dataset = datetime_dataset(vec![
            Some(at(2025, 1, 1, 0, 0, 0)),
            Some(at(2020, 1, 1, 0, 0, 0)),
        ]);
        assert!(check_future_dates(&dataset, "ts", 0.5, Some(reference)).unwrap().is_empty());
    }

    #[test]
    fn test_future_dates_on_date_column() {
        let reference = ReferenceTime::Naive(at(2024, 1, 1, 15, 0, 0));
        let dataset = date_dataset(vec![Some(ymd(2024, 1, 1)), Some(ymd(2024, 1, 3))]);
        let issues = check_future_dates(&dataset, "d", 0.0, Some(reference)).unwrap();

        assert_eq!(issues[0].count, Some(1));
        assert_eq!(issues[0].max_days_in_future, Some(2));
    }

    #[test]
    fn test_future_dates_timezone_mismatch_is_config_error() {
        let aware = ReferenceTime::Aware(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().fixed_offset());
        let dataset = datetime_dataset(vec![Some(at(2030, 1, 1, 0, 0, 0))]);
        let result = check_future_dates(&dataset, "ts", 0.0, Some(aware));
        assert!(matches!(result, Err(AuditError::Configuration { .. })));

        let naive = ReferenceTime::Naive(at(2024, 1, 1, 0, 0, 0));
        let tz_dataset = Dataset::new(vec![Column::datetime_tz(
            "ts",
            vec![Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap().fixed_offset())],
        )])
        .unwrap();
        let result = check_future_dates(&tz_dataset, "ts", 0.0, Some(naive));
        assert!(matches!(result, Err(AuditError::Configuration { .. })));
    }

    #[test]
    fn test_future_dates_default_reference_is_now() {
        let dataset = date_dataset(vec![Some(ymd(9999, 12, 31)), Some(ymd(2000, 1, 1))]);
        let issues = check_future_dates(&dataset, "d", 0.0, None).unwrap();
        assert_eq!(issues[0].count, Some(1));
    }

    #[test]
    fn test_timestamp_detectors_reject_text() {
        let dataset = Dataset::new(vec![Column::text("t", vec![Some("2024-01-01")])]).unwrap();
        assert!(matches!(
            check_date_outliers(&dataset, "t", 1950, 2100, 0.0),
            Err(AuditError::UnsupportedColumnType { .. })
        ));
    }
}
