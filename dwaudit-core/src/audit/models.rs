//! Audit result models.
//!
//! An [`AuditResult`] is built once per audited table and handed to the
//! exporters unchanged. Issue examples are copied values from the audited
//! data, so results should be treated with the same care as the data.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::security::redact_connection_string;

/// Hard cap on stored examples for any issue.
pub const MAX_EXAMPLES: usize = 10;

/// Computes `count / total * 100`, clamped to `[0, 100]`.
///
/// Returns 0 when `total` is 0.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Defect family reported by a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// Values starting with a space
    LeadingSpaces,
    /// Values ending with a space
    TrailingSpaces,
    /// Values that differ only by letter case
    CaseDuplicates,
    /// Values containing non-standard characters
    SpecialCharacters,
    /// Text column holding mostly numbers
    NumericStrings,
    /// Timestamps concentrated on a single hour
    ConstantHour,
    /// Timestamps always at 00:00:00
    AlwaysMidnight,
    /// Years below the configured minimum
    DatesTooOld,
    /// Years above the configured maximum
    DatesTooFarFuture,
    /// Known placeholder years such as 1900 or 9999
    SuspiciousYear,
    /// Values after the reference time
    FutureDates,
}

impl IssueKind {
    /// Wire name of the issue kind, e.g. `LEADING_SPACES`.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::LeadingSpaces => "LEADING_SPACES",
            IssueKind::TrailingSpaces => "TRAILING_SPACES",
            IssueKind::CaseDuplicates => "CASE_DUPLICATES",
            IssueKind::SpecialCharacters => "SPECIAL_CHARACTERS",
            IssueKind::NumericStrings => "NUMERIC_STRINGS",
            IssueKind::ConstantHour => "CONSTANT_HOUR",
            IssueKind::AlwaysMidnight => "ALWAYS_MIDNIGHT",
            IssueKind::DatesTooOld => "DATES_TOO_OLD",
            IssueKind::DatesTooFarFuture => "DATES_TOO_FAR_FUTURE",
            IssueKind::SuspiciousYear => "SUSPICIOUS_YEAR",
            IssueKind::FutureDates => "FUTURE_DATES",
        }
    }

    /// Human-readable title, e.g. `Leading Spaces`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_string() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One example value attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Example {
    /// A text value (possibly quoted to show whitespace)
    Text(String),
    /// A date value
    Date(NaiveDate),
    /// A naive timestamp
    DateTime(NaiveDateTime),
    /// An offset-aware timestamp
    DateTimeTz(DateTime<FixedOffset>),
    /// Lower-cased key with the distinct casings observed for it
    CaseVariants(String, Vec<String>),
}

impl fmt::Display for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Example::Text(s) => f.write_str(s),
            Example::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Example::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Example::DateTimeTz(dt) => f.write_str(&dt.to_rfc3339()),
            Example::CaseVariants(key, variants) => {
                write!(f, "'{}' -> [{}]", key, variants.join(", "))
            }
        }
    }
}

/// A single reported defect with its supporting statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Defect family
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Affected rows, or affected groups for case duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Affected share of non-null rows, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct: Option<f64>,
    /// First few offending values in dataset order
    #[serde(default)]
    pub examples: Vec<Example>,
    /// Remediation hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Dominant hour for `CONSTANT_HOUR`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    /// Extreme or placeholder year for date outlier issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Configured bound that was crossed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_year: Option<i32>,
    /// Distinct offending characters for `SPECIAL_CHARACTERS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_chars: Option<Vec<String>>,
    /// Largest distance into the future, in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_days_in_future: Option<i64>,
}

impl Issue {
    /// Creates an issue with no statistics attached.
    pub fn new(kind: IssueKind) -> Self {
        Self {
            kind,
            count: None,
            pct: None,
            examples: Vec::new(),
            suggestion: None,
            hour: None,
            year: None,
            threshold_year: None,
            special_chars: None,
            max_days_in_future: None,
        }
    }

    /// Builder method to set the affected count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count as u64);
        self
    }

    /// Builder method to set the percentage, clamped to `[0, 100]`.
    pub fn with_pct(mut self, pct: f64) -> Self {
        self.pct = Some(pct.clamp(0.0, 100.0));
        self
    }

    /// Builder method to set examples, keeping at most [`MAX_EXAMPLES`].
    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self.examples.truncate(MAX_EXAMPLES);
        self
    }

    /// Builder method to set the suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder method to set the dominant hour.
    pub fn with_hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    /// Builder method to set the reported year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Builder method to set the crossed year bound.
    pub fn with_threshold_year(mut self, year: i32) -> Self {
        self.threshold_year = Some(year);
        self
    }

    /// Builder method to set the offending characters.
    pub fn with_special_chars(mut self, chars: Vec<String>) -> Self {
        self.special_chars = Some(chars);
        self
    }

    /// Builder method to set the largest future distance.
    pub fn with_max_days_in_future(mut self, days: i64) -> Self {
        self.max_days_in_future = Some(days);
        self
    }
}

/// Audit outcome for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnResult {
    /// Column type label
    pub dtype: String,
    /// Null cells in the analyzed rows
    pub null_count: u64,
    /// Null share of the analyzed rows, in percent
    pub null_pct: f64,
    /// Issues in detector invocation order; empty means clean
    pub issues: Vec<Issue>,
}

impl ColumnResult {
    /// Creates a clean column result.
    pub fn new(dtype: impl Into<String>, null_count: usize, total_rows: usize) -> Self {
        Self {
            dtype: dtype.into(),
            null_count: null_count as u64,
            null_pct: percent(null_count, total_rows),
            issues: Vec::new(),
        }
    }

    /// Builder method to set the issues.
    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    /// Returns true when at least one issue was reported.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Audit outcome for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Audited table name
    pub table_name: String,
    /// Rows in the source table
    pub total_rows: u64,
    /// Whether only a subset of rows was analyzed
    pub sampled: bool,
    /// Rows actually analyzed
    pub analyzed_rows: u64,
    /// Columns with at least one issue
    pub columns: BTreeMap<String, ColumnResult>,
    /// When the audit ran
    pub timestamp: DateTime<Utc>,
}

impl AuditResult {
    /// Creates an empty result. `sampled` is derived from the row counts.
    pub fn new(table_name: impl Into<String>, total_rows: usize, analyzed_rows: usize) -> Self {
        Self {
            table_name: table_name.into(),
            total_rows: total_rows as u64,
            sampled: analyzed_rows < total_rows,
            analyzed_rows: analyzed_rows as u64,
            columns: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Builder method to pin the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Records a column result. Clean columns are dropped.
    ///
    /// Returns true when the column was retained.
    pub fn insert_column(&mut self, name: impl Into<String>, result: ColumnResult) -> bool {
        if !result.has_issues() {
            return false;
        }
        self.columns.insert(name.into(), result);
        true
    }

    /// Total number of issues across all columns.
    pub fn total_issues(&self) -> usize {
        self.columns.values().map(|c| c.issues.len()).sum()
    }

    /// Returns true when no column reported an issue.
    pub fn is_clean(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One entry of the per-auditor invocation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// When the audit was requested
    pub timestamp: DateTime<Utc>,
    /// Table that was audited
    pub table: String,
    /// Redacted source descriptor
    pub connection: String,
}

impl AuditLogEntry {
    /// Creates an entry, redacting credentials from the descriptor.
    pub fn new(table: impl Into<String>, connection: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            table: table.into(),
            connection: redact_connection_string(connection),
        }
    }
}
