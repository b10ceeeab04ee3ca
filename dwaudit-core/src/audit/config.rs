//! Audit configuration.
//!
//! This module holds the sampling policy knobs, the per-detector switches,
//! detector thresholds, and PII masking options. Every field has a default,
//! so a JSON config file only needs the values it overrides.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::{AuditError, Result};

/// Default pattern for characters outside alphanumerics, whitespace and `.,-_@`.
pub const DEFAULT_SPECIAL_CHARS_PATTERN: &str = r"[^a-zA-Z0-9\s\.,\-_@]";

/// Individually switchable detector families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Leading and trailing spaces
    TrailingSpaces,
    /// Case-only duplicates
    CaseDuplicates,
    /// Non-standard characters
    SpecialChars,
    /// Numbers stored as text
    NumericStrings,
    /// Constant hour and midnight-only timestamps
    TimestampPatterns,
    /// Implausible and placeholder years
    DateOutliers,
    /// Values after the reference time
    FutureDates,
}

impl Check {
    /// All checks in detector invocation order.
    pub const ALL: [Check; 7] = [
        Check::TrailingSpaces,
        Check::CaseDuplicates,
        Check::SpecialChars,
        Check::NumericStrings,
        Check::TimestampPatterns,
        Check::DateOutliers,
        Check::FutureDates,
    ];

    /// Configuration name of the check.
    pub fn name(&self) -> &'static str {
        match self {
            Check::TrailingSpaces => "trailing_spaces",
            Check::CaseDuplicates => "case_duplicates",
            Check::SpecialChars => "special_chars",
            Check::NumericStrings => "numeric_strings",
            Check::TimestampPatterns => "timestamp_patterns",
            Check::DateOutliers => "date_outliers",
            Check::FutureDates => "future_dates",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Check {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Check::ALL
            .into_iter()
            .find(|check| check.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Check::ALL.iter().map(Check::name).collect();
                AuditError::configuration(format!(
                    "Unknown check '{}'; expected one of: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Fixed reference instant for the future-date detector.
///
/// Its timezone awareness must match the audited column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReferenceTime {
    /// Timezone-naive reference
    Naive(NaiveDateTime),
    /// Offset-aware reference
    Aware(DateTime<FixedOffset>),
}

/// Detector thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Regex matching non-standard characters
    pub special_chars_pattern: String,
    /// Numeric share of a text column above which it is flagged (0.0-1.0)
    pub numeric_string_threshold: f64,
    /// Dominant-hour share above which `CONSTANT_HOUR` fires (0.0-1.0)
    pub constant_hour_threshold: f64,
    /// Midnight share above which `ALWAYS_MIDNIGHT` fires (0.0-1.0)
    pub midnight_threshold: f64,
    /// Years below this are outliers
    pub min_year: i32,
    /// Years above this are outliers
    pub max_year: i32,
    /// Minimum percentage for outlier and placeholder-year issues (0-100)
    pub outlier_min_pct: f64,
    /// Future-dated share above which `FUTURE_DATES` fires (0.0-1.0)
    pub future_threshold: f64,
    /// Fixed reference time; `None` compares against the current time
    pub reference_time: Option<ReferenceTime>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            special_chars_pattern: DEFAULT_SPECIAL_CHARS_PATTERN.to_string(),
            numeric_string_threshold: 0.8,
            constant_hour_threshold: 0.9,
            midnight_threshold: 0.95,
            min_year: 1950,
            max_year: 2100,
            outlier_min_pct: 0.0,
            future_threshold: 0.0,
            reference_time: None,
        }
    }
}

fn clamp_ratio(name: &str, value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0.0, 1.0]", name, value);
    }
    value.clamp(0.0, 1.0)
}

impl Thresholds {
    /// Builder method to set the special character pattern.
    pub fn with_special_chars_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.special_chars_pattern = pattern.into();
        self
    }

    /// Builder method to set the numeric string threshold.
    pub fn with_numeric_string_threshold(mut self, threshold: f64) -> Self {
        self.numeric_string_threshold = clamp_ratio("numeric_string_threshold", threshold);
        self
    }

    /// Builder method to set the constant hour threshold.
    pub fn with_constant_hour_threshold(mut self, threshold: f64) -> Self {
        self.constant_hour_threshold = clamp_ratio("constant_hour_threshold", threshold);
        self
    }

    /// Builder method to set the midnight threshold.
    pub fn with_midnight_threshold(mut self, threshold: f64) -> Self {
        self.midnight_threshold = clamp_ratio("midnight_threshold", threshold);
        self
    }

    /// Builder method to set the plausible year range.
    pub fn with_year_bounds(mut self, min_year: i32, max_year: i32) -> Self {
        self.min_year = min_year;
        self.max_year = max_year;
        self
    }

    /// Builder method to set the minimum outlier percentage.
    pub fn with_outlier_min_pct(mut self, pct: f64) -> Self {
        if !(0.0..=100.0).contains(&pct) {
            tracing::warn!("outlier_min_pct {} clamped to valid range [0, 100]", pct);
        }
        self.outlier_min_pct = pct.clamp(0.0, 100.0);
        self
    }

    /// Builder method to set the future-date threshold.
    pub fn with_future_threshold(mut self, threshold: f64) -> Self {
        self.future_threshold = clamp_ratio("future_threshold", threshold);
        self
    }

    /// Builder method to pin the future-date reference time.
    pub fn with_reference_time(mut self, reference: ReferenceTime) -> Self {
        self.reference_time = Some(reference);
        self
    }
}

/// Per-detector switches plus thresholds.
///
/// Deserializing a partial object leaves unmentioned checks enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Leading and trailing space detection
    pub trailing_spaces: bool,
    /// Case-only duplicate detection
    pub case_duplicates: bool,
    /// Special character detection
    pub special_chars: bool,
    /// Numeric-as-string detection
    pub numeric_strings: bool,
    /// Constant hour and midnight detection
    pub timestamp_patterns: bool,
    /// Year outlier detection
    pub date_outliers: bool,
    /// Future date detection
    pub future_dates: bool,
    /// Detector thresholds
    pub thresholds: Thresholds,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            trailing_spaces: true,
            case_duplicates: true,
            special_chars: true,
            numeric_strings: true,
            timestamp_patterns: true,
            date_outliers: true,
            future_dates: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl CheckConfig {
    /// Creates a check config with every detector enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a check is enabled.
    pub fn is_enabled(&self, check: Check) -> bool {
        match check {
            Check::TrailingSpaces => self.trailing_spaces,
            Check::CaseDuplicates => self.case_duplicates,
            Check::SpecialChars => self.special_chars,
            Check::NumericStrings => self.numeric_strings,
            Check::TimestampPatterns => self.timestamp_patterns,
            Check::DateOutliers => self.date_outliers,
            Check::FutureDates => self.future_dates,
        }
    }

    /// Enables or disables a check.
    pub fn set_enabled(&mut self, check: Check, enabled: bool) {
        let flag = match check {
            Check::TrailingSpaces => &mut self.trailing_spaces,
            Check::CaseDuplicates => &mut self.case_duplicates,
            Check::SpecialChars => &mut self.special_chars,
            Check::NumericStrings => &mut self.numeric_strings,
            Check::TimestampPatterns => &mut self.timestamp_patterns,
            Check::DateOutliers => &mut self.date_outliers,
            Check::FutureDates => &mut self.future_dates,
        };
        *flag = enabled;
    }

    /// Builder method to enable or disable a check.
    pub fn with_check(mut self, check: Check, enabled: bool) -> Self {
        self.set_enabled(check, enabled);
        self
    }

    /// Builder method to set thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Names of the enabled checks, in invocation order.
    pub fn enabled_checks(&self) -> Vec<Check> {
        Check::ALL
            .into_iter()
            .filter(|check| self.is_enabled(*check))
            .collect()
    }

    /// Validates the thresholds.
    ///
    /// Returns an error if a ratio is outside `[0, 1]`, the year range is
    /// inverted, or the special character pattern does not compile.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("numeric_string_threshold", t.numeric_string_threshold),
            ("constant_hour_threshold", t.constant_hour_threshold),
            ("midnight_threshold", t.midnight_threshold),
            ("future_threshold", t.future_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidRatio { name, value });
            }
        }
        if !(0.0..=100.0).contains(&t.outlier_min_pct) {
            return Err(ConfigValidationError::InvalidPercentage(t.outlier_min_pct));
        }
        if t.min_year > t.max_year {
            return Err(ConfigValidationError::InvertedYearRange {
                min_year: t.min_year,
                max_year: t.max_year,
            });
        }
        if let Err(e) = regex::Regex::new(&t.special_chars_pattern) {
            return Err(ConfigValidationError::InvalidPattern {
                pattern: t.special_chars_pattern.clone(),
                message: e.to_string(),
            });
        }
        Ok(())
    }
}

/// PII masking options applied to loaded datasets before auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Mask columns whose names look like PII
    pub enabled: bool,
    /// Keywords added to the built-in PII list
    pub extra_keywords: Vec<String>,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extra_keywords: Vec::new(),
        }
    }
}

/// Top-level audit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Rows to analyze when a table is sampled
    pub sample_size: usize,
    /// Row count above which sampling kicks in
    pub sample_threshold: usize,
    /// Detector switches and thresholds
    pub checks: CheckConfig,
    /// PII masking options
    pub masking: MaskingConfig,
}

/// Validation errors for audit configuration.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    InvalidRatio { name: &'static str, value: f64 },
    #[error("outlier_min_pct must be between 0 and 100, got {0}")]
    InvalidPercentage(f64),
    #[error("min_year ({min_year}) must not exceed max_year ({max_year})")]
    InvertedYearRange { min_year: i32, max_year: i32 },
    #[error("special_chars_pattern '{pattern}' is not a valid regex: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("sample_size must be greater than zero")]
    ZeroSampleSize,
}

impl From<ConfigValidationError> for AuditError {
    fn from(error: ConfigValidationError) -> Self {
        AuditError::configuration(error.to_string())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sample_size: 100_000,
            sample_threshold: 1_000_000,
            checks: CheckConfig::default(),
            masking: MaskingConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Creates an audit config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the sample size.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Builder method to set the sampling threshold.
    pub fn with_sample_threshold(mut self, threshold: usize) -> Self {
        self.sample_threshold = threshold;
        self
    }

    /// Builder method to set the check config.
    pub fn with_checks(mut self, checks: CheckConfig) -> Self {
        self.checks = checks;
        self
    }

    /// Builder method to enable or disable PII masking.
    pub fn with_masking(mut self, enabled: bool) -> Self {
        self.masking.enabled = enabled;
        self
    }

    /// Builder method to add PII keywords.
    pub fn with_extra_pii_keywords(mut self, keywords: Vec<String>) -> Self {
        self.masking.extra_keywords.extend(keywords);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.sample_size == 0 {
            return Err(ConfigValidationError::ZeroSampleSize);
        }
        self.checks.validate()
    }

    /// Loads and validates a JSON config file. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns an I/O, serialization, or configuration error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AuditError::io(format!("Failed to read config {}", path.display()), e)
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| AuditError::Serialization {
                context: "Failed to parse audit config".to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }
}
