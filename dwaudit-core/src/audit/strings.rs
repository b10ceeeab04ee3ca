//! String detectors.
//!
//! Each detector inspects the non-null values of one text column and
//! returns zero or more issues. Examples are taken first-N in dataset order.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::dataset::{ColumnValues, Dataset};
use crate::{AuditError, Result};

use super::models::{Example, Issue, IssueKind, percent};

/// Example cap for string issues.
pub const STRING_EXAMPLE_LIMIT: usize = 3;

/// Matching values scanned when collecting offending characters.
const SPECIAL_CHAR_SCAN_LIMIT: usize = 100;

/// Maximum distinct offending characters reported.
const SPECIAL_CHAR_REPORT_LIMIT: usize = 10;

const NUMERIC_SUGGESTION: &str = "Consider converting to numeric type";

/// Optional minus sign, digits, and an optional decimal part. `\d` is
/// Unicode-aware, so any decimal digit script counts.
const NUMERIC_PATTERN: &str = r"^-?\d+\.?\d*$";

/// Non-null values of a text column, in dataset order.
fn text_values<'a>(dataset: &'a Dataset, column: &str, detector: &str) -> Result<Vec<&'a str>> {
    let col = dataset.require_column(column)?;
    match col.values() {
        ColumnValues::Text(values) => Ok(values.iter().flatten().map(String::as_str).collect()),
        _ => Err(AuditError::unsupported(column, detector, col.dtype())),
    }
}

fn space_issue(
    kind: IssueKind,
    matches: &[&str],
    non_null: usize,
    render: impl Fn(&str) -> String,
) -> Option<Issue> {
    if matches.is_empty() {
        return None;
    }
    let examples = matches
        .iter()
        .take(STRING_EXAMPLE_LIMIT)
        .map(|v| Example::Text(render(v)))
        .collect();
    Some(
        Issue::new(kind)
            .with_count(matches.len())
            .with_pct(percent(matches.len(), non_null))
            .with_examples(examples),
    )
}

/// Flags values that start or end with a space.
///
/// Produces up to two independent issues, `LEADING_SPACES` then
/// `TRAILING_SPACES`. Trailing examples are wrapped in single quotes so the
/// whitespace stays visible.
pub fn check_leading_trailing_spaces(dataset: &Dataset, column: &str) -> Result<Vec<Issue>> {
    let values = text_values(dataset, column, "trailing_spaces")?;
    let non_null = values.len();

    let leading: Vec<&str> = values.iter().copied().filter(|v| v.starts_with(' ')).collect();
    let trailing: Vec<&str> = values.iter().copied().filter(|v| v.ends_with(' ')).collect();

    Ok([
        space_issue(IssueKind::LeadingSpaces, &leading, non_null, str::to_string),
        space_issue(IssueKind::TrailingSpaces, &trailing, non_null, |v| {
            format!("'{}'", v)
        }),
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Flags values that collide once lower-cased.
///
/// `count` is the number of colliding groups. Groups and their variants are
/// listed in first-seen order.
pub fn check_case_duplicates(dataset: &Dataset, column: &str) -> Result<Vec<Issue>> {
    let values = text_values(dataset, column, "case_duplicates")?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&str>> = HashMap::new();
    for value in values {
        let key = value.to_lowercase();
        let variants = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if !variants.contains(&value) {
            variants.push(value);
        }
    }

    let colliding: Vec<(String, Vec<String>)> = order
        .into_iter()
        .filter_map(|key| {
            let variants = groups.remove(&key)?;
            (variants.len() > 1)
                .then(|| (key, variants.into_iter().map(str::to_string).collect()))
        })
        .collect();

    if colliding.is_empty() {
        return Ok(Vec::new());
    }

    let examples = colliding
        .iter()
        .take(STRING_EXAMPLE_LIMIT)
        .map(|(key, variants)| Example::CaseVariants(key.clone(), variants.clone()))
        .collect();

    Ok(vec![
        Issue::new(IssueKind::CaseDuplicates)
            .with_count(colliding.len())
            .with_examples(examples),
    ])
}

/// Flags values containing characters matched by `pattern`.
///
/// Reports up to ten distinct offending characters collected from the
/// first hundred matching values.
///
/// # Errors
/// Returns an invalid pattern error if `pattern` is not a valid regex.
pub fn check_special_characters(
    dataset: &Dataset,
    column: &str,
    pattern: &str,
) -> Result<Vec<Issue>> {
    let values = text_values(dataset, column, "special_chars")?;
    let regex =
        Regex::new(pattern).map_err(|e| AuditError::invalid_pattern(pattern, e.to_string()))?;

    let matching: Vec<&str> = values.iter().copied().filter(|v| regex.is_match(v)).collect();
    if matching.is_empty() {
        return Ok(Vec::new());
    }

    let mut special_chars: Vec<String> = Vec::new();
    for value in matching.iter().take(SPECIAL_CHAR_SCAN_LIMIT) {
        for found in regex.find_iter(value) {
            let found = found.as_str().to_string();
            if !special_chars.contains(&found) {
                special_chars.push(found);
            }
        }
    }
    special_chars.truncate(SPECIAL_CHAR_REPORT_LIMIT);

    let examples = matching
        .iter()
        .take(STRING_EXAMPLE_LIMIT)
        .map(|v| Example::Text((*v).to_string()))
        .collect();

    Ok(vec![
        Issue::new(IssueKind::SpecialCharacters)
            .with_count(matching.len())
            .with_pct(percent(matching.len(), values.len()))
            .with_special_chars(special_chars)
            .with_examples(examples),
    ])
}

/// Compiled numeric-string pattern, built on first use.
fn numeric_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(NUMERIC_PATTERN))
        .as_ref()
        .map_err(|e| AuditError::invalid_pattern(NUMERIC_PATTERN, e.to_string()))
}

/// Flags a text column whose numeric share strictly exceeds `threshold`.
///
/// This is a column-level verdict: zero or one issue.
pub fn check_numeric_strings(dataset: &Dataset, column: &str, threshold: f64) -> Result<Vec<Issue>> {
    let values = text_values(dataset, column, "numeric_strings")?;
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = numeric_pattern()?;
    let numeric: Vec<&str> = values
        .iter()
        .copied()
        .filter(|v| pattern.is_match(v))
        .collect();
    let share = numeric.len() as f64 / values.len() as f64;
    if share <= threshold {
        return Ok(Vec::new());
    }

    let examples = numeric
        .iter()
        .take(STRING_EXAMPLE_LIMIT)
        .map(|v| Example::Text((*v).to_string()))
        .collect();

    Ok(vec![
        Issue::new(IssueKind::NumericStrings)
            .with_count(numeric.len())
            .with_pct(percent(numeric.len(), values.len()))
            .with_suggestion(NUMERIC_SUGGESTION)
            .with_examples(examples),
    ])
}
