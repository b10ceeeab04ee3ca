//! Column type inference for untyped sources.
//!
//! CSV cells and SQLite values cast to text arrive as strings. A column takes
//! the narrowest type that every non-null cell satisfies, tried in this
//! order: numeric, boolean, date, offset-aware datetime, naive datetime,
//! text. Empty cells are null.
//!
//! # SQLite Type Affinity
//! Declared SQLite types are mapped by substring, following SQLite's own
//! affinity rules:
//! 1. Contains "BOOL" -> boolean
//! 2. Contains "DATETIME" or "TIMESTAMP" -> datetime
//! 3. Contains "DATE" -> date
//! 4. Contains "INT", "REAL", "FLOA", "DOUB", "NUM" or "DEC" -> numeric
//! 5. Contains "CHAR", "CLOB" or "TEXT" -> text, never inferred further
//! 6. Contains "BLOB" -> other
//! 7. Anything else -> inferred from values
//!
//! Typed mappings fall back to inference when a cell does not parse.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::dataset::{Column, ColumnValues};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Treats empty and whitespace-only cells as null.
pub fn normalize_cell(cell: Option<String>) -> Option<String> {
    cell.filter(|s| !s.trim().is_empty())
}

/// Parses a plain decimal or scientific number.
///
/// Rejects `NaN`, `inf`, and anything with letters other than an exponent.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let has_digit = trimmed.chars().any(|c| c.is_ascii_digit());
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !has_digit || !allowed {
        return None;
    }
    trimmed.parse().ok()
}

/// Parses `true`/`false` in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parses a timestamp without offset, with space or `T` separator.
pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Parses an RFC 3339 timestamp, also accepting a space separator.
pub fn parse_aware_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
}

/// Converts every non-null cell with `parse`, or returns `None` if any fails.
fn convert_all<T>(cells: &[Option<String>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    cells
        .iter()
        .map(|cell| match cell {
            Some(value) => parse(value).map(Some),
            None => Some(None),
        })
        .collect()
}

fn try_typed(cells: &[Option<String>]) -> Option<ColumnValues> {
    if let Some(values) = convert_all(cells, parse_number) {
        return Some(ColumnValues::Numeric(values));
    }
    if let Some(values) = convert_all(cells, parse_bool) {
        return Some(ColumnValues::Boolean(values));
    }
    try_temporal(cells)
}

fn try_temporal(cells: &[Option<String>]) -> Option<ColumnValues> {
    if let Some(values) = convert_all(cells, parse_date) {
        return Some(ColumnValues::Date(values));
    }
    if let Some(values) = convert_all(cells, parse_aware_datetime) {
        return Some(ColumnValues::DateTimeTz(values));
    }
    convert_all(cells, parse_naive_datetime).map(ColumnValues::DateTime)
}

/// Infers a column from raw string cells.
///
/// All-null columns are text.
pub fn infer_column(name: &str, cells: Vec<Option<String>>) -> Column {
    let cells: Vec<Option<String>> = cells.into_iter().map(normalize_cell).collect();
    if cells.iter().all(Option::is_none) {
        return Column::new(name, ColumnValues::Text(cells));
    }
    let values = try_typed(&cells).unwrap_or(ColumnValues::Text(cells));
    Column::new(name, values)
}

/// Infers a column whose cells are already known to be strings.
///
/// Only temporal types are detected, so numbers stored as text stay text.
pub fn infer_text_column(name: &str, cells: Vec<Option<String>>) -> Column {
    if cells.iter().all(Option::is_none) {
        return Column::new(name, ColumnValues::Text(cells));
    }
    let values = try_temporal(&cells).unwrap_or(ColumnValues::Text(cells));
    Column::new(name, values)
}

/// Infers a column from JSON cells.
///
/// Native numbers and booleans keep their type. String-only columns go
/// through [`infer_text_column`]. Mixed columns become text.
pub fn infer_json_column(name: &str, cells: Vec<serde_json::Value>) -> Column {
    use serde_json::Value;

    let non_null: Vec<&Value> = cells.iter().filter(|v| !v.is_null()).collect();

    if !non_null.is_empty() && non_null.iter().all(|v| v.is_number()) {
        return Column::numeric(name, cells.iter().map(Value::as_f64).collect());
    }
    if !non_null.is_empty() && non_null.iter().all(|v| v.is_boolean()) {
        return Column::new(
            name,
            ColumnValues::Boolean(cells.iter().map(Value::as_bool).collect()),
        );
    }

    let as_text: Vec<Option<String>> = cells
        .iter()
        .map(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();

    if non_null.iter().all(|v| v.is_string()) {
        infer_text_column(name, as_text)
    } else {
        Column::new(name, ColumnValues::Text(as_text))
    }
}

/// Builds a column from SQLite cells using the declared column type.
pub fn column_from_sqlite_type(name: &str, declared_type: &str, cells: Vec<Option<String>>) -> Column {
    let declared = declared_type.trim().to_uppercase();

    let typed = if declared.contains("BOOL") {
        convert_all(&cells, |v| match v.trim() {
            "1" => Some(true),
            "0" => Some(false),
            other => parse_bool(other),
        })
        .map(ColumnValues::Boolean)
    } else if declared.contains("DATETIME") || declared.contains("TIMESTAMP") {
        convert_all(&cells, parse_naive_datetime)
            .map(ColumnValues::DateTime)
            .or_else(|| convert_all(&cells, parse_aware_datetime).map(ColumnValues::DateTimeTz))
    } else if declared.contains("DATE") {
        convert_all(&cells, parse_date).map(ColumnValues::Date)
    } else if ["INT", "REAL", "FLOA", "DOUB", "NUM", "DEC"]
        .iter()
        .any(|k| declared.contains(k))
    {
        convert_all(&cells, parse_number).map(ColumnValues::Numeric)
    } else if ["CHAR", "CLOB", "TEXT"].iter().any(|k| declared.contains(k)) {
        return infer_text_column(name, cells);
    } else if declared.contains("BLOB") {
        Some(ColumnValues::Other {
            type_name: "blob".to_string(),
            values: cells.clone(),
        })
    } else {
        None
    };

    match typed {
        Some(values) => Column::new(name, values),
        None => {
            if !declared.is_empty() {
                tracing::debug!(
                    "Column '{}' declared as {} did not parse cleanly, inferring type",
                    name,
                    declared
                );
            }
            infer_column(name, cells)
        }
    }
}
