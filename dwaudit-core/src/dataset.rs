//! In-memory tabular datasets handed to the audit engine.
//!
//! A [`Dataset`] is a struct-of-arrays: each [`Column`] owns one typed value
//! vector, and the column's semantic type is derived from that vector so the
//! two can never disagree. Datasets are never mutated by the engine;
//! sampling and masking build new datasets.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{AuditError, Result};

/// Semantic type of a column, used to pick applicable detectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Free text
    Text,
    /// Calendar date without a time component
    Date,
    /// Timestamp without timezone information
    DateTime,
    /// Timestamp carrying a UTC offset
    DateTimeTz,
    /// Integer or floating point numbers
    Numeric,
    /// True/false values
    Boolean,
    /// Anything else, identified by the source's type name
    Other { type_name: String },
}

impl SemanticType {
    /// Returns true for date and datetime types.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SemanticType::Date | SemanticType::DateTime | SemanticType::DateTimeTz
        )
    }

    /// Type label reported as `dtype` in audit results.
    pub fn label(&self) -> String {
        match self {
            SemanticType::Text => "text".to_string(),
            SemanticType::Date => "date".to_string(),
            SemanticType::DateTime => "datetime".to_string(),
            SemanticType::DateTimeTz => "datetime_tz".to_string(),
            SemanticType::Numeric => "numeric".to_string(),
            SemanticType::Boolean => "boolean".to_string(),
            SemanticType::Other { type_name } => type_name.clone(),
        }
    }
}

/// Typed storage for one column. `None` is a null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Text values
    Text(Vec<Option<String>>),
    /// Date values
    Date(Vec<Option<NaiveDate>>),
    /// Naive timestamps
    DateTime(Vec<Option<NaiveDateTime>>),
    /// Offset-aware timestamps
    DateTimeTz(Vec<Option<DateTime<FixedOffset>>>),
    /// Numbers
    Numeric(Vec<Option<f64>>),
    /// Booleans
    Boolean(Vec<Option<bool>>),
    /// Values of an unsupported type, kept in their textual form
    Other {
        /// Source type name
        type_name: String,
        /// Textual cell values
        values: Vec<Option<String>>,
    },
}

fn pick<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
    indices
        .iter()
        .filter_map(|&i| values.get(i).cloned())
        .collect()
}

fn count_nulls<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|v| v.is_none()).count()
}

impl ColumnValues {
    /// Number of cells, nulls included.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Date(v) => v.len(),
            ColumnValues::DateTime(v) => v.len(),
            ColumnValues::DateTimeTz(v) => v.len(),
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Other { values, .. } => values.len(),
        }
    }

    /// Returns true when the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        match self {
            ColumnValues::Text(v) => count_nulls(v),
            ColumnValues::Date(v) => count_nulls(v),
            ColumnValues::DateTime(v) => count_nulls(v),
            ColumnValues::DateTimeTz(v) => count_nulls(v),
            ColumnValues::Numeric(v) => count_nulls(v),
            ColumnValues::Boolean(v) => count_nulls(v),
            ColumnValues::Other { values, .. } => count_nulls(values),
        }
    }

    /// Semantic type implied by the storage variant.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            ColumnValues::Text(_) => SemanticType::Text,
            ColumnValues::Date(_) => SemanticType::Date,
            ColumnValues::DateTime(_) => SemanticType::DateTime,
            ColumnValues::DateTimeTz(_) => SemanticType::DateTimeTz,
            ColumnValues::Numeric(_) => SemanticType::Numeric,
            ColumnValues::Boolean(_) => SemanticType::Boolean,
            ColumnValues::Other { type_name, .. } => SemanticType::Other {
                type_name: type_name.clone(),
            },
        }
    }

    /// First non-null value of a text-backed column.
    ///
    /// Typed columns return `None`: they cannot hold a masking sentinel.
    pub fn first_non_null_text(&self) -> Option<&str> {
        match self {
            ColumnValues::Text(values) | ColumnValues::Other { values, .. } => {
                values.iter().flatten().next().map(String::as_str)
            }
            _ => None,
        }
    }

    /// Builds a new value vector holding only the given row positions.
    ///
    /// Out-of-range positions are skipped.
    pub fn take(&self, indices: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Text(v) => ColumnValues::Text(pick(v, indices)),
            ColumnValues::Date(v) => ColumnValues::Date(pick(v, indices)),
            ColumnValues::DateTime(v) => ColumnValues::DateTime(pick(v, indices)),
            ColumnValues::DateTimeTz(v) => ColumnValues::DateTimeTz(pick(v, indices)),
            ColumnValues::Numeric(v) => ColumnValues::Numeric(pick(v, indices)),
            ColumnValues::Boolean(v) => ColumnValues::Boolean(pick(v, indices)),
            ColumnValues::Other { type_name, values } => ColumnValues::Other {
                type_name: type_name.clone(),
                values: pick(values, indices),
            },
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    /// Creates a column from typed values.
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for text columns.
    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::new(
            name,
            ColumnValues::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    /// Convenience constructor for date columns.
    pub fn date(name: impl Into<String>, values: Vec<Option<NaiveDate>>) -> Self {
        Self::new(name, ColumnValues::Date(values))
    }

    /// Convenience constructor for naive datetime columns.
    pub fn datetime(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnValues::DateTime(values))
    }

    /// Convenience constructor for offset-aware datetime columns.
    pub fn datetime_tz(name: impl Into<String>, values: Vec<Option<DateTime<FixedOffset>>>) -> Self {
        Self::new(name, ColumnValues::DateTimeTz(values))
    }

    /// Convenience constructor for numeric columns.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnValues::Numeric(values))
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Typed cell values.
    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    /// Semantic type of the column.
    pub fn semantic_type(&self) -> SemanticType {
        self.values.semantic_type()
    }

    /// Type label reported in audit results.
    pub fn dtype(&self) -> String {
        self.semantic_type().label()
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.null_count()
    }

    /// Number of non-null cells.
    pub fn non_null_count(&self) -> usize {
        self.values.len().saturating_sub(self.values.null_count())
    }
}

/// Read-only table of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Creates a dataset, checking that every column has the same length
    /// and that column names are unique.
    ///
    /// # Errors
    /// Returns a configuration error when the columns are ragged or a name
    /// repeats.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, |c| c.values.len());
        let mut seen = HashSet::new();

        for column in &columns {
            if column.values.len() != row_count {
                return Err(AuditError::configuration(format!(
                    "Column '{}' has {} rows, expected {}",
                    column.name,
                    column.values.len(),
                    row_count
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(AuditError::configuration(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Columns in dataset order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in dataset order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name, failing when it does not exist.
    ///
    /// # Errors
    /// Returns [`AuditError::ColumnNotFound`] for unknown names.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| AuditError::column_not_found(name))
    }

    /// Builds a new dataset holding only the given row positions, in the
    /// order given. The receiver is left untouched.
    pub fn take(&self, indices: &[usize]) -> Dataset {
        let row_count = indices.iter().filter(|&&i| i < self.row_count).count();
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.take(indices)))
                .collect(),
            row_count,
        }
    }

    /// Builds a new dataset with one column's values replaced.
    ///
    /// # Errors
    /// Returns an error if the column is unknown or the replacement has a
    /// different length.
    pub fn with_column_replaced(&self, name: &str, values: ColumnValues) -> Result<Dataset> {
        self.require_column(name)?;
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.name == name {
                    Column::new(name, values.clone())
                } else {
                    c.clone()
                }
            })
            .collect();
        Dataset::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_sample_dataset() -> Dataset {
        Dataset::new(vec![
            Column::text("name", vec![Some("alice"), None, Some("carol")]),
            Column::numeric("score", vec![Some(1.0), Some(2.0), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_dataset_basic_accessors() {
        let dataset = create_sample_dataset();
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column_names(), vec!["name", "score"]);
        assert_eq!(dataset.column("name").unwrap().null_count(), 1);
        assert_eq!(dataset.column("score").unwrap().dtype(), "numeric");
        assert!(dataset.column("missing").is_none());
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = Dataset::new(vec![
            Column::text("a", vec![Some("x")]),
            Column::text("b", vec![Some("x"), Some("y")]),
        ]);
        assert!(matches!(result, Err(AuditError::Configuration { .. })));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Dataset::new(vec![
            Column::text("a", vec![Some("x")]),
            Column::text("a", vec![Some("y")]),
        ]);
        assert!(matches!(result, Err(AuditError::Configuration { .. })));
    }

    #[test]
    fn test_take_builds_new_dataset() {
        let dataset = create_sample_dataset();
        let subset = dataset.take(&[2, 0]);

        assert_eq!(subset.row_count(), 2);
        assert_eq!(
            subset.column("name").unwrap().values(),
            &ColumnValues::Text(vec![Some("carol".to_string()), Some("alice".to_string())])
        );
        // Original untouched
        assert_eq!(dataset.row_count(), 3);
    }

    #[test]
    fn test_first_non_null_text_skips_nulls() {
        let column = Column::text("c", vec![None, Some("x"), Some("y")]);
        assert_eq!(column.values().first_non_null_text(), Some("x"));

        let numeric = Column::numeric("n", vec![Some(1.0)]);
        assert_eq!(numeric.values().first_non_null_text(), None);
    }

    #[test]
    fn test_with_column_replaced() {
        let dataset = create_sample_dataset();
        let replaced = dataset
            .with_column_replaced(
                "score",
                ColumnValues::Text(vec![Some("a".into()), Some("b".into()), Some("c".into())]),
            )
            .unwrap();

        assert_eq!(replaced.column("score").unwrap().dtype(), "text");
        assert_eq!(dataset.column("score").unwrap().dtype(), "numeric");

        let ragged = dataset.with_column_replaced("score", ColumnValues::Text(vec![]));
        assert!(ragged.is_err());
    }

    #[test]
    fn test_semantic_type_labels() {
        assert!(SemanticType::Date.is_temporal());
        assert!(SemanticType::DateTimeTz.is_temporal());
        assert!(!SemanticType::Text.is_temporal());
        assert_eq!(
            SemanticType::Other {
                type_name: "blob".into()
            }
            .label(),
            "blob"
        );
    }
}
