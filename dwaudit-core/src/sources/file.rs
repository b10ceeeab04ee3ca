//! File-backed table source.
//!
//! Reads CSV files with a header row, JSON documents holding an array of
//! objects, JSON lines files with one object per line, and Parquet files
//! (feature `parquet`). Every file is a single table. Column types are
//! inferred from the cells, except for Parquet which keeps its stored types.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::TableSource;
use super::inference::{infer_column, infer_json_column};
use crate::dataset::{Column, Dataset};
use crate::{AuditError, Result};

/// Supported file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values with a header row
    Csv,
    /// A JSON array of objects
    Json,
    /// One JSON object per line
    JsonLines,
    /// Apache Parquet
    Parquet,
}

impl FileFormat {
    /// Detects the format from a file extension.
    ///
    /// # Errors
    /// Returns a configuration error for unknown or missing extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(AuditError::configuration(format!(
                "Unsupported file extension '{}' for {}: expected csv, json, jsonl, ndjson, parquet or pq",
                other,
                path.display()
            ))),
        }
    }
}

/// A CSV, JSON or Parquet file exposed as one table.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: FileFormat,
}

impl FileSource {
    /// Creates a source, detecting the format from the extension.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = FileFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    /// Creates a source with an explicit format.
    pub fn with_format(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected or configured format.
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Default table name: the file stem.
    pub fn default_table_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("table")
            .to_string()
    }

    async fn read(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AuditError::io(format!("Failed to read {}", self.path.display()), e))
    }

    fn parse(&self, raw: &str) -> Result<Dataset> {
        match self.format {
            FileFormat::Parquet => Err(AuditError::configuration(format!(
                "{} is a binary Parquet file and cannot be parsed as text",
                self.path.display()
            ))),
            FileFormat::Csv => parse_csv(raw, &self.path),
            FileFormat::Json => {
                let document: Value = serde_json::from_str(raw).map_err(|e| {
                    AuditError::Serialization {
                        context: format!("Failed to parse JSON {}", self.path.display()),
                        source: e,
                    }
                })?;
                let Value::Array(records) = document else {
                    return Err(AuditError::configuration(format!(
                        "{} must contain a JSON array of objects",
                        self.path.display()
                    )));
                };
                dataset_from_records(records, &self.path)
            }
            FileFormat::JsonLines => {
                let records = raw
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(number, line)| {
                        serde_json::from_str(line).map_err(|e| AuditError::Serialization {
                            context: format!(
                                "Failed to parse line {} of {}",
                                number + 1,
                                self.path.display()
                            ),
                            source: e,
                        })
                    })
                    .collect::<Result<Vec<Value>>>()?;
                dataset_from_records(records, &self.path)
            }
        }
    }
}

/// Parses CSV text with a header row into a dataset.
pub fn parse_csv(raw: &str, path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(raw.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AuditError::source_failed(format!("Failed to read CSV header of {}", path.display()), e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AuditError::source_failed(
                format!("Failed to read CSV record {} of {}", index + 1, path.display()),
                e,
            )
        })?;
        for (position, column) in cells.iter_mut().enumerate() {
            column.push(record.get(position).map(str::to_string));
        }
    }

    let columns = headers
        .iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();
    Dataset::new(columns)
}

/// Builds a dataset from JSON objects.
///
/// Columns appear in first-seen key order; keys missing from a record are
/// null for that row.
pub fn dataset_from_records(records: Vec<Value>, path: &Path) -> Result<Dataset> {
    let mut order: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut objects = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(object) = record else {
            return Err(AuditError::configuration(format!(
                "Record {} of {} is not a JSON object",
                index + 1,
                path.display()
            )));
        };
        for key in object.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), order.len());
                order.push(key.clone());
            }
        }
        objects.push(object);
    }

    let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(objects.len()); order.len()];
    for mut object in objects {
        for (name, column) in order.iter().zip(cells.iter_mut()) {
            column.push(object.remove(name).unwrap_or(Value::Null));
        }
    }

    let columns: Vec<Column> = order
        .iter()
        .zip(cells)
        .map(|(name, values)| infer_json_column(name, values))
        .collect();
    Dataset::new(columns)
}

#[async_trait]
impl TableSource for FileSource {
    fn descriptor(&self) -> String {
        self.path.display().to_string()
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        if self.format == FileFormat::Parquet {
            return parquet_row_count(&self.path).await;
        }
        Ok(self.load(table, None).await?.row_count() as u64)
    }

    async fn load(&self, table: &str, limit: Option<usize>) -> Result<Dataset> {
        tracing::debug!(
            "Loading table '{}' from {} as {:?}",
            table,
            self.path.display(),
            self.format
        );
        if self.format == FileFormat::Parquet {
            return load_parquet(&self.path, limit).await;
        }
        let raw = self.read().await?;
        let dataset = self.parse(&raw)?;

        match limit {
            Some(limit) if limit < dataset.row_count() => {
                let indices: Vec<usize> = (0..limit).collect();
                Ok(dataset.take(&indices))
            }
            _ => Ok(dataset),
        }
    }
}

#[cfg(feature = "parquet")]
async fn parquet_row_count(path: &Path) -> Result<u64> {
    super::columnar::count_rows(path).await
}

#[cfg(feature = "parquet")]
async fn load_parquet(path: &Path, limit: Option<usize>) -> Result<Dataset> {
    super::columnar::read_parquet(path, limit).await
}

#[cfg(not(feature = "parquet"))]
fn parquet_disabled(path: &Path) -> AuditError {
    AuditError::configuration(format!(
        "Cannot read {}: Parquet support requires the 'parquet' feature",
        path.display()
    ))
}

#[cfg(not(feature = "parquet"))]
async fn parquet_row_count(path: &Path) -> Result<u64> {
    Err(parquet_disabled(path))
}

#[cfg(not(feature = "parquet"))]
async fn load_parquet(path: &Path, _limit: Option<usize>) -> Result<Dataset> {
    Err(parquet_disabled(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SemanticType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert_eq!(
            FileFormat::from_path(Path::new("a.ndjson")).unwrap(),
            FileFormat::JsonLines
        );
        assert_eq!(
            FileFormat::from_path(Path::new("a.parquet")).unwrap(),
            FileFormat::Parquet
        );
        assert_eq!(FileFormat::from_path(Path::new("a.PQ")).unwrap(), FileFormat::Parquet);
        assert!(FileFormat::from_path(Path::new("a.xlsx")).is_err());
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_parse_csv_keeps_whitespace() {
        let dataset = parse_csv("name,amount\n Alice,1\nBob ,\n", Path::new("t.csv")).unwrap();

        assert_eq!(dataset.row_count(), 2);
        let name = dataset.column("name").unwrap();
        assert_eq!(name.semantic_type(), SemanticType::Text);
        assert_eq!(name.values().first_non_null_text(), Some(" Alice"));

        let amount = dataset.column("amount").unwrap();
        assert_eq!(amount.semantic_type(), SemanticType::Numeric);
        assert_eq!(amount.null_count(), 1);
    }

    #[test]
    fn test_parse_csv_ragged_rows_fail() {
        assert!(parse_csv("a,b\n1,2,3\n", Path::new("t.csv")).is_err());
    }

    #[test]
    fn test_records_with_missing_keys() {
        let records = vec![
            serde_json::json!({"id": 1, "name": "a"}),
            serde_json::json!({"id": 2, "created": "2024-01-01 10:00:00"}),
        ];
        let dataset = dataset_from_records(records, Path::new("t.json")).unwrap();

        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_names(), vec!["id", "name", "created"]);
        assert_eq!(dataset.column("name").unwrap().null_count(), 1);
        assert_eq!(
            dataset.column("created").unwrap().semantic_type(),
            SemanticType::DateTime
        );
    }

    #[test]
    fn test_records_must_be_objects() {
        let records = vec![serde_json::json!([1, 2])];
        assert!(matches!(
            dataset_from_records(records, Path::new("t.json")),
            Err(AuditError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_csv_file() {
        let file = write_temp(".csv", "city\nParis\nparis\n");
        let source = FileSource::new(file.path()).unwrap();

        let dataset = source.load("cities", None).await.unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(source.row_count("cities").await.unwrap(), 2);
        assert!(!source.supports_pushdown_sampling());

        let limited = source.load("cities", Some(1)).await.unwrap();
        assert_eq!(limited.row_count(), 1);
    }

    #[tokio::test]
    async fn test_load_jsonl_file() {
        let file = write_temp(".jsonl", "{\"v\": \"a\"}\n\n{\"v\": null}\n");
        let source = FileSource::new(file.path()).unwrap();

        let dataset = source.load("t", None).await.unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column("v").unwrap().null_count(), 1);
    }

    #[tokio::test]
    async fn test_load_json_rejects_non_array() {
        let file = write_temp(".json", "{\"v\": 1}");
        let source = FileSource::new(file.path()).unwrap();
        assert!(source.load("t", None).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = FileSource::with_format("/nonexistent/data.csv", FileFormat::Csv);
        assert!(matches!(
            source.load("t", None).await,
            Err(AuditError::Io { .. })
        ));
    }

    #[cfg(feature = "parquet")]
    #[tokio::test]
    async fn test_load_parquet_file() {
        use arrow::array::StringArray;
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![Field::new("city", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["Paris", "paris", "Lyon "]))],
        )
        .unwrap();
        let file = tempfile::Builder::new().suffix(".pq").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let source = FileSource::new(file.path()).unwrap();
        assert_eq!(source.format(), FileFormat::Parquet);
        assert_eq!(source.row_count("cities").await.unwrap(), 3);

        let limited = source.load("cities", Some(2)).await.unwrap();
        assert_eq!(limited.row_count(), 2);
        assert_eq!(
            limited.column("city").unwrap().values().first_non_null_text(),
            Some("Paris")
        );
    }

    #[test]
    fn test_default_table_name() {
        let source = FileSource::with_format("/data/orders.csv", FileFormat::Csv);
        assert_eq!(source.default_table_name(), "orders");
        assert_eq!(source.descriptor(), "/data/orders.csv");
    }
}
