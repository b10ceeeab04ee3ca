//! Parquet files read through Arrow record batches.
//!
//! Parquet columns keep their stored types: strings stay text without
//! inference, integers and floats become numeric, and timestamps carrying a
//! timezone become offset-aware values in UTC. Types with no audit
//! counterpart are kept in Arrow's display form.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Date32Type, Float64Type, TimeUnit, TimestampMicrosecondType};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

use crate::dataset::{Column, ColumnValues, Dataset};
use crate::{AuditError, Result};

const BATCH_SIZE: usize = 8192;

fn open_builder(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>> {
    let file = File::open(path)
        .map_err(|e| AuditError::io(format!("Failed to open {}", path.display()), e))?;
    ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
        AuditError::source_failed(format!("Failed to read Parquet metadata of {}", path.display()), e)
    })
}

/// Counts rows from the Parquet footer without decoding any pages.
pub(crate) async fn count_rows(path: &Path) -> Result<u64> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let builder = open_builder(&path)?;
        Ok(u64::try_from(builder.metadata().file_metadata().num_rows()).unwrap_or(0))
    })
    .await
    .map_err(|e| AuditError::source_failed("Parquet reader task failed", e))?
}

/// Reads a Parquet file into a dataset, stopping after `limit` rows.
pub(crate) async fn read_parquet(path: &Path, limit: Option<usize>) -> Result<Dataset> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_blocking(&path, limit))
        .await
        .map_err(|e| AuditError::source_failed("Parquet reader task failed", e))?
}

fn read_blocking(path: &Path, limit: Option<usize>) -> Result<Dataset> {
    let builder = open_builder(path)?;
    let schema = builder.schema().clone();

    let mut builder = builder.with_batch_size(BATCH_SIZE);
    if let Some(limit) = limit {
        builder = builder.with_limit(limit);
    }
    let reader = builder.build().map_err(|e| {
        AuditError::source_failed(format!("Failed to open Parquet reader for {}", path.display()), e)
    })?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            AuditError::source_failed(format!("Failed to decode record batch of {}", path.display()), e)
        })?;
    tracing::debug!("Read {} record batches from {}", batches.len(), path.display());

    let batch = concat_batches(&schema, &batches).map_err(|e| {
        AuditError::source_failed(format!("Failed to combine record batches of {}", path.display()), e)
    })?;

    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| column_from_array(field.name(), array))
        .collect::<Result<Vec<_>>>()?;
    Dataset::new(columns)
}

fn cast_column(name: &str, array: &ArrayRef, target: &DataType) -> Result<ArrayRef> {
    cast(array, target).map_err(|e| {
        AuditError::source_failed(format!("Failed to convert column '{}' to {}", name, target), e)
    })
}

fn unexpected_layout(name: &str, array: &ArrayRef) -> AuditError {
    AuditError::configuration(format!(
        "Column '{}' has an unexpected Arrow layout {}",
        name,
        array.data_type()
    ))
}

fn nullable<T>(array: &dyn Array, value: impl Fn(usize) -> Option<T>) -> Vec<Option<T>> {
    (0..array.len())
        .map(|i| if array.is_null(i) { None } else { value(i) })
        .collect()
}

/// Maps one Arrow column onto the audit's typed storage.
fn column_from_array(name: &str, array: &ArrayRef) -> Result<Column> {
    let values = match array.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let strings = cast_column(name, array, &DataType::Utf8)?;
            let strings = strings
                .as_string_opt::<i32>()
                .ok_or_else(|| unexpected_layout(name, array))?;
            ColumnValues::Text(strings.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::Boolean => {
            let flags = array
                .as_boolean_opt()
                .ok_or_else(|| unexpected_layout(name, array))?;
            ColumnValues::Boolean(flags.iter().collect())
        }
        DataType::Date32 | DataType::Date64 => {
            let days = cast_column(name, array, &DataType::Date32)?;
            let days = days
                .as_primitive_opt::<Date32Type>()
                .ok_or_else(|| unexpected_layout(name, array))?;
            ColumnValues::Date(nullable(days, |i| days.value_as_date(i)))
        }
        DataType::Timestamp(_, timezone) => {
            let target = DataType::Timestamp(TimeUnit::Microsecond, timezone.clone());
            let stamps = cast_column(name, array, &target)?;
            let stamps = stamps
                .as_primitive_opt::<TimestampMicrosecondType>()
                .ok_or_else(|| unexpected_layout(name, array))?;
            // Stored values are UTC instants whether or not a zone is attached
            let naive = nullable(stamps, |i| stamps.value_as_datetime(i));
            if timezone.is_some() {
                ColumnValues::DateTimeTz(
                    naive
                        .into_iter()
                        .map(|v| v.map(|dt| dt.and_utc().fixed_offset()))
                        .collect(),
                )
            } else {
                ColumnValues::DateTime(naive)
            }
        }
        data_type if data_type.is_numeric() => {
            let numbers = cast_column(name, array, &DataType::Float64)?;
            let numbers = numbers
                .as_primitive_opt::<Float64Type>()
                .ok_or_else(|| unexpected_layout(name, array))?;
            ColumnValues::Numeric(numbers.iter().collect())
        }
        other => {
            let values = (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        Ok(None)
                    } else {
                        array_value_to_string(array.as_ref(), i).map(Some)
                    }
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    AuditError::source_failed(format!("Failed to format column '{}'", name), e)
                })?;
            ColumnValues::Other {
                type_name: other.to_string(),
                values,
            }
        }
    };
    Ok(Column::new(name, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SemanticType;
    use arrow::array::{
        BinaryArray, BooleanArray, Date32Array, Float32Array, Int64Array, StringArray,
        TimestampMicrosecondArray, TimestampMillisecondArray,
    };
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::{NaiveDate, Utc};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn create_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("amount", DataType::Int64, true),
            Field::new("ratio", DataType::Float32, true),
            Field::new("active", DataType::Boolean, true),
            Field::new("placed_on", DataType::Date32, true),
            Field::new(
                "created_at",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                true,
            ),
            Field::new(
                "updated_at",
                DataType::Timestamp(TimeUnit::Microsecond, Some("+00:00".into())),
                true,
            ),
            Field::new("payload", DataType::Binary, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some(" Alice"), None, Some("Bob")])),
                Arc::new(Int64Array::from(vec![Some(1), Some(2), None])),
                Arc::new(Float32Array::from(vec![Some(0.5), None, Some(1.5)])),
                Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)])),
                Arc::new(Date32Array::from(vec![Some(0), None, Some(19_723)])),
                Arc::new(TimestampMillisecondArray::from(vec![
                    Some(1_700_000_000_000),
                    None,
                    None,
                ])),
                Arc::new(
                    TimestampMicrosecondArray::from(vec![Some(0), None, None])
                        .with_timezone("+00:00"),
                ),
                Arc::new(BinaryArray::from(vec![
                    Some(b"ab".as_ref()),
                    None,
                    Some(b"c".as_ref()),
                ])),
            ],
        )
        .unwrap()
    }

    fn write_parquet(batch: &RecordBatch) -> NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        file
    }

    #[tokio::test]
    async fn test_read_parquet_maps_types() {
        let file = write_parquet(&create_batch());
        let dataset = read_parquet(file.path(), None).await.unwrap();

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(
            dataset.column_names(),
            vec!["name", "amount", "ratio", "active", "placed_on", "created_at", "updated_at", "payload"]
        );

        let name = dataset.column("name").unwrap();
        assert_eq!(name.semantic_type(), SemanticType::Text);
        assert_eq!(name.values().first_non_null_text(), Some(" Alice"));
        assert_eq!(name.null_count(), 1);

        assert_eq!(
            dataset.column("amount").unwrap().values(),
            &ColumnValues::Numeric(vec![Some(1.0), Some(2.0), None])
        );
        assert_eq!(
            dataset.column("ratio").unwrap().values(),
            &ColumnValues::Numeric(vec![Some(0.5), None, Some(1.5)])
        );
        assert_eq!(
            dataset.column("active").unwrap().values(),
            &ColumnValues::Boolean(vec![Some(true), None, Some(false)])
        );
        assert_eq!(
            dataset.column("placed_on").unwrap().values(),
            &ColumnValues::Date(vec![
                NaiveDate::from_ymd_opt(1970, 1, 1),
                None,
                NaiveDate::from_ymd_opt(2024, 1, 1),
            ])
        );
    }

    #[tokio::test]
    async fn test_read_parquet_timestamps() {
        let file = write_parquet(&create_batch());
        let dataset = read_parquet(file.path(), None).await.unwrap();

        let created = dataset.column("created_at").unwrap();
        assert_eq!(created.semantic_type(), SemanticType::DateTime);
        let expected = NaiveDate::from_ymd_opt(2023, 11, 14)
            .unwrap()
            .and_hms_opt(22, 13, 20)
            .unwrap();
        assert_eq!(
            created.values(),
            &ColumnValues::DateTime(vec![Some(expected), None, None])
        );

        let updated = dataset.column("updated_at").unwrap();
        assert_eq!(updated.semantic_type(), SemanticType::DateTimeTz);
        let ColumnValues::DateTimeTz(values) = updated.values() else {
            panic!("expected offset-aware timestamps");
        };
        assert_eq!(values[0].unwrap().with_timezone(&Utc).timestamp(), 0);
        assert_eq!(values[0].unwrap().offset().local_minus_utc(), 0);
    }

    #[tokio::test]
    async fn test_read_parquet_unsupported_type_kept_as_text() {
        let file = write_parquet(&create_batch());
        let dataset = read_parquet(file.path(), None).await.unwrap();

        let payload = dataset.column("payload").unwrap();
        assert_eq!(
            payload.semantic_type(),
            SemanticType::Other {
                type_name: "Binary".to_string()
            }
        );
        assert_eq!(payload.null_count(), 1);
        assert_eq!(payload.values().first_non_null_text(), Some("6162"));
    }

    #[tokio::test]
    async fn test_read_parquet_limit_and_count() {
        let file = write_parquet(&create_batch());

        let limited = read_parquet(file.path(), Some(2)).await.unwrap();
        assert_eq!(limited.row_count(), 2);
        assert_eq!(count_rows(file.path()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_read_parquet_rejects_garbage() {
        let mut file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .unwrap();
        std::io::Write::write_all(&mut file, b"PAR1").unwrap();

        assert!(matches!(
            read_parquet(file.path(), None).await,
            Err(AuditError::Source { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_parquet_missing_file() {
        assert!(matches!(
            count_rows(Path::new("/nonexistent/data.parquet")).await,
            Err(AuditError::Io { .. })
        ));
    }
}
