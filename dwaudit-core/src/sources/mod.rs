//! Data sources that produce datasets for the auditor.
//!
//! A source owns its connection or file handle. The auditor asks it for a
//! row count and for rows, optionally pushing sampling down to the source.
//!
//! # Supported Sources
//! - Files: CSV, JSON arrays, JSON lines, and Parquet (feature `parquet`)
//! - SQLite databases (feature `sqlite`)

use async_trait::async_trait;

use crate::Result;
use crate::dataset::Dataset;

#[cfg(feature = "parquet")]
mod columnar;
pub mod file;
pub mod inference;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{FileFormat, FileSource};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;

/// A provider of tables to audit.
///
/// # Security
/// `descriptor` may contain credentials; callers must redact it before
/// logging or storing it.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Connection string or file path identifying the source.
    fn descriptor(&self) -> String;

    /// Whether `load` with a limit returns a random sample rather than the
    /// first rows.
    fn supports_pushdown_sampling(&self) -> bool {
        false
    }

    /// Counts rows in a table.
    async fn row_count(&self, table: &str) -> Result<u64>;

    /// Loads a table. With `limit`, at most that many rows are returned;
    /// sources that support pushdown sampling pick them at random.
    async fn load(&self, table: &str, limit: Option<usize>) -> Result<Dataset>;
}
