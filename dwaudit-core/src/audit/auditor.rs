//! Audit orchestrator.
//!
//! The `Auditor` runs the linear pipeline load, sample, per-column audit,
//! aggregate. It owns the configuration and the invocation log for its
//! lifetime; nothing is shared between instances.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::Result;
use crate::dataset::Dataset;
use crate::sources::{FileSource, TableSource};

use super::config::{AuditConfig, CheckConfig};
use super::dispatch::audit_column;
use super::masking::mask_pii_columns;
use super::models::{AuditLogEntry, AuditResult};
use super::sampling::sample;

/// Column auditor for tabular datasets.
///
/// # Example
///
/// ```rust
/// use dwaudit_core::audit::{AuditConfig, Auditor};
/// use dwaudit_core::dataset::{Column, Dataset};
///
/// let dataset = Dataset::new(vec![Column::text(
///     "city",
///     vec![Some("Paris "), Some("paris"), Some("Lyon")],
/// )])
/// .unwrap();
///
/// let auditor = Auditor::new(AuditConfig::default());
/// let result = auditor.audit(&dataset, "cities", None);
/// assert_eq!(result.columns["city"].issues.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Auditor {
    config: AuditConfig,
    audit_log: Vec<AuditLogEntry>,
}

impl Auditor {
    /// Creates an auditor with the given configuration.
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            audit_log: Vec::new(),
        }
    }

    /// Creates an auditor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AuditConfig::default())
    }

    /// Returns a reference to the auditor configuration.
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Source-based audits run by this instance, oldest first.
    pub fn audit_log(&self) -> &[AuditLogEntry] {
        &self.audit_log
    }

    /// Audits an in-memory dataset.
    ///
    /// Tables above the sampling threshold are reduced to a seeded sample
    /// first. `checks` overrides the configured detector switches.
    /// A column whose audit fails is logged and left out of the result.
    pub fn audit(&self, dataset: &Dataset, table_name: &str, checks: Option<&CheckConfig>) -> AuditResult {
        let total_rows = dataset.row_count();
        let (analyzed, _) = sample(
            dataset,
            self.config.sample_threshold,
            self.config.sample_size,
        );
        self.audit_columns(&analyzed, table_name, total_rows, checks)
    }

    /// Audits a dataset that already is a sample of a larger table.
    ///
    /// No further sampling is applied; `total_rows` is the size of the
    /// table the sample was drawn from.
    pub fn audit_presampled(
        &self,
        dataset: &Dataset,
        table_name: &str,
        total_rows: usize,
        checks: Option<&CheckConfig>,
    ) -> AuditResult {
        self.audit_columns(dataset, table_name, total_rows.max(dataset.row_count()), checks)
    }

    fn audit_columns(
        &self,
        dataset: &Dataset,
        table_name: &str,
        total_rows: usize,
        checks: Option<&CheckConfig>,
    ) -> AuditResult {
        let checks = checks.unwrap_or(&self.config.checks);
        let mut result = AuditResult::new(table_name, total_rows, dataset.row_count());

        info!(
            "Auditing table '{}': {} rows, {} analyzed{}",
            table_name,
            total_rows,
            dataset.row_count(),
            if result.sampled { " (sampled)" } else { "" }
        );

        for column in dataset.column_names() {
            match audit_column(dataset, column, checks) {
                Ok(column_result) => {
                    let issue_count = column_result.issues.len();
                    if result.insert_column(column, column_result) {
                        debug!("Column '{}': {} issue(s)", column, issue_count);
                    }
                }
                Err(e) => {
                    warn!("Skipping column '{}' of table '{}': {}", column, table_name, e);
                }
            }
        }

        info!(
            "Audit of '{}' complete: {} issue(s) in {} column(s)",
            table_name,
            result.total_issues(),
            result.columns.len()
        );
        result
    }

    /// Loads a table from a source and audits it.
    ///
    /// Sources that support pushdown sampling are counted first; above the
    /// threshold only `sample_size` rows are fetched. Other sources are
    /// loaded in full and sampled in memory. PII columns are masked when
    /// masking is enabled.
    ///
    /// # Errors
    /// Returns an error if the source cannot count or load the table.
    pub async fn audit_source(
        &mut self,
        source: &dyn TableSource,
        table: &str,
        checks: Option<&CheckConfig>,
    ) -> Result<AuditResult> {
        let entry = AuditLogEntry::new(table, &source.descriptor());
        info!("Auditing '{}' from {}", table, entry.connection);
        self.audit_log.push(entry);

        let mut pushed_down_total = None;
        let dataset = if source.supports_pushdown_sampling() {
            let count = usize::try_from(source.row_count(table).await?).unwrap_or(usize::MAX);
            if count > self.config.sample_threshold {
                info!(
                    "Table '{}' has {} rows, sampling {} in the source",
                    table, count, self.config.sample_size
                );
                pushed_down_total = Some(count);
                source.load(table, Some(self.config.sample_size)).await?
            } else {
                source.load(table, None).await?
            }
        } else {
            source.load(table, None).await?
        };
        debug!("Loaded {} rows from '{}'", dataset.row_count(), table);

        let dataset = self.mask(dataset)?;
        Ok(match pushed_down_total {
            Some(total) => self.audit_presampled(&dataset, table, total, checks),
            None => self.audit(&dataset, table, checks),
        })
    }

    /// Loads a CSV, JSON or Parquet file and audits it.
    ///
    /// The table name defaults to the file stem.
    ///
    /// # Errors
    /// Returns an error for unsupported extensions or unreadable files.
    pub async fn audit_file(
        &mut self,
        path: &Path,
        table_name: Option<&str>,
        checks: Option<&CheckConfig>,
    ) -> Result<AuditResult> {
        let source = FileSource::new(path)?;
        let table = table_name
            .map(str::to_string)
            .unwrap_or_else(|| source.default_table_name());
        self.audit_source(&source, &table, checks).await
    }

    fn mask(&self, dataset: Dataset) -> Result<Dataset> {
        if !self.config.masking.enabled {
            return Ok(dataset);
        }
        Ok(mask_pii_columns(&dataset, &self.config.masking.extra_keywords)?.dataset)
    }
}
