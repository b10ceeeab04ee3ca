//! Result exporters.
//!
//! Each format is an independent function over [`AuditResult`]; none of
//! them hold state. The async writers validate JSON output before it
//! touches the filesystem.

use std::path::Path;

use crate::audit::AuditResult;
use crate::{AuditError, Result};

pub mod json;
pub mod rows;
pub mod summary;
pub mod text;

pub use json::{to_json, to_json_value};
pub use rows::{IssueRow, issue_rows, to_csv};
pub use summary::{SummaryStats, summary};
pub use text::{issue_headline, render_text};

async fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AuditError::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| AuditError::io(format!("Failed to write to {}", path.display()), e))
}

/// Writes a validated JSON report.
///
/// # Errors
/// Returns an export error if validation fails, or an I/O error.
pub async fn write_json(result: &AuditResult, path: &Path) -> Result<()> {
    let json = to_json(result)?;
    write_output(path, &json).await?;
    tracing::info!("Wrote JSON report to {}", path.display());
    Ok(())
}

/// Writes one CSV row per issue for the given results.
pub async fn write_csv(results: &[AuditResult], path: &Path) -> Result<()> {
    let csv = to_csv(results)?;
    write_output(path, &csv).await?;
    tracing::info!("Wrote CSV report to {}", path.display());
    Ok(())
}

/// Writes the plain-text report.
pub async fn write_text(result: &AuditResult, path: &Path) -> Result<()> {
    write_output(path, &render_text(result)).await?;
    tracing::info!("Wrote text report to {}", path.display());
    Ok(())
}

/// Writes arbitrary rendered output, creating parent directories.
pub async fn write_rendered(path: &Path, contents: &str) -> Result<()> {
    write_output(path, contents).await
}
