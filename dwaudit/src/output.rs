//! Report file output for audit runs.
//!
//! JSON and HTML reports are written once per table, CSV once per run. The
//! text format goes to stdout and is handled by the binary.

use dwaudit_core::export;
use dwaudit_core::{AuditResult, Result};
use std::path::{Path, PathBuf};

use crate::{AuditArgs, OutputFormat, report};

/// Turns a table name into a file-name-safe fragment.
pub fn file_fragment(table_name: &str) -> String {
    let fragment: String = table_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if fragment.is_empty() {
        "table".to_string()
    } else {
        fragment
    }
}

/// Path of a per-table report: `{dir}/{prefix}_{table}.{extension}`.
pub fn report_path(dir: &Path, prefix: &str, table_name: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, file_fragment(table_name), extension))
}

/// Writes every file-based report requested in `args`.
///
/// Returns the written paths in write order. Nothing is written when there
/// are no results.
///
/// # Errors
/// Returns the first export or I/O error; earlier files stay on disk.
pub async fn write_reports(results: &[AuditResult], args: &AuditArgs) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if results.is_empty() {
        return Ok(written);
    }

    for format in args.formats() {
        match format {
            OutputFormat::Text => {}
            OutputFormat::Json => {
                for result in results {
                    let path = report_path(&args.output_dir, &args.prefix, &result.table_name, "json");
                    export::write_json(result, &path).await?;
                    written.push(path);
                }
            }
            OutputFormat::Csv => {
                let path = args.output_dir.join(format!("{}_issues.csv", args.prefix));
                export::write_csv(results, &path).await?;
                written.push(path);
            }
            OutputFormat::Html => {
                for result in results {
                    let path = report_path(&args.output_dir, &args.prefix, &result.table_name, "html");
                    let html = report::render_html(result)?;
                    export::write_rendered(&path, &html).await?;
                    written.push(path);
                }
            }
        }
    }

    Ok(written)
}
