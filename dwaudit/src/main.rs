//! Column audit tool.
//!
//! This binary loads tables from files or a SQLite database and reports
//! column-level data-quality defects.
//!
//! # Security Guarantees
//! - Read-only access to every source
//! - No credentials stored or logged
//! - PII-looking columns masked unless `--no-mask-pii` is given

use clap::Parser;
use dwaudit::{Cli, OutputFormat, RunSummary, run};
use dwaudit_core::export::render_text;
use dwaudit_core::logging::init_logging;
use dwaudit_core::{AuditError, Result, validate_audit_log};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    // Initialize JSON Schema validator
    dwaudit_core::initialize_schema_validator().map_err(|e| {
        AuditError::configuration(format!("Failed to initialize schema validator: {}", e))
    })?;

    let summary = run(&cli).await.map_err(|e| {
        error!("Audit run failed: {}", e);
        e
    })?;

    let args = cli.command.audit_args();
    if !cli.global.quiet && args.formats().contains(&OutputFormat::Text) {
        for result in &summary.results {
            print!("{}", render_text(result));
        }
    }
    for path in &summary.written {
        info!("✓ Report saved to {}", path.display());
    }
    if args.print_log {
        print_audit_log(&summary)?;
    }

    report_failures(&summary);
    if summary.all_failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Prints the audit log as JSON after checking it carries no credentials.
fn print_audit_log(summary: &RunSummary) -> Result<()> {
    let log = serde_json::to_value(&summary.audit_log).map_err(|e| AuditError::Serialization {
        context: "Failed to serialize audit log".to_string(),
        source: e,
    })?;
    validate_audit_log(&log)?;

    let rendered = serde_json::to_string_pretty(&log).map_err(|e| AuditError::Serialization {
        context: "Failed to render audit log".to_string(),
        source: e,
    })?;
    println!("{}", rendered);
    Ok(())
}

fn report_failures(summary: &RunSummary) {
    if summary.failures.is_empty() {
        return;
    }
    error!(
        "{} of {} table(s) failed",
        summary.failures.len(),
        summary.failures.len() + summary.results.len()
    );
    for (table, message) in &summary.failures {
        eprintln!("Failed: {}: {}", table, message);
    }
}
