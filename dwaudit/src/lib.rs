//! Library module for the dwaudit command-line tool.
//!
//! Argument parsing, configuration assembly and the audit run live here so
//! they can be tested without spawning the binary. The binary in main.rs
//! only installs logging and turns the run summary into an exit code.

pub mod output;
pub mod report;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dwaudit_core::{AuditConfig, AuditError, AuditLogEntry, AuditResult, Auditor, Check, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI argument structure
#[derive(Parser)]
#[command(name = "dwaudit")]
#[command(about = "Audit table columns for data-quality defects")]
#[command(version)]
#[command(long_about = "
dwaudit - column-level data-quality auditing

Loads a table, inspects every column, and reports defects such as stray
whitespace, case-variant duplicates, numbers stored as text, constant or
midnight-only timestamps, placeholder years, and future dates.

SECURITY FEATURES:
- Read-only access to every source
- Credentials are redacted from logs and the audit log
- Columns that look like PII are masked before auditing

EXAMPLES:
  dwaudit file orders.csv --format json --format html
  dwaudit sqlite sqlite:///data/warehouse.db --table customers --table orders
  DATABASE_URL=sqlite://app.db dwaudit sqlite --table users --print-log
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Audit CSV, JSON, JSON lines or Parquet files
    File(FileArgs),
    /// Audit tables in a SQLite database
    Sqlite(SqliteArgs),
}

impl Command {
    /// Options shared by every command.
    pub fn audit_args(&self) -> &AuditArgs {
        match self {
            Command::File(args) => &args.audit,
            Command::Sqlite(args) => &args.audit,
        }
    }
}

#[derive(Args)]
pub struct FileArgs {
    /// Files to audit (.csv, .json, .jsonl, .ndjson, .parquet, .pq)
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Table name used in reports (single file only; defaults to the file stem)
    #[arg(long, value_name = "NAME")]
    pub table_name: Option<String>,

    #[command(flatten)]
    pub audit: AuditArgs,
}

#[derive(Args)]
pub struct SqliteArgs {
    /// SQLite connection string or database path
    #[arg(
        env = "DATABASE_URL",
        value_name = "URL",
        hide_env_values = true,
        help = "SQLite connection string (credentials will be sanitized in logs)"
    )]
    pub database_url: String,

    /// Table to audit; repeat for several. All tables when omitted.
    #[arg(short, long = "table", value_name = "TABLE")]
    pub tables: Vec<String>,

    #[command(flatten)]
    pub audit: AuditArgs,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Report formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console report on stdout
    Text,
    /// One validated JSON document per table
    Json,
    /// One row per issue across all tables
    Csv,
    /// One HTML page per table
    Html,
}

#[derive(Args, Clone, Debug)]
pub struct AuditArgs {
    /// JSON configuration file
    #[arg(long, env = "DWAUDIT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rows analyzed when a table is sampled
    #[arg(long, env = "DWAUDIT_SAMPLE_SIZE", value_name = "ROWS")]
    pub sample_size: Option<usize>,

    /// Row count above which tables are sampled
    #[arg(long, env = "DWAUDIT_SAMPLE_THRESHOLD", value_name = "ROWS")]
    pub sample_threshold: Option<usize>,

    /// Detector to switch off (repeatable, comma-separated allowed)
    #[arg(long = "disable-check", value_name = "CHECK", value_delimiter = ',')]
    pub disabled_checks: Vec<Check>,

    /// Audit PII-looking columns instead of masking them
    #[arg(long)]
    pub no_mask_pii: bool,

    /// Extra column-name keyword treated as PII (repeatable)
    #[arg(long = "pii-keyword", value_name = "KEYWORD")]
    pub pii_keywords: Vec<String>,

    /// Report format (repeatable; defaults to text)
    #[arg(long = "format", value_enum, value_name = "FORMAT")]
    pub formats: Vec<OutputFormat>,

    /// Directory for report files
    #[arg(long, default_value = "audit_results", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// File name prefix for report files
    #[arg(long, default_value = "audit")]
    pub prefix: String,

    /// Print the redacted audit log after the run
    #[arg(long)]
    pub print_log: bool,
}

impl AuditArgs {
    /// Requested formats, falling back to the console report.
    pub fn formats(&self) -> Vec<OutputFormat> {
        if self.formats.is_empty() {
            vec![OutputFormat::Text]
        } else {
            let mut formats: Vec<OutputFormat> = Vec::with_capacity(self.formats.len());
            for format in &self.formats {
                if !formats.contains(format) {
                    formats.push(*format);
                }
            }
            formats
        }
    }
}

/// Builds the audit configuration from a config file and CLI overrides.
///
/// Command-line values win over the file; PII keywords are appended to the
/// file's list.
///
/// # Errors
/// Returns a configuration error if the file is unreadable or the merged
/// configuration is invalid.
pub fn build_config(args: &AuditArgs) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_json_file(path)?,
        None => AuditConfig::default(),
    };

    if let Some(size) = args.sample_size {
        config.sample_size = size;
    }
    if let Some(threshold) = args.sample_threshold {
        config.sample_threshold = threshold;
    }
    for check in &args.disabled_checks {
        config.checks.set_enabled(*check, false);
    }
    if args.no_mask_pii {
        config.masking.enabled = false;
    }
    config
        .masking
        .extra_keywords
        .extend(args.pii_keywords.iter().cloned());

    config.validate()?;
    Ok(config)
}

/// Outcome of one CLI run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Successful audits in request order
    pub results: Vec<AuditResult>,
    /// Tables whose audit failed, with the error message
    pub failures: Vec<(String, String)>,
    /// Report files written
    pub written: Vec<PathBuf>,
    /// Redacted audit log entries
    pub audit_log: Vec<AuditLogEntry>,
}

impl RunSummary {
    /// True when at least one table was requested and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.failures.is_empty()
    }

    fn record(&mut self, table: &str, outcome: Result<AuditResult>) {
        match outcome {
            Ok(result) => {
                info!(
                    "Audited '{}': {} issue(s) in {} column(s)",
                    table,
                    result.total_issues(),
                    result.columns.len()
                );
                self.results.push(result);
            }
            Err(e) => {
                error!("Audit of '{}' failed: {}", table, e);
                self.failures.push((table.to_string(), e.to_string()));
            }
        }
    }
}

/// Runs the requested audits and writes file-based reports.
///
/// Tables are audited one after another. A failing table is logged and
/// recorded in the summary; the remaining tables still run.
///
/// # Errors
/// Returns an error for invalid configuration, an unreachable database, or
/// a report that cannot be written.
pub async fn run(cli: &Cli) -> Result<RunSummary> {
    let args = cli.command.audit_args();
    let mut auditor = Auditor::new(build_config(args)?);
    let mut summary = RunSummary::default();

    match &cli.command {
        Command::File(file_args) => audit_files(&mut auditor, file_args, &mut summary).await?,
        Command::Sqlite(sqlite_args) => {
            audit_sqlite(&mut auditor, sqlite_args, &mut summary).await?;
        }
    }

    summary.written = output::write_reports(&summary.results, args).await?;
    summary.audit_log = auditor.audit_log().to_vec();
    Ok(summary)
}

async fn audit_files(auditor: &mut Auditor, args: &FileArgs, summary: &mut RunSummary) -> Result<()> {
    if args.table_name.is_some() && args.paths.len() > 1 {
        return Err(AuditError::configuration(
            "--table-name can only be used with a single file",
        ));
    }

    for path in &args.paths {
        let label = table_label(path, args.table_name.as_deref());
        let outcome = auditor
            .audit_file(path, args.table_name.as_deref(), None)
            .await;
        summary.record(&label, outcome);
    }
    Ok(())
}

fn table_label(path: &Path, table_name: Option<&str>) -> String {
    table_name.map_or_else(|| path.display().to_string(), str::to_string)
}

#[cfg(feature = "sqlite")]
async fn audit_sqlite(
    auditor: &mut Auditor,
    args: &SqliteArgs,
    summary: &mut RunSummary,
) -> Result<()> {
    use dwaudit_core::SqliteSource;

    let source = SqliteSource::connect(&args.database_url).await?;
    let tables = if args.tables.is_empty() {
        let discovered = source.list_tables().await?;
        info!("Discovered {} table(s)", discovered.len());
        discovered
    } else {
        args.tables.clone()
    };

    for table in &tables {
        let outcome = auditor.audit_source(&source, table, None).await;
        summary.record(table, outcome);
    }

    source.close().await;
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn audit_sqlite(
    _auditor: &mut Auditor,
    _args: &SqliteArgs,
    _summary: &mut RunSummary,
) -> Result<()> {
    Err(AuditError::configuration(
        "SQLite support not available. Compile with --features sqlite",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    mod helpers {
        use super::*;

        /// Parses a command line, prefixing the binary name.
        pub(super) fn parse(args: &[&str]) -> Cli {
            let mut argv = vec!["dwaudit"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv).unwrap()
        }

        pub(super) fn file_args(args: &[&str]) -> FileArgs {
            match parse(args).command {
                Command::File(file) => file,
                Command::Sqlite(_) => panic!("expected file command"),
            }
        }

        pub(super) fn create_config_file(contents: &str) -> NamedTempFile {
            let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
            file.write_all(contents.as_bytes()).unwrap();
            file
        }
    }

    mod cli_argument_parsing {
        use super::helpers::*;
        use super::*;

        #[test]
        fn test_file_command_defaults() {
            let args = file_args(&["file", "data.csv"]);

            assert_eq!(args.paths, vec![PathBuf::from("data.csv")]);
            assert!(args.table_name.is_none());
            assert_eq!(args.audit.formats(), vec![OutputFormat::Text]);
            assert_eq!(args.audit.output_dir, PathBuf::from("audit_results"));
            assert_eq!(args.audit.prefix, "audit");
            assert!(!args.audit.print_log);
        }

        #[test]
        fn test_file_command_requires_path() {
            assert!(Cli::try_parse_from(["dwaudit", "file"]).is_err());
        }

        #[test]
        fn test_repeatable_options() {
            let args = file_args(&[
                "file",
                "a.csv",
                "--format",
                "json",
                "--format",
                "html",
                "--disable-check",
                "trailing_spaces,future_dates",
                "--pii-keyword",
                "loyalty",
                "--pii-keyword",
                "badge",
            ]);

            assert_eq!(
                args.audit.formats(),
                vec![OutputFormat::Json, OutputFormat::Html]
            );
            assert_eq!(
                args.audit.disabled_checks,
                vec![Check::TrailingSpaces, Check::FutureDates]
            );
            assert_eq!(args.audit.pii_keywords, vec!["loyalty", "badge"]);
        }

        #[test]
        fn test_repeated_formats_deduplicated() {
            let args = file_args(&[
                "file", "a.csv", "--format", "json", "--format", "text", "--format", "json",
            ]);
            assert_eq!(
                args.audit.formats(),
                vec![OutputFormat::Json, OutputFormat::Text]
            );
        }

        #[test]
        fn test_unknown_check_rejected() {
            let parsed = Cli::try_parse_from(["dwaudit", "file", "a.csv", "--disable-check", "typo"]);
            assert!(parsed.is_err());
        }

        #[test]
        fn test_unknown_format_rejected() {
            let parsed = Cli::try_parse_from(["dwaudit", "file", "a.csv", "--format", "xml"]);
            assert!(parsed.is_err());
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = parse(&["file", "a.csv", "-vv", "--quiet"]);
            assert_eq!(cli.global.verbose, 2);
            assert!(cli.global.quiet);
        }

        #[test]
        fn test_sqlite_command_with_tables() {
            let cli = parse(&["sqlite", "sqlite://app.db", "--table", "users", "-t", "orders"]);
            match cli.command {
                Command::Sqlite(args) => {
                    assert_eq!(args.database_url, "sqlite://app.db");
                    assert_eq!(args.tables, vec!["users", "orders"]);
                }
                Command::File(_) => panic!("expected sqlite command"),
            }
        }

        #[test]
        fn test_sqlite_url_from_environment() {
            temp_env::with_vars([("DATABASE_URL", Some("sqlite://from_env.db"))], || {
                let cli = parse(&["sqlite", "--table", "users"]);
                match cli.command {
                    Command::Sqlite(args) => assert_eq!(args.database_url, "sqlite://from_env.db"),
                    Command::File(_) => panic!("expected sqlite command"),
                }
            });
        }

        #[test]
        fn test_sqlite_url_missing() {
            temp_env::with_vars([("DATABASE_URL", None::<&str>)], || {
                assert!(Cli::try_parse_from(["dwaudit", "sqlite", "--table", "users"]).is_err());
            });
        }
    }

    mod config_building {
        use super::helpers::*;
        use super::*;

        #[test]
        fn test_defaults_without_overrides() {
            temp_env::with_vars(
                [
                    ("DWAUDIT_CONFIG", None::<&str>),
                    ("DWAUDIT_SAMPLE_SIZE", None),
                    ("DWAUDIT_SAMPLE_THRESHOLD", None),
                ],
                || {
                    let config = build_config(&file_args(&["file", "a.csv"]).audit).unwrap();
                    assert_eq!(config, AuditConfig::default());
                },
            );
        }

        #[test]
        fn test_cli_overrides() {
            let args = file_args(&[
                "file",
                "a.csv",
                "--sample-size",
                "50",
                "--sample-threshold",
                "500",
                "--disable-check",
                "case_duplicates",
                "--no-mask-pii",
                "--pii-keyword",
                "badge",
            ]);
            let config = build_config(&args.audit).unwrap();

            assert_eq!(config.sample_size, 50);
            assert_eq!(config.sample_threshold, 500);
            assert!(!config.checks.is_enabled(Check::CaseDuplicates));
            assert!(config.checks.is_enabled(Check::TrailingSpaces));
            assert!(!config.masking.enabled);
            assert_eq!(config.masking.extra_keywords, vec!["badge"]);
        }

        #[test]
        fn test_sample_size_from_environment() {
            temp_env::with_vars([("DWAUDIT_SAMPLE_SIZE", Some("42"))], || {
                let config = build_config(&file_args(&["file", "a.csv"]).audit).unwrap();
                assert_eq!(config.sample_size, 42);
            });
        }

        #[test]
        fn test_config_file_merged_with_flags() {
            let file = create_config_file(
                r#"{ "sample_size": 10, "masking": { "extra_keywords": ["member"] } }"#,
            );
            let path = file.path().to_str().unwrap();
            let args = file_args(&[
                "file",
                "a.csv",
                "--config",
                path,
                "--sample-size",
                "20",
                "--pii-keyword",
                "badge",
            ]);

            let config = build_config(&args.audit).unwrap();
            assert_eq!(config.sample_size, 20);
            assert_eq!(config.masking.extra_keywords, vec!["member", "badge"]);
        }

        #[test]
        fn test_invalid_merged_config_rejected() {
            let args = file_args(&["file", "a.csv", "--sample-size", "0"]);
            let result = build_config(&args.audit);
            assert!(matches!(result, Err(AuditError::Configuration { .. })));
        }

        #[test]
        fn test_missing_config_file_rejected() {
            let args = file_args(&["file", "a.csv", "--config", "/nonexistent/dwaudit.json"]);
            assert!(build_config(&args.audit).is_err());
        }
    }

    mod run_summary {
        use super::*;

        #[test]
        fn test_all_failed_requires_a_failure() {
            let mut summary = RunSummary::default();
            assert!(!summary.all_failed());

            summary.record("t", Err(AuditError::configuration("boom")));
            assert!(summary.all_failed());

            summary.record("u", Ok(AuditResult::new("u", 0, 0)));
            assert!(!summary.all_failed());
            assert_eq!(summary.failures[0].0, "t");
        }
    }
}
