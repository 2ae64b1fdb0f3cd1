//! eardiff CLI
//!
//! Compares two EAR/WAR/JAR archives entry by entry, nested archives included.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use eardiff::{compare, Outcome, Verdict};
use eardiff_archive::logging::{init_with_config, TracingConfig};
use eardiff_archive::{ExtractionStrategy, ScanOptions};
use eardiff_core::Error;
use eardiff_diff::{render_json, render_text, DiffResult, ReportFormat};

/// eardiff - compare two Java enterprise archives by content
#[derive(Parser)]
#[command(name = "eardiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// First archive
    first: PathBuf,

    /// Second archive
    second: PathBuf,

    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Report format (text, json)
    #[arg(long, default_value = "text")]
    format: ReportFormat,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extensions treated as nested archives (comma separated)
    #[arg(long = "nested-ext", value_delimiter = ',')]
    nested_ext: Vec<String>,

    /// Maximum nesting depth below the top-level archive
    #[arg(long, default_value_t = 32)]
    max_depth: u32,

    /// How nested archives are materialized (auto, memory, disk)
    #[arg(long, default_value = "auto")]
    extraction: ExtractionStrategy,

    /// Largest nested archive kept in memory, in bytes
    #[arg(long)]
    memory_limit: Option<u64>,

    /// Directory for temporary extraction files
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Never memory map the top-level archives
    #[arg(long)]
    no_mmap: bool,
}

impl Cli {
    fn scan_options(&self) -> eardiff_core::Result<ScanOptions> {
        let mut options = ScanOptions {
            max_nesting_depth: self.max_depth,
            extraction: self.extraction,
            temp_dir: self.temp_dir.clone(),
            use_memory_mapping: !self.no_mmap,
            ..ScanOptions::default()
        };

        if let Some(limit) = self.memory_limit {
            options.memory_limit = limit;
        }

        if !self.nested_ext.is_empty() {
            options = options.with_nested_extensions(&self.nested_ext);
            if options.nested_extensions.is_empty() {
                return Err(Error::Invocation {
                    message: "--nested-ext needs at least one extension".to_string(),
                });
            }
        }

        if let Some(dir) = &options.temp_dir {
            if !dir.is_dir() {
                return Err(Error::Invocation {
                    message: format!("--temp-dir {} is not a directory", dir.display()),
                });
            }
        }

        Ok(options)
    }
}

fn setup_logging(verbosity: u8) {
    init_with_config(TracingConfig::from_verbosity(verbosity));
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(Verdict::Incomplete.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<Verdict> {
    let options = cli.scan_options()?;

    // JSON output keeps stdout a single parseable document
    let json = cli.format == ReportFormat::Json;
    let banner = format!("Comparing {} against {}", cli.first.display(), cli.second.display());
    if json {
        eprintln!("{}", banner);
    } else {
        println!("{}", banner);
    }

    let comparison = compare(&cli.first, &cli.second, &options);

    // The status line goes out even when delivering the report failed
    let delivered = match &comparison.outcome {
        Outcome::Completed(result) => emit_report(cli, result),
        Outcome::Incomplete(error) => {
            eprintln!("Error ({}): {}", error.kind(), error);
            Ok(())
        }
    };

    let status = comparison.status_line();
    if json {
        eprintln!("{}", status);
    } else {
        println!("{}", status);
    }

    delivered?;
    Ok(comparison.verdict())
}

/// Print the report and write the `--output` file, if any
fn emit_report(cli: &Cli, result: &DiffResult) -> Result<()> {
    let first = cli.first.display().to_string();
    let second = cli.second.display().to_string();

    match cli.format {
        ReportFormat::Text => print!("{}", render_text(result)),
        ReportFormat::Json => println!("{}", render_json(&first, &second, result)?),
    }

    if let Some(output_path) = &cli.output {
        let report = render_json(&first, &second, result)?;
        fs::write(output_path, report)
            .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
        info!(path = %output_path.display(), "Report written");
    }

    Ok(())
}
