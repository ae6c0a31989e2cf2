//! Gazefuse CLI - Command-line interface for Gazefuse
//!
//! Commands:
//! - align: Align two session logs and export per-page CSVs
//! - validate: Check raw log structure without running the pipeline

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gazefuse::adapters::{BiometricLogAdapter, InteractionLogAdapter};
use gazefuse::pipeline::{PipelineConfig, SessionProcessor};
use gazefuse::{ProcessError, GAZEFUSE_VERSION};

/// Gazefuse - align web-interaction and eye-tracking session streams
#[derive(Parser)]
#[command(name = "gazefuse")]
#[command(version = GAZEFUSE_VERSION)]
#[command(about = "Align browser interaction and biometric session logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align two session logs and export one CSV per visited page
    Align {
        /// Browser interaction log (use - for stdin)
        #[arg(short, long)]
        interaction: PathBuf,

        /// Biometric log (use - for stdin)
        #[arg(short, long)]
        biometric: PathBuf,

        /// Output directory for the per-page CSV files
        #[arg(short, long)]
        output: PathBuf,

        /// Field delimiter for the exported files
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Write the JSON run report to this path instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Validate raw log structure
    Validate {
        /// Browser interaction log to check
        #[arg(long)]
        interaction: Option<PathBuf>,

        /// Biometric log to check
        #[arg(long)]
        biometric: Option<PathBuf>,

        /// Output the validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), GazefuseCliError> {
    match cli.command {
        Commands::Align {
            interaction,
            biometric,
            output,
            delimiter,
            report,
        } => cmd_align(&interaction, &biometric, &output, delimiter, report.as_deref()),

        Commands::Validate {
            interaction,
            biometric,
            json,
        } => cmd_validate(interaction.as_deref(), biometric.as_deref(), json),
    }
}

fn cmd_align(
    interaction: &Path,
    biometric: &Path,
    output: &Path,
    delimiter: char,
    report_path: Option<&Path>,
) -> Result<(), GazefuseCliError> {
    if is_stdin(interaction) && is_stdin(biometric) {
        return Err(GazefuseCliError::BothStdin);
    }

    let interaction_raw = read_input(interaction)?;
    let biometric_raw = read_input(biometric)?;

    let processor = SessionProcessor::with_config(PipelineConfig {
        delimiter,
        ..PipelineConfig::default()
    });

    let run = processor.process_logs(
        &interaction_raw,
        &interaction.to_string_lossy(),
        &biometric_raw,
        &biometric.to_string_lossy(),
    )?;

    let paths = processor.export(&run.sessions, output)?;
    for path in &paths {
        eprintln!("wrote {}", path.display());
    }

    let report_json = serde_json::to_string_pretty(&run.report)?;
    match report_path {
        Some(path) => fs::write(path, report_json)?,
        None => println!("{report_json}"),
    }

    Ok(())
}

fn cmd_validate(
    interaction: Option<&Path>,
    biometric: Option<&Path>,
    json: bool,
) -> Result<(), GazefuseCliError> {
    if interaction.is_none() && biometric.is_none() {
        return Err(GazefuseCliError::NothingToValidate);
    }

    let mut checks: Vec<ValidationCheck> = Vec::new();

    if let Some(path) = interaction {
        checks.push(validate_file(path, |raw, name| {
            InteractionLogAdapter::parse(raw, name).map(|rows| rows.len())
        })?);
    }
    if let Some(path) = biometric {
        checks.push(validate_file(path, |raw, name| {
            BiometricLogAdapter::parse(raw, name).map(|rows| rows.len())
        })?);
    }

    let failed = checks.iter().filter(|c| c.error.is_some()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        println!("Validation Report");
        println!("=================");
        for check in &checks {
            match (&check.error, check.rows) {
                (Some(error), _) => println!("  [ERR] {}: {error}", check.path),
                (None, rows) => println!("  [OK] {}: {rows} rows", check.path),
            }
        }
    }

    if failed > 0 {
        Err(GazefuseCliError::ValidationFailed(failed))
    } else {
        Ok(())
    }
}

fn validate_file<F>(path: &Path, parse: F) -> Result<ValidationCheck, GazefuseCliError>
where
    F: Fn(&str, &str) -> Result<usize, ProcessError>,
{
    let name = path.to_string_lossy().to_string();
    let raw = read_input(path)?;
    Ok(match parse(&raw, &name) {
        Ok(rows) => ValidationCheck {
            path: name,
            rows,
            error: None,
        },
        Err(e) => ValidationCheck {
            path: name,
            rows: 0,
            error: Some(e.to_string()),
        },
    })
}

// Helper functions

fn is_stdin(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(path: &Path) -> Result<String, GazefuseCliError> {
    if is_stdin(path) {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading from terminal; press Ctrl-D to finish");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

// Error types

#[derive(Debug)]
enum GazefuseCliError {
    Io(io::Error),
    Process(ProcessError),
    Json(serde_json::Error),
    BothStdin,
    NothingToValidate,
    ValidationFailed(usize),
}

impl From<io::Error> for GazefuseCliError {
    fn from(e: io::Error) -> Self {
        GazefuseCliError::Io(e)
    }
}

impl From<ProcessError> for GazefuseCliError {
    fn from(e: ProcessError) -> Self {
        GazefuseCliError::Process(e)
    }
}

impl From<serde_json::Error> for GazefuseCliError {
    fn from(e: serde_json::Error) -> Self {
        GazefuseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GazefuseCliError> for CliError {
    fn from(e: GazefuseCliError) -> Self {
        match e {
            GazefuseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GazefuseCliError::Process(e) => CliError {
                code: "PROCESS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'gazefuse validate' on the input logs for details".to_string()),
            },
            GazefuseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            GazefuseCliError::BothStdin => CliError {
                code: "BOTH_STDIN".to_string(),
                message: "only one input may read from stdin".to_string(),
                hint: Some("Pass a file path for at least one of the two logs".to_string()),
            },
            GazefuseCliError::NothingToValidate => CliError {
                code: "NO_INPUT".to_string(),
                message: "no log given to validate".to_string(),
                hint: Some("Pass --interaction and/or --biometric".to_string()),
            },
            GazefuseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} log(s) failed validation"),
                hint: Some("Fix the reported format problems and retry".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationCheck {
    path: String,
    rows: usize,
    error: Option<String>,
}
