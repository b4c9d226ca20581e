//! CLI entrypoint for the focalkit suites.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use focalkit_harness::structured_log::{ArtifactIndex, validate_log_file};
use focalkit_harness::{ExitPolicy, HarnessConfig, RunReport, Runner};

/// Focal-function test runner.
#[derive(Debug, Parser)]
#[command(name = "focalkit")]
#[command(about = "Run focal-function suites with crash survival and structured logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Md,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List built-in suites and their cases.
    List {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Run suites and print a summary.
    Run {
        /// Suite to run (repeatable). Runs every suite when omitted.
        #[arg(long = "suite")]
        suites: Vec<String>,
        /// Structured JSONL log path, or `-` for stderr. Overrides FOCALKIT_LOG.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Output report path.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Report format.
        #[arg(long, value_enum, default_value = "md")]
        format: ReportFormat,
        /// Exit policy (`binary` or `count`). Overrides FOCALKIT_EXIT_POLICY.
        #[arg(long)]
        exit_policy: Option<String>,
        /// Let crashes abort the process instead of recording them.
        #[arg(long)]
        no_catch: bool,
        /// Run identifier used in trace ids.
        #[arg(long)]
        run_id: Option<String>,
        /// Write an artifact index (sha256 of log and report) to this path.
        #[arg(long)]
        artifact_index: Option<PathBuf>,
    },
    /// Validate a structured JSONL log.
    ValidateLog {
        /// Structured JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("focalkit: {err}");
            ExitCode::from(2)
        }
    }
}

fn dispatch(command: Command) -> Result<u8, Box<dyn std::error::Error>> {
    match command {
        Command::List { json } => {
            let suites = focalkit_suites::all_suites();
            if json {
                let listing: Vec<_> = suites
                    .iter()
                    .map(|suite| {
                        serde_json::json!({
                            "suite": suite.name,
                            "focal": suite.focal,
                            "cases": suite.cases().iter().map(|c| c.name).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for suite in &suites {
                    println!("{} ({})", suite.name, suite.focal);
                    for case in suite.cases() {
                        println!("  {:<28} {}", case.name, case.description);
                    }
                }
            }
            Ok(0)
        }
        Command::Run {
            suites,
            log,
            report,
            format,
            exit_policy,
            no_catch,
            run_id,
            artifact_index,
        } => {
            let mut config = HarnessConfig::from_env();
            if let Some(raw) = exit_policy {
                config = config.with_exit_policy(ExitPolicy::parse(&raw)?);
            }
            if no_catch {
                config = config.with_catch_crashes(false);
            }
            if let Some(path) = log {
                config = config.with_log_path(path);
            }
            if let Some(id) = run_id {
                config = config.with_run_id(id);
            }

            let selected = focalkit_suites::select(&suites)?;
            let policy = config.exit_policy;
            let log_path = config.log_file().map(Path::to_path_buf);
            let run_id = config.run_id.clone();

            let mut runner = Runner::from_config(config)?;
            let summary = runner.run(&selected);
            if runner.log_errors() > 0 {
                eprintln!("focalkit: {} log writes failed", runner.log_errors());
            }
            drop(runner);

            let run_report = RunReport::new("focalkit run", policy, summary);
            if let Some(path) = &report {
                let rendered = match format {
                    ReportFormat::Md => run_report.to_markdown(),
                    ReportFormat::Json => run_report.to_json(),
                };
                std::fs::write(path, rendered)?;
            }

            if let Some(index_path) = artifact_index {
                let mut index = ArtifactIndex::new(run_id);
                if let Some(path) = &log_path {
                    index.add_file(path, "log")?;
                }
                if let Some(path) = &report {
                    index.add_file(path, "report")?;
                }
                std::fs::write(&index_path, index.to_json()?)?;
            }

            Ok(u8::try_from(run_report.exit_code.clamp(0, 255)).unwrap_or(u8::MAX))
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            println!(
                "{}: {lines} lines, {} errors",
                log.display(),
                errors.len()
            );
            Ok(u8::from(!errors.is_empty()))
        }
    }
}
