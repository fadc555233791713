//! Command-line interface module for dirsort.
//!
//! This module handles:
//! - Argument parsing and exit codes
//! - Resolving the run configuration
//! - Organize and undo orchestration, including manifest writes
//! - The final summary line

use crate::config::{Config, ConfigError, Mode};
use crate::file_organizer::MoveExecutor;
use crate::logging;
use crate::manifest::{self, ManifestWriter};
use crate::output::{OutputFormatter, plural};
use crate::planner::{self, PlanError};
use crate::undo::UndoManager;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Exit code for invalid arguments or configuration.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for errors while the run was under way.
pub const EXIT_RUNTIME_ERROR: u8 = 2;

/// Sort the files of a directory into type or date folders, and undo it.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Args {
    /// Directory whose top-level files are organized
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Group files by type category or by modification month (ignored with --undo)
    #[arg(long = "by", value_enum, default_value_t = Mode::Type)]
    pub mode: Mode,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Move files back to where the recorded runs found them
    #[arg(long)]
    pub undo: bool,

    /// TOML file with extra exclusion rules
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolves and validates the configuration these arguments describe.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        Config::new(
            &self.path,
            self.mode,
            self.dry_run,
            self.undo,
            self.config.as_deref(),
        )
    }
}

/// Errors that end a run early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => EXIT_CONFIG_ERROR,
            AppError::Plan(_) => EXIT_RUNTIME_ERROR,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub undo: bool,
    pub dry_run: bool,
    /// Entries considered: files that passed the filter, or manifest rows on undo.
    pub scanned: usize,
    /// Moves planned, or manifest rows on undo.
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "[DRY RUN] ")?;
        }
        let verb = match (self.undo, self.dry_run) {
            (false, false) => "moved",
            (false, true) => "would move",
            (true, false) => "restored",
            (true, true) => "would restore",
        };
        if self.undo {
            write!(
                f,
                "Undo: {} recorded, {} {}, {} failed",
                self.planned, verb, self.succeeded, self.failed
            )
        } else {
            write!(
                f,
                "Scanned {}, planned {}, {} {}, {} failed",
                self.scanned, self.planned, verb, self.succeeded, self.failed
            )
        }
    }
}

/// Parses arguments, runs, prints the summary and maps the outcome to an exit code.
pub fn run_cli(args: Args) -> ExitCode {
    logging::init(args.verbose);

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => return fail(AppError::from(e)),
    };

    match run(&config) {
        Ok(summary) => {
            OutputFormatter::success(&summary.to_string());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fail(error: AppError) -> ExitCode {
    OutputFormatter::error(&format!("Error: {}", error));
    ExitCode::from(error.exit_code())
}

/// Runs organize or undo for an already validated configuration.
///
/// Per-file failures are reported as they happen and counted in the summary; only a
/// failure to read the target directory ends the run with an error.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::run;
/// use dirsort::config::{Config, Mode};
/// use std::path::Path;
///
/// let config = Config::new(Path::new("/path/to/directory"), Mode::Type, true, false, None)?;
/// let summary = run(&config)?;
/// println!("{summary}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run(config: &Config) -> Result<Summary, AppError> {
    if config.undo {
        Ok(undo(config))
    } else {
        organize(config)
    }
}

fn organize(config: &Config) -> Result<Summary, AppError> {
    let root = config.target_dir.as_path();
    if config.dry_run {
        OutputFormatter::info(&format!("DRY RUN: analyzing {}", root.display()));
    } else {
        OutputFormatter::info(&format!("Organizing {}", root.display()));
    }

    let plan = planner::plan(config)?;
    let mut summary = Summary {
        dry_run: config.dry_run,
        scanned: plan.scanned,
        planned: plan.planned(),
        ..Summary::default()
    };

    if plan.is_empty() {
        OutputFormatter::info("Nothing to organize.");
        return Ok(summary);
    }

    if config.dry_run {
        let report = MoveExecutor::new(root, true).execute(&plan.moves);
        OutputFormatter::summary_table(&plan.folder_counts(root), plan.planned());
        summary.succeeded = report.succeeded;
        summary.failed = report.failed.len();
        return Ok(summary);
    }

    // an unwritable manifest costs undo, not the run
    let mut writer = match ManifestWriter::open(root) {
        Ok(writer) => Some(writer),
        Err(e) => {
            OutputFormatter::warning(&format!("{}; these moves cannot be undone", e));
            None
        }
    };

    let mut recorded = 0;
    let progress = OutputFormatter::create_progress_bar(plan.planned() as u64);
    let report = MoveExecutor::new(root, false)
        .with_progress(&progress)
        .execute_with(&plan.moves, |mv| {
            let failed = match writer.as_mut().map(|writer| writer.record(mv)) {
                Some(Ok(())) => {
                    recorded += 1;
                    None
                }
                Some(Err(e)) => Some(e),
                None => None,
            };
            if let Some(e) = failed {
                progress.suspend(|| {
                    OutputFormatter::warning(&format!(
                        "{}; later moves will not be recorded",
                        e
                    ))
                });
                writer = None;
            }
        });
    progress.finish_and_clear();
    tracing::debug!(attempted = report.attempted(), "organize pass finished");

    if report.copied > 0 {
        tracing::info!(count = report.copied, "moves needed the copy fallback");
    }
    if !report.is_complete_success() {
        OutputFormatter::warning(&format!(
            "{} {} could not be moved",
            report.failed.len(),
            plural(report.failed.len())
        ));
    }
    if writer.is_some() && recorded > 0 {
        OutputFormatter::info(&format!(
            "Moves recorded in {}. Run with --undo to revert.",
            manifest::MANIFEST_FILE_NAME
        ));
    }

    summary.succeeded = report.succeeded;
    summary.failed = report.failed.len();
    Ok(summary)
}

fn undo(config: &Config) -> Summary {
    let root = config.target_dir.as_path();
    if config.dry_run {
        OutputFormatter::info(&format!("DRY RUN: undo in {}", root.display()));
    } else {
        OutputFormatter::info(&format!("Undoing recorded moves in {}", root.display()));
    }

    let progress = (!config.dry_run).then(|| OutputFormatter::create_progress_bar(0));
    let report = UndoManager::undo(root, config.dry_run, progress.as_ref());
    if let Some(progress) = &progress {
        progress.finish_and_clear();
    }

    if report.entries == 0 {
        OutputFormatter::info("Nothing to undo.");
    }
    if let Some(e) = &report.clear_error {
        OutputFormatter::warning(&format!("{}; the same moves may be undone again", e));
    }

    Summary {
        undo: true,
        dry_run: config.dry_run,
        scanned: report.entries,
        planned: report.entries,
        succeeded: report.restored(),
        failed: report.execution.failed.len(),
    }
}
