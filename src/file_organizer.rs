//! Moving files into place.
//!
//! A [`Move`] is a single planned relocation. [`MoveExecutor`] carries a list of them
//! out (or only prints them, in dry-run mode), trying an atomic rename first and
//! falling back to copy-then-delete when the rename is refused, as happens across
//! filesystems. Each move stands on its own: a failure is reported and counted, and
//! the remaining moves still run.

use crate::manifest::relative_slash_path;
use crate::output::OutputFormatter;
use indicatif::ProgressBar;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single file relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Where the file is before the move.
    pub source: PathBuf,
    /// Where the file ends up.
    pub destination: PathBuf,
}

impl Move {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// The move that puts the file back where it came from.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }
}

/// Errors for a single move. None of them abort a batch.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Failed to create the destination's parent directories.
    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Both the rename and the copy fallback failed.
    #[error(
        "failed to move {} to {}: rename failed ({rename_error}), copy failed ({source})",
        .from.display(),
        .to.display()
    )]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        rename_error: io::Error,
        source: io::Error,
    },
    /// The copy succeeded but the original could not be deleted.
    #[error(
        "copied {} to {} but could not remove the original: {source}",
        .from.display(),
        .to.display()
    )]
    SourceRemovalFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// The file to move is not there anymore.
    #[error("{} no longer exists", .0.display())]
    Missing(PathBuf),
}

/// How a successful move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Renamed,
    Copied,
}

/// Moves one file, creating the destination's parent directories first.
///
/// Tries [`fs::rename`]; if that fails, copies the file over any existing
/// destination and deletes the source. There is no further retry.
pub fn move_file(mv: &Move) -> Result<Transfer, MoveError> {
    if let Some(parent) = mv.destination.parent() {
        fs::create_dir_all(parent).map_err(|e| MoveError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let rename_error = match fs::rename(&mv.source, &mv.destination) {
        Ok(()) => return Ok(Transfer::Renamed),
        Err(e) => e,
    };

    tracing::warn!(
        from = %mv.source.display(),
        to = %mv.destination.display(),
        error = %rename_error,
        "rename failed, falling back to copy"
    );
    copy_then_remove(&mv.source, &mv.destination).map_err(|failure| match failure {
        CopyFailure::Copy(source) => MoveError::CopyFailed {
            from: mv.source.clone(),
            to: mv.destination.clone(),
            rename_error,
            source,
        },
        CopyFailure::Remove(source) => MoveError::SourceRemovalFailed {
            from: mv.source.clone(),
            to: mv.destination.clone(),
            source,
        },
    })?;

    Ok(Transfer::Copied)
}

#[derive(Debug)]
enum CopyFailure {
    Copy(io::Error),
    Remove(io::Error),
}

/// Copies `from` onto `to` (overwriting), keeps the modification time, then deletes `from`.
fn copy_then_remove(from: &Path, to: &Path) -> Result<(), CopyFailure> {
    fs::copy(from, to).map_err(CopyFailure::Copy)?;

    // fs::copy does not carry the mtime, which date mode classifies on
    if let Err(e) = preserve_modified(from, to) {
        tracing::debug!(path = %to.display(), error = %e, "could not preserve modification time");
    }

    fs::remove_file(from).map_err(CopyFailure::Remove)
}

fn preserve_modified(from: &Path, to: &Path) -> io::Result<()> {
    let modified = fs::metadata(from)?.modified()?;
    File::options().write(true).open(to)?.set_modified(modified)
}

/// Outcome counts for a batch of moves.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Moves that completed (or, in dry-run, would have been attempted).
    pub succeeded: usize,
    /// Moves that failed, with the reason.
    pub failed: Vec<(Move, MoveError)>,
    /// Successful moves that needed the copy fallback.
    pub copied: usize,
}

impl ExecutionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Performs or simulates a list of moves.
pub struct MoveExecutor<'a> {
    root: &'a Path,
    dry_run: bool,
    progress: Option<&'a ProgressBar>,
}

impl<'a> MoveExecutor<'a> {
    /// `root` is only used to print paths relative to the target directory.
    pub fn new(root: &'a Path, dry_run: bool) -> Self {
        Self {
            root,
            dry_run,
            progress: None,
        }
    }

    /// Advances `progress` once per attempted move on live runs.
    pub fn with_progress(mut self, progress: &'a ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn execute(&self, moves: &[Move]) -> ExecutionReport {
        self.execute_with(moves, |_| {})
    }

    /// Executes `moves` in order, calling `on_moved` right after each successful live move.
    ///
    /// In dry-run mode one line per move is printed, nothing is touched, `on_moved` is
    /// never called and every move counts as a success.
    pub fn execute_with<F>(&self, moves: &[Move], mut on_moved: F) -> ExecutionReport
    where
        F: FnMut(&Move),
    {
        let mut report = ExecutionReport::default();
        for mv in moves {
            if self.execute_one(mv, &mut report) && !self.dry_run {
                on_moved(mv);
            }
        }
        report
    }

    /// Performs (or prints) a single move and tallies it into `report`.
    ///
    /// Exactly one of the success or failure counts is incremented. Returns true on success.
    pub fn execute_one(&self, mv: &Move, report: &mut ExecutionReport) -> bool {
        if self.dry_run {
            OutputFormatter::dry_run_notice(&format!(
                "{} -> {}",
                relative_slash_path(&mv.source, self.root),
                relative_slash_path(&mv.destination, self.root)
            ));
            report.succeeded += 1;
            return true;
        }

        match move_file(mv) {
            Ok(transfer) => {
                tracing::info!(
                    from = %mv.source.display(),
                    to = %mv.destination.display(),
                    ?transfer,
                    "moved"
                );
                report.succeeded += 1;
                if transfer == Transfer::Copied {
                    report.copied += 1;
                }
                if let Some(progress) = self.progress {
                    progress.inc(1);
                }
                true
            }
            Err(e) => {
                self.record_failure(mv, e, report);
                false
            }
        }
    }

    /// Reports `error` for `mv` and counts it as a failure.
    pub fn record_failure(&self, mv: &Move, error: MoveError, report: &mut ExecutionReport) {
        let message = error.to_string();
        match self.progress {
            Some(progress) => {
                progress.suspend(|| OutputFormatter::error(&message));
                progress.inc(1);
            }
            None => OutputFormatter::error(&message),
        }
        report.failed.push((mv.clone(), error));
    }
}
