//! Undo functionality for reverting file organization runs.
//!
//! The manifest is replayed newest-first and every file still present at its recorded
//! destination is moved back to its recorded source. Once every row has been attempted
//! the manifest is emptied, whether or not each row succeeded.
use crate::file_organizer::{ExecutionReport, MoveError, MoveExecutor};
use crate::manifest::{self, ManifestError};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;

/// Represents the result of an undo pass.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of rows read from the manifest.
    pub entries: usize,
    /// Outcome of the reverse moves. Failures include rows whose file has disappeared.
    pub execution: ExecutionReport,
    /// Set when the manifest could not be emptied after a live pass.
    pub clear_error: Option<ManifestError>,
}

impl UndoReport {
    /// Number of files put back (or, in dry-run, that would be).
    pub fn restored(&self) -> usize {
        self.execution.succeeded
    }

    /// Returns true if the undo was completely successful.
    pub fn is_complete_success(&self) -> bool {
        self.execution.is_complete_success() && self.clear_error.is_none()
    }
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Reverses every move recorded in the manifest of `root`.
    ///
    /// Rows are processed most recent first, so a file moved twice is walked back
    /// through both steps. A row whose destination no longer exists counts as a
    /// failure and the pass continues. After a live pass the manifest is truncated
    /// and any category or date folders left empty are removed, including ones that
    /// already existed before the organize run. A dry run only prints
    /// the reverse moves.
    ///
    /// A missing manifest is not an error: the report simply has zero entries.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// let report = UndoManager::undo(Path::new("/path/to/directory"), false, None);
    /// println!("Restored {} of {} files", report.restored(), report.entries);
    /// ```
    pub fn undo(root: &Path, dry_run: bool, progress: Option<&ProgressBar>) -> UndoReport {
        let moves = manifest::load(root);
        let mut report = UndoReport {
            entries: moves.len(),
            ..UndoReport::default()
        };

        let mut executor = MoveExecutor::new(root, dry_run);
        if let Some(progress) = progress {
            progress.set_length(moves.len() as u64);
            executor = executor.with_progress(progress);
        }

        for recorded in moves.iter().rev() {
            let restore = recorded.reversed();

            if !restore.source.exists() {
                executor.record_failure(
                    &restore,
                    MoveError::Missing(restore.source.clone()),
                    &mut report.execution,
                );
                continue;
            }

            if executor.execute_one(&restore, &mut report.execution) && !dry_run {
                prune_empty_parents(&restore.source, root);
            }
        }

        if !dry_run && let Err(e) = manifest::clear(root) {
            report.clear_error = Some(e);
        }

        report
    }
}

/// Removes `path`'s now-empty parent directories, stopping below `root`.
fn prune_empty_parents(path: &Path, root: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        // remove_dir refuses non-empty directories, which ends the walk
        if fs::remove_dir(dir).is_err() {
            break;
        }
        tracing::debug!(path = %dir.display(), "removed empty folder");
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::Move;
    use tempfile::TempDir;

    fn organize(root: &Path, name: &str, folder: &str) -> Move {
        let source = root.join(name);
        fs::write(&source, name).expect("Failed to write test file");
        let mv = Move::new(&source, root.join(folder).join(name));
        crate::file_organizer::move_file(&mv).expect("Failed to move file");
        mv
    }

    #[test]
    fn test_undo_no_manifest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report = UndoManager::undo(temp_dir.path(), false, None);

        assert_eq!(report.entries, 0);
        assert_eq!(report.restored(), 0);
        assert!(report.is_complete_success());
        assert!(!manifest::manifest_path(temp_dir.path()).exists());
    }

    #[test]
    fn test_undo_restores_and_clears() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let moves = vec![
            organize(root, "a.jpg", "Images"),
            organize(root, "b.txt", "Documents"),
        ];
        manifest::append(root, &moves).unwrap();

        let report = UndoManager::undo(root, false, None);

        assert_eq!(report.entries, 2);
        assert_eq!(report.restored(), 2);
        assert!(report.is_complete_success());
        assert_eq!(fs::read_to_string(root.join("a.jpg")).unwrap(), "a.jpg");
        assert!(root.join("b.txt").exists());
        assert!(!root.join("Images").exists());
        assert!(!root.join("Documents").exists());
        assert_eq!(fs::metadata(manifest::manifest_path(root)).unwrap().len(), 0);
    }

    #[test]
    fn test_undo_missing_file_counts_as_failure_and_still_clears() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let kept = organize(root, "a.jpg", "Images");
        let lost = organize(root, "b.txt", "Documents");
        fs::remove_file(&lost.destination).unwrap();
        manifest::append(root, &[kept, lost]).unwrap();

        let report = UndoManager::undo(root, false, None);

        assert_eq!(report.restored(), 1);
        assert_eq!(report.execution.failed.len(), 1);
        assert!(matches!(
            report.execution.failed[0].1,
            MoveError::Missing(_)
        ));
        assert!(root.join("a.jpg").exists());
        assert!(manifest::load(root).is_empty());
    }

    #[test]
    fn test_undo_walks_chains_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let first = organize(root, "x.txt", "Documents");
        let second = Move::new(&first.destination, root.join("Other").join("x.txt"));
        crate::file_organizer::move_file(&second).unwrap();
        manifest::append(root, &[first, second]).unwrap();

        let report = UndoManager::undo(root, false, None);

        assert_eq!(report.restored(), 2);
        assert!(root.join("x.txt").exists());
    }

    #[test]
    fn test_undo_dry_run_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let mv = organize(root, "a.jpg", "Images");
        manifest::append(root, std::slice::from_ref(&mv)).unwrap();
        let before = fs::read(manifest::manifest_path(root)).unwrap();

        let report = UndoManager::undo(root, true, None);

        assert_eq!(report.restored(), 1);
        assert!(mv.destination.exists());
        assert!(!mv.source.exists());
        assert_eq!(fs::read(manifest::manifest_path(root)).unwrap(), before);
    }

    #[test]
    fn test_prune_stops_at_non_empty_and_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2024").join("01")).unwrap();
        fs::create_dir_all(root.join("2024").join("02")).unwrap();

        prune_empty_parents(&root.join("2024").join("01").join("f.txt"), root);

        assert!(!root.join("2024").join("01").exists());
        assert!(root.join("2024").join("02").exists());
        assert!(root.exists());
    }
}
