//! The per-directory move log that makes organizing reversible.
//!
//! The manifest lives at the top of the target directory under
//! [`MANIFEST_FILE_NAME`]. Each line records one completed move as
//! `source,destination`, both relative to the target directory with `/` separators.
//! Runs append to it; a finished undo pass empties it.
//!
//! Rows are written with minimal CSV quoting, so ordinary names appear verbatim and a
//! name containing a comma, quote or newline is quoted instead of corrupting the row.
//! Rows that have more than two fields (unquoted names with commas) are split at the
//! first comma.

use crate::file_organizer::Move;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name of the manifest inside the target directory.
pub const MANIFEST_FILE_NAME: &str = ".dirsort_manifest";

/// Errors while writing or clearing the manifest.
///
/// Callers treat these as warnings: the moves themselves are real even when
/// the log of them is not.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot open manifest {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot write manifest {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },
    #[error("cannot clear manifest {}: {source}", .path.display())]
    Clear { path: PathBuf, source: io::Error },
    #[error("{} is not inside {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("{} is not valid UTF-8 and cannot be recorded", .0.display())]
    NotUtf8(PathBuf),
}

/// Location of the manifest for `root`.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE_NAME)
}

/// Renders `path` relative to `root` with `/` separators, or in full if it is not under `root`.
pub fn relative_slash_path(path: &Path, root: &Path) -> String {
    to_record_path(path, root).unwrap_or_else(|| path.display().to_string())
}

/// Returns true if `path` can be written to the manifest exactly as it is on disk.
pub fn is_recordable(path: &Path, root: &Path) -> bool {
    to_record_path(path, root).is_some()
}

fn to_record_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn from_record_path(root: &Path, record: &str) -> PathBuf {
    record
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Appends moves to the manifest one row at a time, flushing after each.
pub struct ManifestWriter {
    root: PathBuf,
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ManifestWriter {
    /// Opens (or creates) the manifest for appending.
    pub fn open(root: &Path) -> Result<Self, ManifestError> {
        let path = manifest_path(root);
        let open_error = |source| ManifestError::Open {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(open_error)?;
        // keep a hand-edited last line from fusing with the first new row
        if !ends_with_newline(&mut file).map_err(open_error)? {
            file.write_all(b"\n").map_err(open_error)?;
        }

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        Ok(Self {
            root: root.to_path_buf(),
            path,
            writer,
        })
    }

    /// Writes one row and flushes it to disk.
    pub fn record(&mut self, mv: &Move) -> Result<(), ManifestError> {
        let source = self.record_path(&mv.source)?;
        let destination = self.record_path(&mv.destination)?;

        let written = match self.writer.write_record([source.as_str(), destination.as_str()]) {
            Ok(()) => self.writer.flush().map_err(csv::Error::from),
            Err(e) => Err(e),
        };
        written.map_err(|e| ManifestError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    fn record_path(&self, path: &Path) -> Result<String, ManifestError> {
        if !path.starts_with(&self.root) {
            return Err(ManifestError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }
        to_record_path(path, &self.root).ok_or_else(|| ManifestError::NotUtf8(path.to_path_buf()))
    }
}

/// Returns true for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Appends `moves` to the manifest of `root`. Returns the number of rows written.
pub fn append(root: &Path, moves: &[Move]) -> Result<usize, ManifestError> {
    let mut writer = ManifestWriter::open(root)?;
    for mv in moves {
        writer.record(mv)?;
    }
    Ok(moves.len())
}

/// Reads every recorded move, oldest first, as absolute paths under `root`.
///
/// A missing or unreadable manifest yields an empty list. Rows that cannot be
/// parsed are skipped with a warning.
pub fn load(root: &Path) -> Vec<Move> {
    let path = manifest_path(root);
    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read manifest");
            return Vec::new();
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_slice());

    let mut moves = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(row = index + 1, error = %e, "skipping unreadable manifest row");
                continue;
            }
        };

        let source = record.get(0).unwrap_or_default();
        let destination = record.iter().skip(1).collect::<Vec<_>>().join(",");
        if source.is_empty() || destination.is_empty() {
            tracing::warn!(row = index + 1, "skipping incomplete manifest row");
            continue;
        }

        moves.push(Move::new(
            from_record_path(root, source),
            from_record_path(root, &destination),
        ));
    }
    moves
}

/// Truncates the manifest to empty. Does nothing if there is no manifest.
pub fn clear(root: &Path) -> Result<(), ManifestError> {
    let path = manifest_path(root);
    if !path.exists() {
        return Ok(());
    }
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(&path)
        .map(|_| ())
        .map_err(|e| ManifestError::Clear { path, source: e })
}
