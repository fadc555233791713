//! Turns the top level of the target directory into an ordered list of moves.
//!
//! Planning never touches the filesystem beyond reading it, and the complete plan
//! exists before the first move is executed.

use crate::config::{Config, Mode};
use crate::entry_filter::EntryFilter;
use crate::file_category::{category_by_date, category_by_type};
use crate::file_organizer::Move;
use crate::manifest::{is_recordable, relative_slash_path};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to list the target directory. Individual entries never fail a plan.
#[derive(Debug, Error)]
#[error("cannot read directory {}: {source}", .path.display())]
pub struct PlanError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// The moves for one organize run, in directory enumeration order.
#[derive(Debug, Default)]
pub struct Plan {
    pub moves: Vec<Move>,
    /// Entries that passed the entry filter, including ones already in place.
    pub scanned: usize,
}

impl Plan {
    pub fn planned(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Number of planned moves per destination folder, relative to `root`.
    pub fn folder_counts(&self, root: &Path) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for mv in &self.moves {
            let folder = mv
                .destination
                .parent()
                .map(|parent| relative_slash_path(parent, root))
                .unwrap_or_default();
            *counts.entry(folder).or_insert(0) += 1;
        }
        counts
    }
}

/// Builds a [`Plan`] for an organize run described by `config`.
///
/// # Errors
///
/// Returns a [`PlanError`] if the target directory cannot be listed.
pub fn plan(config: &Config) -> Result<Plan, PlanError> {
    let root = config.target_dir.as_path();
    let filter = EntryFilter::new(root, &config.filters);
    let entries = fs::read_dir(root).map_err(|e| PlanError {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut plan = Plan::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let source = entry.path();
        if filter.should_skip(&source) {
            continue;
        }
        plan.scanned += 1;

        // the manifest could not name it, so undo could never bring it back
        if !is_recordable(&source, root) {
            tracing::warn!(path = %source.display(), "name is not valid UTF-8, leaving it in place");
            continue;
        }

        let Some(destination) = destination_for(&source, root, config.mode) else {
            continue;
        };

        if is_same_file(&source, &destination) {
            tracing::debug!(path = %source.display(), "already in place");
            continue;
        }

        tracing::debug!(from = %source.display(), to = %destination.display(), "planned");
        plan.moves.push(Move::new(source, destination));
    }

    Ok(plan)
}

/// Computes `root/<category>/<name>` or `root/<YYYY>/<MM>/<name>`.
///
/// Returns `None` (with a warning) when date mode cannot read the modification time.
pub fn destination_for(source: &Path, root: &Path, mode: Mode) -> Option<PathBuf> {
    let file_name = source.file_name()?;

    let folder = match mode {
        Mode::Type => root.join(category_by_type(&file_name.to_string_lossy()).label()),
        Mode::Date => {
            let modified = match fs::metadata(source).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(
                        path = %source.display(),
                        error = %e,
                        "cannot read modification time, skipping"
                    );
                    return None;
                }
            };
            category_by_date(modified)
                .split('/')
                .fold(root.to_path_buf(), |path, part| path.join(part))
        }
    };

    Some(folder.join(file_name))
}

fn is_same_file(source: &Path, destination: &Path) -> bool {
    if source == destination {
        return true;
    }
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
