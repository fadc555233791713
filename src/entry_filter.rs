//! Decides which top-level entries of the target directory are eligible to move.
//!
//! Skipping the manifest, hidden entries and the folders produced by earlier runs is
//! what makes organizing the same directory twice a no-op.

use crate::config::CompiledFilters;
use crate::file_category::is_category_label;
use crate::manifest::MANIFEST_FILE_NAME;
use std::fs;
use std::path::Path;

/// Leading character that marks an entry as hidden.
pub const SKIP_MARKER: char = '.';

/// Returns true if `entry` must not be organized.
///
/// An entry is skipped when any of the following holds:
/// - it is not a regular file (symlinks are followed, so a link to a file counts as a file)
/// - it is the manifest
/// - its name starts with [`SKIP_MARKER`]
/// - its name is a category label
/// - it is a direct child of `root` named with exactly four digits (a date-mode year folder)
pub fn should_skip(entry: &Path, root: &Path) -> bool {
    let Some(name) = entry.file_name() else {
        return true;
    };
    let name = name.to_string_lossy();

    if name == MANIFEST_FILE_NAME
        || name.starts_with(SKIP_MARKER)
        || is_category_label(&name)
        || (entry.parent() == Some(root) && is_year_name(&name))
    {
        return true;
    }

    match fs::metadata(entry) {
        Ok(metadata) => !metadata.is_file(),
        Err(e) => {
            tracing::warn!(path = %entry.display(), error = %e, "cannot stat entry, skipping");
            true
        }
    }
}

fn is_year_name(name: &str) -> bool {
    name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit())
}

/// The fixed skip rules combined with the user's exclusion rules.
pub struct EntryFilter<'a> {
    root: &'a Path,
    excludes: &'a CompiledFilters,
}

impl<'a> EntryFilter<'a> {
    pub fn new(root: &'a Path, excludes: &'a CompiledFilters) -> Self {
        Self { root, excludes }
    }

    /// Returns true if `entry` is skipped by a fixed rule or a configured exclusion.
    pub fn should_skip(&self, entry: &Path) -> bool {
        if should_skip(entry, self.root) {
            return true;
        }

        let excluded = entry
            .file_name()
            .is_some_and(|name| self.excludes.is_excluded(&name.to_string_lossy()));
        if excluded {
            tracing::debug!(path = %entry.display(), "excluded by configuration");
        }
        excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use tempfile::TempDir;

    fn touch(root: &Path, name: &str) -> std::path::PathBuf {
        let path = root.join(name);
        fs::write(&path, "x").unwrap();
        path
    }

    #[test]
    fn test_regular_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        assert!(!should_skip(&touch(root, "a.jpg"), root));
        assert!(!should_skip(&touch(root, "notes"), root));
    }

    #[test]
    fn test_hidden_and_manifest_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        assert!(should_skip(&touch(root, ".hidden"), root));
        assert!(should_skip(&touch(root, MANIFEST_FILE_NAME), root));
    }

    #[test]
    fn test_directories_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let dir = root.join("projects");
        fs::create_dir(&dir).unwrap();
        assert!(should_skip(&dir, root));
    }

    #[test]
    fn test_category_and_year_names_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["Images", "PDFs", "Other", "2024"] {
            let dir = root.join(name);
            fs::create_dir(&dir).unwrap();
            assert!(should_skip(&dir, root), "{name}");
        }
        // a year-named file outside the root is not caught by the year rule
        let nested = root.join("nested");
        fs::create_dir(&nested).unwrap();
        assert!(!should_skip(&touch(&nested, "2024"), root));
        assert!(!should_skip(&touch(root, "12345"), root));
    }

    #[test]
    fn test_missing_entry_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        assert!(should_skip(&root.join("gone.txt"), root));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_follow_their_target() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let file = touch(root, "real.txt");
        let dir = root.join("realdir");
        fs::create_dir(&dir).unwrap();

        let file_link = root.join("link.txt");
        let dir_link = root.join("linkdir");
        std::os::unix::fs::symlink(&file, &file_link).unwrap();
        std::os::unix::fs::symlink(&dir, &dir_link).unwrap();

        assert!(!should_skip(&file_link, root));
        assert!(should_skip(&dir_link, root));
    }

    #[test]
    fn test_entry_filter_applies_configured_excludes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let excludes = FilterConfig::parse("[filters.exclude]\nextensions = [\"part\"]\n")
            .unwrap()
            .compile()
            .unwrap();
        let filter = EntryFilter::new(root, &excludes);

        assert!(filter.should_skip(&touch(root, "movie.part")));
        assert!(filter.should_skip(&touch(root, ".hidden")));
        assert!(!filter.should_skip(&touch(root, "movie.mkv")));
    }
}
