//! Run configuration and optional exclusion rules.
//!
//! A [`Config`] is resolved once, before anything on disk is touched. Building one
//! validates the target directory and compiles any user exclusion rules, so an
//! invalid configuration aborts the run with no side effects.
//!
//! # Configuration File Format
//!
//! Exclusion rules are read from TOML:
//!
//! ```toml
//! [filters.exclude]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! extensions = ["part", "crdownload"]
//! patterns = ["*.tmp"]
//! regex = ["^~\\$"]
//! ```
//!
//! These rules can only exclude additional files. Hidden files, the manifest and the
//! folders created by previous runs are always skipped regardless of configuration.

use clap::ValueEnum;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_NAME: &str = ".dirsortrc.toml";

/// Errors that make a configuration unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The target directory does not exist.
    #[error("target directory not found: {}", .0.display())]
    TargetNotFound(PathBuf),
    /// The target path exists but is not a directory.
    #[error("target is not a directory: {}", .0.display())]
    TargetNotDirectory(PathBuf),
    /// The target directory could not be resolved to an absolute path.
    #[error("cannot resolve target directory {}: {source}", .path.display())]
    TargetUnresolvable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Configuration file could not be read.
    #[error("cannot read configuration {}: {source}", .path.display())]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid TOML syntax or structure.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// How files are grouped into folders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One folder per file-type category (`Images/`, `Code/`, ...).
    #[default]
    Type,
    /// One `YYYY/MM` folder pair per modification month.
    Date,
}

/// A fully validated run configuration.
#[derive(Debug)]
pub struct Config {
    /// Absolute, canonical path of the directory being organized.
    pub target_dir: PathBuf,
    pub mode: Mode,
    pub dry_run: bool,
    pub undo: bool,
    /// User exclusion rules, empty when no configuration file was found.
    pub filters: CompiledFilters,
}

impl Config {
    /// Validates `target_dir` and loads exclusion rules.
    ///
    /// `config_path`, when given, must point at a readable TOML file; otherwise the
    /// usual lookup in [`FilterConfig::load`] applies.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the target is missing or not a directory, or if the
    /// configuration file cannot be read or compiled.
    pub fn new(
        target_dir: &Path,
        mode: Mode,
        dry_run: bool,
        undo: bool,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let target_dir = validate_target(target_dir)?;
        let filters = FilterConfig::load(config_path)?.compile()?;
        if !filters.is_empty() {
            tracing::debug!("user exclusion rules active");
        }

        Ok(Self {
            target_dir,
            mode,
            dry_run,
            undo,
            filters,
        })
    }
}

/// Checks that `path` is an existing directory and returns its canonical form.
pub fn validate_target(path: &Path) -> Result<PathBuf, ConfigError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::TargetNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::TargetUnresolvable {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if !metadata.is_dir() {
        return Err(ConfigError::TargetNotDirectory(path.to_path_buf()));
    }

    fs::canonicalize(path).map_err(|e| ConfigError::TargetUnresolvable {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Exclusion rules as deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterRules,
}

/// Root-level filter rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl FilterConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided (must exist)
    /// 2. `.dirsortrc.toml` in the current directory
    /// 3. `~/.config/dirsort/config.toml`
    /// 4. No extra exclusions
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ConfigUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::parse(&content)
    }

    /// Parses TOML text into rules.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compiles the rules into matchers, validating every pattern.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self.filters.exclude)
    }
}

/// Exclusion rules with every glob and regex pre-compiled.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: ExcludeRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filenames: rules.filenames.into_iter().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Returns true if no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
            && self.extensions.is_empty()
            && self.patterns.is_empty()
            && self.regexes.is_empty()
    }

    /// Checks a file name against the user's exclusion rules.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        if self.filenames.contains(file_name) {
            return true;
        }

        if let Some(ext) = Path::new(file_name).extension()
            && self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return true;
        }

        self.patterns.iter().any(|pattern| pattern.matches(file_name))
            || self.regexes.iter().any(|regex| regex.is_match(file_name))
    }
}
