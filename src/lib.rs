//! dirsort - sort a directory's files into type or date folders, reversibly
//!
//! This library classifies the top-level files of a directory by extension or by
//! modification month, plans the moves into matching subfolders, executes them with a
//! copy fallback for cross-device renames, and logs every move to a manifest so the
//! whole thing can be undone.

pub mod cli;
pub mod config;
pub mod entry_filter;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod planner;
pub mod undo;

pub use cli::{Args, Summary, run, run_cli};
pub use config::{Config, ConfigError, Mode};
pub use file_category::{Category, category_by_date, category_by_type};
pub use file_organizer::{ExecutionReport, Move, MoveExecutor};
pub use planner::Plan;
pub use undo::{UndoManager, UndoReport};
