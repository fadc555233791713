//! File classification by extension or modification date.
//!
//! The category labels defined here are also the folder names created inside the
//! target directory, and [`CATEGORY_LABELS`] is what the entry filter checks against
//! so a second run never descends into (or re-sorts) its own output.
//!
//! # Examples
//!
//! ```
//! use dirsort::file_category::{Category, category_by_type};
//!
//! assert_eq!(category_by_type("holiday.JPG"), Category::Images);
//! assert_eq!(category_by_type("report.pdf"), Category::Pdfs);
//! assert_eq!(category_by_type("notes"), Category::Other);
//! ```
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;

/// A broad file category.
///
/// The set is closed: every file maps to exactly one variant, with [`Category::Other`]
/// as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Images,
    /// Video files (MP4, MKV, MOV, etc.)
    Videos,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// PDF files
    Pdfs,
    /// Text and word-processor documents
    Documents,
    /// Spreadsheet files (XLSX, CSV, ODS, etc.)
    Spreadsheets,
    /// Presentation files (PPTX, ODP, etc.)
    Presentations,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code and structured text
    Code,
    /// Installers and executables
    Apps,
    /// Font files (TTF, OTF, WOFF, etc.)
    Fonts,
    /// Anything not in the extension table
    Other,
}

/// Every folder label a category can produce, in declaration order.
///
/// Shared by the classifier (folder naming) and the entry filter (re-run detection).
pub const CATEGORY_LABELS: [&str; 12] = [
    "Images",
    "Videos",
    "Audio",
    "PDFs",
    "Documents",
    "Spreadsheets",
    "Presentations",
    "Archives",
    "Code",
    "Apps",
    "Fonts",
    "Other",
];

impl Category {
    /// All categories, in the same order as [`CATEGORY_LABELS`].
    pub const ALL: [Category; 12] = [
        Category::Images,
        Category::Videos,
        Category::Audio,
        Category::Pdfs,
        Category::Documents,
        Category::Spreadsheets,
        Category::Presentations,
        Category::Archives,
        Category::Code,
        Category::Apps,
        Category::Fonts,
        Category::Other,
    ];

    /// Returns the folder label for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.label(), "Images");
    /// assert_eq!(Category::Pdfs.label(), "PDFs");
    /// ```
    pub fn label(&self) -> &'static str {
        CATEGORY_LABELS[*self as usize]
    }

    /// Looks a category up by its exact folder label.
    pub fn from_label(label: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|category| category.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns true if `name` is exactly one of the category folder labels.
pub fn is_category_label(name: &str) -> bool {
    CATEGORY_LABELS.contains(&name)
}

static EXTENSION_TABLE: LazyLock<HashMap<&'static str, Category>> = LazyLock::new(|| {
    const GROUPS: &[(Category, &[&str])] = &[
        (
            Category::Images,
            &[
                "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "tiff", "tif", "ico", "heic",
                "raw",
            ],
        ),
        (
            Category::Videos,
            &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v"],
        ),
        (
            Category::Audio,
            &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"],
        ),
        (Category::Pdfs, &["pdf"]),
        (
            Category::Documents,
            &["doc", "docx", "txt", "rtf", "odt", "md", "tex"],
        ),
        (Category::Spreadsheets, &["xls", "xlsx", "csv", "ods"]),
        (Category::Presentations, &["ppt", "pptx", "odp", "key"]),
        (
            Category::Archives,
            &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"],
        ),
        (
            Category::Code,
            &[
                "py", "js", "ts", "html", "css", "java", "c", "cpp", "h", "rs", "go", "rb", "php",
                "sh", "json", "xml", "yaml", "yml", "toml",
            ],
        ),
        (
            Category::Apps,
            &["exe", "msi", "dmg", "app", "deb", "rpm", "apk"],
        ),
        (Category::Fonts, &["ttf", "otf", "woff", "woff2"]),
    ];

    GROUPS
        .iter()
        .flat_map(|(category, extensions)| extensions.iter().map(move |ext| (*ext, *category)))
        .collect()
});

/// Classifies a file name by its extension.
///
/// The extension is the text after the final `.`, compared case-insensitively.
/// Names without an extension (including dotfiles such as `.profile`) and extensions
/// missing from the table resolve to [`Category::Other`].
pub fn category_by_type(file_name: &str) -> Category {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .and_then(|ext| EXTENSION_TABLE.get(ext.as_str()).copied())
        .unwrap_or(Category::Other)
}

/// Formats a modification time as a `YYYY/MM` folder label in the host's local time.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::category_by_date;
/// use std::time::SystemTime;
///
/// let label = category_by_date(SystemTime::UNIX_EPOCH);
/// assert!(label == "1970/01" || label == "1969/12");
/// ```
pub fn category_by_date(modified: SystemTime) -> String {
    let local: DateTime<Local> = modified.into();
    local.format("%Y/%m").to_string()
}
