use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::constants::source::JSONL_EXTENSION;
use crate::errors::LabelerError;

/// Filesystem listing of JSON-lines sources directly under a root.
pub struct JsonlDirectory {
    root: PathBuf,
}

impl JsonlDirectory {
    /// Create a listing rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being listed.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `*.jsonl` paths directly under the root, sorted by file name.
    ///
    /// A missing or unreadable root is reported as `Io`.
    pub fn list(&self) -> Result<Vec<PathBuf>, LabelerError> {
        if !self.root.is_dir() {
            return Err(LabelerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )));
        }
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() || entry.path().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_jsonl_file(path))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }
}

/// True if the path has a `.jsonl` extension (case-insensitive).
pub fn is_jsonl_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(JSONL_EXTENSION))
        .unwrap_or(false)
}

/// File name of `path` as display text.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Best-effort file modified time.
pub fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(system_time_to_utc(modified))
}

fn system_time_to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
