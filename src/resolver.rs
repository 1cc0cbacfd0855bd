//! Video resolver: canonical video reference to a playable reference.
//!
//! Candidate filenames are probed in order against the mapping table: the
//! converted variant first, then the original name. A converted match always
//! wins, even when the original row would also resolve.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::resolver::{
    CONVERTED_MARKER, DRIVE_DOWNLOAD_PREFIX, DRIVE_FILE_PREFIX, DRIVE_OPEN_SUFFIX,
    DRIVE_PREVIEW_SUFFIX,
};
use crate::mapping::{MappingEntry, MappingTable};
use crate::types::{DriveFileId, VideoFileName};
use crate::utils::{converted_variant, non_blank, video_file_name};

/// Google Drive reference with the three derived URL forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveLinks {
    /// Drive file id the links were built from.
    pub file_id: DriveFileId,
    /// Inline-preview URL, suitable for an embedded player.
    pub preview: String,
    /// Open-in-new-tab URL.
    pub open: String,
    /// Forced-download URL.
    pub download: String,
}

impl DriveLinks {
    /// Build all three forms from one file id.
    pub fn from_file_id(file_id: &str) -> Self {
        Self {
            file_id: file_id.to_string(),
            preview: format!("{DRIVE_FILE_PREFIX}{file_id}{DRIVE_PREVIEW_SUFFIX}"),
            open: format!("{DRIVE_FILE_PREFIX}{file_id}{DRIVE_OPEN_SUFFIX}"),
            download: format!("{DRIVE_DOWNLOAD_PREFIX}{file_id}"),
        }
    }
}

/// Why a video reference could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    /// The record carries no usable video reference.
    MissingVideoRef,
    /// No mapping table is loaded (and no local file matched).
    NoMappingTable {
        /// Original filename that would have been looked up.
        file_name: VideoFileName,
    },
    /// None of the candidate filenames appear in the mapping table.
    NotFound {
        /// Names probed, converted variant first.
        candidates: Vec<VideoFileName>,
    },
    /// The matched row has neither a url nor a file id.
    EmptyEntry {
        /// Mapping name that matched.
        name: VideoFileName,
    },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::MissingVideoRef => f.write_str("record has no video reference"),
            UnresolvedReason::NoMappingTable { file_name } => write!(
                f,
                "no mapping table loaded; cannot resolve '{file_name}' (load a mapping CSV with name,url,file_id columns)"
            ),
            UnresolvedReason::NotFound { candidates } => write!(
                f,
                "filename not found in mapping (tried: {})",
                candidates.join(", ")
            ),
            UnresolvedReason::EmptyEntry { name } => write!(
                f,
                "mapping row '{name}' has neither url nor file_id"
            ),
        }
    }
}

/// Outcome of resolving one video reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Direct playable URL from the mapping `url` column.
    Direct {
        /// Playable URL.
        url: String,
        /// Mapping name that matched.
        matched: VideoFileName,
    },
    /// Google Drive reference from the mapping `file_id` column.
    Drive {
        /// Preview, open, and download links.
        links: DriveLinks,
        /// Mapping name that matched.
        matched: VideoFileName,
    },
    /// Existing file under the configured local video root.
    Local {
        /// Existing file under the root.
        path: PathBuf,
    },
    /// Nothing playable; the reason is shown instead of a player.
    Unresolved(UnresolvedReason),
}

impl Resolution {
    /// True for every variant except `Unresolved`.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved(_))
    }

    /// URL or path a player should load.
    pub fn playable(&self) -> Option<String> {
        match self {
            Resolution::Direct { url, .. } => Some(url.clone()),
            Resolution::Drive { links, .. } => Some(links.preview.clone()),
            Resolution::Local { path } => Some(path.display().to_string()),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Stateless resolver over an optional mapping table and local root.
#[derive(Clone, Debug)]
pub struct VideoResolver {
    converted_marker: String,
    local_root: Option<PathBuf>,
}

impl Default for VideoResolver {
    fn default() -> Self {
        Self {
            converted_marker: CONVERTED_MARKER.to_string(),
            local_root: None,
        }
    }
}

impl VideoResolver {
    /// Resolver with the default marker and no local root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the converted-asset marker.
    pub fn with_converted_marker(mut self, marker: impl Into<String>) -> Self {
        self.converted_marker = marker.into();
        self
    }

    /// Probe `root/<video_ref>` on disk when the mapping table has no match.
    pub fn with_local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = Some(root.into());
        self
    }

    /// Ordered candidate filenames: converted variant first, then the original.
    pub fn candidate_names(&self, video_ref: &str) -> Vec<VideoFileName> {
        let Some(file_name) = video_file_name(video_ref) else {
            return Vec::new();
        };
        let mut candidates = Vec::with_capacity(2);
        if let Some(converted) = converted_variant(&file_name, &self.converted_marker) {
            candidates.push(converted);
        }
        candidates.push(file_name);
        candidates
    }

    /// Resolve `video_ref` against `mapping`.
    pub fn resolve(&self, video_ref: Option<&str>, mapping: Option<&MappingTable>) -> Resolution {
        let Some(video_ref) = non_blank(video_ref) else {
            return Resolution::Unresolved(UnresolvedReason::MissingVideoRef);
        };
        let candidates = self.candidate_names(video_ref);
        let Some(original) = candidates.last().cloned() else {
            return Resolution::Unresolved(UnresolvedReason::MissingVideoRef);
        };

        if let Some(table) = mapping
            && let Some(entry) = candidates.iter().find_map(|name| table.get(name))
        {
            return resolve_entry(entry);
        }

        if let Some(path) = self.local_file(video_ref) {
            return Resolution::Local { path };
        }

        match mapping {
            Some(_) => Resolution::Unresolved(UnresolvedReason::NotFound { candidates }),
            None => Resolution::Unresolved(UnresolvedReason::NoMappingTable {
                file_name: original,
            }),
        }
    }

    /// `root/<video_ref>` when it exists; references are always kept under
    /// the root, so `..` components are refused and absolute paths re-rooted.
    fn local_file(&self, video_ref: &str) -> Option<PathBuf> {
        let root = self.local_root.as_deref()?;
        let mut path = root.to_path_buf();
        for component in Path::new(&video_ref.replace('\\', "/")).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::ParentDir => return None,
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        path.is_file().then_some(path)
    }
}

/// url first, then file_id, else an empty-entry reason.
fn resolve_entry(entry: &MappingEntry) -> Resolution {
    if let Some(url) = non_blank(entry.url.as_deref()) {
        return Resolution::Direct {
            url: url.to_string(),
            matched: entry.name.clone(),
        };
    }
    if let Some(file_id) = non_blank(entry.file_id.as_deref()) {
        return Resolution::Drive {
            links: DriveLinks::from_file_id(file_id),
            matched: entry.name.clone(),
        };
    }
    Resolution::Unresolved(UnresolvedReason::EmptyEntry {
        name: entry.name.clone(),
    })
}
