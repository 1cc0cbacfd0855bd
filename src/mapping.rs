//! Mapping table: video filename to playable location.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::resolver::{
    COLUMN_FILE_ID, COLUMN_NAME, COLUMN_TYPE, COLUMN_URL, VIDEO_TYPE,
};
use crate::errors::LabelerError;
use crate::types::{DriveFileId, VideoFileName};
use crate::utils::non_blank;

/// One mapping row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Lookup key compared by exact equality against candidate filenames.
    pub name: VideoFileName,
    /// Direct playable URL.
    pub url: Option<String>,
    /// Google Drive file id.
    pub file_id: Option<DriveFileId>,
    /// Asset type; rows typed other than `video` are never matched.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl MappingEntry {
    /// Entry with only a name.
    pub fn named(name: impl Into<VideoFileName>) -> Self {
        Self {
            name: name.into(),
            url: None,
            file_id: None,
            kind: None,
        }
    }

    /// Direct playable URL; wins over `file_id`.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Google Drive file id.
    pub fn with_file_id(mut self, file_id: impl Into<DriveFileId>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    /// Asset type; rows typed other than `video` are excluded.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// True when this row may take part in matching.
    pub fn is_video(&self) -> bool {
        non_blank(self.kind.as_deref()).is_none_or(|kind| kind == VIDEO_TYPE)
    }
}

/// Name-keyed mapping table, first row wins on duplicate names.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    entries: IndexMap<VideoFileName, MappingEntry>,
    has_type_column: bool,
    excluded_rows: usize,
    duplicate_rows: usize,
}

impl MappingTable {
    /// Build a table from entries.
    ///
    /// The type filter applies when any entry carries a type.
    pub fn from_entries(entries: impl IntoIterator<Item = MappingEntry>) -> Self {
        let entries: Vec<MappingEntry> = entries.into_iter().collect();
        let has_type_column = entries.iter().any(|entry| entry.kind.is_some());
        let mut table = Self {
            has_type_column,
            ..Self::default()
        };
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    /// Read a comma-separated table with a header row.
    ///
    /// The header must include `name`; `url`, `file_id`, and `type` are optional.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LabelerError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|header| header == name);
        let name_col = column(COLUMN_NAME).ok_or_else(|| {
            LabelerError::MappingTable(format!(
                "header row is missing the '{COLUMN_NAME}' column (found: {})",
                headers.iter().collect::<Vec<_>>().join(",")
            ))
        })?;
        let url_col = column(COLUMN_URL);
        let file_id_col = column(COLUMN_FILE_ID);
        let type_col = column(COLUMN_TYPE);

        let mut table = Self {
            has_type_column: type_col.is_some(),
            ..Self::default()
        };
        for row in csv_reader.records() {
            let row = row?;
            let cell = |col: Option<usize>| {
                non_blank(col.and_then(|idx| row.get(idx))).map(ToString::to_string)
            };
            let Some(name) = cell(Some(name_col)) else {
                continue;
            };
            table.insert(MappingEntry {
                name,
                url: cell(url_col),
                file_id: cell(file_id_col),
                kind: cell(type_col),
            });
        }
        debug!(
            "[mos:mapping] loaded entries={} excluded={} duplicates={}",
            table.entries.len(),
            table.excluded_rows,
            table.duplicate_rows
        );
        Ok(table)
    }

    /// Read a table from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self, LabelerError> {
        let file = File::open(path).map_err(|err| {
            LabelerError::MappingTable(format!("cannot open {}: {err}", path.display()))
        })?;
        Self::from_reader(file)
    }

    fn insert(&mut self, entry: MappingEntry) {
        if self.has_type_column && !entry.is_video() {
            self.excluded_rows += 1;
            return;
        }
        if self.entries.contains_key(&entry.name) {
            warn!(
                "[mos:mapping] duplicate mapping name '{}' ignored; first row wins",
                entry.name
            );
            self.duplicate_rows += 1;
            return;
        }
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Matchable entry for an exact filename.
    pub fn get(&self, name: &str) -> Option<&MappingEntry> {
        self.entries.get(name)
    }

    /// Number of matchable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no eligible row was loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the source table defined a type column.
    pub fn has_type_column(&self) -> bool {
        self.has_type_column
    }

    /// Rows dropped by the type filter.
    pub fn excluded_rows(&self) -> usize {
        self.excluded_rows
    }

    /// Rows dropped because their name was already present.
    pub fn duplicate_rows(&self) -> usize {
        self.duplicate_rows
    }

    /// Matchable entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }
}
