//! JSON-lines sources: loading, catalogs, and input-mode fallback.
//!
//! Ownership model:
//! - `JsonlLoader` turns raw text into a `LoadedSource`, skipping bad lines.
//! - `SourceCatalog` lists and fetches named sources (directory or in-memory).
//! - `SourceLocator` tries input modes in order and returns the first usable one.

use std::collections::HashSet;
use std::io::BufRead;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::AliasTable;
use crate::data::CanonicalRecord;
use crate::errors::LabelerError;
use crate::normalize::RecordNormalizer;
use crate::types::{LogMessage, SourceName};

/// Source catalogs (listing + fetch) used by the catalog input mode.
pub mod catalog;
/// Input modes and the fallback locator.
pub mod locator;

pub use catalog::{DirectoryCatalog, InMemoryCatalog, SourceCatalog};
pub use locator::{SourceLocator, SourceMode};

/// One input line that contributed no record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLine {
    /// Zero-based line position in the source.
    pub line: usize,
    /// Decode or duplicate-id failure message.
    pub reason: LogMessage,
}

/// Records parsed from one JSON-lines source.
#[derive(Clone, Debug)]
pub struct LoadedSource {
    /// Display name (file name for files, catalog entry name, or upload name).
    pub name: SourceName,
    /// Canonical records in file order, ids unique.
    pub records: Vec<CanonicalRecord>,
    /// Lines that failed to decode or repeated an earlier id.
    pub skipped: Vec<SkippedLine>,
    /// Last modification time when the source is a file.
    pub modified_at: Option<DateTime<Utc>>,
}

impl LoadedSource {
    /// Number of loaded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no line produced a record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Line-by-line JSON-lines loader.
#[derive(Clone, Debug, Default)]
pub struct JsonlLoader {
    normalizer: RecordNormalizer,
}

impl JsonlLoader {
    /// Loader using `aliases` for field selection.
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            normalizer: RecordNormalizer::new(aliases),
        }
    }

    /// Load records from in-memory text.
    pub fn load_str(&self, name: impl Into<SourceName>, text: &str) -> LoadedSource {
        self.load_bytes(name, text.as_bytes())
    }

    /// Load records from raw bytes.
    ///
    /// Lines are split on `\n` and decoded one at a time, so a line that is
    /// not valid UTF-8 is skipped like any other undecodable line.
    pub fn load_bytes(&self, name: impl Into<SourceName>, bytes: &[u8]) -> LoadedSource {
        let mut state = LoadState::new(name.into());
        // slice split: `BufRead` for `&[u8]` would shadow it
        for (ordinal, line) in <[u8]>::split(bytes, |byte| *byte == b'\n').enumerate() {
            state.push_raw(&self.normalizer, ordinal, line);
        }
        state.finish()
    }

    /// Load records from a buffered reader.
    ///
    /// Decode failures skip the line; read failures abort with `Io`.
    pub fn load_reader<R: BufRead>(
        &self,
        name: impl Into<SourceName>,
        reader: R,
    ) -> Result<LoadedSource, LabelerError> {
        let mut state = LoadState::new(name.into());
        for (ordinal, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            state.push_raw(&self.normalizer, ordinal, &line);
        }
        Ok(state.finish())
    }
}

struct LoadState {
    source: LoadedSource,
    seen_ids: HashSet<String>,
}

impl LoadState {
    fn new(name: SourceName) -> Self {
        Self {
            source: LoadedSource {
                name,
                records: Vec::new(),
                skipped: Vec::new(),
                modified_at: None,
            },
            seen_ids: HashSet::new(),
        }
    }

    fn push_raw(&mut self, normalizer: &RecordNormalizer, ordinal: usize, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => self.push_line(normalizer, ordinal, line),
            Err(err) => self.skip(ordinal, format!("line is not valid UTF-8: {err}")),
        }
    }

    fn push_line(&mut self, normalizer: &RecordNormalizer, ordinal: usize, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match normalizer.normalize_line(line, ordinal) {
            Ok(record) => {
                // ids are compared by text so exported rows stay unambiguous
                if !self.seen_ids.insert(record.id.as_text()) {
                    self.skip(ordinal, format!("duplicate id '{}'", record.id));
                    return;
                }
                self.source.records.push(record);
            }
            Err(err) => self.skip(ordinal, err.to_string()),
        }
    }

    fn skip(&mut self, line: usize, reason: LogMessage) {
        debug!(
            "[mos:source] source='{}' line {} skipped: {}",
            self.source.name, line, reason
        );
        self.source.skipped.push(SkippedLine { line, reason });
    }

    fn finish(self) -> LoadedSource {
        let source = self.source;
        if !source.skipped.is_empty() {
            warn!(
                "[mos:source] source='{}' skipped {} line(s)",
                source.name,
                source.skipped.len()
            );
        }
        info!(
            "[mos:source] loaded source='{}' records={}",
            source.name,
            source.records.len()
        );
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RecordId;

    #[test]
    fn skips_malformed_and_blank_lines_and_continues() {
        let text = "{\"id\": 1, \"video\": \"a.mp4\", \"answer\": \"x\"}\n\
                    not json at all\n\
                    \n\
                    [1, 2]\n\
                    {\"video\": \"b.mp4\", \"caption\": \"y\"}\n";
        let loaded = JsonlLoader::default().load_str("mixed.jsonl", text);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.records[0].id, RecordId::Supplied("1".into()));
        assert_eq!(loaded.records[1].id, RecordId::Ordinal(4));
        let skipped: Vec<usize> = loaded.skipped.iter().map(|s| s.line).collect();
        assert_eq!(skipped, vec![1, 3]);
    }

    #[test]
    fn later_duplicate_ids_are_skipped() {
        let text = "{\"id\": \"k\", \"answer\": \"first\"}\n{\"id\": \"k\", \"answer\": \"second\"}\n";
        let loaded = JsonlLoader::default().load_str("dupes.jsonl", text);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records[0].answer.as_deref(), Some("first"));
        assert!(loaded.skipped[0].reason.contains("duplicate id"));
    }

    #[test]
    fn ordinal_id_colliding_with_supplied_id_is_skipped() {
        let text = "{\"id\": \"1\"}\n{\"answer\": \"no id\"}\n";
        let loaded = JsonlLoader::default().load_str("collide.jsonl", text);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.skipped.len(), 1);
    }

    #[test]
    fn load_reader_matches_load_str() {
        let text = "{\"idx\": 3, \"question\": \"q\"}\n{\"prompt\": \"p\"}\n";
        let loader = JsonlLoader::default();
        let from_reader = loader.load_reader("r.jsonl", text.as_bytes()).unwrap();
        let from_str = loader.load_str("r.jsonl", text);
        assert_eq!(from_reader.records, from_str.records);
    }

    #[test]
    fn invalid_utf8_line_is_skipped_without_dropping_neighbours() {
        let mut bytes = b"{\"id\": 1, \"answer\": \"ok\"}\r\n".to_vec();
        bytes.extend_from_slice(b"{\"answer\": \"\xff\xfe\"}\n");
        bytes.extend_from_slice(b"{\"answer\": \"third\"}\n");
        let loader = JsonlLoader::default();

        let from_reader = loader.load_reader("bytes.jsonl", bytes.as_slice()).unwrap();
        let from_bytes = loader.load_bytes("bytes.jsonl", &bytes);
        for loaded in [&from_reader, &from_bytes] {
            assert_eq!(loaded.len(), 2);
            assert_eq!(loaded.records[0].answer.as_deref(), Some("ok"));
            assert_eq!(loaded.records[1].id, RecordId::Ordinal(2));
            assert_eq!(loaded.skipped.len(), 1);
            assert_eq!(loaded.skipped[0].line, 1);
            assert!(loaded.skipped[0].reason.contains("UTF-8"));
        }
    }
}
