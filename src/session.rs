//! Labeling session: the explicitly owned per-rater browsing context.
//!
//! A session is opened over one loaded source and is mutated only by
//! navigation, rater changes, scoring, and resume. Scores live in the
//! session's own table until exported.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::LabelerConfig;
use crate::data::{CanonicalRecord, MosScore, RecordId, ScoreEntry};
use crate::errors::LabelerError;
use crate::mapping::MappingTable;
use crate::metrics::{SessionProgress, session_progress};
use crate::resolver::{Resolution, VideoResolver};
use crate::scores::{ScoreTable, export_file_name};
use crate::source::LoadedSource;
use crate::types::RaterName;
use crate::utils::normalize_inline_whitespace;

/// Everything needed to render the current item.
#[derive(Clone, Debug)]
pub struct ItemView<'a> {
    /// 1-based position of the item.
    pub position: usize,
    /// Number of loaded records.
    pub total: usize,
    /// Record at `position`.
    pub record: &'a CanonicalRecord,
    /// Playable reference or the reason there is none.
    pub resolution: Resolution,
    /// Stored score for (record, rater), or the default when unscored.
    pub score: MosScore,
    /// True when `score` was stored by this rater.
    pub scored: bool,
}

/// Sequential labeling session over one loaded source.
pub struct LabelingSession {
    source: LoadedSource,
    index: usize,
    rater: RaterName,
    default_rater: RaterName,
    default_score: MosScore,
    scores: ScoreTable,
    mapping: Option<MappingTable>,
    resolver: VideoResolver,
}

impl LabelingSession {
    /// Open a session at the first record.
    ///
    /// A source without records is unavailable; a default score outside 1-5
    /// is a configuration error.
    pub fn open(source: LoadedSource, config: &LabelerConfig) -> Result<Self, LabelerError> {
        if source.is_empty() {
            return Err(LabelerError::SourceUnavailable {
                source_name: source.name.clone(),
                reason: "source has no records".to_string(),
            });
        }
        let default_score = MosScore::new(config.default_score as i64).map_err(|_| {
            LabelerError::Configuration(format!(
                "default score {} is outside the 1-5 range",
                config.default_score
            ))
        })?;
        let mut resolver = VideoResolver::new().with_converted_marker(&config.converted_marker);
        if let Some(root) = &config.video_root {
            resolver = resolver.with_local_root(root);
        }
        let default_rater = normalize_inline_whitespace(&config.default_rater);
        info!(
            "[mos:session] opened source='{}' records={}",
            source.name,
            source.len()
        );
        Ok(Self {
            source,
            index: 0,
            rater: default_rater.clone(),
            default_rater,
            default_score,
            scores: ScoreTable::new(),
            mapping: None,
            resolver,
        })
    }

    /// Attach a mapping table.
    pub fn with_mapping(mut self, mapping: MappingTable) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Replace or clear the mapping table.
    pub fn set_mapping(&mut self, mapping: Option<MappingTable>) {
        self.mapping = mapping;
    }

    /// Attached mapping table, if any.
    pub fn mapping(&self) -> Option<&MappingTable> {
        self.mapping.as_ref()
    }

    /// Set the rater; blank names fall back to the default placeholder.
    pub fn set_rater(&mut self, name: &str) {
        let name = normalize_inline_whitespace(name);
        self.rater = if name.is_empty() {
            self.default_rater.clone()
        } else {
            name
        };
        debug!("[mos:session] rater set to '{}'", self.rater);
    }

    /// Current rater name.
    pub fn rater(&self) -> &str {
        &self.rater
    }

    /// Source the session was opened over.
    pub fn source(&self) -> &LoadedSource {
        &self.source
    }

    /// Scores of every rater in this session.
    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Always false: sessions are only opened over non-empty sources.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Zero-based index of the current item.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next item, staying on the last one.
    pub fn next_item(&mut self) -> usize {
        self.goto(self.index.saturating_add(1))
    }

    /// Move to the previous item, staying on the first one.
    pub fn prev_item(&mut self) -> usize {
        self.goto(self.index.saturating_sub(1))
    }

    /// Jump to a zero-based index, clamped to the loaded range.
    pub fn goto(&mut self, index: usize) -> usize {
        self.index = index.min(self.len() - 1);
        self.index
    }

    /// Record at the current index.
    pub fn current(&self) -> &CanonicalRecord {
        &self.source.records[self.index]
    }

    /// Stored score for the current item, or the default.
    pub fn current_score(&self) -> MosScore {
        self.scores
            .get(&self.current().id, &self.rater)
            .map(|entry| entry.score)
            .unwrap_or(self.default_score)
    }

    /// Resolve and describe the current item.
    pub fn view(&self) -> ItemView<'_> {
        let record = self.current();
        let stored = self.scores.get(&record.id, &self.rater);
        ItemView {
            position: self.index + 1,
            total: self.len(),
            record,
            resolution: self
                .resolver
                .resolve(record.video_ref.as_deref(), self.mapping.as_ref()),
            score: stored.map(|entry| entry.score).unwrap_or(self.default_score),
            scored: stored.is_some(),
        }
    }

    /// Store `value` for (current record, rater), replacing any earlier score.
    pub fn score_current(&mut self, value: i64) -> Result<&ScoreEntry, LabelerError> {
        let score = MosScore::new(value)?;
        let record = &self.source.records[self.index];
        let video = record.video_file_name().unwrap_or_default();
        debug!(
            "[mos:session] score id={} rater='{}' score={}",
            record.id, self.rater, score
        );
        Ok(self
            .scores
            .upsert(record.id.clone(), &self.rater, score, video))
    }

    /// Current rater's progress over the source.
    pub fn progress(&self) -> SessionProgress {
        session_progress(&self.source.records, &self.scores, &self.rater)
    }

    /// Export file name for the current rater.
    pub fn export_file_name(&self) -> String {
        export_file_name(&self.source.name, &self.rater)
    }

    /// Write the current rater's scores as CSV. Returns the row count.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, LabelerError> {
        self.scores.write_csv(&self.rater, writer)
    }

    /// Write the current rater's export file into `dir`.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, LabelerError> {
        let path = self
            .scores
            .export_to(dir, &self.export_file_name(), &self.rater)?;
        debug!(
            "[mos:session] exported rater='{}' to {}",
            self.rater,
            path.display()
        );
        Ok(path)
    }

    /// Restore the current rater's export from `dir` when it exists.
    ///
    /// Returns the file read and the number of rows restored, or `None` when
    /// the rater has no export yet.
    pub fn resume_from_dir(&mut self, dir: &Path) -> Result<Option<(PathBuf, usize)>, LabelerError> {
        let path = dir.join(self.export_file_name());
        if !path.is_file() {
            return Ok(None);
        }
        let restored = self.resume_from(File::open(&path)?)?;
        info!(
            "[mos:session] resumed {} score(s) for rater='{}' from {}",
            restored,
            self.rater,
            path.display()
        );
        Ok(Some((path, restored)))
    }

    /// Restore scores from an earlier export.
    ///
    /// Rows are matched to loaded records by id text; rows without a rater
    /// column are attributed to the current rater. Returns the number of rows
    /// restored.
    pub fn resume_from<R: Read>(&mut self, reader: R) -> Result<usize, LabelerError> {
        let rows = ScoreTable::read_rows(reader)?;
        let ids: HashMap<String, RecordId> = self
            .source
            .records
            .iter()
            .map(|record| (record.id.as_text(), record.id.clone()))
            .collect();
        let mut restored = 0usize;
        for row in rows {
            let Some(record_id) = ids.get(&row.id) else {
                warn!(
                    "[mos:session] resume skipped id='{}' not present in source='{}'",
                    row.id, self.source.name
                );
                continue;
            };
            self.scores.restore(ScoreEntry {
                record_id: record_id.clone(),
                rater: row.rater.unwrap_or_else(|| self.rater.clone()),
                score: row.score,
                video: row.video,
                updated_at: row.updated_at.unwrap_or_else(Utc::now),
            });
            restored += 1;
        }
        Ok(restored)
    }
}
