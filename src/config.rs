use std::path::PathBuf;

use crate::constants::{aliases, resolver, session, source};
use crate::types::AliasKey;

/// Ordered key aliases probed for each canonical record field.
///
/// The first key present (and not `null`) in a JSON object wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasTable {
    /// Keys probed for the record id.
    pub id: Vec<AliasKey>,
    /// Keys probed for the video reference.
    pub video: Vec<AliasKey>,
    /// Keys probed for the prompt.
    pub prompt: Vec<AliasKey>,
    /// Keys probed for the answer.
    pub answer: Vec<AliasKey>,
}

fn owned(keys: &[&str]) -> Vec<AliasKey> {
    keys.iter().map(|key| key.to_string()).collect()
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            id: owned(aliases::ID),
            video: owned(aliases::VIDEO),
            prompt: owned(aliases::PROMPT),
            answer: owned(aliases::ANSWER),
        }
    }
}

impl AliasTable {
    /// Append an extra answer alias probed after the defaults.
    pub fn with_answer_alias(mut self, key: impl Into<AliasKey>) -> Self {
        self.answer.push(key.into());
        self
    }

    /// Append an extra video alias probed after the defaults.
    pub fn with_video_alias(mut self, key: impl Into<AliasKey>) -> Self {
        self.video.push(key.into());
        self
    }
}

/// Top-level labeling configuration.
#[derive(Clone, Debug)]
pub struct LabelerConfig {
    /// Directory holding `*.jsonl` sources and score exports.
    pub results_dir: PathBuf,
    /// Optional directory probed for local video files after mapping lookup fails.
    pub video_root: Option<PathBuf>,
    /// Optional mapping table CSV (name -> url/file_id/type).
    pub mapping_csv: Option<PathBuf>,
    /// Key aliases used by the record normalizer.
    pub aliases: AliasTable,
    /// Marker inserted before the extension to name converted assets.
    pub converted_marker: String,
    /// Rater name used when the supplied one is blank.
    pub default_rater: String,
    /// Score shown for items not yet scored.
    pub default_score: u8,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(source::DEFAULT_RESULTS_DIR),
            video_root: None,
            mapping_csv: None,
            aliases: AliasTable::default(),
            converted_marker: resolver::CONVERTED_MARKER.to_string(),
            default_rater: session::DEFAULT_RATER.to_string(),
            default_score: session::DEFAULT_SCORE,
        }
    }
}

impl LabelerConfig {
    /// Create a config rooted at `results_dir` with default settings.
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            ..Self::default()
        }
    }

    /// Set the local video root.
    pub fn with_video_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.video_root = Some(root.into());
        self
    }

    /// Set the mapping table path.
    pub fn with_mapping_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.mapping_csv = Some(path.into());
        self
    }

    /// Override the normalizer aliases.
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Override the converted-asset marker.
    pub fn with_converted_marker(mut self, marker: impl Into<String>) -> Self {
        self.converted_marker = marker.into();
        self
    }
}
