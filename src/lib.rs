#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Labeling configuration and normalizer alias tables.
pub mod config;
/// Centralized constants used across normalization, resolution, and scoring.
pub mod constants;
/// Canonical record, score, and identifier types.
pub mod data;
/// Reusable CLI runners shared by the demo binaries.
pub mod example_apps;
/// Mapping tables from video filename to playable location.
pub mod mapping;
/// Rater progress metrics.
pub mod metrics;
/// JSON-lines record normalization by key aliasing.
pub mod normalize;
/// Video reference resolution against mapping tables.
pub mod resolver;
/// Score table, CSV export, and resume.
pub mod scores;
/// Sequential per-rater labeling sessions.
pub mod session;
/// JSON-lines sources, catalogs, and input-mode fallback.
pub mod source;
/// Input transports used by sources (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text and path helpers.
pub mod utils;

mod errors;

pub use config::{AliasTable, LabelerConfig};
pub use data::{CanonicalRecord, MosScore, RecordId, ScoreEntry};
pub use errors::LabelerError;
pub use mapping::{MappingEntry, MappingTable};
pub use metrics::SessionProgress;
pub use normalize::RecordNormalizer;
pub use resolver::{DriveLinks, Resolution, UnresolvedReason, VideoResolver};
pub use scores::ScoreTable;
pub use session::{ItemView, LabelingSession};
pub use source::{
    DirectoryCatalog, InMemoryCatalog, JsonlLoader, LoadedSource, SourceCatalog, SourceLocator,
    SourceMode,
};
pub use types::{DriveFileId, RaterName, SourceName, VideoFileName};
