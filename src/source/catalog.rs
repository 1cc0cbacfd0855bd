use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::errors::LabelerError;
use crate::transport::fs::{JsonlDirectory, display_name};
use crate::types::SourceName;

/// Listing + raw fetch surface for named JSON-lines sources.
///
/// Implementations may be local (directory, memory) or remote (a hosting
/// platform's list API). Names returned by `list` must be accepted by `fetch`.
pub trait SourceCatalog {
    /// Stable catalog identifier used in logs and guidance messages.
    fn id(&self) -> &str;
    /// Source names in display order.
    fn list(&self) -> Result<Vec<SourceName>, LabelerError>;
    /// Raw content for `name`; decoding happens line by line in the loader.
    fn fetch(&self, name: &str) -> Result<Vec<u8>, LabelerError>;
    /// Local path backing `name`, when there is one.
    fn local_path(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Catalog over `*.jsonl` files directly under a directory.
pub struct DirectoryCatalog {
    id: String,
    directory: JsonlDirectory,
}

impl DirectoryCatalog {
    /// Catalog listing `*.jsonl` files directly under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let directory = JsonlDirectory::new(root);
        Self {
            id: format!("dir:{}", directory.root().display()),
            directory,
        }
    }

    /// Root directory listed by this catalog.
    pub fn root(&self) -> &Path {
        self.directory.root()
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, LabelerError> {
        if name.contains(['/', '\\']) || name == ".." {
            return Err(LabelerError::Configuration(format!(
                "catalog entry '{name}' must be a bare file name"
            )));
        }
        Ok(self.directory.root().join(name))
    }
}

impl SourceCatalog for DirectoryCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    fn list(&self) -> Result<Vec<SourceName>, LabelerError> {
        Ok(self
            .directory
            .list()?
            .iter()
            .map(|path| display_name(path))
            .collect())
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, LabelerError> {
        let path = self.path_for(name)?;
        Ok(fs::read(path)?)
    }

    fn local_path(&self, name: &str) -> Option<PathBuf> {
        self.path_for(name).ok()
    }
}

/// In-memory catalog, listed in insertion order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    id: String,
    entries: IndexMap<SourceName, Vec<u8>>,
}

impl InMemoryCatalog {
    /// Empty catalog identified as `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: IndexMap::new(),
        }
    }

    /// Add or replace an entry.
    pub fn with_entry(mut self, name: impl Into<SourceName>, content: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(name.into(), content.into());
        self
    }
}

impl SourceCatalog for InMemoryCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    fn list(&self) -> Result<Vec<SourceName>, LabelerError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, LabelerError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| LabelerError::SourceUnavailable {
                source_name: name.to_string(),
                reason: format!("not listed in catalog '{}'", self.id),
            })
    }
}
