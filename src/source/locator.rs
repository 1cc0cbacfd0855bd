use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::{info, warn};

use super::{JsonlLoader, LoadedSource, SourceCatalog};
use crate::constants::source::DEFAULT_UPLOAD_NAME;
use crate::errors::LabelerError;
use crate::transport::fs::{display_name, file_mtime};
use crate::types::{LogMessage, SourceName};

/// One way of obtaining JSON-lines content.
pub enum SourceMode {
    /// List a catalog and fetch `selection`, or the first listed entry.
    Catalog {
        /// Catalog to list and fetch from.
        catalog: Box<dyn SourceCatalog>,
        /// Entry to load; `None` takes the first listed.
        selection: Option<SourceName>,
    },
    /// Read a file path directly.
    File(PathBuf),
    /// Bytes supplied by the user, with an optional display name.
    Upload {
        /// Display name; defaults to `upload.jsonl`.
        name: Option<SourceName>,
        /// Raw JSON-lines payload.
        bytes: Vec<u8>,
    },
}

impl SourceMode {
    /// Catalog mode selecting the first listed entry.
    pub fn catalog(catalog: impl SourceCatalog + 'static) -> Self {
        SourceMode::Catalog {
            catalog: Box::new(catalog),
            selection: None,
        }
    }

    /// Catalog mode selecting `name`.
    pub fn catalog_entry(catalog: impl SourceCatalog + 'static, name: impl Into<SourceName>) -> Self {
        SourceMode::Catalog {
            catalog: Box::new(catalog),
            selection: Some(name.into()),
        }
    }

    /// Short label used in logs and guidance.
    pub fn label(&self) -> String {
        match self {
            SourceMode::Catalog { catalog, .. } => format!("catalog '{}'", catalog.id()),
            SourceMode::File(path) => format!("file '{}'", path.display()),
            SourceMode::Upload { name, .. } => format!(
                "upload '{}'",
                name.as_deref().unwrap_or(DEFAULT_UPLOAD_NAME)
            ),
        }
    }
}

/// Tries input modes in order and returns the first that yields records.
#[derive(Default)]
pub struct SourceLocator {
    loader: JsonlLoader,
    modes: Vec<SourceMode>,
}

impl SourceLocator {
    /// Locator with no modes, decoding through `loader`.
    pub fn new(loader: JsonlLoader) -> Self {
        Self {
            loader,
            modes: Vec::new(),
        }
    }

    /// Append a fallback mode.
    pub fn with_mode(mut self, mode: SourceMode) -> Self {
        self.modes.push(mode);
        self
    }

    /// Configured modes in fallback order.
    pub fn modes(&self) -> &[SourceMode] {
        &self.modes
    }

    /// First mode that yields at least one record.
    ///
    /// When every mode fails, the error lists each mode's reason followed by
    /// guidance on the remaining ways to supply a source.
    pub fn locate(&self) -> Result<LoadedSource, LabelerError> {
        let mut failures = Vec::new();
        for mode in &self.modes {
            match self.load_mode(mode) {
                Ok(source) if !source.is_empty() => {
                    info!(
                        "[mos:locator] using {} -> source='{}'",
                        mode.label(),
                        source.name
                    );
                    return Ok(source);
                }
                Ok(source) => {
                    let reason = format!(
                        "no parseable records ({} line(s) skipped)",
                        source.skipped.len()
                    );
                    warn!("[mos:locator] {} unusable: {}", mode.label(), reason);
                    failures.push(format!("{}: {}", mode.label(), reason));
                }
                Err(reason) => {
                    warn!("[mos:locator] {} unavailable: {}", mode.label(), reason);
                    failures.push(format!("{}: {}", mode.label(), reason));
                }
            }
        }
        let reason = if failures.is_empty() {
            "no input mode configured".to_string()
        } else {
            failures.join("; ")
        };
        Err(LabelerError::SourceUnavailable {
            source_name: "<none>".to_string(),
            reason: format!(
                "{reason}. Select a .jsonl file from the results directory, pass a direct file path, or upload a JSON-lines file"
            ),
        })
    }

    /// Load one mode; failures come back as a plain reason for the summary.
    fn load_mode(&self, mode: &SourceMode) -> Result<LoadedSource, LogMessage> {
        match mode {
            SourceMode::Catalog { catalog, selection } => {
                let listed = catalog.list().map_err(|err| err.to_string())?;
                let name = match selection {
                    Some(name) if listed.contains(name) => name.clone(),
                    Some(name) => return Err(format!("'{name}' is not listed")),
                    None => listed
                        .into_iter()
                        .next()
                        .ok_or_else(|| "catalog lists no .jsonl sources".to_string())?,
                };
                let bytes = catalog.fetch(&name).map_err(|err| err.to_string())?;
                let mut source = self.loader.load_bytes(name.as_str(), &bytes);
                source.modified_at = catalog
                    .local_path(&name)
                    .and_then(|path| file_mtime(&path));
                Ok(source)
            }
            SourceMode::File(path) => {
                let file = File::open(path).map_err(|err| err.to_string())?;
                let mut source = self
                    .loader
                    .load_reader(display_name(path), BufReader::new(file))
                    .map_err(|err| err.to_string())?;
                source.modified_at = file_mtime(path);
                Ok(source)
            }
            SourceMode::Upload { name, bytes } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
                Ok(self.loader.load_bytes(name, bytes))
            }
        }
    }
}
