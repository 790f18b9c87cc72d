//! Registry of known data model releases.

use crate::model::SchemaVersion;
use magic_protocol::{DataModelVersion, VersionError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors loading or registering data models.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid data model JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid data model version: {0}")]
    InvalidVersion(#[from] VersionError),

    #[error("Data model has no magic_version")]
    MissingVersion,

    #[error("Data model version {0} is registered twice")]
    DuplicateVersion(String),

    #[error("No data model files found in {0}")]
    EmptyDirectory(PathBuf),
}

/// All known data model releases, ordered by version.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    versions: BTreeMap<DataModelVersion, SchemaVersion>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`.
    ///
    /// A file without a `magic_version` key is registered under its file stem
    /// (`2.5.json` -> `2.5`).
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SchemaError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(SchemaError::EmptyDirectory(dir.to_path_buf()));
        }

        let mut registry = Self::new();
        for path in paths {
            let schema = load_file(&path)?;
            registry.insert(schema)?;
        }

        info!(
            dir = %dir.display(),
            versions = registry.len(),
            "loaded data models"
        );
        Ok(registry)
    }

    /// Register a release. The schema must carry its version.
    pub fn insert(&mut self, schema: SchemaVersion) -> Result<(), SchemaError> {
        let version = schema.version.clone().ok_or(SchemaError::MissingVersion)?;
        if self.versions.contains_key(&version) {
            return Err(SchemaError::DuplicateVersion(version.to_string()));
        }
        debug!(version = %version, tables = schema.tables.len(), "registered data model");
        self.versions.insert(version, schema);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_schema(mut self, schema: SchemaVersion) -> Result<Self, SchemaError> {
        self.insert(schema)?;
        Ok(self)
    }

    pub fn get(&self, version: &DataModelVersion) -> Option<&SchemaVersion> {
        self.versions.get(version)
    }

    /// The registered version equal to `tag`, as registered.
    pub fn resolve(&self, tag: &str) -> Option<&DataModelVersion> {
        let version = DataModelVersion::parse(tag).ok()?;
        self.versions.get_key_value(&version).map(|(k, _)| k)
    }

    pub fn contains(&self, version: &DataModelVersion) -> bool {
        self.versions.contains_key(version)
    }

    /// Registered versions, oldest first.
    pub fn versions(&self) -> impl Iterator<Item = &DataModelVersion> {
        self.versions.keys()
    }

    pub fn latest(&self) -> Option<&DataModelVersion> {
        self.versions.keys().next_back()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Versions strictly after `from` up to and including `to`, oldest first.
    pub fn steps(&self, from: &DataModelVersion, to: &DataModelVersion) -> Vec<&DataModelVersion> {
        self.versions
            .keys()
            .filter(|v| *v > from && *v <= to)
            .collect()
    }

    /// The release immediately before `version`.
    pub fn previous(&self, version: &DataModelVersion) -> Option<&DataModelVersion> {
        self.versions.range(..version).next_back().map(|(k, _)| k)
    }
}

/// Read one data model file.
pub fn load_file(path: &Path) -> Result<SchemaVersion, SchemaError> {
    let text = fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut schema: SchemaVersion =
        serde_json::from_str(&text).map_err(|source| SchemaError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if schema.version.is_none() {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        schema.version = Some(DataModelVersion::parse(&stem)?);
    }
    Ok(schema)
}
