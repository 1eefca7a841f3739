use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One configured directory pair.
///
/// A `None` path models a path that was never supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncDefinition {
    pub source_directory: Option<String>,
    pub destination_directory: Option<String>,
    #[serde(default)]
    pub include_sub_folders: bool,
    #[serde(default)]
    pub delete_assets_not_in_source: bool,
}

impl SyncDefinition {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source_directory: Some(source.into()),
            destination_directory: Some(destination.into()),
            include_sub_folders: false,
            delete_assets_not_in_source: false,
        }
    }

    pub fn include_sub_folders(mut self, include: bool) -> Self {
        self.include_sub_folders = include;
        self
    }

    pub fn delete_assets_not_in_source(mut self, delete: bool) -> Self {
        self.delete_assets_not_in_source = delete;
        self
    }

    /// Definition for the sub-directory `name` of both ends, inheriting flags.
    pub(crate) fn child(&self, source: &str, destination: &str, name: &str) -> Self {
        Self {
            source_directory: Some(join(source, name)),
            destination_directory: Some(join(destination, name)),
            include_sub_folders: self.include_sub_folders,
            delete_assets_not_in_source: self.delete_assets_not_in_source,
        }
    }
}

fn join(dir: &str, name: &str) -> String {
    PathBuf::from(dir).join(name).to_string_lossy().into_owned()
}

/// Ordered definition slots. An empty slot is a hole in the list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SyncConfiguration {
    pub definitions: Vec<Option<SyncDefinition>>,
}

impl SyncConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, definition: SyncDefinition) {
        self.definitions.push(Some(definition));
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions that are actually present, skipping holes.
    pub fn iter(&self) -> impl Iterator<Item = &SyncDefinition> {
        self.definitions.iter().flatten()
    }
}

impl FromIterator<SyncDefinition> for SyncConfiguration {
    fn from_iter<I: IntoIterator<Item = SyncDefinition>>(iter: I) -> Self {
        Self {
            definitions: iter.into_iter().map(Some).collect(),
        }
    }
}

impl From<Vec<SyncDefinition>> for SyncConfiguration {
    fn from(definitions: Vec<SyncDefinition>) -> Self {
        definitions.into_iter().collect()
    }
}

/// Outcome for one evaluated (source, destination) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub source_directory: String,
    pub destination_directory: String,
    /// Copies plus deletions
    pub synced_count: usize,
    pub message: String,
}

impl SyncResult {
    pub(crate) fn source_not_found(source: &str, destination: &str) -> Self {
        Self {
            source_directory: source.to_string(),
            destination_directory: destination.to_string(),
            synced_count: 0,
            message: format!("Source directory '{source}' not found."),
        }
    }

    pub(crate) fn completed(source: &str, destination: &str, synced_count: usize) -> Self {
        let message = match synced_count {
            0 => format!("No images synced from '{source}' to '{destination}'."),
            1 => format!("1 image synced from '{source}' to '{destination}'."),
            n => format!("{n} images synced from '{source}' to '{destination}'."),
        };
        Self {
            source_directory: source.to_string(),
            destination_directory: destination.to_string(),
            synced_count,
            message,
        }
    }

    pub(crate) fn failed(
        source: &str,
        destination: &str,
        synced_count: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_directory: source.to_string(),
            destination_directory: destination.to_string(),
            synced_count,
            message: message.into(),
        }
    }
}

/// A single copy or delete action, reported as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Copied { source: PathBuf, destination: PathBuf },
    Deleted { path: PathBuf },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied {
                source,
                destination,
            } => write!(f, "'{}' => '{}'", source.display(), destination.display()),
            Self::Deleted { path } => write!(f, "Deleted '{}'", path.display()),
        }
    }
}
