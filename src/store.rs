//! Persisted sync definitions
//!
//! The store validates and normalizes every definition on the way in and
//! out, and replaces the persisted list as a whole. Persistence itself is
//! delegated to a [`ListStore`] keyed by table name.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::path_validation::PathValidator;
use crate::sync_engine::types::{SyncConfiguration, SyncDefinition};

/// Table holding the definition list
pub const SYNC_DEFINITIONS_TABLE: &str = "sync_definitions";

/// Whole-list persistence keyed by a logical table name.
pub trait ListStore: Send + Sync {
    /// Missing tables read as an empty list.
    fn read_list<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>>;

    fn write_list<T: Serialize>(&self, table: &str, items: &[T]) -> Result<()>;
}

/// Keeps lists in memory as JSON values.
#[derive(Debug, Default)]
pub struct MemoryListStore {
    tables: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListStore for MemoryListStore {
    fn read_list<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        match tables.get(table) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| SyncError::storage(table, e)),
            None => Ok(Vec::new()),
        }
    }

    fn write_list<T: Serialize>(&self, table: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_value(items).map_err(|e| SyncError::storage(table, e))?;
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_string(), value);
        Ok(())
    }
}

/// One `<table>.yaml` file per table inside a directory.
#[derive(Debug, Clone)]
pub struct YamlListStore {
    dir: PathBuf,
}

impl YamlListStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.yaml"))
    }
}

impl ListStore for YamlListStore {
    fn read_list<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_yaml::from_str(&content).map_err(|e| SyncError::storage(table, e))
    }

    fn write_list<T: Serialize>(&self, table: &str, items: &[T]) -> Result<()> {
        let path = self.table_path(table);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(items).map_err(|e| SyncError::storage(table, e))?;
        std::fs::write(&path, yaml)?;
        Ok(())
    }
}

/// Validated, normalized definition list on top of a [`ListStore`].
pub struct DefinitionStore<P> {
    backend: P,
    validator: PathValidator,
    lock: Mutex<()>,
}

impl<P: ListStore> DefinitionStore<P> {
    pub fn new(backend: P) -> Self {
        Self::with_validator(backend, PathValidator::default())
    }

    pub fn with_validator(backend: P, validator: PathValidator) -> Self {
        Self {
            backend,
            validator,
            lock: Mutex::new(()),
        }
    }

    /// Replace the persisted list with the valid subset of `raw`.
    ///
    /// A missing definition or path fails the whole save and persists
    /// nothing. Malformed paths only drop their own definition. Returns how
    /// many definitions were kept.
    pub fn save(&self, raw: &SyncConfiguration) -> Result<usize> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut kept = Vec::with_capacity(raw.len());
        for (index, slot) in raw.definitions.iter().enumerate() {
            let definition = slot
                .as_ref()
                .ok_or(SyncError::MissingDefinition { index })?;
            if let Some(definition) = self.accept(definition)? {
                kept.push(definition);
            }
        }

        self.backend.write_list(SYNC_DEFINITIONS_TABLE, &kept)?;
        Ok(kept.len())
    }

    /// Snapshot of the persisted list.
    pub fn load(&self) -> Result<SyncConfiguration> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let stored: Vec<SyncDefinition> = self.backend.read_list(SYNC_DEFINITIONS_TABLE)?;
        let mut definitions = Vec::with_capacity(stored.len());
        for definition in &stored {
            // Whatever made it to disk gets the same filter, but softly.
            if let Ok(Some(definition)) = self.accept(definition) {
                definitions.push(definition);
            }
        }
        Ok(definitions.into())
    }

    /// Normalized copy of `definition`, or `None` if a path is malformed.
    fn accept(&self, definition: &SyncDefinition) -> Result<Option<SyncDefinition>> {
        let source = definition.source_directory.as_deref();
        let destination = definition.destination_directory.as_deref();

        let source_valid = self.validator.validate(source)?;
        let destination_valid = self.validator.validate(destination)?;
        if !source_valid || !destination_valid {
            return Ok(None);
        }

        Ok(Some(SyncDefinition {
            source_directory: source.map(|s| self.validator.normalize(s)),
            destination_directory: destination.map(|d| self.validator.normalize(d)),
            include_sub_folders: definition.include_sub_folders,
            delete_assets_not_in_source: definition.delete_assets_not_in_source,
        }))
    }
}
