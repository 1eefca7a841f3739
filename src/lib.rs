pub mod config;
pub mod error;
pub mod error_codes;
pub mod logging;
pub mod path_validation;
pub mod results;
pub mod store;
pub mod sync_engine;


use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use config::AppConfig;
use error::{Result, SyncError};
use logging::LogManager;
use path_validation::PathValidator;
use results::ResultAggregator;
use store::{DefinitionStore, ListStore, YamlListStore};
use sync_engine::{FileSystem, LocalFileSystem, SyncConfiguration, SyncEngine, SyncResult};

/// Where the user is in the describe → configure → run → review flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SyncStep {
    Description,
    Configuration,
    Run,
    Results,
}

/// Caller-facing API tying the store, the engine and the latest outcome together.
pub struct SyncService<P, F> {
    store: DefinitionStore<P>,
    engine: SyncEngine<F>,
    results: ResultAggregator,
    log_manager: Arc<LogManager>,
    step: Mutex<SyncStep>,
}

impl SyncService<YamlListStore, LocalFileSystem> {
    /// Service persisting to `config.store_dir` and syncing the local disk.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_parts(
            DefinitionStore::with_validator(
                YamlListStore::new(&config.store_dir),
                config.path_validator(),
            ),
            LocalFileSystem::new(),
            Arc::new(LogManager::new(config.max_log_lines)),
        )
    }
}

impl<P: ListStore, F: FileSystem> SyncService<P, F> {
    pub fn new(backend: P, fs: F) -> Self {
        Self::with_parts(
            DefinitionStore::with_validator(backend, PathValidator::default()),
            fs,
            Arc::new(LogManager::default()),
        )
    }

    pub fn with_parts(store: DefinitionStore<P>, fs: F, log_manager: Arc<LogManager>) -> Self {
        Self {
            store,
            engine: SyncEngine::new(fs),
            results: ResultAggregator::new(),
            log_manager,
            step: Mutex::new(SyncStep::Description),
        }
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log_manager
    }

    pub fn step(&self) -> SyncStep {
        *self.step.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_step(&self, step: SyncStep) {
        *self.step.lock().unwrap_or_else(PoisonError::into_inner) = step;
    }

    pub fn begin_configuration(&self) {
        self.set_step(SyncStep::Configuration);
    }

    /// Validate, normalize and persist `raw`, replacing the stored list.
    pub fn save_configuration(&self, raw: &SyncConfiguration) -> Result<usize> {
        self.set_step(SyncStep::Configuration);

        match self.store.save(raw) {
            Ok(kept) => {
                let dropped = raw.len() - kept;
                if dropped > 0 {
                    self.log_manager.warning(
                        &format!("Dropped {dropped} definition(s) with malformed paths"),
                        None,
                    );
                }
                self.log_manager
                    .info(&format!("Saved {kept} sync definition(s)"), None);
                Ok(kept)
            }
            Err(err) => {
                self.log_manager
                    .error(&format!("Configuration not saved: {err}"), None);
                Err(err)
            }
        }
    }

    pub fn load_configuration(&self) -> Result<SyncConfiguration> {
        self.store.load()
    }

    /// Run `configuration`, calling `sink` once per copy or delete.
    ///
    /// Results are published only when the whole run completes.
    pub async fn run<S>(
        &self,
        configuration: &SyncConfiguration,
        mut sink: S,
    ) -> Result<Vec<SyncResult>>
    where
        S: FnMut(&str),
    {
        self.set_step(SyncStep::Run);
        self.log_manager.info(
            &format!("Sync started for {} definition(s)", configuration.len()),
            None,
        );

        let outcome = self
            .engine
            .run(configuration, |event| {
                let line = event.to_string();
                self.log_manager.info(&line, None);
                sink(&line);
            })
            .await;

        match outcome {
            Ok(results) => {
                for result in &results {
                    self.log_manager
                        .info(&result.message, Some(&result.source_directory));
                }
                self.results.publish(results.clone());
                self.set_step(SyncStep::Results);
                Ok(results)
            }
            Err(err) => {
                self.log_manager.error(&format!("Sync aborted: {err}"), None);
                self.set_step(SyncStep::Configuration);
                Err(err)
            }
        }
    }

    /// Run whatever is currently persisted.
    pub async fn run_saved<S>(&self, sink: S) -> Result<Vec<SyncResult>>
    where
        S: FnMut(&str),
    {
        let configuration = self.load_configuration()?;
        self.run(&configuration, sink).await
    }

    /// Results of the last completed run.
    pub fn last_results(&self) -> Arc<Vec<SyncResult>> {
        self.results.snapshot()
    }

    /// Actions taken by the last completed run, across all pairs.
    pub fn last_total_synced(&self) -> usize {
        self.results.total_synced()
    }
}

impl<P, F> SyncService<P, F>
where
    P: ListStore + 'static,
    F: FileSystem + Send + Sync + 'static,
{
    /// Run as a spawned task, resolving once every pair is done.
    pub async fn run_in_background<S>(
        self: Arc<Self>,
        configuration: SyncConfiguration,
        sink: S,
    ) -> Result<Vec<SyncResult>>
    where
        S: FnMut(&str) + Send + 'static,
    {
        tokio::spawn(async move { self.run(&configuration, sink).await })
            .await
            .map_err(|e| SyncError::Worker(e.to_string()))?
    }
}
