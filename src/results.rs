use std::sync::{Arc, PoisonError, RwLock};

use crate::sync_engine::types::SyncResult;

/// Ordered results of the most recent completed run.
///
/// Empty until the first run publishes; each publish replaces the whole list.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    latest: RwLock<Arc<Vec<SyncResult>>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, results: Vec<SyncResult>) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Arc::new(results);
    }

    pub fn snapshot(&self) -> Arc<Vec<SyncResult>> {
        Arc::clone(&self.latest.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn total_synced(&self) -> usize {
        self.snapshot().iter().map(|r| r.synced_count).sum()
    }
}
