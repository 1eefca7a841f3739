//! Error types for the synchronization engine

use crate::error_codes::{
    ERR_IO, ERR_MISSING_DEFINITION, ERR_NULL_ARGUMENT, ERR_STORAGE, ERR_WORKER,
};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Caller passed a null value where one is required.
    #[error("Value cannot be null. (Parameter '{0}')")]
    NullArgument(&'static str),

    /// The configuration contains an empty slot instead of a definition.
    #[error("Object reference not set: sync definition at index {index} is missing")]
    MissingDefinition { index: usize },

    #[error("Storage error for table '{table}': {message}")]
    Storage { table: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background worker running a sync panicked or was cancelled.
    #[error("Sync worker failed: {0}")]
    Worker(String),
}

impl SyncError {
    pub fn storage(table: impl Into<String>, message: impl ToString) -> Self {
        Self::Storage {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Stable code for front-end localization.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NullArgument(_) => ERR_NULL_ARGUMENT,
            Self::MissingDefinition { .. } => ERR_MISSING_DEFINITION,
            Self::Storage { .. } => ERR_STORAGE,
            Self::Io(_) => ERR_IO,
            Self::Worker(_) => ERR_WORKER,
        }
    }

    /// Caller errors abort the whole operation; everything else is data or
    /// environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::NullArgument(_) | Self::MissingDefinition { .. })
    }
}
