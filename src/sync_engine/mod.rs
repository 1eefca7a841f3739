pub mod engine;
pub mod filesystem;
pub mod types;

pub use engine::SyncEngine;
pub use filesystem::{FileSystem, LocalFileSystem};
pub use types::{ProgressEvent, SyncConfiguration, SyncDefinition, SyncResult};
