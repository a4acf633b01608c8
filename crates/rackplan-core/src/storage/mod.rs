//! Storage abstraction for saved layouts.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::geometry::LayoutDocument;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Layout not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend that keeps layout documents by name.
pub trait Storage: Send + Sync {
    fn save(&self, id: &str, document: &LayoutDocument) -> StorageResult<()>;

    fn load(&self, id: &str) -> StorageResult<LayoutDocument>;

    /// Remove a layout. Missing layouts are not an error.
    fn delete(&self, id: &str) -> StorageResult<()>;

    /// Names of all stored layouts.
    fn list(&self) -> StorageResult<Vec<String>>;

    fn exists(&self, id: &str) -> StorageResult<bool>;
}
