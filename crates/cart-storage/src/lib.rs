//! Durable credential storage for the cart client.
//!
//! This crate provides:
//! - A `CredentialStorage` trait for key/value credential backends
//! - A file-backed implementation with atomic writes
//! - An in-memory implementation for tests
//! - A typed `CredentialsManager` over any backend

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{CredentialsManager, StoredCredentials};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::CredentialStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Key not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Encoding(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
