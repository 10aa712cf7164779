//! Stable device identity.
//!
//! Every device carries one opaque UUID, generated on first run and persisted
//! so it survives restarts. The backend uses it to recognize a returning
//! device when re-establishing a table session.

use cart_storage::{CredentialsManager, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Error type for device identity operations.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted value is not a UUID
    #[error("Invalid persisted device id: {0}")]
    InvalidPersisted(String),
}

/// Result type alias using IdentityError.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// An opaque, stable device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Load the persisted device ID, or generate and persist a fresh one.
    pub fn load_or_generate(credentials: &CredentialsManager) -> IdentityResult<Self> {
        if let Some(raw) = credentials.get_device_id()? {
            let id = Uuid::parse_str(&raw).map_err(|_| IdentityError::InvalidPersisted(raw))?;
            debug!(device_id = %id, "Loaded persisted device id");
            return Ok(Self(id));
        }

        let id = Uuid::new_v4();
        credentials.set_device_id(&id.to_string())?;
        info!(device_id = %id, "Generated new device id");
        Ok(Self(id))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_storage::MemoryStorage;

    fn manager() -> CredentialsManager {
        CredentialsManager::new(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_generates_and_persists() {
        let m = manager();
        let id = DeviceId::load_or_generate(&m).unwrap();

        assert_eq!(m.get_device_id().unwrap(), Some(id.to_string()));
    }

    #[test]
    fn test_stable_across_loads() {
        let m = manager();
        let first = DeviceId::load_or_generate(&m).unwrap();
        let second = DeviceId::load_or_generate(&m).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_corrupt_persisted_value() {
        let m = manager();
        m.set_device_id("not-a-uuid").unwrap();

        let result = DeviceId::load_or_generate(&m);
        assert!(matches!(result, Err(IdentityError::InvalidPersisted(_))));
    }

    #[test]
    fn test_serde_transparent() {
        let m = manager();
        let id = DeviceId::load_or_generate(&m).unwrap();

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
