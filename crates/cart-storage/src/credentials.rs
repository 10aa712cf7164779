//! High-level API for persisted credentials.

use crate::{CredentialStorage, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};

/// Session credentials persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCredentials {
    /// Session public ID
    pub session_pid: String,
    /// This device's member public ID within the session
    pub member_pid: String,
    /// Whether this member is the session host
    pub is_host: bool,
    /// Short-lived websocket token (JWT with an expiry claim)
    pub ws_token: String,
    /// Table number for display
    pub table_number: u32,
    /// Restaurant name for display
    pub restaurant_name: String,
    /// When the credentials were persisted (ISO timestamp)
    pub saved_at: String,
}

/// Typed accessors over a storage backend.
pub struct CredentialsManager {
    storage: Box<dyn CredentialStorage>,
}

impl CredentialsManager {
    /// Create a new credentials manager with the given storage backend
    pub fn new(storage: Box<dyn CredentialStorage>) -> Self {
        Self { storage }
    }

    // ==========================================
    // Device Identity
    // ==========================================

    /// Store the device ID
    pub fn set_device_id(&self, device_id: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::DEVICE_ID, device_id)
    }

    /// Retrieve the device ID
    pub fn get_device_id(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::DEVICE_ID)
    }

    // ==========================================
    // Session Credentials
    // ==========================================

    /// Persist session credentials.
    pub fn set_session_credentials(&self, creds: &StoredCredentials) -> StorageResult<()> {
        let json = serde_json::to_string(creds)?;
        self.storage.set(StorageKeys::SESSION_CREDENTIALS, &json)
    }

    /// Retrieve persisted session credentials, if any.
    pub fn get_session_credentials(&self) -> StorageResult<Option<StoredCredentials>> {
        match self.storage.get(StorageKeys::SESSION_CREDENTIALS)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Check whether session credentials exist.
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::SESSION_CREDENTIALS)
    }

    /// Remove persisted session credentials. The device ID survives.
    pub fn clear_session(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::SESSION_CREDENTIALS)?;
        Ok(())
    }
}
