//! Storage key constants.

/// Storage keys used by the cart client
pub struct StorageKeys;

impl StorageKeys {
    /// Device ID
    pub const DEVICE_ID: &'static str = "device_id";

    /// Persisted session credentials (JSON)
    pub const SESSION_CREDENTIALS: &'static str = "session_credentials";
}
