//! Cart snapshot fetch.
//!
//! On resume and on reconnect the client seeds local state from one REST
//! snapshot instead of replaying event history.

use crate::{ClientError, ClientResult};
use cart_protocol::CartSnapshot;
use reqwest::Client;
use tracing::debug;

/// REST client for the full-cart snapshot endpoint.
pub struct SnapshotClient {
    http_client: Client,
    api_url: String,
}

impl SnapshotClient {
    /// Create a new snapshot client against the given API base URL.
    pub fn new(api_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            api_url: api_url.to_string(),
        }
    }

    /// Fetch the current cart, order history, and lock status.
    pub async fn fetch(&self, session_pid: &str, ws_token: &str) -> ClientResult<CartSnapshot> {
        let url = format!("{}/v1/sessions/{}/cart", self.api_url, session_pid);
        debug!(url = %url, "Fetching cart snapshot");

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", ws_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Snapshot(format!("HTTP {}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}
