//! Table session management.
//!
//! A session is established once per table visit via a REST handshake, then
//! persisted so the app can resume after a restart without rescanning the
//! table code. The websocket token inside it is short-lived; `refresh`
//! exchanges it before expiry, falling back across redundant backend
//! endpoints when the primary is down.

use crate::token::needs_refresh;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use cart_protocol::SessionCredentials;
use cart_storage::{CredentialsManager, StoredCredentials};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use table_relay::{RelayError, RelayResult, TokenRefresher};
use tracing::{debug, info, warn};

/// Session handshake request.
#[derive(Debug, Serialize)]
struct EstablishRequest {
    table_pid: String,
    token: String,
    device_id: String,
}

/// Error body the backend returns on a rejected handshake.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

/// Token refresh response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    ws_token: String,
}

/// Session manager for a table-scoped collaborative session.
pub struct SessionManager {
    credentials: Arc<CredentialsManager>,
    api_url: String,
    fallback_api_urls: Vec<String>,
    http_client: Client,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(
        credentials: Arc<CredentialsManager>,
        api_url: &str,
        fallback_api_urls: Vec<String>,
    ) -> Self {
        Self {
            credentials,
            api_url: api_url.to_string(),
            fallback_api_urls,
            http_client: Client::new(),
        }
    }

    /// Perform the one-shot session handshake for a table.
    ///
    /// On success the credentials are persisted and returned. On rejection
    /// the server's error key is mapped to a categorized `SessionError` and
    /// nothing is persisted.
    pub async fn establish(
        &self,
        table_pid: &str,
        token: &str,
        device_id: &str,
    ) -> SessionResult<SessionCredentials> {
        let join_url = format!("{}/v1/sessions", self.api_url);
        debug!(url = %join_url, table_pid = %table_pid, "Establishing table session");

        let response = self
            .http_client
            .post(&join_url)
            .json(&EstablishRequest {
                table_pid: table_pid.to_string(),
                token: token.to_string(),
                device_id: device_id.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Session handshake rejected");

            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => SessionError::from_error_key(&err.error, err.message),
                Err(_) => SessionError::Handshake(format!("HTTP {}: {}", status, body)),
            });
        }

        // Parse fully before persisting; a half-written session is worse
        // than none at all
        let creds: SessionCredentials = response.json().await?;
        self.persist(&creds)?;

        info!(
            session_pid = %creds.session_pid,
            member_pid = %creds.member_pid,
            table_number = creds.table_number,
            "Joined table session"
        );
        Ok(creds)
    }

    /// Load previously persisted credentials, if any.
    pub fn resume(&self) -> SessionResult<Option<SessionCredentials>> {
        match self.credentials.get_session_credentials()? {
            Some(stored) => {
                info!(
                    session_pid = %stored.session_pid,
                    saved_at = %stored.saved_at,
                    "Resumed table session from storage"
                );
                Ok(Some(to_session_credentials(stored)))
            }
            None => {
                debug!("No persisted session to resume");
                Ok(None)
            }
        }
    }

    /// True when the token's expiry is within the 15-minute lookahead.
    pub fn needs_refresh(&self, token: &str) -> bool {
        needs_refresh(token)
    }

    /// Exchange the current websocket token for a fresh one.
    ///
    /// Tries the primary endpoint first, then each configured fallback in
    /// order, surfacing the last error if every endpoint fails. Success
    /// persists the updated credentials.
    pub async fn refresh(&self) -> SessionResult<SessionCredentials> {
        let stored = self
            .credentials
            .get_session_credentials()?
            .ok_or(SessionError::NotJoined)?;

        let mut last_error = None;
        for endpoint in std::iter::once(&self.api_url).chain(self.fallback_api_urls.iter()) {
            match self.try_refresh(endpoint, &stored).await {
                Ok(ws_token) => {
                    let mut updated = stored.clone();
                    updated.ws_token = ws_token;
                    updated.saved_at = Utc::now().to_rfc3339();
                    self.credentials.set_session_credentials(&updated)?;

                    info!(session_pid = %updated.session_pid, "Websocket token refreshed");
                    return Ok(to_session_credentials(updated));
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Token refresh failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SessionError::TokenRefresh("No endpoints configured".to_string())))
    }

    /// Single refresh attempt against one endpoint.
    async fn try_refresh(
        &self,
        endpoint: &str,
        stored: &StoredCredentials,
    ) -> SessionResult<String> {
        let refresh_url = format!("{}/v1/sessions/refresh", endpoint);
        debug!(url = %refresh_url, "Refreshing websocket token");

        let response = self
            .http_client
            .post(&refresh_url)
            .header("Authorization", format!("Bearer {}", stored.ws_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::TokenRefresh(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: RefreshResponse = response.json().await?;
        Ok(data.ws_token)
    }

    /// Drop the persisted session. Called on table close.
    pub fn clear(&self) -> SessionResult<()> {
        self.credentials.clear_session()?;
        info!("Cleared table session");
        Ok(())
    }

    fn persist(&self, creds: &SessionCredentials) -> SessionResult<()> {
        self.credentials.set_session_credentials(&StoredCredentials {
            session_pid: creds.session_pid.clone(),
            member_pid: creds.member_pid.clone(),
            is_host: creds.is_host,
            ws_token: creds.ws_token.clone(),
            table_number: creds.table_number,
            restaurant_name: creds.restaurant_name.clone(),
            saved_at: Utc::now().to_rfc3339(),
        })?;
        Ok(())
    }
}

#[async_trait]
impl TokenRefresher for SessionManager {
    async fn refresh_ws_token(&self) -> RelayResult<String> {
        self.refresh()
            .await
            .map(|creds| creds.ws_token)
            .map_err(|e| RelayError::Authentication(e.to_string()))
    }
}

fn to_session_credentials(stored: StoredCredentials) -> SessionCredentials {
    SessionCredentials {
        session_pid: stored.session_pid,
        member_pid: stored.member_pid,
        is_host: stored.is_host,
        ws_token: stored.ws_token,
        table_number: stored.table_number,
        restaurant_name: stored.restaurant_name,
    }
}
