//! Persisted OAuth2 user credentials
//!
//! Reads the authorized-user token file written by the consent flow,
//! refreshes the access token when it is about to expire and writes the
//! refreshed token back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RemovalError, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const REFRESH_MARGIN_SECS: i64 = 60;

/// Scopes that allow removing playlist items
pub const WRITE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtube.force-ssl",
];

/// Authorized-user token file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl AuthorizedUser {
    /// Whether any granted scope allows playlist writes
    pub fn has_write_scope(&self) -> bool {
        self.scopes
            .iter()
            .any(|scope| WRITE_SCOPES.contains(&scope.as_str()))
    }

    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(expiry)) => expiry - chrono::Duration::seconds(REFRESH_MARGIN_SECS) <= now,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

fn encode_form(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Access token provider backed by a token file
pub struct Credentials {
    path: PathBuf,
    client: Client,
    state: Mutex<AuthorizedUser>,
}

impl Credentials {
    /// Load the token file and check it grants write access
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RemovalError::TokenFile {
                path: path.clone(),
                message: e.to_string(),
            })?;
        let user: AuthorizedUser =
            serde_json::from_str(&content).map_err(|e| RemovalError::TokenFile {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Self::from_user(path, user)
    }

    /// Wrap already-parsed credentials
    pub fn from_user(path: PathBuf, user: AuthorizedUser) -> Result<Self> {
        if !user.has_write_scope() {
            return Err(RemovalError::auth(format!(
                "token grants {:?}; removing playlist items needs one of {:?}",
                user.scopes, WRITE_SCOPES
            )));
        }
        if user.token.is_none() && user.refresh_token.is_none() {
            return Err(RemovalError::auth("token file has neither an access nor a refresh token"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemovalError::auth(format!("Failed to build HTTP client: {}", e)))?;

        debug!("Loaded credentials from {:?}", path);
        Ok(Self {
            path,
            client,
            state: Mutex::new(user),
        })
    }

    /// A valid access token, refreshing it first when needed
    pub async fn access_token(&self) -> Result<String> {
        let mut user = self.state.lock().await;
        if user.needs_refresh(Utc::now()) {
            self.refresh(&mut user).await?;
        }
        user.token
            .clone()
            .ok_or_else(|| RemovalError::auth("no access token available"))
    }

    async fn refresh(&self, user: &mut AuthorizedUser) -> Result<()> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            user.refresh_token.clone(),
            user.client_id.clone(),
            user.client_secret.clone(),
        ) else {
            return Err(RemovalError::auth(
                "access token expired and the token file cannot be refreshed",
            ));
        };

        info!("Refreshing expired access token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&user.token_uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(encode_form(&params))
            .send()
            .await
            .map_err(|e| RemovalError::auth(format!("token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemovalError::auth(format!(
                "token refresh rejected with status {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RemovalError::auth(format!("invalid token refresh response: {}", e)))?;

        user.token = Some(refreshed.access_token);
        user.expiry = refreshed
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        if let Some(scope) = refreshed.scope {
            user.scopes = scope.split_whitespace().map(str::to_string).collect();
        }

        let content = serde_json::to_string_pretty(&*user)?;
        tokio::fs::write(&self.path, content).await?;
        info!("Saved refreshed credentials to {:?}", self.path);
        Ok(())
    }
}
