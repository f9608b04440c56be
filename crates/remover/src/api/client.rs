//! YouTube Data API playlist client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use wl_core::config::PlaylistConfig;

use super::oauth::Credentials;
use crate::error::{RemovalError, Result};

/// One playlist membership record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// Entry handle required by the delete call
    pub entry_id: String,
    pub content_id: String,
}

/// One page of playlist entries
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistEntry>,
    pub next_page_token: Option<String>,
}

/// Remote playlist operations
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    /// Confirm the credentials are usable before any playlist call
    async fn authorize(&self) -> Result<()> {
        Ok(())
    }

    async fn list(&self, playlist_id: &str, page_token: Option<&str>) -> Result<PlaylistPage>;

    async fn delete(&self, entry_id: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    #[serde(default)]
    video_id: Option<String>,
}

impl RawItem {
    fn into_entry(self) -> Option<PlaylistEntry> {
        let content_id = self
            .snippet
            .and_then(|s| s.resource_id)
            .and_then(|r| r.video_id)
            .or_else(|| self.content_details.and_then(|c| c.video_id))?;
        Some(PlaylistEntry {
            entry_id: self.id,
            content_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

fn api_error(status: StatusCode, body: &str) -> RemovalError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let reasons: Vec<&str> = parsed
                .error
                .errors
                .iter()
                .map(|e| e.reason.as_str())
                .filter(|r| !r.is_empty())
                .collect();
            if reasons.is_empty() {
                parsed.error.message
            } else {
                format!("{} ({})", parsed.error.message, reasons.join(", "))
            }
        }
        Err(_) => body.trim().chars().take(512).collect(),
    };
    RemovalError::api(Some(status.as_u16()), message)
}

/// Playlist client authenticated with user credentials
pub struct YouTubeClient {
    client: Client,
    api_base: String,
    page_size: u32,
    credentials: Arc<Credentials>,
}

impl YouTubeClient {
    pub fn new(config: &PlaylistConfig, credentials: Arc<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RemovalError::api(None, format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            credentials,
        })
    }
}

#[async_trait]
impl PlaylistApi for YouTubeClient {
    async fn authorize(&self) -> Result<()> {
        self.credentials.access_token().await.map(|_| ())
    }

    async fn list(&self, playlist_id: &str, page_token: Option<&str>) -> Result<PlaylistPage> {
        let mut url = format!(
            "{}/playlistItems?part=snippet&playlistId={}&maxResults={}",
            self.api_base,
            urlencoding::encode(playlist_id),
            self.page_size
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let token = self.credentials.access_token().await?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RemovalError::api(None, format!("list request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemovalError::api(Some(status.as_u16()), e.to_string()))?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: ListResponse = serde_json::from_str(&body)?;
        let items: Vec<PlaylistEntry> = parsed
            .items
            .into_iter()
            .filter_map(RawItem::into_entry)
            .collect();
        debug!(
            "Fetched {} playlist entries (next page: {})",
            items.len(),
            parsed.next_page_token.is_some()
        );
        Ok(PlaylistPage {
            items,
            next_page_token: parsed.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn delete(&self, entry_id: &str) -> Result<()> {
        let url = format!(
            "{}/playlistItems?id={}",
            self.api_base,
            urlencoding::encode(entry_id)
        );
        let token = self.credentials.access_token().await?;
        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RemovalError::api(None, format!("delete request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }
}
