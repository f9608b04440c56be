//! Notion REST client acting as the task source

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::property::decode_page;
use crate::config::NotionConfig;
use crate::task::{FlagUpdate, Outcome, Task, TaskSource};
use crate::{Error, Result};

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Database metadata used by the source check
#[derive(Debug, Clone)]
pub struct DatabaseInfo {
    pub id: String,
    pub title: String,
    /// Property name and type, sorted by name
    pub properties: Vec<(String, String)>,
}

impl DatabaseInfo {
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }
}

/// Task source backed by a Notion database
pub struct NotionTaskSource {
    client: Client,
    config: NotionConfig,
}

impl NotionTaskSource {
    pub fn new(config: NotionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::unavailable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.api_token)
            .header("Notion-Version", &self.config.api_version)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| Error::unavailable(format!("Request to Notion failed: {}", e)))
    }

    /// Fetch the database metadata
    pub async fn check_database(&self) -> Result<DatabaseInfo> {
        let url = self.url(&format!(
            "databases/{}",
            urlencoding::encode(&self.config.database_id)
        ));
        let response = self.send(self.client.get(&url)).await?;
        let body = read_json(response, None).await?;

        let title = body["title"]
            .as_array()
            .map(|segments| {
                segments
                    .iter()
                    .filter_map(|s| s["plain_text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();
        let mut properties: Vec<(String, String)> = body["properties"]
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| {
                        let kind = prop["type"].as_str().unwrap_or("unknown").to_string();
                        (name.clone(), kind)
                    })
                    .collect()
            })
            .unwrap_or_default();
        properties.sort();

        Ok(DatabaseInfo {
            id: body["id"].as_str().unwrap_or_default().to_string(),
            title,
            properties,
        })
    }

    /// Configured properties absent from the database or of the wrong type
    pub fn schema_problems(&self, info: &DatabaseInfo) -> Vec<String> {
        let expected = [
            (&self.config.pending_property, &["checkbox"][..]),
            (&self.config.deleted_property, &["checkbox"][..]),
            (&self.config.title_property, &["title", "rich_text"][..]),
            (&self.config.link_property, &["url", "rich_text"][..]),
        ];
        expected
            .iter()
            .filter_map(|(name, kinds)| match info.property_type(name) {
                None => Some(format!("property '{}' is missing", name)),
                Some(kind) if !kinds.contains(&kind) => Some(format!(
                    "property '{}' is '{}', expected {}",
                    name,
                    kind,
                    kinds.join(" or ")
                )),
                Some(_) => None,
            })
            .collect()
    }

    async fn query_page(&self, cursor: Option<&str>) -> Result<QueryResponse> {
        let mut body = json!({
            "filter": {
                "property": self.config.pending_property,
                "checkbox": { "equals": true }
            },
            "page_size": self.config.page_size,
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let url = self.url(&format!(
            "databases/{}/query",
            urlencoding::encode(&self.config.database_id)
        ));
        let response = self.send(self.client.post(&url).json(&body)).await?;
        let value = read_json(response, None).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl TaskSource for NotionTaskSource {
    async fn query_pending(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        let mut cursor: Option<String> = None;
        let mut skipped = 0usize;

        loop {
            let page = self.query_page(cursor.as_deref()).await?;
            debug!("Notion query returned {} records", page.results.len());

            for record in &page.results {
                match decode_page(record, &self.config) {
                    Ok(task) => tasks.push(task),
                    Err(reason) => {
                        skipped += 1;
                        let id = record["id"].as_str().unwrap_or("<unknown>");
                        warn!("Skipping record {}: {}", id, reason);
                    }
                }
            }

            match page.next_cursor {
                Some(next) if page.has_more && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        info!(
            "Found {} pending tasks ({} records skipped)",
            tasks.len(),
            skipped
        );
        Ok(tasks)
    }

    async fn mark_outcome(&self, task: &Task, outcome: &Outcome) -> Result<()> {
        let flags = FlagUpdate::for_outcome(outcome);
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.config.pending_property.clone(),
            json!({ "checkbox": flags.pending }),
        );
        properties.insert(
            self.config.deleted_property.clone(),
            json!({ "checkbox": flags.deleted }),
        );
        let body = json!({ "properties": properties });

        let url = self.url(&format!("pages/{}", urlencoding::encode(&task.task_id)));
        let response = self.send(self.client.patch(&url).json(&body)).await?;
        read_json(response, Some(&task.task_id)).await?;

        info!(
            "Updated flags for task {} ({}): {}={}, {}={}",
            task.task_id,
            task.title,
            self.config.pending_property,
            flags.pending,
            self.config.deleted_property,
            flags.deleted
        );
        Ok(())
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.len() <= BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut end = BODY_PREVIEW_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

/// Map a Notion status to an error
///
/// `write_task` is set for page updates, where client errors mean the
/// write itself was rejected.
fn status_error(status: StatusCode, body: &str, write_task: Option<&str>) -> Error {
    let message = format!("status {}: {}", status.as_u16(), preview_body(body));
    match (status, write_task) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => Error::Auth(message),
        (s, Some(task_id))
            if s.is_client_error() && s != StatusCode::TOO_MANY_REQUESTS =>
        {
            Error::WriteConflict {
                task_id: task_id.to_string(),
                message,
            }
        }
        _ => Error::SourceUnavailable {
            status: Some(status.as_u16()),
            message,
        },
    }
}

async fn read_json(response: Response, write_task: Option<&str>) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::unavailable(format!("Failed to read Notion response: {}", e)))?;
    if !status.is_success() {
        return Err(status_error(status, &body, write_task));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| Error::SourceUnavailable {
        status: Some(status.as_u16()),
        message: format!("invalid JSON: {} | body={}", e, preview_body(&body)),
    })
}
