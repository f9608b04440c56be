//! Typed decoding of Notion page properties
//!
//! Each property is decoded on its own. A property with an unexpected shape
//! makes only its record unusable; the record is skipped with a reason.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::config::NotionConfig;
use crate::task::{parse_content_id, Task};

const UNTITLED: &str = "Untitled";

/// A rich text segment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// Property value, tagged by its `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Url { url: Option<String> },
    Checkbox { checkbox: bool },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Text content of a title or rich text property
    pub fn as_text(&self) -> Option<String> {
        let segments = match self {
            Self::Title { title } => title,
            Self::RichText { rich_text } => rich_text,
            _ => return None,
        };
        let text: String = segments.iter().map(|s| s.plain_text.as_str()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Link carried by a url or rich text property
    pub fn as_link(&self) -> Option<String> {
        match self {
            Self::Url { url } => url.as_ref().map(|u| u.trim().to_string()),
            Self::RichText { rich_text } => rich_text.iter().find_map(|s| {
                s.href
                    .clone()
                    .or_else(|| (!s.plain_text.trim().is_empty()).then(|| s.plain_text.trim().to_string()))
            }),
            _ => None,
        }
        .filter(|link| !link.is_empty())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::RichText { .. } => "rich_text",
            Self::Url { .. } => "url",
            Self::Checkbox { .. } => "checkbox",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Why a record was not turned into a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingId,
    MissingProperty(String),
    Malformed { property: String, detail: String },
    WrongType { property: String, found: String },
    EmptyLink,
    UnparseableLink(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => f.write_str("record has no id"),
            Self::MissingProperty(name) => write!(f, "property '{}' not found", name),
            Self::Malformed { property, detail } => {
                write!(f, "property '{}' has an unexpected shape: {}", property, detail)
            }
            Self::WrongType { property, found } => {
                write!(f, "property '{}' has unsupported type '{}'", property, found)
            }
            Self::EmptyLink => f.write_str("link is empty"),
            Self::UnparseableLink(link) => write!(f, "no content id in link '{}'", link),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    id: String,
    #[serde(default)]
    properties: HashMap<String, Value>,
}

fn decode_property(
    properties: &HashMap<String, Value>,
    name: &str,
) -> Result<Option<PropertyValue>, SkipReason> {
    match properties.get(name) {
        None => Ok(None),
        Some(raw) => serde_json::from_value(raw.clone())
            .map(Some)
            .map_err(|e| SkipReason::Malformed {
                property: name.to_string(),
                detail: e.to_string(),
            }),
    }
}

/// Turn a query result record into a task
pub fn decode_page(page: &Value, config: &NotionConfig) -> Result<Task, SkipReason> {
    let raw: RawPage = serde_json::from_value(page.clone()).map_err(|e| SkipReason::Malformed {
        property: "<record>".to_string(),
        detail: e.to_string(),
    })?;
    if raw.id.is_empty() {
        return Err(SkipReason::MissingId);
    }

    let link_property = decode_property(&raw.properties, &config.link_property)?
        .ok_or_else(|| SkipReason::MissingProperty(config.link_property.clone()))?;
    let link = match &link_property {
        PropertyValue::Url { .. } | PropertyValue::RichText { .. } => {
            link_property.as_link().ok_or(SkipReason::EmptyLink)?
        }
        other => {
            return Err(SkipReason::WrongType {
                property: config.link_property.clone(),
                found: other.type_name().to_string(),
            })
        }
    };

    // A broken title never hides a removable record
    let title = match decode_property(&raw.properties, &config.title_property) {
        Ok(Some(value)) => value.as_text(),
        _ => None,
    }
    .unwrap_or_else(|| UNTITLED.to_string());

    let content_id = parse_content_id(&link).ok_or_else(|| SkipReason::UnparseableLink(link.clone()))?;

    Ok(Task {
        task_id: raw.id,
        content_id,
        title,
        source_url: link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(link: Value) -> Value {
        json!({
            "object": "page",
            "id": "page-1",
            "properties": {
                "Name": {
                    "id": "title",
                    "type": "title",
                    "title": [
                        {"type": "text", "text": {"content": "Rust "}, "plain_text": "Rust "},
                        {"type": "text", "text": {"content": "talk"}, "plain_text": "talk"}
                    ]
                },
                "delete": {"id": "abc", "type": "checkbox", "checkbox": true},
                "Link": link
            }
        })
    }

    #[test]
    fn test_decode_url_property() {
        let value = page(json!({"id": "x", "type": "url", "url": "https://www.youtube.com/watch?v=abc123&t=1"}));
        let task = decode_page(&value, &NotionConfig::default()).unwrap();
        assert_eq!(task.task_id, "page-1");
        assert_eq!(task.content_id.as_str(), "abc123");
        assert_eq!(task.title, "Rust talk");
    }

    #[test]
    fn test_decode_rich_text_link() {
        let value = page(json!({
            "id": "x",
            "type": "rich_text",
            "rich_text": [{"plain_text": "watch this", "href": "https://youtu.be/xyz789"}]
        }));
        let task = decode_page(&value, &NotionConfig::default()).unwrap();
        assert_eq!(task.content_id.as_str(), "xyz789");
    }

    #[test]
    fn test_missing_link_property() {
        let mut value = page(json!(null));
        value["properties"].as_object_mut().unwrap().remove("Link");
        let err = decode_page(&value, &NotionConfig::default()).unwrap_err();
        assert_eq!(err, SkipReason::MissingProperty("Link".to_string()));
    }

    #[test]
    fn test_unrecognized_property_type_fails_closed() {
        let value = page(json!({"id": "x", "type": "formula", "formula": {"string": "?"}}));
        let err = decode_page(&value, &NotionConfig::default()).unwrap_err();
        assert!(matches!(err, SkipReason::WrongType { .. }));
    }

    #[test]
    fn test_malformed_property_fails_closed() {
        let value = page(json!({"id": "x", "type": "url", "url": 42}));
        let err = decode_page(&value, &NotionConfig::default()).unwrap_err();
        assert!(matches!(err, SkipReason::Malformed { .. }));
    }

    #[test]
    fn test_empty_and_unparseable_links() {
        let empty = page(json!({"id": "x", "type": "url", "url": null}));
        assert_eq!(
            decode_page(&empty, &NotionConfig::default()).unwrap_err(),
            SkipReason::EmptyLink
        );

        let foreign = page(json!({"id": "x", "type": "url", "url": "https://example.com/v"}));
        assert!(matches!(
            decode_page(&foreign, &NotionConfig::default()).unwrap_err(),
            SkipReason::UnparseableLink(_)
        ));
    }

    #[test]
    fn test_missing_title_falls_back() {
        let mut value = page(json!({"id": "x", "type": "url", "url": "https://youtu.be/abc123"}));
        value["properties"]["Name"] = json!({"id": "title", "type": "title", "title": []});
        let task = decode_page(&value, &NotionConfig::default()).unwrap();
        assert_eq!(task.title, "Untitled");
    }
}
