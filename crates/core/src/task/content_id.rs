//! Content id extraction from stored video links
//!
//! Two link shapes are accepted:
//! - canonical: `https://www.youtube.com/watch?v=<id>[&...]`
//! - short: `https://youtu.be/<id>[?...]`

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch";
const WATCH_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// The platform's identifier for a video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Build a content id, rejecting empty or malformed values
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if is_valid_id(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL for this content
    pub fn watch_url(&self) -> String {
        format!("{}?v={}", WATCH_URL_BASE, self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract the content id from a stored link
///
/// Returns `None` for anything that is not one of the two accepted shapes.
pub fn parse_content_id(link: &str) -> Option<ContentId> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let url = if link.contains("://") {
        Url::parse(link).ok()?
    } else {
        Url::parse(&format!("https://{}", link)).ok()?
    };

    let host = url.host_str()?.to_ascii_lowercase();

    if WATCH_HOSTS.contains(&host.as_str()) && url.path().trim_end_matches('/') == "/watch" {
        let id = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?;
        return ContentId::new(id);
    }

    if SHORT_HOSTS.contains(&host.as_str()) {
        let id = url.path_segments()?.find(|segment| !segment.is_empty())?;
        return ContentId::new(id);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_link() {
        let id = parse_content_id("https://www.youtube.com/watch?v=BPODklKbx5s").unwrap();
        assert_eq!(id.as_str(), "BPODklKbx5s");
    }

    #[test]
    fn test_parse_canonical_link_ignores_trailing_params() {
        let plain = parse_content_id("https://www.youtube.com/watch?v=rMHc-eZchG8").unwrap();
        let with_params =
            parse_content_id("https://www.youtube.com/watch?v=rMHc-eZchG8&t=42s&list=WL").unwrap();
        assert_eq!(plain, with_params);
    }

    #[test]
    fn test_parse_canonical_link_with_v_not_first() {
        let id = parse_content_id("https://www.youtube.com/watch?feature=share&v=abc123").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_parse_short_link() {
        let id = parse_content_id("https://youtu.be/xyz789?si=tracking").unwrap();
        assert_eq!(id.as_str(), "xyz789");
    }

    #[test]
    fn test_parse_link_without_scheme() {
        let id = parse_content_id("youtu.be/xyz789").unwrap();
        assert_eq!(id.as_str(), "xyz789");
    }

    #[test]
    fn test_watch_url_roundtrip() {
        for raw in ["abc123", "x_Y-z", "BPODklKbx5s"] {
            let id = ContentId::new(raw).unwrap();
            assert_eq!(parse_content_id(&id.watch_url()), Some(id.clone()));
            let short = format!("https://youtu.be/{}?feature=shared", raw);
            assert_eq!(parse_content_id(&short), Some(id));
        }
    }

    #[test]
    fn test_rejects_unaccepted_links() {
        assert!(parse_content_id("").is_none());
        assert!(parse_content_id("https://example.com/article").is_none());
        assert!(parse_content_id("https://www.youtube.com/watch?list=WL").is_none());
        assert!(parse_content_id("https://www.youtube.com/watch?v=").is_none());
        assert!(parse_content_id("https://youtu.be/").is_none());
        assert!(parse_content_id("not a url at all").is_none());
    }

    #[test]
    fn test_watch_links_must_come_from_the_platform() {
        assert!(parse_content_id("https://example.com/watch?v=abc123").is_none());
        assert!(parse_content_id("https://youtube.com.evil.test/watch?v=abc123").is_none());
        assert!(parse_content_id("https://www.youtube.com/embed/watch?v=abc123").is_none());
        assert_eq!(
            parse_content_id("https://m.youtube.com/watch?v=abc123").map(|id| id.to_string()),
            Some("abc123".to_string())
        );
        assert_eq!(
            parse_content_id("YouTube.com/watch?v=abc123").map(|id| id.to_string()),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_content_id_rejects_invalid_characters() {
        assert!(ContentId::new("abc 123").is_none());
        assert!(ContentId::new("").is_none());
    }
}
