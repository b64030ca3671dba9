use crate::error::MonitorError;
use crate::traits::SourceRegistry;
use crate::types::FeedSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

/// Validate feed URL format: only http and https endpoints are polled.
pub fn is_valid_feed_url(url_str: &str) -> bool {
    match Url::parse(url_str.trim()) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

/// Drops sources with unusable endpoints or a name already seen, keeping the
/// order of the rest.
pub fn sanitize_sources(sources: impl IntoIterator<Item = FeedSource>) -> Vec<FeedSource> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for source in sources {
        let name = source.name.trim().to_string();
        if name.is_empty() {
            warn!("Skipping source without a name ({})", source.endpoint);
            continue;
        }
        if !is_valid_feed_url(&source.endpoint) {
            warn!("Skipping source {}: not an http(s) endpoint: {:?}", name, source.endpoint);
            continue;
        }
        if !seen.insert(name.clone()) {
            warn!("Skipping duplicate source name {}", name);
            continue;
        }
        kept.push(FeedSource {
            name,
            endpoint: source.endpoint.trim().to_string(),
        });
    }
    kept
}

/// Sources fixed at construction.
pub struct StaticRegistry {
    sources: Vec<FeedSource>,
}

impl StaticRegistry {
    pub fn new(sources: Vec<FeedSource>) -> Self {
        Self {
            sources: sanitize_sources(sources),
        }
    }
}

#[async_trait]
impl SourceRegistry for StaticRegistry {
    async fn list_sources(&self) -> Result<Vec<FeedSource>, MonitorError> {
        Ok(self.sources.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceEntry {
    Object { name: String, endpoint: String },
    Row(Vec<String>),
}

/// Reads sources from a JSON file on every listing, so edits apply to the
/// next run. Accepts either `[{"name": .., "endpoint": ..}]` or
/// spreadsheet-style rows `[["name", "url"], ..]` where a leading header row
/// is ignored because its URL cell is not a URL.
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub fn parse_sources_json(content: &str) -> Result<Vec<FeedSource>, MonitorError> {
    let entries: Vec<SourceEntry> = serde_json::from_str(content)?;
    let sources = entries.into_iter().filter_map(|entry| match entry {
        SourceEntry::Object { name, endpoint } => Some(FeedSource { name, endpoint }),
        SourceEntry::Row(cells) => match cells.as_slice() {
            [name, endpoint, ..] => Some(FeedSource::new(name.as_str(), endpoint.as_str())),
            _ => None,
        },
    });
    Ok(sanitize_sources(sources))
}

#[async_trait]
impl SourceRegistry for JsonFileRegistry {
    async fn list_sources(&self) -> Result<Vec<FeedSource>, MonitorError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            MonitorError::Registry(format!("reading {}: {}", self.path.display(), e))
        })?;
        let sources = parse_sources_json(&content)?;
        info!("Loaded {} sources from {}", sources.len(), self.path.display());
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_endpoints_survive() {
        assert!(is_valid_feed_url("https://feeds.bbci.co.uk/news/rss.xml"));
        assert!(is_valid_feed_url("http://example.com/feed"));
        assert!(!is_valid_feed_url("ftp://example.com/feed"));
        assert!(!is_valid_feed_url("feeds.example.com/rss"));
        assert!(!is_valid_feed_url("URL"));
    }

    #[test]
    fn sheet_rows_skip_header_and_duplicates() {
        let json = r#"[
            ["Name", "URL"],
            ["BBC", "https://feeds.bbci.co.uk/news/world/rss.xml"],
            ["Local", "file:///tmp/feed.xml"],
            ["BBC", "https://example.com/other.xml"],
            ["Short"]
        ]"#;
        let sources = parse_sources_json(json).unwrap();
        assert_eq!(
            sources,
            vec![FeedSource::new("BBC", "https://feeds.bbci.co.uk/news/world/rss.xml")]
        );
    }

    #[test]
    fn object_entries_keep_order() {
        let json = r#"[
            {"name": "B", "endpoint": "https://b.example.com/rss"},
            {"name": "A", "endpoint": "https://a.example.com/rss"}
        ]"#;
        let names: Vec<_> = parse_sources_json(json)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["B", "A"]);
    }
}
