#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_monitor::{FeedFetch, FeedParser, FeedSource, FetchError, MonitorError, RawEntry, SourceRegistry, ENTRY_CAP};
use std::collections::HashMap;
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn entry(title: &str, summary: &str, published: DateTime<Utc>) -> RawEntry {
    RawEntry {
        title: Some(title.to_string()),
        summary: Some(summary.to_string()),
        link: Some(format!("https://news.example.com/{}", title.to_lowercase().replace(' ', "-"))),
        published: Some(published.to_rfc3339()),
        ..RawEntry::default()
    }
}

/// What a fixture feed does when fetched.
#[derive(Clone)]
pub enum Fixture {
    Entries(Vec<RawEntry>),
    Xml(String),
    Delayed(Duration, Vec<RawEntry>),
    Fail(String),
    Hang,
}

/// Serves canned feeds keyed by endpoint, no network involved.
#[derive(Default)]
pub struct FixtureFetcher {
    feeds: HashMap<String, Fixture>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: &str, fixture: Fixture) -> Self {
        self.feeds.insert(endpoint.to_string(), fixture);
        self
    }
}

#[async_trait]
impl FeedFetch for FixtureFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        match self.feeds.get(&source.endpoint).cloned() {
            Some(Fixture::Entries(entries)) => Ok(entries),
            Some(Fixture::Xml(xml)) => FeedParser::parse_entries(xml.as_bytes(), ENTRY_CAP),
            Some(Fixture::Delayed(delay, entries)) => {
                tokio::time::sleep(delay).await;
                Ok(entries)
            }
            Some(Fixture::Fail(message)) => Err(FetchError::Parse(message)),
            Some(Fixture::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Err(FetchError::Status {
                status: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }
}

pub struct BrokenRegistry;

#[async_trait]
impl SourceRegistry for BrokenRegistry {
    async fn list_sources(&self) -> Result<Vec<FeedSource>, MonitorError> {
        Err(MonitorError::Registry("sheet unavailable".to_string()))
    }
}

pub fn source(name: &str) -> FeedSource {
    FeedSource::new(name, format!("https://{}.example.com/rss", name))
}
