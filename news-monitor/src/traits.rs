use crate::error::{ExportError, FetchError, MonitorError};
use crate::types::{ExportResult, FeedSource, RawEntry, SheetRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Retrieves the raw entries of one feed.
#[async_trait]
pub trait FeedFetch: Send + Sync {
    /// Entries in the order the feed lists them. Implementations should not
    /// retry; the next run is the retry.
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError>;
}

/// Supplies the feeds to poll.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// Only sources with an http(s) endpoint are returned.
    async fn list_sources(&self) -> Result<Vec<FeedSource>, MonitorError>;
}

/// Append-only tabular store.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Appends `rows` as one logical batch.
    async fn append(&self, rows: &[SheetRow]) -> Result<ExportResult, ExportError>;

    fn sink_name(&self) -> String;
}

/// Source of "now" for fetch timestamps and cutoffs.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
