use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MonitorError, Result};

pub use interfaces::defs::{ExportResult, FeedSource, SheetRow, SHEET_COLUMNS};

/// Query used when a run does not supply one.
pub const DEFAULT_QUERY: &str = "\"Russia\" OR \"Russians\" OR \"Russian\" OR \"wagner\" OR \"Africa Corps\" OR \
     \"Russian instructors\" OR \"Russian military specialists\"";

/// Entries kept per feed, in the order the feed lists them.
pub const ENTRY_CAP: usize = 20;

pub const MIN_WINDOW_DAYS: u32 = 1;
pub const MAX_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Format of the timestamp column in exported rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A link attached to a feed item, as the feed declared it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLink {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

/// One item exactly as a feed reported it. Publisher-controlled; nothing here
/// is trusted or guaranteed to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub media_thumbnails: Vec<String>,
    pub media_contents: Vec<String>,
    pub links: Vec<RawLink>,
}

/// Canonical record that flows through filtering, display and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source_name: String,
    pub thumbnail_url: String,
    pub matched_query: String,
}

impl NormalizedRecord {
    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail_url.is_empty()
    }
}

impl From<&NormalizedRecord> for SheetRow {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            title: record.title.clone(),
            summary: record.summary.clone(),
            url: record.url.clone(),
            source: record.source_name.clone(),
            country: String::new(),
            matched_query: record.matched_query.clone(),
            thumbnail: record.thumbnail_url.clone(),
        }
    }
}

/// Ordered snapshot of accepted records bound for a sink. Built once, never
/// mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportBatch {
    records: Vec<NormalizedRecord>,
}

impl ExportBatch {
    pub fn new(records: &[NormalizedRecord]) -> Self {
        Self {
            records: records.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<SheetRow> {
        self.records.iter().map(SheetRow::from).collect()
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub max_entries: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "News-Monitor/1.0".to_string(),
            timeout_seconds: 20,
            max_feed_size_mb: 10,
            max_redirects: 5,
            max_entries: ENTRY_CAP,
        }
    }
}

/// Parameters a caller asks for; validated into [`RunParams`].
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub query: Option<String>,
    pub window_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub query: String,
    pub window_days: u32,
    pub entry_cap: usize,
}

impl RunParams {
    /// Blank or missing queries fall back to `default_query`; any other query
    /// is kept verbatim, surrounding whitespace included. The window must
    /// lie within `MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS`.
    pub fn resolve(request: &RunRequest, default_query: &str) -> Result<Self> {
        let query = match request.query.as_deref() {
            Some(q) if !q.trim().is_empty() => q.to_string(),
            _ => default_query.to_string(),
        };

        let window_days = request.window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(MonitorError::InvalidParams(format!(
                "window of {} days is outside {}..={}",
                window_days, MIN_WINDOW_DAYS, MAX_WINDOW_DAYS
            )));
        }

        Ok(Self {
            query,
            window_days,
            entry_cap: ENTRY_CAP,
        })
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.window_days))
    }
}

/// Something that went wrong during a run without stopping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    Source { source_name: String, message: String },
    Cancelled { source_name: String },
    Query { message: String },
    Registry { message: String },
}

impl RunWarning {
    pub fn source_name(&self) -> Option<&str> {
        match self {
            RunWarning::Source { source_name, .. } | RunWarning::Cancelled { source_name } => {
                Some(source_name.as_str())
            }
            RunWarning::Query { .. } | RunWarning::Registry { .. } => None,
        }
    }
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunWarning::Source { source_name, message } => write!(f, "{}: {}", source_name, message),
            RunWarning::Cancelled { source_name } => write!(f, "{}: cancelled before completion", source_name),
            RunWarning::Query { message } => write!(f, "query: {}", message),
            RunWarning::Registry { message } => write!(f, "registry: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    NotAttempted,
    Written { rows_sent: usize, rows_written: usize },
    Failed { message: String },
}

impl ExportStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ExportStatus::Failed { .. })
    }
}

/// Everything a display surface needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub query: String,
    pub records: Vec<NormalizedRecord>,
    pub warnings: Vec<RunWarning>,
    pub export: ExportStatus,
    pub cancelled: bool,
}

impl RunReport {
    pub fn failed_sources(&self) -> Vec<&str> {
        self.warnings.iter().filter_map(RunWarning::source_name).collect()
    }
}

/// Newest first, stable for equal timestamps. The pipeline never reorders on
/// its own; this is for callers that want a chronological view.
pub fn sort_newest_first(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
