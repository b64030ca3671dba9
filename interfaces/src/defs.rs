use serde::{Deserialize, Serialize};

/// A named feed endpoint handed out by the source registry.
///
/// `name` is the unique key of the source within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub endpoint: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Header row of the export table. `SheetRow::cells` yields values in this order.
pub const SHEET_COLUMNS: [&str; 8] = [
    "Timestamp",
    "Title",
    "Summary",
    "Url",
    "Source",
    "Country",
    "Matched Keywords",
    "Thumbnail",
];

/// One flat row as handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub timestamp: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    // reserved, always empty for now
    pub country: String,
    pub matched_query: String,
    pub thumbnail: String,
}

impl SheetRow {
    pub fn cells(&self) -> [&str; 8] {
        [
            &self.timestamp,
            &self.title,
            &self.summary,
            &self.url,
            &self.source,
            &self.country,
            &self.matched_query,
            &self.thumbnail,
        ]
    }
}

/// What the store reports back after an append.
///
/// `rows_written` may be lower than the number of rows sent when the store
/// only applied part of the batch (for example rows it already held).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportResult {
    pub rows_written: usize,
}

// Display surfaces and sinks only ever see the types above. Everything that
// produces them lives in the engine crate, so a dashboard can depend on this
// crate alone.
