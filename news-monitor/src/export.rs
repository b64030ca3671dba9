use crate::error::ExportError;
use crate::traits::RecordSink;
use crate::types::{ExportBatch, ExportResult, SheetRow};
use async_trait::async_trait;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Hands a batch to a sink as one append, under a timeout. Never retries.
pub struct ExportSink {
    sink: Arc<dyn RecordSink>,
    timeout: Duration,
}

impl ExportSink {
    pub fn new(sink: Arc<dyn RecordSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    pub async fn export(&self, batch: &ExportBatch) -> Result<ExportResult, ExportError> {
        if batch.is_empty() {
            debug!("Nothing to export");
            return Ok(ExportResult::default());
        }

        let rows = batch.rows();
        let sink_name = self.sink.sink_name();
        info!("Exporting {} rows to {}", rows.len(), sink_name);

        let result = match tokio::time::timeout(self.timeout, self.sink.append(&rows)).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::Timeout(self.timeout)),
        };

        match &result {
            Ok(written) if written.rows_written < rows.len() => warn!(
                "{} applied {} of {} rows",
                sink_name,
                written.rows_written,
                rows.len()
            ),
            Ok(written) => info!("{} accepted {} rows", sink_name, written.rows_written),
            Err(e) => error!("Export to {} failed: {}", sink_name, e),
        }
        result
    }
}

/// PostgreSQL table sink. Rows already present (same url, title and query)
/// are skipped, so re-exporting a run is harmless.
pub struct PgSink {
    pool: PgPool,
    table: String,
}

impl PgSink {
    pub async fn connect(database_url: &str, table: &str) -> Result<Self, ExportError> {
        if !is_valid_table_name(table) {
            return Err(ExportError::Rejected(format!("invalid table name: {:?}", table)));
        }
        let pool = PgPool::connect(database_url).await?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub async fn setup_schema(&self) -> Result<(), ExportError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                published TEXT NOT NULL,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                url TEXT NOT NULL,
                source TEXT NOT NULL,
                country TEXT NOT NULL DEFAULT '',
                matched_query TEXT NOT NULL,
                thumbnail TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE (url, title, matched_query)
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for PgSink {
    async fn append(&self, rows: &[SheetRow]) -> Result<ExportResult, ExportError> {
        let insert = format!(
            r#"
            INSERT INTO {} (published, title, summary, url, source, country, matched_query, thumbnail)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (url, title, matched_query) DO NOTHING
            "#,
            self.table
        );

        let mut tx = self.pool.begin().await?;
        let mut rows_written = 0u64;
        for row in rows {
            let done = sqlx::query(&insert)
                .bind(&row.timestamp)
                .bind(&row.title)
                .bind(&row.summary)
                .bind(&row.url)
                .bind(&row.source)
                .bind(&row.country)
                .bind(&row.matched_query)
                .bind(&row.thumbnail)
                .execute(&mut *tx)
                .await?;
            rows_written += done.rows_affected();
        }
        tx.commit().await?;

        Ok(ExportResult {
            rows_written: rows_written as usize,
        })
    }

    fn sink_name(&self) -> String {
        format!("postgres:{}", self.table)
    }
}

fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Appends one JSON object per row to a file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn append(&self, rows: &[SheetRow]) -> Result<ExportResult, ExportError> {
        let mut buffer = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut buffer, row)?;
            buffer.push(b'\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buffer).await?;
        file.flush().await?;

        Ok(ExportResult {
            rows_written: rows.len(),
        })
    }

    fn sink_name(&self) -> String {
        format!("jsonl:{}", self.path.display())
    }
}

/// Keeps rows in memory. Can be told to reject batches or to apply only part
/// of them.
#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<SheetRow>>,
    reject_with: Option<String>,
    accept_limit: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            reject_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn accepting_at_most(limit: usize) -> Self {
        Self {
            accept_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<SheetRow> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, rows: &[SheetRow]) -> Result<ExportResult, ExportError> {
        if let Some(message) = &self.reject_with {
            return Err(ExportError::Rejected(message.clone()));
        }

        let take = self.accept_limit.map_or(rows.len(), |limit| limit.min(rows.len()));
        let mut stored = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        stored.extend_from_slice(&rows[..take]);

        Ok(ExportResult { rows_written: take })
    }

    fn sink_name(&self) -> String {
        "memory".to_string()
    }
}
