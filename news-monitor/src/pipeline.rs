use crate::error::FetchError;
use crate::filter;
use crate::normalizer::normalize;
use crate::query::QueryExpression;
use crate::traits::{Clock, FeedFetch, SystemClock};
use crate::types::{FeedSource, NormalizedRecord, RawEntry, RunWarning, ENTRY_CAP};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_concurrent_fetches: usize,
    pub fetch_timeout: Duration,
    pub entry_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            fetch_timeout: Duration::from_secs(20),
            entry_cap: ENTRY_CAP,
        }
    }
}

/// Accepted records of one collection pass plus what went wrong on the way.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub records: Vec<NormalizedRecord>,
    pub warnings: Vec<RunWarning>,
    pub cancelled: bool,
}

enum SourceOutcome {
    Accepted(Vec<NormalizedRecord>),
    Failed(FetchError),
}

/// Fans fetches out over the sources and merges the results back in source
/// order, whatever order the fetches finish in.
pub struct AggregationPipeline {
    fetcher: Arc<dyn FeedFetch>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

impl AggregationPipeline {
    pub fn new(fetcher: Arc<dyn FeedFetch>, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub async fn collect(
        &self,
        sources: &[FeedSource],
        expr: Arc<QueryExpression>,
        cutoff: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> PipelineOutput {
        info!(
            "Collecting from {} sources (cutoff {}, up to {} at once)",
            sources.len(),
            cutoff,
            self.config.max_concurrent_fetches
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));
        let mut tasks = JoinSet::new();

        for (index, source) in sources.iter().cloned().enumerate() {
            let fetcher = self.fetcher.clone();
            let clock = self.clock.clone();
            let expr = expr.clone();
            let semaphore = semaphore.clone();
            let fetch_timeout = self.config.fetch_timeout;
            let entry_cap = self.config.entry_cap;

            tasks.spawn(async move {
                // the semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = match tokio::time::timeout(fetch_timeout, fetcher.fetch(&source)).await {
                    Ok(Ok(mut entries)) => {
                        entries.truncate(entry_cap);
                        let fetch_time = clock.now();
                        SourceOutcome::Accepted(filter_entries(&entries, &source.name, fetch_time, cutoff, &expr))
                    }
                    Ok(Err(e)) => SourceOutcome::Failed(e),
                    Err(_) => SourceOutcome::Failed(FetchError::Timeout(fetch_timeout)),
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<SourceOutcome>> = sources.iter().map(|_| None).collect();
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Collection cancelled with {} fetches in flight", tasks.len());
                    tasks.abort_all();
                    cancelled = true;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, outcome))) => slots[index] = Some(outcome),
                    Some(Err(e)) => error!("Source task ended abnormally: {}", e),
                    None => break,
                },
            }
        }

        let mut output = PipelineOutput {
            cancelled,
            ..Default::default()
        };

        for (source, slot) in sources.iter().zip(slots) {
            match slot {
                Some(SourceOutcome::Accepted(records)) => output.records.extend(records),
                Some(SourceOutcome::Failed(e)) => output.warnings.push(RunWarning::Source {
                    source_name: source.name.clone(),
                    message: e.to_string(),
                }),
                None if cancelled => output.warnings.push(RunWarning::Cancelled {
                    source_name: source.name.clone(),
                }),
                None => output.warnings.push(RunWarning::Source {
                    source_name: source.name.clone(),
                    message: "fetch task ended without a result".to_string(),
                }),
            }
        }

        info!(
            "Collected {} records, {} warnings{}",
            output.records.len(),
            output.warnings.len(),
            if cancelled { " (cancelled)" } else { "" }
        );
        output
    }
}

/// Normalizes one source's entries and keeps those inside the window that the
/// query accepts, in feed order. The cutoff is inclusive.
pub fn filter_entries(
    entries: &[RawEntry],
    source_name: &str,
    fetch_time: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    expr: &QueryExpression,
) -> Vec<NormalizedRecord> {
    let mut too_old = 0usize;

    let accepted: Vec<NormalizedRecord> = entries
        .iter()
        .map(|raw| normalize(raw, source_name, fetch_time))
        .filter(|record| {
            let fresh = record.timestamp >= cutoff;
            if !fresh {
                too_old += 1;
            }
            fresh
        })
        .filter_map(|record| filter::accept(expr, record))
        .collect();

    debug!(
        "{}: {} entries, {} older than cutoff, {} accepted",
        source_name,
        entries.len(),
        too_old,
        accepted.len()
    );
    accepted
}
