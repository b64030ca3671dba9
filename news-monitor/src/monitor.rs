use crate::config::MonitorConfig;
use crate::error::Result;
use crate::export::ExportSink;
use crate::pipeline::AggregationPipeline;
use crate::query::QueryExpression;
use crate::traits::{Clock, FeedFetch, RecordSink, SourceRegistry};
use crate::types::{ExportBatch, ExportStatus, NormalizedRecord, RunParams, RunReport, RunRequest, RunWarning};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Runs the whole search once per call: sources, query, collection, export.
pub struct NewsMonitor {
    config: MonitorConfig,
    registry: Arc<dyn SourceRegistry>,
    pipeline: AggregationPipeline,
    exporter: Option<ExportSink>,
}

impl NewsMonitor {
    pub fn new(config: MonitorConfig, registry: Arc<dyn SourceRegistry>, fetcher: Arc<dyn FeedFetch>) -> Result<Self> {
        config.validate()?;
        let pipeline = AggregationPipeline::new(fetcher, config.pipeline_config());
        Ok(Self {
            config,
            registry,
            pipeline,
            exporter: None,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.exporter = Some(ExportSink::new(sink, self.config.export_timeout()));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.pipeline = self.pipeline.with_clock(clock);
        self
    }

    /// Only invalid run parameters fail; every other problem ends up as a
    /// warning or an export status in the report.
    pub async fn run(&self, request: &RunRequest, cancel: &CancellationToken) -> Result<RunReport> {
        let params = RunParams::resolve(request, &self.config.default_query)?;
        let run_id = Uuid::new_v4();
        let started_at = self.pipeline.clock().now();
        let cutoff = params.cutoff(started_at);

        info!(
            "Run {} started: window {} days, query {:?}",
            run_id, params.window_days, params.query
        );

        let mut warnings = Vec::new();

        let (expr, compile_error) = QueryExpression::compile(&params.query);
        if let Some(e) = compile_error {
            warnings.push(RunWarning::Query { message: e.to_string() });
        }

        let sources = match self.registry.list_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                error!("Could not list sources: {}", e);
                warnings.push(RunWarning::Registry { message: e.to_string() });
                Vec::new()
            }
        };

        let output = self.pipeline.collect(&sources, Arc::new(expr), cutoff, cancel).await;
        warnings.extend(output.warnings);

        let export = if output.cancelled {
            ExportStatus::NotAttempted
        } else {
            self.export(&output.records).await
        };

        info!(
            "Run {} finished: {} records, {} warnings",
            run_id,
            output.records.len(),
            warnings.len()
        );

        Ok(RunReport {
            run_id,
            started_at,
            cutoff,
            query: params.query,
            records: output.records,
            warnings,
            export,
            cancelled: output.cancelled,
        })
    }

    async fn export(&self, records: &[NormalizedRecord]) -> ExportStatus {
        let exporter = match &self.exporter {
            Some(exporter) if !records.is_empty() => exporter,
            _ => return ExportStatus::NotAttempted,
        };

        let batch = ExportBatch::new(records);
        match exporter.export(&batch).await {
            Ok(result) => ExportStatus::Written {
                rows_sent: batch.len(),
                rows_written: result.rows_written,
            },
            Err(e) => {
                warn!("Results kept in memory; export failed: {}", e);
                ExportStatus::Failed { message: e.to_string() }
            }
        }
    }
}
