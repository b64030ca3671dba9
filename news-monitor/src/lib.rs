pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod monitor;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod traits;
pub mod types;

pub use config::MonitorConfig;
pub use error::{ExportError, FetchError, MonitorError, QueryCompileError, Result};
pub use export::{ExportSink, JsonlSink, MemorySink, PgSink};
pub use fetcher::Fetcher;
pub use monitor::NewsMonitor;
pub use normalizer::normalize;
pub use parser::FeedParser;
pub use pipeline::{AggregationPipeline, PipelineConfig, PipelineOutput};
pub use query::QueryExpression;
pub use registry::{JsonFileRegistry, StaticRegistry};
pub use traits::{Clock, FeedFetch, FixedClock, RecordSink, SourceRegistry, SystemClock};
pub use types::*;
