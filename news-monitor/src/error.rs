use std::time::Duration;

/// Failure to retrieve or decode one feed. Never fatal for a run: the
/// pipeline turns it into a per-source warning.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("feed size of {size_bytes} bytes exceeds limit of {limit_bytes} bytes")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Problems found while compiling a boolean query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryCompileError {
    #[error("query is empty")]
    Empty,

    #[error("operator {operator} at token {position} has no term to apply to")]
    DanglingOperator { operator: String, position: usize },

    #[error("term at token {position} is empty once quotes are removed")]
    EmptyTerm { position: usize },
}

/// The sink refused or could not take a batch. Records already gathered by
/// the run are kept regardless.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink rejected batch: {0}")]
    Rejected(String),

    #[error("export timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid run parameters: {0}")]
    InvalidParams(String),

    #[error("source registry error: {0}")]
    Registry(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
