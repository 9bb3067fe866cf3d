use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use parquet::errors::ParquetError;
use thiserror::Error;
use url::ParseError;

pub mod config;
pub mod logging;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    /// Input prefix cannot be listed. Fatal: the run stops before any write.
    #[error("Source unavailable at {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// A single unparseable line. Callers skip it and count it.
    #[error("Malformed record in {path} at line {line}: {reason}")]
    MalformedRecord {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Failed to write table {table}: {reason}")]
    DestinationWrite { table: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid Uri: {0}")]
    InvalidUri(String),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidUri(format!("URL parse error: {}", err))
    }
}
