use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GdeltError {
    #[error("invalid date format '{0}', use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("max records must be a positive integer, got {0}")]
    InvalidMaxRecords(u64),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no BigQuery access token (set GOOGLE_OAUTH_ACCESS_TOKEN)")]
    MissingCredentials,

    #[error("BigQuery request failed: {0}")]
    WarehouseHttp(String),

    #[error("BigQuery returned status {status}: {message}")]
    WarehouseStatus { status: u16, message: String },

    #[error("unexpected BigQuery response: {0}")]
    WarehouseResponse(String),

    #[error("{dataset} result set has no column {column}")]
    MissingColumn {
        dataset: &'static str,
        column: &'static str,
    },

    #[error("cannot coerce {field} value {value:?}")]
    Coercion { field: &'static str, value: String },

    #[error("{table} record has {actual} values, expected {expected}")]
    RecordShape {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("sqlite error: {0}")]
    Storage(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl GdeltError {
    /// Process exit code: 1 input, 2 configuration, 3 warehouse, 4 storage.
    pub fn exit_code(&self) -> u8 {
        match self {
            GdeltError::InvalidDate(_) | GdeltError::InvalidMaxRecords(_) => 1,
            GdeltError::ConfigRead(_)
            | GdeltError::ConfigParse(_)
            | GdeltError::MissingCredentials => 2,
            GdeltError::WarehouseHttp(_)
            | GdeltError::WarehouseStatus { .. }
            | GdeltError::WarehouseResponse(_)
            | GdeltError::MissingColumn { .. }
            | GdeltError::Coercion { .. } => 3,
            GdeltError::Storage(_)
            | GdeltError::RecordShape { .. }
            | GdeltError::Filesystem(_) => 4,
        }
    }
}

impl From<rusqlite::Error> for GdeltError {
    fn from(err: rusqlite::Error) -> Self {
        GdeltError::Storage(err.to_string())
    }
}
