//! Error types for the headcount report job.

/// Top-level error type for a report run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Spreadsheet fetch failures. Every variant aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Spreadsheet request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Spreadsheet API returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Spreadsheet authentication failed: {0}")]
    Auth(String),

    #[error("Invalid response from spreadsheet API: {0}")]
    InvalidResponse(String),

    #[error("Spreadsheet {spreadsheet_id} has no sheets")]
    NoSheets { spreadsheet_id: String },

    #[error("Sheet named {name:?} not found in spreadsheet {spreadsheet_id}")]
    SheetNotFound {
        spreadsheet_id: String,
        name: String,
    },
}

/// Transform failures. Malformed cells never surface here, and the runner
/// turns `EmptyInput` into a clean stop.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Nothing to report: table has {rows} row(s), need a header and at least one data row")]
    EmptyInput { rows: usize },
}

/// Mail delivery failures. Every variant aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid {field} address {address:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        reason: String,
    },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP transport to {host}:{port} failed: {reason}")]
    Transport {
        host: String,
        port: u16,
        reason: String,
    },
}

/// Result type alias for the report job.
pub type Result<T> = std::result::Result<T, Error>;
