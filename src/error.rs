use thiserror::Error;

/// Pointing monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Malformed telemetry frame: {0}")]
    MalformedFrame(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Report export failed: {0}")]
    Report(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for monitor operations
pub type MResult<T> = Result<T, MonitorError>;

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::MalformedFrame(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for MonitorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MonitorError::Connection(err.to_string())
    }
}
