use thiserror::Error;

/// Failure talking to the backend, either while submitting a batch or polling.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Short text suitable for a notification line.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Network(e) if e.is_timeout() => "Request timed out".to_string(),
            TransportError::Network(e) if e.is_connect() => "Cannot connect to server".to_string(),
            TransportError::Network(_) => "Network error".to_string(),
            TransportError::Rejected { message, .. } => message.clone(),
            TransportError::Decode(_) => "Unexpected server response".to_string(),
            TransportError::Io(e) => e.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Batch contains no files")]
    EmptyBatch,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Polling cadence `polling.{0}` must be at least 1 second")]
    ZeroCadence(&'static str),
}
