use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected payload from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("Invalid consensus public key: {0}")]
    InvalidPubKey(String),
    #[error("Block height out of order: expected {expected}, got {got}")]
    HeightOutOfOrder { expected: u64, got: u64 },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("Block fetch task stopped")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, MonitorError>;
