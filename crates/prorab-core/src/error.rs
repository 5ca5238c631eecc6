use thiserror::Error;

/// Top-level error type for Prorab.
#[derive(Debug, Error)]
pub enum ProrabError {
    /// Missing or invalid configuration. Halts the affected feature only.
    #[error("config error: {0}")]
    Config(String),

    /// IAM token exchange failed.
    #[error("auth error: {0}")]
    Auth(String),

    /// The completion endpoint failed or returned garbage.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from the messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
