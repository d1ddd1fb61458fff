//! Error types for Drishti IO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Drishti IO error types
///
/// Only setup failures surface as `Error`. Send and acquisition failures
/// inside the stream loop are handled and logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Bind address did not resolve to a socket address
    #[error("Address resolution failed: {0}")]
    AddressResolution(String),

    /// Socket creation or bind failed
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address that was requested
        address: String,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Frame source type named in config is not known
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Frame source could not be set up
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
