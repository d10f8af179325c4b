use thiserror::Error;

/// Main error type for the service instance logs client
#[derive(Debug, Error)]
pub enum SilError {
    // Transport errors: recent-batch failures and terminal stream errors
    #[error("{0}")]
    Transport(String),

    #[error("Failed to decode log record: {0}")]
    DeserializationError(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    // Endpoint errors
    #[error("Invalid logs endpoint: {0}")]
    EndpointFormat(String),

    // Errors from the service metadata lookup, passed through verbatim
    #[error("{0}")]
    UpstreamMetadata(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for log client operations
pub type Result<T> = std::result::Result<T, SilError>;

/// Substring carried by errors for a WebSocket close with code 1006
/// (connection dropped without a close frame).
pub const ABNORMAL_CLOSURE_MARKER: &str = "close 1006";

/// Whether an error describes an abnormal WebSocket closure.
///
/// Matching is textual so that errors from any transport which follow the
/// `websocket: close 1006 (abnormal closure)` convention are recognised.
pub fn is_abnormal_closure(err: &SilError) -> bool {
    err.to_string().contains(ABNORMAL_CLOSURE_MARKER)
}
