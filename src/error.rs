// src/error.rs
// Error taxonomy for the bridge

use thiserror::Error;

/// Main error type for Bindilla
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The caller supplied an environ identifier that cannot be parsed
    #[error("invalid environ: {0}")]
    InvalidEnviron(String),

    /// The launch service refused the build request or could not be reached
    #[error("launch service error: {0}")]
    LaunchService(String),

    /// A `data` payload in the launch event stream was not valid JSON
    #[error("stream decode error: {0}")]
    StreamDecode(String),

    #[error("unknown launch: {0}")]
    UnknownLaunch(String),

    /// The launched container could not be reached
    #[error("target error: {0}")]
    Target(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Short machine-readable kind, used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::InvalidEnviron(_) => "invalid_environ",
            BridgeError::LaunchService(_) => "launch_service",
            BridgeError::StreamDecode(_) => "stream_decode",
            BridgeError::UnknownLaunch(_) => "unknown_launch",
            BridgeError::Target(_) => "target",
            BridgeError::Config(_) => "config",
            BridgeError::Io(_) => "io",
        }
    }

    /// Whether the caller is at fault (as opposed to an upstream or local failure)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidEnviron(_) | BridgeError::UnknownLaunch(_)
        )
    }
}
