//! Error handling for ledgerbus
//!
//! Provides error types for the layers of the message bus:
//! - Connection errors (remote binding and handshake)
//! - Configuration errors (settings loading and validation)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Connection error type
///
/// Represents failures while binding a bus to a remote peer, including
/// contract violations by the caller and handshake timeouts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// No connector has been installed on the bus
    #[error("No remote connector configured for bus '{bus}'")]
    NoConnector {
        /// The name of the bus.
        bus: String,
    },

    /// Nothing is listening at the endpoint
    #[error("Connection refused by {host}:{port}")]
    Refused {
        /// The remote host.
        host: String,
        /// The remote port.
        port: u16,
    },

    /// The remote peer rejected the credential
    #[error("Authentication failed for {host}:{port}")]
    AuthenticationFailed {
        /// The remote host.
        host: String,
        /// The remote port.
        port: u16,
    },

    /// The remote peer never supplied its identity metadata
    #[error("Handshake timed out after {timeout_ms}ms")]
    HandshakeTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Operation requires a connected transport
    #[error("Transport not connected")]
    NotConnected,

    /// Connection lost
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// A setting holds a value outside its valid range
    #[error("Invalid value for {setting}: {reason}")]
    InvalidValue {
        /// The offending setting.
        setting: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// File format could not be determined or parsed
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// The file being parsed.
        path: String,
        /// The parser message.
        reason: String,
    },
}

/// Main error type for ledgerbus
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::HandshakeTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if the caller passed arguments that can never succeed
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::InvalidParameters { .. })
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
