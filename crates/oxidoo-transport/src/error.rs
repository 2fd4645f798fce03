//! Transport error types.

use oxidoo_protocol::Fault;
use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents errors that can occur during a transport exchange.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to establish a connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to send the request.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Failed to receive or read the response.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Failed to serialize the request or deserialize the response.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// The exchange violated the protocol (unexpected status, bad envelope).
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The exchange did not complete within the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// The remote is temporarily unable to serve requests (HTTP 5xx).
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The transport was configured with invalid parameters.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// An underlying I/O error occurred.
    #[error("io error: {0}")]
    Io(String),

    /// The remote reported a fault inside a well-formed response.
    #[error("remote fault: {0}")]
    Remote(Fault),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}

impl From<TransportError> for Fault {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Remote(fault) => fault,
            TransportError::Timeout => Fault::timeout("transport exchange timed out"),
            TransportError::ConnectionFailed(msg)
            | TransportError::SendFailed(msg)
            | TransportError::ReceiveFailed(msg)
            | TransportError::Unavailable(msg)
            | TransportError::Io(msg) => Fault::transport(msg),
            TransportError::SerializationFailed(msg)
            | TransportError::ProtocolError(msg)
            | TransportError::ConfigurationError(msg)
            | TransportError::Internal(msg) => Fault::protocol(msg),
        }
    }
}
