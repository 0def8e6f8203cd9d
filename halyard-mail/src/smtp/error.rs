//! Error types for the SMTP client.

use std::io;

use thiserror::Error;

/// Errors that can occur while talking to the SMTP relay.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse an SMTP response from the server.
    #[error("failed to parse SMTP response: {0}")]
    Parse(String),

    /// The server returned an error status code (4xx or 5xx).
    #[error("SMTP error: {code} - {message}")]
    Smtp { code: u16, message: String },

    /// The server returned a status code outside the standard ranges.
    #[error("unexpected SMTP status code: {code} - {message}")]
    UnexpectedResponse { code: u16, message: String },

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connection was closed unexpectedly.
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Specialized `Result` type for SMTP operations.
pub type Result<T> = std::result::Result<T, TransportError>;
