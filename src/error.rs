//! Error types shared by the signer, the client and the transport

use thiserror::Error;

/// Errors raised before or while executing a storage request.
///
/// A response with a non-2xx status is not an error: it comes back as a
/// [`RequestOutcome`](crate::oci::RequestOutcome) with `success == false`.
#[derive(Error, Debug)]
pub enum OciError {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The private key could not be read or parsed
    #[error("Key load error: {0}")]
    KeyLoad(String),

    /// A caller-supplied argument was rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// The RSA signing operation failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// DNS, connect, TLS, timeout or redirect failure
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OciError {
    /// Whether this error was raised by the client before any network I/O.
    pub fn is_local(&self) -> bool {
        !matches!(self, OciError::Transport(_))
    }
}

impl From<hyper_util::client::legacy::Error> for OciError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        OciError::Transport(format!("Client error: {}", err))
    }
}

impl From<hyper::Error> for OciError {
    fn from(err: hyper::Error) -> Self {
        OciError::Transport(format!("Body error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, OciError>;
