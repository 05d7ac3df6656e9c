//! Error types for profile service operations.

use std::io;

/// Alias for `Result<T, mcinstall::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Status code of a successful operation.
pub const STATUS_SUCCESS: i32 = 0;

/// Status code recorded while an operation is in flight or unclassified.
pub const STATUS_UNKNOWN: i32 = -256;

/// Status code reported by [`last_status`](crate::ProfileClient::last_status)
/// once the client has been released.
pub const STATUS_RELEASED: i32 = -1;

/// Errors returned by profile service operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller violated the API contract; nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The channel failed to send or receive.
    #[error("connection failed: {0}")]
    ConnectionFailed(io::Error),

    /// The response violated the wire contract.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The device understood the request and declined it.
    #[error("request failed with status {status:?}{}", render_diagnostics(.diagnostics))]
    RequestFailed {
        /// The `Status` value the device answered with.
        status: String,
        /// Localized descriptions from the error chain, in device order.
        diagnostics: Vec<String>,
    },

    /// The channel reported a failure this layer does not recognize.
    #[error("unknown error: {0}")]
    Unknown(io::Error),
}

impl Error {
    /// Numeric status code of this error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => -1,
            Self::MalformedResponse(_) => -2,
            Self::ConnectionFailed(_) => -3,
            Self::RequestFailed { .. } => -4,
            Self::Unknown(_) => STATUS_UNKNOWN,
        }
    }

    /// Diagnostics extracted from the device's error chain, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::RequestFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData => Self::MalformedResponse(err.to_string()),
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NotConnected
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WriteZero => Self::ConnectionFailed(err),
            _ => Self::Unknown(err),
        }
    }
}

/// Suffix appended to the [`Error::RequestFailed`] message.
fn render_diagnostics(diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(": {}", diagnostics.join("; "))
    }
}
