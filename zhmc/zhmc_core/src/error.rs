//! Error types for the zhmc reconciliation modules.
//!
//! The root error type, `Error`, distinguishes the errors a module reports
//! back to its caller as a plain failure message (parameter problems, bad
//! resource status, client library errors) from unexpected internal errors,
//! which are reported with their full diagnostic detail.
//!
//! Errors raised by an `HmcClient` implementation are expressed as
//! `ClientError` and wrapped by the root error type.

use thiserror::Error;

/// Root error type for the zhmc modules.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent module input parameters.
    #[error("{0}")]
    Parameter(String),

    /// A resource is in a bad status or failed a status transition.
    #[error("{0}")]
    Status(String),

    /// An image file (e.g. an ISO image) could not be processed.
    #[error("{0}")]
    Image(String),

    /// The HMC or CPC does not support the requested function.
    #[error("{0}")]
    Version(String),

    /// The desired state cannot be reached with the given resources
    /// (e.g. not enough attachable crypto adapters).
    #[error("{0}")]
    Failed(String),

    /// Errors returned by the HMC client.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Internal inconsistency (an assertion that did not hold).
    #[error("Unexpected: {0}")]
    Unexpected(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors returned by an HMC client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No resource matched the lookup.
    #[error("Could not find {class} {filter}")]
    NotFound {
        /// Resource class that was searched.
        class: String,
        /// Description of the search filter.
        filter: String,
    },

    /// More than one resource matched a lookup that must be unique.
    #[error("Found more than one {class} {filter}")]
    NoUniqueMatch {
        /// Resource class that was searched.
        class: String,
        /// Description of the search filter.
        filter: String,
    },

    /// The HMC returned an HTTP error status.
    #[error("{status},{reason}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// HMC reason code.
        reason: u16,
        /// Error message returned by the HMC.
        message: String,
    },

    /// Authentication with the HMC failed.
    #[error("{0}")]
    ClientAuth(String),

    /// The HMC could not be reached.
    #[error("{0}")]
    Connection(String),

    /// An asynchronous HMC operation did not complete in time.
    #[error("{0}")]
    OperationTimeout(String),

    /// A resource did not reach the desired status in time.
    #[error("{0}")]
    StatusTimeout(String),

    /// A notification channel was closed.
    #[error("{0}")]
    ChannelClosed(String),
}

impl ClientError {
    /// Create an HTTP error.
    pub fn http(status: u16, reason: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            reason,
            message: message.into(),
        }
    }

    /// Check whether this is an HTTP error with the given status and reason.
    pub fn is_http(&self, status: u16, reason: u16) -> bool {
        matches!(self, Self::Http { status: s, reason: r, .. } if *s == status && *r == reason)
    }

    /// Name of the error class, as reported in module failure messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::NoUniqueMatch { .. } => "NoUniqueMatch",
            Self::Http { .. } => "HTTPError",
            Self::ClientAuth(_) => "ClientAuthError",
            Self::Connection(_) => "ConnectionError",
            Self::OperationTimeout(_) => "OperationTimeout",
            Self::StatusTimeout(_) => "StatusTimeout",
            Self::ChannelClosed(_) => "NotificationError",
        }
    }
}

/// Coarse classification of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid module input.
    Parameter,
    /// Bad resource status.
    Status,
    /// The desired state cannot be reached.
    Failed,
    /// Error reported by the client library.
    ClientLibrary,
    /// Anything else; reported with full diagnostics.
    Unexpected,
}

impl Error {
    /// Create a parameter error.
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::Parameter(msg.into())
    }

    /// Create a status error.
    pub fn status(msg: impl Into<String>) -> Self {
        Self::Status(msg.into())
    }

    /// Create an error for a desired state that cannot be reached.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create an unexpected (internal assertion) error.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parameter(_) | Self::Image(_) | Self::Version(_) => ErrorKind::Parameter,
            Self::Status(_) => ErrorKind::Status,
            Self::Failed(_) => ErrorKind::Failed,
            Self::Client(_) => ErrorKind::ClientLibrary,
            Self::Unexpected(_) | Self::Io(_) | Self::Serialization(_) | Self::Config(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Whether this error is reported as a plain failure message.
    ///
    /// # Returns
    ///
    /// `false` for unexpected errors, which are reported with full detail.
    pub fn is_handled(&self) -> bool {
        self.kind() != ErrorKind::Unexpected
    }

    /// Name of the error class, as reported in module failure messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Parameter(_) => "ParameterError",
            Self::Status(_) => "StatusError",
            Self::Image(_) => "ImageError",
            Self::Version(_) => "VersionError",
            Self::Failed(_) => "Error",
            Self::Client(e) => e.class_name(),
            Self::Unexpected(_) => "AssertionError",
            Self::Io(_) => "IOError",
            Self::Serialization(_) => "SerializationError",
            Self::Config(_) => "ConfigError",
        }
    }

    /// The failure message reported by a module: `"<ClassName>: <message>"`.
    pub fn failure_message(&self) -> String {
        format!("{}: {}", self.class_name(), self)
    }

    /// Check whether this error is a client "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Client(ClientError::NotFound { .. }))
    }

    /// Check whether this is an HTTP error with the given status and reason.
    pub fn is_http(&self, status: u16, reason: u16) -> bool {
        matches!(self, Self::Client(e) if e.is_http(status, reason))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type used throughout the zhmc crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_uses_class_name() {
        let err = Error::parameter("Property 'foo' is not allowed");
        assert_eq!(
            err.failure_message(),
            "ParameterError: Property 'foo' is not allowed"
        );

        let err: Error = ClientError::http(409, 1, "partition is active").into();
        assert_eq!(err.failure_message(), "HTTPError: 409,1: partition is active");
        assert_eq!(err.kind(), ErrorKind::ClientLibrary);
    }

    #[test]
    fn test_unexpected_errors_are_not_handled() {
        assert!(!Error::unexpected("loop exhausted").is_handled());
        assert!(Error::status("bad status").is_handled());
        assert!(Error::Image("cannot read".into()).is_handled());
        let err = Error::failed("not enough adapters");
        assert!(err.is_handled());
        assert_eq!(err.failure_message(), "Error: not enough adapters");
    }

    #[test]
    fn test_http_matching() {
        let err: Error = ClientError::http(400, 356, "already at level").into();
        assert!(err.is_http(400, 356));
        assert!(!err.is_http(400, 0));
        assert!(!err.is_not_found());
    }
}
