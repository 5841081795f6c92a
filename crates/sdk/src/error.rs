//! SDK error types with recovery context.
//!
//! Provides a layered error model:
//! - **Construction errors**: Malformed configuration, readiness timeouts, cancellation
//! - **Broker errors**: gRPC status codes, split into transient and permanent
//! - **Client-side errors**: Certificate and benchmark decoding, invalid payloads, lifecycle misuse
//!
//! Every variant maps onto an [`ErrorKind`] so callers can branch on the category
//! without matching individual variants.

use std::path::PathBuf;

use snafu::{Location, Snafu};
use tonic::Code;

use crate::connection::ConnectionState;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types with context-rich error messages.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SdkError {
    /// Configuration validation error.
    #[snafu(display("Configuration error: {message}"))]
    Config {
        /// Error description.
        message: String,
    },

    /// The broker socket path cannot be used as a Unix socket address.
    #[snafu(display("Invalid socket path '{}': {message}", path.display()))]
    InvalidSocketPath {
        /// The rejected path.
        path: PathBuf,
        /// Why the path was rejected.
        message: String,
    },

    /// Failed to prepare or bind a local socket file (mock broker setup).
    ///
    /// Never produced by client calls, which report dial failures as `Transport`.
    #[snafu(display("Connection error at {location}: {message}"))]
    Connection {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Transport-level error (socket, HTTP/2).
    #[snafu(display("Transport error at {location}: {source}"))]
    Transport {
        /// Underlying transport error.
        source: tonic::transport::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// The connection did not become ready before the readiness deadline.
    #[snafu(display("Connection did not reach ready within {duration_ms}ms (last state: {state})"))]
    ReadinessTimeout {
        /// Readiness window in milliseconds.
        duration_ms: u64,
        /// Connection state observed when the deadline fired.
        state: ConnectionState,
    },

    /// Every readiness probe failed.
    #[snafu(display("Broker unreachable after {attempts} probe attempts: {source}"))]
    Unreachable {
        /// Number of probes issued.
        attempts: u32,
        /// Error from the final probe.
        source: Box<SdkError>,
    },

    /// The connection entered its terminal shutdown state while waiting for readiness.
    #[snafu(display("Connection shut down before it became ready"))]
    ConnectionShutdown,

    /// Operation timed out.
    #[snafu(display("Operation timed out after {duration_ms}ms"))]
    Timeout {
        /// Timeout duration in milliseconds.
        duration_ms: u64,
    },

    /// The caller's cancellation token fired.
    #[snafu(display("Operation cancelled"))]
    Cancelled,

    /// gRPC RPC error with status code.
    #[snafu(display("RPC error (code={code:?}): {message}"))]
    Rpc {
        /// gRPC status code.
        code: Code,
        /// Error message from the broker.
        message: String,
    },

    /// Retry attempts exhausted.
    #[snafu(display("Retry exhausted after {attempts} attempts: {last_error}"))]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error message before giving up.
        last_error: String,
    },

    /// The broker returned a certificate that is not valid base64.
    #[snafu(display("Failed to decode signed certificate: {source}"))]
    CertificateDecode {
        /// Underlying base64 error.
        source: base64::DecodeError,
    },

    /// The broker returned benchmark results that are not valid JSON.
    #[snafu(display("Failed to decode benchmark results: {source}"))]
    BenchmarkDecode {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The request payload was rejected before it was sent.
    #[snafu(display("Invalid payload: {message}"))]
    InvalidPayload {
        /// Error description.
        message: String,
    },

    /// The client has been closed.
    #[snafu(display("Client is closed"))]
    Closed,

    /// `close` was called on a client that never established a connection.
    #[snafu(display("Missing connection, nothing to close"))]
    NotConnected,
}

/// Broad error categories for callers that do not need variant-level detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed configuration; fatal and not retryable.
    Configuration,
    /// The transport could not be established or verified.
    Connectivity,
    /// A caller-supplied cancellation token fired.
    Cancellation,
    /// A retryable broker status, surfaced only once retries are exhausted.
    TransientBroker,
    /// A non-retryable broker status, surfaced unmodified.
    PermanentBroker,
    /// The broker's response could not be decoded.
    Decoding,
    /// The client was used after close, or closed without a connection.
    Lifecycle,
    /// The request was rejected client-side.
    InvalidInput,
}

impl SdkError {
    /// Returns true if the error is transient and the operation should be retried.
    ///
    /// Retryable errors:
    /// - `UNAVAILABLE`: Broker temporarily unreachable
    /// - `RESOURCE_EXHAUSTED`: Broker overloaded
    /// - `ABORTED`: Operation aborted (retry may succeed)
    /// - Transport errors and per-attempt timeouts
    ///
    /// Everything else, including `INVALID_ARGUMENT`, is returned to the caller
    /// after a single attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Timeout { .. } => true,
            Self::Rpc { code, .. } => is_retryable_code(*code),
            Self::Config { .. }
            | Self::InvalidSocketPath { .. }
            | Self::Connection { .. }
            | Self::ReadinessTimeout { .. }
            | Self::Unreachable { .. }
            | Self::ConnectionShutdown
            | Self::Cancelled
            | Self::RetryExhausted { .. }
            | Self::CertificateDecode { .. }
            | Self::BenchmarkDecode { .. }
            | Self::InvalidPayload { .. }
            | Self::Closed
            | Self::NotConnected => false,
        }
    }

    /// Returns the gRPC status code if this is an RPC error.
    #[must_use]
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns the category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::InvalidSocketPath { .. } => ErrorKind::Configuration,
            Self::Connection { .. }
            | Self::Transport { .. }
            | Self::ReadinessTimeout { .. }
            | Self::Unreachable { .. }
            | Self::ConnectionShutdown
            | Self::Timeout { .. } => ErrorKind::Connectivity,
            Self::Cancelled => ErrorKind::Cancellation,
            Self::Rpc { code, .. } if is_retryable_code(*code) => ErrorKind::TransientBroker,
            Self::Rpc { .. } => ErrorKind::PermanentBroker,
            Self::RetryExhausted { .. } => ErrorKind::TransientBroker,
            Self::CertificateDecode { .. } | Self::BenchmarkDecode { .. } => ErrorKind::Decoding,
            Self::Closed | Self::NotConnected => ErrorKind::Lifecycle,
            Self::InvalidPayload { .. } => ErrorKind::InvalidInput,
        }
    }
}

fn is_retryable_code(code: Code) -> bool {
    matches!(code, Code::Unavailable | Code::ResourceExhausted | Code::Aborted)
}

impl From<tonic::transport::Error> for SdkError {
    fn from(source: tonic::transport::Error) -> Self {
        Self::Transport { source, location: Location::default() }
    }
}

impl From<tonic::Status> for SdkError {
    fn from(status: tonic::Status) -> Self {
        Self::Rpc { code: status.code(), message: status.message().to_owned() }
    }
}
