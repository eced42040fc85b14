use std::time::Duration;

use crate::client::ApiClientError;

/// Errors returned by harness-level operations.
///
/// Only recoverable conditions appear here; they are returned to the calling
/// test to assert against. Fatal environment conditions (malformed target
/// URL, unreachable remote host, readiness-watchdog expiry) abort the run
/// via documented panics instead, and cleanup-time deletion failures are
/// swallowed entirely.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum HarnessError {
    /// An API-client operation failed.
    ClientError(ApiClientError),

    /// Writing the response body into the caller's sink failed.
    IoError(std::io::Error),

    /// An environment-derived header name is not a valid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// An environment-derived header value is not a valid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// Issuing a request against a caller-constructed URL failed.
    #[from(ignore)]
    #[display("error running route {url}: {source}")]
    RequestFailed {
        /// The URL the request was issued against.
        url: String,
        /// The underlying transport error.
        source: reqwest::Error,
    },

    /// The harness deadline expired before the wrapped operation completed.
    #[from(ignore)]
    #[display("harness deadline of {timeout:?} exceeded")]
    DeadlineExceeded {
        /// The absolute timeout the harness was created with.
        timeout: Duration,
    },
}
