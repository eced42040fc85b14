/// Errors that can occur when using the [`ApiClient`](super::ApiClient).
///
/// All variants implement `std::error::Error` and carry enough context for
/// the calling test to assert against. Fatal environment conditions
/// (malformed target URL, unreachable remote host) are not represented here;
/// those abort the run instead of surfacing as values.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// HTTP transport error from the underlying reqwest library.
    ReqwestError(reqwest::Error),

    /// HTTP protocol error, e.g. while assembling the base URI.
    HttpError(http::Error),

    /// JSON serialization/deserialization error for request or response
    /// payloads.
    JsonError(serde_json::Error),

    /// The server answered with a status code outside the expected range.
    #[from(ignore)]
    #[display("unexpected status code {status_code} for {path}: {body}")]
    UnexpectedStatusCode {
        /// The HTTP status code received.
        status_code: u16,
        /// The request path that produced it.
        path: String,
        /// The response body, kept for debugging.
        body: String,
    },

    /// The requested application does not exist.
    #[from(ignore)]
    #[display("application not found: {name}")]
    AppNotFound {
        /// Name of the missing application.
        name: String,
    },
}

impl ApiClientError {
    /// Whether this error is a not-found response.
    ///
    /// Cleanup paths use this to distinguish an already-absent resource from
    /// a real failure, although both are ultimately swallowed there.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AppNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ApiClientError>();
        assert_sync::<ApiClientError>();
    }

    #[test]
    fn test_unexpected_status_code_display() {
        let error = ApiClientError::UnexpectedStatusCode {
            status_code: 500,
            path: "/v1/apps".to_string(),
            body: "boom".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "unexpected status code 500 for /v1/apps: boom"
        );
    }

    #[test]
    fn test_not_found_classification() {
        let missing = ApiClientError::AppNotFound {
            name: "ghost".to_string(),
        };
        assert!(missing.is_not_found());

        let other = ApiClientError::UnexpectedStatusCode {
            status_code: 409,
            path: "/v1/apps".to_string(),
            body: String::new(),
        };
        assert!(!other.is_not_found());
    }
}
