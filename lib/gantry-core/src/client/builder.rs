use http::Uri;

use super::{ApiClient, ApiClientError, Authentication, SecureString};
use crate::config::DEFAULT_HOST;

/// Fixed API path prefix; every versioned resource operation lives under it.
pub(crate) const BASE_PATH: &str = "/v1";

/// Builder for [`ApiClient`] instances.
///
/// The client always speaks plain HTTP at the fixed `/v1` prefix; the
/// harness never talks to a TLS endpoint, and transport security is out of
/// scope here. Construction is pure: no network I/O happens until a request
/// is issued.
///
/// # Example
///
/// ```rust
/// use gantry_core::ApiClient;
///
/// # fn example() -> Result<(), gantry_core::ApiClientError> {
/// let client = ApiClient::builder()
///     .with_authority("localhost:8080")
///     .with_bearer_token("secret")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    client: reqwest::Client,
    authority: String,
    authentication: Option<Authentication>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            authority: DEFAULT_HOST.to_string(),
            authentication: None,
        }
    }
}

impl ApiClientBuilder {
    /// Sets the `host:port` authority the client is bound to.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Attaches a bearer credential as the default authentication for every
    /// request issued by the client.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<SecureString>) -> Self {
        self.authentication = Some(Authentication::Bearer(token.into()));
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails only when the authority cannot be assembled into a valid URI.
    pub fn build(self) -> Result<ApiClient, ApiClientError> {
        let Self {
            client,
            authority,
            authentication,
        } = self;

        let base_uri = Uri::builder()
            .scheme("http")
            .authority(authority)
            .path_and_query(BASE_PATH)
            .build()?;

        Ok(ApiClient {
            client,
            base_uri,
            authentication,
        })
    }
}
