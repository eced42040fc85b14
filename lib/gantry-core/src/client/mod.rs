//! HTTP client for the control-plane API under test.
//!
//! The client is deliberately thin: it knows the `/v1` prefix, attaches the
//! optional bearer credential, and exposes the handful of typed application
//! operations the harness needs for resource creation and cleanup. Domain
//! semantics of the control plane are out of scope.

use std::collections::HashMap;
use std::time::Duration;

use http::Method;
use serde::{Deserialize, Serialize};
use tracing::trace;

mod auth;
pub use self::auth::{Authentication, SecureString};

mod builder;
pub use self::builder::ApiClientBuilder;

mod error;
pub use self::error::ApiClientError;

/// How long a single liveness/readiness probe may take before it counts as a
/// failure. Keeps setup against an unreachable host failing fast.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// An application registered with the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    /// Unique application name.
    pub name: String,
}

/// Wire envelope used by the `/v1/apps` endpoints.
#[derive(Debug, Serialize, Deserialize)]
struct AppWrapper {
    app: App,
}

/// A route deployed under an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route path, unique within its application.
    pub path: String,
    /// Container image the route executes.
    pub image: String,
    /// Payload format.
    pub format: String,
    /// Invocation type.
    #[serde(rename = "type")]
    pub route_type: String,
    /// Memory limit in the control plane's units.
    pub memory: u64,
    /// Execution timeout in seconds.
    pub timeout: u32,
    /// Idle timeout in seconds.
    pub idle_timeout: u32,
    /// Route-level configuration map.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, String>,
    /// Route-level header map.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,
}

/// Wire envelope used by the `/v1/apps/{app}/routes` endpoints.
#[derive(Debug, Serialize, Deserialize)]
struct RouteWrapper {
    route: Route,
}

/// Client bound to a resolved `host:port` with optional bearer
/// authentication.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_uri: http::Uri,
    authentication: Option<Authentication>,
}

impl ApiClient {
    /// Starts building a client.
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Builds a client for a resolved host with an optional bearer
    /// credential.
    ///
    /// # Errors
    ///
    /// Fails only when the host cannot be assembled into a valid URI.
    pub fn for_host(host: &str, token: Option<&str>) -> Result<Self, ApiClientError> {
        let mut builder = Self::builder().with_authority(host);
        if let Some(token) = token {
            builder = builder.with_bearer_token(token);
        }
        builder.build()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_uri)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match &self.authentication {
            Some(authentication) => authentication.apply(request),
            None => request,
        }
    }

    /// Creates an application.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::UnexpectedStatusCode`] when the server
    /// rejects the creation, or a transport/deserialization error.
    pub async fn create_app(&self, name: &str) -> Result<App, ApiClientError> {
        let payload = AppWrapper {
            app: App {
                name: name.to_string(),
            },
        };
        let response = self
            .request(Method::POST, "/apps")
            .json(&payload)
            .send()
            .await?;
        let wrapper: AppWrapper = Self::expect_success(response, "/apps").await?;
        trace!(app = %wrapper.app.name, "created app");
        Ok(wrapper.app)
    }

    /// Creates a route under an application.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::UnexpectedStatusCode`] when the server
    /// rejects the creation, or a transport/deserialization error.
    pub async fn create_route(
        &self,
        app_name: &str,
        route: &Route,
    ) -> Result<Route, ApiClientError> {
        let path = format!("/apps/{app_name}/routes");
        let payload = RouteWrapper {
            route: route.clone(),
        };
        let response = self
            .request(Method::POST, &path)
            .json(&payload)
            .send()
            .await?;
        let wrapper: RouteWrapper = Self::expect_success(response, &path).await?;
        trace!(app = %app_name, route = %wrapper.route.path, "created route");
        Ok(wrapper.route)
    }

    /// Fetches an application by name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::AppNotFound`] for a 404 response.
    pub async fn get_app(&self, name: &str) -> Result<App, ApiClientError> {
        let path = format!("/apps/{name}");
        let response = self.request(Method::GET, &path).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiClientError::AppNotFound {
                name: name.to_string(),
            });
        }
        let wrapper: AppWrapper = Self::expect_success(response, &path).await?;
        Ok(wrapper.app)
    }

    /// Deletes an application by name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::AppNotFound`] for a 404 response, or
    /// [`ApiClientError::UnexpectedStatusCode`] for any other failure status.
    pub async fn delete_app(&self, name: &str) -> Result<(), ApiClientError> {
        let path = format!("/apps/{name}");
        let response = self.request(Method::DELETE, &path).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiClientError::AppNotFound {
                name: name.to_string(),
            });
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiClientError::UnexpectedStatusCode {
                status_code: status.as_u16(),
                path,
                body,
            });
        }
        trace!(app = %name, "deleted app");
        Ok(())
    }

    async fn expect_success<T>(response: reqwest::Response, path: &str) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiClientError::UnexpectedStatusCode {
                status_code: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }
        let body = response.text().await?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }
}

/// Probes the version endpoint of the service at `host`.
///
/// The endpoint lives at the server root (`http://<host>/version`), outside
/// the `/v1` prefix, so this is a free function rather than a client method.
/// Returns `true` only for a successful response within the probe timeout;
/// every failure mode (refused connection, timeout, error status) is `false`.
pub async fn probe_version(host: &str) -> bool {
    let url = format!("http://{host}/version");
    let probe = reqwest::Client::new()
        .get(&url)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await;
    match probe {
        Ok(response) => response.status().is_success(),
        Err(error) => {
            trace!(%url, %error, "version probe failed");
            false
        }
    }
}
