use url::Url;

/// Address the harness targets when no API URL is configured.
///
/// A harness pointed at this host will bootstrap an embedded service on
/// demand; any other host is treated as a pre-existing remote deployment.
pub const DEFAULT_HOST: &str = "localhost:8080";

const ENV_API_URL: &str = "GANTRY_API_URL";
const ENV_TOKEN: &str = "GANTRY_TOKEN";
const ENV_DB_URL: &str = "GANTRY_DB_URL";

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Harness configuration, normally read from the environment.
///
/// All fields are optional; a default-constructed `Config` targets the local
/// default address with no credential. Tests that need a specific target
/// should build the value explicitly instead of mutating the process
/// environment.
///
/// # Environment variables
///
/// - `GANTRY_API_URL`: target control-plane API URL
/// - `GANTRY_TOKEN`: optional bearer credential
/// - `GANTRY_DB_URL`: metadata-store override, consumed only by the
///   embedded-service bootstrap
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Target API URL; `http://localhost:8080` when absent.
    pub api_url: Option<String>,
    /// Optional bearer credential attached to every client request.
    pub token: Option<String>,
    /// Optional metadata-store URL override for the embedded service.
    pub db_url: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var(ENV_API_URL).ok(),
            token: std::env::var(ENV_TOKEN).ok(),
            db_url: std::env::var(ENV_DB_URL).ok(),
        }
    }

    /// Resolves the `host:port` authority of the configured API URL.
    ///
    /// # Panics
    ///
    /// Panics when the configured URL is not syntactically valid. A malformed
    /// target is an operator-configuration error with no derivable fallback,
    /// so it aborts the whole test run rather than a single test.
    #[must_use]
    pub fn resolve_host(&self) -> String {
        let api_url = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let url = Url::parse(api_url)
            .unwrap_or_else(|error| panic!("couldn't parse API URL {api_url:?}: {error}"));
        let host = url
            .host_str()
            .unwrap_or_else(|| panic!("API URL {api_url:?} has no host"));
        match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}
