//! Per-test harness: scoped deadline, API client, unique resource names, and
//! automatic cleanup of everything a test created.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::bootstrap::{BootstrapHandle, BootstrapRegistry, ServiceLauncher};
use crate::client::{ApiClient, App, Route, probe_version};
use crate::config::{Config, DEFAULT_HOST};
use crate::error::HarnessError;
use crate::random::rand_string;

/// Absolute deadline applied to every harness from the moment of setup.
pub const HARNESS_TIMEOUT: Duration = Duration::from_secs(60);

const APP_NAME_PREFIX: &str = "gantryapp";
const ROUTE_PATH_PREFIX: &str = "/gantryroute";
const DEFAULT_IMAGE: &str = "gantry/hello";
const NAME_SUFFIX_LEN: usize = 10;

pub(crate) fn fresh_app_name() -> String {
    format!("{APP_NAME_PREFIX}{}", rand_string(NAME_SUFFIX_LEN))
}

pub(crate) fn fresh_route_path() -> String {
    format!("{ROUTE_PATH_PREFIX}{}", rand_string(NAME_SUFFIX_LEN))
}

/// Record of the resources a test created, used to reverse those creations
/// during cleanup.
///
/// Owned exclusively by one [`TestHarness`]; never shared between tests.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    apps: HashSet<String>,
}

impl ResourceTracker {
    /// Records a created application identifier.
    pub fn record_app(&mut self, name: impl Into<String>) {
        self.apps.insert(name.into());
    }

    /// Whether `name` is currently tracked.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains(name)
    }

    /// Whether anything is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Removes and returns every tracked identifier.
    pub fn drain(&mut self) -> Vec<String> {
        self.apps.drain().collect()
    }
}

/// Per-test bundle of deadline, pre-configured client, default resource
/// descriptors, and resource bookkeeping.
///
/// Each test case should set up its own harness; the value is mutated only by
/// the owning test and is not meant for concurrent use from multiple tasks.
/// Setup lazily bootstraps an embedded service when the target is the local
/// default address and nothing answers there.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use gantry_core::{LaunchSpec, ServiceLauncher, TestHarness};
///
/// #[derive(Debug)]
/// struct EmbeddedControlPlane;
///
/// impl ServiceLauncher for EmbeddedControlPlane {
///     async fn launch(&self, spec: LaunchSpec) {
///         // start the full in-process service against spec.db_url / spec.queue_url
///     }
/// }
///
/// # async fn example() -> Result<(), gantry_core::HarnessError> {
/// let mut harness = TestHarness::setup(Arc::new(EmbeddedControlPlane)).await;
/// let app = harness.create_app().await?;
/// // ... exercise the API ...
/// harness.cleanup().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TestHarness {
    /// Client bound to the resolved target, credential attached if present.
    pub client: ApiClient,
    /// Unique application name for this test (`gantryapp` + random suffix).
    pub app_name: String,
    /// Unique route path for this test (`/gantryroute` + random suffix).
    pub route_path: String,
    /// Container image routes are created from.
    pub image: String,
    /// Payload format routes are created with.
    pub format: String,
    /// Invocation type routes are created with.
    pub route_type: String,
    /// Memory limit in the control plane's units.
    pub memory: u64,
    /// Route execution timeout in seconds.
    pub timeout_secs: u32,
    /// Route idle timeout in seconds.
    pub idle_timeout_secs: u32,
    /// Route-level configuration map.
    pub route_config: HashMap<String, String>,
    /// Route-level header map.
    pub route_headers: HashMap<String, Vec<String>>,

    timeout: Duration,
    deadline: Instant,
    tracker: ResourceTracker,
    bootstrap: Option<BootstrapHandle>,
}

impl TestHarness {
    /// Sets up a harness against the environment-configured target, using the
    /// process-wide bootstrap registry.
    ///
    /// # Panics
    ///
    /// Panics on fatal environment conditions: a malformed configured URL, an
    /// unreachable non-default target (no embedded fallback exists for a
    /// remote host), or readiness-watchdog expiry during bootstrap.
    pub async fn setup<L>(launcher: Arc<L>) -> Self
    where
        L: ServiceLauncher + Send + Sync + 'static,
    {
        Self::setup_with(&Config::from_env(), BootstrapRegistry::global(), launcher).await
    }

    /// Sets up a harness with explicit configuration and bootstrap registry.
    ///
    /// This is the injectable entry point: tests of the harness itself pass a
    /// private registry and a synthetic config instead of touching process
    /// state.
    ///
    /// # Panics
    ///
    /// Same fatal conditions as [`setup`](Self::setup).
    pub async fn setup_with<L>(
        config: &Config,
        registry: &BootstrapRegistry,
        launcher: Arc<L>,
    ) -> Self
    where
        L: ServiceLauncher + Send + Sync + 'static,
    {
        let deadline = Instant::now() + HARNESS_TIMEOUT;
        let host = config.resolve_host();
        let client = match ApiClient::for_host(&host, config.token.as_deref()) {
            Ok(client) => client,
            Err(error) => panic!("couldn't build API client for {host}: {error}"),
        };

        let mut harness = Self {
            client,
            app_name: fresh_app_name(),
            route_path: fresh_route_path(),
            image: DEFAULT_IMAGE.to_string(),
            format: "default".to_string(),
            route_type: "async".to_string(),
            memory: 256,
            timeout_secs: 30,
            idle_timeout_secs: 30,
            route_config: HashMap::new(),
            route_headers: HashMap::new(),
            timeout: HARNESS_TIMEOUT,
            deadline,
            tracker: ResourceTracker::default(),
            bootstrap: None,
        };

        if !probe_version(&host).await {
            assert!(
                host == DEFAULT_HOST,
                "cannot reach remote control-plane API at {host}"
            );
            debug!(%host, "local default target unreachable, bootstrapping embedded service");
            let handle = registry
                .ensure_started(launcher, &host, config.db_url.as_deref())
                .await;
            harness.bootstrap = Some(handle);
        }

        harness
    }

    /// The absolute deadline of this harness.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Runs a future under the harness deadline.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::DeadlineExceeded`] when the deadline expires
    /// before the future completes.
    pub async fn bounded<F, T>(&self, future: F) -> Result<T, HarnessError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.deadline, future)
            .await
            .map_err(|_elapsed| HarnessError::DeadlineExceeded {
                timeout: self.timeout,
            })
    }

    /// Read-only view of the tracked resources.
    #[must_use]
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Records an application this test created outside the harness helpers,
    /// so cleanup will delete it too.
    pub fn record_app(&mut self, name: impl Into<String>) {
        self.tracker.record_app(name);
    }

    /// Creates the harness's default application and tracks it for cleanup.
    ///
    /// # Errors
    ///
    /// Returns the underlying client error, or
    /// [`HarnessError::DeadlineExceeded`] past the harness deadline. The
    /// identifier is registered only once creation succeeded.
    pub async fn create_app(&mut self) -> Result<App, HarnessError> {
        let name = self.app_name.clone();
        self.create_app_named(&name).await
    }

    /// Creates an application with an explicit name and tracks it for
    /// cleanup.
    ///
    /// # Errors
    ///
    /// Same conditions as [`create_app`](Self::create_app).
    pub async fn create_app_named(&mut self, name: &str) -> Result<App, HarnessError> {
        let created = self.bounded(self.client.create_app(name)).await??;
        self.tracker.record_app(&created.name);
        Ok(created)
    }

    /// The route this harness would create, assembled from its current
    /// descriptor fields.
    #[must_use]
    pub fn route_descriptor(&self) -> Route {
        Route {
            path: self.route_path.clone(),
            image: self.image.clone(),
            format: self.format.clone(),
            route_type: self.route_type.clone(),
            memory: self.memory,
            timeout: self.timeout_secs,
            idle_timeout: self.idle_timeout_secs,
            config: self.route_config.clone(),
            headers: self.route_headers.clone(),
        }
    }

    /// Creates the harness's default route under its default application and
    /// tracks the owning application for cleanup.
    ///
    /// The descriptor fields (`route_path`, `image`, `format`, `route_type`,
    /// `memory`, `timeout_secs`, `idle_timeout_secs`, `route_config`,
    /// `route_headers`) can be adjusted before calling this; they are read at
    /// call time.
    ///
    /// # Errors
    ///
    /// Returns the underlying client error, or
    /// [`HarnessError::DeadlineExceeded`] past the harness deadline. The
    /// owning application is registered only once creation succeeded.
    pub async fn create_route(&mut self) -> Result<Route, HarnessError> {
        let app = self.app_name.clone();
        let route = self.route_descriptor();
        let created = self.bounded(self.client.create_route(&app, &route)).await??;
        self.tracker.record_app(&app);
        Ok(created)
    }

    /// Deletes every tracked resource, best effort.
    ///
    /// Runs on fresh, unbounded calls, since cleanup must still work after the
    /// test's own deadline has passed. A resource that is already gone, or a
    /// transient deletion failure, is logged and swallowed: failed cleanup
    /// must never fail the test.
    pub async fn cleanup(&mut self) {
        for app in self.tracker.drain() {
            match self.client.delete_app(&app).await {
                Ok(()) => debug!(%app, "cleaned up app"),
                Err(error) => warn!(%app, %error, "best-effort app deletion failed"),
            }
        }
    }

    /// Tears down the embedded service this harness caused to start, if any.
    ///
    /// Call at most once, after the last harness using the service is done.
    /// A harness that found its target already reachable has nothing to tear
    /// down and this is a no-op.
    pub fn shutdown(&self) {
        if let Some(handle) = &self.bootstrap {
            handle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_carry_prefix_and_random_suffix() {
        let app = fresh_app_name();
        let route = fresh_route_path();

        assert!(app.starts_with(APP_NAME_PREFIX));
        assert_eq!(app.len(), APP_NAME_PREFIX.len() + NAME_SUFFIX_LEN);
        assert!(route.starts_with(ROUTE_PATH_PREFIX));
        assert_eq!(route.len(), ROUTE_PATH_PREFIX.len() + NAME_SUFFIX_LEN);
    }

    #[test]
    fn test_consecutive_setups_get_distinct_names() {
        assert_ne!(fresh_app_name(), fresh_app_name());
        assert_ne!(fresh_route_path(), fresh_route_path());
    }

    #[test]
    fn test_tracker_acts_as_a_set() {
        let mut tracker = ResourceTracker::default();
        assert!(tracker.is_empty());

        tracker.record_app("one");
        tracker.record_app("one");
        tracker.record_app("two");

        assert!(tracker.contains("one"));
        assert!(tracker.contains("two"));

        let mut drained = tracker.drain();
        drained.sort();
        assert_eq!(drained, vec!["one".to_string(), "two".to_string()]);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_bounded_times_out_past_the_deadline() {
        let harness = TestHarness {
            client: ApiClient::builder().build().expect("client"),
            app_name: fresh_app_name(),
            route_path: fresh_route_path(),
            image: DEFAULT_IMAGE.to_string(),
            format: "default".to_string(),
            route_type: "async".to_string(),
            memory: 256,
            timeout_secs: 30,
            idle_timeout_secs: 30,
            route_config: HashMap::new(),
            route_headers: HashMap::new(),
            timeout: Duration::from_millis(20),
            deadline: Instant::now() + Duration::from_millis(20),
            tracker: ResourceTracker::default(),
            bootstrap: None,
        };

        let result = harness
            .bounded(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        // The reported budget is the harness's own, not the default
        assert!(matches!(
            result,
            Err(HarnessError::DeadlineExceeded { timeout }) if timeout == Duration::from_millis(20)
        ));
    }

    #[test]
    fn test_route_descriptor_reads_current_fields() {
        let mut harness = TestHarness {
            client: ApiClient::builder().build().expect("client"),
            app_name: fresh_app_name(),
            route_path: fresh_route_path(),
            image: DEFAULT_IMAGE.to_string(),
            format: "default".to_string(),
            route_type: "async".to_string(),
            memory: 256,
            timeout_secs: 30,
            idle_timeout_secs: 30,
            route_config: HashMap::new(),
            route_headers: HashMap::new(),
            timeout: HARNESS_TIMEOUT,
            deadline: Instant::now() + HARNESS_TIMEOUT,
            tracker: ResourceTracker::default(),
            bootstrap: None,
        };
        harness.memory = 512;
        harness
            .route_config
            .insert("KEY".to_string(), "value".to_string());

        let route = harness.route_descriptor();
        assert_eq!(route.path, harness.route_path);
        assert_eq!(route.image, DEFAULT_IMAGE);
        assert_eq!(route.route_type, "async");
        assert_eq!(route.memory, 512);
        assert_eq!(route.timeout, 30);
        assert_eq!(route.idle_timeout, 30);
        assert_eq!(route.config.get("KEY").map(String::as_str), Some("value"));
    }
}
