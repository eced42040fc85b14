//! Exactly-once bootstrap of an embedded control-plane service.
//!
//! When the harness targets the local default address and nothing answers
//! there, the first caller starts an embedded service instance with freshly
//! generated, isolated store locations; every concurrent caller blocks until
//! that bootstrap completes and receives the same teardown handle. The
//! service itself is supplied by the caller through [`ServiceLauncher`];
//! this crate only orchestrates its lifecycle.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::client::probe_version;

/// How long the readiness watchdog waits before declaring the startup wedged.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed interval between readiness probes. Short enough that startup latency
/// stays negligible, long enough not to burn CPU while the service boots.
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Log level the embedded service is asked to run at. Fatal-only keeps test
/// output readable.
pub const SERVICE_LOG_LEVEL: &str = "fatal";

const STORE_PREFIX: &str = "gantry_test";

/// Everything a [`ServiceLauncher`] needs to start the embedded service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Metadata-store URL, either generated under the temp dir or taken from
    /// the configured override.
    pub db_url: String,
    /// Work-queue store URL, always generated.
    pub queue_url: String,
    /// Log level the service should run at (always [`SERVICE_LOG_LEVEL`]).
    pub log_level: &'static str,
}

/// A caller-supplied embedded control-plane service.
///
/// `launch` must run the full service in-process (including its worker/agent,
/// with no external worker dependency), using the store locations from the
/// [`LaunchSpec`], and serve the
/// `/version` endpoint at the local default address. It runs on a background
/// task until the teardown handle aborts it.
pub trait ServiceLauncher {
    /// Runs the service until cancelled.
    fn launch(&self, spec: LaunchSpec) -> impl Future<Output = ()> + Send;
}

#[derive(Debug)]
struct BootstrapInner {
    task: tokio::task::JoinHandle<()>,
    store_paths: Vec<PathBuf>,
}

/// Teardown handle for a bootstrapped service instance.
///
/// Every caller of [`BootstrapRegistry::ensure_started`] receives a clone of
/// the same handle. [`shutdown`](Self::shutdown) should be invoked at most
/// once, by whichever party owns the end of the test run.
#[derive(Debug, Clone)]
pub struct BootstrapHandle {
    inner: Arc<BootstrapInner>,
}

impl BootstrapHandle {
    /// Cancels the service task and removes the generated store files.
    ///
    /// Missing store files are logged and ignored; the service may never have
    /// created them.
    pub fn shutdown(&self) {
        self.inner.task.abort();
        for path in &self.inner.store_paths {
            if let Err(error) = std::fs::remove_file(path) {
                warn!(path = %path.display(), %error, "couldn't remove store file");
            }
        }
    }
}

/// Init-guard for the process-wide embedded service instance.
///
/// The bootstrap body runs on exactly one caller's task regardless of how
/// many tests call [`ensure_started`](Self::ensure_started) concurrently; all
/// callers block until it completes and observe the same
/// [`BootstrapHandle`]. Once created, the instance is never recreated, even
/// if it later becomes unhealthy.
///
/// Harness construction takes a registry reference, so unit tests can inject
/// a private registry instead of the [`global`](Self::global) one.
#[derive(Debug, Default)]
pub struct BootstrapRegistry {
    cell: OnceCell<BootstrapHandle>,
}

impl BootstrapRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the default harness setup.
    #[must_use]
    pub fn global() -> &'static BootstrapRegistry {
        static GLOBAL: OnceLock<BootstrapRegistry> = OnceLock::new();
        GLOBAL.get_or_init(BootstrapRegistry::new)
    }

    /// Guarantees a usable service exists at `host`, starting one if this is
    /// the first call.
    ///
    /// Readiness-probe failures are not errors: the poll retries at a fixed
    /// interval until the service answers or the watchdog fires. Bootstrap is
    /// an infrastructure precondition, not a testable API call, hence the
    /// unbounded-until-watchdog policy, unlike [`retry`](crate::retry).
    ///
    /// # Panics
    ///
    /// Panics when the service does not become ready within
    /// [`READINESS_TIMEOUT`]; a wedged startup would otherwise hang the whole
    /// suite silently, and there is no way to run tests without a reachable
    /// service.
    pub async fn ensure_started<L>(
        &self,
        launcher: Arc<L>,
        host: &str,
        db_url_override: Option<&str>,
    ) -> BootstrapHandle
    where
        L: ServiceLauncher + Send + Sync + 'static,
    {
        self.cell
            .get_or_init(|| {
                start_service(launcher, host.to_string(), db_url_override.map(str::to_string))
            })
            .await
            .clone()
    }
}

async fn start_service<L>(
    launcher: Arc<L>,
    host: String,
    db_url_override: Option<String>,
) -> BootstrapHandle
where
    L: ServiceLauncher + Send + Sync + 'static,
{
    let (spec, store_paths) = build_launch_spec(db_url_override);
    debug!(?spec, %host, "starting embedded control-plane service");

    let task = tokio::spawn({
        let launcher = Arc::clone(&launcher);
        async move { launcher.launch(spec).await }
    });

    wait_until_ready(&host, READINESS_TIMEOUT).await;
    debug!(%host, "embedded service is ready");

    BootstrapHandle {
        inner: Arc::new(BootstrapInner { task, store_paths }),
    }
}

/// Generates isolated store locations for one service instance.
///
/// Millisecond-granularity timestamps keep rapid successive runs from
/// sharing on-disk state. The metadata store honours the configured override;
/// the work-queue store is always fresh.
fn build_launch_spec(db_url_override: Option<String>) -> (LaunchSpec, Vec<PathBuf>) {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let temp_dir = std::env::temp_dir();
    let meta_path = temp_dir.join(format!("{STORE_PREFIX}_{millis}_meta.db"));
    let queue_path = temp_dir.join(format!("{STORE_PREFIX}_{millis}_queue.db"));

    let db_url =
        db_url_override.unwrap_or_else(|| format!("sqlite3://{}", meta_path.display()));
    let queue_url = format!("bolt://{}", queue_path.display());

    let spec = LaunchSpec {
        db_url,
        queue_url,
        log_level: SERVICE_LOG_LEVEL,
    };
    (spec, vec![meta_path, queue_path])
}

async fn wait_until_ready(host: &str, watchdog: Duration) {
    let poll = async {
        while !probe_version(host).await {
            tokio::time::sleep(READINESS_POLL_INTERVAL).await;
        }
    };
    if tokio::time::timeout(watchdog, poll).await.is_err() {
        panic!("embedded service at {host} failed to become ready within {watchdog:?}");
    }
}
