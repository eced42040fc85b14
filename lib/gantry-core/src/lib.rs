//! Test-orchestration harness for exercising a functions control-plane API.
//!
//! `gantry-core` solves three problems for an integration-test author:
//!
//! - **One backing service per run**: [`BootstrapRegistry`] guarantees that
//!   exactly one embedded service instance is started on demand and torn down
//!   once, no matter how many tests call setup concurrently. Tests that
//!   target a pre-existing deployment (via `GANTRY_API_URL`) skip the
//!   bootstrap entirely.
//! - **Isolation without locking**: every [`TestHarness`] carries uniquely
//!   named resources and a [`ResourceTracker`]; cleanup reverses exactly what
//!   the test created, so concurrent tests never collide or leak state.
//! - **Tolerance for eventual consistency**: [`retry`] wraps flaky API calls
//!   in a bounded, fixed-interval retry loop.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use gantry_core::{LaunchSpec, ServiceLauncher, TestHarness};
//!
//! #[derive(Debug)]
//! struct EmbeddedControlPlane;
//!
//! impl ServiceLauncher for EmbeddedControlPlane {
//!     async fn launch(&self, spec: LaunchSpec) {
//!         // run the full in-process service until cancelled, using
//!         // spec.db_url and spec.queue_url for isolated storage
//!     }
//! }
//!
//! # async fn my_test() -> Result<(), gantry_core::HarnessError> {
//! let mut harness = TestHarness::setup(Arc::new(EmbeddedControlPlane)).await;
//!
//! let app = harness.create_app().await?;
//!
//! // tolerate the read-after-create consistency window
//! let client = harness.client.clone();
//! gantry_core::retry(3, Duration::from_millis(500), || {
//!     let client = client.clone();
//!     let name = app.name.clone();
//!     async move { client.get_app(&name).await }
//! })
//! .await?;
//!
//! harness.cleanup().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Fatal versus recoverable
//!
//! A malformed `GANTRY_API_URL`, an unreachable remote target, and a wedged
//! embedded-service startup all abort the run with a panic: a test suite
//! cannot proceed without a reachable service, and these represent an
//! unusable environment rather than a single bad test. Everything else is
//! returned as a [`HarnessError`] for the test to assert against, except
//! cleanup-time deletion failures, which are logged and swallowed.

mod bootstrap;
mod client;
mod config;
mod error;
mod harness;
mod random;
mod request;
mod retry;

pub use self::bootstrap::{
    BootstrapHandle, BootstrapRegistry, LaunchSpec, READINESS_TIMEOUT, SERVICE_LOG_LEVEL,
    ServiceLauncher,
};
pub use self::client::{
    ApiClient, ApiClientBuilder, ApiClientError, App, Authentication, Route, SecureString,
    probe_version,
};
pub use self::config::{Config, DEFAULT_HOST};
pub use self::error::HarnessError;
pub use self::harness::{HARNESS_TIMEOUT, ResourceTracker, TestHarness};
pub use self::random::{rand_string, rand_string_with};
pub use self::request::{env_as_header, invoke};
pub use self::retry::retry;
