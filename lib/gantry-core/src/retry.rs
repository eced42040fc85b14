use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::debug;

/// Runs `operation` up to `attempts` times with a fixed `interval` between
/// failures, returning the last error once every attempt has failed.
///
/// The first success returns immediately. Every error is retried uniformly;
/// there is no classification of transient versus permanent failures. This is
/// the tool for tolerating eventual-consistency windows in the target API
/// (e.g. a just-created resource not yet visible to a subsequent read); it is
/// deliberately bounded, unlike the readiness gate of the embedded-service
/// bootstrap.
///
/// `attempts` of zero is treated as one: the operation always runs at least
/// once.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), std::io::Error> {
/// gantry_core::retry(3, Duration::from_millis(500), || async {
///     // a read that may lag behind a preceding create
///     Ok::<_, std::io::Error>(())
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry<Op, Fut, T, E>(
    attempts: usize,
    interval: Duration,
    operation: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Debug,
{
    let policy = ConstantBuilder::default()
        .with_delay(interval)
        .with_max_times(attempts.saturating_sub(1));

    operation
        .retry(policy)
        .notify(|error: &E, delay: Duration| {
            debug!(?error, ?delay, "retrying after unsuccessful attempt");
        })
        .await
}
