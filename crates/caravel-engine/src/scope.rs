//! Scoped phase logging.
//!
//! Wraps one connector phase (pull a page, push a batch) with a start
//! line, a success line carrying elapsed time and an item count, or an
//! error line carrying elapsed time before the error re-raises.

use std::future::Future;
use std::time::Instant;

/// Await `fut` with start/finish logging. The success line reports the
/// count derived by `count_fn` from the output.
///
/// # Errors
///
/// Re-raises the future's error unchanged after logging it.
pub async fn with_log<T, E, Fut>(
    step: &str,
    phase: &str,
    count_fn: impl FnOnce(&T) -> Option<usize>,
    fut: Fut,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    tracing::debug!(step, phase, "Phase starting");
    let start = Instant::now();
    match fut.await {
        Ok(value) => {
            let duration_secs = start.elapsed().as_secs_f64();
            match count_fn(&value) {
                Some(count) => {
                    tracing::info!(step, phase, duration_secs, count, "Phase completed");
                }
                None => tracing::info!(step, phase, duration_secs, "Phase completed"),
            }
            Ok(value)
        }
        Err(err) => {
            let duration_secs = start.elapsed().as_secs_f64();
            tracing::error!(step, phase, duration_secs, "Phase failed: {err}");
            Err(err)
        }
    }
}

/// [`with_log`] for phases returning a collection; the count is its
/// length.
///
/// # Errors
///
/// Re-raises the future's error unchanged after logging it.
pub async fn with_log_counted<T, E, Fut>(step: &str, phase: &str, fut: Fut) -> Result<Vec<T>, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    with_log(step, phase, |items: &Vec<T>| Some(items.len()), fut).await
}
