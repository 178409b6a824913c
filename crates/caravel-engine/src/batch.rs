//! Bounded concurrent batch executor.
//!
//! Pushes a page of items at the destination with at most `concurrency`
//! requests in flight. Workers return `Option<R>`: `None` means the item
//! was dropped (already guarded and logged) and is filtered from the
//! output. One bad item never aborts the batch.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `worker` over `items` with at most `concurrency` in flight.
///
/// Every item is attempted exactly once; `None` outcomes are filtered.
/// Output order follows task completion, not input order. A
/// `concurrency` of zero or an empty `items` returns immediately with
/// no work done.
pub async fn run_batch<T, R, F, Fut>(items: Vec<T>, concurrency: usize, worker: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Option<R>> + Send + 'static,
{
    if concurrency == 0 || items.is_empty() {
        return Vec::new();
    }

    let worker = Arc::new(worker);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut join_set: JoinSet<Option<R>> = JoinSet::new();

    for item in items {
        let worker = worker.clone();
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            // The semaphore is never closed, but a task cancelled at
            // shutdown observes Err here; dropping the item is correct.
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };
            worker(item).await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Some(value)) => results.push(value),
            Ok(None) => {}
            Err(join_err) => {
                tracing::error!("Batch worker panicked, item dropped: {join_err}");
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn bounds_in_flight_workers_and_isolates_failures() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let in_flight_w = in_flight.clone();
        let peak_w = peak.clone();
        let results = run_batch(
            (0u32..10).collect::<Vec<_>>(),
            2,
            move |i| {
                let in_flight = in_flight_w.clone();
                let peak = peak_w.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    // Items 4 and 7 fail and are filtered, not fatal.
                    if i == 4 || i == 7 {
                        None
                    } else {
                        Some(i)
                    }
                }
            },
        )
        .await;

        assert_eq!(results.len(), 8);
        assert!(!results.contains(&4));
        assert!(!results.contains(&7));
        assert!(peak.load(Ordering::SeqCst) <= 2, "peak: {}", peak.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_items_return_immediately() {
        let results: Vec<u32> = run_batch(Vec::new(), 4, |i: u32| async move { Some(i) }).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn zero_concurrency_does_no_work() {
        let touched = Arc::new(AtomicUsize::new(0));
        let touched_w = touched.clone();
        let results = run_batch(vec![1u32, 2, 3], 0, move |i| {
            let touched = touched_w.clone();
            async move {
                touched.fetch_add(1, Ordering::SeqCst);
                Some(i)
            }
        })
        .await;
        assert!(results.is_empty());
        assert_eq!(touched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn every_item_attempted_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_w = attempts.clone();
        let results = run_batch((0u32..25).collect::<Vec<_>>(), 3, move |i| {
            let attempts = attempts_w.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Some(i)
            }
        })
        .await;
        assert_eq!(results.len(), 25);
        assert_eq!(attempts.load(Ordering::SeqCst), 25);
    }
}
