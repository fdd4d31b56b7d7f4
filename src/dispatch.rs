//! Bounded concurrent fan-out over a list of draws.
//!
//! [`dispatch`] runs one fetch per draw on a fixed-size pool of tokio tasks
//! and hands back a [`Dispatch`] stream of [`FetchOutcome`]s in the order the
//! fetches *finish*, not the order they were submitted.
//!
//! Layout:
//! - a driver task owns a [`JoinSet`] holding at most `worker_count` fetches
//! - whenever a fetch finishes, the driver tags the result with its draw,
//!   forwards it on the completion channel, and admits the next draw
//! - the consumer reads the channel through [`Dispatch`]
//!
//! Dropping the [`Dispatch`] aborts the driver, which drops the `JoinSet` and
//! with it every in-flight fetch.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::types::{DrawNumber, DrawRecord, FailureKind, FetchFailure, FetchOutcome};

/// Stream of fetch outcomes in completion order.
///
/// Yields exactly one [`FetchOutcome`] per dispatched draw, then ends.
pub struct Dispatch {
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    driver: JoinHandle<()>,
    total: usize,
}

impl Dispatch {
    /// Number of draws this dispatch will produce outcomes for
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Stream for Dispatch {
    type Item = FetchOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.outcomes.poll_recv(cx)
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Fetch every draw with at most `worker_count` fetches in flight.
///
/// `fetch` runs once per draw on its own tokio task. An `Err` from `fetch`
/// and a panic inside it both become [`FetchOutcome::Failure`]; nothing is
/// retried. A `worker_count` of zero is treated as one.
///
/// Must be called from within a tokio runtime.
pub fn dispatch<F, Fut>(draw_numbers: Vec<DrawNumber>, worker_count: usize, fetch: F) -> Dispatch
where
    F: Fn(DrawNumber) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DrawRecord, FetchFailure>> + Send + 'static,
{
    let total = draw_numbers.len();
    let (tx, rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(drive(
        draw_numbers,
        worker_count.max(1),
        Arc::new(fetch),
        tx,
    ));

    Dispatch {
        outcomes: rx,
        driver,
        total,
    }
}

/// Keep the pool full until every draw has reported.
async fn drive<F, Fut>(
    draw_numbers: Vec<DrawNumber>,
    worker_count: usize,
    fetch: Arc<F>,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
) where
    F: Fn(DrawNumber) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DrawRecord, FetchFailure>> + Send + 'static,
{
    let mut pending = draw_numbers.into_iter();
    let mut workers = JoinSet::new();
    let mut assigned: HashMap<tokio::task::Id, DrawNumber> = HashMap::new();

    loop {
        while workers.len() < worker_count {
            let Some(draw_number) = pending.next() else {
                break;
            };
            let fetch = Arc::clone(&fetch);
            let task_draw = draw_number.clone();
            let handle = workers.spawn(async move { fetch(task_draw).await });
            assigned.insert(handle.id(), draw_number);
        }

        let Some(joined) = workers.join_next_with_id().await else {
            break;
        };

        let (task_id, result) = match joined {
            Ok((task_id, result)) => (task_id, result),
            Err(join_error) => (
                join_error.id(),
                Err(FetchFailure::new(
                    FailureKind::Panicked,
                    format!("fetch task failed: {}", join_error),
                )),
            ),
        };

        let Some(draw_number) = assigned.remove(&task_id) else {
            tracing::error!(task_id = %task_id, "Finished fetch task has no assigned draw");
            continue;
        };

        let outcome = match result {
            Ok(record) => FetchOutcome::Success {
                draw_number,
                record,
            },
            Err(failure) => FetchOutcome::Failure {
                draw_number,
                failure,
            },
        };

        if outcomes.send(outcome).is_err() {
            tracing::debug!("Outcome consumer went away, stopping dispatch");
            return;
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn draw_numbers(n: usize) -> Vec<DrawNumber> {
        (0..n).map(|i| DrawNumber::new(format!("{}", 1000 + i))).collect()
    }

    fn record_for(draw_number: &DrawNumber) -> DrawRecord {
        DrawRecord::new(json!({"data": {"drawDetails": {"drawNumber": draw_number.as_str()}}}))
    }

    /// Tracks how many fetches are running at once.
    #[derive(Default)]
    struct Gauge {
        active: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_draw_produces_exactly_one_outcome() {
        let input = draw_numbers(57);
        let outcomes: Vec<FetchOutcome> = dispatch(input.clone(), 8, |draw_number| async move {
            let n: u64 = draw_number.as_str().parse().unwrap();
            tokio::time::sleep(Duration::from_millis(n % 7)).await;
            if n % 5 == 0 {
                Err(FetchFailure::new(FailureKind::Transport, "refused"))
            } else {
                Ok(record_for(&draw_number))
            }
        })
        .collect()
        .await;

        assert_eq!(outcomes.len(), input.len());
        let seen: HashSet<DrawNumber> = outcomes.iter().map(|o| o.draw_number().clone()).collect();
        let expected: HashSet<DrawNumber> = input.into_iter().collect();
        assert_eq!(seen, expected, "no duplicates and no omissions");

        for outcome in &outcomes {
            let n: u64 = outcome.draw_number().as_str().parse().unwrap();
            assert_eq!(outcome.is_success(), n % 5 != 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_worker_count() {
        for workers in [1, 5, 15] {
            let gauge = Arc::new(Gauge::default());
            let fetch_gauge = Arc::clone(&gauge);

            let count = dispatch(draw_numbers(40), workers, move |draw_number| {
                let gauge = Arc::clone(&fetch_gauge);
                async move {
                    gauge.enter();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    gauge.exit();
                    Ok(record_for(&draw_number))
                }
            })
            .count()
            .await;

            assert_eq!(count, 40);
            let peak = gauge.peak.load(Ordering::SeqCst);
            assert!(
                peak <= workers,
                "peak {peak} exceeded worker count {workers}"
            );
            assert!(peak >= 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_fills_up_to_worker_count() {
        let gauge = Arc::new(Gauge::default());
        let fetch_gauge = Arc::clone(&gauge);

        dispatch(draw_numbers(30), 5, move |draw_number| {
            let gauge = Arc::clone(&fetch_gauge);
            async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(40)).await;
                gauge.exit();
                Ok(record_for(&draw_number))
            }
        })
        .count()
        .await;

        assert_eq!(gauge.peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn outcomes_arrive_in_completion_order() {
        let input = vec![
            DrawNumber::from("slow"),
            DrawNumber::from("medium"),
            DrawNumber::from("fast"),
        ];

        let order: Vec<String> = dispatch(input, 3, |draw_number| async move {
            let delay = match draw_number.as_str() {
                "slow" => 300,
                "medium" => 150,
                _ => 10,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(record_for(&draw_number))
        })
        .map(|outcome| outcome.draw_number().to_string())
        .collect()
        .await;

        assert_eq!(order, vec!["fast", "medium", "slow"]);
    }

    #[tokio::test]
    async fn empty_input_ends_immediately() {
        let mut stream = dispatch(Vec::new(), 15, |draw_number| async move {
            Ok(record_for(&draw_number))
        });

        assert_eq!(stream.total(), 0);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn zero_workers_still_makes_progress() {
        let count = dispatch(draw_numbers(3), 0, |draw_number| async move {
            Ok(record_for(&draw_number))
        })
        .count()
        .await;

        assert_eq!(count, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_fetch_becomes_failure_for_its_draw() {
        let outcomes: Vec<FetchOutcome> = dispatch(
            vec![DrawNumber::from("1001"), DrawNumber::from("1002")],
            2,
            |draw_number| async move {
                if draw_number.as_str() == "1002" {
                    panic!("parser blew up");
                }
                Ok(record_for(&draw_number))
            },
        )
        .collect()
        .await;

        assert_eq!(outcomes.len(), 2);
        let failed = outcomes
            .iter()
            .find(|o| o.draw_number().as_str() == "1002")
            .unwrap();
        match failed {
            FetchOutcome::Failure { failure, .. } => {
                assert_eq!(failure.kind, FailureKind::Panicked)
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dropping_the_stream_stops_admitting_fetches() {
        let gauge = Arc::new(Gauge::default());
        let fetch_gauge = Arc::clone(&gauge);

        let mut stream = dispatch(draw_numbers(100), 2, move |draw_number| {
            let gauge = Arc::clone(&fetch_gauge);
            async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(20)).await;
                gauge.exit();
                Ok(record_for(&draw_number))
            }
        });

        assert!(stream.next().await.is_some());
        drop(stream);
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = gauge.started.load(Ordering::SeqCst);
        assert!(started < 100, "only {started} of 100 should have started");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            gauge.started.load(Ordering::SeqCst),
            started,
            "no fetches admitted after drop"
        );
    }
}
