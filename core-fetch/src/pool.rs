use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Hard ceiling on worker count, independent of host parallelism
const MAX_WORKERS: usize = 10;

/// Buffer size for the internal result channel
const RESULT_BUFFER: usize = 32;

/// Parallel-task runner with a capped worker count.
///
/// Each worker loops over a shared queue of items, running the per-item task
/// and forwarding its result as soon as it completes. A task returning `None`
/// (or panicking) simply skips that item; the batch always runs to the end
/// unless cancelled.
#[derive(Debug, Clone)]
pub struct FetchPool {
    workers: usize,
    pace: Option<Duration>,
}

impl FetchPool {
    /// Create a pool with at most `max_workers` workers.
    ///
    /// The effective count is clamped by the host's available parallelism and
    /// a fixed ceiling, and is always at least one.
    pub fn new(max_workers: usize) -> Self {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let workers = max_workers.min(available).min(MAX_WORKERS).max(1);
        Self {
            workers,
            pace: None,
        }
    }

    /// Add a fixed per-worker delay after every task invocation.
    ///
    /// Used for rate-limited services; effective throughput becomes roughly
    /// `workers / pace`.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// The effective worker count after clamping.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Run `task` over every item, collecting results in completion order.
    ///
    /// Items not yet scheduled when `cancel` fires are abandoned; in-flight
    /// items run to completion and their results are still collected.
    pub async fn run<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        cancel: &CancellationToken,
        task: F,
    ) -> Vec<T>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(RESULT_BUFFER);
        let execution = self.execute(items, cancel, task, tx);

        let collector = async {
            let mut results = Vec::new();
            while let Some(result) = rx.recv().await {
                results.push(result);
            }
            results
        };

        let ((), results) = tokio::join!(execution, collector);
        results
    }

    /// Run `task` over every item, forwarding each result to `out` as it
    /// completes. Returns the number of results forwarded.
    ///
    /// Forwarding stops early if the receiving side is dropped.
    pub async fn run_streaming<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        cancel: &CancellationToken,
        task: F,
        out: mpsc::Sender<T>,
    ) -> usize
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(RESULT_BUFFER);
        let execution = self.execute(items, cancel, task, tx);

        let forwarder = async {
            let mut forwarded = 0usize;
            while let Some(result) = rx.recv().await {
                if out.send(result).await.is_err() {
                    debug!("Result receiver dropped, discarding remaining results");
                    break;
                }
                forwarded += 1;
            }
            forwarded
        };

        let ((), forwarded) = tokio::join!(execution, forwarder);
        forwarded
    }

    /// Spawn the worker loops and wait for all of them to finish.
    async fn execute<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        cancel: &CancellationToken,
        task: F,
        tx: mpsc::Sender<T>,
    ) where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let total = items.len();
        let queue = Arc::new(Mutex::new(VecDeque::from(items)));
        debug!(total, workers = self.workers, "Starting fetch pool");

        let mut workers = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            let task = task.clone();
            let tx = tx.clone();
            let pace = self.pace;

            workers.push(tokio::spawn(async move {
                loop {
                    // No new work once cancellation is requested
                    if cancel.is_cancelled() {
                        break;
                    }

                    let item = queue.lock().await.pop_front();
                    let Some(item) = item else { break };

                    // Re-check at task-body start so an item popped just
                    // before cancellation is also abandoned
                    if cancel.is_cancelled() {
                        break;
                    }

                    // Each item runs in its own task so a panic only skips
                    // that item, never the batch
                    match tokio::spawn(task(item)).await {
                        Ok(Some(result)) => {
                            if tx.send(result).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(worker_id, error = %e, "Fetch task failed, skipping item");
                        }
                    }

                    if let Some(pace) = pace {
                        tokio::time::sleep(pace).await;
                    }
                }
            }));
        }

        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
        debug!("Fetch pool drained");
    }
}
