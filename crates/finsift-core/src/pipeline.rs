//! Concurrent fundamentals fetch pipeline.
//!
//! Symbols flow through a bounded work queue to a pool of workers, each
//! gated by the shared [`IntervalGate`], and successful records flow through
//! a bounded result queue to a single writer task that appends them to the
//! store. The orchestrator closes the work queue after enqueueing every
//! symbol, joins all workers, and only then can the result queue close:
//! every worker owns a result sender, and the last sender drops when the
//! last worker exits. A write to a closed result queue is therefore
//! impossible by construction rather than by locking.
//!
//! A worker count of 1 reproduces sequential fetching; there is no separate
//! sequential code path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::finnhub::FundamentalsSource;
use crate::store::JsonStore;
use crate::throttle::{Admission, IntervalGate};
use crate::{Fundamentals, Symbol};

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// Minimum spacing between provider calls across all workers.
    pub min_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            min_interval: Duration::from_secs(3),
        }
    }
}

/// Outcome counters reported after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub symbols_found: usize,
    /// Records durably appended; equals the number of successful fetches,
    /// not the input symbol count.
    pub records_written: usize,
    pub elapsed: Duration,
}

/// Wires the source, gate, queues and writer together for a batch run.
pub struct FetchPipeline {
    source: Arc<dyn FundamentalsSource>,
    store: JsonStore,
    config: PipelineConfig,
}

impl FetchPipeline {
    pub fn new(
        source: Arc<dyn FundamentalsSource>,
        store: JsonStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Run the batch: enqueue every symbol, close the queue, join workers,
    /// then wait for the writer to drain.
    pub async fn run(
        &self,
        symbols: Vec<Symbol>,
        out_path: PathBuf,
        cancel: CancellationToken,
    ) -> PipelineSummary {
        let started = Instant::now();
        let symbols_found = symbols.len();
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);

        let (work_tx, work_rx) = mpsc::channel::<Symbol>(capacity);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, result_rx) = mpsc::channel::<Fundamentals>(capacity);

        let gate = IntervalGate::new(self.config.min_interval);

        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            worker_handles.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&work_rx),
                result_tx.clone(),
                Arc::clone(&self.source),
                gate.clone(),
                cancel.clone(),
            )));
        }
        // The workers hold the only result senders and the only handles to
        // the work receiver; once they exit, both channels close.
        drop(result_tx);
        drop(work_rx);

        let writer = tokio::spawn(writer_loop(result_rx, self.store.clone(), out_path));

        for symbol in symbols {
            if work_tx.send(symbol).await.is_err() {
                // Every worker exited early (cancellation); stop feeding.
                break;
            }
        }
        drop(work_tx);

        // Join barrier: after this, no worker can write a result.
        for handle in worker_handles {
            if let Err(error) = handle.await {
                warn!(%error, "worker task failed");
            }
        }

        let records_written = match writer.await {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, "writer task failed");
                0
            }
        };

        PipelineSummary {
            symbols_found,
            records_written,
            elapsed: started.elapsed(),
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    work_rx: Arc<Mutex<Receiver<Symbol>>>,
    results: Sender<Fundamentals>,
    source: Arc<dyn FundamentalsSource>,
    gate: IntervalGate,
    cancel: CancellationToken,
) {
    loop {
        let next = { work_rx.lock().await.recv().await };
        let Some(symbol) = next else { break };

        match gate.acquire(&cancel).await {
            Admission::Cancelled => {
                debug!(worker_id, "shutdown requested, worker exiting");
                break;
            }
            Admission::Granted => {}
        }

        match source.fetch(&symbol).await {
            Ok(record) => {
                // Blocking on a full result queue is deliberate backpressure.
                if results.send(record).await.is_err() {
                    break;
                }
            }
            Err(error) => {
                warn!(worker_id, %symbol, %error, "fetch failed, skipping symbol");
            }
        }
    }
}

async fn writer_loop(mut results: Receiver<Fundamentals>, store: JsonStore, path: PathBuf) -> usize {
    let mut written = 0usize;
    while let Some(record) = results.recv().await {
        let symbol = record.symbol.clone();
        let store = store.clone();
        let path = path.clone();
        // The read-modify-rewrite grows with the file; keep it off the
        // async worker threads.
        let appended = tokio::task::spawn_blocking(move || store.append(&path, &record)).await;
        match appended {
            Ok(Ok(())) => {
                written += 1;
                debug!(%symbol, written, "appended record");
            }
            Ok(Err(error)) => {
                warn!(%error, "could not append record, continuing");
            }
            Err(error) => {
                warn!(%error, "append task failed, continuing");
            }
        }
    }
    written
}
