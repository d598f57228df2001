//! Behavior tests for the concurrent fetch pipeline.
//!
//! These tests drive the real pipeline with a scripted in-process source so
//! they can verify the queueing, rate-limit and shutdown contracts without
//! touching the network.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use finsift_core::{
    Admission, FetchPipeline, Fundamentals, FundamentalsSource, IntervalGate, JsonStore,
    PipelineConfig, ProviderError, Symbol, UtcDateTime,
};

/// In-process stand-in for the provider: per-symbol jittered latency and a
/// scripted failure set, recording every symbol it was asked for.
struct ScriptedSource {
    fail: HashSet<String>,
    delay_cap_ms: u64,
    seen: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(fail: &[&str], delay_cap_ms: u64) -> Self {
        Self {
            fail: fail.iter().map(|s| (*s).to_owned()).collect(),
            delay_cap_ms,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("seen lock").clone()
    }
}

impl FundamentalsSource for ScriptedSource {
    fn fetch<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fundamentals, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            if self.delay_cap_ms > 0 {
                let jitter = pseudo_jitter_ms(symbol.as_str(), self.delay_cap_ms);
                tokio::time::sleep(Duration::from_millis(jitter)).await;
            }

            self.seen
                .lock()
                .expect("seen lock")
                .push(symbol.as_str().to_owned());

            if self.fail.contains(symbol.as_str()) {
                Err(ProviderError::Status {
                    endpoint: "quote",
                    status: 404,
                    subject: symbol.to_string(),
                })
            } else {
                Ok(sample_record(symbol))
            }
        })
    }
}

/// Deterministic per-symbol delay so worker completion order is shuffled
/// without introducing real randomness into assertions.
fn pseudo_jitter_ms(symbol: &str, cap_ms: u64) -> u64 {
    let hash: u64 = symbol.bytes().fold(17, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(u64::from(b))
    });
    hash % (cap_ms + 1)
}

fn sample_record(symbol: &Symbol) -> Fundamentals {
    Fundamentals {
        symbol: symbol.clone(),
        company_name: format!("{symbol} Corp"),
        as_of: UtcDateTime::parse("2025-01-01T00:00:00Z").expect("valid"),
        market_cap: 1_000.0,
        current_price: 50.0,
        pe_ratio: 10.0,
        pb_ratio: 1.0,
        eps: 5.0,
        revenue_per_share: 20.0,
        profit_margin: 25.0,
        roe: 20.0,
        roa: 10.0,
        debt_to_equity: 0.5,
        dividend_yield: 2.0,
        beta: 1.0,
        book_value_per_share: 50.0,
    }
}

fn symbols(names: &[&str]) -> Vec<Symbol> {
    names
        .iter()
        .map(|name| Symbol::parse(name).expect("valid symbol"))
        .collect()
}

fn numbered_symbols(count: usize) -> Vec<Symbol> {
    (0..count)
        .map(|index| Symbol::parse(&format!("SYM{index}")).expect("valid symbol"))
        .collect()
}

fn fast_config(workers: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        queue_capacity: 8,
        min_interval: Duration::from_millis(1),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writes_one_record_per_successful_fetch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path());
    let out_path = store.fundamentals_path("US");

    let source = Arc::new(ScriptedSource::new(&["SYM2", "SYM5", "SYM9"], 3));
    let pipeline = FetchPipeline::new(source, store.clone(), fast_config(3));

    let input = numbered_symbols(12);
    let summary = pipeline
        .run(input, out_path.clone(), CancellationToken::new())
        .await;

    assert_eq!(summary.symbols_found, 12);
    assert_eq!(summary.records_written, 9);

    let written: Vec<Fundamentals> = store.read_array(&out_path).expect("valid array");
    assert_eq!(written.len(), 9);
    assert!(written.iter().all(|r| r.symbol.as_str() != "SYM5"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_enqueued_symbol_is_observed_exactly_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path());
    let out_path = store.fundamentals_path("US");

    let source = Arc::new(ScriptedSource::new(&[], 5));
    let pipeline = FetchPipeline::new(
        Arc::clone(&source) as Arc<dyn FundamentalsSource>,
        store,
        fast_config(4),
    );

    let input = numbered_symbols(25);
    let expected: Vec<String> = input.iter().map(|s| s.as_str().to_owned()).collect();
    pipeline
        .run(input, out_path, CancellationToken::new())
        .await;

    let mut seen = source.seen();
    let mut expected_sorted = expected;
    seen.sort();
    expected_sorted.sort();
    assert_eq!(seen, expected_sorted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writer_drains_every_result_despite_randomized_completion_order() {
    // A send into a prematurely closed result queue would lose the record
    // and break the written-count equality below.
    for round in 0..5u64 {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path());
        let out_path = store.fundamentals_path("US");

        let source = Arc::new(ScriptedSource::new(&["SYM3", "SYM7"], 4 + round));
        let pipeline = FetchPipeline::new(source, store.clone(), fast_config(4));

        let summary = pipeline
            .run(numbered_symbols(20), out_path.clone(), CancellationToken::new())
            .await;

        assert_eq!(summary.records_written, 18, "round {round} lost records");
        let written: Vec<Fundamentals> = store.read_array(&out_path).expect("valid array");
        assert_eq!(written.len(), 18, "round {round} store mismatch");
    }
}

#[tokio::test]
async fn single_worker_reproduces_sequential_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path());
    let out_path = store.fundamentals_path("US");

    let source = Arc::new(ScriptedSource::new(&[], 0));
    let pipeline = FetchPipeline::new(
        Arc::clone(&source) as Arc<dyn FundamentalsSource>,
        store.clone(),
        fast_config(1),
    );

    let input = symbols(&["AAA", "BBB", "CCC", "DDD"]);
    pipeline
        .run(input, out_path.clone(), CancellationToken::new())
        .await;

    assert_eq!(source.seen(), ["AAA", "BBB", "CCC", "DDD"]);
    let written: Vec<Fundamentals> = store.read_array(&out_path).expect("valid array");
    let order: Vec<&str> = written.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, ["AAA", "BBB", "CCC", "DDD"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn gate_admits_at_most_one_grant_per_interval() {
    let interval = Duration::from_millis(50);
    let gate = IntervalGate::new(interval);
    let cancel = CancellationToken::new();
    let grants = Arc::new(AtomicUsize::new(0));

    let timer_token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        timer_token.cancel();
    });

    let started = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let gate = gate.clone();
        let cancel = cancel.clone();
        let grants = Arc::clone(&grants);
        handles.push(tokio::spawn(async move {
            loop {
                match gate.acquire(&cancel).await {
                    Admission::Granted => {
                        grants.fetch_add(1, Ordering::SeqCst);
                    }
                    Admission::Cancelled => break,
                }
            }
        }));
    }
    for handle in handles {
        handle.await.expect("worker joins");
    }
    let elapsed = started.elapsed();

    let total = grants.load(Ordering::SeqCst);
    let ceiling = elapsed.as_millis() as usize / 50 + 1;
    assert!(
        total <= ceiling,
        "{total} grants exceed ceiling {ceiling} for {elapsed:?}"
    );
    assert!(total >= 2, "gate never progressed: {total} grants");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_stops_admissions_and_leaves_store_valid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path());
    let out_path = store.fundamentals_path("US");

    let source = Arc::new(ScriptedSource::new(&[], 2));
    let config = PipelineConfig {
        workers: 3,
        queue_capacity: 4,
        min_interval: Duration::from_millis(25),
    };
    let pipeline = FetchPipeline::new(source, store.clone(), config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        trigger.cancel();
    });

    let summary = pipeline.run(numbered_symbols(200), out_path.clone(), cancel).await;

    // The batch was cut short, and whatever made it through is durable and
    // still a well-formed array.
    assert!(summary.records_written < 200);
    let written: Vec<Fundamentals> = store
        .read_array_or_empty(&out_path)
        .expect("valid array");
    assert_eq!(written.len(), summary.records_written);
}
