use std::sync::Arc;
use std::time::Duration;

use finsift_core::{
    FetchPipeline, FinnhubAdapter, JsonStore, PipelineConfig, Symbol, SymbolListing,
    DEFAULT_QUEUE_CAPACITY,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::FundamentalsArgs;
use crate::error::CliError;

pub async fn run(
    args: &FundamentalsArgs,
    store: &JsonStore,
    adapter: FinnhubAdapter,
) -> Result<(), CliError> {
    let listings: Vec<SymbolListing> = store.read_array(&store.symbols_path(&args.exchange))?;

    let mut symbols = Vec::with_capacity(listings.len());
    for listing in &listings {
        match Symbol::parse(&listing.display_symbol) {
            Ok(symbol) => symbols.push(symbol),
            Err(error) => warn!(raw = %listing.display_symbol, %error, "skipping unusable listing"),
        }
    }

    println!(
        "Found {} symbols. Fetching fundamental data...\n",
        symbols.len()
    );

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after in-flight fetches");
            ctrl_c_token.cancel();
        }
    });

    let config = PipelineConfig {
        workers: args.workers,
        queue_capacity: DEFAULT_QUEUE_CAPACITY,
        min_interval: Duration::from_millis(args.interval_ms),
    };
    let pipeline = FetchPipeline::new(Arc::new(adapter), store.clone(), config);

    let out_path = store.fundamentals_path(&args.exchange);
    let summary = pipeline.run(symbols, out_path, cancel).await;

    println!(
        "\nCompleted! Wrote {} of {} symbols in {:.1?}.",
        summary.records_written, summary.symbols_found, summary.elapsed
    );
    Ok(())
}
