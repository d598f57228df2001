use std::time::Instant;

use finsift_core::{recompute_pb_ratios, Fundamentals, JsonStore};

use crate::cli::RatiosArgs;
use crate::error::CliError;

pub async fn run(args: &RatiosArgs, store: &JsonStore) -> Result<(), CliError> {
    let started = Instant::now();

    let path = store.fundamentals_path(&args.exchange);
    let records: Vec<Fundamentals> = store.read_array(&path)?;
    let total = records.len();

    let recomputed = recompute_pb_ratios(records, args.workers).await;
    store.write_array(&path, &recomputed)?;

    println!(
        "Recomputed price-to-book for {} records in {:.1?}",
        total,
        started.elapsed()
    );
    Ok(())
}
