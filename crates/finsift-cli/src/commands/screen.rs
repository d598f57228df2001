use std::time::Instant;

use finsift_core::{screen_records, Fundamentals, JsonStore, ValueCriteria};

use crate::cli::ExchangeArgs;
use crate::error::CliError;

pub fn run(args: &ExchangeArgs, store: &JsonStore) -> Result<(), CliError> {
    let started = Instant::now();

    let records: Vec<Fundamentals> = store.read_array(&store.fundamentals_path(&args.exchange))?;
    let passed = screen_records(&records, &ValueCriteria::default());

    println!("{} out of {} passed filters", passed.len(), records.len());

    let out_path = store.value_stocks_path(&args.exchange);
    store.write_array(&out_path, &passed)?;

    println!(
        "Wrote {} symbols to {} in {:.1?}",
        passed.len(),
        out_path.display(),
        started.elapsed()
    );
    Ok(())
}
