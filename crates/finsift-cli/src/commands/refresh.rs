use finsift_core::{FinnhubAdapter, JsonStore};

use crate::cli::ExchangeArgs;
use crate::error::CliError;

pub async fn run(
    args: &ExchangeArgs,
    store: &JsonStore,
    adapter: FinnhubAdapter,
) -> Result<(), CliError> {
    let listings = adapter.symbols(&args.exchange).await?;

    let path = store.symbols_path(&args.exchange);
    store.write_array(&path, &listings)?;

    println!(
        "Wrote {} symbols for exchange {} to {}",
        listings.len(),
        args.exchange,
        path.display()
    );
    Ok(())
}
