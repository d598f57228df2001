mod fundamentals;
mod ratios;
mod refresh;
mod screen;

use std::sync::Arc;

use finsift_core::{FinnhubAdapter, JsonStore, ReqwestHttpClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let store = JsonStore::new(&cli.data_dir);

    match &cli.command {
        Command::Refresh(args) => refresh::run(args, &store, network_adapter()?).await,
        Command::Fundamentals(args) => {
            fundamentals::run(args, &store, network_adapter()?).await
        }
        Command::Ratios(args) => ratios::run(args, &store).await,
        Command::Screen(args) => screen::run(args, &store),
    }
}

/// Build the provider adapter for modes that talk to the network; a missing
/// credential aborts before any processing.
fn network_adapter() -> Result<FinnhubAdapter, CliError> {
    Ok(FinnhubAdapter::from_env(Arc::new(
        ReqwestHttpClient::new(),
    ))?)
}
