//! CLI argument definitions for finsift.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `refresh` | Rebuild the symbol list for an exchange |
//! | `fundamentals` | Run the rate-limited fetch pipeline |
//! | `ratios` | Recompute price-to-book ratios in a fundamentals file |
//! | `screen` | Shortlist value candidates from a fundamentals file |
//!
//! Data files live under `--data-dir` and are named per exchange:
//! `symbols_{exchange}.json`, `fundamentals_{exchange}.json`,
//! `value_stocks_{exchange}.json`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Finnhub value-stock screener.
///
/// Fetches company fundamentals for every listed symbol of an exchange,
/// respecting the provider's global rate limit, then filters candidates by
/// fixed value-investing thresholds.
#[derive(Debug, Parser)]
#[command(
    name = "finsift",
    author,
    version,
    about = "Finnhub value-stock screener"
)]
pub struct Cli {
    /// Directory holding the symbol and fundamentals JSON files.
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the symbol list for an exchange from the provider directory.
    ///
    /// # Examples
    ///
    ///   finsift refresh US
    Refresh(ExchangeArgs),

    /// Fetch fundamentals for every symbol in the symbol-list file.
    ///
    /// Runs the concurrent pipeline: each record is appended durably as it
    /// arrives, so an interrupted run keeps everything fetched so far.
    ///
    /// # Examples
    ///
    ///   finsift fundamentals US
    ///   finsift fundamentals US --workers 1 --interval-ms 1100
    Fundamentals(FundamentalsArgs),

    /// Recompute price-to-book ratios for a fundamentals file in place.
    ///
    /// # Examples
    ///
    ///   finsift ratios US
    Ratios(RatiosArgs),

    /// Filter a fundamentals file by the value-stock thresholds.
    ///
    /// # Examples
    ///
    ///   finsift screen US
    Screen(ExchangeArgs),
}

/// Arguments shared by commands that only need an exchange code.
#[derive(Debug, Args)]
pub struct ExchangeArgs {
    /// Exchange code (e.g. US, L, T).
    pub exchange: String,
}

/// Arguments for the `fundamentals` command.
#[derive(Debug, Args)]
pub struct FundamentalsArgs {
    /// Exchange code (e.g. US, L, T).
    pub exchange: String,

    /// Concurrent fetch workers; 1 fetches strictly sequentially.
    #[arg(long, default_value_t = 3)]
    pub workers: usize,

    /// Minimum milliseconds between provider calls across all workers.
    #[arg(long, default_value_t = 3_000)]
    pub interval_ms: u64,
}

/// Arguments for the `ratios` command.
#[derive(Debug, Args)]
pub struct RatiosArgs {
    /// Exchange code (e.g. US, L, T).
    pub exchange: String,

    /// Parallel workers for the recompute pass.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,
}
