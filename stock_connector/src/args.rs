//! Command-line arguments for the quote connector.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use stock_common::Exchange;
use stock_common::net::{
    DEFAULT_MAX_PARALLEL, DEFAULT_QUOTE_ENDPOINT, DEFAULT_REFERER, DEFAULT_TIMEOUT_MS,
};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Symbols to fetch, e.g. `sh601006,sz000001`.
    /// Bare six-digit codes are qualified with `--exchange`.
    #[clap(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Path to a text file with more symbols.
    /// Symbols may be separated by commas, spaces, or new lines.
    #[clap(long)]
    pub path: Option<String>,

    /// Exchange assumed for bare codes.
    #[clap(long, value_enum, default_value_t = Exchange::Sh)]
    pub exchange: Exchange,

    /// Quote source base URL.
    #[clap(long, default_value = DEFAULT_QUOTE_ENDPOINT)]
    pub endpoint: String,

    /// Request timeout in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Maximum number of requests in flight at once.
    #[clap(long, default_value_t = DEFAULT_MAX_PARALLEL)]
    pub max_parallel: usize,

    /// `Referer` header sent to the quote source.
    #[clap(long, default_value = DEFAULT_REFERER)]
    pub referer: String,

    /// Record the fetched symbols as a category of this run's in-memory store.
    #[clap(long)]
    pub category: Option<String>,

    /// Print quotes as JSON lines instead of logging them.
    #[clap(long)]
    pub json: bool,
}
