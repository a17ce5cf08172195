//! Quote connector — fetches current quotes for a list of stock symbols from the
//! Sina quote source and logs (or prints) them. Each run is recorded as a
//! session-audit entry, and the fetched symbols can optionally be grouped under a
//! category. The store lives only for the duration of one run.
//!
//! Usage example (CLI):
//! ```bash
//! stock_connector --symbols sh601006,sz000001 --path ./symbols.txt --category rail
//! ```
//!
//! The symbol file should contain symbols separated by commas, spaces, or new lines.
//! See `stock_common::symbols` for details.
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use chrono::Utc;
use clap::Parser;
use log::{error, info, warn};
use rand::Rng;
use stock_common::symbols::SymbolParser;
use stock_common::{Result, StockError, Symbol};
use stock_connector::ctx::{CATEGORY_SERVICE, QUOTE_SERVICE, SESSION_SERVICE};
use stock_connector::{FetcherConfig, QuoteFetcher, QuoteRecord, Services};
use stock_store::{AccessType, Category, CategoryService, DocumentStore, MemoryStore, Session, SessionService};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), StockError> {
    init_logger();
    let args = Args::parse();

    let symbols = collect_symbols(&args)?;
    if symbols.is_empty() {
        warn!("No symbols given; pass --symbols or --path");
        return Ok(());
    }
    info!("Symbols: {}", join(&symbols));

    let config = FetcherConfig {
        endpoint: args.endpoint.clone(),
        timeout: Some(Duration::from_millis(args.timeout_ms)),
        referer: Some(args.referer.clone()).filter(|r| !r.is_empty()),
        max_parallel: args.max_parallel,
    };
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let services = Services::assemble(store, config)?;
    let registry = services.registry();
    info!("Services: {}", registry.names().join(", "));

    let started = Utc::now();
    let quotes: Arc<QuoteFetcher> = registry.get(QUOTE_SERVICE)?;
    let results = quotes.fetch_all(&symbols);

    let mut fetched: Vec<QuoteRecord> = Vec::new();
    for (symbol, result) in results {
        match result {
            Ok(quote) => fetched.push(quote),
            Err(e) => error!("{}: {}", symbol, e),
        }
    }
    for quote in &fetched {
        if args.json {
            println!("{}", quote.to_json()?);
        } else {
            log_quote(quote);
        }
    }

    if let Some(name) = &args.category {
        let categories: Arc<CategoryService> = registry.get(CATEGORY_SERVICE)?;
        let fetched_symbols: Vec<String> = fetched.iter().map(|q| q.symbol.clone()).collect();
        let count = fetched_symbols.len();
        let id = categories.add(&mut Category::new(name, None, fetched_symbols))?;
        info!("Category {} created as #{} with {} symbols", name, id, count);
    }

    let sessions: Arc<SessionService> = registry.get(SESSION_SERVICE)?;
    let description = format!("fetched {} of {} quotes", fetched.len(), symbols.len());
    let mut audit = Session::new(
        &session_token(),
        started,
        AccessType::Cli,
        Some(&description),
        "127.0.0.1",
    );
    sessions.record(&mut audit)?;

    let failed = symbols.len() - fetched.len();
    if failed > 0 {
        return Err(StockError::Format(format!(
            "{} of {} quotes could not be fetched",
            failed,
            symbols.len()
        )));
    }
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Symbols from `--symbols` followed by those in `--path`, duplicates dropped.
fn collect_symbols(args: &Args) -> Result<Vec<Symbol>, StockError> {
    let mut symbols = Vec::new();
    for raw in &args.symbols {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let symbol = if raw.bytes().all(|b| b.is_ascii_digit()) {
            Symbol::new(args.exchange, raw)?
        } else {
            raw.parse::<Symbol>()?
        };
        symbols.push(symbol);
    }

    if let Some(path) = &args.path {
        let file_path = normalize_path(path);
        let file = File::open(&file_path)?;
        symbols.extend(Symbol::parse_from_file(BufReader::new(file))?);
    }

    let mut seen = std::collections::HashSet::new();
    symbols.retain(|s| seen.insert(s.clone()));
    Ok(symbols)
}

fn log_quote(quote: &QuoteRecord) {
    info!(
        "QUOTE: {} {} Current={:.2} Open={:.2} PrevClose={:.2} Volume={} Time={}",
        quote.symbol,
        quote.name,
        quote.current,
        quote.open,
        quote.prev_close,
        quote.volume,
        quote.timestamp
    );
}

fn session_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn join(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
