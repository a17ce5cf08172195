//! Blocking HTTP retrieval of quote lines.
//!
//! One GET per call, no retry and no caching. Transport failures and non-2xx
//! answers are `QuoteError::Fetch`; everything wrong with the body itself is
//! reported by the parser.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use stock_common::net::{DEFAULT_MAX_PARALLEL, DEFAULT_QUOTE_ENDPOINT, DEFAULT_REFERER, LIST_PARAM};
use stock_common::{QuoteError, Symbol};

use crate::model::quote::QuoteRecord;
use crate::parser;

/// Transport settings for [`QuoteFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Base URL used by [`QuoteFetcher::fetch_symbol`].
    pub endpoint: String,
    /// Whole-request timeout; `None` keeps the client default.
    pub timeout: Option<Duration>,
    /// `Referer` header sent with every request.
    pub referer: Option<String>,
    /// Worker threads used by [`QuoteFetcher::fetch_all`]; zero counts as one.
    pub max_parallel: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_QUOTE_ENDPOINT.to_string(),
            timeout: None,
            referer: Some(DEFAULT_REFERER.to_string()),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

/// Fetches and decodes quotes from the configured source.
pub struct QuoteFetcher {
    client: Client,
    config: FetcherConfig,
}

impl QuoteFetcher {
    /// Builds the HTTP client for `config`.
    pub fn new(config: FetcherConfig) -> Result<Self, QuoteError> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = &config.referer {
            let value = HeaderValue::from_str(referer)
                .map_err(|e| fetch_error(&config.endpoint, None, format!("bad referer: {}", e)))?;
            headers.insert(REFERER, value);
        }

        let mut builder = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| fetch_error(&config.endpoint, None, e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Issues a GET against `url` with `params` as the query string and parses
    /// the first quote line of the answer.
    pub fn fetch_quote(
        &self,
        url: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<QuoteRecord, QuoteError> {
        debug!("GET {} {:?}", url, params);
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(|e| fetch_error(url, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(
                url,
                Some(status.as_u16()),
                format!("HTTP status {}", status),
            ));
        }

        let body = response
            .text()
            .map_err(|e| fetch_error(url, Some(status.as_u16()), e.to_string()))?;
        let quote = parser::parse_body(&body)?;
        debug!("Parsed {} at {}", quote.symbol, quote.timestamp);
        Ok(quote)
    }

    /// Fetches one symbol from the configured endpoint.
    pub fn fetch_symbol(&self, symbol: &Symbol) -> Result<QuoteRecord, QuoteError> {
        let mut params = BTreeMap::new();
        params.insert(LIST_PARAM.to_string(), symbol.to_string());
        self.fetch_quote(&self.config.endpoint, &params)
    }

    /// Fetches every symbol using at most `max_parallel` worker threads.
    ///
    /// Results arrive in completion order, not input order; one failure does
    /// not affect the others.
    pub fn fetch_all(&self, symbols: &[Symbol]) -> Vec<(Symbol, Result<QuoteRecord, QuoteError>)> {
        let workers = self.config.max_parallel.clamp(1, symbols.len().max(1));
        debug!("Fetching {} symbols on {} workers", symbols.len(), workers);

        let (job_tx, job_rx) = unbounded::<&Symbol>();
        for symbol in symbols {
            // Receiver is held above; sending cannot fail.
            let _ = job_tx.send(symbol);
        }
        drop(job_tx);

        let (tx, rx) = unbounded();
        thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let tx = tx.clone();
                scope.spawn(move || {
                    for symbol in jobs.iter() {
                        let result = self.fetch_symbol(symbol);
                        if let Err(e) = &result {
                            warn!("Fetching {} failed: {}", symbol, e);
                        }
                        // The receiver outlives every sender inside this scope.
                        let _ = tx.send((symbol.clone(), result));
                    }
                });
            }
        });
        drop(tx);
        rx.iter().collect()
    }
}

fn fetch_error(url: &str, status: Option<u16>, reason: String) -> QuoteError {
    QuoteError::Fetch {
        url: url.to_string(),
        status,
        reason,
    }
}
