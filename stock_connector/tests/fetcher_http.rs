use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use httpmock::prelude::*;
use stock_common::{QuoteError, Symbol};
use stock_connector::{FetcherConfig, QuoteFetcher};

const LINE: &str = "\"sh601006\",上证指数,3500.00,3490.00,3510.00,3520.00,3480.00,3509.00,3511.00,1000000,...,2014-05-06,15:00:00";

fn fetcher_for(server: &MockServer) -> QuoteFetcher {
    QuoteFetcher::new(FetcherConfig {
        endpoint: server.url("/"),
        timeout: Some(Duration::from_secs(5)),
        referer: Some("https://finance.sina.com.cn/".to_string()),
        ..FetcherConfig::default()
    })
    .unwrap()
}

fn symbol(s: &str) -> Symbol {
    s.parse().unwrap()
}

#[test]
fn fetches_and_parses_symbol() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/")
            .query_param("list", "sh601006")
            .header("referer", "https://finance.sina.com.cn/");
        then.status(200)
            .header("content-type", "text/plain; charset=utf-8")
            .body(LINE);
    });

    let quote = fetcher_for(&server).fetch_symbol(&symbol("sh601006")).unwrap();

    mock.assert();
    assert_eq!(quote.symbol, "sh601006");
    assert_eq!(quote.open, 3500.00);
    assert_eq!(quote.prev_close, 3490.00);
    assert_eq!(quote.current, 3510.00);
}

#[test]
fn passes_arbitrary_query_params() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/quotes")
            .query_param("list", "sh601006")
            .query_param("format", "text");
        then.status(200).body(LINE);
    });

    let mut params = BTreeMap::new();
    params.insert("format".to_string(), "text".to_string());
    params.insert("list".to_string(), "sh601006".to_string());
    let quote = fetcher_for(&server)
        .fetch_quote(&server.url("/quotes"), &params)
        .unwrap();

    mock.assert();
    assert_eq!(quote.name, "上证指数");
}

#[test]
fn non_success_status_is_fetch_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(503).body(LINE);
    });

    let err = fetcher_for(&server)
        .fetch_symbol(&symbol("sh601006"))
        .unwrap_err();

    mock.assert();
    assert_matches!(err, QuoteError::Fetch { status: Some(503), .. });
}

#[test]
fn empty_body_is_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("");
    });

    let err = fetcher_for(&server)
        .fetch_symbol(&symbol("sh601006"))
        .unwrap_err();
    assert_matches!(err, QuoteError::Parse(_));
}

#[test]
fn short_body_is_schema_mismatch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("\"sh601006\",上证指数,3500.00");
    });

    let err = fetcher_for(&server)
        .fetch_symbol(&symbol("sh601006"))
        .unwrap_err();
    assert_matches!(err, QuoteError::SchemaMismatch { found: 3, .. });
}

#[test]
fn connection_failure_is_fetch_error() {
    let fetcher = QuoteFetcher::new(FetcherConfig {
        endpoint: "http://127.0.0.1:1/".to_string(),
        timeout: Some(Duration::from_secs(2)),
        referer: None,
        ..FetcherConfig::default()
    })
    .unwrap();

    let err = fetcher.fetch_symbol(&symbol("sh601006")).unwrap_err();
    assert_matches!(err, QuoteError::Fetch { status: None, .. });
}

#[test]
fn fetch_all_reports_each_symbol() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/").query_param("list", "sh601006");
        then.status(200).body(LINE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/").query_param("list", "sz000001");
        then.status(404);
    });

    let mut results = fetcher_for(&server).fetch_all(&[symbol("sh601006"), symbol("sz000001")]);
    results.sort_by_key(|(s, _)| s.to_string());

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, symbol("sh601006"));
    assert!(results[0].1.is_ok());
    assert_eq!(results[1].0, symbol("sz000001"));
    assert_matches!(results[1].1, Err(QuoteError::Fetch { status: Some(404), .. }));
}

#[test]
fn fetch_all_handles_more_symbols_than_workers() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body(LINE);
    });

    let symbols: Vec<Symbol> = (0..20).map(|i| symbol(&format!("sh6010{:02}", i))).collect();
    let fetcher = QuoteFetcher::new(FetcherConfig {
        endpoint: server.url("/"),
        max_parallel: 3,
        ..FetcherConfig::default()
    })
    .unwrap();

    let results = fetcher.fetch_all(&symbols);

    assert_eq!(results.len(), 20);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    let mut seen: Vec<Symbol> = results.into_iter().map(|(s, _)| s).collect();
    seen.sort_by_key(|s| s.to_string());
    assert_eq!(seen, symbols);
}

#[test]
fn fetch_all_never_exceeds_worker_limit() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).delay(Duration::from_millis(200)).body(LINE);
    });

    let symbols: Vec<Symbol> = (0..4).map(|i| symbol(&format!("sz00000{}", i))).collect();
    let fetcher = QuoteFetcher::new(FetcherConfig {
        endpoint: server.url("/"),
        max_parallel: 1,
        ..FetcherConfig::default()
    })
    .unwrap();

    let started = Instant::now();
    let results = fetcher.fetch_all(&symbols);

    assert_eq!(results.len(), 4);
    // One worker serves the delayed answers back to back.
    assert!(started.elapsed() >= Duration::from_millis(800));
}

#[test]
fn fetch_all_of_nothing_is_empty() {
    let fetcher = QuoteFetcher::new(FetcherConfig::default()).unwrap();
    assert!(fetcher.fetch_all(&[]).is_empty());
}
