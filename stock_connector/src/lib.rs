//!
//! Quote connector: fetches quote lines over HTTP, decodes them into
//! `QuoteRecord`s, and wires the application services together.
//!
//! - `model` — the parsed `QuoteRecord`.
//! - `parser` — positional decoding of Sina-style quote lines.
//! - `fetcher` — blocking HTTP GET with `reqwest`, single and parallel.
//! - `ctx` — explicit service assembly and the name-based registry.
#![warn(missing_docs)]
pub mod ctx;
pub mod fetcher;
pub mod model;
pub mod parser;

pub use ctx::{ServiceRegistry, Services};
pub use fetcher::{FetcherConfig, QuoteFetcher};
pub use model::quote::QuoteRecord;
