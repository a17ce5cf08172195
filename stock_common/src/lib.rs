//!
//! Common types and utilities shared by the store and the quote connector.
//!
//! This crate aggregates:
//! - `error` — error taxonomy (`StoreError`, `QuoteError`, `RegistryError`) and
//!   the umbrella `StockError`.
//! - `result` — handy `Result<T, StockError>` alias.
//! - `symbols` — exchange-qualified stock symbols and symbol-file parsing.
//! - `net` — quote source defaults.
#![warn(missing_docs)]
pub mod error;
pub mod net;
pub mod result;
pub mod symbols;

pub use error::{QuoteError, RegistryError, StockError, StoreError};
pub use result::Result;
pub use symbols::{Exchange, Symbol};
