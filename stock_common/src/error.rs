//! Error types shared across the workspace.
//!
//! Each side of the system has its own enum so callers can match on the exact
//! failure class:
//! - `StoreError` — persistence contract and document-store failures.
//! - `QuoteError` — fetching and decoding remote quote lines.
//! - `RegistryError` — service lookups by name.
//!
//! `StockError` unifies them (plus I/O and symbol-file problems) for binaries
//! that just want to propagate a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Failures raised by the persistence contract and its backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An operation was issued before `bind_store`.
    #[error("Store not initialized: bind_store must be called first")]
    NotInitialized,

    /// The target of an operation that requires existence is absent.
    #[error("Entity not found: {collection} with id {id}")]
    NotFound {
        /// Collection the lookup ran against.
        collection: String,
        /// Identifier as rendered by the backend.
        id: String,
    },

    /// A unique constraint (primary key or unique index) would be violated.
    #[error("Duplicate key in {collection}: {field} = {value}")]
    DuplicateKey {
        /// Collection holding the constraint.
        collection: String,
        /// Field the constraint is declared on (`_id` for the primary key).
        field: String,
        /// Offending value.
        value: String,
    },

    /// Transport or connection failure in the backing store.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A stored document could not be mapped back into an entity.
    #[error("Mapping error in {collection}: {reason}")]
    Mapping {
        /// Collection the document came from.
        collection: String,
        /// What was wrong with the document.
        reason: String,
    },
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(err: PoisonError<T>) -> Self {
        StoreError::BackendUnavailable(format!("store lock poisoned: {}", err))
    }
}

/// Failures raised while fetching or decoding a quote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Transport-level failure: non-2xx status, timeout, DNS or connection error.
    #[error("Fetch error for {url}: {reason}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// HTTP status when the server answered with a non-success code.
        status: Option<u16>,
        /// Human-readable cause.
        reason: String,
    },

    /// The body was empty or malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The line carried fewer fields than the source schema requires.
    #[error("Schema mismatch: expected at least {expected} fields, found {found}")]
    SchemaMismatch {
        /// Minimum field count of the schema.
        expected: usize,
        /// Fields actually present.
        found: usize,
    },
}

/// Failures raised by the service registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No service is registered under the requested name.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// A service exists under the name but has a different type.
    #[error("Service {name} is not a {expected}")]
    ServiceTypeMismatch {
        /// Requested service name.
        name: String,
        /// Type the caller asked for.
        expected: &'static str,
    },
}

/// Unified error type for binaries and top-level wiring.
#[derive(Error, Debug)]
pub enum StockError {
    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Error while parsing a symbol list into `Symbol` values.
    #[error("Parse symbols file error: {0}")]
    ParseSymbolsFile(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Quote fetch/parse failure.
    #[error(transparent)]
    Quote(#[from] QuoteError),

    /// Service lookup failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
