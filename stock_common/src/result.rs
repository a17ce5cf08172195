//! Result type alias shared across the workspace.
//!
//! Defaults the error type to the umbrella `StockError`, so top-level functions
//! can simply return `Result<T>` while library code names its narrower error.
use crate::error::StockError;

/// Workspace-wide `Result` alias with `StockError` as the default error.
pub type Result<T, E = StockError> = std::result::Result<T, E>;
