//! Parsed market quote.
//!
//! A `QuoteRecord` is built fresh from each successfully decoded source line and
//! is never persisted. Prices are in the instrument's trading currency; the
//! timestamp is exchange-local time as reported by the source.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Snapshot quote for a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Exchange-qualified symbol, e.g. `sh601006`.
    pub symbol: String,
    /// Display name as published by the source.
    pub name: String,
    /// Opening price of the session.
    pub open: f64,
    /// Previous session's closing price.
    pub prev_close: f64,
    /// Last traded price.
    pub current: f64,
    /// Session high.
    pub high: f64,
    /// Session low.
    pub low: f64,
    /// Best bid.
    pub bid: f64,
    /// Best ask.
    pub ask: f64,
    /// Traded volume in shares.
    pub volume: u64,
    /// Time of the snapshot.
    pub timestamp: NaiveDateTime,
}

impl QuoteRecord {
    /// Absolute change against the previous close.
    pub fn change(&self) -> f64 {
        self.current - self.prev_close
    }

    /// Percentage change against the previous close; `None` without a reference price.
    pub fn change_percent(&self) -> Option<f64> {
        if self.prev_close == 0.0 {
            return None;
        }
        Some(self.change() / self.prev_close * 100.0)
    }

    /// Encode the quote as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
