//! Stock symbols and helpers shared by the store and the connector.
//!
//! A symbol is an exchange prefix followed by a six-digit code, e.g. `sh601006`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::error::StockError;

/// Trait providing file parsing for symbols.
pub trait SymbolParser {
    /// Parses symbols from a buffered reader.
    ///
    /// Symbols may be separated by commas, whitespace, or new lines. Empty
    /// entries are skipped; any entry that is not a valid symbol is an error.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Symbol>, StockError>;
}

impl SymbolParser for Symbol {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, StockError> {
        let mut symbols = Vec::new();

        for line_result in reader.lines() {
            let line = line_result.map_err(StockError::Io)?;
            for raw in line.split(|c: char| c == ',' || c.is_whitespace()) {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed.parse::<Self>() {
                    Ok(symbol) => symbols.push(symbol),
                    Err(e) => return Err(StockError::ParseSymbolsFile(e.to_string())),
                }
            }
        }
        Ok(symbols)
    }
}

/// Exchanges served by the quote source.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[clap(rename_all = "lower")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Exchange {
    /// Shanghai Stock Exchange.
    Sh,
    /// Shenzhen Stock Exchange.
    Sz,
    /// Beijing Stock Exchange.
    Bj,
}

/// Exchange-qualified instrument code.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct Symbol {
    /// Listing exchange.
    pub exchange: Exchange,
    /// Six-digit instrument code.
    pub code: String,
}

impl Symbol {
    /// Creates a symbol from its parts, validating the code.
    pub fn new(exchange: Exchange, code: &str) -> Result<Self, StockError> {
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StockError::Format(format!(
                "instrument code must be six digits: {}",
                code
            )));
        }
        Ok(Symbol {
            exchange,
            code: code.to_string(),
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.exchange, self.code)
    }
}

impl FromStr for Symbol {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() < 2 || !s.is_char_boundary(2) {
            return Err(StockError::Format(format!("invalid symbol: {}", s)));
        }
        let (prefix, code) = s.split_at(2);
        let exchange = prefix
            .parse::<Exchange>()
            .map_err(|_| StockError::Format(format!("unknown exchange in symbol: {}", s)))?;
        Symbol::new(exchange, code)
    }
}
