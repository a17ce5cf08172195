//! Decoding of Sina-style quote lines.
//!
//! The source answers with one comma-separated line per instrument:
//!
//! ```text
//! "symbol,name,open,prevClose,current,high,low,bid,ask,volume,...,date,time"
//! ```
//!
//! The live endpoint wraps the payload in a JavaScript assignment instead,
//! `var hq_str_sh601006="name,open,...,date,time,00";`, with the symbol carried
//! by the variable name. Both shapes are accepted.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use stock_common::QuoteError;

use crate::model::quote::QuoteRecord;

/// Minimum number of fields: ten positional values plus date and time.
pub const MIN_FIELDS: usize = 12;

const VAR_PREFIX: &str = "var hq_str_";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Parses the first non-empty line of a response body.
pub fn parse_body(body: &str) -> Result<QuoteRecord, QuoteError> {
    let line = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| QuoteError::Parse("empty response body".to_string()))?;
    parse_line(line)
}

/// Parses a single quote line into a record.
pub fn parse_line(line: &str) -> Result<QuoteRecord, QuoteError> {
    let fields = split_fields(line)?;
    if fields.len() < MIN_FIELDS {
        return Err(QuoteError::SchemaMismatch {
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let symbol = fields[0];
    if symbol.is_empty() {
        return Err(QuoteError::Parse("missing symbol".to_string()));
    }

    Ok(QuoteRecord {
        symbol: symbol.to_string(),
        name: fields[1].to_string(),
        open: price(&fields, 2, "open")?,
        prev_close: price(&fields, 3, "prev_close")?,
        current: price(&fields, 4, "current")?,
        high: price(&fields, 5, "high")?,
        low: price(&fields, 6, "low")?,
        bid: price(&fields, 7, "bid")?,
        ask: price(&fields, 8, "ask")?,
        volume: volume(fields[9])?,
        timestamp: timestamp(&fields)?,
    })
}

fn split_fields(line: &str) -> Result<Vec<&str>, QuoteError> {
    let line = line.trim().trim_end_matches(';').trim();
    if line.is_empty() {
        return Err(QuoteError::Parse("empty quote line".to_string()));
    }

    if let Some(rest) = line.strip_prefix(VAR_PREFIX) {
        let (symbol, payload) = rest
            .split_once('=')
            .ok_or_else(|| QuoteError::Parse(format!("malformed assignment: {}", line)))?;
        let payload = payload.trim().trim_matches('"');
        if payload.is_empty() {
            return Err(QuoteError::Parse(format!(
                "no quote data for {}",
                symbol.trim()
            )));
        }
        let mut fields = vec![symbol.trim()];
        fields.extend(payload.split(',').map(clean));
        return Ok(fields);
    }

    Ok(line.split(',').map(clean).collect())
}

fn clean(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

fn price(fields: &[&str], index: usize, name: &str) -> Result<f64, QuoteError> {
    let raw = fields[index];
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| QuoteError::Parse(format!("invalid {} value: {:?}", name, raw)))
}

fn volume(raw: &str) -> Result<u64, QuoteError> {
    if let Ok(shares) = raw.parse::<u64>() {
        return Ok(shares);
    }
    // Some feeds print integral volumes with a fractional part.
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => {
            Ok(value as u64)
        }
        _ => Err(QuoteError::Parse(format!("invalid volume value: {:?}", raw))),
    }
}

/// Finds the last adjacent date/time pair after the positional block.
fn timestamp(fields: &[&str]) -> Result<NaiveDateTime, QuoteError> {
    (10..fields.len() - 1)
        .rev()
        .find_map(|i| {
            let date = NaiveDate::parse_from_str(fields[i], DATE_FORMAT).ok()?;
            let time = NaiveTime::parse_from_str(fields[i + 1], TIME_FORMAT).ok()?;
            Some(NaiveDateTime::new(date, time))
        })
        .ok_or_else(|| QuoteError::Parse("missing quote date/time".to_string()))
}
