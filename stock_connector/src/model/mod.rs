//! Data model types produced by the connector:
//! - `quote` — parsed quote records.
pub mod quote;
