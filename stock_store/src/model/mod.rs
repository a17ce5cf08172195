//! Persisted entities and their document mappings:
//! - `session` — session-audit records.
//! - `category` — named symbol groups.

pub mod category;
pub mod session;

pub use category::Category;
pub use session::{AccessType, Session};
