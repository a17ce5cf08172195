//! Persistence for the stock desk.
//!
//! - `dao` — the backend-agnostic `BasicDao` contract.
//! - `store` — the `DocumentStore` handle, filters, updates and write outcomes.
//! - `memory` — in-process `DocumentStore`.
//! - `adapter` — `DocumentDao`, the `BasicDao` implementation over a document store.
//! - `model` — entities and their document mappings.
//! - `service` — session and category services.
#![warn(missing_docs)]
pub mod adapter;
pub mod dao;
pub mod memory;
pub mod model;
pub mod service;
pub mod store;

pub use adapter::{DocumentDao, DocumentMapping};
pub use dao::BasicDao;
pub use memory::MemoryStore;
pub use model::{AccessType, Category, Session};
pub use service::{CategoryService, SessionService};
pub use store::{DocumentStore, Filter, WriteOutcome};
