//! Document-store handle.
//!
//! `DocumentStore` is the capability the adapter issues reads and writes
//! through. Its lifecycle (connection, teardown) belongs to whoever built it;
//! the adapter only holds a shared reference. Documents are JSON maps with the
//! primary key under [`ID_FIELD`].

use std::cmp::Ordering;

use serde_json::{Map, Value};
use stock_common::StoreError;

/// Key holding the primary identifier of every document.
pub const ID_FIELD: &str = "_id";

/// Storage representation of one entity.
pub type Document = Map<String, Value>;

/// Result of a write, in affected-count terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Documents the write's selector matched.
    pub matched: u64,
    /// Documents actually inserted, modified or removed.
    pub affected: u64,
}

impl WriteOutcome {
    /// Whether the write touched anything.
    pub fn is_affected(&self) -> bool {
        self.affected > 0
    }
}

/// One predicate on a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals the value.
    Eq(String, Value),
    /// Field equals one of the values.
    In(String, Vec<Value>),
    /// Field is greater than or equal to the value.
    Gte(String, Value),
    /// Field is less than or equal to the value.
    Lte(String, Value),
}

/// Conjunction of clauses; the empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter selecting a single primary key.
    pub fn by_id(id: Value) -> Self {
        Self::all().eq(ID_FIELD, id)
    }

    /// Adds an equality clause.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.to_string(), value.into()));
        self
    }

    /// Adds a membership clause.
    pub fn any_of(mut self, field: &str, values: Vec<Value>) -> Self {
        self.clauses.push(Clause::In(field.to_string(), values));
        self
    }

    /// Adds a lower-bound clause.
    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Gte(field.to_string(), value.into()));
        self
    }

    /// Adds an upper-bound clause.
    pub fn lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Lte(field.to_string(), value.into()));
        self
    }

    /// Clauses in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluates the filter against a document.
    ///
    /// Missing fields never match. Range clauses compare numbers numerically
    /// and strings lexicographically; mixed kinds do not match.
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, value) => doc.get(field).is_some_and(|v| values_equal(v, value)),
            Clause::In(field, values) => doc
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
            Clause::Gte(field, bound) => doc
                .get(field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|ord| ord != Ordering::Less),
            Clause::Lte(field, bound) => doc
                .get(field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|ord| ord != Ordering::Greater),
        })
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Partial update: `set` overwrites fields, `push` appends to array fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    /// Fields to overwrite.
    pub set: Document,
    /// Array fields to extend, with the values to append.
    pub push: Map<String, Value>,
}

impl Update {
    /// Whether the update carries no changes.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.push.is_empty()
    }
}

/// Opaque capability to read and write documents.
///
/// Implementations must be safe to share across threads; any atomicity beyond
/// a single call is up to the implementation.
pub trait DocumentStore: Send + Sync {
    /// Reserves the next surrogate key of a collection.
    fn next_id(&self, collection: &str) -> Result<u64, StoreError>;

    /// Inserts a document that already carries its `_id`.
    ///
    /// Fails with `DuplicateKey` when the `_id` or a unique field collides.
    fn insert(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// Replaces the document with the given `_id` wholesale, inserting it when
    /// absent and `upsert` is set.
    fn replace(
        &self,
        collection: &str,
        id: &Value,
        doc: Document,
        upsert: bool,
    ) -> Result<WriteOutcome, StoreError>;

    /// Applies a partial update to the document with the given `_id`.
    fn update(&self, collection: &str, id: &Value, update: &Update)
    -> Result<WriteOutcome, StoreError>;

    /// Returns all documents matching the filter.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Counts documents matching the filter.
    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Removes all documents matching the filter.
    fn delete(&self, collection: &str, filter: &Filter) -> Result<WriteOutcome, StoreError>;

    /// Declares a unique constraint on a field. Idempotent.
    fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc(json!({"a": 1}))));
        assert!(Filter::all().matches(&Document::new()));
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        let d = doc(json!({"_id": 7}));
        assert!(Filter::by_id(json!(7u64)).matches(&d));
        assert!(Filter::by_id(json!(7.0)).matches(&d));
        assert!(!Filter::by_id(json!("7")).matches(&d));
    }

    #[test]
    fn range_and_membership_clauses() {
        let d = doc(json!({"ts": 100, "ip": "10.0.0.1"}));
        assert!(Filter::all().gte("ts", 100).lte("ts", 200).matches(&d));
        assert!(!Filter::all().gte("ts", 101).matches(&d));
        assert!(Filter::all().any_of("ip", vec![json!("x"), json!("10.0.0.1")]).matches(&d));
        assert!(!Filter::all().eq("missing", 1).matches(&d));
        assert!(!Filter::all().gte("ip", 1).matches(&d));
    }
}
