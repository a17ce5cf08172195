//! In-process document store.
//!
//! Collections live behind one mutex. Each collection keeps its documents
//! keyed by canonical `_id`, a monotonically increasing id sequence, and the
//! set of fields declared unique.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use log::debug;
use serde_json::Value;
use stock_common::StoreError;

use crate::store::{Document, DocumentStore, Filter, ID_FIELD, Update, WriteOutcome};

#[derive(Default)]
struct Collection {
    docs: BTreeMap<String, Document>,
    sequence: u64,
    unique: BTreeSet<String>,
}

impl Collection {
    /// Rejects `doc` if it collides on a unique field with any document other
    /// than the one stored under `own_key`.
    fn check_unique(&self, name: &str, own_key: &str, doc: &Document) -> Result<(), StoreError> {
        for field in &self.unique {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = self
                .docs
                .iter()
                .any(|(key, other)| key != own_key && other.get(field) == Some(value));
            if clash {
                return Err(StoreError::DuplicateKey {
                    collection: name.to_string(),
                    field: field.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn bump_sequence(&mut self, id: &Value) {
        if let Some(n) = id.as_u64() {
            self.sequence = self.sequence.max(n);
        }
    }
}

/// Canonical map key for an `_id`, so `7`, `7u64` and `7.0` address the same slot.
fn id_key(id: &Value) -> String {
    match id {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        (f as i64).to_string()
                    }
                    _ => n.to_string(),
                }
            }
        }
        other => format!("~{}", other),
    }
}

/// Thread-safe in-memory implementation of [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn next_id(&self, collection: &str) -> Result<u64, StoreError> {
        let mut collections = self.collections.lock()?;
        let coll = collections.entry(collection.to_string()).or_default();
        coll.sequence += 1;
        Ok(coll.sequence)
    }

    fn insert(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        let id = doc.get(ID_FIELD).cloned().ok_or_else(|| StoreError::Mapping {
            collection: collection.to_string(),
            reason: "document has no _id".to_string(),
        })?;
        let key = id_key(&id);

        let mut collections = self.collections.lock()?;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.docs.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                field: ID_FIELD.to_string(),
                value: id.to_string(),
            });
        }
        coll.check_unique(collection, &key, &doc)?;
        coll.bump_sequence(&id);
        coll.docs.insert(key, doc);
        debug!("insert {}/{}", collection, id);
        Ok(())
    }

    fn replace(
        &self,
        collection: &str,
        id: &Value,
        mut doc: Document,
        upsert: bool,
    ) -> Result<WriteOutcome, StoreError> {
        doc.insert(ID_FIELD.to_string(), id.clone());
        let key = id_key(id);

        let mut collections = self.collections.lock()?;
        let coll = collections.entry(collection.to_string()).or_default();
        let existed = coll.docs.contains_key(&key);
        if !existed && !upsert {
            return Ok(WriteOutcome::default());
        }
        coll.check_unique(collection, &key, &doc)?;
        coll.bump_sequence(id);
        coll.docs.insert(key, doc);
        debug!("replace {}/{} (existed: {})", collection, id, existed);

        Ok(WriteOutcome {
            matched: u64::from(existed),
            affected: 1,
        })
    }

    fn update(
        &self,
        collection: &str,
        id: &Value,
        update: &Update,
    ) -> Result<WriteOutcome, StoreError> {
        let key = id_key(id);

        let mut collections = self.collections.lock()?;
        let coll = collections.entry(collection.to_string()).or_default();
        let Some(current) = coll.docs.get(&key) else {
            return Ok(WriteOutcome::default());
        };

        let mut next = current.clone();
        for (field, value) in &update.set {
            if field != ID_FIELD {
                next.insert(field.clone(), value.clone());
            }
        }
        for (field, values) in &update.push {
            let slot = next
                .entry(field.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(items) = slot else {
                return Err(StoreError::Mapping {
                    collection: collection.to_string(),
                    reason: format!("cannot append to non-array field {}", field),
                });
            };
            match values {
                Value::Array(extra) => items.extend(extra.iter().cloned()),
                single => items.push(single.clone()),
            }
        }

        let changed = &next != current;
        if changed {
            coll.check_unique(collection, &key, &next)?;
            coll.docs.insert(key, next);
        }
        debug!("update {}/{} (changed: {})", collection, id, changed);

        Ok(WriteOutcome {
            matched: 1,
            affected: u64::from(changed),
        })
    }

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock()?;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.docs
                    .values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.lock()?;
        Ok(collections
            .get(collection)
            .map(|coll| coll.docs.values().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    fn delete(&self, collection: &str, filter: &Filter) -> Result<WriteOutcome, StoreError> {
        let mut collections = self.collections.lock()?;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(WriteOutcome::default());
        };
        let before = coll.docs.len();
        coll.docs.retain(|_, doc| !filter.matches(doc));
        let removed = (before - coll.docs.len()) as u64;
        debug!("delete {} removed {}", collection, removed);

        Ok(WriteOutcome {
            matched: removed,
            affected: removed,
        })
    }

    fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.lock()?;
        let coll = collections.entry(collection.to_string()).or_default();
        if field != ID_FIELD {
            coll.unique.insert(field.to_string());
        }
        Ok(())
    }
}
