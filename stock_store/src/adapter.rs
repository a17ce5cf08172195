//! Document-store backend for [`BasicDao`].
//!
//! Entities opt in by implementing [`DocumentMapping`], which is the only place
//! that knows their storage layout. [`DocumentDao`] turns the generic contract
//! into `DocumentStore` calls.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use stock_common::StoreError;

use crate::dao::BasicDao;
use crate::store::{Document, DocumentStore, Filter, ID_FIELD, Update, WriteOutcome};

/// Identifier types the document backend can generate and store.
pub trait DocumentKey: Clone + fmt::Display + Sized {
    /// Storage representation.
    fn to_value(&self) -> Value;
    /// Reads the identifier back from storage.
    fn from_value(value: &Value) -> Option<Self>;
    /// Converts a value reserved from the collection sequence.
    fn from_sequence(seq: u64) -> Option<Self>;
}

macro_rules! numeric_key {
    ($($ty:ty),*) => {
        $(
            impl DocumentKey for $ty {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value
                        .as_i64()
                        .and_then(|n| <$ty>::try_from(n).ok())
                        .or_else(|| value.as_u64().and_then(|n| <$ty>::try_from(n).ok()))
                }

                fn from_sequence(seq: u64) -> Option<Self> {
                    <$ty>::try_from(seq).ok()
                }
            }
        )*
    };
}

numeric_key!(i32, i64, u32, u64);

/// Mapping between an entity and its document.
pub trait DocumentMapping: Sized {
    /// Identifier type.
    type Id: DocumentKey;

    /// Collection the entity is stored in.
    const COLLECTION: &'static str;
    /// Fields carrying a unique constraint besides `_id`.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];
    /// List-valued fields that `update_and_append` extends instead of overwriting.
    const APPEND_FIELDS: &'static [&'static str] = &[];

    /// Identifier, if the entity has been persisted.
    fn id(&self) -> Option<&Self::Id>;

    /// Records the identifier assigned by the store.
    fn assign_id(&mut self, id: Self::Id);

    /// Business fields as a document, without `_id`. Unset optional fields are `null`.
    fn to_document(&self) -> Document;

    /// Rebuilds the entity from a stored document, `_id` included.
    fn from_document(doc: &Document) -> Result<Self, StoreError>;
}

/// Typed field access over a stored document, reporting failures as
/// [`StoreError::Mapping`] against the collection.
pub struct DocReader<'a> {
    collection: &'static str,
    doc: &'a Document,
}

impl<'a> DocReader<'a> {
    /// Wraps a document read from `collection`.
    pub fn new(collection: &'static str, doc: &'a Document) -> Self {
        Self { collection, doc }
    }

    fn error(&self, reason: String) -> StoreError {
        StoreError::Mapping {
            collection: self.collection.to_string(),
            reason,
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.doc.get(field).filter(|v| !v.is_null())
    }

    /// The `_id` of the document.
    pub fn id<K: DocumentKey>(&self) -> Result<K, StoreError> {
        self.present(ID_FIELD)
            .and_then(K::from_value)
            .ok_or_else(|| self.error("missing or invalid _id".to_string()))
    }

    /// Required string field.
    pub fn string(&self, field: &str) -> Result<String, StoreError> {
        self.opt_string(field)?
            .ok_or_else(|| self.error(format!("missing field {}", field)))
    }

    /// Optional string field.
    pub fn opt_string(&self, field: &str) -> Result<Option<String>, StoreError> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.error(format!("field {} is not a string: {}", field, other))),
        }
    }

    /// Required integer field.
    pub fn integer(&self, field: &str) -> Result<i64, StoreError> {
        self.present(field)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.error(format!("missing or non-integer field {}", field)))
    }

    /// Required timestamp stored as an RFC 3339 string.
    pub fn timestamp(&self, field: &str) -> Result<DateTime<Utc>, StoreError> {
        let raw = self.string(field)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| self.error(format!("invalid timestamp in {}: {} ({})", field, raw, e)))
    }

    /// String array field; absent means empty.
    pub fn strings(&self, field: &str) -> Result<Vec<String>, StoreError> {
        match self.present(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.error(format!("non-string item in {}", field)))
                })
                .collect(),
            Some(other) => Err(self.error(format!("field {} is not an array: {}", field, other))),
        }
    }
}

/// Generic [`BasicDao`] over a [`DocumentStore`].
pub struct DocumentDao<E> {
    store: Option<Arc<dyn DocumentStore>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for DocumentDao<E> {
    fn default() -> Self {
        Self {
            store: None,
            _entity: PhantomData,
        }
    }
}

impl<E: DocumentMapping> DocumentDao<E> {
    /// Unbound DAO; call [`BasicDao::bind_store`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// DAO already bound to `store`.
    pub fn bound(store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        let mut dao = Self::new();
        dao.bind_store(store)?;
        Ok(dao)
    }

    fn store(&self) -> Result<&Arc<dyn DocumentStore>, StoreError> {
        self.store.as_ref().ok_or(StoreError::NotInitialized)
    }

    /// All entities matching `filter`.
    pub fn find(&self, filter: &Filter) -> Result<Vec<E>, StoreError> {
        self.store()?
            .find(E::COLLECTION, filter)?
            .iter()
            .map(E::from_document)
            .collect()
    }

    fn not_found(id: impl fmt::Display) -> StoreError {
        StoreError::NotFound {
            collection: E::COLLECTION.to_string(),
            id: id.to_string(),
        }
    }
}

impl<E: DocumentMapping> BasicDao<E, E::Id> for DocumentDao<E> {
    type Store = Arc<dyn DocumentStore>;
    type Query = Filter;

    fn bind_store(&mut self, store: Self::Store) -> Result<(), StoreError> {
        for field in E::UNIQUE_FIELDS {
            store.ensure_unique_index(E::COLLECTION, field)?;
        }
        self.store = Some(store);
        Ok(())
    }

    fn create(&self, entity: &mut E) -> Result<E::Id, StoreError> {
        let store = self.store()?;
        let id = match entity.id() {
            Some(id) => id.clone(),
            None => {
                let seq = store.next_id(E::COLLECTION)?;
                E::Id::from_sequence(seq).ok_or_else(|| {
                    StoreError::BackendUnavailable(format!(
                        "{} id sequence exhausted at {}",
                        E::COLLECTION,
                        seq
                    ))
                })?
            }
        };

        let mut doc = entity.to_document();
        doc.insert(ID_FIELD.to_string(), id.to_value());
        store.insert(E::COLLECTION, doc)?;
        entity.assign_id(id.clone());
        debug!("created {} {}", E::COLLECTION, id);
        Ok(id)
    }

    fn create_or_replace(&self, entity: &mut E) -> Result<E::Id, StoreError> {
        let store = self.store()?;
        let Some(id) = entity.id().cloned() else {
            return self.create(entity);
        };
        store.replace(E::COLLECTION, &id.to_value(), entity.to_document(), true)?;
        Ok(id)
    }

    fn delete_by_id(&self, id: &E::Id) -> Result<WriteOutcome, StoreError> {
        self.store()?
            .delete(E::COLLECTION, &Filter::by_id(id.to_value()))
    }

    fn get_by_id(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        self.store()?
            .find(E::COLLECTION, &Filter::by_id(id.to_value()))?
            .first()
            .map(E::from_document)
            .transpose()
    }

    fn exists(&self, id: &E::Id) -> Result<bool, StoreError> {
        let found = self
            .store()?
            .count(E::COLLECTION, &Filter::by_id(id.to_value()))?;
        Ok(found > 0)
    }

    fn update_and_append(&self, entity: &E) -> Result<WriteOutcome, StoreError> {
        let store = self.store()?;
        let id = entity.id().ok_or_else(|| Self::not_found("<unassigned>"))?;

        let mut update = Update::default();
        for (field, value) in entity.to_document() {
            if field == ID_FIELD || value.is_null() {
                continue;
            }
            if E::APPEND_FIELDS.contains(&field.as_str()) {
                if value.as_array().is_some_and(|items| !items.is_empty()) {
                    update.push.insert(field, value);
                }
            } else {
                update.set.insert(field, value);
            }
        }

        let outcome = store.update(E::COLLECTION, &id.to_value(), &update)?;
        if outcome.matched == 0 {
            return Err(Self::not_found(id));
        }
        Ok(outcome)
    }

    fn get_by_ids(&self, ids: &[E::Id]) -> Result<Vec<E>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys = ids.iter().map(|id| id.to_value()).collect();
        self.find(&Filter::all().any_of(ID_FIELD, keys))
    }

    fn count(&self, query: &Filter) -> Result<u64, StoreError> {
        self.store()?.count(E::COLLECTION, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: Option<u64>,
        title: String,
        body: Option<String>,
        tags: Vec<String>,
    }

    impl Note {
        fn new(title: &str) -> Self {
            Note {
                id: None,
                title: title.to_string(),
                body: None,
                tags: Vec::new(),
            }
        }
    }

    impl DocumentMapping for Note {
        type Id = u64;
        const COLLECTION: &'static str = "notes";
        const UNIQUE_FIELDS: &'static [&'static str] = &["title"];
        const APPEND_FIELDS: &'static [&'static str] = &["tags"];

        fn id(&self) -> Option<&u64> {
            self.id.as_ref()
        }

        fn assign_id(&mut self, id: u64) {
            self.id = Some(id);
        }

        fn to_document(&self) -> Document {
            let mut doc = Document::new();
            doc.insert("title".into(), json!(self.title));
            doc.insert("body".into(), json!(self.body));
            doc.insert("tags".into(), json!(self.tags));
            doc
        }

        fn from_document(doc: &Document) -> Result<Self, StoreError> {
            let r = DocReader::new(Self::COLLECTION, doc);
            Ok(Note {
                id: Some(r.id()?),
                title: r.string("title")?,
                body: r.opt_string("body")?,
                tags: r.strings("tags")?,
            })
        }
    }

    fn dao() -> DocumentDao<Note> {
        DocumentDao::bound(Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn unbound_dao_reports_not_initialized() {
        let dao = DocumentDao::<Note>::new();
        let mut note = Note::new("a");
        assert_matches!(dao.create(&mut note), Err(StoreError::NotInitialized));
        assert_matches!(dao.create_or_replace(&mut note), Err(StoreError::NotInitialized));
        assert_matches!(dao.get_by_id(&1), Err(StoreError::NotInitialized));
        assert_matches!(dao.exists(&1), Err(StoreError::NotInitialized));
        assert_matches!(dao.delete_by_id(&1), Err(StoreError::NotInitialized));
        assert_matches!(dao.update_and_append(&note), Err(StoreError::NotInitialized));
        assert_matches!(dao.get_by_ids(&[1]), Err(StoreError::NotInitialized));
        assert_matches!(dao.count(&Filter::all()), Err(StoreError::NotInitialized));
        assert_eq!(note.id, None);
    }

    #[test]
    fn create_assigns_id_and_round_trips_fields() {
        let dao = dao();
        let mut note = Note::new("first");
        note.body = Some("hello".into());
        note.tags = vec!["x".into()];

        let id = dao.create(&mut note).unwrap();
        assert_eq!(note.id, Some(id));

        let loaded = dao.get_by_id(&id).unwrap().unwrap();
        assert_eq!(loaded, note);
    }

    #[test]
    fn ids_are_unique_per_collection() {
        let dao = dao();
        let a = dao.create(&mut Note::new("a")).unwrap();
        let b = dao.create(&mut Note::new("b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn create_rejects_unique_violation() {
        let dao = dao();
        dao.create(&mut Note::new("same")).unwrap();
        let mut dup = Note::new("same");
        assert_matches!(dao.create(&mut dup), Err(StoreError::DuplicateKey { .. }));
        assert_eq!(dup.id, None);
        assert_eq!(dao.count(&Filter::all()).unwrap(), 1);
    }

    #[test]
    fn get_and_delete_of_missing_id() {
        let dao = dao();
        assert_eq!(dao.get_by_id(&42).unwrap(), None);
        assert_eq!(dao.delete_by_id(&42).unwrap().affected, 0);
        assert!(!dao.exists(&42).unwrap());
    }

    #[test]
    fn deleted_id_is_no_longer_readable() {
        let dao = dao();
        let id = dao.create(&mut Note::new("gone")).unwrap();
        assert!(dao.exists(&id).unwrap());
        assert_eq!(dao.delete_by_id(&id).unwrap().affected, 1);
        assert!(!dao.exists(&id).unwrap());
        assert_eq!(dao.get_by_id(&id).unwrap(), None);
    }

    #[test]
    fn create_or_replace_replaces_everything() {
        let dao = dao();
        let mut note = Note::new("v1");
        note.body = Some("body".into());
        note.tags = vec!["a".into()];
        let id = dao.create_or_replace(&mut note).unwrap();

        let mut second = Note::new("v2");
        second.id = Some(id);
        assert_eq!(dao.create_or_replace(&mut second).unwrap(), id);

        let loaded = dao.get_by_id(&id).unwrap().unwrap();
        assert_eq!(loaded, second);
        assert_eq!(loaded.body, None);
        assert!(loaded.tags.is_empty());
    }

    #[test]
    fn update_and_append_overwrites_scalars_and_appends_lists() {
        let dao = dao();
        let mut note = Note::new("title");
        note.body = Some("keep me".into());
        note.tags = vec!["a".into()];
        let id = dao.create(&mut note).unwrap();

        let patch = Note {
            id: Some(id),
            title: "renamed".into(),
            body: None,
            tags: vec!["b".into(), "c".into()],
        };
        assert!(dao.update_and_append(&patch).unwrap().is_affected());

        let loaded = dao.get_by_id(&id).unwrap().unwrap();
        assert_eq!(loaded.title, "renamed");
        assert_eq!(loaded.body.as_deref(), Some("keep me"));
        assert_eq!(loaded.tags, ["a", "b", "c"]);
    }

    #[test]
    fn update_and_append_requires_existing_id() {
        let dao = dao();
        let mut ghost = Note::new("ghost");
        assert_matches!(dao.update_and_append(&ghost), Err(StoreError::NotFound { .. }));
        ghost.id = Some(99);
        assert_matches!(
            dao.update_and_append(&ghost),
            Err(StoreError::NotFound { id, .. }) if id == "99"
        );
    }

    #[test]
    fn get_by_ids_omits_missing() {
        let dao = dao();
        let id = dao.create(&mut Note::new("only")).unwrap();
        let found = dao.get_by_ids(&[id, 1000]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Some(id));
        assert!(dao.get_by_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn mapping_error_surfaces_on_read() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("notes", json!({"_id": 1, "title": 5}).as_object().unwrap().clone())
            .unwrap();
        let dao = DocumentDao::<Note>::bound(store).unwrap();
        assert_matches!(dao.get_by_id(&1), Err(StoreError::Mapping { .. }));
    }

    #[test]
    fn numeric_keys_respect_range() {
        assert_eq!(i32::from_sequence(u64::MAX), None);
        assert_eq!(i64::from_value(&json!(12)), Some(12));
        assert_eq!(u32::from_value(&json!(-1)), None);
        assert_eq!(u64::from_value(&json!("1")), None);
    }

    /// Store whose backend is gone; index declarations optionally still succeed.
    struct OfflineStore {
        indexes_ok: bool,
    }

    fn offline<T>() -> Result<T, StoreError> {
        Err(StoreError::BackendUnavailable("connection reset".into()))
    }

    impl DocumentStore for OfflineStore {
        fn next_id(&self, _: &str) -> Result<u64, StoreError> {
            offline()
        }

        fn insert(&self, _: &str, _: Document) -> Result<(), StoreError> {
            offline()
        }

        fn replace(&self, _: &str, _: &Value, _: Document, _: bool) -> Result<WriteOutcome, StoreError> {
            offline()
        }

        fn update(&self, _: &str, _: &Value, _: &Update) -> Result<WriteOutcome, StoreError> {
            offline()
        }

        fn find(&self, _: &str, _: &Filter) -> Result<Vec<Document>, StoreError> {
            offline()
        }

        fn count(&self, _: &str, _: &Filter) -> Result<u64, StoreError> {
            offline()
        }

        fn delete(&self, _: &str, _: &Filter) -> Result<WriteOutcome, StoreError> {
            offline()
        }

        fn ensure_unique_index(&self, _: &str, _: &str) -> Result<(), StoreError> {
            if self.indexes_ok { Ok(()) } else { offline() }
        }
    }

    #[test]
    fn backend_failure_propagates_from_every_operation() {
        let dao = DocumentDao::<Note>::bound(Arc::new(OfflineStore { indexes_ok: true })).unwrap();
        let mut fresh = Note::new("a");
        let mut stored = Note::new("b");
        stored.id = Some(3);

        assert_matches!(dao.create(&mut fresh), Err(StoreError::BackendUnavailable(_)));
        assert_eq!(fresh.id, None);
        assert_matches!(dao.create(&mut stored), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.create_or_replace(&mut stored), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.get_by_id(&3), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.exists(&3), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.delete_by_id(&3), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.update_and_append(&stored), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.get_by_ids(&[3]), Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.count(&Filter::all()), Err(StoreError::BackendUnavailable(_)));
    }

    #[test]
    fn binding_fails_when_indexes_cannot_be_declared() {
        let mut dao = DocumentDao::<Note>::new();
        let result = dao.bind_store(Arc::new(OfflineStore { indexes_ok: false }));
        assert_matches!(result, Err(StoreError::BackendUnavailable(_)));
        assert_matches!(dao.count(&Filter::all()), Err(StoreError::NotInitialized));
    }

    #[derive(Debug)]
    struct Tally {
        id: Option<i32>,
    }

    impl DocumentMapping for Tally {
        type Id = i32;
        const COLLECTION: &'static str = "tallies";

        fn id(&self) -> Option<&i32> {
            self.id.as_ref()
        }

        fn assign_id(&mut self, id: i32) {
            self.id = Some(id);
        }

        fn to_document(&self) -> Document {
            Document::new()
        }

        fn from_document(doc: &Document) -> Result<Self, StoreError> {
            Ok(Tally {
                id: Some(DocReader::new(Self::COLLECTION, doc).id()?),
            })
        }
    }

    #[test]
    fn exhausted_id_sequence_is_backend_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("tallies", json!({"_id": i32::MAX}).as_object().unwrap().clone())
            .unwrap();
        let dao = DocumentDao::<Tally>::bound(store).unwrap();

        let mut tally = Tally { id: None };
        assert_matches!(
            dao.create(&mut tally),
            Err(StoreError::BackendUnavailable(reason)) if reason.contains("exhausted")
        );
        assert_eq!(tally.id, None);
        assert_eq!(dao.count(&Filter::all()).unwrap(), 1);
    }
}
