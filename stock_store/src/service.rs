//! Entity services built on the persistence contract.
//!
//! Services get their store handle through the constructor and bind their DAO
//! immediately, so a constructed service is always usable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use stock_common::StoreError;

use crate::adapter::{DocumentDao, DocumentMapping};
use crate::dao::BasicDao;
use crate::model::{Category, Session};
use crate::store::{DocumentStore, Filter};

/// Records and queries session-audit entries.
pub struct SessionService {
    dao: DocumentDao<Session>,
}

impl SessionService {
    /// Binds a session DAO to `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        Ok(Self {
            dao: DocumentDao::bound(store)?,
        })
    }

    /// Persists a new audit entry and returns its id.
    pub fn record(&self, session: &mut Session) -> Result<i64, StoreError> {
        let id = self.dao.create(session)?;
        info!(
            "Session {} recorded as #{} ({} from {})",
            session.session_id, id, session.access_type, session.ip
        );
        Ok(id)
    }

    /// Entry stored under `id`, if any.
    pub fn find(&self, id: i64) -> Result<Option<Session>, StoreError> {
        self.dao.get_by_id(&id)
    }

    /// Deletes an entry; `false` when nothing was stored under `id`.
    pub fn remove(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.dao.delete_by_id(&id)?.is_affected())
    }

    /// Entries recorded from `ip`.
    pub fn count_by_ip(&self, ip: &str) -> Result<u64, StoreError> {
        self.dao.count(&Filter::all().eq(Session::IP, ip))
    }

    /// Entries created at or after `since`.
    pub fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.dao
            .count(&Filter::all().gte(Session::CREATE_TIME, Session::stored_time(since)))
    }
}

/// Maintains stock categories and their symbol lists.
pub struct CategoryService {
    dao: DocumentDao<Category>,
}

impl CategoryService {
    /// Binds a category DAO to `store`, declaring the unique name index.
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        Ok(Self {
            dao: DocumentDao::bound(store)?,
        })
    }

    /// Creates a category. Fails with `DuplicateKey` if the name is taken.
    pub fn add(&self, category: &mut Category) -> Result<i64, StoreError> {
        self.dao.create(category)
    }

    /// Stores the category as given, replacing any existing one with its id.
    pub fn save(&self, category: &mut Category) -> Result<i64, StoreError> {
        self.dao.create_or_replace(category)
    }

    /// Appends symbols to a stored category.
    pub fn add_symbols(&self, id: i64, symbols: &[String]) -> Result<(), StoreError> {
        let current = self.dao.get_by_id(&id)?.ok_or_else(|| StoreError::NotFound {
            collection: Category::COLLECTION.to_string(),
            id: id.to_string(),
        })?;
        let patch = Category::new(&current.name, None, symbols.to_vec()).with_id(id);
        self.dao.update_and_append(&patch)?;
        Ok(())
    }

    /// Category stored under `id`, if any.
    pub fn find(&self, id: i64) -> Result<Option<Category>, StoreError> {
        self.dao.get_by_id(&id)
    }

    /// Category with exactly this name, if any.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .dao
            .find(&Filter::all().eq(Category::NAME, name))?
            .into_iter()
            .next())
    }

    /// Categories for the ids that exist; unknown ids are skipped.
    pub fn find_many(&self, ids: &[i64]) -> Result<Vec<Category>, StoreError> {
        self.dao.get_by_ids(ids)
    }

    /// Deletes a category; `false` when nothing was stored under `id`.
    pub fn remove(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.dao.delete_by_id(&id)?.is_affected())
    }

    /// Number of stored categories.
    pub fn count(&self) -> Result<u64, StoreError> {
        self.dao.count(&Filter::all())
    }
}
