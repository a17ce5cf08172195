//! Backend-agnostic persistence contract.
//!
//! `BasicDao` is generic over the entity type `E` and its identifier type `I`.
//! The concrete backend picks the store handle it binds to and the query
//! descriptor `count` accepts; callers only ever see typed entities.

use stock_common::StoreError;

use crate::store::WriteOutcome;

/// Uniform entity lifecycle operations over some store.
///
/// Every operation other than [`BasicDao::bind_store`] fails with
/// [`StoreError::NotInitialized`] until a store has been bound.
pub trait BasicDao<E, I> {
    /// Handle to the live store the implementation issues calls through.
    type Store;
    /// Backend-native query descriptor accepted by [`BasicDao::count`].
    type Query;

    /// Associates this DAO with a store handle.
    fn bind_store(&mut self, store: Self::Store) -> Result<(), StoreError>;

    /// Persists a new entity, writes the assigned identifier back into it, and
    /// returns that identifier.
    fn create(&self, entity: &mut E) -> Result<I, StoreError>;

    /// Fully replaces the entity stored under the same identifier, or behaves
    /// as [`BasicDao::create`] when there is none.
    fn create_or_replace(&self, entity: &mut E) -> Result<I, StoreError>;

    /// Removes the entity. A missing id yields an outcome with zero affected.
    fn delete_by_id(&self, id: &I) -> Result<WriteOutcome, StoreError>;

    /// Fetches the entity, or `None` when nothing is stored under `id`.
    fn get_by_id(&self, id: &I) -> Result<Option<E>, StoreError>;

    /// Existence check that does not materialize the entity.
    fn exists(&self, id: &I) -> Result<bool, StoreError>;

    /// Partial update of an existing entity.
    ///
    /// Provided scalar fields overwrite, unset optional fields are left alone,
    /// and list-valued append fields are extended. Fails with
    /// [`StoreError::NotFound`] when the identifier is unset or unknown.
    fn update_and_append(&self, entity: &E) -> Result<WriteOutcome, StoreError>;

    /// Batch fetch. Result order is unspecified; missing ids are omitted.
    fn get_by_ids(&self, ids: &[I]) -> Result<Vec<E>, StoreError>;

    /// Number of entities matching `query`.
    fn count(&self, query: &Self::Query) -> Result<u64, StoreError>;
}
