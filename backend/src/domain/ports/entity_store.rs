//! Uniform persistence port for managed entities.
//!
//! One adapter per backing store implements this once, generically; the
//! orchestrator never issues raw queries. Adapters surface failures through
//! [`EntityStoreError`] so the orchestrator can downgrade them to
//! `internal_error` envelopes without leaking driver details.

use async_trait::async_trait;
use pagination::PageWindow;
use uuid::Uuid;

use crate::domain::{AuditStamp, AuditedEntity};

use super::define_port_error;

define_port_error! {
    /// Errors raised by entity store adapters.
    pub enum EntityStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "entity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "entity store query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Conflict { message: String } =>
            "entity store conflict: {message}",
    }
}

/// Driven port exposing the uniform data-access surface.
///
/// `find_all` and `count` take the same filter so a page's `total` always
/// refers to the query that produced its items. Archived records are
/// excluded unless `include_archived` is set; the orchestrator decides when
/// a caller may set it.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Record type persisted by this store.
    type Entity: AuditedEntity + Clone + Send + Sync;
    /// Structured filter the store knows how to evaluate.
    type Filter: Send + Sync;

    /// Persist a new record; fails with `Conflict` when the id exists.
    async fn insert(&self, entity: &Self::Entity) -> Result<(), EntityStoreError>;

    /// Replace the stored state of an existing record.
    async fn update(&self, entity: &Self::Entity) -> Result<(), EntityStoreError>;

    /// Fetch a record by id, archived or not.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Self::Entity>, EntityStoreError>;

    /// First active record matching the filter, in creation order.
    async fn find_one(
        &self,
        filter: &Self::Filter,
    ) -> Result<Option<Self::Entity>, EntityStoreError>;

    /// Records matching the filter within the window, in creation order.
    async fn find_all(
        &self,
        filter: &Self::Filter,
        window: PageWindow,
        include_archived: bool,
    ) -> Result<Vec<Self::Entity>, EntityStoreError>;

    /// Number of records matching the filter.
    async fn count(
        &self,
        filter: &Self::Filter,
        include_archived: bool,
    ) -> Result<u64, EntityStoreError>;

    /// Archive a record, returning its new state, or `None` when absent.
    async fn soft_delete(
        &self,
        id: Uuid,
        stamp: AuditStamp,
    ) -> Result<Option<Self::Entity>, EntityStoreError>;

    /// Clear a record's archive stamp, returning its new state, or `None`
    /// when absent.
    async fn restore(
        &self,
        id: Uuid,
        stamp: AuditStamp,
    ) -> Result<Option<Self::Entity>, EntityStoreError>;

    /// Irreversibly remove a record; `false` when it was already absent.
    async fn hard_delete(&self, id: Uuid) -> Result<bool, EntityStoreError>;
}
