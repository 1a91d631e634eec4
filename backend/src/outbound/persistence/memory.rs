//! In-memory entity store adapter.
//!
//! One generic adapter serves every entity definition: filters are evaluated
//! through [`EntityDefinition::matches`], and results are ordered by creation
//! time then id so pagination stays stable. Concurrency control is the
//! adapter's own lock; the orchestrator implements no retries on top.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use pagination::PageWindow;
use uuid::Uuid;

use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::{AuditStamp, AuditedEntity, EntityDefinition};

/// `Mutex<HashMap>` store for one entity kind.
#[derive(Default)]
pub struct InMemoryEntityStore<D: EntityDefinition> {
    definition: D,
    records: Mutex<HashMap<Uuid, D::Entity>>,
}

impl<D: EntityDefinition + Default> InMemoryEntityStore<D> {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            definition: D::default(),
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<D: EntityDefinition> InMemoryEntityStore<D> {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<Uuid, D::Entity>>, EntityStoreError> {
        self.records
            .lock()
            .map_err(|_| EntityStoreError::connection("entity store mutex poisoned"))
    }

    fn matching(
        &self,
        guard: &MutexGuard<'_, HashMap<Uuid, D::Entity>>,
        filter: &D::Filter,
        include_archived: bool,
    ) -> Vec<D::Entity> {
        let mut items: Vec<D::Entity> = guard
            .values()
            .filter(|entity| include_archived || !entity.is_archived())
            .filter(|entity| self.definition.matches(entity, filter))
            .cloned()
            .collect();
        items.sort_by_key(|entity| (entity.audit().created().at, entity.id()));
        items
    }
}

#[async_trait]
impl<D: EntityDefinition> EntityStore for InMemoryEntityStore<D> {
    type Entity = D::Entity;
    type Filter = D::Filter;

    async fn insert(&self, entity: &Self::Entity) -> Result<(), EntityStoreError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&entity.id()) {
            return Err(EntityStoreError::conflict(format!(
                "record {} already exists",
                entity.id()
            )));
        }
        guard.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &Self::Entity) -> Result<(), EntityStoreError> {
        let mut guard = self.guard()?;
        if !guard.contains_key(&entity.id()) {
            return Err(EntityStoreError::query(format!(
                "record {} does not exist",
                entity.id()
            )));
        }
        guard.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Self::Entity>, EntityStoreError> {
        let guard = self.guard()?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_one(
        &self,
        filter: &Self::Filter,
    ) -> Result<Option<Self::Entity>, EntityStoreError> {
        let guard = self.guard()?;
        Ok(self.matching(&guard, filter, false).into_iter().next())
    }

    async fn find_all(
        &self,
        filter: &Self::Filter,
        window: PageWindow,
        include_archived: bool,
    ) -> Result<Vec<Self::Entity>, EntityStoreError> {
        let guard = self.guard()?;
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        Ok(self
            .matching(&guard, filter, include_archived)
            .into_iter()
            .skip(offset)
            .take(window.limit as usize)
            .collect())
    }

    async fn count(
        &self,
        filter: &Self::Filter,
        include_archived: bool,
    ) -> Result<u64, EntityStoreError> {
        let guard = self.guard()?;
        Ok(self.matching(&guard, filter, include_archived).len() as u64)
    }

    async fn soft_delete(
        &self,
        id: Uuid,
        stamp: AuditStamp,
    ) -> Result<Option<Self::Entity>, EntityStoreError> {
        let mut guard = self.guard()?;
        Ok(guard.get_mut(&id).map(|entity| {
            entity.audit_mut().record_soft_delete(stamp);
            entity.clone()
        }))
    }

    async fn restore(
        &self,
        id: Uuid,
        stamp: AuditStamp,
    ) -> Result<Option<Self::Entity>, EntityStoreError> {
        let mut guard = self.guard()?;
        Ok(guard.get_mut(&id).map(|entity| {
            entity.audit_mut().record_restore(stamp);
            entity.clone()
        }))
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool, EntityStoreError> {
        let mut guard = self.guard()?;
        Ok(guard.remove(&id).is_some())
    }
}
