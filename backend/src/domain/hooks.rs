//! Lifecycle extension points around orchestrated operations.
//!
//! Each CRUD operation exposes a before/after pair. Before-hooks may mutate
//! the working copy or fail to abort the operation; after-hooks run once the
//! store call succeeded, typically to maintain denormalised data on related
//! records. All hooks default to no-ops.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ports::EntityStoreError;
use crate::domain::{Actor, DomainError, EntityDefinition};

/// Failure raised by a lifecycle hook.
///
/// A recognised [`DomainError`] passes through to the caller unchanged;
/// anything else is downgraded to an `internal_error` envelope at the
/// orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HookError {
    /// A domain error the hook wants surfaced as-is.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// An unexpected failure; reported as an internal error.
    #[error("lifecycle hook failed: {0}")]
    Failed(String),
}

impl HookError {
    /// Unexpected-failure constructor.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<EntityStoreError> for HookError {
    fn from(error: EntityStoreError) -> Self {
        Self::Failed(error.to_string())
    }
}

/// Named extension points invoked in a fixed order around each operation.
#[async_trait]
pub trait LifecycleHooks<D: EntityDefinition>: Send + Sync {
    /// Runs after the entity is assembled, before it is persisted.
    async fn before_create(&self, actor: &Actor, entity: &mut D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs once the entity is persisted.
    async fn after_create(&self, actor: &Actor, entity: &D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs after the update payload is applied to the working copy, before
    /// it is persisted.
    async fn before_update(&self, actor: &Actor, entity: &mut D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs once the updated entity is persisted.
    async fn after_update(&self, actor: &Actor, entity: &D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs before the record is archived.
    async fn before_soft_delete(
        &self,
        actor: &Actor,
        entity: &D::Entity,
    ) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs once the record is archived; receives the archived state.
    async fn after_soft_delete(&self, actor: &Actor, entity: &D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs before the record is irreversibly removed.
    async fn before_hard_delete(
        &self,
        actor: &Actor,
        entity: &D::Entity,
    ) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs once the record is removed; receives the last persisted state.
    async fn after_hard_delete(&self, actor: &Actor, entity: &D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs before an archived record is restored.
    async fn before_restore(&self, actor: &Actor, entity: &D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }

    /// Runs once the record is active again; receives the restored state.
    async fn after_restore(&self, actor: &Actor, entity: &D::Entity) -> Result<(), HookError> {
        let _ = (actor, entity);
        Ok(())
    }
}

/// Hook set that does nothing, for entities without lifecycle side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

#[async_trait]
impl<D: EntityDefinition> LifecycleHooks<D> for NoHooks {}
