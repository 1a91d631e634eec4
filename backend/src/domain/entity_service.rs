//! Generic CRUD orchestrator for managed entities.
//!
//! [`EntityService`] sequences every operation the same way: validate the
//! payload, load the target record, evaluate the permission, run the
//! before-hook, call the store, run the after-hook, and wrap the outcome in
//! the uniform envelope. Entity-specific behaviour comes in exclusively
//! through the injected capability set ([`EntityDefinition`], hooks, store),
//! never through inheritance.

use std::sync::Arc;

use mockable::Clock;
use pagination::{ListLimits, Page, PageRequest, PaginationError};
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::{
    DecisionRecord, EntityStore, EntityStoreError, HookFailureRecord, PermissionAudit,
};
use crate::domain::{
    Actor, AuditStamp, AuditedEntity, DecisionReason, DomainError, EntityDefinition, HookError,
    LifecycleHooks, OwnershipFlags, PermissionAction, PermissionDecision, PermissionScope,
    ServiceResult, UserId, evaluate,
};

fn map_store_error(error: EntityStoreError) -> DomainError {
    DomainError::internal(format!("entity store failure: {error}"))
}

fn map_pagination_error(error: PaginationError) -> DomainError {
    DomainError::validation(format!("invalid pagination input: {error}"))
}

/// Options shared by list and search calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Client-supplied pagination inputs.
    pub page: PageRequest,
    /// Include archived records; requires the any-scope view grant.
    pub include_archived: bool,
}

impl ListRequest {
    /// First page of active records with the server default size.
    pub const fn first_page() -> Self {
        Self {
            page: PageRequest::first(),
            include_archived: false,
        }
    }
}

/// Orchestrates CRUD operations for one entity kind.
///
/// Generic over the entity's capability set `D`, its store `S`, and its
/// lifecycle hooks `H`; the audit sink and clock are injected as shared
/// trait objects.
pub struct EntityService<D, S, H> {
    definition: D,
    store: Arc<S>,
    hooks: H,
    audit: Arc<dyn PermissionAudit>,
    clock: Arc<dyn Clock>,
    limits: ListLimits,
}

impl<D: Clone, S, H: Clone> Clone for EntityService<D, S, H> {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            store: Arc::clone(&self.store),
            hooks: self.hooks.clone(),
            audit: Arc::clone(&self.audit),
            clock: Arc::clone(&self.clock),
            limits: self.limits,
        }
    }
}

impl<D, S, H> EntityService<D, S, H>
where
    D: EntityDefinition,
    S: EntityStore<Entity = D::Entity, Filter = D::Filter>,
    H: LifecycleHooks<D>,
{
    /// Assemble a service from its capability set.
    pub fn new(
        definition: D,
        store: Arc<S>,
        hooks: H,
        audit: Arc<dyn PermissionAudit>,
        clock: Arc<dyn Clock>,
        limits: ListLimits,
    ) -> Self {
        Self {
            definition,
            store,
            hooks,
            audit,
            clock,
            limits,
        }
    }

    /// The store this service persists through, for collaborating hooks.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    fn stamp(&self, actor: &Actor) -> AuditStamp {
        AuditStamp::new(self.clock.utc(), actor.id())
    }

    /// Evaluate and record one permission decision.
    fn decide(
        &self,
        actor: &Actor,
        action: PermissionAction,
        owner: Option<UserId>,
        archived: bool,
        entity_id: Option<Uuid>,
    ) -> PermissionDecision {
        let flags = OwnershipFlags::resolve(actor, D::RESOURCE, action, owner);
        let decision = evaluate(actor, action, flags, archived);
        self.audit.record_decision(&DecisionRecord {
            resource: D::RESOURCE,
            action,
            user_id: actor.id(),
            role: actor.role(),
            allowed: decision.allowed,
            reason: decision.reason,
            entity_id,
        });
        decision
    }

    fn denied(&self, action: PermissionAction, decision: PermissionDecision) -> DomainError {
        DomainError::forbidden(format!(
            "not permitted to {} {}",
            action.as_str(),
            D::RESOURCE.as_str()
        ))
        .with_details(json!({ "reason": decision.reason.as_str() }))
    }

    fn not_found(&self, id: Uuid) -> DomainError {
        DomainError::not_found(format!("{} {id} not found", D::RESOURCE.as_str()))
    }

    fn hook_failed(
        &self,
        operation: &'static str,
        entity_id: Option<Uuid>,
        error: HookError,
    ) -> DomainError {
        self.audit.record_hook_failure(&HookFailureRecord {
            resource: D::RESOURCE,
            operation,
            entity_id,
            message: error.to_string(),
        });
        match error {
            HookError::Domain(err) => err,
            HookError::Failed(_) => DomainError::internal(format!(
                "{operation} hook failed for {}",
                D::RESOURCE.as_str()
            )),
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<D::Entity> {
        self.store
            .find_by_id(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| self.not_found(id))
    }

    /// Archive state as the evaluator should see it: an archived record is
    /// treated as visible only when the caller explicitly asked for archived
    /// records and holds the any-scope view grant.
    fn effective_archived(&self, actor: &Actor, entity: &D::Entity, include_archived: bool) -> bool {
        entity.is_archived()
            && !(include_archived
                && actor.has_grant(D::RESOURCE, PermissionAction::View, PermissionScope::Any))
    }

    /// Create a record from a validated payload.
    pub async fn create(&self, actor: &Actor, payload: D::CreatePayload) -> ServiceResult<D::Entity> {
        self.definition
            .validate_create(&payload)
            .map_err(DomainError::from)?;

        let owner = self.definition.create_owner(&payload);
        let decision = self.decide(actor, PermissionAction::Create, owner, false, None);
        if !decision.allowed {
            return Err(self.denied(PermissionAction::Create, decision));
        }

        let mut entity = self
            .definition
            .construct(payload, Uuid::new_v4(), self.stamp(actor));
        self.hooks
            .before_create(actor, &mut entity)
            .await
            .map_err(|err| self.hook_failed("create", Some(entity.id()), err))?;

        self.store.insert(&entity).await.map_err(map_store_error)?;

        self.hooks
            .after_create(actor, &entity)
            .await
            .map_err(|err| self.hook_failed("create", Some(entity.id()), err))?;

        Ok(entity)
    }

    /// Fetch a record by id.
    ///
    /// Archived records surface only when `include_archived` is set by a
    /// caller holding the any-scope view grant.
    pub async fn get_by_id(
        &self,
        actor: &Actor,
        id: Uuid,
        include_archived: bool,
    ) -> ServiceResult<D::Entity> {
        let entity = self.load(id).await?;
        let archived = self.effective_archived(actor, &entity, include_archived);
        let decision = self.decide(actor, PermissionAction::View, entity.owner(), archived, Some(id));
        if !decision.allowed {
            return Err(self.denied(PermissionAction::View, decision));
        }
        Ok(entity)
    }

    async fn guarded_mutation(
        &self,
        actor: &Actor,
        id: Uuid,
        action: PermissionAction,
        apply: impl FnOnce(&mut D::Entity) + Send,
    ) -> ServiceResult<D::Entity> {
        let current = self.load(id).await?;
        let decision = self.decide(actor, action, current.owner(), current.is_archived(), Some(id));
        if !decision.allowed {
            return Err(self.denied(action, decision));
        }

        let mut updated = current;
        apply(&mut updated);
        updated.audit_mut().record_update(self.stamp(actor));

        self.hooks
            .before_update(actor, &mut updated)
            .await
            .map_err(|err| self.hook_failed("update", Some(id), err))?;

        self.store.update(&updated).await.map_err(map_store_error)?;

        self.hooks
            .after_update(actor, &updated)
            .await
            .map_err(|err| self.hook_failed("update", Some(id), err))?;

        Ok(updated)
    }

    /// Update a record from a validated partial payload.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: D::UpdatePayload,
    ) -> ServiceResult<D::Entity> {
        self.definition
            .validate_update(&payload)
            .map_err(DomainError::from)?;
        self.guarded_mutation(actor, id, PermissionAction::Update, |entity| {
            self.definition.apply_update(entity, payload);
        })
        .await
    }

    /// Apply an entity-specific mutation under a non-update permission
    /// action, with the same load/permission/hook/persist sequence as
    /// [`EntityService::update`].
    pub async fn update_with(
        &self,
        actor: &Actor,
        id: Uuid,
        action: PermissionAction,
        mutate: impl FnOnce(&mut D::Entity) + Send,
    ) -> ServiceResult<D::Entity> {
        self.guarded_mutation(actor, id, action, mutate).await
    }

    /// Reversibly archive a record.
    ///
    /// Not idempotent: archiving an already-archived record is rejected with
    /// a domain error rather than treated as a no-op.
    pub async fn soft_delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<D::Entity> {
        let current = self.load(id).await?;
        let decision = self.decide(
            actor,
            PermissionAction::SoftDelete,
            current.owner(),
            current.is_archived(),
            Some(id),
        );
        if !decision.allowed {
            if decision.reason == DecisionReason::Deleted {
                // Reveal the lifecycle state only to callers that could
                // otherwise have archived the record.
                let flags = OwnershipFlags::resolve(
                    actor,
                    D::RESOURCE,
                    PermissionAction::SoftDelete,
                    current.owner(),
                );
                if evaluate(actor, PermissionAction::SoftDelete, flags, false).allowed {
                    return Err(DomainError::validation(format!(
                        "{} {id} is already archived",
                        D::RESOURCE.as_str()
                    )));
                }
            }
            return Err(self.denied(PermissionAction::SoftDelete, decision));
        }

        self.hooks
            .before_soft_delete(actor, &current)
            .await
            .map_err(|err| self.hook_failed("soft_delete", Some(id), err))?;

        let archived = self
            .store
            .soft_delete(id, self.stamp(actor))
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| self.not_found(id))?;

        self.hooks
            .after_soft_delete(actor, &archived)
            .await
            .map_err(|err| self.hook_failed("soft_delete", Some(id), err))?;

        Ok(archived)
    }

    /// Bring an archived record back to the active state.
    pub async fn restore(&self, actor: &Actor, id: Uuid) -> ServiceResult<D::Entity> {
        let current = self.load(id).await?;
        let decision = self.decide(
            actor,
            PermissionAction::Restore,
            current.owner(),
            current.is_archived(),
            Some(id),
        );
        if !decision.allowed {
            return Err(self.denied(PermissionAction::Restore, decision));
        }
        if !current.is_archived() {
            return Err(DomainError::validation(format!(
                "{} {id} is not archived",
                D::RESOURCE.as_str()
            )));
        }

        self.hooks
            .before_restore(actor, &current)
            .await
            .map_err(|err| self.hook_failed("restore", Some(id), err))?;

        let restored = self
            .store
            .restore(id, self.stamp(actor))
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| self.not_found(id))?;

        self.hooks
            .after_restore(actor, &restored)
            .await
            .map_err(|err| self.hook_failed("restore", Some(id), err))?;

        Ok(restored)
    }

    /// Irreversibly remove a record.
    ///
    /// Requires the top role tier in addition to the hard-delete grant;
    /// archived records must be restored first.
    pub async fn hard_delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let current = self.load(id).await?;
        let decision = self.decide(
            actor,
            PermissionAction::HardDelete,
            current.owner(),
            current.is_archived(),
            Some(id),
        );
        if !decision.allowed {
            return Err(self.denied(PermissionAction::HardDelete, decision));
        }

        self.hooks
            .before_hard_delete(actor, &current)
            .await
            .map_err(|err| self.hook_failed("hard_delete", Some(id), err))?;

        let removed = self
            .store
            .hard_delete(id)
            .await
            .map_err(map_store_error)?;
        if !removed {
            return Err(self.not_found(id));
        }

        self.hooks
            .after_hard_delete(actor, &current)
            .await
            .map_err(|err| self.hook_failed("hard_delete", Some(id), err))?;

        Ok(())
    }

    /// List records matching a structured filter.
    ///
    /// Every item is checked against the view permission individually, so a
    /// page can carry fewer items than the backing query matched; `total`
    /// always reflects the backing query.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: D::Filter,
        request: &ListRequest,
    ) -> ServiceResult<Page<D::Entity>> {
        let window = request
            .page
            .resolve(&self.limits)
            .map_err(map_pagination_error)?;

        if request.include_archived
            && !actor.has_grant(D::RESOURCE, PermissionAction::View, PermissionScope::Any)
        {
            self.audit.record_decision(&DecisionRecord {
                resource: D::RESOURCE,
                action: PermissionAction::View,
                user_id: actor.id(),
                role: actor.role(),
                allowed: false,
                reason: DecisionReason::MissingPermission,
                entity_id: None,
            });
            return Err(DomainError::forbidden(format!(
                "archived {} records require the any-scope view permission",
                D::RESOURCE.as_str()
            )));
        }

        let total = self
            .store
            .count(&filter, request.include_archived)
            .await
            .map_err(map_store_error)?;
        let items = self
            .store
            .find_all(&filter, window, request.include_archived)
            .await
            .map_err(map_store_error)?;

        let visible = items
            .into_iter()
            .filter(|entity| {
                let archived = self.effective_archived(actor, entity, request.include_archived);
                self.decide(
                    actor,
                    PermissionAction::View,
                    entity.owner(),
                    archived,
                    Some(entity.id()),
                )
                .allowed
            })
            .collect();

        Ok(Page::new(visible, total, window))
    }

    /// Search records through the entity's query-to-filter mapping, then
    /// follow the exact list path.
    pub async fn search(
        &self,
        actor: &Actor,
        query: &D::SearchQuery,
        request: &ListRequest,
    ) -> ServiceResult<Page<D::Entity>> {
        let filter = self.definition.search_filter(query);
        self.list(actor, filter, request).await
    }

    /// Count records matching a structured filter.
    ///
    /// Requires the any-scope view grant: a count cannot be filtered
    /// per-item without loading every matching record.
    pub async fn count(
        &self,
        actor: &Actor,
        filter: &D::Filter,
        include_archived: bool,
    ) -> ServiceResult<u64> {
        let decision = self.decide(actor, PermissionAction::View, None, false, None);
        if !decision.allowed {
            return Err(self.denied(PermissionAction::View, decision));
        }
        self.store
            .count(filter, include_archived)
            .await
            .map_err(map_store_error)
    }
}

#[cfg(test)]
#[path = "entity_service_tests.rs"]
mod tests;
