//! Capability set implemented once per managed entity.
//!
//! The orchestrator is generic over an [`EntityDefinition`]: a small,
//! composable interface covering payload validation, entity assembly, and
//! filter semantics. Concrete definitions are stateless unit structs; there
//! is no service inheritance anywhere.

use uuid::Uuid;

use crate::domain::{AuditStamp, AuditedEntity, FieldViolations, ResourceKind, UserId};

/// Per-entity capabilities consumed by the CRUD orchestrator.
///
/// Filter construction and evaluation live here because they are inherently
/// entity-specific; the orchestrator only supplies the uniform
/// validate → permission → hook → store → hook skeleton around them.
pub trait EntityDefinition: Send + Sync + 'static {
    /// Managed record type.
    type Entity: AuditedEntity + Clone + Send + Sync + 'static;
    /// Payload accepted by `create`.
    type CreatePayload: Send + Sync + 'static;
    /// Payload accepted by `update`; absent fields leave the record untouched.
    type UpdatePayload: Send + Sync + 'static;
    /// Structured filter consumed by list/count and store adapters.
    type Filter: Clone + Send + Sync + 'static;
    /// Free-form query accepted by `search`.
    type SearchQuery: Send + Sync + 'static;

    /// Resource kind used for permission grants and audit events.
    const RESOURCE: ResourceKind;

    /// Validate a create payload, reporting every violation at once.
    fn validate_create(&self, payload: &Self::CreatePayload) -> Result<(), FieldViolations>;

    /// Validate an update payload, reporting every violation at once.
    fn validate_update(&self, payload: &Self::UpdatePayload) -> Result<(), FieldViolations>;

    /// Owner the record will have once created, when the payload names one.
    ///
    /// Used to resolve the own-scope create grant: an actor may create
    /// records it will own without holding the any-scope grant.
    fn create_owner(&self, payload: &Self::CreatePayload) -> Option<UserId> {
        let _ = payload;
        None
    }

    /// Assemble a fresh entity from a validated payload.
    fn construct(
        &self,
        payload: Self::CreatePayload,
        id: Uuid,
        created: AuditStamp,
    ) -> Self::Entity;

    /// Apply a validated update payload to a working copy.
    fn apply_update(&self, entity: &mut Self::Entity, payload: Self::UpdatePayload);

    /// Build the structured filter equivalent to a search query.
    fn search_filter(&self, query: &Self::SearchQuery) -> Self::Filter;

    /// Decide whether a record matches a filter.
    ///
    /// Store adapters that cannot push the filter down (the in-memory
    /// adapter) evaluate it through this hook.
    fn matches(&self, entity: &Self::Entity, filter: &Self::Filter) -> bool;
}
