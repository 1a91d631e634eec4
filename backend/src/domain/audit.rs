//! Audit trail carried by every managed entity.
//!
//! The trail records who created, last updated, and archived a record. The
//! lifecycle state is derived from the archive stamp rather than stored, so
//! the two can never disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::UserId;

/// Who did something, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    /// Moment the action happened.
    pub at: DateTime<Utc>,
    /// Actor that performed the action.
    pub by: UserId,
}

impl AuditStamp {
    /// Build a stamp.
    pub const fn new(at: DateTime<Utc>, by: UserId) -> Self {
        Self { at, by }
    }
}

/// Derived record lifecycle: active, or reversibly archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Visible through ordinary view/list/search paths.
    Active,
    /// Soft deleted; hidden unless archived records are explicitly requested.
    Archived,
}

/// Creation, update, and archive stamps for one record.
///
/// ## Invariants
/// - `updated` and `deleted` are never earlier than `created` when written
///   through orchestrated operations (the orchestrator stamps from a single
///   injected clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    created: AuditStamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<AuditStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<AuditStamp>,
}

impl AuditTrail {
    /// Fresh trail for a newly created record.
    pub const fn new(created: AuditStamp) -> Self {
        Self {
            created,
            updated: None,
            deleted: None,
        }
    }

    /// Creation stamp.
    pub const fn created(&self) -> AuditStamp {
        self.created
    }

    /// Most recent update stamp, if the record was ever updated.
    pub const fn updated(&self) -> Option<AuditStamp> {
        self.updated
    }

    /// Archive stamp, present while the record is soft deleted.
    pub const fn deleted(&self) -> Option<AuditStamp> {
        self.deleted
    }

    /// Lifecycle derived from the archive stamp.
    pub const fn lifecycle_state(&self) -> LifecycleState {
        if self.deleted.is_some() {
            LifecycleState::Archived
        } else {
            LifecycleState::Active
        }
    }

    /// True while the record is soft deleted.
    pub const fn is_archived(&self) -> bool {
        self.deleted.is_some()
    }

    /// Record an ordinary mutation.
    pub fn record_update(&mut self, stamp: AuditStamp) {
        self.updated = Some(stamp);
    }

    /// Record a soft deletion.
    pub fn record_soft_delete(&mut self, stamp: AuditStamp) {
        self.deleted = Some(stamp);
    }

    /// Clear the archive stamp, recording who restored the record.
    pub fn record_restore(&mut self, stamp: AuditStamp) {
        self.deleted = None;
        self.updated = Some(stamp);
    }
}

/// Contract every managed entity fulfils for the orchestrator.
pub trait AuditedEntity: Send + Sync {
    /// Stable record identifier.
    fn id(&self) -> Uuid;

    /// Owning user, when the record has an owner.
    fn owner(&self) -> Option<UserId>;

    /// Read access to the audit trail.
    fn audit(&self) -> &AuditTrail;

    /// Write access to the audit trail.
    fn audit_mut(&mut self) -> &mut AuditTrail;

    /// Derived lifecycle state.
    fn lifecycle_state(&self) -> LifecycleState {
        self.audit().lifecycle_state()
    }

    /// True while the record is soft deleted.
    fn is_archived(&self) -> bool {
        self.audit().is_archived()
    }
}
