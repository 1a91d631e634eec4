//! Audit side channel for permission decisions and hook failures.
//!
//! Every grant and denial the orchestrator evaluates is reported here with a
//! stable shape, independent of the operation's return envelope. Adapters
//! decide where the records go; the domain only guarantees they are emitted.

use uuid::Uuid;

use crate::domain::{DecisionReason, PermissionAction, ResourceKind, Role, UserId};

/// One evaluated permission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRecord {
    /// Resource kind the operation targeted.
    pub resource: ResourceKind,
    /// Action that was evaluated.
    pub action: PermissionAction,
    /// Caller identity.
    pub user_id: UserId,
    /// Caller role tier.
    pub role: Role,
    /// Whether the action was allowed.
    pub allowed: bool,
    /// Stable reason code from the evaluator.
    pub reason: DecisionReason,
    /// Target record, absent for create/list/search/count.
    pub entity_id: Option<Uuid>,
}

/// A lifecycle hook that failed and aborted its operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailureRecord {
    /// Resource kind the operation targeted.
    pub resource: ResourceKind,
    /// Operation the hook belonged to.
    pub operation: &'static str,
    /// Target record, when known.
    pub entity_id: Option<Uuid>,
    /// Failure description.
    pub message: String,
}

/// Driven port for the audit trail side channel.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionAudit: Send + Sync {
    /// Report an evaluated decision.
    fn record_decision(&self, record: &DecisionRecord);

    /// Report a hook failure.
    fn record_hook_failure(&self, record: &HookFailureRecord);
}

/// Audit sink that drops everything, for callers that opt out.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPermissionAudit;

impl PermissionAudit for NoOpPermissionAudit {
    fn record_decision(&self, _record: &DecisionRecord) {}

    fn record_hook_failure(&self, _record: &HookFailureRecord) {}
}
