//! Tracing-backed audit sink.

use tracing::{info, warn};

use crate::domain::ports::{DecisionRecord, HookFailureRecord, PermissionAudit};

/// Emits permission decisions and hook failures as structured tracing
/// events with a stable field shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPermissionAudit;

impl PermissionAudit for TracingPermissionAudit {
    fn record_decision(&self, record: &DecisionRecord) {
        let permission = format!(
            "{}:{}",
            record.resource.as_str(),
            record.action.as_str()
        );
        if record.allowed {
            info!(
                permission = %permission,
                user_id = %record.user_id,
                role = record.role.as_str(),
                reason = record.reason.as_str(),
                entity_id = ?record.entity_id,
                "permission granted"
            );
        } else {
            warn!(
                permission = %permission,
                user_id = %record.user_id,
                role = record.role.as_str(),
                reason = record.reason.as_str(),
                entity_id = ?record.entity_id,
                "permission denied"
            );
        }
    }

    fn record_hook_failure(&self, record: &HookFailureRecord) {
        warn!(
            resource = record.resource.as_str(),
            operation = record.operation,
            entity_id = ?record.entity_id,
            message = %record.message,
            "lifecycle hook failed"
        );
    }
}
