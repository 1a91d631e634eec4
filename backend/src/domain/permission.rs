//! Pure permission evaluation.
//!
//! [`evaluate`] maps a caller, an action, pre-computed ownership flags, and
//! the record's archive state to an allow/deny decision with a stable reason
//! code. It never touches storage and never fails; resolving ownership and
//! logging the decision are the orchestrator's job.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Actor, PermissionAction, PermissionScope, ResourceKind, UserId};

/// Ownership inputs resolved by the caller before evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnershipFlags {
    /// The actor owns the record under evaluation.
    pub is_owner: bool,
    /// The actor holds the any-scope grant for the action.
    pub has_any_scope: bool,
    /// The actor holds the own-scope grant for the action.
    pub has_own_scope: bool,
}

impl OwnershipFlags {
    /// Resolve flags for an actor against a record's owner.
    pub fn resolve(
        actor: &Actor,
        resource: ResourceKind,
        action: PermissionAction,
        owner: Option<UserId>,
    ) -> Self {
        Self {
            is_owner: owner.is_some_and(|owner_id| owner_id == actor.id()),
            has_any_scope: actor.has_grant(resource, action, PermissionScope::Any),
            has_own_scope: actor.has_grant(resource, action, PermissionScope::Own),
        }
    }
}

/// Stable reason code attached to every decision, for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Allowed through the any-scope grant.
    Approved,
    /// Allowed because the actor owns the record and holds the own-scope grant.
    ApprovedAsOwner,
    /// Denied: the record is archived and the action is not a restore.
    Deleted,
    /// Denied: no applicable grant.
    MissingPermission,
    /// Denied: hard deletion requires the top role tier.
    NotSuperAdmin,
}

impl DecisionReason {
    /// Stable label used in audit events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::ApprovedAsOwner => "approved_as_owner",
            Self::Deleted => "deleted",
            Self::MissingPermission => "missing_permission",
            Self::NotSuperAdmin => "not_super_admin",
        }
    }
}

/// Outcome of one permission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDecision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Why, in stable audit vocabulary.
    pub reason: DecisionReason,
}

impl PermissionDecision {
    const fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    const fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Decide whether `actor` may perform `action`.
///
/// Archived records admit only [`PermissionAction::Restore`]; hard deletion
/// additionally requires the top role tier regardless of held grants; the
/// any-scope grant beats ownership; ownership plus the own-scope grant is the
/// remaining allow path.
///
/// # Examples
/// ```
/// use backend::domain::{
///     evaluate, Actor, DecisionReason, OwnershipFlags, PermissionAction, Role, UserId,
/// };
///
/// let actor = Actor::new(UserId::random(), Role::User);
/// let flags = OwnershipFlags { is_owner: true, has_any_scope: false, has_own_scope: true };
/// let decision = evaluate(&actor, PermissionAction::SoftDelete, flags, false);
/// assert!(decision.allowed);
/// assert_eq!(decision.reason, DecisionReason::ApprovedAsOwner);
/// ```
pub fn evaluate(
    actor: &Actor,
    action: PermissionAction,
    flags: OwnershipFlags,
    archived: bool,
) -> PermissionDecision {
    if archived && action != PermissionAction::Restore {
        return PermissionDecision::deny(DecisionReason::Deleted);
    }
    if action == PermissionAction::HardDelete && !actor.role().is_top_tier() {
        return PermissionDecision::deny(DecisionReason::NotSuperAdmin);
    }
    if flags.has_any_scope {
        return PermissionDecision::allow(DecisionReason::Approved);
    }
    if flags.is_owner && flags.has_own_scope {
        return PermissionDecision::allow(DecisionReason::ApprovedAsOwner);
    }
    PermissionDecision::deny(DecisionReason::MissingPermission)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::{PermissionGrant, Role};

    fn flags(is_owner: bool, has_any_scope: bool, has_own_scope: bool) -> OwnershipFlags {
        OwnershipFlags {
            is_owner,
            has_any_scope,
            has_own_scope,
        }
    }

    #[rstest]
    #[case(PermissionAction::View)]
    #[case(PermissionAction::Update)]
    #[case(PermissionAction::SoftDelete)]
    #[case(PermissionAction::HardDelete)]
    fn archived_records_deny_everything_but_restore(#[case] action: PermissionAction) {
        let actor = Actor::new(UserId::random(), Role::SuperAdmin);
        let decision = evaluate(&actor, action, flags(true, true, true), true);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Deleted);
    }

    #[rstest]
    fn restore_is_evaluated_on_archived_records() {
        let actor = Actor::new(UserId::random(), Role::Admin);
        let decision = evaluate(
            &actor,
            PermissionAction::Restore,
            flags(false, true, false),
            true,
        );
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Approved);
    }

    #[rstest]
    #[case(Role::Guest)]
    #[case(Role::User)]
    #[case(Role::Host)]
    #[case(Role::Admin)]
    fn hard_delete_requires_top_tier_regardless_of_grants(#[case] role: Role) {
        let actor = Actor::new(UserId::random(), role);
        let decision = evaluate(
            &actor,
            PermissionAction::HardDelete,
            flags(true, true, true),
            false,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::NotSuperAdmin);
    }

    #[rstest]
    fn hard_delete_still_requires_the_grant_at_top_tier() {
        let actor = Actor::new(UserId::random(), Role::SuperAdmin);
        let decision = evaluate(
            &actor,
            PermissionAction::HardDelete,
            flags(true, false, false),
            false,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::MissingPermission);
    }

    #[rstest]
    fn any_scope_beats_ownership() {
        let actor = Actor::new(UserId::random(), Role::Admin);
        let decision = evaluate(
            &actor,
            PermissionAction::Update,
            flags(false, true, false),
            false,
        );
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Approved);
    }

    #[rstest]
    fn own_scope_requires_ownership() {
        let actor = Actor::new(UserId::random(), Role::User);
        let denied = evaluate(
            &actor,
            PermissionAction::Update,
            flags(false, false, true),
            false,
        );
        assert!(!denied.allowed);
        assert_eq!(denied.reason, DecisionReason::MissingPermission);

        let allowed = evaluate(
            &actor,
            PermissionAction::Update,
            flags(true, false, true),
            false,
        );
        assert!(allowed.allowed);
        assert_eq!(allowed.reason, DecisionReason::ApprovedAsOwner);
    }

    #[rstest]
    fn resolve_reads_grants_and_ownership_from_the_actor() {
        let owner_id = UserId::random();
        let actor = Actor::new(owner_id, Role::Host).with_grant(PermissionGrant::own(
            ResourceKind::Accommodation,
            PermissionAction::Update,
        ));

        let resolved = OwnershipFlags::resolve(
            &actor,
            ResourceKind::Accommodation,
            PermissionAction::Update,
            Some(owner_id),
        );
        assert!(resolved.is_owner);
        assert!(resolved.has_own_scope);
        assert!(!resolved.has_any_scope);

        let stranger = OwnershipFlags::resolve(
            &actor,
            ResourceKind::Accommodation,
            PermissionAction::Update,
            Some(UserId::random()),
        );
        assert!(!stranger.is_owner);
    }
}
