//! Caller identity and capability model.
//!
//! An [`Actor`] is the immutable per-request caller context: a stable id, a
//! coarse [`Role`] tier, and a fine-grained set of [`PermissionGrant`]s. The
//! permission evaluator consumes these; nothing here touches storage.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stable user identifier stored as a UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID.
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Coarse role ladder; ordering follows privilege.
///
/// [`Role::SuperAdmin`] is the top tier required by hard deletion regardless
/// of held grants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unauthenticated browser.
    Guest,
    /// Registered account.
    User,
    /// Account that lists accommodations.
    Host,
    /// Back-office operator.
    Admin,
    /// Top tier; the only role allowed to hard delete.
    SuperAdmin,
}

impl Role {
    /// True for the top tier of the ladder.
    pub const fn is_top_tier(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Stable label used in audit events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Host => "host",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

/// Closed set of record families managed by entity services.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Listed rental properties.
    Accommodation,
    /// Guest reservations against an accommodation.
    Booking,
    /// Guest feedback on an accommodation.
    Review,
}

impl ResourceKind {
    /// Stable label used in audit events and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accommodation => "accommodation",
            Self::Booking => "booking",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations subject to permission evaluation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Read a single record or appear in list/search results.
    View,
    /// Create a new record.
    Create,
    /// Modify an existing record.
    Update,
    /// Reversibly archive a record.
    SoftDelete,
    /// Irreversibly remove a record.
    HardDelete,
    /// Bring an archived record back to the active state.
    Restore,
    /// Toggle a record's published/hidden visibility.
    UpdateVisibility,
}

impl PermissionAction {
    /// Stable label used in audit events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::SoftDelete => "soft_delete",
            Self::HardDelete => "hard_delete",
            Self::Restore => "restore",
            Self::UpdateVisibility => "update_visibility",
        }
    }
}

/// Reach of a grant: the actor's own records or all records of the kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Applies only to records the actor owns.
    Own,
    /// Applies to every record of the resource kind.
    Any,
}

/// A single capability: one action on one resource kind at one scope.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    /// Resource family the grant applies to.
    pub resource: ResourceKind,
    /// Operation the grant allows.
    pub action: PermissionAction,
    /// Whether the grant covers own records or all records.
    pub scope: PermissionScope,
}

impl PermissionGrant {
    /// Grant covering every record of the resource kind.
    pub const fn any(resource: ResourceKind, action: PermissionAction) -> Self {
        Self {
            resource,
            action,
            scope: PermissionScope::Any,
        }
    }

    /// Grant covering only the actor's own records.
    pub const fn own(resource: ResourceKind, action: PermissionAction) -> Self {
        Self {
            resource,
            action,
            scope: PermissionScope::Own,
        }
    }
}

/// Immutable caller context used for permission checks.
///
/// # Examples
/// ```
/// use backend::domain::{
///     Actor, PermissionAction, PermissionGrant, PermissionScope, ResourceKind, Role, UserId,
/// };
///
/// let actor = Actor::new(UserId::random(), Role::Host)
///     .with_grant(PermissionGrant::own(ResourceKind::Accommodation, PermissionAction::Update));
/// assert!(actor.has_grant(
///     ResourceKind::Accommodation,
///     PermissionAction::Update,
///     PermissionScope::Own,
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    id: UserId,
    role: Role,
    permissions: HashSet<PermissionGrant>,
}

impl Actor {
    /// Build an actor with no grants.
    pub fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            permissions: HashSet::new(),
        }
    }

    /// Anonymous caller: guest tier, fresh id, no grants.
    pub fn guest() -> Self {
        Self::new(UserId::random(), Role::Guest)
    }

    /// Add a single grant.
    pub fn with_grant(mut self, grant: PermissionGrant) -> Self {
        self.permissions.insert(grant);
        self
    }

    /// Add a collection of grants.
    pub fn with_grants(mut self, grants: impl IntoIterator<Item = PermissionGrant>) -> Self {
        self.permissions.extend(grants);
        self
    }

    /// Stable caller identifier.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Coarse role tier.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Fine-grained capability set.
    pub const fn grants(&self) -> &HashSet<PermissionGrant> {
        &self.permissions
    }

    /// True when the actor holds the exact grant.
    pub fn has_grant(
        &self,
        resource: ResourceKind,
        action: PermissionAction,
        scope: PermissionScope,
    ) -> bool {
        self.permissions.contains(&PermissionGrant {
            resource,
            action,
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn role_ladder_orders_by_privilege() {
        assert!(Role::Guest < Role::User);
        assert!(Role::User < Role::Host);
        assert!(Role::Host < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert!(Role::SuperAdmin.is_top_tier());
        assert!(!Role::Admin.is_top_tier());
    }

    #[rstest]
    fn grants_are_matched_exactly() {
        let actor = Actor::new(UserId::random(), Role::User).with_grant(PermissionGrant::own(
            ResourceKind::Booking,
            PermissionAction::SoftDelete,
        ));

        assert!(actor.has_grant(
            ResourceKind::Booking,
            PermissionAction::SoftDelete,
            PermissionScope::Own,
        ));
        assert!(!actor.has_grant(
            ResourceKind::Booking,
            PermissionAction::SoftDelete,
            PermissionScope::Any,
        ));
        assert!(!actor.has_grant(
            ResourceKind::Review,
            PermissionAction::SoftDelete,
            PermissionScope::Own,
        ));
    }

    #[rstest]
    fn guest_has_no_grants() {
        let guest = Actor::guest();
        assert_eq!(guest.role(), Role::Guest);
        assert!(guest.grants().is_empty());
    }
}
