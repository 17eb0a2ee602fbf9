use crate::access::AccessLevel;
use crate::ids::{ProjectId, UserId};

/// One materialized grant: the denormalized fast-path record derived from
/// direct and inherited memberships. At most one row exists per
/// (user, project) pair; the storage layer enforces this with a composite
/// primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationRow {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub access_level: AccessLevel,
    /// Marks rows produced by the single-writer materialization path, to
    /// disambiguate against legacy multi-writer rows during migration windows.
    pub is_unique: bool,
}

/// Addition tuple accepted by `ChangeSet::add`. Becomes an `AuthorizationRow`
/// with `is_unique` stamped true when the executor writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationAttrs {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub access_level: AccessLevel,
}

impl AuthorizationAttrs {
    pub fn new(
        user_id: impl Into<UserId>,
        project_id: impl Into<ProjectId>,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            access_level,
        }
    }
}

impl From<AuthorizationAttrs> for AuthorizationRow {
    fn from(attrs: AuthorizationAttrs) -> Self {
        Self {
            user_id: attrs.user_id,
            project_id: attrs.project_id,
            access_level: attrs.access_level,
            is_unique: true,
        }
    }
}
