use crate::authorization::AuthorizationAttrs;
use crate::ids::{ProjectId, UserId};

/// Removal scoped to one user: drop that user's rows in the listed projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScopedRemoval {
    pub user_id: UserId,
    pub project_ids: Vec<ProjectId>,
}

/// Removal scoped to one project: drop the listed users' rows in that project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScopedRemoval {
    pub project_id: ProjectId,
    pub user_ids: Vec<UserId>,
}

/// Ephemeral, single-use work order for the batch executor.
///
/// ```
/// use grantline_core::{AccessLevel, AuthorizationAttrs, ChangeSet};
///
/// let changes = ChangeSet::build(|c| {
///     c.add([AuthorizationAttrs::new(1, 10, AccessLevel::Developer)]);
///     c.remove_users_in_project(11.into(), vec![2.into(), 3.into()]);
/// });
/// assert_eq!(changes.additions().len(), 1);
/// ```
///
/// The executor consumes the set by value, so a `ChangeSet` cannot be applied
/// twice. Calling a removal recorder a second time replaces the previous
/// scope; removals do not accumulate across calls.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    additions: Vec<AuthorizationAttrs>,
    user_removal: Option<UserScopedRemoval>,
    project_removal: Option<ProjectScopedRemoval>,
}

impl ChangeSet {
    pub fn build(f: impl FnOnce(&mut ChangeSet)) -> Self {
        let mut changes = ChangeSet::default();
        f(&mut changes);
        changes
    }

    /// Appends addition tuples. Duplicates are tolerated here and resolved by
    /// the upsert at insert time.
    pub fn add(&mut self, attrs: impl IntoIterator<Item = AuthorizationAttrs>) {
        self.additions.extend(attrs);
    }

    pub fn remove_users_in_project(&mut self, project_id: ProjectId, user_ids: Vec<UserId>) {
        self.project_removal = Some(ProjectScopedRemoval {
            project_id,
            user_ids,
        });
    }

    pub fn remove_projects_for_user(&mut self, user_id: UserId, project_ids: Vec<ProjectId>) {
        self.user_removal = Some(UserScopedRemoval {
            user_id,
            project_ids,
        });
    }

    pub fn additions(&self) -> &[AuthorizationAttrs] {
        &self.additions
    }

    pub fn user_removal(&self) -> Option<&UserScopedRemoval> {
        self.user_removal.as_ref()
    }

    pub fn project_removal(&self) -> Option<&ProjectScopedRemoval> {
        self.project_removal.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.user_removal.is_none() && self.project_removal.is_none()
    }
}
