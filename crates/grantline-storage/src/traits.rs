use grantline_core::{AccessLevel, AuthorizationRow, ProjectId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("upsert batch must contain at least one row")]
    EmptyBatch,
    #[error("stored access level {0} is outside the known range")]
    CorruptAccessLevel(i16),
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// The one sanctioned writer path for the materialized authorization table.
///
/// Uniqueness of (user_id, project_id) under concurrent writers rests entirely
/// on the backend's composite key plus upsert-on-conflict semantics; no
/// in-process locking is taken here or anywhere above.
pub trait AuthorizationStore: Send + Sync {
    /// Bulk upsert keyed on (user_id, project_id). On conflict the incoming
    /// row's access_level and is_unique overwrite the stored ones. Returns the
    /// number of rows written.
    fn upsert_batch(
        &self,
        rows: &[AuthorizationRow],
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Deletes the user's rows in the listed projects. Returns rows actually
    /// deleted, which may be fewer than the ids given.
    fn delete_projects_for_user(
        &self,
        user_id: UserId,
        project_ids: &[ProjectId],
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Deletes the listed users' rows in the project.
    fn delete_users_in_project(
        &self,
        project_id: ProjectId,
        user_ids: &[UserId],
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Fast-path point lookup. Row absence means no access.
    fn access_level(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Option<AccessLevel>, StorageError>> + Send;

    fn grants_for_project(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<AuthorizationRow>, StorageError>> + Send;

    /// Users holding an access level strictly above Guest in the project.
    fn non_guest_user_ids(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<UserId>, StorageError>> + Send;

    /// Whether a secondary/replica topology is configured. Supplied by
    /// deployment configuration, not probed; the executor's throttle heuristic
    /// consults it.
    fn has_replica(&self) -> bool;
}
