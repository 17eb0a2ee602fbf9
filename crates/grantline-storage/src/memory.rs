use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use grantline_core::{AccessLevel, AuthorizationRow, ProjectId, UserId};

use crate::traits::{AuthorizationStore, StorageError};

#[derive(Debug, Clone, Copy)]
struct StoredGrant {
    access_level: AccessLevel,
    is_unique: bool,
}

#[derive(Debug, Default)]
struct InnerState {
    grants: HashMap<(UserId, ProjectId), StoredGrant>,
    upsert_batches: u64,
    delete_batches: u64,
}

/// Hash-map backed store for tests and single-process embedding. The batch
/// counters make executor slicing observable without poking at internals.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<InnerState>>,
    replica: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same store, but reporting a replica topology so throttling engages.
    pub fn with_replica() -> Self {
        Self {
            state: Arc::new(Mutex::new(InnerState::default())),
            replica: true,
        }
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().grants.len()
    }

    pub fn upsert_batches(&self) -> u64 {
        self.state.lock().unwrap().upsert_batches
    }

    pub fn delete_batches(&self) -> u64 {
        self.state.lock().unwrap().delete_batches
    }
}

impl AuthorizationStore for InMemoryStore {
    async fn upsert_batch(&self, rows: &[AuthorizationRow]) -> Result<u64, StorageError> {
        if rows.is_empty() {
            return Err(StorageError::EmptyBatch);
        }

        let mut state = self.state.lock().unwrap();
        state.upsert_batches += 1;

        for row in rows {
            state.grants.insert(
                (row.user_id, row.project_id),
                StoredGrant {
                    access_level: row.access_level,
                    is_unique: row.is_unique,
                },
            );
        }

        Ok(rows.len() as u64)
    }

    async fn delete_projects_for_user(
        &self,
        user_id: UserId,
        project_ids: &[ProjectId],
    ) -> Result<u64, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.delete_batches += 1;

        let mut deleted = 0;
        for project_id in project_ids {
            if state.grants.remove(&(user_id, *project_id)).is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn delete_users_in_project(
        &self,
        project_id: ProjectId,
        user_ids: &[UserId],
    ) -> Result<u64, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.delete_batches += 1;

        let mut deleted = 0;
        for user_id in user_ids {
            if state.grants.remove(&(*user_id, project_id)).is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn access_level(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<Option<AccessLevel>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .grants
            .get(&(user_id, project_id))
            .map(|g| g.access_level))
    }

    async fn grants_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<AuthorizationRow>, StorageError> {
        let state = self.state.lock().unwrap();

        let mut rows: Vec<AuthorizationRow> = state
            .grants
            .iter()
            .filter(|((_, pid), _)| *pid == project_id)
            .map(|((uid, pid), grant)| AuthorizationRow {
                user_id: *uid,
                project_id: *pid,
                access_level: grant.access_level,
                is_unique: grant.is_unique,
            })
            .collect();
        rows.sort_by_key(|r| r.user_id);

        Ok(rows)
    }

    async fn non_guest_user_ids(&self, project_id: ProjectId) -> Result<Vec<UserId>, StorageError> {
        let state = self.state.lock().unwrap();

        let mut ids: Vec<UserId> = state
            .grants
            .iter()
            .filter(|((_, pid), grant)| {
                *pid == project_id && grant.access_level > AccessLevel::Guest
            })
            .map(|((uid, _), _)| *uid)
            .collect();
        ids.sort();

        Ok(ids)
    }

    fn has_replica(&self) -> bool {
        self.replica
    }
}
