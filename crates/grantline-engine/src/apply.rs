use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use grantline_core::{
    AuthorizationRow, AuthorizationsChangedEvent, ChangeSet, ProjectId, UserId, ValidationError,
};
use grantline_storage::{AuthorizationStore, StorageError};

use crate::config::{EngineConfig, ThrottlePolicy};
use crate::publisher::EventPublisher;

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// What one `apply_changes` call did. Returned for observability and tests;
/// nothing downstream depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub rows_inserted: u64,
    pub rows_deleted: u64,
    pub insert_batches: usize,
    pub delete_batches: usize,
    pub throttled_phases: usize,
    pub events_published: usize,
    pub affected_project_ids: Vec<ProjectId>,
}

/// Applies a change set against the materialized table in fixed-size batches,
/// then publishes one changed-event per affected project.
///
/// Deletes run before inserts: a row removed and re-added in the same change
/// set must end up present with the new access level. Validation failures
/// abort before any storage mutation. A storage failure mid-phase aborts the
/// remaining batches and propagates; committed batches stay committed, and
/// re-invoking with the same change set is safe (scoped deletes and upserts
/// are idempotent). Publication failures are logged and swallowed; the table
/// is already correct.
///
/// When any phase runs throttled, a single info event (target `throttle`)
/// summarizes the item count, batch size, and expected total delay for the
/// whole call.
pub async fn apply_changes<S, P>(
    store: &S,
    publisher: &P,
    config: &EngineConfig,
    changes: ChangeSet,
) -> Result<ApplySummary, ApplyError>
where
    S: AuthorizationStore,
    P: EventPublisher,
{
    for attrs in changes.additions() {
        if !attrs.access_level.is_storable() {
            return Err(ValidationError::UnstorableAccessLevel {
                user_id: attrs.user_id,
                project_id: attrs.project_id,
                level: attrs.access_level,
            }
            .into());
        }
    }

    let mut summary = ApplySummary::default();
    let mut affected: BTreeSet<ProjectId> = BTreeSet::new();
    let mut throttle = ThrottleTotals::default();

    if let Some(removal) = changes.user_removal()
        && !removal.project_ids.is_empty()
    {
        let throttled = begin_phase(
            &mut summary,
            &mut throttle,
            config,
            store.has_replica(),
            removal.project_ids.len(),
        );
        let mut first = true;
        for batch in removal.project_ids.chunks(config.batch_size) {
            if !first && throttled {
                tokio::time::sleep(config.batch_delay()).await;
            }
            first = false;
            summary.rows_deleted += store
                .delete_projects_for_user(removal.user_id, batch)
                .await?;
            summary.delete_batches += 1;
        }
        affected.extend(removal.project_ids.iter().copied());
    }

    if let Some(removal) = changes.project_removal()
        && !removal.user_ids.is_empty()
    {
        let throttled = begin_phase(
            &mut summary,
            &mut throttle,
            config,
            store.has_replica(),
            removal.user_ids.len(),
        );
        let mut first = true;
        for batch in removal.user_ids.chunks(config.batch_size) {
            if !first && throttled {
                tokio::time::sleep(config.batch_delay()).await;
            }
            first = false;
            summary.rows_deleted += store
                .delete_users_in_project(removal.project_id, batch)
                .await?;
            summary.delete_batches += 1;
        }
        affected.insert(removal.project_id);
    }

    if !changes.additions().is_empty() {
        // Last write for a pair wins within one work order. Deduping keeps a
        // multi-row upsert legal (Postgres rejects one statement whose ON
        // CONFLICT clause touches the same row twice) and makes batch slicing
        // deterministic.
        let mut deduped: BTreeMap<(UserId, ProjectId), AuthorizationRow> = BTreeMap::new();
        for attrs in changes.additions() {
            deduped.insert(
                (attrs.user_id, attrs.project_id),
                AuthorizationRow::from(*attrs),
            );
        }
        let rows: Vec<AuthorizationRow> = deduped.into_values().collect();

        let throttled = begin_phase(
            &mut summary,
            &mut throttle,
            config,
            store.has_replica(),
            rows.len(),
        );
        let mut first = true;
        for batch in rows.chunks(config.batch_size) {
            if !first && throttled {
                tokio::time::sleep(config.batch_delay()).await;
            }
            first = false;
            summary.rows_inserted += store.upsert_batch(batch).await?;
            summary.insert_batches += 1;
        }
        affected.extend(changes.additions().iter().map(|a| a.project_id));
    }

    if summary.throttled_phases > 0 {
        tracing::info!(
            target: "throttle",
            entire_size = throttle.items,
            batch_size = config.batch_size,
            total_delay_ms = throttle.total_delay.as_millis() as u64,
            "authorization refresh performed with inter-batch delay"
        );
    }

    summary.affected_project_ids = affected.iter().copied().collect();

    for project_id in &affected {
        match publisher
            .publish(AuthorizationsChangedEvent::new(*project_id))
            .await
        {
            Ok(()) => summary.events_published += 1,
            Err(e) => tracing::warn!(
                target: "events",
                project_id = project_id.value(),
                error = %e,
                "failed to publish authorizations-changed event"
            ),
        }
    }

    tracing::debug!(
        rows_inserted = summary.rows_inserted,
        rows_deleted = summary.rows_deleted,
        delete_batches = summary.delete_batches,
        insert_batches = summary.insert_batches,
        events_published = summary.events_published,
        "applied authorization changes"
    );

    Ok(summary)
}

/// Item count and expected sleep time across every throttled phase of one
/// `apply_changes` call, for the single summary log (target `throttle`).
#[derive(Debug, Default)]
struct ThrottleTotals {
    items: usize,
    total_delay: Duration,
}

/// Decides whether this phase gets inter-batch delays, folding its size into
/// the invocation-wide throttle totals when it does.
fn begin_phase(
    summary: &mut ApplySummary,
    throttle: &mut ThrottleTotals,
    config: &EngineConfig,
    has_replica: bool,
    entire_size: usize,
) -> bool {
    let throttled = throttle_active(config, has_replica, entire_size);
    if throttled {
        summary.throttled_phases += 1;
        let batches = entire_size.div_ceil(config.batch_size);
        throttle.items += entire_size;
        throttle.total_delay += config.batch_delay() * (batches as u32 - 1);
    }
    throttled
}

/// The delay exists to let replicas catch up during large bulk operations, so
/// it only applies when the workload spans more than one batch and the
/// deployment actually has a replica (unless policy overrides the heuristic).
fn throttle_active(config: &EngineConfig, has_replica: bool, entire_size: usize) -> bool {
    if entire_size <= config.batch_size {
        return false;
    }
    match config.throttle {
        ThrottlePolicy::Auto => has_replica,
        ThrottlePolicy::Always => true,
        ThrottlePolicy::Never => false,
    }
}
