use grantline_core::{AccessLevel, AuthorizationRow, ProjectId, UserId};

use crate::traits::StorageError;

fn to_storage_error(e: sqlx::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

/// One multi-row upsert statement per batch. The composite primary key on
/// (user_id, project_id) resolves conflicts from concurrent writers; the
/// incoming access_level and is_unique win.
pub async fn upsert_rows<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    rows: &[AuthorizationRow],
) -> Result<u64, StorageError> {
    if rows.is_empty() {
        return Err(StorageError::EmptyBatch);
    }

    let mut user_ids = Vec::with_capacity(rows.len());
    let mut project_ids = Vec::with_capacity(rows.len());
    let mut access_levels = Vec::with_capacity(rows.len());
    let mut is_unique_flags = Vec::with_capacity(rows.len());
    for row in rows {
        user_ids.push(row.user_id.value());
        project_ids.push(row.project_id.value());
        access_levels.push(row.access_level.as_i16());
        is_unique_flags.push(row.is_unique);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO project_authorizations (user_id, project_id, access_level, is_unique)
        SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::smallint[], $4::boolean[])
        ON CONFLICT (user_id, project_id)
        DO UPDATE SET access_level = EXCLUDED.access_level,
                      is_unique = EXCLUDED.is_unique
        "#,
    )
    .bind(&user_ids)
    .bind(&project_ids)
    .bind(&access_levels)
    .bind(&is_unique_flags)
    .execute(executor)
    .await
    .map_err(to_storage_error)?;

    Ok(result.rows_affected())
}

pub async fn delete_projects_for_user<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    user_id: UserId,
    project_ids: &[ProjectId],
) -> Result<u64, StorageError> {
    let ids: Vec<i64> = project_ids.iter().map(|p| p.value()).collect();

    let result = sqlx::query(
        "DELETE FROM project_authorizations WHERE user_id = $1 AND project_id = ANY($2)",
    )
    .bind(user_id.value())
    .bind(&ids)
    .execute(executor)
    .await
    .map_err(to_storage_error)?;

    Ok(result.rows_affected())
}

pub async fn delete_users_in_project<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    project_id: ProjectId,
    user_ids: &[UserId],
) -> Result<u64, StorageError> {
    let ids: Vec<i64> = user_ids.iter().map(|u| u.value()).collect();

    let result = sqlx::query(
        "DELETE FROM project_authorizations WHERE project_id = $1 AND user_id = ANY($2)",
    )
    .bind(project_id.value())
    .bind(&ids)
    .execute(executor)
    .await
    .map_err(to_storage_error)?;

    Ok(result.rows_affected())
}

pub async fn select_access_level<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<Option<AccessLevel>, StorageError> {
    let row: Option<(i16,)> = sqlx::query_as(
        "SELECT access_level FROM project_authorizations WHERE user_id = $1 AND project_id = $2",
    )
    .bind(user_id.value())
    .bind(project_id.value())
    .fetch_optional(executor)
    .await
    .map_err(to_storage_error)?;

    match row {
        None => Ok(None),
        Some((value,)) => AccessLevel::try_from(value)
            .map(Some)
            .map_err(|_| StorageError::CorruptAccessLevel(value)),
    }
}

pub async fn select_grants_for_project<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    project_id: ProjectId,
) -> Result<Vec<AuthorizationRow>, StorageError> {
    let rows: Vec<(i64, i64, i16, bool)> = sqlx::query_as(
        r#"
        SELECT user_id, project_id, access_level, is_unique
        FROM project_authorizations
        WHERE project_id = $1
        ORDER BY user_id
        "#,
    )
    .bind(project_id.value())
    .fetch_all(executor)
    .await
    .map_err(to_storage_error)?;

    rows.into_iter()
        .map(|(user_id, project_id, access_level, is_unique)| {
            let access_level = AccessLevel::try_from(access_level)
                .map_err(|_| StorageError::CorruptAccessLevel(access_level))?;
            Ok(AuthorizationRow {
                user_id: UserId::new(user_id),
                project_id: ProjectId::new(project_id),
                access_level,
                is_unique,
            })
        })
        .collect()
}

pub async fn select_non_guest_user_ids<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    project_id: ProjectId,
) -> Result<Vec<UserId>, StorageError> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT user_id FROM project_authorizations
        WHERE project_id = $1 AND access_level > $2
        ORDER BY user_id
        "#,
    )
    .bind(project_id.value())
    .bind(AccessLevel::Guest.as_i16())
    .fetch_all(executor)
    .await
    .map_err(to_storage_error)?;

    Ok(rows.into_iter().map(|(id,)| UserId::new(id)).collect())
}
